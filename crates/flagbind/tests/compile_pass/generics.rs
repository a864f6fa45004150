//! Test that generic parameters and where clauses are carried over.

use flagbind::Schema;

#[derive(Default, Schema)]
pub struct Inner {
    pub value: String,
}

#[derive(Default, Schema)]
pub struct Wrapper<T: Schema + Default> {
    pub inner: T,
    pub enabled: bool,
}

#[derive(Default, Schema)]
pub struct Bounded<T>
where
    T: Schema + Default,
{
    #[flag(flatten)]
    pub inner: T,
}

fn assert_schema<S: Schema>() {}

fn main() {
    assert_schema::<Wrapper<Inner>>();
    assert_schema::<Bounded<Wrapper<Inner>>>();
}
