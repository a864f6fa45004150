//! Test `Option` and `Box` around leaves and nested schemas, and types that
//! are reported at run time instead of compile time.

use std::collections::BTreeMap;

use flagbind::Schema;

#[derive(Default, Schema)]
pub struct Config {
    pub name: Option<String>,
    pub port: Option<u32>,
    pub bind: Option<std::net::IpAddr>,
    pub boxed: Box<Nested>,
    pub optional_boxed: Option<Box<Nested>>,
    pub boxed_leaf: Box<String>,
}

#[derive(Default, Schema)]
pub struct Nested {
    pub value: i64,
}

#[derive(Default, Schema)]
pub struct Unsupported {
    pub small: u16,
    pub elements: Vec<u8>,
    pub sorted: BTreeMap<String, String>,
    pub maybe: Option<f32>,
    pub pair: (u32, u32),
}

fn main() {
    let mut config = Unsupported::default();
    let err = flagbind::Cli::<Unsupported>::new(flagbind::clap::Command::new("app"))
        .bindings(&mut config)
        .unwrap_err();
    assert!(err.is_schema_error());
}
