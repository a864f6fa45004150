//! Test nested, flattened and optional schemas.

use flagbind::Schema;

#[derive(Default, Schema)]
pub struct Root {
    pub tls: Tls,

    #[flag(flatten)]
    pub log: Log,

    pub proxy: Option<Proxy>,
}

#[derive(Default, Schema)]
pub struct Tls {
    pub enable: bool,
    pub ca_cert: String,
}

#[derive(Default, Schema)]
pub struct Log {
    #[flag(default = "info")]
    pub level: String,
}

#[derive(Default, Schema)]
pub struct Proxy {
    pub url: Option<String>,
    pub tls: Option<Tls>,
}

fn main() {
    let mut root = Root::default();
    let bindings = flagbind::Cli::<Root>::new(flagbind::clap::Command::new("app"))
        .bindings(&mut root)
        .unwrap();
    assert_eq!(bindings.len(), 6);
}
