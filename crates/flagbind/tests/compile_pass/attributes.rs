//! Test that every field attribute is accepted.

use flagbind::Schema;

#[derive(Default, Schema)]
pub struct Config {
    /// Listen port.
    #[flag(name = "listen-port", short = 'p', default = "8080")]
    pub port: u32,

    #[flag(help = "release version", env = "APP_VERSION")]
    pub version: String,

    #[flag(env = "-")]
    pub token: String,

    #[flag(env = "")]
    pub region: String,

    #[flag(skip)]
    pub cache: Vec<u8>,

    #[flag(name = "-")]
    pub internal: std::path::PathBuf,

    #[flag(short = 'v')]
    #[flag(default = "true")]
    pub verbose: bool,

    private: u16,

    pub r#type: String,
}

fn main() {
    let config = Config::default();
    let _ = config.private;
}
