//! Example: flags, environment variables and a TOML file bound to one struct
//!
//! Run with:
//!   `cargo run -p flagbind --example server --features toml -- --help`
//!
//! Layering in action:
//!   `SERVER_LISTEN=0.0.0.0:9000 cargo run -p flagbind --example server --features toml -- --workers 8`
//!
//! Or point at another file:
//!   `cargo run -p flagbind --example server --features toml -- -f /tmp/other.toml`

#![allow(clippy::result_large_err)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use flagbind::clap::Command;
use flagbind::{Cli, ConfigFiles, Outcome, Schema, Toml};
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Default, Schema, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Server {
    /// Address to listen on.
    #[flag(short = 'l', default = "0.0.0.0:8080")]
    pub listen: String,

    /// Worker threads.
    #[flag(short = 'w', default = "4")]
    pub workers: u32,

    /// Maximum time to read a request.
    #[flag(default = "30s")]
    #[serde(with = "flagbind::duration::text")]
    pub read_timeout: Duration,

    /// Upstream mirrors, tried in order.
    pub mirrors: Vec<String>,

    /// Resolvers used for upstream lookups.
    #[flag(default = "1.1.1.1,8.8.8.8")]
    pub dns: Vec<IpAddr>,

    /// Labels attached to every log line.
    pub labels: HashMap<String, String>,

    /// Directory for cached responses.
    #[flag(default = "{{.Home}}/.cache/server")]
    pub cache_dir: Option<String>,

    /// Shared secret for the admin API.
    #[flag(env = "ADMIN_TOKEN")]
    pub admin_token: String,

    pub tls: Option<Tls>,

    #[flag(flatten)]
    #[serde(flatten)]
    pub log: Log,
}

#[derive(Debug, Default, Schema, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Tls {
    /// Serve HTTPS.
    pub enable: bool,

    /// CA bundle for client certificates.
    pub ca_cert: String,
}

#[derive(Debug, Default, Schema, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Log {
    /// Log level.
    #[flag(default = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

fn main() -> flagbind::Result<()> {
    let manifest = env!("CARGO_MANIFEST_DIR");
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());

    let mut server = Server::default();

    let outcome = Cli::new(Command::new("server").about("Example server"))
        .env_prefix("SERVER")
        .template(move |_, _, raw| raw.replace("{{.Home}}", &home))
        .config_files(
            ConfigFiles::new([
                format!("{manifest}/examples/server.toml"),
                "/etc/server/server.toml".to_string(),
            ])
            .env("SERVER_CONFIG"),
            Toml,
        )
        .pre_run(|server: &mut Server, _| {
            if server.workers == 0 {
                return Err("workers must be at least 1".into());
            }
            Ok(())
        })
        .run(&mut server, |server, _| {
            println!("=== Resolved Configuration ===\n");
            println!("{server:#?}\n");
            Ok(())
        })?;

    if let Outcome::Ran { sources, .. } = outcome {
        println!("{sources}");
    }

    Ok(())
}
