#![no_main]

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use arbitrary::Arbitrary;
use flagbind::clap::Command;
use flagbind::{Cli, Schema};
use libfuzzer_sys::fuzz_target;

#[derive(Default, Schema)]
struct Config {
    pub name: String,
    pub verbose: bool,
    pub workers: i32,
    pub limit: u64,
    pub ratio: f64,
    pub timeout: Duration,
    pub bind: Option<IpAddr>,
    pub dns: Vec<IpAddr>,
    pub ports: Vec<i32>,
    pub labels: HashMap<String, String>,
}

#[derive(Arbitrary, Debug)]
struct Input {
    args: Vec<String>,
    env: Vec<(String, String)>,
}

fuzz_target!(|input: Input| {
    let mut config = Config::default();
    let env: HashMap<String, String> = input.env.into_iter().collect();

    // Any combination of arguments and variables resolves or fails cleanly
    let _ = Cli::new(Command::new("fuzz"))
        .environment(env)
        .run_from(
            std::iter::once("fuzz".to_string()).chain(input.args),
            &mut config,
            |_, _| Ok(()),
        );
});
