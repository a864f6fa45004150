//! Test that a plain struct with every leaf type derives.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use flagbind::Schema;

#[derive(Schema)]
pub struct Config {
    pub name: String,
    pub verbose: bool,
    pub workers: i32,
    pub offset: i64,
    pub port: u32,
    pub limit: u64,
    pub ratio: f64,
    pub timeout: Duration,
    pub bind: IpAddr,
    pub dns: Vec<IpAddr>,
    pub tags: Vec<String>,
    pub ports: Vec<i32>,
    pub labels: HashMap<String, String>,
}

fn assert_schema<S: Schema>() {}

fn main() {
    assert_schema::<Config>();
}
