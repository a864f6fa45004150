#![no_main]

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use flagbind::{Json, Schema, Toml, Unmarshal};
use libfuzzer_sys::fuzz_target;
use serde::{Deserialize, Serialize};

#[derive(Default, Schema, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Config {
    pub name: String,
    pub port: u32,
    pub ratio: f64,
    #[serde(with = "flagbind::duration::text")]
    pub timeout: Duration,
    pub tags: Vec<String>,
    pub labels: HashMap<String, String>,
    pub nested: Option<Nested>,
}

#[derive(Default, Schema, Serialize, Deserialize)]
#[serde(default)]
struct Nested {
    pub enabled: bool,
    pub ports: Vec<i32>,
}

fuzz_target!(|data: &[u8]| {
    // Decoding may fail with a diagnostic, never with a panic
    let mut config = Config::default();
    let _ = Json.unmarshal(Path::new("fuzz.json"), data, &mut config);

    let mut config = Config::default();
    let _ = Toml.unmarshal(Path::new("fuzz.toml"), data, &mut config);
});
