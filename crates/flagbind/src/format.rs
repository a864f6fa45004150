//! Serde-backed configuration file formats.
//!
//! Both formats decode in place: the current value of the schema is
//! serialized to a JSON tree, the file is deep-merged over it and the result
//! is deserialized back. Keys missing from the file therefore keep whatever
//! defaults were applied before the load.
//!
//! Durations need `#[serde(with = "flagbind::duration::text")]` to be read
//! as `1h30m` style text.

use std::path::Path;

use miette::{NamedSource, SourceSpan};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Unmarshal;
use crate::error::Error;

/// JSON configuration files.
#[derive(Clone, Copy, Debug, Default)]
pub struct Json;

/// TOML configuration files.
#[cfg(feature = "toml")]
#[derive(Clone, Copy, Debug, Default)]
pub struct Toml;

impl<S: Serialize + DeserializeOwned> Unmarshal<S> for Json {
    fn unmarshal(&self, path: &Path, bytes: &[u8], target: &mut S) -> Result<(), Error> {
        let content = text(path, bytes)?;
        let overlay: Value =
            serde_json::from_str(content).map_err(|e| json_parse_error(&e, content, path))?;

        merge_into(target, overlay, path)
    }
}

#[cfg(feature = "toml")]
impl<S: Serialize + DeserializeOwned> Unmarshal<S> for Toml {
    fn unmarshal(&self, path: &Path, bytes: &[u8], target: &mut S) -> Result<(), Error> {
        let content = text(path, bytes)?;
        let table: toml::Table =
            toml::from_str(content).map_err(|e| toml_parse_error(&e, content, path))?;

        merge_into(target, toml_to_json(toml::Value::Table(table)), path)
    }
}

fn text<'b>(path: &Path, bytes: &'b [u8]) -> Result<&'b str, Error> {
    std::str::from_utf8(bytes).map_err(|e| Error::Decode {
        path: path.display().to_string(),
        source: Box::new(e),
    })
}

/// Overlays `overlay` on the current value of `target`.
fn merge_into<S: Serialize + DeserializeOwned>(
    target: &mut S,
    overlay: Value,
    path: &Path,
) -> Result<(), Error> {
    let mut base = serde_json::to_value(&*target).map_err(|e| Error::Decode {
        path: path.display().to_string(),
        source: Box::new(e),
    })?;

    deep_merge(&mut base, overlay);

    *target = serde_path_to_error::deserialize(base).map_err(|e| Error::TypeMismatch {
        key: e.path().to_string(),
        path: path.display().to_string(),
        message: e.inner().to_string(),
    })?;

    Ok(())
}

/// Objects merge key by key; `null` keeps the base; any other value
/// replaces it.
pub(crate) fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}

        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    deep_merge(base_value, overlay_value);
                } else {
                    base_map.insert(key, overlay_value);
                }
            }
        }

        (base, overlay) => {
            *base = overlay;
        }
    }
}

fn offset_to_span(offset: usize, content: &str) -> SourceSpan {
    let remaining = content.get(offset.min(content.len())..).unwrap_or_default();
    let len = remaining
        .find(|c: char| c.is_whitespace() || c == ',' || c == '}' || c == ']')
        .unwrap_or(remaining.len().min(20))
        .max(1);

    SourceSpan::new(offset.into(), len)
}

/// 1-indexed line and column to a byte offset.
fn line_col_to_offset(content: &str, line: usize, col: usize) -> usize {
    let mut offset = 0;

    for (i, l) in content.lines().enumerate() {
        if (i + 1) == line {
            return offset + col.saturating_sub(1);
        }

        offset += l.len() + 1;
    }

    offset
}

fn json_parse_error(e: &serde_json::Error, content: &str, path: &Path) -> Error {
    let offset = line_col_to_offset(content, e.line(), e.column());

    Error::Parse {
        format: "JSON",
        path: path.display().to_string(),
        src: NamedSource::new(path.display().to_string(), content.to_string()),
        span: offset_to_span(offset, content),
        message: e.to_string(),
        help: "check for missing commas, quotes, or brackets".to_string(),
    }
}

#[cfg(feature = "toml")]
fn toml_parse_error(e: &toml::de::Error, content: &str, path: &Path) -> Error {
    let span = match e.span() {
        Some(span) => SourceSpan::new(span.start.into(), span.end - span.start),
        None => offset_to_span(0, content),
    };

    Error::Parse {
        format: "TOML",
        path: path.display().to_string(),
        src: NamedSource::new(path.display().to_string(), content.to_string()),
        span,
        message: e.message().to_string(),
        help: "check for missing quotes, invalid values, or syntax errors".to_string(),
    }
}

#[cfg(feature = "toml")]
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),

        toml::Value::Integer(i) => Value::Number(i.into()),

        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),

        toml::Value::Boolean(b) => Value::Bool(b),

        toml::Value::Datetime(dt) => Value::String(dt.to_string()),

        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),

        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize, Serialize)]
    #[serde(rename_all = "kebab-case")]
    struct Tls {
        enable: bool,
        ca_cert: String,
    }

    #[derive(Debug, Default, Deserialize, Serialize)]
    #[serde(rename_all = "kebab-case")]
    struct App {
        version: String,
        port: u32,
        #[serde(with = "crate::duration::text")]
        timeout: Duration,
        mirrors: Vec<String>,
        labels: HashMap<String, String>,
        tls: Option<Tls>,
    }

    fn app() -> App {
        App {
            version: "v0".into(),
            port: 8080,
            timeout: Duration::from_secs(30),
            tls: Some(Tls::default()),
            ..App::default()
        }
    }

    #[test]
    fn test_json_keeps_absent_keys() {
        let mut target = app();
        let content = br#"{ "version": "v1.0", "tls": { "enable": true } }"#;

        Json.unmarshal(Path::new("app.json"), content, &mut target).unwrap();

        assert_eq!(target.version, "v1.0");
        assert_eq!(target.port, 8080);
        assert_eq!(target.timeout, Duration::from_secs(30));

        let tls = target.tls.unwrap();
        assert!(tls.enable);
        assert!(tls.ca_cert.is_empty());
    }

    #[test]
    fn test_json_lists_replace() {
        let mut target = app();
        target.mirrors = vec!["old.io".into()];

        Json.unmarshal(
            Path::new("app.json"),
            br#"{ "mirrors": ["a.io", "b.io"], "timeout": "1m30s" }"#,
            &mut target,
        )
        .unwrap();

        assert_eq!(target.mirrors, ["a.io", "b.io"]);
        assert_eq!(target.timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_json_syntax_error_has_span() {
        let mut target = app();
        let err = Json
            .unmarshal(Path::new("bad.json"), b"{\n  \"port\": 80,,\n}", &mut target)
            .unwrap_err();

        match err {
            Error::Parse { format, path, .. } => {
                assert_eq!(format, "JSON");
                assert_eq!(path, "bad.json");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_json_type_mismatch_names_key() {
        let mut target = app();
        let err = Json
            .unmarshal(
                Path::new("app.json"),
                br#"{ "tls": { "enable": "yes" } }"#,
                &mut target,
            )
            .unwrap_err();

        match err {
            Error::TypeMismatch { key, .. } => assert_eq!(key, "tls.enable"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let mut target = app();
        let err = Json
            .unmarshal(Path::new("app.json"), &[0xff, 0xfe], &mut target)
            .unwrap_err();

        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_deep_merge_nested() {
        let mut base = serde_json::json!({ "a": { "b": 1, "c": 2 }, "d": [1, 2] });
        deep_merge(&mut base, serde_json::json!({ "a": { "c": 3 }, "d": [9] }));

        assert_eq!(base, serde_json::json!({ "a": { "b": 1, "c": 3 }, "d": [9] }));
    }

    #[test]
    fn test_null_overlay_keeps_base() {
        let mut target = app();
        target.tls = Some(Tls {
            ca_cert: "/etc/ca.pem".into(),
            ..Tls::default()
        });

        Json.unmarshal(
            Path::new("app.json"),
            br#"{ "tls": null, "port": null, "version": "v3" }"#,
            &mut target,
        )
        .unwrap();

        assert_eq!(target.version, "v3");
        assert_eq!(target.port, 8080);
        assert_eq!(target.tls.unwrap().ca_cert, "/etc/ca.pem");
    }

    #[test]
    fn test_line_col_to_offset() {
        let content = "ab\ncd\nef";
        assert_eq!(line_col_to_offset(content, 1, 1), 0);
        assert_eq!(line_col_to_offset(content, 2, 2), 4);
        assert_eq!(line_col_to_offset(content, 3, 1), 6);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_overlay() {
        let mut target = app();
        let content = b"version = \"v2\"\ntimeout = \"5m\"\n\n[tls]\nca-cert = \"/etc/ca.pem\"\n\n[labels]\nenv = \"prod\"\n";

        Toml.unmarshal(Path::new("app.toml"), content, &mut target).unwrap();

        assert_eq!(target.version, "v2");
        assert_eq!(target.timeout, Duration::from_secs(300));
        assert_eq!(target.labels.get("env").map(String::as_str), Some("prod"));
        assert_eq!(target.tls.unwrap().ca_cert, "/etc/ca.pem");
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_syntax_error() {
        let mut target = app();
        let err = Toml
            .unmarshal(Path::new("bad.toml"), b"port = = 1", &mut target)
            .unwrap_err();

        assert!(matches!(err, Error::Parse { format: "TOML", .. }));
    }
}
