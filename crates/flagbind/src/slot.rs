//! Typed mutable handles into schema fields.
//!
//! [`Slot`] is the closed set of shapes a schema field can take: a bindable
//! [`Leaf`], a nested [`Schema`](crate::Schema), or an unsupported type that
//! aborts the bind. Every [`Leaf`] variant borrows the field's storage
//! directly, so defaults, config files, flags and env values all write into
//! the caller's struct.
//!
//! # Textual forms
//!
//! | Kind | Rust type | Text |
//! |------|-----------|------|
//! | `String` | `String` | as is |
//! | `Bool` | `bool` | `1 t T TRUE true True` / `0 f F FALSE false False` |
//! | `Int` / `Int64` | `i32` / `i64` | decimal |
//! | `Uint` / `Uint64` | `u32` / `u64` | decimal |
//! | `Float64` | `f64` | decimal or exponent form |
//! | `Duration` | `std::time::Duration` | `1h30m`, `300ms` |
//! | `Ip` | `IpAddr` | `10.0.0.1`, `::1` |
//! | `IpList` / `StringList` / `IntList` | `Vec<_>` | comma-separated, CSV quoting (`"a,b",c`) |
//! | `StringMap` | `HashMap<String, String>` | comma-separated `key=value`, CSV quoting |

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

use crate::duration;
use crate::error::{Error, Origin};
use crate::schema::{FieldSpec, Schema};

/// What the derive found in one field.
pub enum Slot<'a> {
    /// A field with a flag representation.
    Leaf(Leaf<'a>),

    /// A nested schema, walked recursively.
    Nested(&'a mut dyn Schema),

    /// A type that cannot be bound.
    Unsupported(Unsupported),
}

/// Reason a field type was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unsupported {
    /// The type itself has no flag form (`u16`, `PathBuf`, tuples, ...).
    Type,

    /// `Vec<T>` with an element type other than `String`, `i32` or `IpAddr`.
    Element,

    /// A map other than `HashMap<String, String>`.
    MapValue,
}

impl Unsupported {
    pub(crate) fn error(self, spec: &FieldSpec) -> Error {
        let field = spec.ident.to_string();
        let ty = spec.ty.to_string();

        match self {
            Self::Type => Error::UnsupportedType { field, ty },
            Self::Element => Error::UnsupportedElement { field, ty },
            Self::MapValue => Error::UnsupportedMapValue { field, ty },
        }
    }
}

/// Flag value kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    String,
    Bool,
    Int,
    Int64,
    Uint,
    Uint64,
    Float64,
    Duration,
    Ip,
    IpList,
    StringList,
    IntList,
    StringMap,
}

impl Kind {
    /// Placeholder shown in help output (`--port <int>`).
    #[must_use]
    pub const fn value_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint64 => "uint64",
            Self::Float64 => "float",
            Self::Duration => "duration",
            Self::Ip => "ip",
            Self::IpList => "ips",
            Self::StringList => "strings",
            Self::IntList => "ints",
            Self::StringMap => "key=value",
        }
    }

    /// Whether repeated occurrences accumulate instead of replacing.
    #[must_use]
    pub const fn is_repeatable(self) -> bool {
        matches!(
            self,
            Self::IpList | Self::StringList | Self::IntList | Self::StringMap
        )
    }

    const fn expected(self) -> &'static str {
        match self {
            Self::String | Self::StringList => "a string",
            Self::Bool => "a boolean",
            Self::Int | Self::Int64 | Self::IntList => "an integer",
            Self::Uint | Self::Uint64 => "an unsigned integer",
            Self::Float64 => "a number",
            Self::Duration => "a duration such as 1h30m or 300ms",
            Self::Ip | Self::IpList => "an IP address",
            Self::StringMap => "key=value pairs",
        }
    }
}

/// A typed mutable reference to one bindable field.
pub enum Leaf<'a> {
    Str(&'a mut String),
    Bool(&'a mut bool),
    Int(&'a mut i32),
    Int64(&'a mut i64),
    Uint(&'a mut u32),
    Uint64(&'a mut u64),
    Float64(&'a mut f64),
    Duration(&'a mut Duration),
    Ip(&'a mut IpAddr),
    IpList(&'a mut Vec<IpAddr>),
    StringList(&'a mut Vec<String>),
    IntList(&'a mut Vec<i32>),
    StringMap(&'a mut HashMap<String, String>),
}

/// Types the derive binds directly as flags.
pub trait Bindable {
    /// Borrows `self` as a slot.
    fn slot(&mut self) -> Slot<'_>;

    /// Value used to fill an unset `Option<Self>` before binding.
    fn zero() -> Self
    where
        Self: Sized;
}

macro_rules! bindable {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Bindable for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Leaf(Leaf::$variant(self))
                }

                fn zero() -> Self {
                    Self::default()
                }
            }
        )*
    };
}

bindable! {
    String => Str,
    bool => Bool,
    i32 => Int,
    i64 => Int64,
    u32 => Uint,
    u64 => Uint64,
    f64 => Float64,
    Duration => Duration,
    Vec<IpAddr> => IpList,
    Vec<String> => StringList,
    Vec<i32> => IntList,
    HashMap<String, String> => StringMap,
}

impl Bindable for IpAddr {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Leaf(Leaf::Ip(self))
    }

    fn zero() -> Self {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Comma split with CSV quoting; blank input is an empty list.
///
/// An item starting with `"` runs to the closing quote, may contain commas
/// and uses `""` for a literal quote. Unquoted items are trimmed.
fn split_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut item = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    item.push('"');
                } else {
                    in_quotes = false;
                }
            }
            _ if in_quotes => item.push(c),
            '"' if !quoted && item.trim().is_empty() => {
                item.clear();
                quoted = true;
                in_quotes = true;
            }
            ',' => {
                items.push(finish_item(&mut item, quoted));
                quoted = false;
            }
            c if quoted && c.is_whitespace() => {}
            c => item.push(c),
        }
    }

    items.push(finish_item(&mut item, quoted));
    items
}

fn finish_item(item: &mut String, quoted: bool) -> String {
    let done = std::mem::take(item);
    if quoted { done } else { done.trim().to_string() }
}

fn keep_or_parse<T: FromStr>(target: &mut T, flag: &str, raw: &str) {
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => tracing::debug!(flag, default = raw, "ignoring unparsable default"),
    }
}

fn parse_value<T>(flag: &str, origin: &Origin, kind: Kind, raw: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::invalid_value(flag, origin, raw, kind.expected(), e))
}

impl Leaf<'_> {
    /// The kind of flag this field becomes.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Str(_) => Kind::String,
            Self::Bool(_) => Kind::Bool,
            Self::Int(_) => Kind::Int,
            Self::Int64(_) => Kind::Int64,
            Self::Uint(_) => Kind::Uint,
            Self::Uint64(_) => Kind::Uint64,
            Self::Float64(_) => Kind::Float64,
            Self::Duration(_) => Kind::Duration,
            Self::Ip(_) => Kind::Ip,
            Self::IpList(_) => Kind::IpList,
            Self::StringList(_) => Kind::StringList,
            Self::IntList(_) => Kind::IntList,
            Self::StringMap(_) => Kind::StringMap,
        }
    }

    /// Renders the current value in its textual form.
    ///
    /// Map entries are sorted by key so the output is stable.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Str(v) => (**v).clone(),
            Self::Bool(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::Int64(v) => v.to_string(),
            Self::Uint(v) => v.to_string(),
            Self::Uint64(v) => v.to_string(),
            Self::Float64(v) => v.to_string(),
            Self::Duration(v) => duration::format(**v),
            Self::Ip(v) => v.to_string(),
            Self::IpList(v) => join(v.iter()),
            Self::StringList(v) => v.join(","),
            Self::IntList(v) => join(v.iter()),
            Self::StringMap(v) => {
                let mut pairs: Vec<_> = v.iter().collect();
                pairs.sort();
                pairs
                    .into_iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(",")
            }
        }
    }

    /// Whether the field holds its type's zero value.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Str(v) => v.is_empty(),
            Self::Bool(v) => !**v,
            Self::Int(v) => **v == 0,
            Self::Int64(v) => **v == 0,
            Self::Uint(v) => **v == 0,
            Self::Uint64(v) => **v == 0,
            Self::Float64(v) => **v == 0.0,
            Self::Duration(v) => v.is_zero(),
            Self::Ip(v) => v.is_unspecified(),
            Self::IpList(v) => v.is_empty(),
            Self::StringList(v) => v.is_empty(),
            Self::IntList(v) => v.is_empty(),
            Self::StringMap(v) => v.is_empty(),
        }
    }

    /// Parses a declared `default = "..."` into the field.
    ///
    /// Unparsable scalar defaults keep the current value, an invalid IP
    /// becomes `0.0.0.0` and invalid IP list entries are dropped. Integer
    /// lists are strict.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDefault`] when an integer-list element is not an integer.
    pub fn apply_default(&mut self, flag: &str, raw: &str) -> Result<(), Error> {
        match self {
            Self::Str(v) => **v = raw.to_string(),
            Self::Bool(v) => match parse_bool(raw.trim()) {
                Some(b) => **v = b,
                None => tracing::debug!(flag, default = raw, "ignoring unparsable default"),
            },
            Self::Int(v) => keep_or_parse(&mut **v, flag, raw),
            Self::Int64(v) => keep_or_parse(&mut **v, flag, raw),
            Self::Uint(v) => keep_or_parse(&mut **v, flag, raw),
            Self::Uint64(v) => keep_or_parse(&mut **v, flag, raw),
            Self::Float64(v) => keep_or_parse(&mut **v, flag, raw),
            Self::Duration(v) => match duration::parse(raw) {
                Ok(d) => **v = d,
                Err(e) => tracing::debug!(flag, default = raw, error = %e, "ignoring unparsable default"),
            },
            Self::Ip(v) => **v = raw.trim().parse().unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            Self::IpList(v) => {
                **v = split_list(raw)
                    .iter()
                    .filter_map(|s| s.parse().ok())
                    .collect();
            }
            Self::StringList(v) => {
                **v = split_list(raw);
            }
            Self::IntList(v) => {
                **v = split_list(raw)
                    .iter()
                    .map(|s| s.parse::<i32>())
                    .collect::<Result<_, _>>()
                    .map_err(|source| Error::InvalidDefault {
                        flag: flag.to_string(),
                        value: raw.to_string(),
                        source,
                    })?;
            }
            Self::StringMap(v) => {
                **v = split_list(raw)
                    .into_iter()
                    .map(|pair| match pair.split_once('=') {
                        Some((k, val)) => (k.trim().to_string(), val.trim().to_string()),
                        None => (pair, String::new()),
                    })
                    .collect();
            }
        }

        Ok(())
    }

    /// Assigns one textual value with the flag's type-aware setter.
    ///
    /// Lists and maps are replaced by the parsed comma-separated content.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidValue`] when `raw` does not parse as the field's kind.
    pub fn set(&mut self, flag: &str, origin: &Origin, raw: &str) -> Result<(), Error> {
        let kind = self.kind();

        match self {
            Self::Str(v) => **v = raw.to_string(),
            Self::Bool(v) => {
                **v = parse_bool(raw.trim()).ok_or_else(|| {
                    Error::invalid_value(flag, origin, raw, kind.expected(), "not a boolean")
                })?;
            }
            Self::Int(v) => **v = parse_value(flag, origin, kind, raw)?,
            Self::Int64(v) => **v = parse_value(flag, origin, kind, raw)?,
            Self::Uint(v) => **v = parse_value(flag, origin, kind, raw)?,
            Self::Uint64(v) => **v = parse_value(flag, origin, kind, raw)?,
            Self::Float64(v) => **v = parse_value(flag, origin, kind, raw)?,
            Self::Duration(v) => {
                **v = duration::parse(raw)
                    .map_err(|e| Error::invalid_value(flag, origin, raw, kind.expected(), e.reason))?;
            }
            Self::Ip(v) => **v = parse_value(flag, origin, kind, raw)?,
            Self::IpList(v) => v.clear(),
            Self::StringList(v) => v.clear(),
            Self::IntList(v) => v.clear(),
            Self::StringMap(v) => v.clear(),
        }

        if kind.is_repeatable() {
            self.append(flag, origin, raw)?;
        }

        Ok(())
    }

    /// Assigns every command-line occurrence of a flag.
    ///
    /// Scalars take the last occurrence. Lists and maps are replaced by the
    /// first occurrence and extended by the following ones.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidValue`] for the first occurrence that fails to parse.
    pub fn set_all(&mut self, flag: &str, origin: &Origin, values: &[String]) -> Result<(), Error> {
        if !self.kind().is_repeatable() {
            return match values.last() {
                Some(raw) => self.set(flag, origin, raw),
                None => Ok(()),
            };
        }

        for (i, raw) in values.iter().enumerate() {
            if i == 0 {
                self.set(flag, origin, raw)?;
            } else {
                self.append(flag, origin, raw)?;
            }
        }

        Ok(())
    }

    fn append(&mut self, flag: &str, origin: &Origin, raw: &str) -> Result<(), Error> {
        let kind = self.kind();

        match self {
            Self::IpList(v) => {
                for item in split_list(raw) {
                    v.push(parse_value(flag, origin, kind, &item)?);
                }
            }
            Self::StringList(v) => v.extend(split_list(raw)),
            Self::IntList(v) => {
                for item in split_list(raw) {
                    v.push(parse_value(flag, origin, kind, &item)?);
                }
            }
            Self::StringMap(v) => {
                for pair in split_list(raw) {
                    let (key, value) = pair.split_once('=').ok_or_else(|| {
                        Error::invalid_value(
                            flag,
                            origin,
                            raw,
                            kind.expected(),
                            format!("{pair} must be formatted as key=value"),
                        )
                    })?;
                    v.insert(key.to_string(), value.to_string());
                }
            }
            _ => {}
        }

        Ok(())
    }
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(",")
}
