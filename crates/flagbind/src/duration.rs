//! Duration text in the `1h30m`, `300ms`, `2.5s` notation.
//!
//! A duration is a sequence of decimal numbers, each with an optional
//! fraction and a mandatory unit suffix. Valid units are `ns`, `us` (or `µs`),
//! `ms`, `s`, `m` and `h`. A bare `0` is accepted. Negative durations cannot be
//! represented by [`std::time::Duration`] and are rejected, except `-0`.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Error returned by [`parse`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid duration {input:?}: {reason}")]
pub struct ParseDurationError {
    /// The text that failed to parse.
    pub input: String,

    /// What was wrong with it.
    pub reason: &'static str,
}

impl ParseDurationError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Parses duration text such as `1h30m` or `1.5s`.
///
/// # Errors
///
/// Returns [`ParseDurationError`] for empty input, a missing or unknown unit,
/// a negative value or a value that overflows.
pub fn parse(input: &str) -> Result<Duration, ParseDurationError> {
    let mut rest = input.trim();
    let mut negative = false;

    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    if rest == "0" {
        return Ok(Duration::ZERO);
    }

    if rest.is_empty() {
        return Err(ParseDurationError::new(input, "empty duration"));
    }

    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseDurationError::new(input, "expected a number"));
        }

        let unit_len = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());
        let (unit, remaining) = after_number.split_at(unit_len);

        if unit.is_empty() {
            return Err(ParseDurationError::new(input, "missing unit"));
        }

        let scale = unit_nanos(unit).ok_or_else(|| ParseDurationError::new(input, "unknown unit"))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| ParseDurationError::new(input, "value out of range"))?
        };

        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| ParseDurationError::new(input, "value out of range"))?;

        if !frac_part.is_empty() {
            // digits beyond nanosecond precision do not change the result
            let digits = &frac_part[..frac_part.len().min(19)];
            let numerator: u128 = digits
                .parse()
                .map_err(|_| ParseDurationError::new(input, "value out of range"))?;
            let denominator = 10u128.pow(digits.len() as u32);
            nanos += numerator * scale / denominator;
        }

        total = total
            .checked_add(nanos)
            .ok_or_else(|| ParseDurationError::new(input, "value out of range"))?;
        rest = remaining;
    }

    if negative && total != 0 {
        return Err(ParseDurationError::new(input, "negative durations are not supported"));
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| ParseDurationError::new(input, "value out of range"))?;

    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// Formats a duration the way [`parse`] reads it back (`1h30m0s`, `1.5s`, `300ms`).
#[must_use]
pub fn format(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < 1_000 {
        return format!("{nanos}ns");
    }

    if nanos < 1_000_000 {
        return format!("{}µs", decimal(nanos, 1_000));
    }

    if nanos < NANOS_PER_SEC {
        return format!("{}ms", decimal(nanos, 1_000_000));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = decimal(nanos % (60 * NANOS_PER_SEC), NANOS_PER_SEC);

    let mut out = String::new();

    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }

    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }

    out.push_str(&seconds);
    out.push('s');
    out
}

fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rem = value % unit;

    if rem == 0 {
        return whole.to_string();
    }

    let width = unit.ilog10() as usize;
    let digits = format!("{rem:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Serde adapter storing a [`Duration`] as duration text in configuration files.
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize, Schema)]
/// pub struct Config {
///     #[serde(with = "flagbind::duration::text")]
///     #[flag(default = "30s")]
///     pub timeout: Duration,
/// }
/// ```
#[cfg(feature = "json")]
pub mod text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    /// Serializes `duration` as text.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(*duration))
    }

    /// Deserializes duration text.
    ///
    /// # Errors
    ///
    /// Fails when the text is not a valid duration.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse(&raw).map_err(D::Error::custom)
    }
}
