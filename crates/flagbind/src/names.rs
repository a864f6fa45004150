//! Identifier case conversion for flag paths and environment variable names.
//!
//! Both conversions split words the same way: a separator goes in front of
//! every upper-case character except the first one, and existing `-`/`_`
//! separators are kept as word boundaries.
//!
//! | Input | [`to_flag_case`] | [`to_env_case`] |
//! |-------|------------------|-----------------|
//! | `FlagNameAge` | `flag-name-age` | `FLAG_NAME_AGE` |
//! | `data_root` | `data-root` | `DATA_ROOT` |
//! | `tls.ca-cert` | `tls.ca-cert` | `TLS_CA_CERT` |

/// Converts an identifier to its flag form (`FlagNameAge` → `flag-name-age`).
///
/// Input that is already lower-case and separated comes back unchanged, so
/// the function can be applied to an explicit flag name as well.
#[must_use]
pub fn to_flag_case(ident: &str) -> String {
    split_words(ident, '-')
}

/// Converts an identifier or flag path to an environment variable name
/// (`flag-name.age` → `FLAG_NAME_AGE`).
///
/// Letters and digits are upper-cased, everything else becomes `_`.
#[must_use]
pub fn to_env_case(name: &str) -> String {
    split_words(name, '_')
        .chars()
        .flat_map(|c| {
            let mapped = if c.is_alphanumeric() { c } else { '_' };
            mapped.to_uppercase()
        })
        .collect()
}

fn split_words(ident: &str, sep: char) -> String {
    let mut out = String::with_capacity(ident.len() + 4);

    for (i, c) in ident.chars().enumerate() {
        if c.is_uppercase() {
            if i != 0 && !out.ends_with(is_boundary) {
                out.push(sep);
            }
            out.extend(c.to_lowercase());
        } else if c == '-' || c == '_' {
            out.push(sep);
        } else {
            out.push(c);
        }
    }

    out
}

const fn is_boundary(c: char) -> bool {
    matches!(c, '-' | '_' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_case_camel() {
        assert_eq!(to_flag_case("FlagNameAge"), "flag-name-age");
        assert_eq!(to_flag_case("Version"), "version");
        assert_eq!(to_flag_case("DataRoot"), "data-root");
    }

    #[test]
    fn test_flag_case_snake() {
        assert_eq!(to_flag_case("data_root"), "data-root");
        assert_eq!(to_flag_case("registry_mirrors"), "registry-mirrors");
        assert_eq!(to_flag_case("port"), "port");
    }

    #[test]
    fn test_flag_case_acronym_splits_every_capital() {
        assert_eq!(to_flag_case("TLS"), "t-l-s");
    }

    #[test]
    fn test_flag_case_idempotent() {
        assert_eq!(to_flag_case("flag-name-age"), "flag-name-age");
        assert_eq!(to_flag_case("tls.ca-cert"), "tls.ca-cert");
    }

    #[test]
    fn test_flag_case_no_double_separator() {
        assert_eq!(to_flag_case("FlagName.Age"), "flag-name.age");
        assert_eq!(to_flag_case("data_Root"), "data-root");
    }

    #[test]
    fn test_env_case() {
        assert_eq!(to_env_case("FlagNameAge"), "FLAG_NAME_AGE");
        assert_eq!(to_env_case("flag-name.age"), "FLAG_NAME_AGE");
        assert_eq!(to_env_case("version"), "VERSION");
        assert_eq!(to_env_case("tls.ca-cert"), "TLS_CA_CERT");
        assert_eq!(to_env_case("http2"), "HTTP2");
    }

    #[test]
    fn test_empty() {
        assert_eq!(to_flag_case(""), "");
        assert_eq!(to_env_case(""), "");
    }
}
