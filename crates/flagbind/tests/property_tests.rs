//! Property-based tests for name conversion and duration text.
//!
//! These tests verify that critical invariants hold for all possible inputs,
//! not just hand-picked test cases.

#![allow(clippy::pedantic)]

use proptest::prelude::*;

// ============================================================================
// Name Conversion Properties
// ============================================================================

mod name_properties {
    use super::*;
    use flagbind::names::{to_env_case, to_flag_case};

    fn identifier() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9_]{0,24}"
    }

    fn camel_words() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[A-Z][a-z0-9]{0,6}", 1..5)
    }

    proptest! {
        /// Conversion never panics on any input
        #[test]
        fn never_panics(s in ".*") {
            let _ = to_flag_case(&s);
            let _ = to_env_case(&s);
        }

        /// Flag names contain no upper-case letters or underscores
        #[test]
        fn flag_case_is_lower_kebab(s in identifier()) {
            let flag = to_flag_case(&s);
            prop_assert!(!flag.chars().any(|c| c.is_ascii_uppercase() || c == '_'), "{}", flag);
        }

        /// Converting a flag name again changes nothing
        #[test]
        fn flag_case_is_idempotent(s in identifier()) {
            let once = to_flag_case(&s);
            prop_assert_eq!(to_flag_case(&once), once);
        }

        /// Env names only contain A-Z, 0-9 and underscores
        #[test]
        fn env_case_is_screaming_snake(s in identifier()) {
            let env = to_env_case(&s);
            prop_assert!(
                env.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'),
                "{}",
                env
            );
        }

        /// The env name of a flag path equals the env name of its identifier
        #[test]
        fn env_case_agrees_with_flag_case(s in identifier()) {
            prop_assert_eq!(to_env_case(&to_flag_case(&s)), to_env_case(&s));
        }

        /// CamelCase words become dash-separated lower-case words
        #[test]
        fn camel_case_splits_on_capitals(words in camel_words()) {
            let ident: String = words.concat();
            let expected = words
                .iter()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join("-");

            prop_assert_eq!(to_flag_case(&ident), expected);
        }

        /// Dotted paths keep their dots in flag form
        #[test]
        fn dotted_paths_keep_segments(a in identifier(), b in identifier()) {
            let path = format!("{}.{}", to_flag_case(&a), to_flag_case(&b));
            prop_assert_eq!(to_flag_case(&path), path.clone());
            prop_assert!(!to_env_case(&path).contains('.'));
        }
    }
}

// ============================================================================
// Duration Properties
// ============================================================================

mod duration_properties {
    use super::*;
    use flagbind::duration;
    use std::time::Duration;

    proptest! {
        /// Parsing never panics on any input
        #[test]
        fn parse_never_panics(s in ".*") {
            let _ = duration::parse(&s);
        }

        /// Formatted durations parse back to the same value
        #[test]
        fn format_then_parse(secs in 0u64..1_000_000, nanos in 0u32..1_000_000_000) {
            let value = Duration::new(secs, nanos);
            let text = duration::format(value);
            prop_assert_eq!(duration::parse(&text), Ok(value), "{}", text);
        }

        /// Whole seconds parse from their `s` form
        #[test]
        fn seconds_suffix(secs in 0u64..100_000) {
            prop_assert_eq!(duration::parse(&format!("{secs}s")), Ok(Duration::from_secs(secs)));
        }

        /// Numbers without a unit are rejected, except zero
        #[test]
        fn unitless_numbers_rejected(n in 1u64..1_000_000) {
            prop_assert!(duration::parse(&n.to_string()).is_err());
        }
    }
}
