#![no_main]

use flagbind::names::{to_env_case, to_flag_case};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|ident: &str| {
    let flag = to_flag_case(ident);
    let env = to_env_case(ident);

    assert!(!env.chars().any(|c| c == '-' || c == '.'));

    // ASCII identifiers convert the same way through the flag form
    if ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        assert_eq!(to_flag_case(&flag), flag);
        assert_eq!(to_env_case(&flag), env);
    }
});
