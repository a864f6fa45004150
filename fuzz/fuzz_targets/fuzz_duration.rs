#![no_main]

use flagbind::duration;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    // Errors are fine, panics are not
    if let Ok(value) = duration::parse(&text) {
        // Anything that parses must format back to text with the same value
        let formatted = duration::format(value);
        assert_eq!(duration::parse(&formatted), Ok(value), "{text:?} -> {formatted:?}");
    }
});
