//! Fuzz target: SET_SETTINGS payload tokenizer
//!
//! Feeds arbitrary text to `find_value` / `parse_float_prefix` and checks
//! that the extracted value never spans a `;` and always parses to a
//! finite float.
//!
//! cargo fuzz run fuzz_settings_payload

#![no_main]

use dflux::app::settings::{find_value, parse_float_prefix};
use dflux::config::SETTINGS_KEYS;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let payload = String::from_utf8_lossy(data);

    for entry in SETTINGS_KEYS {
        if let Some(value) = find_value(&payload, entry.key) {
            assert!(!value.contains(';'));
            assert!(parse_float_prefix(value).is_finite());
        }
    }

    // The parser must also cope with text that was never tokenized.
    assert!(parse_float_prefix(&payload).is_finite());
});
