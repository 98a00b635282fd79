//! Persisted float settings and the `key=value;` text format.
//!
//! Each entry of [`SETTINGS_KEYS`] owns one 4-byte little-endian blob in the
//! settings namespace.  A missing or unreadable blob reads back as the
//! entry's default.
//!
//! The payload tokenizer deliberately does plain substring matching: the
//! first `"{key}="` anywhere in the payload wins and the value runs to the
//! next `;`.  Controllers in the field rely on this being lenient.

use core::fmt::Write as _;

use log::{debug, warn};

use crate::config::{SETTINGS_KEYS, SettingEntry};

use super::commands::is_c_space;
use super::events::AppEvent;
use super::ports::{EventSink, StorageError, StoragePort};

/// Typed view over the settings namespace of a [`StoragePort`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    namespace: String,
}

impl SettingsStore {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Current value of `entry`, falling back to its default.
    pub fn value(&self, store: &impl StoragePort, entry: &SettingEntry) -> f32 {
        let mut buf = [0u8; 4];
        match store.read(&self.namespace, entry.key, &mut buf) {
            Ok(4) => f32::from_le_bytes(buf),
            Ok(n) => {
                warn!("setting '{}' has {} bytes, using default", entry.key, n);
                entry.default_value
            }
            Err(StorageError::NotFound) => entry.default_value,
            Err(e) => {
                warn!("setting '{}' unreadable ({}), using default", entry.key, e);
                entry.default_value
            }
        }
    }

    /// Every registered setting as `key=value;`, in declared order, with two
    /// decimals.
    pub fn read_all(&self, store: &impl StoragePort) -> String {
        let mut out = String::new();
        for entry in SETTINGS_KEYS {
            let _ = write!(out, "{}={:.2};", entry.key, self.value(store, entry));
        }
        out
    }

    /// Apply every registered key found in `payload`.  Returns whether at
    /// least one key was stored.
    pub fn write_from_payload(
        &self,
        store: &mut impl StoragePort,
        payload: &str,
        sink: &mut impl EventSink,
    ) -> bool {
        let mut updated = false;
        for entry in SETTINGS_KEYS {
            let Some(raw) = find_value(payload, entry.key) else {
                continue;
            };
            let value = parse_float_prefix(raw);
            match store.write(&self.namespace, entry.key, &value.to_le_bytes()) {
                Ok(()) => {
                    debug!("setting '{}' <- {:?} ({})", entry.key, raw, value);
                    sink.emit(&AppEvent::SettingUpdated {
                        key: entry.key,
                        value,
                    });
                    updated = true;
                }
                Err(e) => warn!("setting '{}' not stored: {}", entry.key, e),
            }
        }
        updated
    }
}

// ───────────────────────────────────────────────────────────────
// Tokenizer
// ───────────────────────────────────────────────────────────────

/// Text following the first `"{key}="` in `payload`, up to the next `;`.
pub fn find_value<'a>(payload: &'a str, key: &str) -> Option<&'a str> {
    let mut needle = String::with_capacity(key.len() + 1);
    needle.push_str(key);
    needle.push('=');
    let start = payload.find(&needle)? + needle.len();
    let rest = &payload[start..];
    Some(rest.split(';').next().unwrap_or(rest))
}

/// Parse the longest leading decimal number of `s`, like C `atof`.
///
/// Leading whitespace and a sign are accepted, then digits with an optional
/// fraction and an optional exponent.  No digits gives 0.0, and so does a
/// result that is not finite as `f32`.
pub fn parse_float_prefix(s: &str) -> f32 {
    let s = s.trim_start_matches(is_c_space);
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let mut digits = i - int_start;
    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        let mut j = frac_start;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }
    if digits == 0 {
        return 0.0;
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    let value = s[..i].parse::<f64>().unwrap_or(0.0) as f32;
    if value.is_finite() { value } else { 0.0 }
}
