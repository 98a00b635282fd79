//! Inbound text commands from the BLE controller.
//!
//! A command arrives as one RX characteristic write: a name, optionally
//! followed by a single space and a payload.  Parsing never fails; anything
//! that does not name a known command is simply ignored by the
//! [`DeviceService`](super::service::DeviceService).

use std::borrow::Cow;

// ───────────────────────────────────────────────────────────────
// Command line
// ───────────────────────────────────────────────────────────────

/// A received line split into name and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub payload: String,
}

impl Command {
    /// Decode and split one raw line.
    ///
    /// Bytes after the first NUL are dropped, invalid UTF-8 is replaced,
    /// surrounding ASCII whitespace is trimmed and the text is split on the
    /// first space only.
    pub fn parse(raw: &[u8]) -> Self {
        let text = decode(raw);
        let line = text.trim_matches(is_c_space);
        match line.split_once(' ') {
            Some((name, payload)) => Self {
                name: name.to_owned(),
                payload: payload.to_owned(),
            },
            None => Self {
                name: line.to_owned(),
                payload: String::new(),
            },
        }
    }

    /// The command table entry for this name, if any.
    pub fn kind(&self) -> Option<CommandKind> {
        CommandKind::from_name(&self.name)
    }
}

fn decode(raw: &[u8]) -> Cow<'_, str> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end])
}

/// `isspace` in the "C" locale; `char::is_ascii_whitespace` misses `\v`.
pub(crate) fn is_c_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

// ───────────────────────────────────────────────────────────────
// Command table
// ───────────────────────────────────────────────────────────────

/// Every command the device understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    StartAcquisition,
    StopAcquisition,
    Whois,
    GetAcquisitionState,
    Disconnect,
    GetSettings,
    SetSettings,
    SetCalibrationRef,
    GetCalibrationRef,
}

const COMMAND_TABLE: &[(&str, CommandKind)] = &[
    ("START_ACQUISITION", CommandKind::StartAcquisition),
    ("STOP_ACQUISITION", CommandKind::StopAcquisition),
    ("WHOIS", CommandKind::Whois),
    ("GET_ACQUISITION_STATE", CommandKind::GetAcquisitionState),
    ("DISCONNECT", CommandKind::Disconnect),
    ("GET_SETTINGS", CommandKind::GetSettings),
    ("SET_SETTINGS", CommandKind::SetSettings),
    ("SET_HW_CALIBRATION_REF", CommandKind::SetCalibrationRef),
    ("GET_HW_CALIBRATION_REF", CommandKind::GetCalibrationRef),
];

impl CommandKind {
    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, kind)| kind)
    }

    pub fn name(self) -> &'static str {
        COMMAND_TABLE
            .iter()
            .find(|&&(_, kind)| kind == self)
            .map(|&(n, _)| n)
            .unwrap_or("")
    }
}

// ───────────────────────────────────────────────────────────────
// Reply names
// ───────────────────────────────────────────────────────────────

pub const REPLY_WHOIS: &str = "WHOIS";
pub const REPLY_ACQUISITION_STATE: &str = "ACQUISITION_STATE";
pub const REPLY_SETTINGS: &str = "SETTINGS";
pub const REPLY_CALIBRATION_REF: &str = "HW_CALIBRATION_REF";
pub const REPLY_DATA: &str = "DATA";

// ───────────────────────────────────────────────────────────────
// Integer payloads
// ───────────────────────────────────────────────────────────────

/// Parse the leading integer of `s` the way C `atol` does: optional leading
/// whitespace, optional sign, then as many digits as follow.  Returns 0 when
/// there is no digit.  Saturates instead of overflowing.
pub fn parse_int_prefix(s: &str) -> i64 {
    let s = s.trim_start_matches(is_c_space);
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative { -value } else { value }
}
