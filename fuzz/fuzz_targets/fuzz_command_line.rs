//! Fuzz target: `Command::parse`
//!
//! Drives arbitrary RX characteristic writes through the line splitter
//! and asserts that it never panics and that the name/payload split is
//! consistent with the table lookup.
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use dflux::app::commands::{Command, CommandKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let cmd = Command::parse(data);

    assert!(!cmd.name.contains(' '), "name must stop at the first space");
    if cmd.name.is_empty() {
        assert!(cmd.payload.is_empty());
    }

    // A recognised name must map back to itself.
    if let Some(kind) = cmd.kind() {
        assert_eq!(kind.name(), cmd.name);
        assert_eq!(CommandKind::from_name(kind.name()), Some(kind));
    }
});
