//! Application core: pure domain logic, zero I/O.
//!
//! The device control protocol lives here: the command parser and table,
//! the acquisition and connection state, the settings text format and the
//! per-tick work of the main loop.  All interaction with hardware and the
//! BLE stack happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod acquisition;
pub mod commands;
pub mod events;
pub mod identity;
pub mod indicator;
pub mod ports;
pub mod service;
pub mod session;
pub mod settings;
