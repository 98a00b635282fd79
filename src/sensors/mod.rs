//! Sensor drivers.
//!
//! Only the SCD30 is fitted.  Drivers here speak `embedded-hal` and know
//! nothing about ESP-IDF; the [`HardwareAdapter`](crate::adapters::hardware::HardwareAdapter)
//! wires them to the real bus.

pub mod scd30;

pub use scd30::Scd30;
