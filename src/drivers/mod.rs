//! Actuator drivers and one-shot hardware initialisation.

pub mod hw_init;
pub mod servo;
pub mod status_led;
