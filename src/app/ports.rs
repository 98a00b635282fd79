//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeviceService (domain)
//! ```
//!
//! Driven adapters (sensor, actuators, BLE link, storage, event sinks)
//! implement these traits.  The [`DeviceService`](super::service::DeviceService)
//! consumes them via generics passed at each call site, so the domain core
//! never touches hardware directly and never holds on to an adapter.

pub use crate::error::{ActuatorError, LinkError, SensorError, StorageError};
use crate::config::ConnParams;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One CO2 / temperature / humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub co2_ppm: f32,
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Read-side port: the domain polls this for new samples and forwards
/// calibration requests to it.
pub trait SensorPort {
    /// Whether a fresh sample is waiting in the sensor.
    fn data_ready(&mut self) -> Result<bool, SensorError>;

    /// Fetch the pending sample.
    fn read_measurement(&mut self) -> Result<Measurement, SensorError>;

    /// Force a recalibration against an external CO2 reference (ppm).
    fn force_recalibration(&mut self, reference_ppm: u16) -> Result<(), SensorError>;

    /// The reference value the sensor is currently calibrated against.
    fn calibration_reference(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Start the sampling servo.  On error the servo is not running.
    fn start_spin(&mut self) -> Result<(), ActuatorError>;

    /// Stop the sampling servo.
    fn stop_spin(&mut self);

    /// Drive the status LED.
    fn set_status_led(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: domain → BLE stack)
// ───────────────────────────────────────────────────────────────

/// Outbound half of the wireless link.  Inbound traffic arrives as
/// [`LinkEvent`](super::events::LinkEvent)s through the event queue.
pub trait LinkPort {
    /// Push bytes to the subscribed central via the TX characteristic.
    fn notify(&mut self, data: &[u8]) -> Result<(), LinkError>;

    /// Ask the central to switch to the given connection parameters.
    fn update_conn_params(&mut self, handle: u16, params: &ConnParams) -> Result<(), LinkError>;

    /// Terminate the connection identified by `handle`.
    fn disconnect(&mut self, handle: u16) -> Result<(), LinkError>;

    /// (Re)start connectable advertising.
    fn start_advertising(&mut self) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  These are local diagnostics only; nothing here is
/// ever sent to the controller.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic, no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value into `buf`.  Returns the stored length, so a caller
    /// expecting a fixed-size blob can tell when it got something else.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}
