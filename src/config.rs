//! Device configuration parameters
//!
//! Identity, timing and link constants for the d-flux node, plus the
//! registry of user-adjustable settings.  Only the *values* of the settings
//! are persisted (see [`crate::app::settings`]); everything else here is
//! fixed at build time.

use serde::{Deserialize, Serialize};

/// Text fields in the identity block are capped so the manufacturer record
/// stays inside a single advertising packet.
pub type IdentityString = heapless::String<24>;

// ---------------------------------------------------------------------------
// Settings registry
// ---------------------------------------------------------------------------

/// One user-adjustable calibration value and its factory default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingEntry {
    pub key: &'static str,
    pub default_value: f32,
}

/// Registered settings, in the order they are reported.
pub const SETTINGS_KEYS: &[SettingEntry] = &[
    SettingEntry {
        key: "offset",
        default_value: 0.0,
    },
    SettingEntry {
        key: "multiplier",
        default_value: 1.0,
    },
];

/// NVS caps key names at 15 bytes.
pub const MAX_SETTING_KEY_LEN: usize = 15;

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Who this device says it is (BLE name, WHOIS, advertising payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// BLE GAP device name
    pub device_name: IdentityString,
    /// Station identifier (`ID=`)
    pub device_id: IdentityString,
    /// Owning organisation (`ORG=`)
    pub org: IdentityString,
    /// Firmware version string (`FW=`)
    pub firmware: IdentityString,
    /// Bluetooth SIG company identifier for manufacturer data
    pub company_id: u16,
}

/// Connection parameters requested from the central right after connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnParams {
    /// Minimum connection interval (1.25 ms units)
    pub min_interval: u16,
    /// Maximum connection interval (1.25 ms units)
    pub max_interval: u16,
    /// Peripheral latency (connection events)
    pub latency: u16,
    /// Supervision timeout (10 ms units)
    pub supervision_timeout: u16,
}

impl Default for ConnParams {
    fn default() -> Self {
        Self {
            min_interval: 12, // 15 ms
            max_interval: 24, // 30 ms
            latency: 0,
            supervision_timeout: 400, // 4 s
        }
    }
}

/// Core device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub identity: DeviceIdentity,

    // --- Timing ---
    /// Main loop period (milliseconds)
    pub tick_interval_ms: u32,
    /// Status LED blink period while no controller is attached (milliseconds)
    pub not_connected_flash_interval_ms: u32,

    // --- Link ---
    pub conn_params: ConnParams,

    // --- Sensor ---
    /// Lowest accepted forced-recalibration reference (ppm CO2)
    pub calibration_min_ppm: u16,
    /// Highest accepted forced-recalibration reference (ppm CO2)
    pub calibration_max_ppm: u16,
    /// SCD30 continuous measurement interval (seconds)
    pub measurement_interval_secs: u16,

    // --- Actuator ---
    /// Servo duty while spinning (16-bit resolution at 50 Hz)
    pub spin_duty: u16,

    // --- Storage ---
    /// NVS namespace holding the settings values
    pub settings_namespace: heapless::String<15>,
}

fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            device_name: fixed("ESP32_SCD30"),
            device_id: fixed("ESP32_01"),
            org: fixed("INGV"),
            firmware: fixed("1.0"),
            company_id: 0xB71E,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            identity: DeviceIdentity::default(),

            // Timing
            tick_interval_ms: 20,
            not_connected_flash_interval_ms: 500,

            // Link
            conn_params: ConnParams::default(),

            // Sensor
            calibration_min_ppm: 400,
            calibration_max_ppm: 2000,
            measurement_interval_secs: 2,

            // Actuator
            spin_duty: 4500,

            // Storage
            settings_namespace: fixed("d-flux"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Errors from [`DeviceConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` names the field and the accepted range.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}

impl DeviceConfig {
    /// Range-check every field.  Called once at boot before any subsystem
    /// is built from this config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(5..=1000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "tick_interval_ms must be 5–1000",
            ));
        }
        if self.not_connected_flash_interval_ms < 2 * self.tick_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "not_connected_flash_interval_ms must be at least two ticks",
            ));
        }
        if self.calibration_min_ppm > self.calibration_max_ppm {
            return Err(ConfigError::ValidationFailed(
                "calibration_min_ppm must be <= calibration_max_ppm",
            ));
        }
        // SCD30 datasheet: FRC reference 400–2000 ppm, interval 2–1800 s.
        if self.calibration_min_ppm < 400 || self.calibration_max_ppm > 2000 {
            return Err(ConfigError::ValidationFailed(
                "calibration bounds must lie within 400–2000 ppm",
            ));
        }
        if !(2..=1800).contains(&self.measurement_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "measurement_interval_secs must be 2–1800",
            ));
        }
        let cp = &self.conn_params;
        if cp.min_interval < 6 || cp.min_interval > cp.max_interval || cp.max_interval > 3200 {
            return Err(ConfigError::ValidationFailed(
                "conn interval must satisfy 6 <= min <= max <= 3200",
            ));
        }
        if !(10..=3200).contains(&cp.supervision_timeout) {
            return Err(ConfigError::ValidationFailed(
                "supervision_timeout must be 10–3200",
            ));
        }
        if self.settings_namespace.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "settings_namespace must not be empty",
            ));
        }
        if self.identity.device_name.is_empty() || self.identity.device_id.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "device_name and device_id must not be empty",
            ));
        }
        Ok(())
    }
}
