//! d-flux firmware entry point.
//!
//! Hexagonal architecture with a single cooperative event loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   BleAdapter      │
//! │  (Sensor+Actuator) (EventSink)    (Storage)    (Link)          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            DeviceService (pure logic)                  │    │
//! │  │  commands · session · acquisition · settings           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Delay, FreeRtos};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info};

use dflux::adapters::ble::BleAdapter;
use dflux::adapters::device_id;
use dflux::adapters::hardware::HardwareAdapter;
use dflux::adapters::log_sink::LogEventSink;
use dflux::adapters::nvs::NvsAdapter;
use dflux::adapters::time::Esp32TimeAdapter;
use dflux::app::identity::ManufacturerRecord;
use dflux::app::service::DeviceService;
use dflux::config::DeviceConfig;
use dflux::drivers::servo::ServoDriver;
use dflux::drivers::status_led::StatusLed;
use dflux::events::{self, Event};
use dflux::pins;
use dflux::sensors::Scd30;

/// Park the main task forever after a fatal boot error.
fn halt() -> ! {
    loop {
        FreeRtos::delay_ms(10);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  d-flux v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = DeviceConfig::default();
    config.validate().map_err(dflux::error::Error::from)?;
    info!("config: {}", serde_json::to_string(&config)?);

    // ── 2. Storage + service ──────────────────────────────────
    let mut nvs = NvsAdapter::new()?;
    let mut log_sink = LogEventSink::new();
    let mut service = DeviceService::new(&config)?;
    info!("--- SETTINGS ---");
    service.start(&nvs, &mut log_sink);
    info!("----------------");

    // ── 3. Peripherals ────────────────────────────────────────
    if let Err(e) = dflux::drivers::hw_init::init_peripherals() {
        error!("HAL init failed: {}, halting", e);
        halt();
    }

    let peripherals = Peripherals::take()?;
    // GPIO21 / GPIO22 are pins::I2C_SDA_GPIO / pins::I2C_SCL_GPIO.
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUDRATE_HZ)),
    )?;

    let mut scd30 = Scd30::new(i2c, Delay::new_default());
    if let Err(e) = scd30.begin(config.measurement_interval_secs) {
        error!("Failed to find SCD30 ({})", e);
        halt();
    }
    info!("SCD30 Found!");

    let mut hw = HardwareAdapter::new(
        scd30,
        ServoDriver::new(config.spin_duty),
        StatusLed::new(pins::LED_GPIO),
    );

    // ── 4. BLE ────────────────────────────────────────────────
    info!("Starting BLE...");
    let mac = device_id::read_mac();
    info!(
        "BLE Address: {}",
        device_id::format_address(&device_id::ble_address(&mac))
    );
    let record = ManufacturerRecord::new(&config.identity);
    let mut ble = BleAdapter::new(&config.identity.device_name, &record)?;
    if let Err(e) = ble.start() {
        error!("BLE start failed: {}", e);
    }

    info!("System ready. Entering event loop.");

    // ── 5. Event loop ─────────────────────────────────────────
    let time = Esp32TimeAdapter::new();
    loop {
        events::drain_events(|event| match event {
            Event::Link(ev) => {
                service.handle_link_event(ev, &mut hw, &mut ble, &mut nvs, &mut log_sink);
            }
        });

        service.tick(time.uptime_ms(), &mut hw, &mut ble, &mut log_sink);

        FreeRtos::delay_ms(config.tick_interval_ms);
    }
}
