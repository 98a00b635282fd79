//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | waiting for controller"),
            AppEvent::LinkConnected { handle } => {
                info!("LINK | connected handle={}", handle);
            }
            AppEvent::LinkDisconnected { reason } => {
                info!("LINK | disconnected reason=0x{:02X}", reason);
            }
            AppEvent::AcquisitionChanged(state) => info!("ACQ | {:?}", state),
            AppEvent::SettingUpdated { key, value } => {
                info!("SETTINGS | {} = {:.2}", key, value);
            }
            AppEvent::SensorReadFailed(e) => warn!("SENSOR | read failed: {}", e),
            AppEvent::CalibrationApplied { reference_ppm } => {
                info!("SENSOR | forced recalibration to {} ppm", reference_ppm);
            }
        }
    }
}
