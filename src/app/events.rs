//! Inbound link events and outbound diagnostic events.
//!
//! [`LinkEvent`]s are produced by the BLE adapter's stack callbacks and
//! delivered to the [`DeviceService`](super::service::DeviceService) through
//! the main-loop event queue.  [`AppEvent`]s go the other way, through the
//! [`EventSink`](super::ports::EventSink) port, and only ever end up in the
//! local log.

use crate::error::SensorError;

use super::acquisition::AcquisitionState;

/// Largest command line accepted from the RX characteristic.
pub const MAX_RX_LEN: usize = 512;

/// Raw bytes of one RX characteristic write.
pub type RxLine = heapless::Vec<u8, MAX_RX_LEN>;

/// Connection lifecycle and receive events from the wireless link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A central attached; `handle` identifies the connection.
    Connected { handle: u16 },
    /// The central went away.  `reason` is the HCI reason code.
    Disconnected { reason: u16 },
    /// The central wrote a command line.
    Received(RxLine),
}

impl LinkEvent {
    /// Copy a characteristic write into a `Received` event.
    /// Returns `None` when the write is longer than [`MAX_RX_LEN`].
    pub fn received(data: &[u8]) -> Option<Self> {
        RxLine::from_slice(data).ok().map(Self::Received)
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started.
    Started,
    /// A central connected.
    LinkConnected { handle: u16 },
    /// The central disconnected.
    LinkDisconnected { reason: u16 },
    /// Acquisition was switched on or off.
    AcquisitionChanged(AcquisitionState),
    /// A persisted setting received a new value.
    SettingUpdated { key: &'static str, value: f32 },
    /// A sample could not be read; the next tick will try again.
    SensorReadFailed(SensorError),
    /// Forced recalibration was applied.
    CalibrationApplied { reference_ppm: u16 },
}
