//! Device service, the hexagonal core.
//!
//! [`DeviceService`] owns the connection, acquisition and settings state
//! and is the only thing that mutates it.  All I/O flows through port
//! traits passed in at each call site, so the whole service runs against
//! mock adapters on the host.
//!
//! ```text
//!   LinkEvent ──▶ ┌─────────────────────────┐ ──▶ LinkPort (notify)
//!                 │      DeviceService       │
//!  SensorPort ──▶ │ session · acq · settings │ ──▶ ActuatorPort
//!                 └─────────────────────────┘ ──▶ EventSink
//! ```

use log::{debug, info, warn};

use crate::config::{DeviceConfig, SETTINGS_KEYS};
use crate::error::Result;

use super::acquisition::{AcquisitionController, AcquisitionState};
use super::commands::{
    Command, CommandKind, REPLY_ACQUISITION_STATE, REPLY_CALIBRATION_REF, REPLY_DATA,
    REPLY_SETTINGS, REPLY_WHOIS, parse_int_prefix,
};
use super::events::{AppEvent, LinkEvent};
use super::identity::ManufacturerRecord;
use super::indicator::WaitingIndicator;
use super::ports::{ActuatorPort, EventSink, LinkPort, SensorPort, StoragePort};
use super::session::{ConnectionState, LinkSession};
use super::settings::SettingsStore;

// ───────────────────────────────────────────────────────────────
// DeviceService
// ───────────────────────────────────────────────────────────────

pub struct DeviceService {
    session: LinkSession,
    acquisition: AcquisitionController,
    settings: SettingsStore,
    indicator: WaitingIndicator,
    record: ManufacturerRecord,
    calibration_range: core::ops::RangeInclusive<i64>,
    tick_count: u64,
}

impl DeviceService {
    /// Validate `config` and build the service.  Nothing touches a port
    /// until [`start`](Self::start).
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session: LinkSession::new(config.conn_params),
            acquisition: AcquisitionController::new(),
            settings: SettingsStore::new(&config.settings_namespace),
            indicator: WaitingIndicator::new(config.not_connected_flash_interval_ms),
            record: ManufacturerRecord::new(&config.identity),
            calibration_range: i64::from(config.calibration_min_ppm)
                ..=i64::from(config.calibration_max_ppm),
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Log the stored settings and announce the service.
    pub fn start(&mut self, store: &impl StoragePort, sink: &mut impl EventSink) {
        info!(
            "identity: company 0x{:04X}, {}",
            self.record.company_id(),
            self.record.text()
        );
        info!("settings namespace '{}'", self.settings.namespace());
        for entry in SETTINGS_KEYS {
            info!("{} = {:.2}", entry.key, self.settings.value(store, entry));
        }
        sink.emit(&AppEvent::Started);
    }

    // ── Link events ───────────────────────────────────────────

    pub fn handle_link_event(
        &mut self,
        event: LinkEvent,
        hw: &mut (impl SensorPort + ActuatorPort),
        link: &mut impl LinkPort,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        match event {
            LinkEvent::Connected { handle } => {
                self.session.on_connect(handle, link);
                if let Some(on) = self.indicator.clear() {
                    hw.set_status_led(on);
                }
                sink.emit(&AppEvent::LinkConnected { handle });
            }
            LinkEvent::Disconnected { reason } => {
                self.session.on_disconnect(reason, link);
                sink.emit(&AppEvent::LinkDisconnected { reason });
            }
            LinkEvent::Received(line) => self.dispatch(&line, hw, link, store, sink),
        }
    }

    // ── Commands ──────────────────────────────────────────────

    /// Parse one received line and run its handler.  Unknown commands are
    /// ignored.
    pub fn dispatch(
        &mut self,
        raw: &[u8],
        hw: &mut (impl SensorPort + ActuatorPort),
        link: &mut impl LinkPort,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        let cmd = Command::parse(raw);
        debug!("<- RX: {} {}", cmd.name, cmd.payload);
        let Some(kind) = cmd.kind() else {
            debug!("ignoring unknown command {:?}", cmd.name);
            return;
        };

        match kind {
            CommandKind::StartAcquisition => {
                if self.acquisition.on_start(hw) {
                    sink.emit(&AppEvent::AcquisitionChanged(AcquisitionState::Acquiring));
                }
            }
            CommandKind::StopAcquisition => {
                if self.acquisition.on_stop(hw) {
                    sink.emit(&AppEvent::AcquisitionChanged(AcquisitionState::Idle));
                }
            }
            CommandKind::Whois => {
                self.session.send(REPLY_WHOIS, self.record.text(), link);
            }
            CommandKind::GetAcquisitionState => {
                let flag = self.acquisition.state().as_flag();
                self.session.send(REPLY_ACQUISITION_STATE, flag, link);
            }
            CommandKind::Disconnect => self.session.request_disconnect(link),
            CommandKind::GetSettings => {
                let all = self.settings.read_all(store);
                self.session.send(REPLY_SETTINGS, &all, link);
            }
            CommandKind::SetSettings => {
                if self.settings.write_from_payload(store, &cmd.payload, sink) {
                    let all = self.settings.read_all(store);
                    self.session.send(REPLY_SETTINGS, &all, link);
                }
            }
            CommandKind::SetCalibrationRef => {
                self.set_calibration(&cmd.payload, hw, link, sink);
            }
            CommandKind::GetCalibrationRef => self.report_calibration(hw, link),
        }
    }

    fn set_calibration(
        &mut self,
        payload: &str,
        hw: &mut impl SensorPort,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        let requested = parse_int_prefix(payload);
        if !self.calibration_range.contains(&requested) {
            debug!("calibration reference {} out of range", requested);
            return;
        }
        // Range bounds are u16, so the conversion cannot fail.
        let reference_ppm = u16::try_from(requested).unwrap_or(u16::MAX);
        match hw.force_recalibration(reference_ppm) {
            Ok(()) => sink.emit(&AppEvent::CalibrationApplied { reference_ppm }),
            Err(e) => warn!("forced recalibration to {} ppm: {}", reference_ppm, e),
        }
        self.report_calibration(hw, link);
    }

    fn report_calibration(&mut self, hw: &mut impl SensorPort, link: &mut impl LinkPort) {
        match hw.calibration_reference() {
            Ok(ppm) => {
                self.session
                    .send(REPLY_CALIBRATION_REF, &ppm.to_string(), link);
            }
            Err(e) => warn!("calibration reference read: {}", e),
        }
    }

    // ── Per-tick work ─────────────────────────────────────────

    /// One main-loop pass: forward a fresh sample if acquiring and
    /// connected, then update the status LED.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl SensorPort + ActuatorPort),
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        if self.acquisition.is_acquiring() && self.session.is_connected() {
            self.poll_sensor(hw, link, sink);
        }

        if let Some(on) = self.indicator.tick(now_ms, self.session.is_connected()) {
            hw.set_status_led(on);
        }
    }

    fn poll_sensor(
        &mut self,
        hw: &mut impl SensorPort,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        let sample = match hw.data_ready() {
            Ok(false) => return,
            Ok(true) => hw.read_measurement(),
            Err(e) => Err(e),
        };
        match sample {
            Ok(m) => {
                let payload = format!(
                    "CO2={:.2};TMP={:.2};HUM={:.2}",
                    m.co2_ppm, m.temperature_c, m.humidity_pct
                );
                self.session.send(REPLY_DATA, &payload, link);
            }
            Err(e) => sink.emit(&AppEvent::SensorReadFailed(e)),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn acquisition_state(&self) -> AcquisitionState {
        self.acquisition.state()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn manufacturer_record(&self) -> &ManufacturerRecord {
        &self.record
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
