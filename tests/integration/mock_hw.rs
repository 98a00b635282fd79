//! Mock adapters for integration tests.
//!
//! Every port call is recorded so tests can assert on the full history
//! without touching real I2C, PWM, GPIO or BLE.

use dflux::app::events::{AppEvent, LinkEvent};
use dflux::app::ports::{
    ActuatorError, ActuatorPort, EventSink, LinkError, LinkPort, Measurement, SensorError, SensorPort,
    StorageError, StoragePort,
};
use dflux::app::service::DeviceService;
use dflux::config::{ConnParams, DeviceConfig};
use std::collections::{HashMap, VecDeque};

// ── Hardware (sensor + actuators) ─────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    DataReady,
    ReadMeasurement,
    ForceRecalibration(u16),
    CalibrationReference,
    StartSpin,
    StopSpin,
    SetLed(bool),
}

pub struct MockHardware {
    pub calls: Vec<HwCall>,
    /// Samples handed out by `read_measurement`, one per ready tick.
    pub samples: VecDeque<Result<Measurement, SensorError>>,
    pub calibration_ppm: u16,
    pub fail_recalibration: bool,
    pub fail_spin: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            samples: VecDeque::new(),
            calibration_ppm: 400,
            fail_recalibration: false,
            fail_spin: false,
        }
    }

    pub fn push_sample(&mut self, co2_ppm: f32, temperature_c: f32, humidity_pct: f32) {
        self.samples.push_back(Ok(Measurement {
            co2_ppm,
            temperature_c,
            humidity_pct,
        }));
    }

    pub fn count(&self, call: &HwCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    /// Calls that touch the sensor, in order.
    pub fn sensor_calls(&self) -> Vec<HwCall> {
        self.calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    HwCall::DataReady
                        | HwCall::ReadMeasurement
                        | HwCall::ForceRecalibration(_)
                        | HwCall::CalibrationReference
                )
            })
            .cloned()
            .collect()
    }

    pub fn led_writes(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::SetLed(on) => Some(*on),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn data_ready(&mut self) -> Result<bool, SensorError> {
        self.calls.push(HwCall::DataReady);
        Ok(!self.samples.is_empty())
    }

    fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        self.calls.push(HwCall::ReadMeasurement);
        self.samples.pop_front().unwrap_or(Err(SensorError::BusFault))
    }

    fn force_recalibration(&mut self, reference_ppm: u16) -> Result<(), SensorError> {
        self.calls.push(HwCall::ForceRecalibration(reference_ppm));
        if self.fail_recalibration {
            return Err(SensorError::BusFault);
        }
        self.calibration_ppm = reference_ppm;
        Ok(())
    }

    fn calibration_reference(&mut self) -> Result<u16, SensorError> {
        self.calls.push(HwCall::CalibrationReference);
        Ok(self.calibration_ppm)
    }
}

impl ActuatorPort for MockHardware {
    fn start_spin(&mut self) -> Result<(), ActuatorError> {
        self.calls.push(HwCall::StartSpin);
        if self.fail_spin {
            return Err(ActuatorError::PwmWriteFailed);
        }
        Ok(())
    }

    fn stop_spin(&mut self) {
        self.calls.push(HwCall::StopSpin);
    }

    fn set_status_led(&mut self, on: bool) {
        self.calls.push(HwCall::SetLed(on));
    }
}

// ── Link ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum LinkCall {
    Notify(String),
    UpdateConnParams(u16, ConnParams),
    Disconnect(u16),
    StartAdvertising,
}

#[derive(Default)]
pub struct MockLink {
    pub calls: Vec<LinkCall>,
    pub fail_notify: bool,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notified message, as text.
    pub fn sent(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                LinkCall::Notify(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_sent(&self) -> Option<String> {
        self.sent().pop()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl LinkPort for MockLink {
    fn notify(&mut self, data: &[u8]) -> Result<(), LinkError> {
        if self.fail_notify {
            return Err(LinkError::NotifyFailed);
        }
        self.calls
            .push(LinkCall::Notify(String::from_utf8_lossy(data).into_owned()));
        Ok(())
    }

    fn update_conn_params(&mut self, handle: u16, params: &ConnParams) -> Result<(), LinkError> {
        self.calls.push(LinkCall::UpdateConnParams(handle, *params));
        Ok(())
    }

    fn disconnect(&mut self, handle: u16) -> Result<(), LinkError> {
        self.calls.push(LinkCall::Disconnect(handle));
        Ok(())
    }

    fn start_advertising(&mut self) -> Result<(), LinkError> {
        self.calls.push(LinkCall::StartAdvertising);
        Ok(())
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    pub data: HashMap<(String, String), Vec<u8>>,
    pub writes: usize,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn float(&self, namespace: &str, key: &str) -> Option<f32> {
        let bytes = self.data.get(&(namespace.to_string(), key.to_string()))?;
        let raw: [u8; 4] = bytes.as_slice().try_into().ok()?;
        Some(f32::from_le_bytes(raw))
    }

    pub fn put_float(&mut self, namespace: &str, key: &str, value: f32) {
        self.data.insert(
            (namespace.to_string(), key.to_string()),
            value.to_le_bytes().to_vec(),
        );
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .data
            .get(&(namespace.to_string(), key.to_string()))
            .ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(data.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.data
            .insert((namespace.to_string(), key.to_string()), data.to_vec());
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.data
            .contains_key(&(namespace.to_string(), key.to_string()))
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Test rig ──────────────────────────────────────────────────

/// A started service wired to fresh mocks.
pub struct Rig {
    pub service: DeviceService,
    pub hw: MockHardware,
    pub link: MockLink,
    pub nvs: MockNvs,
    pub sink: LogSink,
    pub now_ms: u32,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(&DeviceConfig::default())
    }

    pub fn with_config(config: &DeviceConfig) -> Self {
        let mut rig = Self {
            service: DeviceService::new(config).unwrap(),
            hw: MockHardware::new(),
            link: MockLink::new(),
            nvs: MockNvs::new(),
            sink: LogSink::new(),
            now_ms: 0,
        };
        rig.service.start(&rig.nvs, &mut rig.sink);
        rig
    }

    pub fn event(&mut self, event: LinkEvent) {
        self.service.handle_link_event(
            event,
            &mut self.hw,
            &mut self.link,
            &mut self.nvs,
            &mut self.sink,
        );
    }

    pub fn connect(&mut self, handle: u16) {
        self.event(LinkEvent::Connected { handle });
    }

    pub fn disconnect(&mut self, reason: u16) {
        self.event(LinkEvent::Disconnected { reason });
    }

    /// Deliver one RX write.
    pub fn line(&mut self, text: &str) {
        let event = LinkEvent::received(text.as_bytes()).unwrap();
        self.event(event);
    }

    /// Advance one main-loop tick of `step_ms`.
    pub fn tick(&mut self, step_ms: u32) {
        self.now_ms = self.now_ms.wrapping_add(step_ms);
        self.service
            .tick(self.now_ms, &mut self.hw, &mut self.link, &mut self.sink);
    }
}
