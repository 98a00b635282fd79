//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the SCD30 driver and the actuator drivers, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  Generic over the `embedded-hal`
//! bus so the same adapter runs on the ESP-IDF I2C driver and on a fake
//! bus in host tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::{ActuatorError, ActuatorPort, Measurement, SensorError, SensorPort};
use crate::drivers::servo::ServoDriver;
use crate::drivers::status_led::StatusLed;
use crate::sensors::Scd30;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C, D> {
    scd30: Scd30<I2C, D>,
    servo: ServoDriver,
    led: StatusLed,
}

impl<I2C: I2c, D: DelayNs> HardwareAdapter<I2C, D> {
    pub fn new(scd30: Scd30<I2C, D>, servo: ServoDriver, led: StatusLed) -> Self {
        Self { scd30, servo, led }
    }

    pub fn servo(&self) -> &ServoDriver {
        &self.servo
    }

    pub fn led(&self) -> &StatusLed {
        &self.led
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I2C: I2c, D: DelayNs> SensorPort for HardwareAdapter<I2C, D> {
    fn data_ready(&mut self) -> Result<bool, SensorError> {
        self.scd30.data_ready()
    }

    fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        self.scd30.read_measurement()
    }

    fn force_recalibration(&mut self, reference_ppm: u16) -> Result<(), SensorError> {
        self.scd30.set_forced_recalibration(reference_ppm)
    }

    fn calibration_reference(&mut self) -> Result<u16, SensorError> {
        self.scd30.forced_recalibration()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I2C: I2c, D: DelayNs> ActuatorPort for HardwareAdapter<I2C, D> {
    fn start_spin(&mut self) -> Result<(), ActuatorError> {
        self.servo.start()
    }

    fn stop_spin(&mut self) {
        if let Err(e) = self.servo.stop() {
            warn!("servo stop: {}", e);
        }
    }

    fn set_status_led(&mut self, on: bool) {
        if let Err(e) = self.led.set(on) {
            warn!("status LED: {}", e);
        }
    }
}
