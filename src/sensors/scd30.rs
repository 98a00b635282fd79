//! Sensirion SCD30 CO2 / temperature / humidity sensor over I2C.
//!
//! Every 16-bit word on the wire, in either direction, is big-endian and
//! followed by a CRC-8 (poly 0x31, init 0xFF).  Reads are a command write,
//! a short pause for the sensor to prepare the answer, then a plain read.
//!
//! The driver is generic over `embedded-hal` 1.0 so it runs against the
//! ESP-IDF I2C driver on the device and against a scripted bus in tests.

use crc::{Algorithm, Crc};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::debug;

use crate::app::ports::Measurement;
use crate::error::SensorError;

/// Fixed 7-bit I2C address.
pub const SCD30_ADDR: u8 = 0x61;

/// Sensirion's CRC-8.
pub const CRC_8_SENSIRION: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: 0xFF,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xF7,
    residue: 0x00,
};

const CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_SENSIRION);

/// Pause between a command write and the following read.
const READ_DELAY_MS: u32 = 3;
/// Time the sensor needs to come back after a soft reset.
const RESET_DELAY_MS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
enum Cmd {
    StartContinuous = 0x0010,
    DataReady = 0x0202,
    ReadMeasurement = 0x0300,
    MeasurementInterval = 0x4600,
    ForcedRecalibration = 0x5204,
    FirmwareVersion = 0xD100,
    SoftReset = 0xD304,
}

pub fn crc8(bytes: &[u8]) -> u8 {
    CRC.checksum(bytes)
}

pub struct Scd30<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C: I2c, D: DelayNs> Scd30<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Reset the sensor, check it answers, and start continuous
    /// measurement at `interval_secs`.  Any failure means the sensor is
    /// not usable and is reported as [`SensorError::NotFound`].
    pub fn begin(&mut self, interval_secs: u16) -> Result<(), SensorError> {
        self.init(interval_secs).map_err(|e| {
            debug!("SCD30 init: {}", e);
            SensorError::NotFound
        })
    }

    fn init(&mut self, interval_secs: u16) -> Result<(), SensorError> {
        self.soft_reset()?;
        let (major, minor) = self.firmware_version()?;
        debug!("SCD30 firmware {}.{}", major, minor);
        self.start_continuous(0)?;
        self.set_measurement_interval(interval_secs)
    }

    pub fn soft_reset(&mut self) -> Result<(), SensorError> {
        self.command(Cmd::SoftReset)?;
        self.delay.delay_ms(RESET_DELAY_MS);
        Ok(())
    }

    /// `(major, minor)` firmware version.
    pub fn firmware_version(&mut self) -> Result<(u8, u8), SensorError> {
        let [major, minor] = self.read_word(Cmd::FirmwareVersion)?.to_be_bytes();
        Ok((major, minor))
    }

    /// Start continuous measurement.  `ambient_pressure_mbar` of 0 turns
    /// pressure compensation off.
    pub fn start_continuous(&mut self, ambient_pressure_mbar: u16) -> Result<(), SensorError> {
        self.command_with_arg(Cmd::StartContinuous, ambient_pressure_mbar)
    }

    pub fn set_measurement_interval(&mut self, secs: u16) -> Result<(), SensorError> {
        self.command_with_arg(Cmd::MeasurementInterval, secs)
    }

    pub fn data_ready(&mut self) -> Result<bool, SensorError> {
        Ok(self.read_word(Cmd::DataReady)? == 1)
    }

    pub fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        let mut buf = [0u8; 18];
        self.read_into(Cmd::ReadMeasurement, &mut buf)?;
        let mut values = [0f32; 3];
        for (value, chunk) in values.iter_mut().zip(buf.chunks_exact(6)) {
            let hi = checked_word(&chunk[0..3])?;
            let lo = checked_word(&chunk[3..6])?;
            *value = f32::from_bits((u32::from(hi) << 16) | u32::from(lo));
        }
        Ok(Measurement {
            co2_ppm: values[0],
            temperature_c: values[1],
            humidity_pct: values[2],
        })
    }

    pub fn set_forced_recalibration(&mut self, reference_ppm: u16) -> Result<(), SensorError> {
        self.command_with_arg(Cmd::ForcedRecalibration, reference_ppm)
    }

    pub fn forced_recalibration(&mut self) -> Result<u16, SensorError> {
        self.read_word(Cmd::ForcedRecalibration)
    }

    /// Give the bus and delay back.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    // ── Wire helpers ──────────────────────────────────────────

    fn command(&mut self, cmd: Cmd) -> Result<(), SensorError> {
        let bytes = (cmd as u16).to_be_bytes();
        self.i2c.write(SCD30_ADDR, &bytes).map_err(bus_fault)
    }

    fn command_with_arg(&mut self, cmd: Cmd, arg: u16) -> Result<(), SensorError> {
        let [c0, c1] = (cmd as u16).to_be_bytes();
        let [a0, a1] = arg.to_be_bytes();
        let frame = [c0, c1, a0, a1, crc8(&[a0, a1])];
        self.i2c.write(SCD30_ADDR, &frame).map_err(bus_fault)
    }

    fn read_into(&mut self, cmd: Cmd, buf: &mut [u8]) -> Result<(), SensorError> {
        self.command(cmd)?;
        self.delay.delay_ms(READ_DELAY_MS);
        self.i2c.read(SCD30_ADDR, buf).map_err(bus_fault)
    }

    fn read_word(&mut self, cmd: Cmd) -> Result<u16, SensorError> {
        let mut buf = [0u8; 3];
        self.read_into(cmd, &mut buf)?;
        checked_word(&buf)
    }
}

fn checked_word(triple: &[u8]) -> Result<u16, SensorError> {
    if crc8(&triple[..2]) != triple[2] {
        return Err(SensorError::CrcMismatch);
    }
    Ok(u16::from_be_bytes([triple[0], triple[1]]))
}

fn bus_fault(e: impl embedded_hal::i2c::Error) -> SensorError {
    debug!("SCD30 I2C: {:?}", e.kind());
    SensorError::BusFault
}
