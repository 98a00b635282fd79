//! Continuous-rotation servo that spins the sampling inlet.
//!
//! Start attaches the LEDC channel and writes the spin duty; stop
//! detaches it so the signal line idles low and the servo goes limp.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives LEDC via hw_init helpers.
//! On host/test: tracks state in-memory only.

use log::warn;

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoState {
    Detached,
    Spinning { duty: u16 },
}

pub struct ServoDriver {
    state: ServoState,
    spin_duty: u16,
}

impl ServoDriver {
    pub fn new(spin_duty: u16) -> Self {
        Self {
            state: ServoState::Detached,
            spin_duty,
        }
    }

    pub fn start(&mut self) -> Result<(), ActuatorError> {
        let duty = self.spin_duty;
        if !hw_init::ledc_attach(pins::SERVO_LEDC_CHANNEL, pins::SERVO_GPIO, u32::from(duty)) {
            warn!("servo: LEDC attach failed");
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.state = ServoState::Spinning { duty };
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.state = ServoState::Detached;
        if !hw_init::ledc_detach(pins::SERVO_LEDC_CHANNEL) {
            warn!("servo: LEDC stop failed");
            return Err(ActuatorError::PwmWriteFailed);
        }
        Ok(())
    }

    pub fn state(&self) -> ServoState {
        self.state
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.state, ServoState::Spinning { .. })
    }
}
