//! Acquisition on/off state.
//!
//! The servo runs exactly while the controller is in
//! [`AcquisitionState::Acquiring`]; a start the actuator refuses leaves
//! the state `Idle`.  There is no timeout: once started,
//! acquisition persists across disconnects until a STOP arrives.

use log::warn;

use super::ports::ActuatorPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquisitionState {
    #[default]
    Idle,
    Acquiring,
}

impl AcquisitionState {
    /// Wire form used by `ACQUISITION_STATE`.
    pub fn as_flag(self) -> &'static str {
        match self {
            Self::Idle => "0",
            Self::Acquiring => "1",
        }
    }
}

#[derive(Debug, Default)]
pub struct AcquisitionController {
    state: AcquisitionState,
}

impl AcquisitionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn is_acquiring(&self) -> bool {
        self.state == AcquisitionState::Acquiring
    }

    /// Start the servo and enter `Acquiring`.  Returns `true` if the state
    /// changed.
    pub fn on_start(&mut self, hw: &mut impl ActuatorPort) -> bool {
        if self.is_acquiring() {
            return false;
        }
        if let Err(e) = hw.start_spin() {
            warn!("acquisition not started: {}", e);
            return false;
        }
        self.state = AcquisitionState::Acquiring;
        true
    }

    /// Stop the servo and enter `Idle`.  No actuator call when already idle.
    pub fn on_stop(&mut self, hw: &mut impl ActuatorPort) -> bool {
        if !self.is_acquiring() {
            return false;
        }
        hw.stop_spin();
        self.state = AcquisitionState::Idle;
        true
    }
}
