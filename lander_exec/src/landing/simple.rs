//! # Simple landing
//!
//! Stops the vehicle with a zero velocity demand, then lands where it is on the next cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::{LandingAction, LandingInput, LandingProtocol};
use comms_if::eqpt::vehicle::VelocityDems;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SimpleLanding {
    stopped: bool,
    landed: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimpleLanding {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LandingProtocol for SimpleLanding {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn phase_name(&self) -> &'static str {
        match (self.stopped, self.landed) {
            (false, _) => "STOP",
            (true, false) => "LAND",
            (true, true) => "DONE",
        }
    }

    fn start(&mut self, _time_s: f64) {}

    fn step(&mut self, _input: &LandingInput) -> LandingAction {
        if !self.stopped {
            self.stopped = true;
            return LandingAction::Velocity(VelocityDems::hover());
        }

        self.landed = true;
        LandingAction::Land
    }
}
