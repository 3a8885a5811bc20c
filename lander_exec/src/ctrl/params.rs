//! Control law parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{ControlLaw, Pi, Pid, Proportional};
use crate::error::{require_non_negative, require_positive, SetupError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for a control law
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ControlLawParams {
    /// Which law to build
    pub kind: ControlLawKind,

    /// Proportional gain, must be positive
    pub k_p: f64,

    /// Integral gain, unused by the proportional law
    #[serde(default)]
    pub k_i: f64,

    /// Derivative gain, only used by the PID law
    #[serde(default)]
    pub k_d: f64,

    /// Output limit on each axis
    pub vmax: f64,

    /// Limit on the integral accumulation on each axis
    pub integral_limit: f64,

    /// If true the derivative history is cleared when the target is reacquired after being lost,
    /// so the jump in error from the first new detection doesn't kick the derivative term.
    pub reset_derivative_on_reacquire: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ControlLawKind {
    Proportional,
    Pi,
    Pid,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControlLawParams {
    /// Check all gains and limits.
    pub fn validate(&self) -> Result<(), SetupError> {
        require_positive("k_p", self.k_p)?;
        require_non_negative("k_i", self.k_i)?;
        require_non_negative("k_d", self.k_d)?;
        require_positive("vmax", self.vmax)?;
        require_non_negative("integral_limit", self.integral_limit)?;

        Ok(())
    }

    /// Build a fresh instance of the selected law.
    pub fn build(&self) -> Result<Box<dyn ControlLaw>, SetupError> {
        self.validate()?;

        Ok(match self.kind {
            ControlLawKind::Proportional => Box::new(Proportional::new(self.k_p, self.vmax)),
            ControlLawKind::Pi => Box::new(Pi::new(
                self.k_p,
                self.k_i,
                self.integral_limit,
                self.vmax,
            )),
            ControlLawKind::Pid => Box::new(Pid::new(
                self.k_p,
                self.k_i,
                self.k_d,
                self.integral_limit,
                self.vmax,
            )),
        })
    }
}

impl Default for ControlLawParams {
    fn default() -> Self {
        Self {
            kind: ControlLawKind::Pid,
            k_p: 0.5,
            k_i: 0.01,
            k_d: 0.05,
            vmax: 25.0,
            integral_limit: 100.0,
            reset_derivative_on_reacquire: true,
        }
    }
}
