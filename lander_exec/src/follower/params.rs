//! Follower parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::vehicle::VelocityDems;
use serde::{Deserialize, Serialize};

use crate::error::{require_non_negative, require_positive, SetupError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FollowerParams {
    /// Target period of one cycle
    pub cycle_period_s: f64,

    /// Start landing this long after the first cycle, whatever the state
    pub flight_timeout_s: f64,

    /// Start landing if the target has been lost for this long
    pub loss_timeout_s: f64,

    /// Demands sent while waiting for or after losing the target
    #[serde(default)]
    pub hover_dems: VelocityDems,

    /// Number of consecutive connector failures while landing before giving up
    pub max_connector_errors: u32,

    /// Warn if the battery is below this level at takeoff, in percent
    pub low_battery_pct: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FollowerParams {
    pub fn validate(&self) -> Result<(), SetupError> {
        require_positive("cycle_period_s", self.cycle_period_s)?;
        require_positive("flight_timeout_s", self.flight_timeout_s)?;
        require_non_negative("loss_timeout_s", self.loss_timeout_s)?;
        if self.max_connector_errors == 0 {
            return Err(SetupError::InvalidParameter {
                name: "max_connector_errors",
                reason: "must be at least 1".into(),
            });
        }
        require_non_negative("low_battery_pct", self.low_battery_pct)?;

        let h = &self.hover_dems;
        if ![h.vx, h.vy, h.vz, h.yaw_rate].iter().all(|v| v.is_finite()) {
            return Err(SetupError::InvalidParameter {
                name: "hover_dems",
                reason: format!("all demands must be finite, found {:?}", h),
            });
        }

        Ok(())
    }
}

impl Default for FollowerParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.05,
            flight_timeout_s: 40.0,
            loss_timeout_s: 3.0,
            hover_dems: VelocityDems::hover(),
            max_connector_errors: 5,
            low_battery_pct: 20.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(FollowerParams::default().validate().is_ok());

        let p = FollowerParams {
            flight_timeout_s: 0.0,
            ..Default::default()
        };
        assert!(p.validate().is_err());

        let p = FollowerParams {
            hover_dems: VelocityDems::new(0.0, f64::NAN, 0.0, 0.0),
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }
}
