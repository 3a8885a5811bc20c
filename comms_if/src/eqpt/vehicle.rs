//! # Vehicle Equipment Interface
//!
//! Demands sent to the vehicle and telemetry read back from it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Velocity demands sent to the vehicle each cycle.
///
/// Horizontal velocities follow the camera image axes, `vz` is positive upwards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityDems {
    /// Velocity along the image x axis in cm/s
    pub vx: f64,

    /// Velocity along the image y axis in cm/s
    pub vy: f64,

    /// Vertical velocity in cm/s, positive is up
    pub vz: f64,

    /// Yaw rate in deg/s
    pub yaw_rate: f64,
}

/// Telemetry read back from the vehicle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Height above ground from the time-of-flight sensor, in cm
    pub height_cm: f64,

    /// Remaining battery in percent
    pub battery_pct: f64,

    /// True if the IMU reports the vehicle is not accelerating
    pub imu_stable: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VelocityDems {
    pub fn new(vx: f64, vy: f64, vz: f64, yaw_rate: f64) -> Self {
        Self { vx, vy, vz, yaw_rate }
    }

    /// A zero demand, holding the current position and height.
    pub fn hover() -> Self {
        Self::default()
    }

    /// Returns true if every component is within the symmetric limit.
    pub fn within(&self, limit: f64) -> bool {
        self.vx.abs() <= limit
            && self.vy.abs() <= limit
            && self.vz.abs() <= limit
            && self.yaw_rate.abs() <= limit
    }
}
