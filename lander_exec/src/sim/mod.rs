//! # Simulation
//!
//! Simple kinematic simulation of the vehicle above the landing target, used to fly the
//! controller without hardware. The vehicle moves exactly as demanded, the tracker sees the
//! target through an ideal pinhole camera looking straight down.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod tracker;
mod vehicle;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard};

use comms_if::eqpt::vehicle::VelocityDems;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{require_positive, SetupError};

pub use self::{
    tracker::{SimCamera, SimTracker},
    vehicle::SimVehicle,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimParams {
    /// Offset from the vehicle to the target at the start, in cm along the image axes
    pub initial_offset_cm: [f64; 2],

    /// Yaw error at the start, in degrees
    #[serde(default)]
    pub initial_yaw_deg: f64,

    /// Height the vehicle climbs to on takeoff
    pub takeoff_height_cm: f64,

    /// Focal length of the simulated camera, in pixels
    pub focal_length_px: f64,

    /// Side length of the square target
    pub target_size_cm: f64,

    /// Frame width in pixels
    pub frame_width: u32,

    /// Frame height in pixels
    pub frame_height: u32,

    /// If true the simulated tracker reports distance, area and yaw
    pub pose: bool,

    /// Every n-th frame the target is not detected, 0 for never
    #[serde(default)]
    pub dropout_period: u32,
}

/// Shared handle to the simulated world.
#[derive(Clone)]
pub struct SimWorld {
    state: Arc<Mutex<SimState>>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SimState {
    /// Offset from the vehicle to the target in cm
    pub offset_cm: Vector2<f64>,

    /// Height above the ground in cm
    pub height_cm: f64,

    /// Yaw of the target relative to the vehicle in degrees
    pub yaw_error_deg: f64,

    /// Current demanded velocity
    pub velocity: VelocityDems,

    pub airborne: bool,

    pub landed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimParams {
    pub fn validate(&self) -> Result<(), SetupError> {
        require_positive("takeoff_height_cm", self.takeoff_height_cm)?;
        require_positive("focal_length_px", self.focal_length_px)?;
        require_positive("target_size_cm", self.target_size_cm)?;
        if !self.initial_offset_cm[0].is_finite()
            || !self.initial_offset_cm[1].is_finite()
            || !self.initial_yaw_deg.is_finite()
        {
            return Err(SetupError::InvalidParameter {
                name: "initial_offset_cm",
                reason: "initial offset and yaw must be finite".into(),
            });
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(SetupError::InvalidParameter {
                name: "frame_width",
                reason: "frame dimensions must be non-zero".into(),
            });
        }

        Ok(())
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            initial_offset_cm: [30.0, -20.0],
            initial_yaw_deg: 0.0,
            takeoff_height_cm: 100.0,
            focal_length_px: 300.0,
            target_size_cm: 20.0,
            frame_width: 320,
            frame_height: 240,
            pose: true,
            dropout_period: 0,
        }
    }
}

impl SimWorld {
    /// Create a world with the vehicle on the ground, offset from the target.
    pub fn new(params: &SimParams) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                offset_cm: Vector2::new(params.initial_offset_cm[0], params.initial_offset_cm[1]),
                height_cm: 0.0,
                yaw_error_deg: params.initial_yaw_deg,
                velocity: VelocityDems::hover(),
                airborne: false,
                landed: false,
            })),
        }
    }

    /// Copy of the current state.
    pub fn state(&self) -> SimState {
        *self.lock()
    }

    /// Move the vehicle at the current demanded velocity for `dt_s` seconds.
    pub fn advance(&self, dt_s: f64) {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return;
        }

        let mut s = self.lock();
        if !s.airborne {
            return;
        }

        let v = s.velocity;
        s.offset_cm -= Vector2::new(v.vx, v.vy) * dt_s;
        s.yaw_error_deg -= v.yaw_rate * dt_s;
        s.height_cm += v.vz * dt_s;

        if s.height_cm <= 0.0 {
            s.height_cm = 0.0;
            s.airborne = false;
            s.landed = true;
            s.velocity = VelocityDems::hover();
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<SimState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_advance_moves_towards_target() {
        let world = SimWorld::new(&SimParams::default());

        // Nothing moves on the ground
        world.lock().velocity = VelocityDems::new(10.0, 0.0, 0.0, 0.0);
        world.advance(1.0);
        assert_eq!(world.state().offset_cm, Vector2::new(30.0, -20.0));

        {
            let mut s = world.lock();
            s.airborne = true;
            s.height_cm = 50.0;
        }
        world.advance(1.0);
        assert_eq!(world.state().offset_cm, Vector2::new(20.0, -20.0));

        // Descend through the ground
        world.lock().velocity = VelocityDems::new(0.0, 0.0, -100.0, 0.0);
        world.advance(1.0);
        let s = world.state();
        assert!(s.landed && !s.airborne);
        assert_eq!(s.height_cm, 0.0);
    }
}
