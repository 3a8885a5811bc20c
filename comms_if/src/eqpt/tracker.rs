//! # Tracker Equipment Interface
//!
//! A tracker looks at one camera frame and reports whether the landing target is visible. When it
//! is, the tracker reports the pixel offset from the frame centre to the target centroid, and, if
//! the tracker is able to estimate the target's pose, the distance to the target, the fraction of
//! the frame it fills and the yaw misalignment.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single detection of the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Offset from the frame centre to the target centroid in pixels, (dx, dy).
    pub error_px: Vector2<f64>,

    /// Distance from the camera to the target in centimeters, pose trackers only.
    pub distance_cm: Option<f64>,

    /// Fraction of the frame area covered by the target in [0, 1], pose trackers only.
    pub area_fraction: Option<f64>,

    /// Yaw misalignment between the vehicle and the target in degrees, pose trackers only.
    pub yaw_error_deg: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The result of running a tracker over one frame.
///
/// Losing the target is a normal observation, not an error. The detection data only exists when
/// the target was found, so it cannot be read otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TargetObservation {
    /// The target was not found in the frame
    Lost,

    /// The target was found
    Found(Detection),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Detection {
    /// A detection from a tracker which only provides the pixel error.
    pub fn from_error(dx: f64, dy: f64) -> Self {
        Self {
            error_px: Vector2::new(dx, dy),
            distance_cm: None,
            area_fraction: None,
            yaw_error_deg: None,
        }
    }

    /// A detection carrying the full pose estimate.
    pub fn with_pose(
        dx: f64,
        dy: f64,
        distance_cm: f64,
        area_fraction: f64,
        yaw_error_deg: f64,
    ) -> Self {
        Self {
            error_px: Vector2::new(dx, dy),
            distance_cm: Some(distance_cm),
            area_fraction: Some(area_fraction),
            yaw_error_deg: Some(yaw_error_deg),
        }
    }

    /// Magnitude of the pixel error
    pub fn error_magn_px(&self) -> f64 {
        self.error_px.norm()
    }

    /// True if the pixel error can be used for control.
    pub fn is_finite(&self) -> bool {
        self.error_px.iter().all(|e| e.is_finite())
    }
}

impl TargetObservation {
    pub fn is_found(&self) -> bool {
        matches!(self, TargetObservation::Found(_))
    }

    /// Returns the detection if the target was found.
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            TargetObservation::Found(d) => Some(d),
            TargetObservation::Lost => None,
        }
    }
}

impl Default for TargetObservation {
    fn default() -> Self {
        TargetObservation::Lost
    }
}
