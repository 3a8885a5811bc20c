//! # Tracker interface
//!
//! A tracker locates the landing target in a camera frame. The detection algorithm itself lives
//! outside the controller, all the controller needs is this interface.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{cam::CamImage, tracker::TargetObservation};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait Tracker: Send {
    /// Short name of the tracker, used in logs.
    fn name(&self) -> &str;

    /// Returns true if this tracker fills in the pose fields of its detections (distance, area
    /// fraction, and yaw error).
    fn provides_pose(&self) -> bool;

    /// Locate the target in the given frame.
    ///
    /// A tracker may smooth its output using its own history, but the controller does not rely
    /// on it doing so.
    fn process_frame(&mut self, frame: &CamImage) -> TargetObservation;
}
