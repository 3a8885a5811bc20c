//! # Camera Client
//!
//! Source of camera frames for the control loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::cam::CamImage;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait CamClient: Send {
    /// Get the latest frame from the camera.
    ///
    /// Returns `None` if no frame is currently available. The call must not block waiting for a
    /// new frame.
    fn latest_frame(&mut self) -> Option<CamImage>;
}
