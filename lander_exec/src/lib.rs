//! # Lander library.
//!
//! Visual servoing controller which follows a target seen by a downward facing camera and lands
//! on it. The executable wires these modules to real or simulated equipment.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Camera client - source of frames
pub mod cam_client;

/// Control laws - convert the target pixel error into velocity demands
pub mod ctrl;

/// Setup errors
pub mod error;

/// Follower - the control loop state machine
pub mod follower;

/// Landing protocols - take over the vehicle once the follower decides to land
pub mod landing;

/// Executable parameters
pub mod params;

/// Simulated equipment
pub mod sim;

/// Tracker interface - locates the target in a frame
pub mod tracker;

/// Vehicle client - sends demands to and reads telemetry from the vehicle
pub mod vehicle_client;

/// Visualisation - renders snapshots of the control loop in the background
pub mod vis;

#[cfg(test)]
mod test_utils;
