//! # Vehicle Client
//!
//! Interface to the vehicle being flown. Every call may fail, the control loop decides how to
//! degrade when it does.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::vehicle::{Telemetry, VelocityDems};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait VehicleClient: Send {
    /// Take off and climb to the vehicle's default hover height.
    fn take_off(&mut self) -> Result<(), VehicleClientError>;

    /// Land at the current position.
    fn land(&mut self) -> Result<(), VehicleClientError>;

    /// Send velocity demands to the vehicle.
    fn send_velocity(&mut self, dems: &VelocityDems) -> Result<(), VehicleClientError>;

    /// Read the latest telemetry from the vehicle.
    fn read_telemetry(&mut self) -> Result<Telemetry, VehicleClientError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VehicleClientError {
    #[error("The client is not connected to the vehicle")]
    NotConnected,

    #[error("The vehicle rejected the command: {0}")]
    Rejected(String),

    #[error("The vehicle did not respond in time")]
    Timeout,

    #[error("Communications error: {0}")]
    Io(String),
}
