//! # Lander Executable Parameters
//!
//! All parameters of the executable, loaded from a single TOML file.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{
    ctrl::ControlLawParams, error::SetupError, follower::FollowerParams, landing::LandingParams,
    sim::SimParams, vis::VisParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LanderExecParams {
    pub follower: FollowerParams,

    pub control: ControlLawParams,

    pub landing: LandingParams,

    #[serde(default)]
    pub sim: SimParams,

    #[serde(default)]
    pub vis: VisParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LanderExecParams {
    /// Check every parameter table.
    ///
    /// Checks which depend on the equipment, such as the landing protocol needing a pose
    /// estimating tracker, happen when the follower is built.
    pub fn validate(&self) -> Result<(), SetupError> {
        self.follower.validate()?;
        self.control.validate()?;
        self.sim.validate()?;
        self.vis.validate()?;

        Ok(())
    }
}
