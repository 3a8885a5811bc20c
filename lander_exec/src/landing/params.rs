//! Landing parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::logger::LogHandle;

use super::{
    GlideLanding, GlideParams, LandingProtocol, LandingSession, LayeredLanding, LayeredParams,
    PrecisionLanding, PrecisionParams, SimpleLanding,
};
use crate::{ctrl::ControlLawParams, error::SetupError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct LandingParams {
    /// Which protocol to land with
    pub protocol: LandingProtocolKind,

    #[serde(default)]
    pub precision: PrecisionParams,

    #[serde(default)]
    pub glide: GlideParams,

    #[serde(default)]
    pub layered: LayeredParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LandingProtocolKind {
    Simple,
    Precision,
    Glide,
    Layered,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LandingParams {
    /// Build the landing session for the selected protocol.
    ///
    /// Protocols which centre over the target use a fresh instance of the follower's control law.
    pub fn build_session(
        &self,
        tracker_provides_pose: bool,
        control: &ControlLawParams,
        log: &LogHandle,
    ) -> Result<LandingSession, SetupError> {
        let log = log.component(match self.protocol {
            LandingProtocolKind::Simple => "simple",
            LandingProtocolKind::Precision => "precision",
            LandingProtocolKind::Glide => "glide",
            LandingProtocolKind::Layered => "layered",
        });

        let protocol: Box<dyn LandingProtocol> = match self.protocol {
            LandingProtocolKind::Simple => Box::new(SimpleLanding::new()),
            LandingProtocolKind::Precision => Box::new(PrecisionLanding::new(
                self.precision.clone(),
                tracker_provides_pose,
                log.clone(),
            )?),
            LandingProtocolKind::Glide => Box::new(GlideLanding::new(
                self.glide.clone(),
                control,
                log.clone(),
            )?),
            LandingProtocolKind::Layered => Box::new(LayeredLanding::new(
                self.layered.clone(),
                control,
                log.clone(),
            )?),
        };

        Ok(LandingSession::new(protocol, log))
    }
}

impl Default for LandingProtocolKind {
    fn default() -> Self {
        Self::Simple
    }
}
