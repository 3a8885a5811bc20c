//! # Visualisation
//!
//! The follower publishes a [`Snapshot`] of every cycle into a [`SnapshotSlot`]. A separate
//! [`VisThread`] takes whatever snapshot is current and renders it with a [`Visualiser`]. The slot
//! holds a single snapshot, publishing replaces any snapshot that hasn't been rendered yet, so a
//! slow visualiser drops frames instead of slowing down the control loop.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod frames;
mod log_vis;
mod slot;
mod thread;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{cam::CamImage, tracker::TargetObservation, vehicle::VelocityDems};
use serde::{Deserialize, Serialize};

use crate::{
    error::{require_positive, SetupError},
    follower::FollowerState,
};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use self::{
    frames::FrameSaver,
    log_vis::LogVisualiser,
    slot::SnapshotSlot,
    thread::{VisStats, VisThread},
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Renders snapshots of the control loop.
pub trait Visualiser: Send {
    /// Render one snapshot.
    fn show(&mut self, snapshot: &Snapshot) -> Result<(), VisError>;

    /// Release any resources held by the visualiser.
    fn close(&mut self);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Read-only record of one control cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Cycle number, starting at 0
    pub cycle: u64,

    /// Time of the cycle in seconds
    pub time_s: f64,

    /// Follower state at the end of the cycle
    pub state: FollowerState,

    /// Landing protocol phase, if landing
    pub landing_phase: Option<&'static str>,

    /// Observation made this cycle
    pub obs: TargetObservation,

    /// Demands sent this cycle, `None` if no velocity demand was sent
    pub dems: Option<VelocityDems>,

    /// The frame the observation was made on
    pub frame: Option<CamImage>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VisParams {
    /// Which visualiser to run
    pub kind: VisKind,

    /// Maximum time the visualisation thread waits for a snapshot before checking for stop
    pub poll_period_s: f64,

    /// Only every n-th rendered snapshot is saved by the frame saver
    #[serde(default = "default_save_every_n")]
    pub save_every_n: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisKind {
    /// Log each snapshot
    Log,

    /// Save annotated frames into the session archive
    Frames,
}

#[derive(Debug, thiserror::Error)]
pub enum VisError {
    #[error("The visualiser has been closed")]
    Closed,

    #[error("Could not save frame: {0}")]
    SaveError(#[from] image::ImageError),

    #[error("Could not create the output directory: {0}")]
    DirError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VisParams {
    pub fn validate(&self) -> Result<(), SetupError> {
        require_positive("poll_period_s", self.poll_period_s)?;
        if self.save_every_n == 0 {
            return Err(SetupError::InvalidParameter {
                name: "save_every_n",
                reason: "must be at least 1".into(),
            });
        }

        Ok(())
    }
}

impl Default for VisParams {
    fn default() -> Self {
        Self {
            kind: VisKind::Log,
            poll_period_s: 0.1,
            save_every_n: default_save_every_n(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_save_every_n() -> u64 {
    10
}

#[cfg(test)]
pub(crate) fn test_snapshot(cycle: u64) -> Snapshot {
    Snapshot {
        cycle,
        time_s: cycle as f64 * 0.05,
        state: FollowerState::Tracking,
        landing_phase: None,
        obs: TargetObservation::Found(comms_if::eqpt::tracker::Detection::from_error(
            10.0, -5.0,
        )),
        dems: Some(VelocityDems::new(5.0, -2.5, 0.0, 0.0)),
        frame: None,
    }
}
