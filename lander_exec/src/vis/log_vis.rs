//! # Log visualiser
//!
//! Writes a line per rendered snapshot to the log. Useful when there's no display attached.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::tracker::TargetObservation;
use log::{debug, info};
use util::logger::LogHandle;

use super::{Snapshot, SnapshotSlot, VisError, Visualiser};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct LogVisualiser {
    /// Slot the snapshots are taken from, used to report how many were dropped
    slot: SnapshotSlot,

    num_shown: u64,

    closed: bool,

    log: LogHandle,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LogVisualiser {
    pub fn new(slot: SnapshotSlot, log: LogHandle) -> Self {
        Self {
            slot,
            num_shown: 0,
            closed: false,
            log,
        }
    }

    pub fn num_shown(&self) -> u64 {
        self.num_shown
    }
}

impl Visualiser for LogVisualiser {
    fn show(&mut self, snapshot: &Snapshot) -> Result<(), VisError> {
        if self.closed {
            return Err(VisError::Closed);
        }

        self.num_shown += 1;

        let obs = match snapshot.obs {
            TargetObservation::Found(ref d) => {
                format!("found ({:.1}, {:.1}) px", d.error_px[0], d.error_px[1])
            }
            TargetObservation::Lost => String::from("lost"),
        };

        let dems = match snapshot.dems {
            Some(d) => format!(
                "vx {:.1} vy {:.1} vz {:.1} yaw {:.1}",
                d.vx, d.vy, d.vz, d.yaw_rate
            ),
            None => String::from("none"),
        };

        debug!(
            target: self.log.target(),
            "#{} t={:.2} {:?}{} target {}, dems {}, {} dropped",
            snapshot.cycle,
            snapshot.time_s,
            snapshot.state,
            match snapshot.landing_phase {
                Some(p) => format!("/{}", p),
                None => String::new(),
            },
            obs,
            dems,
            self.slot.num_overwritten()
        );

        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            info!(
                target: self.log.target(),
                "Shown {} of {} snapshots ({} dropped)",
                self.num_shown,
                self.slot.num_published(),
                self.slot.num_overwritten()
            );
        }
        self.closed = true;
    }
}
