//! # Landing module
//!
//! Once the follower decides to land it hands control of the vehicle to a [`LandingSession`]. The
//! session wraps one [`LandingProtocol`], which is stepped once per cycle with the latest
//! observation and telemetry and returns the action to perform:
//!
//! - `simple` - stop, then land immediately.
//! - `precision` - search, align, then spiral in on the target until it's close enough to touch
//!   down. Requires a tracker which estimates the target pose.
//! - `glide` - descend continuously, slowing the descent while poorly aligned, until the height
//!   sensor reports the ground is close.
//! - `layered` - descend in fixed height steps, aligning over the target before each one.
//!
//! A session issues the land command at most once, after which it is complete and must not be
//! stepped again.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod glide;
mod layered;
mod params;
mod precision;
mod simple;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{
    tracker::TargetObservation,
    vehicle::{Telemetry, VelocityDems},
};
use log::{info, warn};
use serde::Serialize;
use util::logger::LogHandle;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use self::{
    glide::{GlideLanding, GlideParams, GlidePhase},
    layered::{LayeredLanding, LayeredParams, LayeredPhase},
    params::{LandingParams, LandingProtocolKind},
    precision::{spiral_radius, PrecisionLanding, PrecisionParams, PrecisionPhase, YawCtrlParams},
    simple::SimpleLanding,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A landing strategy, stepped once per cycle.
pub trait LandingProtocol: Send {
    /// Short name of the protocol, used in logs and reports.
    fn name(&self) -> &'static str;

    /// Name of the current phase of the protocol.
    fn phase_name(&self) -> &'static str;

    /// Called once when the landing begins.
    fn start(&mut self, time_s: f64);

    /// Decide the action for this cycle.
    fn step(&mut self, input: &LandingInput) -> LandingAction;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Everything a protocol may use to decide its action for a cycle.
#[derive(Debug, Clone, Copy)]
pub struct LandingInput {
    /// The tracker's observation for this cycle
    pub obs: TargetObservation,

    /// Telemetry from the vehicle, if it could be read this cycle
    pub telemetry: Option<Telemetry>,

    /// Monotonic time of this cycle in seconds
    pub time_s: f64,
}

/// One run of a landing protocol.
pub struct LandingSession {
    protocol: Box<dyn LandingProtocol>,

    reason: Option<LandingReason>,

    started_at_s: Option<f64>,

    land_issued: bool,

    log: LogHandle,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Action requested by a landing protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LandingAction {
    /// Fly with these demands
    Velocity(VelocityDems),

    /// Issue the vehicle's land command
    Land,
}

/// Why the follower started landing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LandingReason {
    /// The overall flight time limit was reached
    FlightTimeout,

    /// The target was lost for longer than the loss timeout
    TargetLossTimeout,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LandingSession {
    pub fn new(protocol: Box<dyn LandingProtocol>, log: LogHandle) -> Self {
        Self {
            protocol,
            reason: None,
            started_at_s: None,
            land_issued: false,
            log,
        }
    }

    /// Begin the landing. Has no effect if the session has already begun.
    pub fn begin(&mut self, reason: LandingReason, time_s: f64) {
        if self.started_at_s.is_some() {
            warn!(
                target: self.log.target(),
                "Landing already in progress, ignoring begin request ({:?})",
                reason
            );
            return;
        }

        info!(
            target: self.log.target(),
            "Beginning {} landing, reason: {:?}",
            self.protocol.name(),
            reason
        );

        self.reason = Some(reason);
        self.started_at_s = Some(time_s);
        self.protocol.start(time_s);
    }

    /// Step the protocol.
    ///
    /// Returns `None` if the session hasn't begun or is already complete.
    pub fn step(&mut self, input: &LandingInput) -> Option<LandingAction> {
        if !self.is_active() {
            return None;
        }

        let action = self.protocol.step(input);

        if action == LandingAction::Land {
            info!(
                target: self.log.target(),
                "{} landing issued land command in phase {}",
                self.protocol.name(),
                self.protocol.phase_name()
            );
            self.land_issued = true;
        }

        Some(action)
    }

    /// True once begun and until the land command has been issued.
    pub fn is_active(&self) -> bool {
        self.started_at_s.is_some() && !self.land_issued
    }

    /// True once the land command has been issued.
    pub fn is_complete(&self) -> bool {
        self.land_issued
    }

    pub fn reason(&self) -> Option<LandingReason> {
        self.reason
    }

    pub fn started_at_s(&self) -> Option<f64> {
        self.started_at_s
    }

    pub fn protocol_name(&self) -> &'static str {
        self.protocol.name()
    }

    pub fn phase_name(&self) -> &'static str {
        self.protocol.phase_name()
    }
}

impl LandingInput {
    pub fn new(obs: TargetObservation, telemetry: Option<Telemetry>, time_s: f64) -> Self {
        Self {
            obs,
            telemetry,
            time_s,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Time since the previous step, or zero on the first step.
///
/// A zero or negative value is passed on as-is, the controllers skip their rate terms for it.
fn step_dt(prev_time_s: &mut Option<f64>, time_s: f64) -> f64 {
    let dt = match *prev_time_s {
        Some(t) => time_s - t,
        None => 0.0,
    };
    *prev_time_s = Some(time_s);

    dt
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut session = LandingSession::new(
            Box::new(SimpleLanding::new()),
            LogHandle::detached("test"),
        );
        let input = LandingInput::new(TargetObservation::Lost, None, 1.0);

        // Not begun yet
        assert!(!session.is_active());
        assert_eq!(session.step(&input), None);

        session.begin(LandingReason::FlightTimeout, 1.0);
        assert!(session.is_active());
        assert_eq!(session.reason(), Some(LandingReason::FlightTimeout));

        // Stop first, then land exactly once
        assert_eq!(
            session.step(&input),
            Some(LandingAction::Velocity(VelocityDems::hover()))
        );
        assert!(!session.is_complete());
        assert_eq!(session.step(&input), Some(LandingAction::Land));
        assert!(session.is_complete());
        assert_eq!(session.step(&input), None);

        // Begin again is ignored
        session.begin(LandingReason::TargetLossTimeout, 2.0);
        assert_eq!(session.reason(), Some(LandingReason::FlightTimeout));
        assert_eq!(session.started_at_s(), Some(1.0));
    }
}
