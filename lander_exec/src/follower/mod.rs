//! # Follower
//!
//! The control loop. Each cycle the follower takes the latest frame, asks the tracker where the
//! target is and decides what the vehicle should do:
//!
//! ```text
//! ACQUIRING --found--> TRACKING --lost--> HOVER_ON_LOSS --loss timeout--> LANDING --> TERMINATED
//!                         ^                     |
//!                         +-------found---------+
//! ```
//!
//! - While tracking the control law output is sent as the velocity demand.
//! - While acquiring or after losing the target the configured hover demand is sent. The last
//!   tracking demand is never reused.
//! - While landing the landing session decides all demands.
//!
//! The flight timeout is checked at the start of every cycle and takes priority over everything
//! else. A stop request is honoured between cycles: the hover demand is sent, then a best effort
//! land, and the follower terminates.
//!
//! Every cycle ends by publishing a [`Snapshot`] into the visualisation slot.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

// Internal
use crate::{
    cam_client::CamClient,
    ctrl::{ControlLaw, ControlLawParams},
    error::SetupError,
    landing::{LandingAction, LandingInput, LandingParams, LandingReason, LandingSession},
    tracker::Tracker,
    vehicle_client::{VehicleClient, VehicleClientError},
    vis::{Snapshot, SnapshotSlot},
};
use comms_if::eqpt::{
    cam::CamImage,
    tracker::TargetObservation,
    vehicle::{Telemetry, VelocityDems},
};
use util::logger::LogHandle;

pub use params::FollowerParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The equipment the follower works with.
pub struct Collaborators {
    pub cam: Box<dyn CamClient>,
    pub tracker: Box<dyn Tracker>,
    pub vehicle: Box<dyn VehicleClient>,
}

pub struct Follower {
    params: FollowerParams,

    cam: Box<dyn CamClient>,

    tracker: Box<dyn Tracker>,

    vehicle: Box<dyn VehicleClient>,

    ctrl: Box<dyn ControlLaw>,

    reset_derivative_on_reacquire: bool,

    landing: LandingSession,

    slot: SnapshotSlot,

    stop: Arc<AtomicBool>,

    log: LogHandle,

    state: FollowerState,

    started_at_s: Option<f64>,

    prev_time_s: Option<f64>,

    /// Time the target was lost, while in `HoverOnLoss`
    lost_since_s: Option<f64>,

    /// True if the target has been lost since the last detection
    reacquiring: bool,

    /// The land command failed and must be retried
    land_pending: bool,

    num_cycles: u64,

    num_connector_errors: u64,

    num_consec_landing_errors: u32,

    cancelled: bool,
}

/// Summary of a flight, archived at the end of the run.
#[derive(Debug, Clone, Serialize)]
pub struct FlightReport {
    pub num_cycles: u64,
    pub final_state: FollowerState,
    pub cancelled: bool,
    pub landing_protocol: &'static str,
    pub landing_reason: Option<LandingReason>,
    pub landing_phase: &'static str,
    pub flight_time_s: f64,
    pub num_connector_errors: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FollowerState {
    /// Waiting for the first detection
    Acquiring,

    /// Target found this cycle
    Tracking,

    /// Target lost, holding position
    HoverOnLoss,

    /// The landing session is in control
    Landing,

    /// Landed or cancelled, no more demands are sent
    Terminated,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Follower {
    /// Create a new follower.
    ///
    /// The control law and landing session are built here so that an invalid or inconsistent
    /// configuration is reported before anything flies.
    pub fn new(
        params: FollowerParams,
        collaborators: Collaborators,
        control: &ControlLawParams,
        landing: &LandingParams,
        slot: SnapshotSlot,
        stop: Arc<AtomicBool>,
        log: LogHandle,
    ) -> Result<Self, SetupError> {
        params.validate()?;

        let ctrl = control.build()?;
        let landing = landing.build_session(
            collaborators.tracker.provides_pose(),
            control,
            &log.component("landing"),
        )?;

        info!(
            target: log.target(),
            "Follower created: {} control, {} tracker, {} landing",
            ctrl.name(),
            collaborators.tracker.name(),
            landing.protocol_name()
        );

        Ok(Self {
            params,
            cam: collaborators.cam,
            tracker: collaborators.tracker,
            vehicle: collaborators.vehicle,
            ctrl,
            reset_derivative_on_reacquire: control.reset_derivative_on_reacquire,
            landing,
            slot,
            stop,
            log,
            state: FollowerState::Acquiring,
            started_at_s: None,
            prev_time_s: None,
            lost_since_s: None,
            reacquiring: false,
            land_pending: false,
            num_cycles: 0,
            num_connector_errors: 0,
            num_consec_landing_errors: 0,
            cancelled: false,
        })
    }

    pub fn state(&self) -> FollowerState {
        self.state
    }

    pub fn landing(&self) -> &LandingSession {
        &self.landing
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    /// Take off, then run cycles at the configured period until terminated.
    ///
    /// `clock` gives the monotonic time in seconds. Only a failed takeoff is returned as an
    /// error, faults during the flight are handled by the state machine.
    pub fn run<C>(&mut self, mut clock: C) -> Result<FlightReport, VehicleClientError>
    where
        C: FnMut() -> f64,
    {
        let period = Duration::from_secs_f64(self.params.cycle_period_s);

        self.check_battery();

        info!(target: self.log.target(), "Taking off");
        self.vehicle.take_off()?;
        info!(target: self.log.target(), "Takeoff complete, beginning main loop");

        while self.state != FollowerState::Terminated {
            let cycle_start_instant = Instant::now();

            self.step(clock());

            // ---- CYCLE MANAGEMENT ----

            let cycle_dur = Instant::now() - cycle_start_instant;

            match period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    target: self.log.target(),
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - period.as_secs_f64()
                ),
            }
        }

        Ok(self.report(clock()))
    }

    /// Execute exactly one cycle at `time_s`, returning the state at the end of the cycle.
    pub fn step(&mut self, time_s: f64) -> FollowerState {
        if self.state == FollowerState::Terminated {
            return self.state;
        }

        let dt = match self.prev_time_s {
            Some(t) => time_s - t,
            None => 0.0,
        };
        self.prev_time_s = Some(time_s);
        let started_at_s = *self.started_at_s.get_or_insert(time_s);

        // ---- CANCELLATION ----

        if self.stop.load(Ordering::Relaxed) {
            self.cancel();
            self.publish(time_s, TargetObservation::Lost, None, None);
            self.num_cycles += 1;
            return self.state;
        }

        // ---- OBSERVATION ----

        let frame = self.cam.latest_frame();
        let obs = match frame {
            Some(ref f) => self.tracker.process_frame(f),
            None => {
                warn!(target: self.log.target(), "No frame available, treating target as lost");
                TargetObservation::Lost
            }
        };

        trace!(target: self.log.target(), "t={:.3} {:?} {:?}", time_s, self.state, obs);

        // ---- TIMEOUTS ----

        if self.state != FollowerState::Landing {
            if time_s - started_at_s >= self.params.flight_timeout_s {
                warn!(
                    target: self.log.target(),
                    "Flight timeout of {:.1} s reached",
                    self.params.flight_timeout_s
                );
                self.begin_landing(LandingReason::FlightTimeout, time_s);
            } else if let (FollowerState::HoverOnLoss, TargetObservation::Lost, Some(t)) =
                (self.state, obs, self.lost_since_s)
            {
                if time_s - t >= self.params.loss_timeout_s {
                    warn!(
                        target: self.log.target(),
                        "Target lost for {:.2} s",
                        time_s - t
                    );
                    self.begin_landing(LandingReason::TargetLossTimeout, time_s);
                }
            }
        }

        // ---- COMMAND ----

        let dems = match self.state {
            FollowerState::Landing => self.landing_step(obs, time_s),
            FollowerState::Terminated => None,
            _ => self.follow_step(obs, dt, time_s),
        };

        self.publish(time_s, obs, dems, frame);
        self.num_cycles += 1;

        self.state
    }

    /// Build the report of the flight so far.
    pub fn report(&self, time_s: f64) -> FlightReport {
        FlightReport {
            num_cycles: self.num_cycles,
            final_state: self.state,
            cancelled: self.cancelled,
            landing_protocol: self.landing.protocol_name(),
            landing_reason: self.landing.reason(),
            landing_phase: self.landing.phase_name(),
            flight_time_s: self.started_at_s.map(|t| time_s - t).unwrap_or(0.0),
            num_connector_errors: self.num_connector_errors,
        }
    }

    /// Cycle in any of the following states.
    fn follow_step(
        &mut self,
        obs: TargetObservation,
        dt: f64,
        time_s: f64,
    ) -> Option<VelocityDems> {
        match obs {
            TargetObservation::Found(ref det) => {
                if self.reacquiring && self.reset_derivative_on_reacquire {
                    debug!(target: self.log.target(), "Target reacquired, clearing derivative");
                    self.ctrl.reset_derivative();
                }
                self.reacquiring = false;
                self.lost_since_s = None;
                self.set_state(FollowerState::Tracking);

                let vel = self.ctrl.compute(det.error_px, dt);
                let dems = VelocityDems::new(vel[0], vel[1], 0.0, 0.0);

                match self.vehicle.send_velocity(&dems) {
                    Ok(()) => Some(dems),
                    Err(e) => {
                        self.num_connector_errors += 1;
                        error!(
                            target: self.log.target(),
                            "Could not send demands while tracking: {}",
                            e
                        );
                        self.hover_on_loss(time_s);
                        self.send_hover()
                    }
                }
            }
            TargetObservation::Lost => {
                if self.state == FollowerState::Tracking {
                    self.hover_on_loss(time_s);
                }

                self.send_hover()
            }
        }
    }

    /// Cycle in `Landing`.
    fn landing_step(&mut self, obs: TargetObservation, time_s: f64) -> Option<VelocityDems> {
        let mut cycle_ok = true;
        let mut dems = None;

        if self.land_pending {
            cycle_ok = self.try_land();
        } else {
            let telemetry = match self.vehicle.read_telemetry() {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!(target: self.log.target(), "Could not read telemetry: {}", e);
                    self.num_connector_errors += 1;
                    cycle_ok = false;
                    None
                }
            };

            match self.landing.step(&LandingInput::new(obs, telemetry, time_s)) {
                Some(LandingAction::Velocity(d)) => match self.vehicle.send_velocity(&d) {
                    Ok(()) => dems = Some(d),
                    Err(e) => {
                        error!(
                            target: self.log.target(),
                            "Could not send landing demands: {}",
                            e
                        );
                        self.num_connector_errors += 1;
                        cycle_ok = false;
                    }
                },
                Some(LandingAction::Land) => {
                    self.land_pending = true;
                    cycle_ok &= self.try_land();
                }
                None => {
                    // Session complete with no land pending, nothing left to do
                    self.set_state(FollowerState::Terminated);
                }
            }
        }

        if cycle_ok {
            self.num_consec_landing_errors = 0;
        } else {
            self.num_consec_landing_errors += 1;

            if self.num_consec_landing_errors >= self.params.max_connector_errors {
                error!(
                    target: self.log.target(),
                    "{} consecutive connector errors while landing, aborting",
                    self.num_consec_landing_errors
                );
                self.best_effort_land();
                self.set_state(FollowerState::Terminated);
            }
        }

        dems
    }

    /// Issue the land command, returning true on success.
    fn try_land(&mut self) -> bool {
        match self.vehicle.land() {
            Ok(()) => {
                info!(target: self.log.target(), "Land command accepted");
                self.land_pending = false;
                self.set_state(FollowerState::Terminated);
                true
            }
            Err(e) => {
                error!(target: self.log.target(), "Land command failed: {}", e);
                self.num_connector_errors += 1;
                false
            }
        }
    }

    fn begin_landing(&mut self, reason: LandingReason, time_s: f64) {
        self.landing.begin(reason, time_s);
        self.set_state(FollowerState::Landing);
    }

    fn hover_on_loss(&mut self, time_s: f64) {
        self.reacquiring = true;
        if self.lost_since_s.is_none() {
            self.lost_since_s = Some(time_s);
        }
        self.set_state(FollowerState::HoverOnLoss);
    }

    fn send_hover(&mut self) -> Option<VelocityDems> {
        let dems = self.params.hover_dems;

        match self.vehicle.send_velocity(&dems) {
            Ok(()) => Some(dems),
            Err(e) => {
                self.num_connector_errors += 1;
                warn!(target: self.log.target(), "Could not send hover demands: {}", e);

                // Losing the link while tracking degrades to hovering
                if self.state == FollowerState::Tracking
                    || self.state == FollowerState::Acquiring
                {
                    let time_s = self.prev_time_s.unwrap_or(0.0);
                    self.hover_on_loss(time_s);
                }
                None
            }
        }
    }

    fn cancel(&mut self) {
        warn!(
            target: self.log.target(),
            "Stop requested in {:?}, stopping the vehicle",
            self.state
        );

        self.cancelled = true;
        let hover = self.params.hover_dems;
        if let Err(e) = self.vehicle.send_velocity(&hover) {
            self.num_connector_errors += 1;
            warn!(target: self.log.target(), "Could not send hover demands: {}", e);
        }
        self.best_effort_land();

        self.set_state(FollowerState::Terminated);
    }

    fn best_effort_land(&mut self) {
        if let Err(e) = self.vehicle.land() {
            self.num_connector_errors += 1;
            error!(target: self.log.target(), "Best effort land failed: {}", e);
        }
    }

    fn check_battery(&mut self) {
        match self.vehicle.read_telemetry() {
            Ok(Telemetry { battery_pct, .. }) => {
                if battery_pct < self.params.low_battery_pct {
                    warn!(
                        target: self.log.target(),
                        "Battery low: {:.0} % (warning level {:.0} %)",
                        battery_pct,
                        self.params.low_battery_pct
                    );
                } else {
                    info!(target: self.log.target(), "Battery: {:.0} %", battery_pct);
                }
            }
            Err(e) => {
                self.num_connector_errors += 1;
                warn!(target: self.log.target(), "Could not read battery level: {}", e);
            }
        }
    }

    fn set_state(&mut self, state: FollowerState) {
        if state != self.state {
            info!(
                target: self.log.target(),
                "{:?} -> {:?}",
                self.state,
                state
            );
            self.state = state;
        }
    }

    fn publish(
        &self,
        time_s: f64,
        obs: TargetObservation,
        dems: Option<VelocityDems>,
        frame: Option<CamImage>,
    ) {
        self.slot.publish(Snapshot {
            cycle: self.num_cycles,
            time_s,
            state: self.state,
            landing_phase: match self.landing.started_at_s() {
                Some(_) => Some(self.landing.phase_name()),
                None => None,
            },
            obs,
            dems,
            frame,
        });
    }
}
