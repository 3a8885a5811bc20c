//! # Precision landing
//!
//! Four phase landing for pose estimating trackers:
//!
//! - `SEARCH` - target not visible, fly a constant radius circle until it is seen.
//! - `ALIGN` - centre over the target and null the yaw error. Moving on requires the vehicle to
//!   stay aligned for a number of consecutive frames.
//! - `APPROACH` - descend while following a tightening spiral, blending into direct centering as
//!   the target fills more of the frame.
//! - `TOUCHDOWN` - close enough, land.
//!
//! Losing the target for longer than [`LOSS_GRACE_S`] during `ALIGN` or `APPROACH` returns to
//! `SEARCH`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::TAU;

use comms_if::eqpt::{
    tracker::{Detection, TargetObservation},
    vehicle::VelocityDems,
};
use log::{debug, info, warn};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::{
    logger::LogHandle,
    maths::{clamp, sat_sym, wrap_2pi},
};

use super::{step_dt, LandingAction, LandingInput, LandingProtocol};
use crate::{
    ctrl::{ControlLaw, ControlLawParams, PidAxis},
    error::{require_non_negative, require_positive, SetupError},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Time the target may be lost during `ALIGN` or `APPROACH` before searching again.
pub const LOSS_GRACE_S: f64 = 2.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PrecisionParams {
    /// Fraction of the frame the target must fill before touching down
    pub target_area_fraction: f64,

    /// Distance to the target below which touchdown is allowed, in centimetres
    pub min_distance_cm: f64,

    /// Pixel error magnitude below which the vehicle counts as aligned
    pub align_threshold_px: f64,

    /// Yaw error below which the vehicle counts as aligned, in degrees
    pub yaw_threshold_deg: f64,

    /// Number of consecutive aligned frames needed to start the approach
    pub aligned_frames: u32,

    /// Speed of the circular search pattern
    pub search_radius: f64,

    /// Angle the search pattern advances each cycle, in radians
    pub search_step_rad: f64,

    /// Radius of the approach spiral at zero swept angle
    pub spiral_initial_radius: f64,

    /// Factor the spiral radius shrinks by each full turn, in (0, 1]
    pub spiral_tightening_rate: f64,

    /// Angle the spiral sweeps each cycle, in radians
    pub spiral_step_rad: f64,

    /// Proportional gain of the centering term during the approach
    pub centering_gain: f64,

    /// Descent speed during the approach, in centimetres per second
    pub approach_descent_speed: f64,

    /// Land immediately if the landing takes longer than this
    pub max_landing_time_s: f64,

    /// Position control during alignment
    pub position: ControlLawParams,

    /// Yaw control during alignment
    pub yaw: YawCtrlParams,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct YawCtrlParams {
    pub k_p: f64,

    #[serde(default)]
    pub k_i: f64,

    #[serde(default)]
    pub k_d: f64,

    pub integral_limit: f64,

    /// Yaw rate limit, in degrees per second
    pub vmax: f64,
}

pub struct PrecisionLanding {
    params: PrecisionParams,

    phase: PrecisionPhase,

    started_at_s: Option<f64>,

    prev_time_s: Option<f64>,

    last_seen_at_s: Option<f64>,

    consecutive_aligned_frames: u32,

    was_lost: bool,

    search_angle_rad: f64,

    spiral_angle_rad: f64,

    spiral_radius: f64,

    position_ctrl: Box<dyn ControlLaw>,

    yaw_ctrl: PidAxis,

    log: LogHandle,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrecisionPhase {
    Search,
    Align,
    Approach,
    Touchdown,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PrecisionParams {
    pub fn validate(&self) -> Result<(), SetupError> {
        require_positive("target_area_fraction", self.target_area_fraction)?;
        if self.target_area_fraction > 1.0 {
            return Err(SetupError::InvalidParameter {
                name: "target_area_fraction",
                reason: format!("must not exceed 1, found {}", self.target_area_fraction),
            });
        }
        require_positive("min_distance_cm", self.min_distance_cm)?;
        require_positive("align_threshold_px", self.align_threshold_px)?;
        require_positive("yaw_threshold_deg", self.yaw_threshold_deg)?;
        if self.aligned_frames == 0 {
            return Err(SetupError::InvalidParameter {
                name: "aligned_frames",
                reason: "must be at least 1".into(),
            });
        }
        require_non_negative("search_radius", self.search_radius)?;
        require_positive("search_step_rad", self.search_step_rad)?;
        require_non_negative("spiral_initial_radius", self.spiral_initial_radius)?;
        require_positive("spiral_tightening_rate", self.spiral_tightening_rate)?;
        if self.spiral_tightening_rate > 1.0 {
            return Err(SetupError::InvalidParameter {
                name: "spiral_tightening_rate",
                reason: format!("must not exceed 1, found {}", self.spiral_tightening_rate),
            });
        }
        require_positive("spiral_step_rad", self.spiral_step_rad)?;
        require_positive("centering_gain", self.centering_gain)?;
        require_non_negative("approach_descent_speed", self.approach_descent_speed)?;
        require_positive("max_landing_time_s", self.max_landing_time_s)?;
        self.position.validate()?;
        self.yaw.validate()?;

        Ok(())
    }
}

impl Default for PrecisionParams {
    fn default() -> Self {
        Self {
            target_area_fraction: 0.15,
            min_distance_cm: 20.0,
            align_threshold_px: 10.0,
            yaw_threshold_deg: 5.0,
            aligned_frames: 10,
            search_radius: 20.0,
            search_step_rad: 0.025,
            spiral_initial_radius: 50.0,
            spiral_tightening_rate: 0.95,
            spiral_step_rad: 0.1,
            centering_gain: 0.2,
            approach_descent_speed: 10.0,
            max_landing_time_s: 30.0,
            position: ControlLawParams {
                k_p: 0.3,
                k_i: 0.01,
                k_d: 0.1,
                vmax: 50.0,
                ..Default::default()
            },
            yaw: YawCtrlParams::default(),
        }
    }
}

impl YawCtrlParams {
    pub fn validate(&self) -> Result<(), SetupError> {
        require_positive("yaw.k_p", self.k_p)?;
        require_non_negative("yaw.k_i", self.k_i)?;
        require_non_negative("yaw.k_d", self.k_d)?;
        require_non_negative("yaw.integral_limit", self.integral_limit)?;
        require_positive("yaw.vmax", self.vmax)?;

        Ok(())
    }
}

impl Default for YawCtrlParams {
    fn default() -> Self {
        Self {
            k_p: 0.5,
            k_i: 0.01,
            k_d: 0.1,
            integral_limit: 100.0,
            vmax: 30.0,
        }
    }
}

impl PrecisionLanding {
    /// Create the protocol.
    ///
    /// Precision landing needs the distance and area estimates of a pose estimating tracker, so
    /// `tracker_provides_pose` must be true.
    pub fn new(
        params: PrecisionParams,
        tracker_provides_pose: bool,
        log: LogHandle,
    ) -> Result<Self, SetupError> {
        if !tracker_provides_pose {
            return Err(SetupError::InvalidConfiguration(
                "precision landing requires a tracker which provides the target pose".into(),
            ));
        }

        params.validate()?;

        let position_ctrl = params.position.build()?;
        let yaw_ctrl = PidAxis::new(
            params.yaw.k_p,
            params.yaw.k_i,
            params.yaw.k_d,
            params.yaw.integral_limit,
        );
        let spiral_radius = params.spiral_initial_radius;

        Ok(Self {
            params,
            phase: PrecisionPhase::Search,
            started_at_s: None,
            prev_time_s: None,
            last_seen_at_s: None,
            consecutive_aligned_frames: 0,
            was_lost: false,
            search_angle_rad: 0.0,
            spiral_angle_rad: 0.0,
            spiral_radius,
            position_ctrl,
            yaw_ctrl,
            log,
        })
    }

    pub fn phase(&self) -> PrecisionPhase {
        self.phase
    }

    pub fn consecutive_aligned_frames(&self) -> u32 {
        self.consecutive_aligned_frames
    }

    pub fn spiral_radius(&self) -> f64 {
        self.spiral_radius
    }

    fn enter(&mut self, phase: PrecisionPhase) {
        if phase == self.phase {
            return;
        }

        info!(
            target: self.log.target(),
            "{:?} -> {:?}",
            self.phase,
            phase
        );

        match phase {
            PrecisionPhase::Search => {
                self.consecutive_aligned_frames = 0;
            }
            PrecisionPhase::Align => {
                self.consecutive_aligned_frames = 0;
                self.position_ctrl.reset_derivative();
                self.yaw_ctrl.reset_derivative();
            }
            PrecisionPhase::Approach => {
                self.spiral_angle_rad = 0.0;
                self.spiral_radius = self.params.spiral_initial_radius;
            }
            PrecisionPhase::Touchdown => (),
        }

        self.phase = phase;
    }

    fn on_detection(&mut self, det: &Detection, dt: f64) -> LandingAction {
        if self.phase == PrecisionPhase::Search {
            self.enter(PrecisionPhase::Align);
        }

        match self.phase {
            PrecisionPhase::Align => {
                if self.is_aligned(det) {
                    self.consecutive_aligned_frames += 1;
                } else {
                    self.consecutive_aligned_frames = 0;
                }

                debug!(
                    target: self.log.target(),
                    "Aligned for {}/{} frames",
                    self.consecutive_aligned_frames,
                    self.params.aligned_frames
                );

                if self.consecutive_aligned_frames >= self.params.aligned_frames {
                    self.enter(PrecisionPhase::Approach);
                    self.approach(det)
                } else {
                    self.align(det, dt)
                }
            }
            PrecisionPhase::Approach => {
                if self.touchdown_reached(det) {
                    self.enter(PrecisionPhase::Touchdown);
                    LandingAction::Land
                } else {
                    self.approach(det)
                }
            }
            _ => LandingAction::Velocity(VelocityDems::hover()),
        }
    }

    fn on_lost(&mut self, time_s: f64) -> LandingAction {
        match self.phase {
            PrecisionPhase::Search => self.search(),
            PrecisionPhase::Align | PrecisionPhase::Approach => {
                // A lost frame breaks the run of aligned frames
                self.consecutive_aligned_frames = 0;

                let lost_for_s = match self.last_seen_at_s {
                    Some(t) => time_s - t,
                    None => f64::INFINITY,
                };

                if lost_for_s > LOSS_GRACE_S {
                    warn!(
                        target: self.log.target(),
                        "Target lost for {:.2} s, searching",
                        lost_for_s
                    );
                    self.enter(PrecisionPhase::Search);
                    self.search()
                } else {
                    LandingAction::Velocity(VelocityDems::hover())
                }
            }
            PrecisionPhase::Touchdown => LandingAction::Velocity(VelocityDems::hover()),
        }
    }

    fn is_aligned(&self, det: &Detection) -> bool {
        let yaw_aligned = match det.yaw_error_deg {
            Some(y) => y.abs() < self.params.yaw_threshold_deg,
            None => false,
        };

        det.error_magn_px() < self.params.align_threshold_px && yaw_aligned
    }

    fn touchdown_reached(&self, det: &Detection) -> bool {
        match (det.area_fraction, det.distance_cm) {
            (Some(area), Some(dist)) => {
                area >= self.params.target_area_fraction && dist <= self.params.min_distance_cm
            }
            _ => false,
        }
    }

    fn search(&mut self) -> LandingAction {
        let r = self.params.search_radius;
        let theta = self.search_angle_rad;

        self.search_angle_rad = wrap_2pi(theta + self.params.search_step_rad);

        LandingAction::Velocity(VelocityDems::new(r * theta.cos(), r * theta.sin(), 0.0, 0.0))
    }

    fn align(&mut self, det: &Detection, dt: f64) -> LandingAction {
        let vel = self.position_ctrl.compute(det.error_px, dt);

        let yaw_rate = match det.yaw_error_deg {
            Some(y) => sat_sym(self.yaw_ctrl.get(y, dt), self.params.yaw.vmax),
            None => 0.0,
        };

        LandingAction::Velocity(VelocityDems::new(vel[0], vel[1], 0.0, yaw_rate))
    }

    fn approach(&mut self, det: &Detection) -> LandingAction {
        self.spiral_angle_rad += self.params.spiral_step_rad;
        self.spiral_radius = spiral_radius(
            self.params.spiral_initial_radius,
            self.params.spiral_tightening_rate,
            self.spiral_angle_rad,
        );

        let theta = self.spiral_angle_rad;
        let spiral = Vector2::new(theta.cos(), theta.sin()) * self.spiral_radius;
        let centering = det.error_px * self.params.centering_gain;

        let b = blend_factor(det.area_fraction, self.params.target_area_fraction);
        let vmax = self.params.position.vmax;
        let cmd = (spiral * (1.0 - b) + centering * b).map(|v| sat_sym(v, vmax));

        LandingAction::Velocity(VelocityDems::new(
            cmd[0],
            cmd[1],
            -self.params.approach_descent_speed,
            0.0,
        ))
    }
}

impl LandingProtocol for PrecisionLanding {
    fn name(&self) -> &'static str {
        "precision"
    }

    fn phase_name(&self) -> &'static str {
        match self.phase {
            PrecisionPhase::Search => "SEARCH",
            PrecisionPhase::Align => "ALIGN",
            PrecisionPhase::Approach => "APPROACH",
            PrecisionPhase::Touchdown => "TOUCHDOWN",
        }
    }

    fn start(&mut self, time_s: f64) {
        self.started_at_s = Some(time_s);
    }

    fn step(&mut self, input: &LandingInput) -> LandingAction {
        let dt = step_dt(&mut self.prev_time_s, input.time_s);

        if self.phase == PrecisionPhase::Touchdown {
            return LandingAction::Land;
        }

        let started_at_s = *self.started_at_s.get_or_insert(input.time_s);
        if input.time_s - started_at_s > self.params.max_landing_time_s {
            warn!(
                target: self.log.target(),
                "Landing took longer than {:.1} s, landing now",
                self.params.max_landing_time_s
            );
            self.enter(PrecisionPhase::Touchdown);
            return LandingAction::Land;
        }

        match input.obs {
            TargetObservation::Found(ref det) if det.is_finite() => {
                self.last_seen_at_s = Some(input.time_s);

                if self.was_lost && self.params.position.reset_derivative_on_reacquire {
                    self.position_ctrl.reset_derivative();
                    self.yaw_ctrl.reset_derivative();
                }
                self.was_lost = false;

                self.on_detection(det, dt)
            }
            TargetObservation::Found(ref det) => {
                warn!(
                    target: self.log.target(),
                    "Unusable target error {:?}, treating as lost",
                    det.error_px
                );
                self.was_lost = true;
                self.on_lost(input.time_s)
            }
            TargetObservation::Lost => {
                self.was_lost = true;
                self.on_lost(input.time_s)
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Radius of the approach spiral after sweeping `angle_rad`.
///
/// The radius shrinks by `tightening_rate` for every full turn.
pub fn spiral_radius(initial_radius: f64, tightening_rate: f64, angle_rad: f64) -> f64 {
    initial_radius * tightening_rate.powf(angle_rad / TAU)
}

/// Weight of the centering command against the spiral, rising to 1 as the target fills the frame.
///
/// With no area estimate the spiral alone is flown.
fn blend_factor(area_fraction: Option<f64>, target_area_fraction: f64) -> f64 {
    match area_fraction {
        Some(a) => clamp(a / target_area_fraction, 0.0, 1.0),
        None => 0.0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DT: f64 = 0.05;

    struct Harness {
        landing: PrecisionLanding,
        time_s: f64,
    }

    impl Harness {
        fn new(params: PrecisionParams) -> Self {
            let mut landing =
                PrecisionLanding::new(params, true, LogHandle::detached("precision")).unwrap();
            landing.start(0.0);

            Self {
                landing,
                time_s: 0.0,
            }
        }

        fn step(&mut self, obs: TargetObservation) -> LandingAction {
            self.time_s += DT;
            self.landing
                .step(&LandingInput::new(obs, None, self.time_s))
        }

        fn wait(&mut self, duration_s: f64) {
            self.time_s += duration_s;
        }
    }

    fn aligned() -> TargetObservation {
        TargetObservation::Found(Detection::with_pose(1.0, -1.0, 100.0, 0.01, 0.5))
    }

    fn misaligned() -> TargetObservation {
        TargetObservation::Found(Detection::with_pose(40.0, 0.0, 100.0, 0.01, 0.5))
    }

    fn at(area_fraction: f64, distance_cm: f64) -> TargetObservation {
        TargetObservation::Found(Detection::with_pose(
            1.0,
            1.0,
            distance_cm,
            area_fraction,
            0.0,
        ))
    }

    /// Drive the protocol from SEARCH to APPROACH.
    fn into_approach(h: &mut Harness) {
        for _ in 0..h.landing.params.aligned_frames {
            h.step(aligned());
        }
        assert_eq!(h.landing.phase(), PrecisionPhase::Approach);
    }

    #[test]
    fn test_non_pose_tracker_rejected() {
        match PrecisionLanding::new(
            PrecisionParams::default(),
            false,
            LogHandle::detached("precision"),
        ) {
            Err(SetupError::InvalidConfiguration(_)) => (),
            _ => panic!("Expected InvalidConfiguration"),
        }
    }

    #[test]
    fn test_search_circle() {
        let mut h = Harness::new(PrecisionParams::default());

        for _ in 0..20 {
            match h.step(TargetObservation::Lost) {
                LandingAction::Velocity(v) => {
                    let r = (v.vx.powi(2) + v.vy.powi(2)).sqrt();
                    assert!((r - 20.0).abs() < 1e-9);
                    assert_eq!(v.vz, 0.0);
                }
                LandingAction::Land => panic!("Land during search"),
            }
        }
        assert_eq!(h.landing.phase(), PrecisionPhase::Search);

        h.step(misaligned());
        assert_eq!(h.landing.phase(), PrecisionPhase::Align);
    }

    #[test]
    fn test_debounce_holds_on_single_bad_frame() {
        let mut h = Harness::new(PrecisionParams::default());
        let n = h.landing.params.aligned_frames;

        // Enter ALIGN with a misaligned frame
        h.step(misaligned());
        assert_eq!(h.landing.phase(), PrecisionPhase::Align);

        for _ in 0..(n - 1) {
            h.step(aligned());
        }
        h.step(misaligned());
        assert_eq!(h.landing.phase(), PrecisionPhase::Align);
        assert_eq!(h.landing.consecutive_aligned_frames(), 0);

        for i in 0..n {
            assert_eq!(h.landing.phase(), PrecisionPhase::Align, "frame {}", i);
            h.step(aligned());
        }
        assert_eq!(h.landing.phase(), PrecisionPhase::Approach);
    }

    #[test]
    fn test_yaw_must_also_be_aligned() {
        let mut h = Harness::new(PrecisionParams::default());

        let yawed = TargetObservation::Found(Detection::with_pose(0.0, 0.0, 100.0, 0.01, 10.0));
        for _ in 0..50 {
            h.step(yawed);
        }
        assert_eq!(h.landing.phase(), PrecisionPhase::Align);

        match h.step(yawed) {
            LandingAction::Velocity(v) => {
                assert!(v.yaw_rate > 0.0);
                assert!(v.yaw_rate <= 30.0);
            }
            LandingAction::Land => panic!("Land during align"),
        }
    }

    #[test]
    fn test_touchdown_needs_both_conditions() {
        let params = PrecisionParams::default();
        let target = params.target_area_fraction;
        let min_dist = params.min_distance_cm;

        // Area reached, too far
        let mut h = Harness::new(params.clone());
        into_approach(&mut h);
        assert_ne!(h.step(at(target, min_dist + 1.0)), LandingAction::Land);
        assert_eq!(h.landing.phase(), PrecisionPhase::Approach);

        // Close enough, area not reached
        let mut h = Harness::new(params.clone());
        into_approach(&mut h);
        assert_ne!(h.step(at(target - 0.01, min_dist)), LandingAction::Land);
        assert_eq!(h.landing.phase(), PrecisionPhase::Approach);

        // Both
        let mut h = Harness::new(params);
        into_approach(&mut h);
        assert_eq!(h.step(at(target, min_dist)), LandingAction::Land);
        assert_eq!(h.landing.phase(), PrecisionPhase::Touchdown);
        assert_eq!(h.landing.phase_name(), "TOUCHDOWN");
    }

    #[test]
    fn test_spiral_radius_non_increasing() {
        for rate in &[0.1, 0.5, 0.95, 0.999] {
            let mut prev = spiral_radius(50.0, *rate, 0.0);
            assert_eq!(prev, 50.0);

            for i in 1..1000 {
                let r = spiral_radius(50.0, *rate, i as f64 * 0.1);
                assert!(r <= prev);
                assert!(r >= 0.0);
                prev = r;
            }
        }

        // One full turn shrinks by the tightening rate
        assert!((spiral_radius(50.0, 0.95, TAU) - 47.5).abs() < 1e-9);
    }

    #[test]
    fn test_approach_descends_and_blends() {
        let mut h = Harness::new(PrecisionParams::default());
        into_approach(&mut h);

        // Target fills the frame, pure centering
        let obs = TargetObservation::Found(Detection::with_pose(10.0, -20.0, 60.0, 0.3, 0.0));
        match h.step(obs) {
            LandingAction::Velocity(v) => {
                assert!((v.vx - 2.0).abs() < 1e-9);
                assert!((v.vy + 4.0).abs() < 1e-9);
                assert_eq!(v.vz, -10.0);
            }
            LandingAction::Land => panic!("Unexpected land"),
        }

        // Radius shrinks as the approach goes on
        let r0 = h.landing.spiral_radius();
        for _ in 0..10 {
            h.step(aligned());
        }
        assert!(h.landing.spiral_radius() < r0);
    }

    #[test]
    fn test_loss_grace_period() {
        let mut h = Harness::new(PrecisionParams::default());
        into_approach(&mut h);

        // Short loss holds position
        assert_eq!(
            h.step(TargetObservation::Lost),
            LandingAction::Velocity(VelocityDems::hover())
        );
        assert_eq!(h.landing.phase(), PrecisionPhase::Approach);

        h.wait(LOSS_GRACE_S);
        h.step(TargetObservation::Lost);
        assert_eq!(h.landing.phase(), PrecisionPhase::Search);
    }

    fn centred() -> TargetObservation {
        TargetObservation::Found(Detection::with_pose(0.0, 0.0, 100.0, 0.01, 0.0))
    }

    /// Align on a centred target, lose it for one frame, then find it far off centre.
    fn reacquire_vx(params: PrecisionParams) -> f64 {
        let mut h = Harness::new(params);

        h.step(centred());
        h.step(centred());
        assert_eq!(h.landing.phase(), PrecisionPhase::Align);
        h.step(TargetObservation::Lost);

        match h.step(misaligned()) {
            LandingAction::Velocity(v) => {
                assert_eq!(h.landing.phase(), PrecisionPhase::Align);
                v.vx
            }
            LandingAction::Land => panic!("Land during align"),
        }
    }

    #[test]
    fn test_reacquire_clears_derivative() {
        // Proportional and integral only
        let vx = reacquire_vx(PrecisionParams::default());
        assert!(vx > 11.0 && vx < 13.0, "vx = {}", vx);

        // Without the reset the jump in error saturates the output
        let mut params = PrecisionParams::default();
        params.position.reset_derivative_on_reacquire = false;
        assert_eq!(reacquire_vx(params), 50.0);
    }

    #[test]
    fn test_non_finite_error_counts_as_lost() {
        let mut h = Harness::new(PrecisionParams::default());
        into_approach(&mut h);

        let bad = TargetObservation::Found(Detection::with_pose(f64::NAN, 0.0, 100.0, 0.01, 0.0));
        assert_eq!(h.step(bad), LandingAction::Velocity(VelocityDems::hover()));
        assert_eq!(h.landing.phase(), PrecisionPhase::Approach);

        // Still lost once the grace period is over
        h.wait(LOSS_GRACE_S);
        h.step(bad);
        assert_eq!(h.landing.phase(), PrecisionPhase::Search);
    }

    #[test]
    fn test_emergency_timeout() {
        let mut h = Harness::new(PrecisionParams::default());

        h.step(TargetObservation::Lost);
        h.wait(30.0);
        assert_eq!(h.step(TargetObservation::Lost), LandingAction::Land);
        assert_eq!(h.landing.phase(), PrecisionPhase::Touchdown);
    }

    #[test]
    fn test_invalid_params() {
        let params = PrecisionParams {
            spiral_tightening_rate: 1.5,
            ..Default::default()
        };
        assert!(PrecisionLanding::new(params, true, LogHandle::detached("p")).is_err());

        let params = PrecisionParams {
            aligned_frames: 0,
            ..Default::default()
        };
        assert!(PrecisionLanding::new(params, true, LogHandle::detached("p")).is_err());
    }
}
