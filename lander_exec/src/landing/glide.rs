//! # Continuous glide landing
//!
//! Centres over the target while descending without stopping. The descent slows while the
//! vehicle is poorly aligned but never reverses. With the target lost the vehicle keeps
//! descending slowly with no horizontal demand. The land command is issued when the height
//! sensor reports the ground is close or the glide times out.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{tracker::TargetObservation, vehicle::VelocityDems};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use util::{logger::LogHandle, maths::clamp};

use super::{step_dt, LandingAction, LandingInput, LandingProtocol};
use crate::{
    ctrl::{ControlLaw, ControlLawParams},
    error::{require_non_negative, require_positive, SetupError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GlideParams {
    /// Descent speed lost per pixel of error
    pub descent_gain: f64,

    /// Slowest descent, also used while the target is lost, in cm/s
    pub min_descent_speed: f64,

    /// Fastest descent, reached when perfectly aligned, in cm/s
    pub max_descent_speed: f64,

    /// Height at which the land command is issued, in cm
    pub height_threshold_cm: f64,

    /// Land regardless of height after this long
    pub timeout_s: f64,
}

pub struct GlideLanding {
    params: GlideParams,

    phase: GlidePhase,

    ctrl: Box<dyn ControlLaw>,

    reset_derivative_on_reacquire: bool,

    was_lost: bool,

    started_at_s: Option<f64>,

    prev_time_s: Option<f64>,

    log: LogHandle,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GlidePhase {
    Active,
    Done,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GlideParams {
    pub fn validate(&self) -> Result<(), SetupError> {
        require_non_negative("descent_gain", self.descent_gain)?;
        require_non_negative("min_descent_speed", self.min_descent_speed)?;
        require_positive("max_descent_speed", self.max_descent_speed)?;
        if self.min_descent_speed > self.max_descent_speed {
            return Err(SetupError::InvalidParameter {
                name: "min_descent_speed",
                reason: format!(
                    "must not exceed max_descent_speed ({} > {})",
                    self.min_descent_speed, self.max_descent_speed
                ),
            });
        }
        require_non_negative("height_threshold_cm", self.height_threshold_cm)?;
        require_positive("timeout_s", self.timeout_s)?;

        Ok(())
    }

    /// Descent speed for the given pixel error magnitude.
    ///
    /// Always within `[min_descent_speed, max_descent_speed]`, a non-finite error gives the
    /// slowest descent.
    pub fn descent_speed(&self, error_magn_px: f64) -> f64 {
        if !error_magn_px.is_finite() {
            return self.min_descent_speed;
        }

        clamp(
            self.max_descent_speed - self.descent_gain * error_magn_px,
            self.min_descent_speed,
            self.max_descent_speed,
        )
    }
}

impl Default for GlideParams {
    fn default() -> Self {
        Self {
            descent_gain: 0.3,
            min_descent_speed: 10.0,
            max_descent_speed: 25.0,
            height_threshold_cm: 20.0,
            timeout_s: 30.0,
        }
    }
}

impl GlideLanding {
    pub fn new(
        params: GlideParams,
        control: &ControlLawParams,
        log: LogHandle,
    ) -> Result<Self, SetupError> {
        params.validate()?;

        Ok(Self {
            params,
            phase: GlidePhase::Active,
            ctrl: control.build()?,
            reset_derivative_on_reacquire: control.reset_derivative_on_reacquire,
            was_lost: false,
            started_at_s: None,
            prev_time_s: None,
            log,
        })
    }

    pub fn phase(&self) -> GlidePhase {
        self.phase
    }

    fn done(&mut self) -> LandingAction {
        self.phase = GlidePhase::Done;
        LandingAction::Land
    }
}

impl LandingProtocol for GlideLanding {
    fn name(&self) -> &'static str {
        "glide"
    }

    fn phase_name(&self) -> &'static str {
        match self.phase {
            GlidePhase::Active => "ACTIVE",
            GlidePhase::Done => "DONE",
        }
    }

    fn start(&mut self, time_s: f64) {
        self.started_at_s = Some(time_s);
    }

    fn step(&mut self, input: &LandingInput) -> LandingAction {
        let dt = step_dt(&mut self.prev_time_s, input.time_s);

        if self.phase == GlidePhase::Done {
            return LandingAction::Land;
        }

        if let Some(tel) = input.telemetry {
            if tel.height_cm <= self.params.height_threshold_cm {
                info!(
                    target: self.log.target(),
                    "Height {:.1} cm below threshold, landing",
                    tel.height_cm
                );
                return self.done();
            }
        }

        let started_at_s = *self.started_at_s.get_or_insert(input.time_s);
        if input.time_s - started_at_s > self.params.timeout_s {
            warn!(
                target: self.log.target(),
                "Glide timed out after {:.1} s, landing",
                self.params.timeout_s
            );
            return self.done();
        }

        match input.obs {
            TargetObservation::Found(ref det) => {
                if self.was_lost && self.reset_derivative_on_reacquire {
                    self.ctrl.reset_derivative();
                }
                self.was_lost = false;

                let vel = self.ctrl.compute(det.error_px, dt);
                let descent = self.params.descent_speed(det.error_magn_px());

                LandingAction::Velocity(VelocityDems::new(vel[0], vel[1], -descent, 0.0))
            }
            TargetObservation::Lost => {
                self.was_lost = true;

                LandingAction::Velocity(VelocityDems::new(
                    0.0,
                    0.0,
                    -self.params.min_descent_speed,
                    0.0,
                ))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::{tracker::Detection, vehicle::Telemetry};

    fn glide() -> GlideLanding {
        let mut g = GlideLanding::new(
            GlideParams::default(),
            &ControlLawParams::default(),
            LogHandle::detached("glide"),
        )
        .unwrap();
        g.start(0.0);
        g
    }

    fn telem(height_cm: f64) -> Option<Telemetry> {
        Some(Telemetry {
            height_cm,
            battery_pct: 80.0,
            imu_stable: true,
        })
    }

    #[test]
    fn test_descent_speed_clamped() {
        let params = GlideParams::default();

        assert_eq!(params.descent_speed(0.0), 25.0);
        assert_eq!(params.descent_speed(1e6), 10.0);
        assert_eq!(params.descent_speed(f64::NAN), 10.0);
        assert!((params.descent_speed(20.0) - 19.0).abs() < 1e-9);

        for e in 0..1000 {
            let s = params.descent_speed(e as f64);
            assert!(s >= 10.0 && s <= 25.0);
        }
    }

    #[test]
    fn test_never_climbs() {
        let mut g = glide();

        for i in 0..100 {
            let obs = if i % 7 == 0 {
                TargetObservation::Lost
            } else {
                TargetObservation::Found(Detection::from_error(i as f64 * 3.0, -50.0))
            };

            match g.step(&LandingInput::new(obs, telem(150.0), i as f64 * 0.05)) {
                LandingAction::Velocity(v) => assert!(v.vz < 0.0),
                LandingAction::Land => panic!("Unexpected land"),
            }
        }
    }

    #[test]
    fn test_lost_target_descends_slowly() {
        let mut g = glide();

        let action = g.step(&LandingInput::new(TargetObservation::Lost, telem(100.0), 0.1));
        assert_eq!(
            action,
            LandingAction::Velocity(VelocityDems::new(0.0, 0.0, -10.0, 0.0))
        );
        assert_eq!(g.phase(), GlidePhase::Active);
    }

    #[test]
    fn test_lands_at_height_threshold() {
        let mut g = glide();
        let obs = TargetObservation::Found(Detection::from_error(0.0, 0.0));

        assert_ne!(
            g.step(&LandingInput::new(obs, telem(21.0), 0.1)),
            LandingAction::Land
        );
        assert_eq!(
            g.step(&LandingInput::new(obs, telem(20.0), 0.2)),
            LandingAction::Land
        );
        assert_eq!(g.phase(), GlidePhase::Done);
        assert_eq!(g.phase_name(), "DONE");
    }

    #[test]
    fn test_timeout_without_height() {
        let mut g = glide();
        let obs = TargetObservation::Found(Detection::from_error(5.0, 5.0));

        assert_ne!(
            g.step(&LandingInput::new(obs, None, 10.0)),
            LandingAction::Land
        );
        assert_eq!(
            g.step(&LandingInput::new(obs, None, 30.5)),
            LandingAction::Land
        );
    }

    #[test]
    fn test_min_above_max_rejected() {
        let params = GlideParams {
            min_descent_speed: 30.0,
            ..Default::default()
        };

        assert!(GlideLanding::new(
            params,
            &ControlLawParams::default(),
            LogHandle::detached("glide")
        )
        .is_err());
    }
}
