//! # Layered landing
//!
//! Descends in fixed height steps. Before each step the vehicle aligns over the target and waits
//! for the IMU to report it is stable. After the last step the land command is issued.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{tracker::TargetObservation, vehicle::VelocityDems};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use util::logger::LogHandle;

use super::{step_dt, LandingAction, LandingInput, LandingProtocol};
use crate::{
    ctrl::{ControlLaw, ControlLawParams},
    error::{require_non_negative, require_positive, SetupError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LayeredParams {
    /// Number of descent steps before landing
    pub layers: u32,

    /// Height of each step, in cm
    pub layer_height_cm: f64,

    /// Descent speed during a step, in cm/s
    pub descent_speed: f64,

    /// Pixel error magnitude below which the vehicle counts as aligned
    pub align_threshold_px: f64,

    /// Consecutive aligned frames needed before a step
    pub aligned_frames: u32,

    /// Maximum time spent aligning before stepping down anyway
    pub align_timeout_s: f64,

    /// Land regardless of layer after this long
    pub timeout_s: f64,
}

pub struct LayeredLanding {
    params: LayeredParams,

    phase: LayeredPhase,

    phase_entered_at_s: f64,

    layer: u32,

    consecutive_aligned_frames: u32,

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
pub enum LayeredPhase {
    /// Centring over the target
    Align,

    /// Holding position until the IMU is stable
    Settle,

    /// Descending one layer
    Descend,

    /// Land command issued
    Done,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LayeredParams {
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.layers == 0 {
            return Err(SetupError::InvalidParameter {
                name: "layers",
                reason: "must be at least 1".into(),
            });
        }
        require_positive("layer_height_cm", self.layer_height_cm)?;
        require_positive("descent_speed", self.descent_speed)?;
        require_positive("align_threshold_px", self.align_threshold_px)?;
        if self.aligned_frames == 0 {
            return Err(SetupError::InvalidParameter {
                name: "aligned_frames",
                reason: "must be at least 1".into(),
            });
        }
        require_non_negative("align_timeout_s", self.align_timeout_s)?;
        require_positive("timeout_s", self.timeout_s)?;

        Ok(())
    }

    /// Time taken to descend one layer.
    pub fn layer_duration_s(&self) -> f64 {
        self.layer_height_cm / self.descent_speed
    }
}

impl Default for LayeredParams {
    fn default() -> Self {
        Self {
            layers: 3,
            layer_height_cm: 20.0,
            descent_speed: 20.0,
            align_threshold_px: 12.0,
            aligned_frames: 10,
            align_timeout_s: 2.5,
            timeout_s: 60.0,
        }
    }
}

impl LayeredLanding {
    pub fn new(
        params: LayeredParams,
        control: &ControlLawParams,
        log: LogHandle,
    ) -> Result<Self, SetupError> {
        params.validate()?;

        Ok(Self {
            params,
            phase: LayeredPhase::Align,
            phase_entered_at_s: 0.0,
            layer: 0,
            consecutive_aligned_frames: 0,
            ctrl: control.build()?,
            reset_derivative_on_reacquire: control.reset_derivative_on_reacquire,
            was_lost: false,
            started_at_s: None,
            prev_time_s: None,
            log,
        })
    }

    pub fn phase(&self) -> LayeredPhase {
        self.phase
    }

    /// Number of layers already descended.
    pub fn layer(&self) -> u32 {
        self.layer
    }

    fn enter(&mut self, phase: LayeredPhase, time_s: f64) {
        debug!(
            target: self.log.target(),
            "Layer {}: {:?} -> {:?}",
            self.layer,
            self.phase,
            phase
        );

        if phase == LayeredPhase::Align {
            self.consecutive_aligned_frames = 0;
            self.ctrl.reset_derivative();
        }

        self.phase = phase;
        self.phase_entered_at_s = time_s;
    }

    fn descend(&self) -> LandingAction {
        LandingAction::Velocity(VelocityDems::new(0.0, 0.0, -self.params.descent_speed, 0.0))
    }
}

impl LandingProtocol for LayeredLanding {
    fn name(&self) -> &'static str {
        "layered"
    }

    fn phase_name(&self) -> &'static str {
        match self.phase {
            LayeredPhase::Align => "ALIGN",
            LayeredPhase::Settle => "SETTLE",
            LayeredPhase::Descend => "DESCEND",
            LayeredPhase::Done => "DONE",
        }
    }

    fn start(&mut self, time_s: f64) {
        self.started_at_s = Some(time_s);
        self.phase_entered_at_s = time_s;
    }

    fn step(&mut self, input: &LandingInput) -> LandingAction {
        let dt = step_dt(&mut self.prev_time_s, input.time_s);
        let time_s = input.time_s;

        if self.phase == LayeredPhase::Done {
            return LandingAction::Land;
        }

        let started_at_s = *self.started_at_s.get_or_insert(time_s);
        if time_s - started_at_s > self.params.timeout_s {
            warn!(
                target: self.log.target(),
                "Layered landing timed out on layer {}, landing",
                self.layer
            );
            self.enter(LayeredPhase::Done, time_s);
            return LandingAction::Land;
        }

        match self.phase {
            LayeredPhase::Align => {
                let action = match input.obs {
                    TargetObservation::Found(ref det) if det.is_finite() => {
                        if self.was_lost && self.reset_derivative_on_reacquire {
                            self.ctrl.reset_derivative();
                        }
                        self.was_lost = false;

                        if det.error_magn_px() < self.params.align_threshold_px {
                            self.consecutive_aligned_frames += 1;
                        } else {
                            self.consecutive_aligned_frames = 0;
                        }

                        let vel = self.ctrl.compute(det.error_px, dt);
                        LandingAction::Velocity(VelocityDems::new(vel[0], vel[1], 0.0, 0.0))
                    }
                    _ => {
                        self.consecutive_aligned_frames = 0;
                        self.was_lost = true;
                        LandingAction::Velocity(VelocityDems::hover())
                    }
                };

                if self.consecutive_aligned_frames >= self.params.aligned_frames {
                    self.enter(LayeredPhase::Settle, time_s);
                } else if time_s - self.phase_entered_at_s >= self.params.align_timeout_s {
                    warn!(
                        target: self.log.target(),
                        "Alignment timed out on layer {}, continuing",
                        self.layer
                    );
                    self.enter(LayeredPhase::Settle, time_s);
                }

                action
            }
            LayeredPhase::Settle => {
                // Unknown IMU state counts as stable
                let stable = input.telemetry.map_or(true, |t| t.imu_stable);

                if stable {
                    self.enter(LayeredPhase::Descend, time_s);
                    self.descend()
                } else {
                    LandingAction::Velocity(VelocityDems::hover())
                }
            }
            LayeredPhase::Descend => {
                if time_s - self.phase_entered_at_s < self.params.layer_duration_s() {
                    return self.descend();
                }

                self.layer += 1;
                info!(
                    target: self.log.target(),
                    "Descended layer {}/{}",
                    self.layer,
                    self.params.layers
                );

                if self.layer >= self.params.layers {
                    self.enter(LayeredPhase::Done, time_s);
                    LandingAction::Land
                } else {
                    self.enter(LayeredPhase::Align, time_s);
                    LandingAction::Velocity(VelocityDems::hover())
                }
            }
            LayeredPhase::Done => LandingAction::Land,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::{tracker::Detection, vehicle::Telemetry};

    fn layered(params: LayeredParams) -> LayeredLanding {
        let mut l =
            LayeredLanding::new(params, &ControlLawParams::default(), LogHandle::detached("l"))
                .unwrap();
        l.start(0.0);
        l
    }

    fn centred() -> TargetObservation {
        TargetObservation::Found(Detection::from_error(1.0, 1.0))
    }

    fn telem(imu_stable: bool) -> Option<Telemetry> {
        Some(Telemetry {
            height_cm: 100.0,
            battery_pct: 80.0,
            imu_stable,
        })
    }

    #[test]
    fn test_descends_all_layers_then_lands() {
        let params = LayeredParams {
            layers: 2,
            aligned_frames: 3,
            ..Default::default()
        };
        let mut l = layered(params);
        let mut t = 0.0;
        let mut descending_cycles = 0;

        for _ in 0..1000 {
            t += 0.05;
            match l.step(&LandingInput::new(centred(), telem(true), t)) {
                LandingAction::Velocity(v) => {
                    assert!(v.vz <= 0.0);
                    if v.vz < 0.0 {
                        descending_cycles += 1;
                    }
                }
                LandingAction::Land => break,
            }
        }

        assert_eq!(l.phase(), LayeredPhase::Done);
        assert_eq!(l.layer(), 2);

        // Each layer takes a second at 0.05 s per cycle
        assert!(descending_cycles >= 38 && descending_cycles <= 42);
    }

    #[test]
    fn test_waits_for_stable_imu() {
        let params = LayeredParams {
            aligned_frames: 1,
            ..Default::default()
        };
        let mut l = layered(params);

        l.step(&LandingInput::new(centred(), telem(false), 0.05));
        assert_eq!(l.phase(), LayeredPhase::Settle);

        for i in 0..20 {
            let action = l.step(&LandingInput::new(centred(), telem(false), 0.1 + i as f64));
            assert_eq!(action, LandingAction::Velocity(VelocityDems::hover()));
        }
        assert_eq!(l.phase(), LayeredPhase::Settle);

        // No telemetry at all counts as stable
        l.step(&LandingInput::new(centred(), None, 21.0));
        assert_eq!(l.phase(), LayeredPhase::Descend);
    }

    #[test]
    fn test_align_timeout() {
        let mut l = layered(LayeredParams::default());

        let far = TargetObservation::Found(Detection::from_error(100.0, 0.0));
        l.step(&LandingInput::new(far, None, 1.0));
        assert_eq!(l.phase(), LayeredPhase::Align);

        l.step(&LandingInput::new(far, None, 2.6));
        assert_eq!(l.phase(), LayeredPhase::Settle);
    }

    #[test]
    fn test_no_derivative_kick_after_loss() {
        let mut l = layered(LayeredParams::default());

        l.step(&LandingInput::new(centred(), None, 0.05));
        l.step(&LandingInput::new(centred(), None, 0.10));
        l.step(&LandingInput::new(TargetObservation::Lost, None, 0.15));

        let far = TargetObservation::Found(Detection::from_error(40.0, 0.0));
        match l.step(&LandingInput::new(far, None, 0.20)) {
            LandingAction::Velocity(v) => assert!(v.vx > 19.0 && v.vx < 21.0, "vx = {}", v.vx),
            LandingAction::Land => panic!("Land during align"),
        }
        assert_eq!(l.phase(), LayeredPhase::Align);
    }

    #[test]
    fn test_non_finite_error_holds_position() {
        let mut l = layered(LayeredParams::default());

        let bad = TargetObservation::Found(Detection::from_error(f64::NAN, 0.0));
        assert_eq!(
            l.step(&LandingInput::new(bad, None, 0.05)),
            LandingAction::Velocity(VelocityDems::hover())
        );
    }

    #[test]
    fn test_overall_timeout() {
        let mut l = layered(LayeredParams::default());

        l.step(&LandingInput::new(TargetObservation::Lost, None, 1.0));
        assert_eq!(
            l.step(&LandingInput::new(TargetObservation::Lost, None, 61.0)),
            LandingAction::Land
        );
        assert_eq!(l.phase(), LayeredPhase::Done);
    }
}
