//! Simulated camera and tracker

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{
    cam::CamImage,
    tracker::{Detection, TargetObservation},
};

use super::{SimParams, SimWorld};
use crate::{cam_client::CamClient, tracker::Tracker};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Heights below this are treated as this for the camera projection, in cm
const MIN_PROJECTION_HEIGHT_CM: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Camera producing blank frames of the simulated size.
pub struct SimCamera {
    width: u32,
    height: u32,
}

/// Tracker which reads the target position straight from the [`SimWorld`].
pub struct SimTracker {
    world: SimWorld,

    params: SimParams,

    num_frames: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimCamera {
    pub fn new(params: &SimParams) -> Self {
        Self {
            width: params.frame_width,
            height: params.frame_height,
        }
    }
}

impl CamClient for SimCamera {
    fn latest_frame(&mut self) -> Option<CamImage> {
        Some(CamImage::blank(self.width, self.height))
    }
}

impl SimTracker {
    pub fn new(world: SimWorld, params: SimParams) -> Self {
        Self {
            world,
            params,
            num_frames: 0,
        }
    }

    /// Project the world state into a detection, `None` if the target is out of view.
    fn observe(&self, frame: &CamImage) -> Option<Detection> {
        let s = self.world.state();
        if !s.airborne {
            return None;
        }

        let h = s.height_cm.max(MIN_PROJECTION_HEIGHT_CM);
        let px_per_cm = self.params.focal_length_px / h;
        let error_px = s.offset_cm * px_per_cm;

        let (cx, cy) = frame.centre_px();
        if error_px[0].abs() > cx || error_px[1].abs() > cy {
            return None;
        }

        if !self.params.pose {
            return Some(Detection::from_error(error_px[0], error_px[1]));
        }

        let side_px = self.params.target_size_cm * px_per_cm;
        let area_fraction = (side_px * side_px / frame.area_px()).min(1.0);

        Some(Detection::with_pose(
            error_px[0],
            error_px[1],
            s.height_cm,
            area_fraction,
            s.yaw_error_deg,
        ))
    }
}

impl Tracker for SimTracker {
    fn name(&self) -> &str {
        "sim"
    }

    fn provides_pose(&self) -> bool {
        self.params.pose
    }

    fn process_frame(&mut self, frame: &CamImage) -> TargetObservation {
        self.num_frames += 1;

        let dropped = self.params.dropout_period > 0
            && self.num_frames % self.params.dropout_period as u64 == 0;

        match self.observe(frame) {
            Some(d) if !dropped => TargetObservation::Found(d),
            _ => TargetObservation::Lost,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ctrl::ControlLawParams,
        follower::{Collaborators, Follower, FollowerParams, FollowerState},
        landing::{LandingParams, LandingProtocolKind},
        sim::SimVehicle,
        vehicle_client::VehicleClient,
        vis::SnapshotSlot,
    };
    use std::sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    };
    use util::logger::LogHandle;

    /// Shared synthetic clock, stored as f64 bits.
    #[derive(Clone, Default)]
    struct TestClock(Arc<AtomicU64>);

    impl TestClock {
        fn set(&self, t: f64) {
            self.0.store(t.to_bits(), Ordering::Relaxed);
        }

        fn get(&self) -> f64 {
            f64::from_bits(self.0.load(Ordering::Relaxed))
        }
    }

    #[test]
    fn test_projection() {
        let params = SimParams::default();
        let world = SimWorld::new(&params);
        let mut tracker = SimTracker::new(world.clone(), params.clone());
        let frame = CamImage::blank(320, 240);

        // On the ground nothing is seen
        assert_eq!(tracker.process_frame(&frame), TargetObservation::Lost);

        {
            let mut s = world.lock();
            s.airborne = true;
            s.height_cm = 100.0;
        }

        // 3 px per cm at 1 m
        let det = *tracker.process_frame(&frame).detection().unwrap();
        assert!((det.error_px[0] - 90.0).abs() < 1e-9);
        assert!((det.error_px[1] + 60.0).abs() < 1e-9);
        assert_eq!(det.distance_cm, Some(100.0));
        assert!((det.area_fraction.unwrap() - 3600.0 / 76800.0).abs() < 1e-9);

        // Out of view
        world.lock().offset_cm[0] = 60.0;
        assert_eq!(tracker.process_frame(&frame), TargetObservation::Lost);
    }

    #[test]
    fn test_closed_loop_glide_landing() {
        let sim = SimParams {
            pose: false,
            ..Default::default()
        };
        let clock = TestClock::default();
        let world = SimWorld::new(&sim);

        let vehicle_clock = clock.clone();
        let mut vehicle = SimVehicle::new(
            world.clone(),
            sim.takeoff_height_cm,
            move || vehicle_clock.get(),
            LogHandle::detached("sim"),
        );
        vehicle.take_off().unwrap();

        let params = FollowerParams {
            flight_timeout_s: 3.0,
            ..Default::default()
        };
        let landing = LandingParams {
            protocol: LandingProtocolKind::Glide,
            ..Default::default()
        };

        let mut follower = Follower::new(
            params,
            Collaborators {
                cam: Box::new(SimCamera::new(&sim)),
                tracker: Box::new(SimTracker::new(world.clone(), sim.clone())),
                vehicle: Box::new(vehicle),
            },
            &ControlLawParams::default(),
            &landing,
            SnapshotSlot::new(),
            Arc::new(AtomicBool::new(false)),
            LogHandle::detached("follower"),
        )
        .unwrap();

        let mut cycle = 0;
        while follower.state() != FollowerState::Terminated {
            cycle += 1;
            assert!(cycle < 2000, "did not land");

            let t = cycle as f64 * 0.05;
            clock.set(t);
            follower.step(t);

            // Tracking well before the flight timeout
            if t > 2.0 && t < 3.0 {
                assert_eq!(follower.state(), FollowerState::Tracking);
            }
        }

        let s = world.state();
        assert!(s.landed);
        assert!(s.offset_cm.norm() < 5.0, "landed {:?} from target", s.offset_cm);
        assert_eq!(
            follower.report(clock.get()).landing_protocol,
            "glide"
        );
    }
}
