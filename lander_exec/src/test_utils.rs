//! Scripted collaborators for tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use comms_if::eqpt::{
    cam::CamImage,
    tracker::TargetObservation,
    vehicle::{Telemetry, VelocityDems},
};

use crate::{
    cam_client::CamClient,
    tracker::Tracker,
    vehicle_client::{VehicleClient, VehicleClientError},
};

/// Camera always returning a small blank frame.
pub struct ConstCam;

impl ConstCam {
    pub fn new() -> Self {
        Self
    }
}

impl CamClient for ConstCam {
    fn latest_frame(&mut self) -> Option<CamImage> {
        Some(CamImage::blank(32, 24))
    }
}

/// Tracker returning queued observations, `Lost` once the queue is empty.
///
/// Clones share the same queue, so a test can keep a handle after giving one to the follower.
#[derive(Clone)]
pub struct ScriptedTracker {
    queue: Arc<Mutex<VecDeque<TargetObservation>>>,
    pose: bool,
}

impl ScriptedTracker {
    pub fn new(pose: bool) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            pose,
        }
    }

    pub fn push(&self, obs: TargetObservation) {
        self.queue.lock().unwrap().push_back(obs);
    }
}

impl Tracker for ScriptedTracker {
    fn name(&self) -> &str {
        "scripted"
    }

    fn provides_pose(&self) -> bool {
        self.pose
    }

    fn process_frame(&mut self, _frame: &CamImage) -> TargetObservation {
        self.queue.lock().unwrap().pop_front().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleCall {
    TakeOff,
    Land,
    Velocity(VelocityDems),
    ReadTelemetry,
}

#[derive(Default)]
struct RecordingInner {
    calls: Vec<VehicleCall>,
    fail_next: usize,
    telemetry: Telemetry,
}

/// Vehicle recording every call made on it, including calls which it failed.
#[derive(Clone)]
pub struct RecordingVehicle {
    inner: Arc<Mutex<RecordingInner>>,
}

impl RecordingVehicle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RecordingInner {
                telemetry: Telemetry {
                    height_cm: 100.0,
                    battery_pct: 90.0,
                    imu_stable: true,
                },
                ..Default::default()
            })),
        }
    }

    /// Fail the next `n` calls with a timeout.
    pub fn fail_next(&self, n: usize) {
        self.inner.lock().unwrap().fail_next = n;
    }

    pub fn calls(&self) -> Vec<VehicleCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count<F: Fn(&VehicleCall) -> bool>(&self, f: F) -> usize {
        self.inner.lock().unwrap().calls.iter().filter(|c| f(c)).count()
    }

    /// The last velocity demand sent, whether or not it succeeded.
    pub fn last_velocity(&self) -> Option<VelocityDems> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .rev()
            .find_map(|c| match c {
                VehicleCall::Velocity(d) => Some(*d),
                _ => None,
            })
    }

    fn record(&self, call: VehicleCall) -> Result<(), VehicleClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);

        if inner.fail_next > 0 {
            inner.fail_next -= 1;
            Err(VehicleClientError::Timeout)
        } else {
            Ok(())
        }
    }
}

impl VehicleClient for RecordingVehicle {
    fn take_off(&mut self) -> Result<(), VehicleClientError> {
        self.record(VehicleCall::TakeOff)
    }

    fn land(&mut self) -> Result<(), VehicleClientError> {
        self.record(VehicleCall::Land)
    }

    fn send_velocity(&mut self, dems: &VelocityDems) -> Result<(), VehicleClientError> {
        self.record(VehicleCall::Velocity(*dems))
    }

    fn read_telemetry(&mut self) -> Result<Telemetry, VehicleClientError> {
        self.record(VehicleCall::ReadTelemetry)?;
        Ok(self.inner.lock().unwrap().telemetry)
    }
}
