//! Simulated vehicle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::vehicle::{Telemetry, VelocityDems};
use log::info;
use util::logger::LogHandle;

use super::SimWorld;
use crate::vehicle_client::{VehicleClient, VehicleClientError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Battery level reported by the simulated vehicle
const SIM_BATTERY_PCT: f64 = 100.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Vehicle which flies in a [`SimWorld`].
///
/// On every call the world is advanced by the time elapsed since the previous call, at the
/// velocity demanded then.
pub struct SimVehicle {
    world: SimWorld,

    takeoff_height_cm: f64,

    clock: Box<dyn FnMut() -> f64 + Send>,

    last_time_s: Option<f64>,

    log: LogHandle,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimVehicle {
    pub fn new<C>(world: SimWorld, takeoff_height_cm: f64, clock: C, log: LogHandle) -> Self
    where
        C: FnMut() -> f64 + Send + 'static,
    {
        Self {
            world,
            takeoff_height_cm,
            clock: Box::new(clock),
            last_time_s: None,
            log,
        }
    }

    fn update(&mut self) {
        let now = (self.clock)();

        if let Some(t) = self.last_time_s {
            self.world.advance(now - t);
        }
        self.last_time_s = Some(now);
    }
}

impl VehicleClient for SimVehicle {
    fn take_off(&mut self) -> Result<(), VehicleClientError> {
        self.update();

        let mut s = self.world.lock();
        if s.airborne {
            return Err(VehicleClientError::Rejected("already airborne".into()));
        }

        s.airborne = true;
        s.landed = false;
        s.height_cm = self.takeoff_height_cm;
        s.velocity = VelocityDems::hover();

        info!(
            target: self.log.target(),
            "Took off to {:.0} cm",
            self.takeoff_height_cm
        );

        Ok(())
    }

    fn land(&mut self) -> Result<(), VehicleClientError> {
        self.update();

        let mut s = self.world.lock();
        if s.airborne {
            info!(
                target: self.log.target(),
                "Landing from {:.0} cm, {:.1} cm from target",
                s.height_cm,
                s.offset_cm.norm()
            );
        }

        s.airborne = false;
        s.landed = true;
        s.height_cm = 0.0;
        s.velocity = VelocityDems::hover();

        Ok(())
    }

    fn send_velocity(&mut self, dems: &VelocityDems) -> Result<(), VehicleClientError> {
        self.update();

        let mut s = self.world.lock();
        if !s.airborne {
            return Err(VehicleClientError::Rejected("not airborne".into()));
        }
        s.velocity = *dems;

        Ok(())
    }

    fn read_telemetry(&mut self) -> Result<Telemetry, VehicleClientError> {
        self.update();

        let s = self.world.state();

        Ok(Telemetry {
            height_cm: s.height_cm,
            battery_pct: SIM_BATTERY_PCT,
            imu_stable: true,
        })
    }
}
