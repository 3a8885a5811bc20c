//! # Control laws
//!
//! Three interchangeable laws convert the 2D pixel error into a 2D velocity demand. All of them
//! saturate each output axis independently to `+/- vmax`, so the sign of each axis is preserved.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Serialize;
use util::maths::sat_sym;

// Internal
use super::PidAxis;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A control law converting an error vector into a bounded velocity demand.
pub trait ControlLaw: Send {
    /// Short name of the law, used in logs.
    fn name(&self) -> &'static str;

    /// Compute the demand for this cycle.
    ///
    /// `dt_s` is the time since the previous call. Invalid values (zero, negative, non-finite)
    /// are tolerated, see [`PidAxis::get`].
    fn compute(&mut self, error: Vector2<f64>, dt_s: f64) -> Vector2<f64>;

    /// Clear all controller state.
    fn reset(&mut self);

    /// Forget the previous error, keeping any integral accumulation.
    fn reset_derivative(&mut self);

    /// Snapshot of the controller's internal state.
    fn state(&self) -> ControllerState;

    /// The output limit of the law.
    fn vmax(&self) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Internal state of a control law, for monitoring and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ControllerState {
    pub integral: Vector2<f64>,
    pub prev_error: Option<Vector2<f64>>,
}

/// `v = k_p * e`
#[derive(Debug, Clone, Serialize)]
pub struct Proportional {
    k_p: f64,
    vmax: f64,
}

/// `v = k_p * e + k_i * integral(e)`
#[derive(Debug, Clone, Serialize)]
pub struct Pi {
    x: PidAxis,
    y: PidAxis,
    vmax: f64,
}

/// `v = k_p * e + k_i * integral(e) + k_d * de/dt`
#[derive(Debug, Clone, Serialize)]
pub struct Pid {
    x: PidAxis,
    y: PidAxis,
    vmax: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Proportional {
    pub fn new(k_p: f64, vmax: f64) -> Self {
        Self { k_p, vmax }
    }
}

impl Pi {
    pub fn new(k_p: f64, k_i: f64, integral_limit: f64, vmax: f64) -> Self {
        Self {
            x: PidAxis::new(k_p, k_i, 0.0, integral_limit),
            y: PidAxis::new(k_p, k_i, 0.0, integral_limit),
            vmax,
        }
    }
}

impl Pid {
    pub fn new(k_p: f64, k_i: f64, k_d: f64, integral_limit: f64, vmax: f64) -> Self {
        Self {
            x: PidAxis::new(k_p, k_i, k_d, integral_limit),
            y: PidAxis::new(k_p, k_i, k_d, integral_limit),
            vmax,
        }
    }
}

impl ControlLaw for Proportional {
    fn name(&self) -> &'static str {
        "proportional"
    }

    fn compute(&mut self, error: Vector2<f64>, _dt_s: f64) -> Vector2<f64> {
        error.map(|e| {
            if e.is_finite() {
                sat_sym(self.k_p * e, self.vmax)
            } else {
                0.0
            }
        })
    }

    fn reset(&mut self) {}

    fn reset_derivative(&mut self) {}

    fn state(&self) -> ControllerState {
        ControllerState::default()
    }

    fn vmax(&self) -> f64 {
        self.vmax
    }
}

impl ControlLaw for Pi {
    fn name(&self) -> &'static str {
        "pi"
    }

    fn compute(&mut self, error: Vector2<f64>, dt_s: f64) -> Vector2<f64> {
        axes_compute(&mut self.x, &mut self.y, error, dt_s, self.vmax)
    }

    fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    fn reset_derivative(&mut self) {
        self.x.reset_derivative();
        self.y.reset_derivative();
    }

    fn state(&self) -> ControllerState {
        axes_state(&self.x, &self.y)
    }

    fn vmax(&self) -> f64 {
        self.vmax
    }
}

impl ControlLaw for Pid {
    fn name(&self) -> &'static str {
        "pid"
    }

    fn compute(&mut self, error: Vector2<f64>, dt_s: f64) -> Vector2<f64> {
        axes_compute(&mut self.x, &mut self.y, error, dt_s, self.vmax)
    }

    fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    fn reset_derivative(&mut self) {
        self.x.reset_derivative();
        self.y.reset_derivative();
    }

    fn state(&self) -> ControllerState {
        axes_state(&self.x, &self.y)
    }

    fn vmax(&self) -> f64 {
        self.vmax
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn axes_compute(
    x: &mut PidAxis,
    y: &mut PidAxis,
    error: Vector2<f64>,
    dt_s: f64,
    vmax: f64,
) -> Vector2<f64> {
    Vector2::new(
        sat_sym(x.get(error[0], dt_s), vmax),
        sat_sym(y.get(error[1], dt_s), vmax),
    )
}

fn axes_state(x: &PidAxis, y: &PidAxis) -> ControllerState {
    ControllerState {
        integral: Vector2::new(x.integral(), y.integral()),
        prev_error: match (x.prev_error(), y.prev_error()) {
            (Some(ex), Some(ey)) => Some(Vector2::new(ex, ey)),
            _ => None,
        },
    }
}
