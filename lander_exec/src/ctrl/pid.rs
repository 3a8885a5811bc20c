//! # Single axis PID controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use util::maths::sat_sym;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller acting on one scalar error.
///
/// The output is not saturated here, callers apply their own output limits.
#[derive(Debug, Serialize, Clone)]
pub struct PidAxis {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Derivative gain
    k_d: f64,

    /// The integral accumulation is held within +/- this limit
    integral_limit: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidAxis {
    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64, integral_limit: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            integral_limit: integral_limit.abs(),
            integral: 0f64,
            prev_error: None,
        }
    }

    /// Get the value of the controller for the given error.
    ///
    /// If `dt_s` is not a finite positive number (a stalled or stepped clock) the integral and
    /// derivative terms are not updated this cycle, only the proportional term acts. A non-finite
    /// error produces no output and leaves the state untouched.
    pub fn get(&mut self, error: f64, dt_s: f64) -> f64 {
        if !error.is_finite() {
            return 0f64;
        }

        let dt = if dt_s.is_finite() && dt_s > 0f64 {
            Some(dt_s)
        } else {
            None
        };

        // Accumulate the integral term with anti-windup
        if let Some(t) = dt {
            self.integral = sat_sym(self.integral + error * t, self.integral_limit);
        }

        // Calculate the derivative. With no previous sample there is no rate to estimate.
        let deriv = match (self.prev_error, dt) {
            (Some(e), Some(t)) => (error - e) / t,
            _ => 0f64,
        };

        let out = self.k_p * error + self.k_i * self.integral + self.k_d * deriv;

        // Remember the previous error
        self.prev_error = Some(error);

        out
    }

    /// Clear all accumulated state.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }

    /// Forget the previous error so that the next sample produces no derivative kick.
    pub fn reset_derivative(&mut self) {
        self.prev_error = None;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn prev_error(&self) -> Option<f64> {
        self.prev_error
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_proportional_only() {
        let mut pid = PidAxis::new(0.5, 0.0, 0.0, 100.0);

        assert_eq!(pid.get(10.0, 0.05), 5.0);
        assert_eq!(pid.get(-4.0, 0.05), -2.0);
    }

    #[test]
    fn test_integral_clamped() {
        let mut pid = PidAxis::new(1.0, 1.0, 0.0, 10.0);

        for _ in 0..100 {
            pid.get(50.0, 0.1);
            assert!(pid.integral().abs() <= 10.0);
        }
        assert_eq!(pid.integral(), 10.0);

        for _ in 0..100 {
            pid.get(-50.0, 0.1);
            assert!(pid.integral().abs() <= 10.0);
        }
        assert_eq!(pid.integral(), -10.0);
    }

    #[test]
    fn test_derivative() {
        let mut pid = PidAxis::new(1.0, 0.0, 0.1, 100.0);

        // First sample has no derivative
        assert_eq!(pid.get(10.0, 0.1), 10.0);

        // Error rises by 10 in 0.1 s => derivative of 100
        let out = pid.get(20.0, 0.1);
        assert!((out - (20.0 + 0.1 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_dt_skips_integral_and_derivative() {
        let mut pid = PidAxis::new(1.0, 1.0, 1.0, 100.0);

        pid.get(10.0, 0.1);
        let integral = pid.integral();

        for dt in &[0.0, -0.05, f64::NAN, f64::INFINITY] {
            let out = pid.get(20.0, *dt);
            assert_eq!(pid.integral(), integral);
            assert_eq!(out, 20.0 + integral);
        }
    }

    #[test]
    fn test_reset_derivative_keeps_integral() {
        let mut pid = PidAxis::new(1.0, 1.0, 1.0, 100.0);

        pid.get(10.0, 0.1);
        pid.get(10.0, 0.1);
        let integral = pid.integral();

        pid.reset_derivative();
        assert_eq!(pid.prev_error(), None);
        assert_eq!(pid.integral(), integral);

        // Large jump straight after the reset produces no derivative term
        let out = pid.get(200.0, 0.1);
        let expected_integral = integral + 200.0 * 0.1;
        assert!((out - (200.0 + expected_integral)).abs() < 1e-9);

        pid.reset();
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn test_non_finite_error_ignored() {
        let mut pid = PidAxis::new(1.0, 1.0, 1.0, 100.0);

        assert_eq!(pid.get(f64::NAN, 0.1), 0.0);
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.prev_error(), None);
    }
}
