//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the range `[min, max]`.
///
/// NaN inputs are mapped to the value in the range closest to zero, so a bad sample never
/// produces a full scale output.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let value = if value.is_nan() { T::zero() } else { value };

    value.max(min).min(max)
}

/// Limit a value to the symmetric range `[-limit, limit]`.
///
/// NaN inputs give zero.
pub fn sat_sym<T>(value: T, limit: T) -> T
where
    T: Float,
{
    clamp(value, -limit.abs(), limit.abs())
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle in radians into `[0, 2pi)`.
pub fn wrap_2pi<T>(value: T) -> T
where
    T: Float,
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap_or_else(T::zero);

    rem_euclid(value, tau_t)
}
