//! # Control law module
//!
//! The control law converts the pixel error reported by the tracker into a horizontal velocity
//! demand. Three laws are available, proportional, PI, and PID, all sharing the [`ControlLaw`]
//! interface so the follower and the landing protocols don't depend on which one is in use.
//!
//! Each law is built from a scalar [`PidAxis`] per output axis. The axes accumulate integral with
//! anti-windup and estimate the derivative from the previous error, skipping both when the time
//! step is not usable (clock stall or step backwards).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod laws;
pub mod params;
pub mod pid;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use laws::*;
pub use params::*;
pub use pid::PidAxis;
