//! # Setup errors
//!
//! Errors raised while building the controller from its parameters. These abort setup before the
//! vehicle is flown. Runtime faults are handled inside the control loop and never surface here.

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SetupError {
    /// A single parameter is outside its valid range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The parameters are individually valid but cannot be used together.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Require a parameter to be finite and strictly positive.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<(), SetupError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SetupError::InvalidParameter {
            name,
            reason: format!("expected a finite value > 0, found {}", value),
        })
    }
}

/// Require a parameter to be finite and zero or positive.
pub(crate) fn require_non_negative(name: &'static str, value: f64) -> Result<(), SetupError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SetupError::InvalidParameter {
            name,
            reason: format!("expected a finite value >= 0, found {}", value),
        })
    }
}
