//! # Communications interface crate.
//!
//! Provides the interface structures exchanged between the landing controller and its
//! collaborators (camera, tracker, vehicle).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data definitions for equipment (camera, tracker, vehicle)
pub mod eqpt;
