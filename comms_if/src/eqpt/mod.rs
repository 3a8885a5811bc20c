//! # Equipment Interface
//!
//! This module defines the interface structures which are passed to and from the equipment the
//! controller drives or reads from.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod tracker;
pub mod vehicle;
