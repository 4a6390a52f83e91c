//! # Communications interface crate.
//!
//! Provides the messages exchanged by the steering controller and the network abstractions used
//! to move them around.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message definitions for the localisation and steering channels
pub mod eqpt;

/// Network module
pub mod net;
