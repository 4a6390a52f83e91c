//! # Equipment Interface
//!
//! This module defines the messages which are published and subscribed to by the steering
//! controller and its peers.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Localisation (pose) messages
pub mod loc;

/// Steering target and command messages
pub mod steer;
