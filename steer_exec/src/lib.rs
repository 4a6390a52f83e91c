//! # Steering library.
//!
//! This library allows other crates in the workspace, as well as the benchmarks, to access items
//! defined inside the steering exec crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Localisation module - pose representation and heading extraction
pub mod loc;

/// Localisation client - recieves the vehicle pose and the desired heading
pub mod loc_client;

/// Steering control module - heading PID controller
pub mod steer_ctrl;

/// Steering server - publishes the steering commands
pub mod steer_server;

/// Fixed period tick clock driving the control loop
pub mod tick;
