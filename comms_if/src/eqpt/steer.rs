//! # Steering Messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Reference frame that steering commands are expressed in.
pub const STEER_FRAME_ID: &str = "base_link";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A desired heading for the steering controller to track.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SteerTarget {
    /// Desired heading, in the same frame as the localisation pose.
    ///
    /// Units: radians
    pub value: f64,
}

/// A normalised steering command sent to the actuator layer.
///
/// The value is not clamped to any actuator range, that is left to the actuator layer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NormalisedSteerCmd {
    /// The steering demand on a device independent scale.
    pub value: f64,

    /// Reference frame of the command, always [`STEER_FRAME_ID`].
    pub frame_id: String,

    /// UTC timestamp at which the command was emitted
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl NormalisedSteerCmd {
    /// Create a new command stamped with the current time.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            frame_id: String::from(STEER_FRAME_ID),
            timestamp: Utc::now(),
        }
    }
}
