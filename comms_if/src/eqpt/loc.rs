//! # Localisation Messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The pose of the vehicle as estimated by localisation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PoseMsg {
    /// UTC timestamp at which the pose was estimated
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Position of the vehicle in the map frame.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Attitude of the vehicle in the map frame as a quaternion, ordered `[x, y, z, w]`.
    pub attitude_q: [f64; 4],
}

impl PoseMsg {
    /// Build a pose message at the origin with a pure rotation of `yaw_rad` about Z.
    ///
    /// Mostly useful for test publishers.
    pub fn from_yaw(yaw_rad: f64) -> Self {
        let half = 0.5 * yaw_rad;

        Self {
            timestamp: Utc::now(),
            position_m: [0.0; 3],
            attitude_q: [0.0, 0.0, half.sin(), half.cos()],
        }
    }
}
