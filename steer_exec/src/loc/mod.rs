//! # Localisation module
//!
//! Converts the pose published by localisation into the heading used by the steering
//! controller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::loc::PoseMsg;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and attitude in the map frame) of the vehicle.
#[derive(Debug, Copy, Clone)]
pub struct Pose {

    /// The position in the map frame
    pub position_m: Vector3<f64>,

    /// The attitude of the vehicle in the map frame.
    pub attitude_q: UnitQuaternion<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {

    /// Return the heading (yaw about the map Z axis) of the vehicle in radians.
    pub fn get_heading(&self) -> f64 {
        yaw_from_orientation(&self.attitude_q)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position_m: Vector3::zeros(),
            attitude_q: UnitQuaternion::identity()
        }
    }
}

impl From<&PoseMsg> for Pose {
    /// Build a pose from a message.
    ///
    /// The message quaternion is normalised but otherwise not validated, a zero quaternion gives
    /// a NaN attitude.
    fn from(msg: &PoseMsg) -> Self {
        let [x, y, z, w] = msg.attitude_q;

        Self {
            position_m: Vector3::from(msg.position_m),
            attitude_q: UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z))
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Extract the yaw from an orientation.
///
/// Uses the roll-pitch-yaw (Z-Y-X) decomposition, the returned yaw is in (-pi, pi].
pub fn yaw_from_orientation(attitude_q: &UnitQuaternion<f64>) -> f64 {
    attitude_q.euler_angles().2
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_yaw_from_orientation() {
        for &yaw in &[0.0, 0.3, -1.2, FRAC_PI_2, 3.0, -3.0] {
            let q = UnitQuaternion::from_euler_angles(0.0, 0.0, yaw);
            assert_abs_diff_eq!(yaw_from_orientation(&q), yaw, epsilon = 1e-9);
        }

        // Roll and pitch don't leak into the heading
        let q = UnitQuaternion::from_euler_angles(0.2, -0.1, 1.0);
        assert_abs_diff_eq!(yaw_from_orientation(&q), 1.0, epsilon = 1e-9);

        let yaw = yaw_from_orientation(&UnitQuaternion::from_euler_angles(0.0, 0.0, PI));
        assert_abs_diff_eq!(yaw.abs(), PI, epsilon = 1e-9);
    }

    #[test]
    fn test_pose_from_msg() {
        let msg = PoseMsg::from_yaw(-2.5);
        let pose = Pose::from(&msg);
        assert_abs_diff_eq!(pose.get_heading(), -2.5, epsilon = 1e-9);
        assert_eq!(pose.position_m, Vector3::zeros());

        // A non-unit quaternion is normalised
        let mut msg = PoseMsg::from_yaw(0.7);
        for c in msg.attitude_q.iter_mut() {
            *c *= 3.0;
        }
        assert_abs_diff_eq!(Pose::from(&msg).get_heading(), 0.7, epsilon = 1e-9);
    }
}
