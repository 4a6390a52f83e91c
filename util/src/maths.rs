//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into `[min, max]`.
///
/// Unlike `f64::clamp` this does not panic if `min > max`, in that case `max` wins. NaN is passed
/// through unchanged.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    let mut ret = value;

    if ret < min {
        ret = min
    }
    if ret > max {
        ret = max
    }

    ret
}

/// Wrap an angle into the range (-pi, pi].
///
/// Uses `atan2(sin, cos)` so angles any number of turns away from zero are handled.
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float
{
    angle.sin().atan2(angle.cos())
}

/// Get the signed shortest angular distance going from angle `from` to angle `to`.
///
/// The result is in the range (-pi, pi], positive if `to` is anticlockwise of `from`.
pub fn get_ang_dist<T>(from: T, to: T) -> T
where
    T: Float
{
    wrap_to_pi(to - from)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(0.5f64, -1.0, 1.0), 0.5);
        assert_eq!(clamp(1.5f64, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-1.5f64, -1.0, 1.0), -1.0);
        assert_eq!(clamp(-1.0f64, -1.0, 1.0), -1.0);
        assert!(clamp(f64::NAN, -1.0, 1.0).is_nan());
    }

    #[test]
    fn test_wrap_to_pi() {
        assert_abs_diff_eq!(wrap_to_pi(0.0f64), 0.0);
        assert_abs_diff_eq!(wrap_to_pi(TAU + 0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_to_pi(-TAU - 0.5), -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_to_pi(3.0 * TAU + 1.0), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(wrap_to_pi(PI), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_get_ang_dist() {
        // Across the +/- pi boundary the short way round is taken
        assert_abs_diff_eq!(get_ang_dist(3.0f64, -3.0), TAU - 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(get_ang_dist(-3.0f64, 3.0), 6.0 - TAU, epsilon = 1e-12);
        assert_abs_diff_eq!(get_ang_dist(1.0f64, 2.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(get_ang_dist(2.0f64, 1.0), -1.0, epsilon = 1e-12);

        for i in 0..100 {
            let a = -PI + 0.0629 * i as f64;
            for j in 0..100 {
                let b = -PI + 0.0631 * j as f64;
                assert!(get_ang_dist(a, b).abs() <= PI + 1e-12);
            }
        }
    }
}
