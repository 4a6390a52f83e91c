//! # Heading PID step
//!
//! The control law itself, written as a pure function of the previous controller state so that it
//! can be driven by any scheduler and tested without time passing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::maths::{clamp, get_ang_dist};

use super::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state mutated by the steering controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ControllerState {
    /// Most recently received heading estimate.
    ///
    /// Units: radians
    pub current_yaw: f64,

    /// Most recently received desired heading, `None` until the first target arrives.
    ///
    /// Units: radians
    pub desired_yaw: Option<f64>,

    /// Accumulated error over time, kept within the integral bounds.
    ///
    /// Units: radian seconds
    pub integral_error: f64,

    /// Heading error from the previous tick.
    ///
    /// Units: radians
    pub last_error: f64
}

/// Everything computed during a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StepOutput {
    /// The dt used for this step.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// True if dt was zero, negative or not finite, in which case the integral was not
    /// accumulated and the derivative was taken as zero.
    pub dt_degenerate: bool,

    /// True if the error was NaN or infinite, in which case it was neither integrated nor kept
    /// for the next derivative.
    pub error_non_finite: bool,

    /// Shortest signed angle from the current to the desired heading.
    ///
    /// Units: radians
    pub error_rad: f64,

    /// Integral accumulator after clamping.
    pub integral_error: f64,

    /// True if the integral had to be clamped on this step.
    pub integral_limited: bool,

    /// Rate of change of the error.
    ///
    /// Units: radians/second
    pub derivative: f64,

    /// Proportional contribution to the output.
    pub p_term: f64,

    /// Integral contribution to the output.
    pub i_term: f64,

    /// Derivative contribution to the output.
    pub d_term: f64,

    /// The normalised steering demand.
    pub output: f64
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Returns true if `dt_s` can't be used to integrate or differentiate.
pub fn is_degenerate_dt(dt_s: f64) -> bool {
    !dt_s.is_finite() || dt_s <= 0.0
}

/// Perform one PID step towards `desired_yaw`.
///
/// The error is the wrapped difference between the two headings, so crossing the +/- pi boundary
/// never produces a full-turn error. The integral is clamped to
/// `[params.min_integral, params.max_integral]` after accumulating.
///
/// A degenerate dt (see [`is_degenerate_dt`]) skips integration and gives a zero derivative for
/// this step. The error is still remembered for the next derivative.
///
/// A non-finite error (from a NaN heading for instance) is passed through to this step's
/// output, but is neither integrated nor remembered, so the following steps are unaffected.
pub fn step(
    state: &ControllerState,
    params: &Params,
    dt_s: f64,
    current_yaw: f64,
    desired_yaw: f64
) -> (ControllerState, StepOutput) {
    let dt_degenerate = is_degenerate_dt(dt_s);

    let error_rad = get_ang_dist(current_yaw, desired_yaw);
    let error_non_finite = !error_rad.is_finite();
    let skip_update = dt_degenerate || error_non_finite;

    let raw_integral = match skip_update {
        true => state.integral_error,
        false => state.integral_error + error_rad * dt_s
    };

    // clamp passes NaN through, which would stick in the accumulator for good
    let integral_error = match raw_integral.is_nan() {
        true => clamp(0.0, params.min_integral, params.max_integral),
        false => clamp(raw_integral, params.min_integral, params.max_integral)
    };

    let derivative = match skip_update {
        true => 0.0,
        false => (error_rad - state.last_error) / dt_s
    };

    let p_term = params.k_p * error_rad;
    let i_term = params.k_i * integral_error;
    let d_term = params.k_d * derivative;

    let new_state = ControllerState {
        current_yaw,
        desired_yaw: Some(desired_yaw),
        integral_error,
        last_error: match error_non_finite {
            true => state.last_error,
            false => error_rad
        }
    };

    let output = StepOutput {
        dt_s,
        dt_degenerate,
        error_non_finite,
        error_rad,
        integral_error,
        integral_limited: integral_error != raw_integral,
        derivative,
        p_term,
        i_term,
        d_term,
        output: p_term + d_term + i_term
    };

    (new_state, output)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::PI;

    #[test]
    fn test_reference_step() {
        let params = Params::default();

        let (state, out) = step(&ControllerState::default(), &params, 0.01, 0.0, 0.1);

        assert_relative_eq!(out.error_rad, 0.1, epsilon = 1e-12);
        assert_relative_eq!(out.integral_error, 0.001, epsilon = 1e-12);
        assert_relative_eq!(out.derivative, 10.0, epsilon = 1e-9);
        assert_relative_eq!(out.output, 1.4001, epsilon = 1e-9);
        assert!(!out.integral_limited);
        assert!(!out.dt_degenerate);

        assert_eq!(state.desired_yaw, Some(0.1));
        assert_eq!(state.current_yaw, 0.0);
        assert_relative_eq!(state.last_error, 0.1, epsilon = 1e-12);
        assert_relative_eq!(state.integral_error, 0.001, epsilon = 1e-12);
    }

    #[test]
    fn test_error_wraps_across_pi() {
        let params = Params::default();

        // Going from 3.0 to -3.0 the short way crosses pi anticlockwise
        let (_, out) = step(&ControllerState::default(), &params, 0.01, 3.0, -3.0);
        assert_abs_diff_eq!(out.error_rad, 0.2832, epsilon = 1e-4);
        assert_abs_diff_eq!(out.error_rad, 2.0 * PI - 6.0, epsilon = 1e-12);

        let (_, out) = step(&ControllerState::default(), &params, 0.01, -3.0, 3.0);
        assert_abs_diff_eq!(out.error_rad, -0.2832, epsilon = 1e-4);
        assert_abs_diff_eq!(out.error_rad, 6.0 - 2.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_error_is_shortest_distance() {
        let params = Params::default();
        let n = 60;

        for i in 0..n {
            // Headings spread over (-pi, pi]
            let current = PI - 2.0 * PI * (i as f64) / (n as f64);
            for j in 0..n {
                let desired = PI - 2.0 * PI * (j as f64 + 0.37) / (n as f64);
                let (_, out) = step(&ControllerState::default(), &params, 0.01, current, desired);

                assert!(out.error_rad.abs() <= PI + 1e-12);

                // Turning the current heading by the error lands on the desired heading
                let reached = current + out.error_rad;
                assert_abs_diff_eq!(reached.sin(), desired.sin(), epsilon = 1e-9);
                assert_abs_diff_eq!(reached.cos(), desired.cos(), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_integral_clamped_under_sustained_error() {
        let params = Params::default();
        let mut state = ControllerState::default();

        // A quarter turn of error would add 0.0157 rad s per tick without the clamp
        for i in 0..1000 {
            let (s, out) = step(&state, &params, 0.01, 0.0, PI / 2.0);
            state = s;

            assert!(state.integral_error <= params.max_integral);
            assert!(state.integral_error >= params.min_integral);
            if i > 100 {
                assert!(out.integral_limited);
                assert_eq!(state.integral_error, params.max_integral);
            }
        }

        // And the other way
        for _ in 0..1000 {
            let (s, _) = step(&state, &params, 0.01, 0.0, -PI / 2.0);
            state = s;
            assert!(state.integral_error >= params.min_integral);
        }
        assert_eq!(state.integral_error, params.min_integral);
    }

    #[test]
    fn test_zero_error_steady_state() {
        let params = Params::default();
        let mut state = ControllerState::default();
        let mut out = StepOutput::default();

        for _ in 0..500 {
            let (s, o) = step(&state, &params, 0.01, 1.25, 1.25);
            state = s;
            out = o;
        }

        assert_eq!(state.integral_error, 0.0);
        assert_eq!(out.p_term, 0.0);
        assert_eq!(out.d_term, 0.0);
        assert_eq!(out.output, 0.0);
    }

    #[test]
    fn test_degenerate_dt() {
        let params = Params::default();
        let state = ControllerState {
            integral_error: 0.5,
            last_error: 0.2,
            ..Default::default()
        };

        for &dt in &[0.0, -0.01, f64::NAN, f64::INFINITY] {
            let (new_state, out) = step(&state, &params, dt, 0.0, 0.1);

            assert!(out.dt_degenerate);
            assert_eq!(out.derivative, 0.0);
            assert!(out.output.is_finite());
            assert_eq!(new_state.integral_error, 0.5);
            assert_relative_eq!(new_state.last_error, 0.1, epsilon = 1e-12);
            assert_relative_eq!(out.output, 4.0 * 0.1 + 0.1 * 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_previous_integral_out_of_bounds_is_pulled_in() {
        let params = Params::default();
        let state = ControllerState { integral_error: 5.0, ..Default::default() };

        let (new_state, out) = step(&state, &params, 0.01, 0.0, 0.0);

        assert_eq!(new_state.integral_error, 1.0);
        assert!(out.integral_limited);
    }

    #[test]
    fn test_nan_heading_does_not_stick() {
        let params = Params::default();

        let (state, _) = step(&ControllerState::default(), &params, 0.01, 0.0, 0.1);
        let before = state;

        let (state, out) = step(&state, &params, 0.01, f64::NAN, 0.1);
        assert!(out.error_non_finite);
        assert!(out.output.is_nan());
        assert_eq!(state.integral_error, before.integral_error);
        assert_eq!(state.last_error, before.last_error);

        let mut state = state;
        for _ in 0..1000 {
            let (s, out) = step(&state, &params, 0.01, 0.0, 0.1);
            state = s;

            assert!(!out.error_non_finite);
            assert!(out.output.is_finite());
            assert!(state.integral_error >= params.min_integral);
            assert!(state.integral_error <= params.max_integral);
        }
    }

    #[test]
    fn test_nan_integral_is_reset() {
        let params = Params::default();
        let state = ControllerState { integral_error: f64::NAN, ..Default::default() };

        let (new_state, out) = step(&state, &params, 0.01, 0.0, 0.1);

        assert_eq!(new_state.integral_error, 0.0);
        assert!(out.integral_limited);
        assert!(out.output.is_finite());
    }
}
