//! Parameters structure for SteerCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::SteerCtrlError;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Shortest tick period accepted, below this the loop can't keep its schedule.
pub const MIN_TICK_PERIOD_S: f64 = 1e-4;

/// Longest tick period accepted.
pub const MAX_TICK_PERIOD_S: f64 = 60.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the heading PID steering controller.
///
/// Any key missing from the parameter file takes its default value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Params {

    // ---- GAINS ----

    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    // ---- ANTI-WINDUP ----

    /// Lower bound of the integral accumulator.
    ///
    /// Units: radian seconds
    pub min_integral: f64,

    /// Upper bound of the integral accumulator.
    ///
    /// Units: radian seconds
    pub max_integral: f64,

    // ---- TIMING ----

    /// Nominal period of the control loop.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Number of whole periods the loop may fall behind before the tick schedule is re-anchored.
    pub max_lag_ticks: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 4.0,
            k_i: 0.1,
            k_d: 0.1,
            min_integral: -1.0,
            max_integral: 1.0,
            tick_period_s: 0.01,
            max_lag_ticks: 10
        }
    }
}

impl Params {
    /// Check that the parameters describe a usable controller.
    pub fn validate(&self) -> Result<(), SteerCtrlError> {
        let gains = [("k_p", self.k_p), ("k_i", self.k_i), ("k_d", self.k_d)];
        for (name, gain) in gains.iter() {
            if !gain.is_finite() {
                return Err(SteerCtrlError::InvalidParams(
                    format!("{} must be finite, got {}", name, gain)
                ));
            }
        }

        // Also rejects NaN
        if !(self.tick_period_s >= MIN_TICK_PERIOD_S && self.tick_period_s <= MAX_TICK_PERIOD_S) {
            return Err(SteerCtrlError::InvalidParams(format!(
                "tick_period_s must be within [{}, {}] s, got {}",
                MIN_TICK_PERIOD_S, MAX_TICK_PERIOD_S, self.tick_period_s
            )));
        }

        // NaN bounds fail this comparison too
        if !(self.min_integral <= self.max_integral) {
            return Err(SteerCtrlError::InvalidParams(format!(
                "min_integral ({}) must not exceed max_integral ({})",
                self.min_integral, self.max_integral
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_params_file() {
        let p: Params = util::params::from_toml_str("k_p = 2.0\ntick_period_s = 0.02").unwrap();

        assert_eq!(p.k_p, 2.0);
        assert_eq!(p.tick_period_s, 0.02);
        assert_eq!(p.k_i, 0.1);
        assert_eq!(p.k_d, 0.1);
        assert_eq!(p.min_integral, -1.0);
        assert_eq!(p.max_integral, 1.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(Params::default().validate().is_ok());

        for &period in &[0.0, -0.01, 1e-12, 1e30, f64::INFINITY, f64::NAN] {
            let bad_period = Params { tick_period_s: period, ..Default::default() };
            assert!(bad_period.validate().is_err());
        }

        for &period in &[MIN_TICK_PERIOD_S, 0.01, MAX_TICK_PERIOD_S] {
            let ok_period = Params { tick_period_s: period, ..Default::default() };
            assert!(ok_period.validate().is_ok());
        }

        let bad_bounds = Params { min_integral: 1.0, max_integral: -1.0, ..Default::default() };
        assert!(bad_bounds.validate().is_err());

        let nan_gain = Params { k_d: f64::NAN, ..Default::default() };
        assert!(nan_gain.validate().is_err());

        // Equal bounds pin the integral, which is allowed
        let pinned = Params { min_integral: 0.0, max_integral: 0.0, ..Default::default() };
        assert!(pinned.validate().is_ok());
    }
}
