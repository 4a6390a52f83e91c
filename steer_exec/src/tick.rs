//! # Tick clock
//!
//! Fixed period scheduler for the control loop. Ticks are scheduled at `start + n * period` and
//! the dt handed to the controller is the spacing between scheduled times, so jitter in when a
//! tick actually fires never reaches the controller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::thread;
use std::time::{Duration, Instant};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Fixed period tick scheduler.
#[derive(Debug, Clone)]
pub struct TickClock {
    period: Duration,

    /// Lag beyond which the schedule is re-anchored to the current time
    max_lag: Duration,

    next_expected: Instant,

    last_expected: Option<Instant>,

    num_ticks: u64,
}

/// Information about a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickEvent {
    /// Index of the tick, starting at zero.
    pub index: u64,

    /// When the tick was scheduled to fire.
    pub expected: Instant,

    /// Spacing between the previous and this tick's scheduled times in seconds, `None` on the
    /// first tick.
    pub dt_s: Option<f64>,

    /// How late the tick fired relative to its schedule.
    pub lag: Duration,

    /// True if the loop had fallen so far behind that the schedule was re-anchored after this
    /// tick.
    pub overrun: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TickClock {
    /// Create a new clock whose first tick is scheduled at `start`.
    ///
    /// `max_lag_ticks` is the number of whole periods the loop may fall behind before the
    /// schedule is re-anchored. Zero is treated as one.
    pub fn new(period: Duration, max_lag_ticks: u32, start: Instant) -> Self {
        Self {
            period,
            max_lag: period * max_lag_ticks.max(1),
            next_expected: start,
            last_expected: None,
            num_ticks: 0,
        }
    }

    /// The nominal period of the clock in seconds.
    pub fn period_s(&self) -> f64 {
        self.period.as_secs_f64()
    }

    /// When the next tick is scheduled.
    pub fn next_expected(&self) -> Instant {
        self.next_expected
    }

    /// Sleep until the next scheduled tick and fire it.
    ///
    /// Returns immediately if the loop is behind schedule.
    pub fn wait(&mut self) -> TickEvent {
        if let Some(d) = self.next_expected.checked_duration_since(Instant::now()) {
            thread::sleep(d);
        }

        self.fire(Instant::now())
    }

    /// Fire the next scheduled tick, `now` being the actual time it fired.
    pub fn fire(&mut self, now: Instant) -> TickEvent {
        let expected = self.next_expected;
        let lag = now.saturating_duration_since(expected);

        let dt_s = self.last_expected.map(|l| (expected - l).as_secs_f64());

        let overrun = lag > self.max_lag;

        if overrun {
            // Drop the missed ticks rather than firing them back to back. The next tick is a
            // period after the re-anchored time so dt stays nominal.
            self.last_expected = Some(now);
            self.next_expected = now + self.period;
        }
        else {
            self.last_expected = Some(expected);
            self.next_expected = expected + self.period;
        }

        let event = TickEvent {
            index: self.num_ticks,
            expected,
            dt_s,
            lag,
            overrun,
        };

        self.num_ticks += 1;

        event
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const PERIOD: Duration = Duration::from_millis(10);

    #[test]
    fn test_first_tick_has_no_dt() {
        let start = Instant::now();
        let mut clock = TickClock::new(PERIOD, 10, start);

        let ev = clock.fire(start);
        assert_eq!(ev.index, 0);
        assert_eq!(ev.dt_s, None);
        assert_eq!(ev.lag, Duration::from_secs(0));
        assert_eq!(clock.next_expected(), start + PERIOD);
    }

    #[test]
    fn test_jitter_does_not_affect_dt() {
        let start = Instant::now();
        let mut clock = TickClock::new(PERIOD, 10, start);
        clock.fire(start);

        // Fire late, early-ish and on time
        let jitters = [3u64, 0, 7, 1, 9];
        for (i, j) in jitters.iter().enumerate() {
            let expected = start + PERIOD * (i as u32 + 1);
            let ev = clock.fire(expected + Duration::from_millis(*j));

            assert_eq!(ev.expected, expected);
            assert_abs_diff_eq!(ev.dt_s.unwrap(), 0.01, epsilon = 1e-9);
            assert_eq!(ev.lag, Duration::from_millis(*j));
            assert!(!ev.overrun);
        }
    }

    #[test]
    fn test_small_lag_catches_up() {
        let start = Instant::now();
        let mut clock = TickClock::new(PERIOD, 10, start);
        clock.fire(start);

        // Three periods late, the missed ticks fire back to back with nominal spacing
        let now = start + PERIOD * 4;
        for i in 1..=4 {
            let ev = clock.fire(now);
            assert_eq!(ev.expected, start + PERIOD * i);
            assert_abs_diff_eq!(ev.dt_s.unwrap(), 0.01, epsilon = 1e-9);
            assert!(!ev.overrun);
        }
        assert_eq!(clock.next_expected(), start + PERIOD * 5);
    }

    #[test]
    fn test_large_lag_reanchors() {
        let start = Instant::now();
        let mut clock = TickClock::new(PERIOD, 5, start);
        clock.fire(start);

        let now = start + Duration::from_millis(500);
        let ev = clock.fire(now);
        assert!(ev.overrun);
        assert_abs_diff_eq!(ev.dt_s.unwrap(), 0.01, epsilon = 1e-9);
        assert_eq!(clock.next_expected(), now + PERIOD);

        // The tick after the re-anchor still sees the nominal period
        let ev = clock.fire(now + PERIOD);
        assert!(!ev.overrun);
        assert_abs_diff_eq!(ev.dt_s.unwrap(), 0.01, epsilon = 1e-9);
    }

    #[test]
    fn test_wait_sleeps_until_schedule() {
        let start = Instant::now();
        let mut clock = TickClock::new(Duration::from_millis(5), 10, start);

        clock.wait();
        clock.wait();
        let ev = clock.wait();

        assert_eq!(ev.index, 2);
        assert!(Instant::now() >= start + Duration::from_millis(10));
        assert_abs_diff_eq!(clock.period_s(), 0.005, epsilon = 1e-12);
    }
}
