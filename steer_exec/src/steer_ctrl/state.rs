//! Implementations for the SteerCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::steer::NormalisedSteerCmd;
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::convert::Infallible;

// Internal
use super::{pid, ControllerState, Params, SteerCtrlError, StepOutput};
use crate::loc::Pose;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Heading PID steering controller module state.
///
/// Starts unarmed: ticks produce nothing until the first desired heading is received, after
/// which every tick produces exactly one command.
#[derive(Default)]
pub struct SteerCtrl {
    pub(crate) params: Params,

    pub(crate) state: ControllerState,

    /// Number of ticks processed since arming, used to give the first armed tick the nominal dt.
    ticks_since_armed: u64,

    pub(crate) report: StatusReport,
    arch_report: Archiver,
}

/// Input data to a SteerCtrl tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// Spacing between the previous and current scheduled tick, or `None` if there was no
    /// previous tick.
    ///
    /// Units: seconds
    pub dt_s: Option<f64>,
}

/// Status report for SteerCtrl processing.
///
/// Flat so that it can be archived as a csv row.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Session time of the tick
    pub time_s: f64,

    /// True if a desired heading has been received
    pub armed: bool,

    pub current_yaw: f64,
    pub desired_yaw: Option<f64>,

    pub dt_s: f64,
    pub dt_degenerate: bool,
    pub error_non_finite: bool,
    pub error_rad: f64,
    pub integral_error: f64,
    pub integral_limited: bool,
    pub derivative: f64,
    pub p_term: f64,
    pub i_term: f64,
    pub d_term: f64,
    pub output: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for SteerCtrl {
    type InitData = String;
    type InitError = SteerCtrlError;

    type InputData = InputData;
    type OutputData = Option<NormalisedSteerCmd>;
    type StatusReport = StatusReport;
    type ProcError = Infallible;

    /// Initialise the SteerCtrl module.
    ///
    /// Expected init data is the path to the parameter file, relative to the params directory.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        let params: Params = params::load(&init_data)
            .map_err(SteerCtrlError::ParamsLoadError)?;
        params.validate()?;

        info!(
            "SteerCtrl gains: k_p = {}, k_i = {}, k_d = {}",
            params.k_p, params.k_i, params.k_d
        );
        info!(
            "SteerCtrl integral limits: [{}, {}], tick period: {} s",
            params.min_integral, params.max_integral, params.tick_period_s
        );

        self.arch_report = Archiver::from_path(session, "steer_ctrl/status_report.csv")
            .map_err(SteerCtrlError::ArchiveError)?;

        // Keep a copy of the parameters actually used alongside the archives
        session.save("steer_ctrl/params.json", params.clone());

        self.params = params;

        Ok(())
    }

    /// Perform one tick of the controller.
    ///
    /// Unarmed ticks leave the state untouched and produce no command.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let desired_yaw = match self.state.desired_yaw {
            Some(d) => d,
            None => {
                self.report = StatusReport {
                    time_s: session::get_elapsed_seconds(),
                    current_yaw: self.state.current_yaw,
                    ..Default::default()
                };
                return Ok((None, self.report));
            }
        };

        // There is no previous armed tick to measure against on the first one
        let dt_s = match (self.ticks_since_armed, input_data.dt_s) {
            (0, _) | (_, None) => self.params.tick_period_s,
            (_, Some(dt)) => dt,
        };

        let (new_state, out) = pid::step(
            &self.state,
            &self.params,
            dt_s,
            self.state.current_yaw,
            desired_yaw,
        );

        if out.dt_degenerate {
            warn!("Degenerate SteerCtrl dt of {} s, derivative skipped for this tick", dt_s);
        }
        if out.error_non_finite {
            warn!(
                "Non-finite SteerCtrl error (current {}, desired {}), integral left unchanged",
                self.state.current_yaw, desired_yaw
            );
        }
        if out.integral_limited && !self.report.integral_limited {
            debug!("SteerCtrl integral saturated at {:.4}", out.integral_error);
        }
        else if !out.integral_limited && self.report.integral_limited {
            debug!("SteerCtrl integral left saturation");
        }

        self.state = new_state;
        self.ticks_since_armed += 1;
        self.report = StatusReport::from_step(&self.state, &out);

        trace!(
            "SteerCtrl: error {:+.4} rad, P {:+.4}, I {:+.4}, D {:+.4} -> {:+.4}",
            out.error_rad, out.p_term, out.i_term, out.d_term, out.output
        );

        Ok((Some(NormalisedSteerCmd::new(out.output)), self.report))
    }
}

impl Archived for SteerCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)
    }
}

impl SteerCtrl {
    /// Create a new controller from already loaded parameters.
    ///
    /// The controller has no archive, use [`State::init`] to load parameters and archive into
    /// a session instead.
    pub fn new(params: Params) -> Result<Self, SteerCtrlError> {
        params.validate()?;

        Ok(Self {
            params,
            ..Default::default()
        })
    }

    /// Store the heading of a new pose estimate, replacing the previous one.
    pub fn update_current_pose(&mut self, pose: &Pose) {
        self.update_current_yaw(pose.get_heading());
    }

    /// Store a new heading estimate, replacing the previous one.
    pub fn update_current_yaw(&mut self, yaw_rad: f64) {
        self.state.current_yaw = yaw_rad;
    }

    /// Store a new desired heading, replacing the previous one.
    ///
    /// The first call arms the controller.
    pub fn update_desired_angle(&mut self, angle_rad: f64) {
        if self.state.desired_yaw.is_none() {
            info!("SteerCtrl armed with desired heading {:.4} rad", angle_rad);
        }

        self.state.desired_yaw = Some(angle_rad);
    }

    /// Run a tick, returning the steering command if the controller is armed.
    pub fn on_tick(&mut self, dt_s: Option<f64>) -> Option<NormalisedSteerCmd> {
        match self.proc(&InputData { dt_s }) {
            Ok((cmd, _)) => cmd,
            Err(e) => match e {},
        }
    }

    /// True once a desired heading has been received.
    pub fn is_armed(&self) -> bool {
        self.state.desired_yaw.is_some()
    }

    /// The current controller state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// The controller parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The status report of the last tick.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }
}

impl StatusReport {
    fn from_step(state: &ControllerState, out: &StepOutput) -> Self {
        Self {
            time_s: session::get_elapsed_seconds(),
            armed: true,
            current_yaw: state.current_yaw,
            desired_yaw: state.desired_yaw,
            dt_s: out.dt_s,
            dt_degenerate: out.dt_degenerate,
            error_non_finite: out.error_non_finite,
            error_rad: out.error_rad,
            integral_error: out.integral_error,
            integral_limited: out.integral_limited,
            derivative: out.derivative,
            p_term: out.p_term,
            i_term: out.i_term,
            d_term: out.d_term,
            output: out.output,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::steer_ctrl::into_shared;
    use approx::assert_relative_eq;
    use comms_if::eqpt::{loc::PoseMsg, steer::STEER_FRAME_ID};
    use std::thread;

    fn ctrl() -> SteerCtrl {
        SteerCtrl::new(Params::default()).unwrap()
    }

    #[test]
    fn test_unarmed_ticks_do_nothing() {
        let mut c = ctrl();
        c.update_current_yaw(0.5);
        let before = *c.state();

        for _ in 0..100 {
            assert!(c.on_tick(Some(0.01)).is_none());
        }

        assert!(!c.is_armed());
        assert_eq!(*c.state(), before);
        assert!(!c.report().armed);
    }

    #[test]
    fn test_armed_ticks_always_output() {
        let mut c = ctrl();
        c.on_tick(None);

        c.update_desired_angle(0.2);
        assert!(c.is_armed());

        for i in 0..100 {
            // Inputs keep arriving between ticks
            c.update_current_yaw(0.001 * i as f64);
            let cmd = c.on_tick(Some(0.01)).unwrap();
            assert_eq!(cmd.frame_id, STEER_FRAME_ID);
            assert!(cmd.value.is_finite());
        }
    }

    #[test]
    fn test_reference_tick() {
        let mut c = ctrl();
        c.update_current_yaw(0.0);
        c.update_desired_angle(0.1);

        let cmd = c.on_tick(None).unwrap();

        assert_relative_eq!(cmd.value, 1.4001, epsilon = 1e-9);
        assert_relative_eq!(c.state().integral_error, 0.001, epsilon = 1e-12);
        assert_relative_eq!(c.state().last_error, 0.1, epsilon = 1e-12);
        assert_relative_eq!(c.report().derivative, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_first_armed_tick_uses_nominal_period() {
        let params = Params { tick_period_s: 0.02, ..Default::default() };
        let mut c = SteerCtrl::new(params).unwrap();

        // Unarmed ticks don't count
        c.on_tick(Some(0.5));
        c.on_tick(Some(0.5));

        c.update_desired_angle(0.1);
        c.on_tick(Some(0.5));
        assert_eq!(c.report().dt_s, 0.02);
        assert_relative_eq!(c.state().integral_error, 0.002, epsilon = 1e-12);

        // Later ticks use the measured spacing
        c.on_tick(Some(0.03));
        assert_eq!(c.report().dt_s, 0.03);

        // And fall back to the period without one
        c.on_tick(None);
        assert_eq!(c.report().dt_s, 0.02);
    }

    #[test]
    fn test_zero_dt_is_guarded() {
        let mut c = ctrl();
        c.update_desired_angle(0.1);
        c.on_tick(None);

        let cmd = c.on_tick(Some(0.0)).unwrap();
        assert!(cmd.value.is_finite());
        assert!(c.report().dt_degenerate);
        assert_eq!(c.report().derivative, 0.0);
    }

    #[test]
    fn test_latest_wins() {
        let mut c = ctrl();

        c.update_desired_angle(1.0);
        c.update_desired_angle(-0.5);
        c.update_current_yaw(2.0);
        c.update_current_pose(&Pose {
            attitude_q: nalgebra::UnitQuaternion::from_euler_angles(0.0, 0.0, -0.25),
            ..Default::default()
        });

        c.on_tick(None);
        assert_relative_eq!(c.report().error_rad, -0.25, epsilon = 1e-9);
        assert_eq!(c.state().desired_yaw, Some(-0.5));
    }

    #[test]
    fn test_steady_state_output_is_zero() {
        let mut c = ctrl();
        c.update_current_yaw(-2.0);
        c.update_desired_angle(-2.0);

        let mut last = None;
        for _ in 0..200 {
            last = c.on_tick(Some(0.01));
        }

        assert_eq!(last.unwrap().value, 0.0);
        assert_eq!(c.state().integral_error, 0.0);
    }

    #[test]
    fn test_integral_stays_bounded() {
        let params = Params { min_integral: -0.2, max_integral: 0.3, ..Default::default() };
        let mut c = SteerCtrl::new(params).unwrap();

        c.update_desired_angle(3.0);
        for i in 0..2000 {
            // Swing the target to push the integral both ways
            if i == 1000 {
                c.update_desired_angle(-3.0);
            }
            c.on_tick(Some(0.01));
            let integral = c.state().integral_error;
            assert!(integral >= -0.2 && integral <= 0.3);
        }
    }

    #[test]
    fn test_nan_pose_recovers() {
        let mut c = ctrl();
        c.update_desired_angle(0.3);
        c.on_tick(None);

        // A zero quaternion can't be normalised, and a NaN heading may arrive directly
        let zero_q = PoseMsg {
            attitude_q: [0.0; 4],
            ..PoseMsg::from_yaw(0.0)
        };
        c.update_current_pose(&Pose::from(&zero_q));
        c.on_tick(Some(0.01));
        c.update_current_yaw(f64::NAN);
        let cmd = c.on_tick(Some(0.01)).unwrap();
        assert!(cmd.value.is_nan());
        assert!(c.report().error_non_finite);

        for i in 0..500 {
            c.update_current_pose(&Pose::from(&PoseMsg::from_yaw(0.001 * i as f64)));
            let cmd = c.on_tick(Some(0.01)).unwrap();

            let integral = c.state().integral_error;
            assert!(integral >= -1.0 && integral <= 1.0);
            assert!(cmd.value.is_finite());
            assert!(!c.report().error_non_finite);
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = Params { tick_period_s: -1.0, ..Default::default() };
        match SteerCtrl::new(params) {
            Err(SteerCtrlError::InvalidParams(_)) => (),
            Err(e) => panic!("Expected invalid params, got {}", e),
            Ok(_) => panic!("Expected invalid params")
        }
    }

    #[test]
    fn test_concurrent_updates_and_ticks() {
        let shared = into_shared(ctrl());

        let updaters: Vec<_> = (0..2)
            .map(|n| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..500 {
                        let mut c = shared.lock().unwrap();
                        match n {
                            0 => c.update_current_yaw((i as f64 * 0.01).sin()),
                            _ => c.update_desired_angle((i as f64 * 0.02).cos()),
                        }
                    }
                })
            })
            .collect();

        for _ in 0..500 {
            let mut c = shared.lock().unwrap();
            c.on_tick(Some(0.01));
            let integral = c.state().integral_error;
            assert!(integral >= -1.0 && integral <= 1.0);
        }

        for u in updaters {
            u.join().unwrap();
        }

        assert!(shared.lock().unwrap().is_armed());
    }
}
