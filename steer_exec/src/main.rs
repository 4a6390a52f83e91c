//! Main steering executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise the steering controller
//!     - Start the localisation client, which feeds pose and desired heading updates into the
//!       controller from its own thread
//!     - Main loop, once per tick:
//!         - Steering control processing
//!         - Archiving
//!         - Steering command publication
//!
//! The loop runs on a fixed schedule set by the controller's `tick_period_s` parameter.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use comms_if::net::NetParams;
use steer_lib::{
    loc_client::LocClient,
    steer_ctrl::{self, InputData, SteerCtrl},
    steer_server::SteerServer,
    tick::TickClock,
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "steer_exec", about = "Heading PID steering controller")]
struct Opt {
    /// Steering controller parameter file, relative to the params directory.
    #[structopt(long, default_value = "steer_ctrl.toml")]
    params: String,

    /// Network parameter file, relative to the params directory.
    #[structopt(long, default_value = "net.toml")]
    net_params: String,

    /// Stop after this many ticks. Runs until killed if not given.
    #[structopt(long)]
    max_ticks: Option<u64>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("steer_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Steering Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load(&opt.net_params)
        .wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ctrl = SteerCtrl::default();
    ctrl.init(opt.params.clone(), &session)
        .wrap_err("Failed to initialise SteerCtrl")?;
    info!("SteerCtrl init complete");

    // Validated at init, so the conversion can't overflow
    let tick_period = Duration::from_secs_f64(ctrl.params().tick_period_s);
    let max_lag_ticks = ctrl.params().max_lag_ticks;
    let ctrl = steer_ctrl::into_shared(ctrl);

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let loc_client = LocClient::new(&zmq_ctx, &net_params, ctrl.clone())
        .wrap_err("Failed to initialise LocClient")?;
    info!("LocClient initialised");

    let mut steer_server = SteerServer::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise SteerServer")?;
    if steer_server.is_connected() {
        info!("SteerServer initialised on {}", net_params.steer_endpoint);
    }
    else {
        warn!("SteerServer initialised but not bound to {}", net_params.steer_endpoint);
    }

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut clock = TickClock::new(tick_period, max_lag_ticks, Instant::now());

    loop {
        let tick = clock.wait();

        if tick.overrun {
            warn!(
                "Tick {} overran by {:.06} s, rescheduling",
                tick.index,
                tick.lag.as_secs_f64()
            );
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        // The lock is released before publishing so the inputs aren't held up by the network
        let cmd = {
            let mut ctrl = match ctrl.lock() {
                Ok(c) => c,
                Err(_) => {
                    warn!("SteerCtrl lock poisoned, stopping");
                    break;
                }
            };

            let cmd = match ctrl.proc(&InputData { dt_s: tick.dt_s }) {
                Ok((cmd, _)) => cmd,
                Err(e) => match e {},
            };

            // ---- WRITE ARCHIVES ----

            if let Err(e) = ctrl.write() {
                warn!("Could not archive the SteerCtrl status report: {}", e);
            }

            cmd
        };

        // ---- PUBLISH ----

        if let Some(cmd) = cmd {
            if let Err(e) = steer_server.send(&cmd) {
                warn!("SteerServer error: {}", e);
            }
        }

        if let Some(max) = opt.max_ticks {
            if tick.index + 1 >= max {
                info!("Reached the limit of {} ticks, stopping", max);
                break;
            }
        }
    }

    // ---- SHUTDOWN ----

    drop(loc_client);
    drop(steer_server);

    info!("End of execution");

    session.exit();

    Ok(())
}
