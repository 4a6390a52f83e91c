//! Steering control module
//!
//! Closes the loop on vehicle heading with a PID controller, producing a normalised steering
//! demand once per tick.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod pid;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

// Internal
pub use params::*;
pub use pid::*;
pub use state::*;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// A steering controller shared between the tick loop and the input handlers.
///
/// Every handler holds the lock for its whole operation, so ticks and updates never interleave.
pub type SharedSteerCtrl = Arc<Mutex<SteerCtrl>>;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SteerCtrl initialisation.
#[derive(Debug, thiserror::Error)]
pub enum SteerCtrlError {
    #[error("Could not load the SteerCtrl parameters: {0}")]
    ParamsLoadError(util::params::LoadError),

    #[error("Invalid SteerCtrl parameters: {0}")]
    InvalidParams(String),

    #[error("Could not create the SteerCtrl archive: {0}")]
    ArchiveError(util::archive::ArchiveError),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Wrap a controller so it can be shared with the input handlers.
pub fn into_shared(ctrl: SteerCtrl) -> SharedSteerCtrl {
    Arc::new(Mutex::new(ctrl))
}
