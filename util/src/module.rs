//! Cyclic module interface
//!
//! Anything stepped from the main loop of `steer_exec` (the steering controller for example)
//! implements [`State`], so that initialisation and per-cycle processing look the same for every
//! module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A module driven once per cycle by an executable.
pub trait State {
    /// Data needed to initialise the module, usually the path to its parameter file.
    type InitData;
    /// Failure raised during initialisation.
    type InitError;

    /// Input consumed by a single cycle.
    type InputData;
    /// Output produced by a single cycle.
    type OutputData;
    /// Diagnostics produced alongside the output of a cycle.
    type StatusReport;
    /// Failure raised during a cycle.
    type ProcError;

    /// Load parameters and set up anything the module writes into the session.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one cycle, returning the output and a status report.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
