//! HiGHS backend for the wrsolve engine.
//!
//! [`HighsBackend`] implements the engine's primitive backend calls over a
//! safe [`HighsModel`] wrapper; all native calls stay inside [`ffi`].

pub mod ffi;
pub mod solver;
mod status;

pub use ffi::{
    HighsModel, HighsModelError, HighsOption, HighsStatus, ObjectiveSense, SolutionSnapshot,
    highs_version,
};
pub use solver::HighsBackend;
