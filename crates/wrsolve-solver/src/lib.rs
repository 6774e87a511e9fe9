//! Backend-agnostic solving for wrsolve cycle models.
//!
//! Backends implement the narrow [`Backend`] trait. Everything above it is
//! shared: the table-driven [`SolveCascade`], the elastic
//! [`InfeasibilityAnalyzer`] and the [`SolveEngine`] that drivers call once
//! per cycle.
//!
//! # Overview
//!
//! - [`SolverConfig`]: tolerances, checks, warm-start schedule, diagnostics
//! - [`SolverStatus`] / [`StatusPair`]: semantic status plus raw backend codes
//! - [`SolverError`]: error type for engine operations
//! - [`Diagnostics`]: model dumps, trace files and the note log

pub mod backend;
pub mod cascade;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod iis;
pub mod stats;
pub mod status;

#[cfg(test)]
mod testing;

pub use backend::{
    Backend, BackendError, SearchMode, SolveOutcome, SolveParams, default_primal_value,
    load_instance, run_instance, start_vector,
};
pub use cascade::{
    AcceptedSolution, AttemptResult, CascadeReport, CascadeState, SolveAttempt, SolveCascade,
    Strategy,
};
pub use config::SolverConfig;
pub use diagnostics::{Diagnostics, NoteLog, TRACE_HEADER};
pub use engine::{BusyGuard, SolveEngine, SolveResult};
pub use error::SolverError;
pub use iis::{Finding, InfeasibilityAnalyzer, InfeasibilityReport};
pub use stats::PerformanceStats;
pub use status::{SolverStatus, StatusPair};
