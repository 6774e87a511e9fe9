//! Solver error types.

use std::path::PathBuf;

use wrsolve_core::ModelError;

use crate::backend::BackendError;
use crate::status::SolverStatus;

/// Error type for engine operations.
#[derive(Debug, Clone)]
pub enum SolverError {
    /// Model construction failed.
    Model(ModelError),
    /// Fault at the native call boundary outside of a cascade attempt.
    Backend(BackendError),
    /// Every cascade strategy failed.
    SolveFailure {
        /// Status of the last attempt.
        status: SolverStatus,
        attempts: usize,
    },
    /// Another solve holds the engine.
    EngineBusy,
    /// The engine was disposed.
    EngineDisposed,
    /// No model was loaded with `load_new_model`.
    NoModel,
    /// Writing a diagnostic artifact failed.
    Diagnostics { path: PathBuf, message: String },
}

impl SolverError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            SolverError::Model(err) => err.code(),
            SolverError::Backend(err) => err.code(),
            SolverError::SolveFailure { status, .. } => match status {
                SolverStatus::Infeasible => "SOLVER_INFEASIBLE",
                SolverStatus::Unbounded => "SOLVER_UNBOUNDED",
                SolverStatus::TimeLimit => "SOLVER_TIME_LIMIT",
                SolverStatus::IterationLimit => "SOLVER_ITERATION_LIMIT",
                SolverStatus::NumericalDifficulty => "SOLVER_NUMERICAL",
                _ => "SOLVER_INTERNAL",
            },
            SolverError::EngineBusy => "ENGINE_IN_USE",
            SolverError::EngineDisposed => "ENGINE_DISPOSED",
            SolverError::NoModel => "ENGINE_NO_MODEL",
            SolverError::Diagnostics { .. } => "DIAGNOSTICS_IO",
        }
    }
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::Model(err) => write!(f, "{err}"),
            SolverError::Backend(err) => write!(f, "{err}"),
            SolverError::SolveFailure { status, attempts } => write!(
                f,
                "[{}] Solve failed after {} attempts: {}",
                self.code(),
                attempts,
                status_message(*status)
            ),
            SolverError::EngineBusy => {
                write!(f, "[{}] Engine is already solving", self.code())
            }
            SolverError::EngineDisposed => {
                write!(f, "[{}] Engine has been disposed", self.code())
            }
            SolverError::NoModel => write!(f, "[{}] No model loaded", self.code()),
            SolverError::Diagnostics { path, message } => write!(
                f,
                "[{}] Failed to write {}: {}",
                self.code(),
                path.display(),
                message
            ),
        }
    }
}

fn status_message(status: SolverStatus) -> &'static str {
    match status {
        SolverStatus::Infeasible => "problem is infeasible",
        SolverStatus::Unbounded => "problem is unbounded",
        SolverStatus::TimeLimit => "solver reached time limit",
        SolverStatus::IterationLimit => "solver reached iteration limit",
        SolverStatus::NumericalDifficulty => "numerical difficulties",
        SolverStatus::Optimal | SolverStatus::Feasible => "solution rejected by violation checks",
        SolverStatus::Error | SolverStatus::Unknown => "solver status unknown",
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolverError::Model(err) => Some(err),
            SolverError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for SolverError {
    fn from(err: ModelError) -> Self {
        SolverError::Model(err)
    }
}

impl From<BackendError> for SolverError {
    fn from(err: BackendError) -> Self {
        SolverError::Backend(err)
    }
}
