//! Solver status types.

use serde::Serialize;

/// Semantic status categories shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// Optimal solution found.
    Optimal,
    /// Feasible but not proven optimal.
    Feasible,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Solver reached time limit (may have feasible solution).
    TimeLimit,
    /// Solver reached iteration or node limit.
    IterationLimit,
    /// Backend gave up on numerical grounds.
    NumericalDifficulty,
    /// Backend call failed or reported an internal error.
    Error,
    /// Status is unknown or solver did not complete.
    Unknown,
}

impl SolverStatus {
    /// Whether an attempt with this status is accepted by the cascade.
    pub fn is_success(self) -> bool {
        matches!(self, SolverStatus::Optimal)
    }

    /// Check if the status indicates an optimal solution.
    pub fn is_optimal(self) -> bool {
        matches!(self, SolverStatus::Optimal)
    }

    /// Check if the backend holds a primal solution.
    pub fn has_solution(self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Feasible)
    }

    /// Check if the status indicates infeasibility.
    pub fn is_infeasible(self) -> bool {
        matches!(self, SolverStatus::Infeasible)
    }

    /// Check if the status indicates unboundedness.
    pub fn is_unbounded(self) -> bool {
        matches!(self, SolverStatus::Unbounded)
    }

    /// Get a human-readable string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Feasible => "feasible",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::TimeLimit => "time_limit",
            SolverStatus::IterationLimit => "iteration_limit",
            SolverStatus::NumericalDifficulty => "numerical_difficulty",
            SolverStatus::Error => "error",
            SolverStatus::Unknown => "unknown",
        }
    }

    /// Integer code reported to the simulation driver.
    pub fn result_code(self) -> i32 {
        match self {
            SolverStatus::Unknown => 0,
            SolverStatus::Optimal => 1,
            SolverStatus::Feasible => 2,
            SolverStatus::Infeasible => 3,
            SolverStatus::Unbounded => 4,
            SolverStatus::Error | SolverStatus::NumericalDifficulty => 5,
            SolverStatus::TimeLimit | SolverStatus::IterationLimit => 6,
        }
    }

    fn message(self) -> &'static str {
        match self {
            SolverStatus::Optimal => "Optimal.",
            SolverStatus::Feasible => "Feasible solution, not proven optimal.",
            SolverStatus::Infeasible => "Infeasible.",
            SolverStatus::Unbounded => "Unbounded.",
            SolverStatus::TimeLimit => "Stopped on time.",
            SolverStatus::IterationLimit => "Stopped on iterations.",
            SolverStatus::NumericalDifficulty => "Numerical difficulties.",
            SolverStatus::Error => "Other errors.",
            SolverStatus::Unknown => "Status unknown.",
        }
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Secondary status codes backends report alongside the primary one.
pub mod secondary {
    pub const NONE: i32 = 0;
    pub const RELAXATION_INFEASIBLE: i32 = 1;
    pub const GAP: i32 = 2;
    pub const NODES: i32 = 3;
    pub const TIME: i32 = 4;
    pub const USER_EVENT: i32 = 5;
    pub const SOLUTIONS: i32 = 6;
    pub const RELAXATION_UNBOUNDED: i32 = 7;
}

fn secondary_message(code: i32) -> Option<&'static str> {
    match code {
        secondary::RELAXATION_INFEASIBLE => Some("Linear relaxation not feasible."),
        secondary::GAP => Some("Stopped on gap."),
        secondary::NODES => Some("Stopped on nodes."),
        secondary::TIME => Some("Stopped on time."),
        secondary::USER_EVENT => Some("Stopped on user event."),
        secondary::SOLUTIONS => Some("Stopped on solutions."),
        secondary::RELAXATION_UNBOUNDED => Some("Linear relaxation unbounded."),
        _ => None,
    }
}

/// Semantic status plus the backend's raw primary/secondary codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusPair {
    pub status: SolverStatus,
    pub primary: i32,
    pub secondary: i32,
}

impl StatusPair {
    pub fn new(status: SolverStatus, primary: i32, secondary: i32) -> Self {
        Self {
            status,
            primary,
            secondary,
        }
    }

    /// Status with no backend detail.
    pub fn of(status: SolverStatus) -> Self {
        Self::new(status, status.result_code(), secondary::NONE)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Human-readable explanation lines for notes and results.
    pub fn messages(&self) -> Vec<&'static str> {
        let mut messages = vec![self.status.message()];
        match secondary_message(self.secondary) {
            Some(detail) if detail != self.status.message() => messages.push(detail),
            _ => {}
        }
        messages
    }
}

impl std::fmt::Display for StatusPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}/{})", self.status, self.primary, self.secondary)
    }
}
