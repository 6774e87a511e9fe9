//! HiGHS model status to engine status mapping.

use wrsolve_solver::status::secondary;
use wrsolve_solver::{SolverStatus, StatusPair};

use crate::ffi::HighsStatus;

pub(crate) fn highs_to_status(status: HighsStatus) -> SolverStatus {
    match status {
        HighsStatus::Optimal => SolverStatus::Optimal,
        // HiGHS reports this for infeasible models when presolve cannot
        // tell the two apart; the cascade and analyzer treat it as infeasible.
        HighsStatus::Infeasible | HighsStatus::UnboundedOrInfeasible => SolverStatus::Infeasible,
        HighsStatus::Unbounded => SolverStatus::Unbounded,
        HighsStatus::ReachedTimeLimit => SolverStatus::TimeLimit,
        HighsStatus::ReachedIterationLimit => SolverStatus::IterationLimit,
        HighsStatus::ModelEmpty | HighsStatus::SolveError => SolverStatus::Error,
        HighsStatus::Unknown => SolverStatus::Unknown,
    }
}

/// Secondary code in the shared table for a HiGHS status.
pub(crate) fn highs_secondary(status: HighsStatus) -> i32 {
    match status {
        HighsStatus::Infeasible => secondary::RELAXATION_INFEASIBLE,
        HighsStatus::Unbounded => secondary::RELAXATION_UNBOUNDED,
        HighsStatus::ReachedTimeLimit => secondary::TIME,
        HighsStatus::ReachedIterationLimit => secondary::NODES,
        _ => secondary::NONE,
    }
}

pub(crate) fn highs_status_pair(status: HighsStatus) -> StatusPair {
    StatusPair::new(highs_to_status(status), status.code(), highs_secondary(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highs_to_status_mapping() {
        assert_eq!(highs_to_status(HighsStatus::Optimal), SolverStatus::Optimal);
        assert_eq!(
            highs_to_status(HighsStatus::UnboundedOrInfeasible),
            SolverStatus::Infeasible
        );
        assert_eq!(
            highs_to_status(HighsStatus::ReachedTimeLimit),
            SolverStatus::TimeLimit
        );
        assert_eq!(highs_to_status(HighsStatus::SolveError), SolverStatus::Error);
    }

    #[test]
    fn test_status_pair_keeps_raw_code() {
        let pair = highs_status_pair(HighsStatus::Infeasible);
        assert_eq!(pair.status, SolverStatus::Infeasible);
        assert_eq!(pair.primary, 8);
        assert_eq!(pair.secondary, secondary::RELAXATION_INFEASIBLE);
        assert_eq!(
            pair.messages(),
            vec!["Infeasible.", "Linear relaxation not feasible."]
        );
    }

    #[test]
    fn test_time_limit_message_not_repeated() {
        let pair = highs_status_pair(HighsStatus::ReachedTimeLimit);
        assert_eq!(pair.messages(), vec!["Stopped on time."]);
    }
}
