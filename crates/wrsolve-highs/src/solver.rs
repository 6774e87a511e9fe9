//! HiGHS implementation of the engine's backend capability.

use std::time::Instant;

use tracing::{debug, warn};
use wrsolve_core::Sense;
use wrsolve_solver::{Backend, BackendError, SearchMode, SolveParams, StatusPair};

use crate::ffi::{HighsModel, HighsModelError, HighsOption, HighsStatus, ObjectiveSense, highs_version};
use crate::status::highs_status_pair;

const BACKEND: &str = "highs";

fn backend_error(err: HighsModelError) -> BackendError {
    BackendError::new(BACKEND, err.code(), err.to_string())
}

/// Solution data read right after a solve.
#[derive(Debug, Clone)]
struct LastSolve {
    status: HighsStatus,
    values: Vec<f64>,
    objective: Option<f64>,
    row_duals: Vec<f64>,
    col_duals: Vec<f64>,
}

/// Drives one [`HighsModel`] through the primitive backend calls.
#[derive(Debug, Default)]
pub struct HighsBackend {
    model: HighsModel,
    num_columns: usize,
    num_rows: usize,
    has_integers: bool,
    last: Option<LastSolve>,
}

impl HighsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_params(&mut self, params: &SolveParams) {
        let presolve = params
            .presolve
            .unwrap_or(params.mode == SearchMode::Full);
        self.model.set_option(
            "presolve",
            HighsOption::Str(if presolve { "on" } else { "off" }.to_string()),
        );
        self.model.set_option(
            "primal_feasibility_tolerance",
            HighsOption::Float(params.primal_tolerance),
        );
        self.model.set_option(
            "mip_feasibility_tolerance",
            HighsOption::Float(params.integer_tolerance),
        );
        if let Some(limit) = params.time_limit {
            self.model.set_option("time_limit", HighsOption::Float(limit));
        }
        if let Some(gap) = params.mip_gap {
            self.model.set_option("mip_rel_gap", HighsOption::Float(gap));
        }
        if let Some(threads) = params.threads {
            let threads = i32::try_from(threads).unwrap_or(i32::MAX);
            self.model.set_option("threads", HighsOption::Int(threads));
        }
        if let Some(level) = params.verbosity {
            self.model.set_verbosity(level);
        }
        self.model.set_log_to_console(params.log_to_console);
    }

    fn read_solution(&self, status: HighsStatus) -> Result<LastSolve, BackendError> {
        if status != HighsStatus::Optimal {
            return Ok(LastSolve {
                status,
                values: Vec::new(),
                objective: None,
                row_duals: Vec::new(),
                col_duals: Vec::new(),
            });
        }
        let snapshot = self.model.solution_snapshot().map_err(backend_error)?;
        let objective = self.model.objective_value().map_err(backend_error)?;
        Ok(LastSolve {
            status,
            row_duals: snapshot.row_duals().to_vec(),
            col_duals: snapshot.col_duals().to_vec(),
            values: snapshot.into_col_values(),
            objective: Some(objective),
        })
    }

    /// Duals are only meaningful for an optimal pure LP.
    fn lp_duals(&self) -> Option<&LastSolve> {
        self.last
            .as_ref()
            .filter(|last| !self.has_integers && last.status == HighsStatus::Optimal)
    }
}

impl Backend for HighsBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn version(&self) -> String {
        highs_version().unwrap_or_else(|| "unknown".to_string())
    }

    fn reset(&mut self) -> Result<(), BackendError> {
        self.model.reset();
        self.num_columns = 0;
        self.num_rows = 0;
        self.has_integers = false;
        self.last = None;
        Ok(())
    }

    fn set_objective_sense(&mut self, sense: Sense) -> Result<(), BackendError> {
        self.model.set_objective_sense(match sense {
            Sense::Minimize => ObjectiveSense::Minimize,
            Sense::Maximize => ObjectiveSense::Maximize,
        });
        Ok(())
    }

    fn add_column(
        &mut self,
        _name: &str,
        lower: f64,
        upper: f64,
        objective: f64,
        is_integer: bool,
    ) -> Result<usize, BackendError> {
        let col = if is_integer {
            self.has_integers = true;
            self.model.add_integer_col(lower, upper, objective)
        } else {
            self.model.add_col(lower, upper, objective)
        };
        self.num_columns += 1;
        Ok(col)
    }

    fn add_row(
        &mut self,
        _name: &str,
        lower: f64,
        upper: f64,
        columns: &[usize],
        coefficients: &[f64],
    ) -> Result<usize, BackendError> {
        let row = self
            .model
            .add_row(lower, upper, columns, coefficients)
            .map_err(backend_error)?;
        self.num_rows += 1;
        Ok(row)
    }

    fn set_start(&mut self, values: &[f64]) -> Result<(), BackendError> {
        self.model
            .set_primal_start(values.to_vec())
            .map_err(backend_error)
    }

    fn solve(&mut self, params: &SolveParams) -> Result<StatusPair, BackendError> {
        let started = Instant::now();
        self.apply_params(params);
        let status = self.model.solve();
        let pair = highs_status_pair(status);

        let last = self.read_solution(status);
        if let Err(err) = &last {
            warn!(
                component = "highs",
                operation = "read_solution",
                status = "error",
                error = %err,
                "Failed to read HiGHS solution"
            );
        }
        self.last = Some(last?);

        debug!(
            component = "highs",
            operation = "solve",
            status = status.as_str(),
            mode = ?params.mode,
            primal_tolerance = params.primal_tolerance,
            columns = self.num_columns,
            rows = self.num_rows,
            simplex_iterations = self.model.simplex_iteration_count(),
            mip_gap = self.model.mip_gap(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "HiGHS solve finished"
        );
        Ok(pair)
    }

    fn column_values(&self) -> Result<Vec<f64>, BackendError> {
        match &self.last {
            Some(last) if last.status == HighsStatus::Optimal => Ok(last.values.clone()),
            _ => Err(backend_error(HighsModelError::SolveRequired {
                operation: "column_values",
            })),
        }
    }

    fn objective_value(&self) -> Option<f64> {
        self.last.as_ref().and_then(|last| last.objective)
    }

    fn row_duals(&self) -> Option<Vec<f64>> {
        self.lp_duals().map(|last| last.row_duals.clone())
    }

    fn reduced_costs(&self) -> Option<Vec<f64>> {
        self.lp_duals().map(|last| last.col_duals.clone())
    }

    fn supports_sensitivity_analysis(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use wrsolve_solver::SolverStatus;

    fn params(mode: SearchMode) -> SolveParams {
        SolveParams::new(mode, 1e-9, 1e-9)
    }

    #[test]
    fn test_lp_solve_reads_values_and_duals() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();

        let mut backend = HighsBackend::new();
        backend.reset().unwrap();
        backend.set_objective_sense(Sense::Maximize).unwrap();
        let x = backend.add_column("x", 0.0, 10.0, 1.0, false).unwrap();
        let y = backend.add_column("y", 0.0, 10.0, 2.0, false).unwrap();
        backend
            .add_row("cap", f64::NEG_INFINITY, 4.0, &[x, y], &[1.0, 1.0])
            .unwrap();

        let status = backend.solve(&params(SearchMode::Standard)).unwrap();
        assert_eq!(status.status, SolverStatus::Optimal);
        let values = backend.column_values().unwrap();
        assert!((values[y] - 4.0).abs() < 1e-6);
        assert!((backend.objective_value().unwrap() - 8.0).abs() < 1e-6);
        assert_eq!(backend.row_duals().map(|duals| duals.len()), Some(1));
    }

    #[test]
    fn test_mip_has_no_duals() {
        let mut backend = HighsBackend::new();
        backend.set_objective_sense(Sense::Maximize).unwrap();
        let n = backend.add_column("n", 0.0, 10.0, 1.0, true).unwrap();
        backend.add_row("cap", f64::NEG_INFINITY, 2.5, &[n], &[1.0]).unwrap();

        let status = backend.solve(&params(SearchMode::Full)).unwrap();
        assert!(status.is_success());
        assert!((backend.column_values().unwrap()[n] - 2.0).abs() < 1e-6);
        assert!(backend.row_duals().is_none());
    }

    #[test]
    fn test_infeasible_has_no_values() {
        let mut backend = HighsBackend::new();
        let x = backend.add_column("x", 0.0, 1.0, 1.0, false).unwrap();
        backend.add_row("low", 5.0, f64::INFINITY, &[x], &[1.0]).unwrap();

        let status = backend.solve(&params(SearchMode::Full)).unwrap();
        assert_eq!(status.status, SolverStatus::Infeasible);
        let err = backend.column_values().unwrap_err();
        assert_eq!(err.code(), "HIGHS_SOLVE_REQUIRED");
        assert!(backend.objective_value().is_none());
    }

    #[test]
    fn test_bad_row_is_backend_error() {
        let mut backend = HighsBackend::new();
        backend.add_column("x", 0.0, 1.0, 1.0, false).unwrap();
        let err = backend.add_row("bad", 0.0, 1.0, &[3], &[1.0]).unwrap_err();
        assert_eq!(err.backend, "highs");
        assert_eq!(err.code(), "HIGHS_COLUMN_OUT_OF_BOUNDS");
    }
}
