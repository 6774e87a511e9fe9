//! The narrow capability interface every numerical backend implements.
//!
//! Cascade and diagnosis logic only talks to backends through [`Backend`];
//! [`load_instance`] is the one place that turns a [`ModelInstance`] into
//! primitive add-column/add-row calls.

use std::time::Instant;

use serde::Serialize;
use wrsolve_core::{ModelInstance, Sense};

use crate::status::StatusPair;

/// Which search the backend runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Default solve path at the given tolerance.
    Standard,
    /// The backend's complete native search (presolve, full branch and bound).
    Full,
}

/// Parameters for one backend solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveParams {
    pub mode: SearchMode,
    pub primal_tolerance: f64,
    pub integer_tolerance: f64,
    pub time_limit: Option<f64>,
    pub mip_gap: Option<f64>,
    pub threads: Option<u32>,
    pub presolve: Option<bool>,
    pub verbosity: Option<u32>,
    pub log_to_console: bool,
}

impl SolveParams {
    pub fn new(mode: SearchMode, primal_tolerance: f64, integer_tolerance: f64) -> Self {
        Self {
            mode,
            primal_tolerance,
            integer_tolerance,
            time_limit: None,
            mip_gap: None,
            threads: None,
            presolve: None,
            verbosity: None,
            log_to_console: false,
        }
    }
}

/// A fault at the native call boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub backend: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl BackendError {
    pub fn new(backend: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            backend,
            code,
            message: message.into(),
        }
    }

    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.backend, self.message)
    }
}

impl std::error::Error for BackendError {}

/// Primitive operations a solver backend provides.
///
/// Column and row indices are assigned densely in call order. Names are
/// passed through for backends that keep them; they are never used as keys.
pub trait Backend {
    fn name(&self) -> &'static str;

    fn version(&self) -> String;

    /// Release every native structure and start an empty model.
    ///
    /// # Errors
    ///
    /// Returns an error if the native model could not be recreated.
    fn reset(&mut self) -> Result<(), BackendError>;

    fn set_objective_sense(&mut self, sense: Sense) -> Result<(), BackendError>;

    fn add_column(
        &mut self,
        name: &str,
        lower: f64,
        upper: f64,
        objective: f64,
        is_integer: bool,
    ) -> Result<usize, BackendError>;

    fn add_row(
        &mut self,
        name: &str,
        lower: f64,
        upper: f64,
        columns: &[usize],
        coefficients: &[f64],
    ) -> Result<usize, BackendError>;

    /// Full-length primal start for the next solve.
    fn set_start(&mut self, values: &[f64]) -> Result<(), BackendError>;

    fn solve(&mut self, params: &SolveParams) -> Result<StatusPair, BackendError>;

    /// Primal values of the last solve, one per column.
    fn column_values(&self) -> Result<Vec<f64>, BackendError>;

    fn objective_value(&self) -> Option<f64>;

    fn row_duals(&self) -> Option<Vec<f64>> {
        None
    }

    fn reduced_costs(&self) -> Option<Vec<f64>> {
        None
    }

    fn supports_sensitivity_analysis(&self) -> bool {
        false
    }
}

/// Reset `backend` and load every column and row of `instance`.
///
/// # Errors
///
/// Returns the first backend fault.
pub fn load_instance<B: Backend + ?Sized>(
    backend: &mut B,
    instance: &ModelInstance,
) -> Result<(), BackendError> {
    let started = Instant::now();
    backend.reset()?;
    backend.set_objective_sense(instance.sense())?;
    for column in instance.columns() {
        backend.add_column(
            &column.name,
            column.bounds.lower,
            column.bounds.upper,
            column.objective,
            column.is_integer,
        )?;
    }
    for row in instance.rows() {
        backend.add_row(
            &row.name,
            row.bounds.lower,
            row.bounds.upper,
            &row.columns,
            &row.coefficients,
        )?;
    }
    tracing::debug!(
        component = "backend",
        operation = "load",
        status = "success",
        backend = backend.name(),
        columns = instance.num_columns(),
        rows = instance.num_rows(),
        nnz = instance.num_coefficients(),
        duration_ms = started.elapsed().as_secs_f64() * 1000.0,
        "Loaded instance into backend"
    );
    Ok(())
}

/// Value closest to zero that lies within `[lower, upper]`.
pub fn default_primal_value(lower: f64, upper: f64) -> f64 {
    if lower <= 0.0 && upper >= 0.0 {
        0.0
    } else if lower > 0.0 {
        lower
    } else {
        upper
    }
}

/// Primal start vector: hinted columns take their hint, the rest
/// [`default_primal_value`].
pub fn start_vector(instance: &ModelInstance, hints: &[(usize, f64)]) -> Vec<f64> {
    let mut values: Vec<f64> = instance
        .columns()
        .iter()
        .map(|column| default_primal_value(column.bounds.lower, column.bounds.upper))
        .collect();
    for &(col, value) in hints {
        if let Some(slot) = values.get_mut(col) {
            *slot = value;
        }
    }
    values
}

/// What one backend solve of an instance produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: StatusPair,
    /// Present when the status carries a primal solution.
    pub values: Option<Vec<f64>>,
    pub objective: Option<f64>,
    pub load_ms: f64,
    pub solve_ms: f64,
}

/// Load `instance`, optionally seed a start, solve, and read the solution.
///
/// # Errors
///
/// Returns the first backend fault.
pub fn run_instance<B: Backend + ?Sized>(
    backend: &mut B,
    instance: &ModelInstance,
    params: &SolveParams,
    start: Option<&[f64]>,
) -> Result<SolveOutcome, BackendError> {
    let load_started = Instant::now();
    load_instance(backend, instance)?;
    if let Some(start) = start {
        backend.set_start(start)?;
    }
    let load_ms = load_started.elapsed().as_secs_f64() * 1000.0;

    let solve_started = Instant::now();
    let status = backend.solve(params)?;
    let solve_ms = solve_started.elapsed().as_secs_f64() * 1000.0;

    let (values, objective) = if status.status.has_solution() {
        (Some(backend.column_values()?), backend.objective_value())
    } else {
        (None, None)
    };
    Ok(SolveOutcome {
        status,
        values,
        objective,
        load_ms,
        solve_ms,
    })
}
