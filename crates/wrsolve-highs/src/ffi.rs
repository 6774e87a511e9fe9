//! Native HiGHS boundary.
//!
//! Everything that touches the `highs` problem builder or raw `highs-sys`
//! calls lives here. Columns and rows are staged in a [`RowProblem`]; a solve
//! consumes the staged problem and keeps the [`SolvedModel`] for reading.
#![allow(unsafe_code)]

use highs::{Col, HighsModelStatus, RowProblem, Sense as HighsSense, SolvedModel};
use std::ffi::{CStr, CString};
use std::fmt;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// Outcome of a HiGHS run, one variant per model status the engine maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighsStatus {
    Optimal,
    Infeasible,
    Unbounded,
    UnboundedOrInfeasible,
    ReachedTimeLimit,
    ReachedIterationLimit,
    ModelEmpty,
    SolveError,
    /// Any status the engine has no use for (notset, load error, ...).
    Unknown,
}

impl HighsStatus {
    /// Raw `kHighsModelStatus*` number, kept in notes as the primary code.
    pub fn code(self) -> i32 {
        match self {
            Self::SolveError => 4,
            Self::ModelEmpty => 6,
            Self::Optimal => 7,
            Self::Infeasible => 8,
            Self::UnboundedOrInfeasible => 9,
            Self::Unbounded => 10,
            Self::ReachedTimeLimit => 13,
            Self::ReachedIterationLimit => 14,
            Self::Unknown => 15,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Infeasible => "infeasible",
            Self::Unbounded => "unbounded",
            Self::UnboundedOrInfeasible => "unbounded_or_infeasible",
            Self::ReachedTimeLimit => "time_limit",
            Self::ReachedIterationLimit => "iteration_limit",
            Self::ModelEmpty => "model_empty",
            Self::SolveError => "solve_error",
            Self::Unknown => "unknown",
        }
    }
}

impl From<HighsModelStatus> for HighsStatus {
    fn from(status: HighsModelStatus) -> Self {
        match status {
            HighsModelStatus::Optimal => Self::Optimal,
            HighsModelStatus::Infeasible => Self::Infeasible,
            HighsModelStatus::Unbounded => Self::Unbounded,
            HighsModelStatus::UnboundedOrInfeasible => Self::UnboundedOrInfeasible,
            HighsModelStatus::ReachedTimeLimit => Self::ReachedTimeLimit,
            HighsModelStatus::ReachedIterationLimit => Self::ReachedIterationLimit,
            HighsModelStatus::ModelEmpty => Self::ModelEmpty,
            HighsModelStatus::SolveError => Self::SolveError,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighsModelError {
    /// A row was given a different number of column indices and coefficients.
    RowLengthMismatch { columns: usize, coefficients: usize },
    /// A row referenced a column that was never added.
    UnknownColumn { index: usize, available: usize },
    /// A start vector does not cover exactly the staged columns.
    StartLengthMismatch { expected: usize, got: usize },
    /// Solution data was read before any solve.
    SolveRequired { operation: &'static str },
}

impl HighsModelError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::RowLengthMismatch { .. } => "HIGHS_ROW_LENGTH_MISMATCH",
            Self::UnknownColumn { .. } => "HIGHS_COLUMN_OUT_OF_BOUNDS",
            Self::StartLengthMismatch { .. } => "HIGHS_START_LENGTH_MISMATCH",
            Self::SolveRequired { .. } => "HIGHS_SOLVE_REQUIRED",
        }
    }
}

impl fmt::Display for HighsModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.code())?;
        match self {
            Self::RowLengthMismatch {
                columns,
                coefficients,
            } => write!(f, "row has {columns} column indices but {coefficients} coefficients"),
            Self::UnknownColumn { index, available } => {
                write!(f, "row references column {index}, only {available} columns exist")
            }
            Self::StartLengthMismatch { expected, got } => {
                write!(f, "start vector has {got} values for {expected} columns")
            }
            Self::SolveRequired { operation } => write!(f, "{operation} needs a solved model"),
        }
    }
}

impl std::error::Error for HighsModelError {}

/// Copy of the solution vectors taken right after a solve.
#[derive(Debug, Clone)]
pub struct SolutionSnapshot {
    col_values: Vec<f64>,
    col_duals: Vec<f64>,
    row_duals: Vec<f64>,
}

impl SolutionSnapshot {
    pub fn col_values(&self) -> &[f64] {
        &self.col_values
    }

    /// Reduced costs.
    pub fn col_duals(&self) -> &[f64] {
        &self.col_duals
    }

    /// Shadow prices, in row insertion order.
    pub fn row_duals(&self) -> &[f64] {
        &self.row_duals
    }

    pub fn into_col_values(self) -> Vec<f64> {
        self.col_values
    }
}

/// Typed value for a named HiGHS option.
#[derive(Debug, Clone, PartialEq)]
pub enum HighsOption {
    Bool(bool),
    Int(i32),
    Float(f64),
    Str(String),
}

/// Settings applied to the native model at solve time, then discarded.
#[derive(Debug, Default)]
struct PendingRun {
    start: Option<Vec<f64>>,
    options: Vec<(String, HighsOption)>,
    verbosity: Option<u32>,
}

/// One staged HiGHS problem plus the result of its last solve.
///
/// A solve consumes the staged columns and rows. Call [`HighsModel::reset`]
/// and stage the instance again before the next solve.
pub struct HighsModel {
    problem: RowProblem,
    staged: Vec<Col>,
    sense: ObjectiveSense,
    console_log: bool,
    pending: PendingRun,
    solved: Option<SolvedModel>,
}

impl HighsModel {
    pub fn new() -> Self {
        Self {
            problem: RowProblem::default(),
            staged: Vec::new(),
            sense: ObjectiveSense::Minimize,
            console_log: false,
            pending: PendingRun::default(),
            solved: None,
        }
    }

    /// Release the staged problem and the solved model.
    pub fn reset(&mut self) {
        trace!(
            component = "highs",
            operation = "reset",
            status = "success",
            staged_columns = self.staged.len(),
            "Releasing HiGHS model"
        );
        self.problem = RowProblem::default();
        self.staged.clear();
        self.sense = ObjectiveSense::Minimize;
        self.pending = PendingRun::default();
        self.solved = None;
    }

    pub fn add_col(&mut self, lower: f64, upper: f64, objective: f64) -> usize {
        self.stage_column(lower, upper, objective, false)
    }

    pub fn add_integer_col(&mut self, lower: f64, upper: f64, objective: f64) -> usize {
        self.stage_column(lower, upper, objective, true)
    }

    fn stage_column(&mut self, lower: f64, upper: f64, objective: f64, integer: bool) -> usize {
        // Changing the layout invalidates any start vector set earlier.
        self.pending.start = None;
        self.solved = None;
        let col = if integer {
            self.problem.add_integer_column(objective, lower..=upper)
        } else {
            self.problem.add_column(objective, lower..=upper)
        };
        self.staged.push(col);
        self.staged.len() - 1
    }

    /// Stage `lower <= sum(coefficients[i] * x[columns[i]]) <= upper`.
    ///
    /// # Errors
    ///
    /// [`HighsModelError::RowLengthMismatch`] or
    /// [`HighsModelError::UnknownColumn`]; nothing is staged in either case.
    pub fn add_row(
        &mut self,
        lower: f64,
        upper: f64,
        columns: &[usize],
        coefficients: &[f64],
    ) -> Result<usize, HighsModelError> {
        let factors = self.row_factors(columns, coefficients).inspect_err(|err| {
            warn!(
                component = "highs",
                operation = "add_row",
                status = "error",
                error = %err,
                "Rejected row"
            );
        })?;
        self.solved = None;
        self.problem.add_row(lower..=upper, factors);
        Ok(self.problem.num_rows() - 1)
    }

    fn row_factors(
        &self,
        columns: &[usize],
        coefficients: &[f64],
    ) -> Result<Vec<(Col, f64)>, HighsModelError> {
        if columns.len() != coefficients.len() {
            return Err(HighsModelError::RowLengthMismatch {
                columns: columns.len(),
                coefficients: coefficients.len(),
            });
        }
        columns
            .iter()
            .zip(coefficients)
            .map(|(&index, &coefficient)| {
                self.staged
                    .get(index)
                    .map(|col| (*col, coefficient))
                    .ok_or(HighsModelError::UnknownColumn {
                        index,
                        available: self.staged.len(),
                    })
            })
            .collect()
    }

    pub fn set_objective_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    /// Let HiGHS print its own log during solves.
    pub fn set_log_to_console(&mut self, enabled: bool) {
        self.console_log = enabled;
    }

    /// Queue a named option for the next solve only.
    pub fn set_option(&mut self, option: impl Into<String>, value: HighsOption) {
        self.pending.options.push((option.into(), value));
    }

    pub fn set_verbosity(&mut self, level: u32) {
        self.pending.verbosity = Some(level);
    }

    /// Seed the next solve with one value per staged column.
    ///
    /// # Errors
    ///
    /// [`HighsModelError::StartLengthMismatch`] when `values` does not cover
    /// exactly the staged columns.
    pub fn set_primal_start(&mut self, values: Vec<f64>) -> Result<(), HighsModelError> {
        if values.len() != self.staged.len() {
            return Err(HighsModelError::StartLengthMismatch {
                expected: self.staged.len(),
                got: values.len(),
            });
        }
        self.pending.start = Some(values);
        Ok(())
    }

    /// Run HiGHS on the staged problem.
    pub fn solve(&mut self) -> HighsStatus {
        let columns = self.problem.num_cols();
        let rows = self.problem.num_rows();
        let sense = match self.sense {
            ObjectiveSense::Minimize => HighsSense::Minimise,
            ObjectiveSense::Maximize => HighsSense::Maximise,
        };
        let pending = std::mem::take(&mut self.pending);
        let mut model = std::mem::take(&mut self.problem).optimise(sense);

        let quiet = !self.console_log && pending.verbosity.unwrap_or(0) == 0;
        if quiet {
            model.make_quiet();
        } else {
            model.set_option("output_flag", true);
            model.set_option("log_to_console", self.console_log);
        }
        for (name, value) in &pending.options {
            match value {
                HighsOption::Bool(flag) => model.set_option(name.as_str(), *flag),
                HighsOption::Int(number) => model.set_option(name.as_str(), *number),
                HighsOption::Float(number) => model.set_option(name.as_str(), *number),
                HighsOption::Str(text) => model.set_option(name.as_str(), text.as_str()),
            }
        }
        if let Some(start) = pending.start.as_ref() {
            // A rejected start only costs speed; the solve still runs cold.
            if let Err(err) = model.try_set_solution(Some(start), None, None, None) {
                warn!(
                    component = "highs",
                    operation = "set_start",
                    status = "ignored",
                    error = ?err,
                    "HiGHS rejected the start vector"
                );
            }
        }

        let solved = model.solve();
        let status = HighsStatus::from(solved.status());
        debug!(
            component = "highs",
            operation = "native_solve",
            status = status.as_str(),
            columns,
            rows,
            options = pending.options.len(),
            warm = pending.start.is_some(),
            "HiGHS returned"
        );
        self.solved = Some(solved);
        self.staged.clear();
        status
    }

    /// Number of columns staged for the next solve.
    pub fn columns(&self) -> usize {
        self.staged.len()
    }

    fn solved(&self, operation: &'static str) -> Result<&SolvedModel, HighsModelError> {
        self.solved
            .as_ref()
            .ok_or(HighsModelError::SolveRequired { operation })
    }

    /// # Errors
    ///
    /// [`HighsModelError::SolveRequired`] before the first solve.
    pub fn objective_value(&self) -> Result<f64, HighsModelError> {
        Ok(self.solved("objective_value")?.objective_value())
    }

    /// Relative MIP gap of the last solve, NaN when nothing was solved.
    pub fn mip_gap(&self) -> f64 {
        self.solved.as_ref().map_or(f64::NAN, SolvedModel::mip_gap)
    }

    pub fn simplex_iteration_count(&self) -> u64 {
        self.int_info("simplex_iteration_count").unwrap_or(0)
    }

    fn int_info(&self, key: &str) -> Option<u64> {
        let solved = self.solved.as_ref()?;
        let key = CString::new(key).ok()?;
        let mut value: highs_sys::HighsInt = 0;
        // SAFETY: the pointer comes from a live SolvedModel and `key` outlives the call.
        let status = unsafe {
            highs_sys::Highs_getIntInfoValue(solved.as_ptr(), key.as_ptr(), &raw mut value)
        };
        (status == highs_sys::STATUS_OK)
            .then(|| u64::try_from(value).ok())
            .flatten()
    }

    /// # Errors
    ///
    /// [`HighsModelError::SolveRequired`] before the first solve.
    pub fn solution_snapshot(&self) -> Result<SolutionSnapshot, HighsModelError> {
        let solution = self.solved("solution_snapshot")?.get_solution();
        Ok(SolutionSnapshot {
            col_values: solution.columns().to_vec(),
            col_duals: solution.dual_columns().to_vec(),
            row_duals: solution.dual_rows().to_vec(),
        })
    }
}

impl Default for HighsModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HighsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighsModel")
            .field("staged_columns", &self.staged.len())
            .field("staged_rows", &self.problem.num_rows())
            .field("sense", &self.sense)
            .field("solved", &self.solved.is_some())
            .finish_non_exhaustive()
    }
}

/// Version string of the linked HiGHS library.
pub fn highs_version() -> Option<String> {
    // SAFETY: HiGHS returns a pointer to a static NUL-terminated string.
    let ptr = unsafe { highs_sys::Highs_version() };
    if ptr.is_null() {
        return None;
    }
    // SAFETY: checked non-null above; the string is static.
    let text = unsafe { CStr::from_ptr(ptr) };
    text.to_str().ok().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_model_has_nothing_staged() {
        let model = HighsModel::new();
        assert_eq!(model.columns(), 0);
        assert!(model.mip_gap().is_nan());
        assert_eq!(model.simplex_iteration_count(), 0);
    }

    #[test]
    fn test_reset_restores_minimize() {
        let mut model = HighsModel::new();
        model.add_col(0.0, 1.0, 1.0);
        model.set_objective_sense(ObjectiveSense::Maximize);
        model.reset();
        assert_eq!(model.columns(), 0);
        assert_eq!(model.sense, ObjectiveSense::Minimize);
    }

    #[test]
    fn test_status_numbers_match_highs() {
        assert_eq!(HighsStatus::Optimal.code(), 7);
        assert_eq!(HighsStatus::Infeasible.code(), 8);
        assert_eq!(HighsStatus::ReachedTimeLimit.code(), 13);
        assert_eq!(
            HighsStatus::from(HighsModelStatus::UnboundedOrInfeasible).as_str(),
            "unbounded_or_infeasible"
        );
    }

    #[test]
    fn test_rejected_row_stages_nothing() {
        let mut model = HighsModel::new();
        let x = model.add_col(0.0, 1.0, 1.0);

        let err = model.add_row(0.0, 1.0, &[x, 3], &[1.0, 1.0]).unwrap_err();
        assert_eq!(err, HighsModelError::UnknownColumn { index: 3, available: 1 });
        assert!(err.to_string().starts_with("[HIGHS_COLUMN_OUT_OF_BOUNDS]"));

        let err = model.add_row(0.0, 1.0, &[x], &[]).unwrap_err();
        assert_eq!(err.code(), "HIGHS_ROW_LENGTH_MISMATCH");
        assert_eq!(model.problem.num_rows(), 0);
    }

    #[test]
    fn test_reads_before_solve_fail() {
        let model = HighsModel::new();
        let err = model.objective_value().unwrap_err();
        assert_eq!(err.to_string(), "[HIGHS_SOLVE_REQUIRED] objective_value needs a solved model");
        assert!(model.solution_snapshot().is_err());
    }
}
