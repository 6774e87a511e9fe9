//! Model instances built for a single solve attempt.
//!
//! A [`ModelInstance`] is the materialized column/row structure handed to a
//! backend. Instances are cheap to rebuild and are rebuilt for every attempt,
//! so nothing here is mutated after construction.
//!
//! # Module Organization
//!
//! - [`error`]: Model error types
//! - [`builder`]: Sign translation and instance construction
//! - [`elastic`]: Elastic (penalized slack) instances for infeasibility search
//! - [`pretty`]: LP/MPS text rendering and constraint expressions

mod builder;
mod elastic;
mod error;
mod pretty;

use std::collections::BTreeMap;

use crate::index_map::IndexMap;
use crate::types::{Bounds, Sense, Sign};

pub use builder::{BuildOptions, DEFAULT_ZERO_TOLERANCE, ModelBuilder};
pub use elastic::{DEFAULT_RELAX_PENALTY, ElasticDirection, ElasticSpec};
pub use error::ModelError;
pub use pretty::{format_bounds, format_number};

/// Origin of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Declared by the evaluator.
    Decision,
    /// Slack or surplus referenced by a constraint but never declared.
    Auxiliary,
    /// Penalized relaxation column attached to one row.
    Elastic {
        row: usize,
        direction: ElasticDirection,
    },
}

/// One column of a model instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub bounds: Bounds,
    pub objective: f64,
    pub is_integer: bool,
    pub kind: ColumnKind,
    /// Bounds as declared, before clamping to the sentinel.
    pub declared: Bounds,
}

/// One row of a model instance, stored as parallel index/coefficient slices.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub sign: Sign,
    pub bounds: Bounds,
    pub columns: Vec<usize>,
    pub coefficients: Vec<f64>,
}

impl Row {
    /// Right-hand side implied by the sign and the translated bounds.
    pub fn rhs(&self) -> f64 {
        match self.sign {
            Sign::Equal | Sign::GreaterEqual => self.bounds.lower,
            Sign::LessEqual => self.bounds.upper,
        }
    }

    /// `(column, coefficient)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.columns
            .iter()
            .copied()
            .zip(self.coefficients.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Column/row structure for one solve attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    pub(crate) sense: Sense,
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Row>,
    pub(crate) index: IndexMap,
    pub(crate) row_lookup: BTreeMap<String, usize>,
}

impl ModelInstance {
    pub(crate) fn new(sense: Sense, capacity: usize) -> Self {
        Self {
            sense,
            columns: Vec::with_capacity(capacity),
            rows: Vec::new(),
            index: IndexMap::with_capacity(capacity),
            row_lookup: BTreeMap::new(),
        }
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Index of the row named `name`.
    pub fn row_index(&self, name: &str) -> Option<usize> {
        self.row_lookup.get(name).copied()
    }

    /// Name/column mapping used to build this instance.
    pub fn index_map(&self) -> &IndexMap {
        &self.index
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of stored row entries.
    pub fn num_coefficients(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    /// Integer columns with their indices.
    pub fn integer_columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.is_integer)
    }

    /// Map a solution vector back to column names, skipping elastic columns.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not have one entry per column.
    pub fn values_by_name(&self, values: &[f64]) -> Result<BTreeMap<String, f64>, ModelError> {
        self.ensure_solution_len(values)?;
        Ok(self
            .columns
            .iter()
            .zip(values)
            .filter(|(column, _)| !matches!(column.kind, ColumnKind::Elastic { .. }))
            .map(|(column, value)| (column.name.clone(), *value))
            .collect())
    }

    /// Evaluate every row's activity for a solution vector.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not have one entry per column.
    pub fn row_activities(&self, values: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.ensure_solution_len(values)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.entries().map(|(col, coef)| coef * values[col]).sum())
            .collect())
    }

    pub(crate) fn ensure_solution_len(&self, values: &[f64]) -> Result<(), ModelError> {
        if values.len() != self.columns.len() {
            return Err(ModelError::SolutionLengthMismatch {
                expected: self.columns.len(),
                got: values.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn push_column(&mut self, column: Column) -> Result<usize, ModelError> {
        let Some(index) = self.index.insert(&column.name) else {
            return Err(ModelError::DuplicateVariable { name: column.name });
        };
        self.columns.push(column);
        Ok(index)
    }

    pub(crate) fn push_row(&mut self, row: Row) -> Result<usize, ModelError> {
        if self.row_lookup.contains_key(&row.name) {
            return Err(ModelError::DuplicateConstraint { name: row.name });
        }
        let index = self.rows.len();
        self.row_lookup.insert(row.name.clone(), index);
        self.rows.push(row);
        Ok(index)
    }
}
