//! Elastic relaxation support.
//!
//! Every row of an elastic instance owns a positive and a negative column on
//! `[0, max]`, priced at the relax penalty. Rows that must hold for a pass
//! keep their columns but get coefficient 0, so the column layout does not
//! depend on which rows are enforced.

use std::collections::BTreeSet;

use crate::model::builder::BuildOptions;
use crate::model::error::ModelError;
use crate::model::{Column, ColumnKind, ModelInstance};
use crate::types::Bounds;

/// Default objective cost of one unit of elastic relaxation.
pub const DEFAULT_RELAX_PENALTY: f64 = 9000.0;

/// Which side of a row an elastic column relaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElasticDirection {
    /// Enters the row with `+1`.
    Positive,
    /// Enters the row with `-1`.
    Negative,
}

impl ElasticDirection {
    pub fn suffix(self) -> &'static str {
        match self {
            ElasticDirection::Positive => "_p",
            ElasticDirection::Negative => "_n",
        }
    }
}

/// Which rows may relax in an elastic build.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticSpec {
    pub penalty: f64,
    /// Rows that may not relax in this pass.
    pub enforced: BTreeSet<String>,
    /// When set, only these rows may relax.
    pub priority: Option<BTreeSet<String>>,
}

impl Default for ElasticSpec {
    fn default() -> Self {
        Self::new(DEFAULT_RELAX_PENALTY)
    }
}

impl ElasticSpec {
    pub fn new(penalty: f64) -> Self {
        Self {
            penalty,
            enforced: BTreeSet::new(),
            priority: None,
        }
    }

    pub fn with_enforced<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enforced.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_priority<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the row may take nonzero elastic values.
    pub fn is_relaxable(&self, row: &str) -> bool {
        if self.enforced.contains(row) {
            return false;
        }
        match &self.priority {
            Some(priority) => priority.contains(row),
            None => true,
        }
    }

    pub(crate) fn add_columns(
        &self,
        instance: &mut ModelInstance,
        row_name: &str,
        row: usize,
        options: &BuildOptions,
    ) -> Result<(usize, usize), ModelError> {
        let mut push = |direction: ElasticDirection| {
            instance.push_column(Column {
                name: format!("{row_name}{}", direction.suffix()),
                bounds: Bounds::new(0.0, options.max_value),
                objective: self.penalty,
                is_integer: false,
                kind: ColumnKind::Elastic { row, direction },
                declared: Bounds::non_negative(),
            })
        };
        let positive = push(ElasticDirection::Positive)?;
        let negative = push(ElasticDirection::Negative)?;
        Ok((positive, negative))
    }
}

impl ModelInstance {
    /// `(column, row, direction)` for every elastic column.
    pub fn elastic_columns(&self) -> impl Iterator<Item = (usize, usize, ElasticDirection)> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(col, column)| match column.kind {
                ColumnKind::Elastic { row, direction } => Some((col, row, direction)),
                _ => None,
            })
    }

    /// Names of rows whose elastic columns exceed `tolerance`, in row order.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not have one entry per column.
    pub fn relaxed_rows(&self, values: &[f64], tolerance: f64) -> Result<Vec<String>, ModelError> {
        self.ensure_solution_len(values)?;
        let mut rows = BTreeSet::new();
        for (col, row, _) in self.elastic_columns() {
            if values[col] > tolerance {
                rows.insert(row);
            }
        }
        Ok(rows
            .into_iter()
            .filter_map(|row| self.rows.get(row).map(|r| r.name.clone()))
            .collect())
    }
}
