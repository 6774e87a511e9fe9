//! Instance construction and sign translation.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::model::elastic::ElasticSpec;
use crate::model::error::ModelError;
use crate::model::{Column, ColumnKind, ModelInstance, Row};
use crate::types::{Bounds, Constraint, MAX_VALUE, Sense, Sign, Variable, Weights};

/// Default magnitude below which bounds and coefficients snap to zero.
pub const DEFAULT_ZERO_TOLERANCE: f64 = 1e-11;

/// Numeric thresholds applied while translating constraints into rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Values with magnitude below this become exactly zero.
    pub zero_tolerance: f64,
    /// Values with magnitude above this are clamped; also the infinity sentinel.
    pub max_value: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            zero_tolerance: DEFAULT_ZERO_TOLERANCE,
            max_value: MAX_VALUE,
        }
    }
}

impl BuildOptions {
    pub fn with_zero_tolerance(mut self, tolerance: f64) -> Self {
        self.zero_tolerance = tolerance;
        self
    }

    pub fn with_max_value(mut self, max_value: f64) -> Self {
        self.max_value = max_value;
        self
    }

    /// Zero-snap then clamp a finite value.
    pub fn snap(&self, value: f64) -> f64 {
        if value.abs() < self.zero_tolerance {
            0.0
        } else if value.abs() > self.max_value {
            self.max_value * value.signum()
        } else {
            value
        }
    }

    /// Row bounds for `terms + constant <sign> 0`.
    ///
    /// `=` pins both ends to `-constant`; `<=` and `>=` open the other end to
    /// the sentinel.
    pub fn row_bounds(&self, sign: Sign, constant: f64) -> Bounds {
        let rhs = self.snap(-constant);
        match sign {
            Sign::Equal => Bounds::new(rhs, rhs),
            Sign::LessEqual => Bounds::new(-self.max_value, rhs),
            Sign::GreaterEqual => Bounds::new(rhs, self.max_value),
        }
    }

    fn clamp_bound(&self, value: f64) -> f64 {
        value.clamp(-self.max_value, self.max_value)
    }
}

/// Builds [`ModelInstance`]s from evaluator output.
///
/// The builder borrows the cycle's definitions and never mutates them, so
/// repeated builds of the same input yield identical column orderings.
#[derive(Debug, Clone)]
pub struct ModelBuilder<'a> {
    variables: &'a [Variable],
    constraints: &'a [Constraint],
    weights: Option<&'a Weights>,
    options: BuildOptions,
    skipped: BTreeSet<String>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(variables: &'a [Variable], constraints: &'a [Constraint]) -> Self {
        Self {
            variables,
            constraints,
            weights: None,
            options: BuildOptions::default(),
            skipped: BTreeSet::new(),
        }
    }

    pub fn with_weights(mut self, weights: &'a Weights) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Leave the named constraint out of the built instance.
    pub fn skip_constraint(mut self, name: impl Into<String>) -> Self {
        self.skipped.insert(name.into());
        self
    }

    pub fn skip_constraints<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skipped.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Build the cycle instance: maximize the weighted objective.
    ///
    /// # Errors
    ///
    /// Returns a construction error for duplicate names, inverted bounds or
    /// non-finite coefficients.
    pub fn build(&self) -> Result<ModelInstance, ModelError> {
        self.assemble(None)
    }

    /// Build the elastic instance used by the infeasibility search.
    ///
    /// # Errors
    ///
    /// Same as [`ModelBuilder::build`], plus an invalid penalty.
    pub fn build_elastic(&self, spec: &ElasticSpec) -> Result<ModelInstance, ModelError> {
        if !spec.penalty.is_finite() || spec.penalty < 0.0 {
            return Err(ModelError::InvalidElasticPenalty {
                penalty: spec.penalty,
            });
        }
        self.assemble(Some(spec))
    }

    fn assemble(&self, elastic: Option<&ElasticSpec>) -> Result<ModelInstance, ModelError> {
        let started = Instant::now();
        if self.variables.is_empty() && self.constraints.is_empty() {
            return Err(ModelError::EmptyModel);
        }

        let sense = if elastic.is_some() {
            Sense::Minimize
        } else {
            Sense::Maximize
        };
        let mut instance = ModelInstance::new(sense, self.variables.len());
        self.add_decision_columns(&mut instance, elastic.is_some())?;

        let mut auxiliary = 0usize;
        let mut skipped = 0usize;
        for constraint in self.constraints {
            if self.skipped.contains(&constraint.name) {
                skipped += 1;
                continue;
            }
            auxiliary += self.add_row(&mut instance, constraint, elastic)?;
        }

        tracing::debug!(
            component = "model",
            operation = "build",
            status = "success",
            elastic = elastic.is_some(),
            columns = instance.num_columns(),
            rows = instance.num_rows(),
            nnz = instance.num_coefficients(),
            auxiliary,
            skipped,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Built model instance"
        );

        Ok(instance)
    }

    fn add_decision_columns(
        &self,
        instance: &mut ModelInstance,
        zero_objective: bool,
    ) -> Result<(), ModelError> {
        for variable in self.variables {
            let Bounds { lower, upper } = variable.bounds;
            if lower.is_nan() || upper.is_nan() || lower > upper {
                return Err(ModelError::InvalidVariableBounds {
                    name: variable.name.clone(),
                    lower,
                    upper,
                });
            }
            let weight = self
                .weights
                .and_then(|weights| weights.primary.get(&variable.name))
                .copied()
                .unwrap_or(variable.weight);
            instance.push_column(Column {
                name: variable.name.clone(),
                bounds: Bounds::new(
                    self.options.clamp_bound(lower),
                    self.options.clamp_bound(upper),
                ),
                objective: if zero_objective { 0.0 } else { weight },
                is_integer: variable.is_integer,
                kind: ColumnKind::Decision,
                declared: variable.bounds,
            })?;
        }
        Ok(())
    }

    /// Append one row; returns how many auxiliary columns it created.
    fn add_row(
        &self,
        instance: &mut ModelInstance,
        constraint: &Constraint,
        elastic: Option<&ElasticSpec>,
    ) -> Result<usize, ModelError> {
        if !constraint.constant.is_finite() {
            return Err(ModelError::NonFiniteValue {
                constraint: constraint.name.clone(),
                variable: "<constant>".to_string(),
            });
        }
        let bounds = self.options.row_bounds(constraint.sign, constraint.constant);

        let mut created = 0usize;
        let mut columns = Vec::with_capacity(constraint.terms.len() + 2);
        let mut coefficients = Vec::with_capacity(constraint.terms.len() + 2);
        let mut positions: BTreeMap<usize, usize> = BTreeMap::new();

        for (name, coefficient) in &constraint.terms {
            if !coefficient.is_finite() {
                return Err(ModelError::NonFiniteValue {
                    constraint: constraint.name.clone(),
                    variable: name.clone(),
                });
            }
            let col = match instance.index.index_of(name) {
                Some(col) => col,
                None => {
                    created += 1;
                    self.add_auxiliary_column(instance, name, elastic.is_some())?
                }
            };
            let coefficient = if coefficient.abs() < self.options.zero_tolerance {
                0.0
            } else {
                *coefficient
            };
            // Repeated references to one column within a row are merged.
            match positions.get(&col) {
                Some(&pos) => coefficients[pos] += coefficient,
                None => {
                    positions.insert(col, columns.len());
                    columns.push(col);
                    coefficients.push(coefficient);
                }
            }
        }

        let row_index = instance.rows.len();
        if let Some(spec) = elastic {
            let coefficient = if spec.is_relaxable(&constraint.name) {
                1.0
            } else {
                0.0
            };
            let (positive, negative) =
                spec.add_columns(instance, &constraint.name, row_index, &self.options)?;
            if coefficient != 0.0 {
                columns.extend([positive, negative]);
                coefficients.extend([coefficient, -coefficient]);
            }
        }

        tracing::trace!(
            component = "model",
            operation = "add_row",
            status = "success",
            row = constraint.name.as_str(),
            sign = constraint.sign.as_str(),
            lower = bounds.lower,
            upper = bounds.upper,
            terms = columns.len(),
            "Added row"
        );

        instance.push_row(Row {
            name: constraint.name.clone(),
            sign: constraint.sign,
            bounds,
            columns,
            coefficients,
        })?;
        Ok(created)
    }

    fn add_auxiliary_column(
        &self,
        instance: &mut ModelInstance,
        name: &str,
        zero_objective: bool,
    ) -> Result<usize, ModelError> {
        let weight = self
            .weights
            .and_then(|weights| weights.secondary.get(name))
            .copied()
            .unwrap_or(0.0);
        tracing::trace!(
            component = "model",
            operation = "add_auxiliary",
            status = "success",
            column = name,
            weight,
            "Inserted implicit slack/surplus column"
        );
        instance.push_column(Column {
            name: name.to_string(),
            bounds: Bounds::new(0.0, self.options.max_value),
            objective: if zero_objective { 0.0 } else { weight },
            is_integer: false,
            kind: ColumnKind::Auxiliary,
            declared: Bounds::non_negative(),
        })
    }
}
