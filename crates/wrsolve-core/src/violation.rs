//! Post-solve integrality and lower-bound checks.
//!
//! Values within tolerance are snapped (integers to the nearest whole number,
//! small negatives on zero-floored columns to 0); anything further out is
//! reported so the cascade can escalate.

use std::fmt;
use std::time::Instant;

use serde::Serialize;

use crate::model::{ModelError, ModelInstance};

/// Thresholds for [`ViolationPolicy::check`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViolationPolicy {
    /// When false every solution is accepted unchanged.
    pub enabled: bool,
    /// Maximum distance from the nearest integer for integer columns.
    pub integer_check: f64,
    /// How far below 0 a column with lower bound 0 may fall.
    pub lower_bound_zero_check: f64,
    /// Snap values that pass the checks.
    pub rounding: bool,
}

impl Default for ViolationPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            integer_check: 1e-8,
            lower_bound_zero_check: 1e-6,
            rounding: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Integer,
    LowerBound,
}

impl ViolationKind {
    /// Prefix used in note logs.
    pub fn note_prefix(self) -> &'static str {
        match self {
            ViolationKind::Integer => "intViolation",
            ViolationKind::LowerBound => "lbViolation",
        }
    }
}

/// A column value outside tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub column: usize,
    pub name: String,
    pub value: f64,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:::{}:{}", self.kind.note_prefix(), self.name, self.value)
    }
}

/// Checked (possibly corrected) values plus whatever failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationReport {
    pub values: Vec<f64>,
    pub violations: Vec<Violation>,
    /// Number of values that were snapped.
    pub corrected: usize,
}

impl ViolationReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_kind(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|violation| violation.kind == kind)
    }
}

impl ViolationPolicy {
    /// Validate a solution vector against this policy.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not have one entry per column.
    pub fn check(
        &self,
        instance: &ModelInstance,
        values: &[f64],
    ) -> Result<ViolationReport, ModelError> {
        instance.ensure_solution_len(values)?;
        let mut report = ViolationReport {
            values: values.to_vec(),
            violations: Vec::new(),
            corrected: 0,
        };
        if !self.enabled {
            return Ok(report);
        }

        let started = Instant::now();
        for (col, column) in instance.columns().iter().enumerate() {
            let value = report.values[col];
            if column.is_integer {
                let rounded = value.round();
                if (value - rounded).abs() > self.integer_check {
                    report.violations.push(Violation {
                        column: col,
                        name: column.name.clone(),
                        value,
                        kind: ViolationKind::Integer,
                    });
                    continue;
                }
                if self.rounding && rounded != value {
                    report.values[col] = rounded;
                    report.corrected += 1;
                }
            }

            let value = report.values[col];
            if column.bounds.lower == 0.0 && value < 0.0 {
                if value < -self.lower_bound_zero_check {
                    report.violations.push(Violation {
                        column: col,
                        name: column.name.clone(),
                        value,
                        kind: ViolationKind::LowerBound,
                    });
                } else if self.rounding {
                    report.values[col] = 0.0;
                    report.corrected += 1;
                }
            }
        }

        if report.is_clean() {
            tracing::debug!(
                component = "violation",
                operation = "check",
                status = "success",
                corrected = report.corrected,
                duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                "Solution passed violation checks"
            );
        } else {
            tracing::warn!(
                component = "violation",
                operation = "check",
                status = "violation",
                violations = report.violations.len(),
                corrected = report.corrected,
                first = %report.violations[0],
                duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                "Solution failed violation checks"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;
    use crate::types::{Bounds, Variable};

    fn instance() -> ModelInstance {
        let variables = vec![
            Variable::continuous("flow", Bounds::new(0.0, 100.0)),
            Variable::integer("gates", Bounds::new(0.0, 10.0)),
            Variable::continuous("free", Bounds::new(-5.0, 5.0)),
        ];
        ModelBuilder::new(&variables, &[]).build().unwrap()
    }

    #[test]
    fn small_negative_on_zero_floor_is_snapped() {
        let policy = ViolationPolicy::default();
        let report = policy.check(&instance(), &[-1e-9, 2.0, 0.0]).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.values[0].to_bits(), 0.0_f64.to_bits());
        assert_eq!(report.corrected, 1);
    }

    #[test]
    fn large_negative_on_zero_floor_is_flagged() {
        let policy = ViolationPolicy::default();
        let report = policy.check(&instance(), &[-1.0, 2.0, 0.0]).unwrap();
        assert!(report.has_kind(ViolationKind::LowerBound));
        assert_eq!(report.violations[0].to_string(), "lbViolation:::flow:-1");
    }

    #[test]
    fn near_integer_is_rounded() {
        let policy = ViolationPolicy::default();
        let report = policy.check(&instance(), &[1.0, 2.999999999, 0.0]).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.values[1], 3.0);
    }

    #[test]
    fn fractional_integer_is_flagged() {
        let policy = ViolationPolicy::default();
        let report = policy.check(&instance(), &[1.0, 2.9, 0.0]).unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::Integer);
        assert_eq!(report.violations[0].name, "gates");
    }

    #[test]
    fn negative_column_with_nonzero_floor_is_ignored() {
        let policy = ViolationPolicy::default();
        let report = policy.check(&instance(), &[0.0, 0.0, -4.0]).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.values[2], -4.0);
    }

    #[test]
    fn rounding_disabled_keeps_values() {
        let policy = ViolationPolicy {
            rounding: false,
            ..ViolationPolicy::default()
        };
        let report = policy.check(&instance(), &[-1e-9, 2.999999999, 0.0]).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.values[0], -1e-9);
        assert_eq!(report.values[1], 2.999999999);
        assert_eq!(report.corrected, 0);
    }

    #[test]
    fn disabled_policy_accepts_everything() {
        let policy = ViolationPolicy {
            enabled: false,
            ..ViolationPolicy::default()
        };
        let report = policy.check(&instance(), &[-1.0, 2.5, 0.0]).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.values, vec![-1.0, 2.5, 0.0]);
    }

    #[test]
    fn wrong_length_is_an_error() {
        let err = ViolationPolicy::default()
            .check(&instance(), &[0.0])
            .unwrap_err();
        assert_eq!(err.code(), "SOLUTION_LENGTH_MISMATCH");
    }
}
