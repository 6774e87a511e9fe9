//! Text rendering for model instances.
//!
//! Three outputs share one number formatter: CPLEX-LP dumps, free-format MPS
//! dumps, and the one-line constraint expressions used in infeasibility
//! findings.

use std::fmt::Write as _;

use crate::model::{ColumnKind, ModelInstance, Row};
use crate::types::{Bounds, MAX_VALUE, Sense, Sign};

const FLOAT_EQ_EPSILON: f64 = 1e-12;
const LP_TERMS_PER_LINE: usize = 8;
const SCIENTIFIC_THRESHOLD: f64 = 1e15;

impl ModelInstance {
    /// One-line expression for a row, e.g. `supply: x + 2 y >= 4`.
    ///
    /// Elastic columns are left out so the text matches the constraint the
    /// model author wrote.
    pub fn describe_row(&self, row: usize) -> Option<String> {
        let row = self.rows.get(row)?;
        let terms: Vec<(&str, f64)> = self
            .non_elastic_entries(row)
            .map(|(col, coef)| (self.columns[col].name.as_str(), coef))
            .collect();
        Some(format!(
            "{}: {} {} {}",
            row.name,
            format_linear_expression(&terms),
            row.sign,
            format_number(row.rhs())
        ))
    }

    /// Declared bounds of the decision columns a row references.
    pub fn describe_row_bounds(&self, row: usize) -> Vec<String> {
        let Some(row) = self.rows.get(row) else {
            return Vec::new();
        };
        self.non_elastic_entries(row)
            .filter_map(|(col, _)| {
                let column = &self.columns[col];
                match column.kind {
                    ColumnKind::Decision => format_bounds(&column.name, column.declared),
                    _ => None,
                }
            })
            .collect()
    }

    /// Render the instance as CPLEX-LP text.
    pub fn to_lp_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "\\ {} columns, {} rows",
            self.num_columns(),
            self.num_rows()
        );
        out.push_str(match self.sense {
            Sense::Minimize => "Minimize\n",
            Sense::Maximize => "Maximize\n",
        });
        let objective: Vec<(&str, f64)> = self
            .columns
            .iter()
            .filter(|column| !float_approx_equal(column.objective, 0.0))
            .map(|column| (column.name.as_str(), column.objective))
            .collect();
        let _ = writeln!(out, " obj: {}", format_lp_terms(&objective));

        out.push_str("Subject To\n");
        for row in &self.rows {
            let terms: Vec<(&str, f64)> = row
                .entries()
                .map(|(col, coef)| (self.columns[col].name.as_str(), coef))
                .collect();
            let _ = writeln!(
                out,
                " {}: {} {} {}",
                row.name,
                format_lp_terms(&terms),
                row.sign,
                format_number(row.rhs())
            );
        }

        out.push_str("Bounds\n");
        for column in &self.columns {
            let lower = format_number(column.bounds.lower);
            let upper = format_number(column.bounds.upper);
            if float_approx_equal(column.bounds.lower, column.bounds.upper) {
                let _ = writeln!(out, " {} = {}", column.name, lower);
            } else {
                let _ = writeln!(out, " {} <= {} <= {}", lower, column.name, upper);
            }
        }

        let integers: Vec<&str> = self
            .integer_columns()
            .map(|(_, column)| column.name.as_str())
            .collect();
        if !integers.is_empty() {
            out.push_str("Generals\n");
            for chunk in integers.chunks(LP_TERMS_PER_LINE) {
                let _ = writeln!(out, " {}", chunk.join(" "));
            }
        }
        out.push_str("End\n");
        out
    }

    /// Render the instance as free-format MPS text.
    pub fn to_mps_string(&self, name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "NAME {name}");
        if self.sense == Sense::Maximize {
            out.push_str("OBJSENSE\n    MAX\n");
        }
        out.push_str("ROWS\n N  obj\n");
        for row in &self.rows {
            let kind = match row.sign {
                Sign::Equal => "E",
                Sign::LessEqual => "L",
                Sign::GreaterEqual => "G",
            };
            let _ = writeln!(out, " {kind}  {}", row.name);
        }

        let mut by_column: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.columns.len()];
        for (row_idx, row) in self.rows.iter().enumerate() {
            for (col, coef) in row.entries() {
                by_column[col].push((row_idx, coef));
            }
        }

        out.push_str("COLUMNS\n");
        let mut in_integer_block = false;
        let mut marker = 0usize;
        for (col, column) in self.columns.iter().enumerate() {
            if column.is_integer != in_integer_block {
                let kind = if column.is_integer { "INTORG" } else { "INTEND" };
                let _ = writeln!(out, "    MARKER{marker} 'MARKER' '{kind}'");
                marker += 1;
                in_integer_block = column.is_integer;
            }
            if !float_approx_equal(column.objective, 0.0) {
                let _ = writeln!(
                    out,
                    "    {} obj {}",
                    column.name,
                    format_number(column.objective)
                );
            }
            for (row_idx, coef) in &by_column[col] {
                let _ = writeln!(
                    out,
                    "    {} {} {}",
                    column.name,
                    self.rows[*row_idx].name,
                    format_number(*coef)
                );
            }
        }
        if in_integer_block {
            let _ = writeln!(out, "    MARKER{marker} 'MARKER' 'INTEND'");
        }

        out.push_str("RHS\n");
        for row in &self.rows {
            let rhs = row.rhs();
            if !float_approx_equal(rhs, 0.0) {
                let _ = writeln!(out, "    RHS {} {}", row.name, format_number(rhs));
            }
        }

        out.push_str("BOUNDS\n");
        for column in &self.columns {
            let Bounds { lower, upper } = column.bounds;
            if float_approx_equal(lower, upper) {
                let _ = writeln!(out, " FX BND {} {}", column.name, format_number(lower));
                continue;
            }
            if !float_approx_equal(lower, 0.0) {
                let _ = writeln!(out, " LO BND {} {}", column.name, format_number(lower));
            }
            let _ = writeln!(out, " UP BND {} {}", column.name, format_number(upper));
        }
        out.push_str("ENDATA\n");
        out
    }

    fn non_elastic_entries<'r>(&'r self, row: &'r Row) -> impl Iterator<Item = (usize, f64)> + 'r {
        row.entries()
            .filter(|(col, _)| !matches!(self.columns[*col].kind, ColumnKind::Elastic { .. }))
    }
}

/// Bounds line such as `0 <= x <= 5`; `None` for a free variable.
///
/// Values at or beyond the sentinel are treated as infinite.
pub fn format_bounds(label: &str, bounds: Bounds) -> Option<String> {
    let lower_finite = bounds.lower.is_finite() && bounds.lower.abs() < MAX_VALUE;
    let upper_finite = bounds.upper.is_finite() && bounds.upper.abs() < MAX_VALUE;
    if !lower_finite && !upper_finite {
        return None;
    }

    if lower_finite && upper_finite {
        if float_approx_equal(bounds.lower, bounds.upper) {
            return Some(format!("{label} = {}", format_number(bounds.lower)));
        }
        return Some(format!(
            "{} <= {label} <= {}",
            format_number(bounds.lower),
            format_number(bounds.upper)
        ));
    }
    if lower_finite {
        return Some(format!("{label} >= {}", format_number(bounds.lower)));
    }
    Some(format!("{label} <= {}", format_number(bounds.upper)))
}

/// Shared numeric formatter: up to 12 decimals, trailing zeros trimmed.
///
/// Magnitudes of `1e15` and above are printed in exponent form (`1e28`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-inf".to_string()
        } else {
            "inf".to_string()
        };
    }

    if value.abs() >= SCIENTIFIC_THRESHOLD {
        return format!("{value:e}");
    }

    let mut rendered = format!("{value:.12}");
    while rendered.ends_with('0') {
        rendered.pop();
    }
    if rendered.ends_with('.') {
        rendered.pop();
    }
    if rendered == "-0" {
        "0".to_string()
    } else {
        rendered
    }
}

fn format_linear_expression(terms: &[(&str, f64)]) -> String {
    let nonzero: Vec<&(&str, f64)> = terms
        .iter()
        .filter(|(_, coef)| !float_approx_equal(*coef, 0.0))
        .collect();
    if nonzero.is_empty() {
        return "0".to_string();
    }

    let mut rendered = String::new();
    for (idx, (label, coef)) in nonzero.into_iter().enumerate() {
        let negative = *coef < 0.0;
        let magnitude = coef.abs();
        let body = if float_approx_equal(magnitude, 1.0) {
            (*label).to_string()
        } else {
            format!("{} {label}", format_number(magnitude))
        };
        if idx == 0 {
            if negative {
                rendered.push('-');
            }
            rendered.push_str(&body);
        } else if negative {
            let _ = write!(rendered, " - {body}");
        } else {
            let _ = write!(rendered, " + {body}");
        }
    }
    rendered
}

fn format_lp_terms(terms: &[(&str, f64)]) -> String {
    if terms.is_empty() {
        return "0".to_string();
    }
    let mut rendered = String::new();
    for (idx, (label, coef)) in terms.iter().enumerate() {
        if idx > 0 && idx % LP_TERMS_PER_LINE == 0 {
            rendered.push_str("\n   ");
        }
        let sign = if *coef < 0.0 { "-" } else { "+" };
        if idx == 0 && *coef >= 0.0 {
            let _ = write!(rendered, "{} {label}", format_number(coef.abs()));
        } else {
            let _ = write!(rendered, " {sign} {} {label}", format_number(coef.abs()));
        }
    }
    rendered
}

fn float_approx_equal(lhs: f64, rhs: f64) -> bool {
    if lhs.to_bits() == rhs.to_bits() {
        return true;
    }
    if !lhs.is_finite() || !rhs.is_finite() {
        return false;
    }
    let scale = lhs.abs().max(rhs.abs()).max(1.0);
    (lhs - rhs).abs() <= FLOAT_EQ_EPSILON * scale
}
