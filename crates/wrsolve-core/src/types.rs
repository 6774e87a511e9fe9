use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::CycleId;
use crate::model::ModelError;

/// Finite stand-in for an unbounded value. Bounds beyond it are clamped.
pub const MAX_VALUE: f64 = 1e28;

/// Optimization sense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// Relational sign of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Sign {
    Equal,
    LessEqual,
    GreaterEqual,
}

impl Sign {
    pub fn as_str(self) -> &'static str {
        match self {
            Sign::Equal => "=",
            Sign::LessEqual => "<=",
            Sign::GreaterEqual => ">=",
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sign {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(Sign::Equal),
            "<" | "<=" => Ok(Sign::LessEqual),
            ">" | ">=" => Ok(Sign::GreaterEqual),
            other => Err(ModelError::InvalidSign {
                sign: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Sign {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sign> for String {
    fn from(sign: Sign) -> Self {
        sign.as_str().to_string()
    }
}

/// Bounds for a variable or constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `[0, +inf)`, the domain of slack and surplus columns.
    pub fn non_negative() -> Self {
        Self::new(0.0, f64::INFINITY)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// A decision variable produced by the rule evaluator for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub bounds: Bounds,
    #[serde(default)]
    pub is_integer: bool,
    /// Objective weight; the cycle model maximizes `sum(weight * x)`.
    #[serde(default)]
    pub weight: f64,
    /// Value assigned by the most recent accepted solve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Variable {
    /// Create a continuous variable with the given bounds and zero weight.
    pub fn continuous(name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            name: name.into(),
            bounds,
            is_integer: false,
            weight: 0.0,
            value: None,
        }
    }

    /// Create an integer variable with the given bounds and zero weight.
    pub fn integer(name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            is_integer: true,
            ..Self::continuous(name, bounds)
        }
    }

    /// Create a binary variable on `[0, 1]`.
    pub fn binary(name: impl Into<String>) -> Self {
        Self::integer(name, Bounds::new(0.0, 1.0))
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// A linear constraint `terms + constant <sign> 0`.
///
/// The evaluator moves every constant onto the left-hand side, so the row
/// bound emitted for this constraint is `-constant`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub sign: Sign,
    #[serde(default)]
    pub constant: f64,
    pub terms: Vec<(String, f64)>,
}

impl Constraint {
    pub fn new(name: impl Into<String>, sign: Sign, constant: f64) -> Self {
        Self {
            name: name.into(),
            sign,
            constant,
            terms: Vec::new(),
        }
    }

    /// Append a `(variable, coefficient)` term.
    pub fn term(mut self, variable: impl Into<String>, coefficient: f64) -> Self {
        self.terms.push((variable.into(), coefficient));
        self
    }

    /// Right-hand side as the row sees it.
    pub fn rhs(&self) -> f64 {
        -self.constant
    }
}

/// Named objective weight overrides.
///
/// `primary` overrides decision variable weights; `secondary` supplies
/// weights for slack and surplus columns that constraints reference
/// without declaring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default)]
    pub primary: BTreeMap<String, f64>,
    #[serde(default)]
    pub secondary: BTreeMap<String, f64>,
}

impl Weights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.primary.insert(name.into(), weight);
        self
    }

    pub fn with_secondary(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.secondary.insert(name.into(), weight);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

/// Everything the evaluator hands over for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleDefinition {
    /// Model name used for dump files, e.g. `1921_10_c1`.
    pub name: String,
    #[serde(default = "default_cycle")]
    pub cycle: CycleId,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub weights: Weights,
}

fn default_cycle() -> CycleId {
    CycleId::new(1)
}
