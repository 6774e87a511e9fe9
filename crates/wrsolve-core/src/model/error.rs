//! Model error types.

/// Errors raised while building a model instance for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Model has no variables
    EmptyModel,
    /// Constraint sign text is not one of `=`, `<`, `<=`, `>`, `>=`
    InvalidSign { sign: String },
    /// Two variables share a name
    DuplicateVariable { name: String },
    /// Two constraints share a name
    DuplicateConstraint { name: String },
    /// Invalid variable bounds
    InvalidVariableBounds {
        name: String,
        lower: f64,
        upper: f64,
    },
    /// Coefficient or constant is NaN or infinite
    NonFiniteValue { constraint: String, variable: String },
    /// Column index does not exist in the instance
    InvalidColumn { index: usize, num_columns: usize },
    /// Solution vector does not match the column count
    SolutionLengthMismatch { expected: usize, got: usize },
    /// Elastic penalty must be finite and non-negative
    InvalidElasticPenalty { penalty: f64 },
}

impl ModelError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::EmptyModel => "MODEL_EMPTY",
            ModelError::InvalidSign { .. } => "CONSTRAINT_INVALID_SIGN",
            ModelError::DuplicateVariable { .. } => "VARIABLE_DUPLICATE_NAME",
            ModelError::DuplicateConstraint { .. } => "CONSTRAINT_DUPLICATE_NAME",
            ModelError::InvalidVariableBounds { .. } => "VARIABLE_INVALID_BOUNDS",
            ModelError::NonFiniteValue { .. } => "CONSTRAINT_NON_FINITE",
            ModelError::InvalidColumn { .. } => "COLUMN_INVALID_INDEX",
            ModelError::SolutionLengthMismatch { .. } => "SOLUTION_LENGTH_MISMATCH",
            ModelError::InvalidElasticPenalty { .. } => "ELASTIC_INVALID_PENALTY",
        }
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::EmptyModel => write!(f, "[{}] Model has no variables", self.code()),
            ModelError::InvalidSign { sign } => write!(
                f,
                "[{}] Invalid constraint sign '{}' (expected =, <, <=, >, >=)",
                self.code(),
                sign
            ),
            ModelError::DuplicateVariable { name } => {
                write!(f, "[{}] Variable '{}' is defined twice", self.code(), name)
            }
            ModelError::DuplicateConstraint { name } => {
                write!(f, "[{}] Constraint '{}' is defined twice", self.code(), name)
            }
            ModelError::InvalidVariableBounds { name, lower, upper } => write!(
                f,
                "[{}] Variable '{}' bounds invalid: lower ({}) > upper ({})",
                self.code(),
                name,
                lower,
                upper
            ),
            ModelError::NonFiniteValue {
                constraint,
                variable,
            } => write!(
                f,
                "[{}] Constraint '{}' has a non-finite value for '{}'",
                self.code(),
                constraint,
                variable
            ),
            ModelError::InvalidColumn { index, num_columns } => write!(
                f,
                "[{}] Column {} does not exist (num_columns = {})",
                self.code(),
                index,
                num_columns
            ),
            ModelError::SolutionLengthMismatch { expected, got } => write!(
                f,
                "[{}] Solution has {} values but the instance has {} columns",
                self.code(),
                got,
                expected
            ),
            ModelError::InvalidElasticPenalty { penalty } => write!(
                f,
                "[{}] Elastic penalty must be finite and non-negative (got {})",
                self.code(),
                penalty
            ),
        }
    }
}

impl std::error::Error for ModelError {}
