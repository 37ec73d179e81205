use thiserror::Error;

/// Errors raised while converting raw request values into typed values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoercionError {
    #[error("Cannot convert '{literal}' to {target}")]
    InvalidLiteral { literal: String, target: String },

    #[error("Value '{literal}' is out of range for {target}")]
    OutOfRange { literal: String, target: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Element {index} has type {found}, expected {expected}")]
    MixedElementTypes {
        index: usize,
        expected: String,
        found: String,
    },

    /// The element type does not expose a string parse capability.
    #[error("Type '{type_name}' cannot be parsed from a string")]
    UnsupportedParse { type_name: String },
}

impl CoercionError {
    /// Create a new InvalidLiteral error
    pub fn invalid_literal(literal: impl Into<String>, target: impl Into<String>) -> Self {
        Self::InvalidLiteral {
            literal: literal.into(),
            target: target.into(),
        }
    }

    /// Create a new OutOfRange error
    pub fn out_of_range(literal: impl Into<String>, target: impl Into<String>) -> Self {
        Self::OutOfRange {
            literal: literal.into(),
            target: target.into(),
        }
    }

    /// Create a new TypeMismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a new UnsupportedParse error
    pub fn unsupported_parse(type_name: impl Into<String>) -> Self {
        Self::UnsupportedParse {
            type_name: type_name.into(),
        }
    }

    /// Check if the failure comes from a missing parse capability rather than bad input
    pub fn is_unsupported_parse(&self) -> bool {
        matches!(self, Self::UnsupportedParse { .. })
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidLiteral { .. }
            | Self::OutOfRange { .. }
            | Self::TypeMismatch { .. }
            | Self::MixedElementTypes { .. } => ErrorCategory::Validation,
            Self::UnsupportedParse { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Forbidden,
    Configuration,
    Execution,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Configuration => "configuration",
            Self::Execution => "execution",
        };
        write!(f, "{s}")
    }
}

/// Result type alias for coercion operations
pub type Result<T> = std::result::Result<T, CoercionError>;
