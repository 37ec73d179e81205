use thiserror::Error;

/// Errors that can occur while translating a filter into a content query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Invalid $filter at position {position}: {message}")]
    Syntax { message: String, position: usize },

    #[error("Filter nesting exceeds {limit} levels")]
    TooDeep { limit: usize },

    #[error("Unsupported function '{0}' in $filter")]
    UnsupportedFunction(String),

    #[error("Invalid query option {option}: {message}")]
    InvalidOption { option: String, message: String },
}

impl TranslateError {
    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    pub fn invalid_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`ContentQuery`](crate::ContentQuery).
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("Query execution failed: {0}")]
    Execution(String),
}
