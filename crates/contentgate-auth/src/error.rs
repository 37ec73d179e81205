//! Authorization error types.
//!
//! A denial is not an error: it is reported as
//! [`AccessDecision::Deny`](crate::AccessDecision::Deny). Errors here are
//! configuration faults found while evaluating requirements.

use contentgate_core::ErrorCategory;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// An operation references a policy name that is not registered.
    #[error("Unknown operation policy: {name}")]
    UnknownPolicy {
        /// The unresolved policy name.
        name: String,
    },
}

impl AuthError {
    pub fn unknown_policy(name: impl Into<String>) -> Self {
        Self::UnknownPolicy { name: name.into() }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownPolicy { .. } => ErrorCategory::Configuration,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
