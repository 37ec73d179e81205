//! Operation provider trait and error types.
//!
//! A provider is a stateless type that declares a set of operations and
//! executes them by method name. The registry creates a fresh provider
//! instance for every invocation.

use async_trait::async_trait;
use serde_json::Value;

use contentgate_core::{Caller, ErrorCategory, TargetEntity};

use super::definition::OperationDescriptor;
use super::params::BoundArguments;

/// Error type for operation failures.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// Invalid parameter values rejected by the operation body
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Content referenced by the operation does not exist
    #[error("Content not found: {0}")]
    NotFound(String),

    /// The provider does not implement the requested method
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OperationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidParameters(_) => ErrorCategory::Validation,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::NotSupported(_) | Self::Internal(_) => ErrorCategory::Execution,
        }
    }

    pub fn unknown_method(method: &str) -> Self {
        Self::NotSupported(format!("Unknown method {method}"))
    }
}

/// Request-scoped inputs an operation body may read besides its arguments.
#[derive(Debug, Clone, Copy)]
pub struct OperationContext<'a> {
    /// The content the operation was invoked on
    pub target: &'a TargetEntity,
    pub caller: &'a Caller,
}

/// Trait for implementing operation providers.
///
/// # Implementation Notes
///
/// - `operations` is called once per [`initialize`](super::OperationRegistry::initialize)
///   and must be deterministic
/// - `invoke` receives the descriptor's `method`, not its public name
/// - Unknown methods should return [`OperationError::NotSupported`]
#[async_trait]
pub trait OperationProvider: Send + Sync {
    /// Descriptors of the operations this provider exposes.
    fn operations(&self) -> Vec<OperationDescriptor>;

    async fn invoke(
        &self,
        context: &OperationContext<'_>,
        method: &str,
        arguments: BoundArguments,
    ) -> Result<Value, OperationError>;
}

/// Type alias for a boxed operation provider.
pub type DynOperationProvider = Box<dyn OperationProvider>;
