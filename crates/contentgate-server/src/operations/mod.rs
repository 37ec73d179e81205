//! Operations Framework
//!
//! This module provides the infrastructure for registering, resolving,
//! authorizing, binding and invoking operations on content.
//!
//! # Architecture
//!
//! - **OperationDescriptor**: Declarative metadata of one operation
//! - **OperationProvider**: Trait for implementing operation logic
//! - **OperationRegistry**: Provider registration and descriptor collection
//! - **OperationResolver**: Name, kind and content type based resolution
//! - **ParameterBinder**: Typed argument binding from query strings or JSON
//! - **Dispatcher**: The resolve → authorize → bind → invoke pipeline
//!
//! # Example
//!
//! ```ignore
//! use contentgate_server::operations::{
//!     BoundArguments, OperationContext, OperationDescriptor, OperationError, OperationProvider,
//! };
//!
//! #[derive(Default)]
//! struct VersionOperations;
//!
//! #[async_trait::async_trait]
//! impl OperationProvider for VersionOperations {
//!     fn operations(&self) -> Vec<OperationDescriptor> {
//!         vec![OperationDescriptor::function("GetVersion").role("All").build()]
//!     }
//!
//!     async fn invoke(
//!         &self,
//!         _context: &OperationContext<'_>,
//!         method: &str,
//!         _arguments: BoundArguments,
//!     ) -> Result<serde_json::Value, OperationError> {
//!         match method {
//!             "GetVersion" => Ok(serde_json::json!("1.0")),
//!             other => Err(OperationError::unknown_method(other)),
//!         }
//!     }
//! }
//! ```

pub mod definition;
pub mod dispatch;
pub mod handler;
pub mod params;
pub mod registry;
pub mod resolver;

// Re-export main types for convenience
pub use definition::{
    OperationDescriptor, OperationDescriptorBuilder, OperationKind, ParameterDescriptor,
};
pub use dispatch::{DispatchError, Dispatcher, OperationAffordance, OperationResult};
pub use handler::{DynOperationProvider, OperationContext, OperationError, OperationProvider};
pub use params::{BindingError, BoundArguments, ParameterBinder, SuppliedValues};
pub use registry::{OperationRegistry, ProviderFactory, provider_type_name};
pub use resolver::{OperationResolver, ResolveError};
