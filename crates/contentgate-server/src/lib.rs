//! # contentgate-server
//!
//! Operation dispatch for content addressed through an OData-style API.
//!
//! ## Modules
//!
//! - [`operations`] - Operation registry, resolution, binding and dispatch
//! - [`config`] - Application configuration and loader
//! - [`observability`] - Tracing initialization

pub mod config;
pub mod observability;
pub mod operations;

pub use config::{AppConfig, ApplicabilityMode};
pub use observability::{apply_logging_config, init_tracing};
pub use operations::{
    BoundArguments, DispatchError, Dispatcher, OperationAffordance, OperationContext,
    OperationDescriptor, OperationError, OperationKind, OperationProvider, OperationRegistry,
    OperationResult, SuppliedValues,
};
