//! Operation policies and the authorization pipeline.
//!
//! A policy is a named rule that computes an [`OperationState`] for a caller
//! and a target. Operations reference policies by name; the
//! [`AuthorizationPipeline`] resolves them through a [`PolicyRegistry`] and
//! combines their verdicts with the type, role and permission checks.

pub mod engine;
pub mod registry;

pub use engine::{AccessDecision, AuthorizationPipeline, DenyReason};
pub use registry::{
    InMemoryPolicyRegistry, OperationState, Policy, PolicyContext, PolicyRegistry,
};
