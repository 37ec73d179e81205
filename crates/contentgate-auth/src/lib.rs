//! # contentgate-auth
//!
//! Authorization of operation invocations against a target content item.
//!
//! ## Modules
//!
//! - [`requirements`] - Per-operation access requirements (types, roles, permissions, policies)
//! - [`permission`] - Permission checking seam backed by the host's access control
//! - [`policy`] - Named operation policies and the authorization pipeline

pub mod error;
pub mod permission;
pub mod policy;
pub mod requirements;

pub use error::{AuthError, AuthResult};
pub use permission::{AllowAllPermissions, PermissionChecker, StaticPermissionChecker};
pub use policy::{
    AccessDecision, AuthorizationPipeline, DenyReason, InMemoryPolicyRegistry, OperationState,
    Policy, PolicyContext, PolicyRegistry,
};
pub use requirements::{ALL_ROLES, AccessRequirements};
