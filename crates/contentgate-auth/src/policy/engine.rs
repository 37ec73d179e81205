//! Authorization pipeline for operation invocations.
//!
//! Checks run in a fixed order and stop at the first denial:
//!
//! 1. the target's content type is one the operation applies to
//! 2. the caller belongs to an allowed role
//! 3. the caller holds every permission of at least one permission group
//! 4. every referenced policy evaluates to [`OperationState::Enabled`]
//!
//! An unknown policy name is a configuration fault and surfaces as
//! [`AuthError::UnknownPolicy`], never as a denial.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use contentgate_core::{Caller, TargetEntity, TypeMatcher};

use crate::error::{AuthError, AuthResult};
use crate::permission::PermissionChecker;
use crate::policy::registry::{OperationState, PolicyContext, PolicyRegistry};
use crate::requirements::AccessRequirements;

// =============================================================================
// Access Decision
// =============================================================================

/// Result of authorizing one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

impl AccessDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    #[must_use]
    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Deny(reason) => Some(reason),
            Self::Allow => None,
        }
    }
}

// =============================================================================
// Deny Reason
// =============================================================================

/// Reason for access denial.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenyReason {
    /// Error code for programmatic handling.
    pub code: String,

    /// Human-readable error message.
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Name of the policy that denied access.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    /// State computed by that policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<OperationState>,
}

impl DenyReason {
    #[must_use]
    pub fn inapplicable_content_type(type_name: &str) -> Self {
        Self {
            code: "inapplicable-content-type".to_string(),
            message: format!("Operation is not applicable to content type {type_name}"),
            details: Some(serde_json::json!({ "contentType": type_name })),
            policy: None,
            state: None,
        }
    }

    #[must_use]
    pub fn role_required(caller_id: &str) -> Self {
        Self {
            code: "role-required".to_string(),
            message: format!("User {caller_id} is not a member of any allowed role"),
            details: None,
            policy: None,
            state: None,
        }
    }

    #[must_use]
    pub fn permission_required(groups: &[std::collections::BTreeSet<String>]) -> Self {
        Self {
            code: "permission-required".to_string(),
            message: "Caller lacks the permissions required by the operation".to_string(),
            details: Some(serde_json::json!({ "requiredPermissions": groups })),
            policy: None,
            state: None,
        }
    }

    #[must_use]
    pub fn policy_denied(policy: &str, state: OperationState) -> Self {
        let code = match state {
            OperationState::Invisible => "operation-invisible",
            _ => "operation-disabled",
        };
        Self {
            code: code.to_string(),
            message: format!("Operation is not available (policy {policy})"),
            details: None,
            policy: Some(policy.to_string()),
            state: Some(state),
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Combines type applicability, roles, permissions and named policies into
/// one access decision.
#[derive(Clone)]
pub struct AuthorizationPipeline {
    policies: Arc<dyn PolicyRegistry>,
    permissions: Arc<dyn PermissionChecker>,
    type_matcher: TypeMatcher,
}

impl AuthorizationPipeline {
    pub fn new(policies: Arc<dyn PolicyRegistry>, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self {
            policies,
            permissions,
            type_matcher: TypeMatcher::Exact,
        }
    }

    pub fn with_type_matcher(mut self, type_matcher: TypeMatcher) -> Self {
        self.type_matcher = type_matcher;
        self
    }

    pub fn type_matcher(&self) -> &TypeMatcher {
        &self.type_matcher
    }

    /// Decide whether `caller` may invoke `operation` on `target`.
    pub fn authorize(
        &self,
        operation: &str,
        requirements: &AccessRequirements,
        caller: &Caller,
        target: &TargetEntity,
    ) -> AuthResult<AccessDecision> {
        let decision = self.check(operation, requirements, caller, target)?;
        if let AccessDecision::Deny(reason) = &decision {
            debug!(
                operation = %operation,
                caller = %caller.id,
                target = %target.path,
                code = %reason.code,
                "Operation access denied"
            );
        }
        Ok(decision)
    }

    /// Type, role and permission checks only. Policies are not consulted,
    /// so this never fails on an unknown policy name.
    pub fn check_access(
        &self,
        requirements: &AccessRequirements,
        caller: &Caller,
        target: &TargetEntity,
    ) -> AccessDecision {
        if !self
            .type_matcher
            .matches(&requirements.content_types, &target.type_name)
        {
            return AccessDecision::Deny(DenyReason::inapplicable_content_type(&target.type_name));
        }

        if !requirements.admits_caller(caller) {
            return AccessDecision::Deny(DenyReason::role_required(&caller.id));
        }

        if !requirements.permission_groups.is_empty()
            && !requirements
                .permission_groups
                .iter()
                .any(|group| self.permissions.has_all(caller, target, group))
        {
            return AccessDecision::Deny(DenyReason::permission_required(
                &requirements.permission_groups,
            ));
        }

        AccessDecision::Allow
    }

    /// Strongest state computed by the referenced policies. Operations
    /// without policies are [`OperationState::Enabled`].
    ///
    /// Every name is resolved before any policy runs, so an unknown name is
    /// reported even when an earlier policy already hides the operation.
    pub fn evaluate_state(
        &self,
        operation: &str,
        requirements: &AccessRequirements,
        caller: &Caller,
        target: &TargetEntity,
    ) -> AuthResult<OperationState> {
        let policies = requirements
            .policies
            .iter()
            .map(|name| {
                self.policies
                    .resolve(name)
                    .ok_or_else(|| AuthError::unknown_policy(name))
            })
            .collect::<AuthResult<Vec<_>>>()?;

        let context = PolicyContext {
            operation,
            content: target,
        };
        let mut strongest = OperationState::Enabled;
        for policy in policies {
            strongest = strongest.max(policy.evaluate(caller, &context));
            if strongest == OperationState::Invisible {
                break;
            }
        }
        Ok(strongest)
    }

    fn check(
        &self,
        operation: &str,
        requirements: &AccessRequirements,
        caller: &Caller,
        target: &TargetEntity,
    ) -> AuthResult<AccessDecision> {
        let access = self.check_access(requirements, caller, target);
        if !access.is_allowed() {
            return Ok(access);
        }

        let context = PolicyContext {
            operation,
            content: target,
        };
        for name in &requirements.policies {
            let policy = self
                .policies
                .resolve(name)
                .ok_or_else(|| AuthError::unknown_policy(name))?;
            let state = policy.evaluate(caller, &context);
            if state != OperationState::Enabled {
                return Ok(AccessDecision::Deny(DenyReason::policy_denied(name, state)));
            }
        }

        Ok(AccessDecision::Allow)
    }
}

impl std::fmt::Debug for AuthorizationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationPipeline")
            .field("type_matcher", &self.type_matcher)
            .finish_non_exhaustive()
    }
}
