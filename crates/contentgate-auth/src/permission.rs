//! Permission checks against the host's access control.

use std::collections::{BTreeSet, HashMap};

use contentgate_core::{Caller, TargetEntity};

/// Answers whether a caller holds a named permission on a content item.
pub trait PermissionChecker: Send + Sync {
    fn has_permission(&self, caller: &Caller, target: &TargetEntity, permission: &str) -> bool;

    /// Whether the caller holds every permission in `permissions`.
    fn has_all(&self, caller: &Caller, target: &TargetEntity, permissions: &BTreeSet<String>) -> bool {
        permissions
            .iter()
            .all(|permission| self.has_permission(caller, target, permission))
    }
}

/// Grants every permission. For hosts without content-level access control.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllPermissions;

impl PermissionChecker for AllowAllPermissions {
    fn has_permission(&self, _caller: &Caller, _target: &TargetEntity, _permission: &str) -> bool {
        true
    }
}

/// Fixed grants keyed by caller id, independent of the target.
///
/// Permission names compare case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct StaticPermissionChecker {
    grants: HashMap<String, BTreeSet<String>>,
}

impl StaticPermissionChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, caller_id: impl Into<String>, permission: &str) -> Self {
        self.grants
            .entry(caller_id.into())
            .or_default()
            .insert(permission.to_lowercase());
        self
    }
}

impl PermissionChecker for StaticPermissionChecker {
    fn has_permission(&self, caller: &Caller, _target: &TargetEntity, permission: &str) -> bool {
        self.grants
            .get(&caller.id)
            .is_some_and(|granted| granted.contains(&permission.to_lowercase()))
    }
}
