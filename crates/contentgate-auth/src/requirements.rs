//! Access requirements declared by an operation.

use std::collections::BTreeSet;

use contentgate_core::Caller;

/// Role marker that admits every caller.
pub const ALL_ROLES: &str = "All";

/// What a caller and a target must satisfy before an operation may run.
///
/// Empty sets impose no restriction. Permission groups are alternatives:
/// the caller must hold every permission of at least one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequirements {
    pub content_types: BTreeSet<String>,
    pub allowed_roles: BTreeSet<String>,
    pub permission_groups: Vec<BTreeSet<String>>,
    pub policies: Vec<String>,
}

impl AccessRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, type_name: impl Into<String>) -> Self {
        self.content_types.insert(type_name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.allowed_roles.insert(role.into());
        self
    }

    /// Add a permission group from a comma-separated list, e.g. `"Save, Open"`.
    /// Blank lists are ignored.
    pub fn with_permissions(mut self, permissions: &str) -> Self {
        let group = parse_permission_group(permissions);
        if !group.is_empty() {
            self.permission_groups.push(group);
        }
        self
    }

    pub fn with_policy(mut self, name: impl Into<String>) -> Self {
        self.policies.push(name.into());
        self
    }

    /// Whether the caller belongs to an allowed role.
    pub fn admits_caller(&self, caller: &Caller) -> bool {
        if self.allowed_roles.is_empty() {
            return true;
        }
        self.allowed_roles
            .iter()
            .any(|role| role.eq_ignore_ascii_case(ALL_ROLES) || caller.is_in_role(role))
    }
}

fn parse_permission_group(permissions: &str) -> BTreeSet<String> {
    permissions
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
