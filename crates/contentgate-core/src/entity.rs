//! Request participants: the content an operation is bound to and the caller invoking it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identifier assigned to content by the underlying repository.
pub type ContentId = u64;

/// The content item an operation is invoked on.
///
/// Produced by path resolution in the host; the dispatch core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEntity {
    /// Declared content type name (e.g., "User", "Folder")
    pub type_name: String,
    /// Repository identifier
    pub id: ContentId,
    /// Repository path (e.g., "/Root/IMS/BuiltIn/Portal/Admin")
    pub path: String,
}

impl TargetEntity {
    pub fn new(type_name: impl Into<String>, id: ContentId, path: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id,
            path: path.into(),
        }
    }
}

/// The identity on whose behalf an operation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Internal user ID.
    pub id: String,

    /// Role (group) memberships.
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Caller {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roles: BTreeSet::new(),
        }
    }

    /// Add a role membership
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Role membership test; role names compare case-insensitively.
    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}
