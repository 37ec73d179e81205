//! Content-type applicability.
//!
//! An operation declares the content types it applies to; an empty set means
//! it applies to every type. Whether a derived type satisfies a declaration
//! naming one of its ancestors depends on the configured [`TypeMatcher`].

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Upper bound on ancestor walks, guarding against cyclic hierarchies.
const MAX_HIERARCHY_DEPTH: usize = 64;

/// Host-supplied content type inheritance.
pub trait TypeHierarchy: Send + Sync {
    /// The direct parent of `type_name`, `None` for a root type.
    fn parent_of(&self, type_name: &str) -> Option<String>;
}

/// A fixed child → parent table.
#[derive(Debug, Clone, Default)]
pub struct StaticTypeHierarchy {
    parents: HashMap<String, String>,
}

impl StaticTypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, type_name: impl Into<String>, parent: impl Into<String>) -> Self {
        self.parents.insert(type_name.into(), parent.into());
        self
    }
}

impl TypeHierarchy for StaticTypeHierarchy {
    fn parent_of(&self, type_name: &str) -> Option<String> {
        self.parents.get(type_name).cloned()
    }
}

/// Strategy for matching a target type against declared content types.
#[derive(Clone, Default)]
pub enum TypeMatcher {
    /// Only the exact type name matches
    #[default]
    Exact,
    /// The type or any of its ancestors matches
    Hierarchy(Arc<dyn TypeHierarchy>),
}

impl TypeMatcher {
    pub fn matches(&self, applicable: &BTreeSet<String>, type_name: &str) -> bool {
        if applicable.is_empty() {
            return true;
        }
        match self {
            Self::Exact => applicable.contains(type_name),
            Self::Hierarchy(hierarchy) => {
                let mut current = Some(type_name.to_string());
                for _ in 0..MAX_HIERARCHY_DEPTH {
                    let Some(name) = current else {
                        return false;
                    };
                    if applicable.contains(&name) {
                        return true;
                    }
                    current = hierarchy.parent_of(&name);
                }
                false
            }
        }
    }
}

impl fmt::Debug for TypeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("Exact"),
            Self::Hierarchy(_) => f.write_str("Hierarchy"),
        }
    }
}
