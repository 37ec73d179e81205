//! Named policies and their lookup.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use contentgate_core::{Caller, TargetEntity};

/// Availability of an operation for a caller on a target.
///
/// Variants are ordered by strength: when several policies apply, the
/// strongest state wins.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OperationState {
    #[default]
    Enabled,
    /// Listed but not invocable
    Disabled,
    /// Neither listed nor invocable
    Invisible,
}

impl OperationState {
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

/// Inputs available to a policy besides the caller.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    /// The operation being evaluated
    pub operation: &'a str,
    pub content: &'a TargetEntity,
}

/// A named operation policy.
pub trait Policy: Send + Sync {
    fn evaluate(&self, caller: &Caller, context: &PolicyContext<'_>) -> OperationState;
}

impl<F> Policy for F
where
    F: Fn(&Caller, &PolicyContext<'_>) -> OperationState + Send + Sync,
{
    fn evaluate(&self, caller: &Caller, context: &PolicyContext<'_>) -> OperationState {
        self(caller, context)
    }
}

/// Lookup of policies by name.
pub trait PolicyRegistry: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Policy>>;
}

/// Concurrent in-memory policy registry.
///
/// Names are matched case-insensitively. Registering a name twice replaces
/// the earlier policy.
#[derive(Default)]
pub struct InMemoryPolicyRegistry {
    policies: DashMap<String, Arc<dyn Policy>>,
}

impl InMemoryPolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P>(&self, name: &str, policy: P)
    where
        P: Policy + 'static,
    {
        self.policies.insert(name.to_lowercase(), Arc::new(policy));
    }

    /// Register a closure as a policy.
    pub fn register_fn<F>(&self, name: &str, f: F)
    where
        F: Fn(&Caller, &PolicyContext<'_>) -> OperationState + Send + Sync + 'static,
    {
        self.register(name, f);
    }

    pub fn remove(&self, name: &str) -> bool {
        self.policies.remove(&name.to_lowercase()).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl PolicyRegistry for InMemoryPolicyRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Policy>> {
        self.policies
            .get(&name.to_lowercase())
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl std::fmt::Debug for InMemoryPolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.policies.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("InMemoryPolicyRegistry")
            .field("policies", &names)
            .finish()
    }
}
