//! Operation registry for provider lookup and descriptor collection.
//!
//! Providers are registered under one or more lookup names at composition
//! time. [`OperationRegistry::initialize`] rebuilds the live name table and
//! the descriptor set from everything registered so far; it can be called
//! again to rebuild from scratch.
//!
//! Initialization takes `&mut self`, so the registry is built by a single
//! writer and shared read-only (typically behind an `Arc`) afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use super::definition::OperationDescriptor;
use super::handler::{DynOperationProvider, OperationProvider};

/// Factory producing a fresh provider instance per call.
pub type ProviderFactory = Arc<dyn Fn() -> DynOperationProvider + Send + Sync>;

#[derive(Clone)]
struct Registration {
    type_name: String,
    names: Vec<String>,
    factory: ProviderFactory,
}

/// Registry of operation providers.
#[derive(Default)]
pub struct OperationRegistry {
    /// Every registration, in call order
    registrations: Vec<Registration>,
    /// Lower-cased lookup name → index into `registrations`
    by_name: HashMap<String, usize>,
    /// Provider type name → index into `registrations`
    by_type: HashMap<String, usize>,
    descriptors: Vec<Arc<OperationDescriptor>>,
    initialized: bool,
}

/// Unqualified type name of `P`, without generic arguments.
pub fn provider_type_name<P>() -> String {
    let full = std::any::type_name::<P>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `P` under its own type name.
    pub fn register<P>(&mut self) -> &mut Self
    where
        P: OperationProvider + Default + 'static,
    {
        self.register_as::<P>(&[])
    }

    /// Registers `P` under `names`. An empty list means the type name.
    pub fn register_as<P>(&mut self, names: &[&str]) -> &mut Self
    where
        P: OperationProvider + Default + 'static,
    {
        self.register_factory(provider_type_name::<P>(), names, || {
            Box::new(P::default()) as DynOperationProvider
        })
    }

    /// Registers a provider built by `factory`, for providers that capture state.
    pub fn register_factory<F>(
        &mut self,
        type_name: impl Into<String>,
        names: &[&str],
        factory: F,
    ) -> &mut Self
    where
        F: Fn() -> DynOperationProvider + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        let names = if names.is_empty() {
            vec![type_name.clone()]
        } else {
            names.iter().map(|n| n.to_string()).collect()
        };
        if self.initialized {
            debug!(provider = %type_name, ?names, "Provider registered after initialize; pending until re-initialize");
        }
        self.registrations.push(Registration {
            type_name,
            names,
            factory: Arc::new(factory),
        });
        self
    }

    /// Rebuilds the name table and descriptor set.
    ///
    /// Later registrations of a name replace earlier ones. A registration
    /// whose every name was replaced contributes no descriptors. Descriptors
    /// sharing a name, applicable types and arity are also last-wins.
    pub fn initialize(&mut self) {
        self.by_name.clear();
        self.by_type.clear();
        self.descriptors.clear();

        for (index, registration) in self.registrations.iter().enumerate() {
            for name in &registration.names {
                self.by_name.insert(name.to_lowercase(), index);
            }
        }

        let mut live: Vec<usize> = self.by_name.values().copied().collect();
        live.sort_unstable();
        live.dedup();

        let mut descriptors: IndexMap<(String, Vec<String>, usize), Arc<OperationDescriptor>> =
            IndexMap::new();
        for index in live {
            let registration = &self.registrations[index];
            self.by_type.insert(registration.type_name.clone(), index);

            let provider = (registration.factory)();
            for mut descriptor in provider.operations() {
                descriptor.provider = registration.type_name.clone();
                let key = descriptor.registry_key();
                if let Some(previous) = descriptors.insert(key, Arc::new(descriptor)) {
                    debug!(
                        operation = %previous.name,
                        replaced = %previous.provider,
                        by = %registration.type_name,
                        "Operation descriptor replaced"
                    );
                }
            }
        }
        self.descriptors = descriptors.into_values().collect();
        self.initialized = true;

        info!(
            count = self.by_name.len(),
            operations = self.descriptors.len(),
            table = %self.table(),
            "Operation registry initialized"
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Type name of the provider registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| self.registrations[index].type_name.as_str())
    }

    /// A new provider instance for the lookup name `name`.
    pub fn create_instance(&self, name: &str) -> Option<DynOperationProvider> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| (self.registrations[index].factory)())
    }

    /// A new instance of the provider type that declared a descriptor.
    pub fn create_provider(&self, type_name: &str) -> Option<DynOperationProvider> {
        self.by_type
            .get(type_name)
            .map(|&index| (self.registrations[index].factory)())
    }

    /// Live descriptors, in registration order.
    pub fn descriptors(&self) -> &[Arc<OperationDescriptor>] {
        &self.descriptors
    }

    /// Sorted `(lookup name, provider type)` pairs.
    pub fn names(&self) -> Vec<(String, String)> {
        let mut names: Vec<(String, String)> = self
            .by_name
            .iter()
            .map(|(name, &index)| (name.clone(), self.registrations[index].type_name.clone()))
            .collect();
        names.sort();
        names
    }

    /// Number of live lookup names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn table(&self) -> String {
        self.names()
            .into_iter()
            .map(|(name, type_name)| format!("{name} -> {type_name}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("names", &self.names())
            .field("operations", &self.descriptors.len())
            .field("initialized", &self.initialized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::definition::OperationKind;
    use crate::operations::handler::{OperationContext, OperationError};
    use crate::operations::params::BoundArguments;
    use async_trait::async_trait;
    use contentgate_core::PrimitiveType;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct UserOperations;

    #[async_trait]
    impl OperationProvider for UserOperations {
        fn operations(&self) -> Vec<OperationDescriptor> {
            vec![
                OperationDescriptor::function("GetPermissions")
                    .content_type("User")
                    .build(),
                OperationDescriptor::action("Rename")
                    .required("name", PrimitiveType::String)
                    .build(),
            ]
        }

        async fn invoke(
            &self,
            _context: &OperationContext<'_>,
            method: &str,
            _arguments: BoundArguments,
        ) -> Result<Value, OperationError> {
            Ok(json!({ "provider": "UserOperations", "method": method }))
        }
    }

    #[derive(Default)]
    struct LegacyUserOperations;

    #[async_trait]
    impl OperationProvider for LegacyUserOperations {
        fn operations(&self) -> Vec<OperationDescriptor> {
            vec![
                OperationDescriptor::function("getpermissions")
                    .content_type("User")
                    .build(),
            ]
        }

        async fn invoke(
            &self,
            _context: &OperationContext<'_>,
            method: &str,
            _arguments: BoundArguments,
        ) -> Result<Value, OperationError> {
            Err(OperationError::unknown_method(method))
        }
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert_eq!(provider_type_name::<UserOperations>(), "UserOperations");

        let mut registry = OperationRegistry::new();
        registry.register::<UserOperations>();
        registry.initialize();

        assert_eq!(registry.lookup("useroperations"), Some("UserOperations"));
        assert_eq!(registry.lookup("UserOperations"), Some("UserOperations"));
        assert!(registry.lookup("unknown").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = OperationRegistry::new();
        registry
            .register_as::<UserOperations>(&["users"])
            .register_as::<LegacyUserOperations>(&["Users"]);
        registry.initialize();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("USERS"), Some("LegacyUserOperations"));
        // UserOperations lost its only name, so its descriptors are gone too
        assert_eq!(registry.descriptors().len(), 1);
        assert_eq!(registry.descriptors()[0].provider, "LegacyUserOperations");
    }

    #[test]
    fn test_descriptor_key_collision_last_wins() {
        let mut registry = OperationRegistry::new();
        registry
            .register_as::<UserOperations>(&["users"])
            .register_as::<LegacyUserOperations>(&["legacy"]);
        registry.initialize();

        let get_permissions: Vec<_> = registry
            .descriptors()
            .iter()
            .filter(|d| d.name.eq_ignore_ascii_case("GetPermissions"))
            .collect();
        assert_eq!(get_permissions.len(), 1);
        assert_eq!(get_permissions[0].provider, "LegacyUserOperations");
        assert_eq!(get_permissions[0].kind, OperationKind::Function);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut registry = OperationRegistry::new();
        registry
            .register::<UserOperations>()
            .register_as::<LegacyUserOperations>(&["legacy", "old"]);
        registry.initialize();
        let names = registry.names();
        let count = registry.descriptors().len();

        registry.initialize();
        assert_eq!(registry.names(), names);
        assert_eq!(registry.descriptors().len(), count);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_registration_pending_until_initialize() {
        let mut registry = OperationRegistry::new();
        registry.register::<UserOperations>();
        assert!(!registry.is_initialized());
        assert!(registry.lookup("UserOperations").is_none());

        registry.initialize();
        registry.register_as::<LegacyUserOperations>(&["legacy"]);
        assert!(registry.lookup("legacy").is_none());

        registry.initialize();
        assert_eq!(registry.lookup("legacy"), Some("LegacyUserOperations"));
    }

    #[test]
    fn test_create_instance_is_fresh() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);

        let mut registry = OperationRegistry::new();
        registry.register_factory("CountingOperations", &["counting"], move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(UserOperations) as DynOperationProvider
        });
        registry.initialize();
        let after_init = created.load(Ordering::SeqCst);

        assert!(registry.create_instance("counting").is_some());
        assert!(registry.create_instance("COUNTING").is_some());
        assert_eq!(created.load(Ordering::SeqCst), after_init + 2);

        assert!(registry.create_provider("CountingOperations").is_some());
        assert!(registry.create_instance("missing").is_none());
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = OperationRegistry::new();
        registry.register_as::<UserOperations>(&["zeta", "Alpha"]);
        registry.initialize();
        assert_eq!(
            registry.names(),
            vec![
                ("alpha".to_string(), "UserOperations".to_string()),
                ("zeta".to_string(), "UserOperations".to_string()),
            ]
        );
    }
}
