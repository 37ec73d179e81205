//! Resolution of an operation name against a target content type.

use std::sync::Arc;

use tracing::debug;

use contentgate_core::{ErrorCategory, TypeMatcher};

use super::definition::{OperationDescriptor, OperationKind};
use super::registry::OperationRegistry;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Unknown name, or no candidate applies to the target type.
    /// Both causes produce the same message.
    #[error("{message}")]
    NotFound { message: String },

    #[error("Ambiguous operation: {type_name}.{name}() matches {candidates} operations")]
    Ambiguous {
        type_name: String,
        name: String,
        candidates: usize,
    },
}

impl ResolveError {
    pub fn not_found(type_name: &str, name: &str) -> Self {
        Self::NotFound {
            message: format!("Operation not found: {type_name}.{name}()"),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Ambiguous { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Finds the descriptor an operation request refers to.
#[derive(Debug, Clone, Default)]
pub struct OperationResolver {
    type_matcher: TypeMatcher,
}

impl OperationResolver {
    pub fn new(type_matcher: TypeMatcher) -> Self {
        Self { type_matcher }
    }

    pub fn type_matcher(&self) -> &TypeMatcher {
        &self.type_matcher
    }

    /// Resolve `name` for a target of type `target_type`.
    ///
    /// Candidates are filtered by case-insensitive name, request kind and
    /// applicability. Several survivors are narrowed by arity, then by exact
    /// kind. Arity counts only the `supplied_names` that some survivor
    /// declares as a parameter; system options such as `$format` and other
    /// unrelated keys are ignored.
    pub fn resolve(
        &self,
        registry: &OperationRegistry,
        target_type: &str,
        name: &str,
        kind: OperationKind,
        supplied_names: &[String],
    ) -> Result<Arc<OperationDescriptor>, ResolveError> {
        let candidates: Vec<Arc<OperationDescriptor>> = registry
            .descriptors()
            .iter()
            .filter(|d| d.name.eq_ignore_ascii_case(name))
            .filter(|d| kind.reaches(d.kind))
            .filter(|d| self.type_matcher.matches(d.content_types(), target_type))
            .cloned()
            .collect();

        match candidates.as_slice() {
            [] => {
                debug!(target_type, operation = name, %kind, "Operation not found");
                Err(ResolveError::not_found(target_type, name))
            }
            [single] => Ok(Arc::clone(single)),
            many => {
                let supplied_count = supplied_names
                    .iter()
                    .filter(|supplied| {
                        many.iter().any(|d| {
                            d.parameters
                                .iter()
                                .any(|p| p.name.eq_ignore_ascii_case(supplied))
                        })
                    })
                    .count();
                let by_arity: Vec<&Arc<OperationDescriptor>> = many
                    .iter()
                    .filter(|d| d.arity() == supplied_count)
                    .collect();
                if let [single] = by_arity.as_slice() {
                    return Ok(Arc::clone(*single));
                }

                let pool: Vec<&Arc<OperationDescriptor>> = if by_arity.is_empty() {
                    many.iter().collect()
                } else {
                    by_arity
                };
                let by_kind: Vec<&Arc<OperationDescriptor>> =
                    pool.iter().copied().filter(|d| d.kind == kind).collect();
                if let [single] = by_kind.as_slice() {
                    return Ok(Arc::clone(*single));
                }

                debug!(
                    target_type,
                    operation = name,
                    candidates = many.len(),
                    "Ambiguous operation"
                );
                Err(ResolveError::Ambiguous {
                    type_name: target_type.to_string(),
                    name: name.to_string(),
                    candidates: pool.len(),
                })
            }
        }
    }

    /// Descriptors applicable to `target_type`, in registry order.
    pub fn available_operations(
        &self,
        registry: &OperationRegistry,
        target_type: &str,
    ) -> Vec<Arc<OperationDescriptor>> {
        registry
            .descriptors()
            .iter()
            .filter(|d| self.type_matcher.matches(d.content_types(), target_type))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::handler::{OperationContext, OperationError, OperationProvider};
    use crate::operations::params::BoundArguments;
    use async_trait::async_trait;
    use contentgate_core::{PrimitiveType, StaticTypeHierarchy};
    use serde_json::Value;

    #[derive(Default)]
    struct ContentOperations;

    #[async_trait]
    impl OperationProvider for ContentOperations {
        fn operations(&self) -> Vec<OperationDescriptor> {
            vec![
                OperationDescriptor::function("GetPermissions")
                    .content_type("User")
                    .content_type("Group")
                    .build(),
                OperationDescriptor::function("Ping").build(),
                OperationDescriptor::action("Approve")
                    .content_type("GenericContent")
                    .build(),
                OperationDescriptor::function("Search")
                    .required("text", PrimitiveType::String)
                    .build(),
                OperationDescriptor::function("Search")
                    .method("search_paged")
                    .required("text", PrimitiveType::String)
                    .required("top", PrimitiveType::Int)
                    .build(),
                OperationDescriptor::function("Touch").build(),
                OperationDescriptor::action("Touch")
                    .method("touch_action")
                    .content_type("File")
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

    fn registry() -> OperationRegistry {
        let mut registry = OperationRegistry::new();
        registry.register::<ContentOperations>();
        registry.initialize();
        registry
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let resolver = OperationResolver::default();
        let descriptor = resolver
            .resolve(&registry(), "User", "getpermissions", OperationKind::Function, &[])
            .unwrap();
        assert_eq!(descriptor.name, "GetPermissions");
        assert_eq!(descriptor.provider, "ContentOperations");
    }

    #[test]
    fn test_empty_applicability_matches_any_type() {
        let resolver = OperationResolver::default();
        assert!(
            resolver
                .resolve(&registry(), "Folder", "Ping", OperationKind::Function, &[])
                .is_ok()
        );
    }

    #[test]
    fn test_inapplicable_type_looks_like_missing_operation() {
        let resolver = OperationResolver::default();
        let registry = registry();

        let inapplicable = resolver
            .resolve(&registry, "Folder", "GetPermissions", OperationKind::Function, &[])
            .unwrap_err();
        let missing = resolver
            .resolve(&registry, "Folder", "NoSuchOperation", OperationKind::Function, &[])
            .unwrap_err();

        assert_eq!(
            inapplicable.to_string(),
            "Operation not found: Folder.GetPermissions()"
        );
        assert_eq!(
            missing.to_string(),
            "Operation not found: Folder.NoSuchOperation()"
        );
        assert!(matches!(inapplicable, ResolveError::NotFound { .. }));
        assert!(matches!(missing, ResolveError::NotFound { .. }));
    }

    #[test]
    fn test_function_request_cannot_reach_action() {
        let resolver = OperationResolver::new(TypeMatcher::Hierarchy(Arc::new(
            StaticTypeHierarchy::new().with_type("File", "GenericContent"),
        )));
        let registry = registry();

        assert!(
            resolver
                .resolve(&registry, "File", "Approve", OperationKind::Function, &[])
                .is_err()
        );
        assert!(
            resolver
                .resolve(&registry, "File", "Approve", OperationKind::Action, &[])
                .is_ok()
        );
    }

    #[test]
    fn test_hierarchy_applicability() {
        let registry = registry();
        let exact = OperationResolver::default();
        assert!(
            exact
                .resolve(&registry, "File", "Approve", OperationKind::Action, &[])
                .is_err()
        );

        let hierarchical = OperationResolver::new(TypeMatcher::Hierarchy(Arc::new(
            StaticTypeHierarchy::new().with_type("File", "GenericContent"),
        )));
        assert!(
            hierarchical
                .resolve(&registry, "File", "Approve", OperationKind::Action, &[])
                .is_ok()
        );
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_overload_by_arity() {
        let resolver = OperationResolver::default();
        let registry = registry();
        let search = |supplied: &[&str]| {
            resolver.resolve(
                &registry,
                "Folder",
                "Search",
                OperationKind::Function,
                &names(supplied),
            )
        };

        assert_eq!(search(&["text"]).unwrap().method, "Search");
        assert_eq!(search(&["text", "top"]).unwrap().method, "search_paged");

        let err = search(&["a", "b", "c", "d", "e"]).unwrap_err();
        assert!(matches!(err, ResolveError::Ambiguous { candidates: 2, .. }));
    }

    #[test]
    fn test_overload_ignores_undeclared_names() {
        let resolver = OperationResolver::default();
        let registry = registry();

        let descriptor = resolver
            .resolve(
                &registry,
                "Folder",
                "Search",
                OperationKind::Function,
                &names(&["text", "$format"]),
            )
            .unwrap();
        assert_eq!(descriptor.method, "Search");

        let paged = resolver
            .resolve(
                &registry,
                "Folder",
                "Search",
                OperationKind::Function,
                &names(&["$select", "text", "top", "metadata"]),
            )
            .unwrap();
        assert_eq!(paged.method, "search_paged");
    }

    #[test]
    fn test_overload_by_kind() {
        let resolver = OperationResolver::default();
        let registry = registry();

        let function = resolver
            .resolve(&registry, "File", "Touch", OperationKind::Function, &[])
            .unwrap();
        assert_eq!(function.method, "Touch");

        let action = resolver
            .resolve(&registry, "File", "Touch", OperationKind::Action, &[])
            .unwrap();
        assert_eq!(action.method, "touch_action");
    }

    #[test]
    fn test_available_operations() {
        let resolver = OperationResolver::default();
        let names: Vec<String> = resolver
            .available_operations(&registry(), "User")
            .iter()
            .map(|d| d.name.clone())
            .collect();
        assert!(names.contains(&"GetPermissions".to_string()));
        assert!(names.contains(&"Ping".to_string()));
        assert!(!names.contains(&"Approve".to_string()));
    }
}
