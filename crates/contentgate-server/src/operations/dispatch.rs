//! Operation dispatch.
//!
//! [`Dispatcher`] is the entry point the host calls for operation requests:
//! resolve the operation for the target, authorize the caller, create a fresh
//! provider, bind the arguments and invoke. Nothing is executed unless every
//! earlier step succeeded.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use contentgate_auth::{
    AccessDecision, AuthError, AuthorizationPipeline, DenyReason, OperationState,
    PermissionChecker, PolicyRegistry,
};
use contentgate_core::{Caller, ErrorCategory, TargetEntity, TypeHierarchy, TypeMatcher};
use contentgate_search::{
    FilterExpressionNode, QueryExpressionTranslator, QueryOptions, TranslateError,
};

use super::definition::{OperationDescriptor, OperationKind};
use super::handler::{OperationContext, OperationError};
use super::params::{BindingError, ParameterBinder, SuppliedValues};
use super::registry::OperationRegistry;
use super::resolver::{OperationResolver, ResolveError};
use crate::config::{AppConfig, ApplicabilityMode};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Ambiguous(String),

    #[error("Forbidden: {}", .0.message)]
    Forbidden(DenyReason),

    #[error("Configuration error: {0}")]
    Configuration(#[from] AuthError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Execution(#[from] OperationError),
}

impl DispatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Ambiguous(_) | Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Forbidden(_) => ErrorCategory::Forbidden,
            Self::Binding(e) => e.category(),
            Self::Execution(e) => e.category(),
        }
    }
}

impl From<ResolveError> for DispatchError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { message } => Self::NotFound(message),
            ambiguous @ ResolveError::Ambiguous { .. } => Self::Ambiguous(ambiguous.to_string()),
        }
    }
}

/// Value returned by a successful invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    /// Public name of the operation that ran
    pub operation: String,
    pub value: Value,
}

/// An operation listed for a target, with its availability for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationAffordance {
    pub name: String,
    pub kind: OperationKind,
    pub state: OperationState,
    pub parameters: Vec<String>,
}

impl OperationAffordance {
    fn new(descriptor: &OperationDescriptor, state: OperationState) -> Self {
        Self {
            name: descriptor.name.clone(),
            kind: descriptor.kind,
            state,
            parameters: descriptor.parameters.iter().map(|p| p.name.clone()).collect(),
        }
    }
}

/// Host-facing dispatch core.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<OperationRegistry>,
    resolver: OperationResolver,
    authorization: AuthorizationPipeline,
    binder: ParameterBinder,
    translator: QueryExpressionTranslator,
}

impl Dispatcher {
    /// The resolver shares the pipeline's content type matcher.
    pub fn new(registry: Arc<OperationRegistry>, authorization: AuthorizationPipeline) -> Self {
        if !registry.is_initialized() {
            warn!("Dispatcher created over an uninitialized operation registry");
        }
        Self {
            resolver: OperationResolver::new(authorization.type_matcher().clone()),
            registry,
            authorization,
            binder: ParameterBinder::default(),
            translator: QueryExpressionTranslator::default(),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        registry: Arc<OperationRegistry>,
        policies: Arc<dyn PolicyRegistry>,
        permissions: Arc<dyn PermissionChecker>,
        hierarchy: Option<Arc<dyn TypeHierarchy>>,
    ) -> Self {
        let type_matcher = match (config.operations.applicability, hierarchy) {
            (ApplicabilityMode::Hierarchy, Some(hierarchy)) => TypeMatcher::Hierarchy(hierarchy),
            (ApplicabilityMode::Hierarchy, None) => {
                warn!("Hierarchy applicability configured without a type hierarchy; using exact matching");
                TypeMatcher::Exact
            }
            (ApplicabilityMode::Exact, _) => TypeMatcher::Exact,
        };
        let authorization =
            AuthorizationPipeline::new(policies, permissions).with_type_matcher(type_matcher);

        Self::new(registry, authorization)
            .with_binder(
                ParameterBinder::new().with_list_delimiter(config.search.list_delimiter.clone()),
            )
            .with_translator(QueryExpressionTranslator::new().with_max_top(config.search.max_top))
    }

    pub fn with_binder(mut self, binder: ParameterBinder) -> Self {
        self.binder = binder;
        self
    }

    pub fn with_translator(mut self, translator: QueryExpressionTranslator) -> Self {
        self.translator = translator;
        self
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Run the operation `name` on `target` on behalf of `caller`.
    pub async fn dispatch(
        &self,
        target: &TargetEntity,
        name: &str,
        kind: OperationKind,
        supplied: &SuppliedValues,
        caller: &Caller,
    ) -> Result<OperationResult, DispatchError> {
        let descriptor = self.resolver.resolve(
            &self.registry,
            &target.type_name,
            name,
            kind,
            &supplied.names(),
        )?;

        let decision =
            self.authorization
                .authorize(&descriptor.name, &descriptor.access, caller, target)?;
        if let AccessDecision::Deny(reason) = decision {
            return Err(DispatchError::Forbidden(reason));
        }

        let provider = self
            .registry
            .create_provider(&descriptor.provider)
            .ok_or_else(|| {
                OperationError::Internal(format!(
                    "Provider {} is not registered",
                    descriptor.provider
                ))
            })?;
        let arguments = self.binder.bind(&descriptor, supplied)?;

        debug!(
            operation = %descriptor.name,
            provider = %descriptor.provider,
            target = %target.path,
            arguments = arguments.len(),
            "Invoking operation"
        );
        let context = OperationContext { target, caller };
        let value = provider
            .invoke(&context, &descriptor.method, arguments)
            .await
            .map_err(|e| {
                warn!(operation = %descriptor.name, error = %e, "Operation failed");
                e
            })?;

        Ok(OperationResult {
            operation: descriptor.name.clone(),
            value,
        })
    }

    /// Operations listed for `target`.
    ///
    /// Operations the caller fails on type, role or permission are listed as
    /// disabled without consulting policies. For the rest the strongest policy
    /// state decides: invisible operations are omitted.
    pub fn affordances(
        &self,
        target: &TargetEntity,
        caller: &Caller,
    ) -> Result<Vec<OperationAffordance>, DispatchError> {
        let mut affordances = Vec::new();
        for descriptor in self
            .resolver
            .available_operations(&self.registry, &target.type_name)
        {
            let access = self
                .authorization
                .check_access(&descriptor.access, caller, target);
            let state = if access.is_allowed() {
                self.authorization.evaluate_state(
                    &descriptor.name,
                    &descriptor.access,
                    caller,
                    target,
                )?
            } else {
                OperationState::Disabled
            };
            if state == OperationState::Invisible {
                continue;
            }
            affordances.push(OperationAffordance::new(&descriptor, state));
        }
        Ok(affordances)
    }

    /// Translate a collection request into the canonical content query.
    pub fn translate_filter(
        &self,
        predicate: Option<&FilterExpressionNode>,
        filter_text: Option<&str>,
        scope_path: Option<&str>,
        options: &QueryOptions,
    ) -> Result<String, TranslateError> {
        self.translator
            .translate(predicate, filter_text, scope_path, options)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_conversion_keeps_message() {
        let err: DispatchError = ResolveError::not_found("Folder", "Missing").into();
        assert_eq!(err.to_string(), "Operation not found: Folder.Missing()");
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let err: DispatchError = ResolveError::Ambiguous {
            type_name: "Folder".to_string(),
            name: "Search".to_string(),
            candidates: 2,
        }
        .into();
        assert!(matches!(err, DispatchError::Ambiguous(ref m) if m.contains("Folder.Search()")));
    }

    #[test]
    fn test_error_categories() {
        let forbidden = DispatchError::Forbidden(DenyReason::role_required("visitor"));
        assert_eq!(forbidden.category(), ErrorCategory::Forbidden);
        assert!(forbidden.to_string().starts_with("Forbidden: "));

        let config: DispatchError = AuthError::unknown_policy("Missing").into();
        assert_eq!(config.category(), ErrorCategory::Configuration);

        let binding: DispatchError = BindingError::MissingRequiredParameter {
            parameter: "path".to_string(),
        }
        .into();
        assert_eq!(binding.category(), ErrorCategory::Validation);
        assert_eq!(binding.to_string(), "Missing required parameter: path");
    }
}
