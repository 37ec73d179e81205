//! Operation descriptors.
//!
//! A descriptor is the declarative metadata of one operation a provider
//! exposes: its name, kind, parameters and access requirements. Descriptors
//! are assembled with [`OperationDescriptorBuilder`] and are immutable once
//! the registry has been initialized.

use std::collections::{BTreeMap, BTreeSet};

use contentgate_auth::AccessRequirements;
use contentgate_core::{ParameterType, TypedValue};
use serde::Serialize;

/// The kind of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Read-only, addressed with query-string parameters
    Function,
    /// Mutating, addressed with a JSON body
    Action,
}

impl OperationKind {
    /// Whether a request of this kind may reach an operation of kind `declared`.
    /// Function requests only reach functions; action requests reach either.
    pub fn reaches(self, declared: OperationKind) -> bool {
        match self {
            Self::Function => declared == Self::Function,
            Self::Action => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Action => "action",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub param_type: ParameterType,
    /// Value bound when the request omits the parameter
    pub default: Option<TypedValue>,
}

impl ParameterDescriptor {
    pub fn required(name: impl Into<String>, param_type: impl Into<ParameterType>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            default: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<ParameterType>,
        default: impl Into<TypedValue>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            default: Some(default.into()),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Metadata for one operation exposed by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    /// Public name used in request URLs
    pub name: String,
    /// Provider-internal name passed to [`invoke`](super::OperationProvider::invoke).
    /// Differs from `name` for renamed or overloaded operations.
    pub method: String,
    pub kind: OperationKind,
    pub access: AccessRequirements,
    pub parameters: Vec<ParameterDescriptor>,
    /// Free-form display metadata (description, icon, ...)
    pub display: BTreeMap<String, String>,
    /// Type name of the provider, filled in by the registry
    pub provider: String,
}

impl OperationDescriptor {
    pub fn function(name: impl Into<String>) -> OperationDescriptorBuilder {
        OperationDescriptorBuilder::new(name.into(), OperationKind::Function)
    }

    pub fn action(name: impl Into<String>) -> OperationDescriptorBuilder {
        OperationDescriptorBuilder::new(name.into(), OperationKind::Action)
    }

    /// Number of declared parameters. The target entity is implicit and not counted.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn content_types(&self) -> &BTreeSet<String> {
        &self.access.content_types
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Key under which the registry keeps descriptors unique:
    /// lower-cased name, applicable types and arity.
    pub(crate) fn registry_key(&self) -> (String, Vec<String>, usize) {
        (
            self.name.to_lowercase(),
            self.access.content_types.iter().cloned().collect(),
            self.arity(),
        )
    }
}

/// Builder for [`OperationDescriptor`].
#[derive(Debug, Clone)]
pub struct OperationDescriptorBuilder {
    descriptor: OperationDescriptor,
}

impl OperationDescriptorBuilder {
    fn new(name: String, kind: OperationKind) -> Self {
        Self {
            descriptor: OperationDescriptor {
                method: name.clone(),
                name,
                kind,
                access: AccessRequirements::default(),
                parameters: Vec::new(),
                display: BTreeMap::new(),
                provider: String::new(),
            },
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.descriptor.method = method.into();
        self
    }

    pub fn content_type(mut self, type_name: impl Into<String>) -> Self {
        self.descriptor.access = self.descriptor.access.with_content_type(type_name);
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.descriptor.access = self.descriptor.access.with_role(role);
        self
    }

    /// Add an alternative permission group, e.g. `"Save, Open"`.
    pub fn permissions(mut self, permissions: &str) -> Self {
        self.descriptor.access = self.descriptor.access.with_permissions(permissions);
        self
    }

    pub fn policy(mut self, name: impl Into<String>) -> Self {
        self.descriptor.access = self.descriptor.access.with_policy(name);
        self
    }

    pub fn param(mut self, parameter: ParameterDescriptor) -> Self {
        self.descriptor.parameters.push(parameter);
        self
    }

    pub fn required(self, name: impl Into<String>, param_type: impl Into<ParameterType>) -> Self {
        self.param(ParameterDescriptor::required(name, param_type))
    }

    pub fn optional(
        self,
        name: impl Into<String>,
        param_type: impl Into<ParameterType>,
        default: impl Into<TypedValue>,
    ) -> Self {
        self.param(ParameterDescriptor::optional(name, param_type, default))
    }

    pub fn display(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.descriptor.display.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> OperationDescriptor {
        self.descriptor
    }
}
