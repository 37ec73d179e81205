//! Operation parameter binding.
//!
//! Functions receive their arguments as query-string pairs, actions as a JSON
//! object. [`ParameterBinder`] walks the declared parameters in order and
//! coerces the supplied value of each one to its declared type, substituting
//! defaults for omitted optional parameters. Supplied values that match no
//! declared parameter are ignored.

use serde_json::{Map, Value};

use contentgate_core::value::json_type_name;
use contentgate_core::{
    CoercionError, DEFAULT_LIST_DELIMITER, Decimal, ErrorCategory, ODataArray, ODataElement,
    TypedValue,
};

use super::definition::{OperationDescriptor, ParameterDescriptor};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    #[error("Missing required parameter: {parameter}")]
    MissingRequiredParameter { parameter: String },

    #[error("Invalid value for parameter {parameter}: {source}")]
    Coercion {
        parameter: String,
        #[source]
        source: CoercionError,
    },

    /// The request body is not a JSON object
    #[error("Expected {expected} request body, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

impl BindingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Coercion { source, .. } => source.category(),
            _ => ErrorCategory::Validation,
        }
    }
}

// =============================================================================
// Supplied values
// =============================================================================

/// Raw argument values taken from a request.
#[derive(Debug, Clone, PartialEq)]
pub enum SuppliedValues {
    /// Query-string pairs in request order; keys may repeat
    Query(Vec<(String, String)>),
    /// Members of a JSON request body
    Json(Map<String, Value>),
}

impl Default for SuppliedValues {
    fn default() -> Self {
        Self::Query(Vec::new())
    }
}

impl SuppliedValues {
    pub fn query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Query(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wrap a JSON body. `null` is treated as an empty object.
    pub fn json(body: Value) -> Result<Self, BindingError> {
        match body {
            Value::Object(map) => Ok(Self::Json(map)),
            Value::Null => Ok(Self::Json(Map::new())),
            other => Err(BindingError::UnexpectedShape {
                expected: "object",
                found: json_type_name(&other),
            }),
        }
    }

    /// Distinct supplied names, lower-cased and sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self {
            Self::Query(pairs) => pairs.iter().map(|(k, _)| k.to_lowercase()).collect(),
            Self::Json(map) => map.keys().map(|k| k.to_lowercase()).collect(),
        };
        names.sort();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Bound arguments
// =============================================================================

/// Typed arguments in declaration order, consumed by one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    values: Vec<(String, TypedValue)>,
}

impl BoundArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: TypedValue) {
        self.values.push((name.into(), value));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        self.push(name, value.into());
        self
    }

    /// Value of `name`, matched exactly first and then case-insensitively.
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .or_else(|| self.values.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
            .map(|(_, v)| v)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(TypedValue::as_str)
    }

    pub fn i32(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(TypedValue::as_i32)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(TypedValue::as_i64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(TypedValue::as_bool)
    }

    pub fn decimal(&self, name: &str) -> Option<Decimal> {
        self.get(name).and_then(TypedValue::as_decimal)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(TypedValue::as_f64)
    }

    pub fn sequence(&self, name: &str) -> Option<&[TypedValue]> {
        self.get(name).and_then(TypedValue::as_sequence)
    }

    /// A sequence argument as a typed [`ODataArray`].
    pub fn array<T: ODataElement>(&self, name: &str) -> contentgate_core::Result<Option<ODataArray<T>>> {
        self.sequence(name)
            .map(ODataArray::from_typed_values)
            .transpose()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn into_vec(self) -> Vec<(String, TypedValue)> {
        self.values
    }

    /// Arguments as a JSON object, in declaration order.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(n, v)| (n.clone(), v.to_json()))
                .collect(),
        )
    }
}

// =============================================================================
// Binder
// =============================================================================

/// Binds supplied values to declared operation parameters.
#[derive(Debug, Clone)]
pub struct ParameterBinder {
    list_delimiter: String,
}

impl Default for ParameterBinder {
    fn default() -> Self {
        Self {
            list_delimiter: DEFAULT_LIST_DELIMITER.to_string(),
        }
    }
}

impl ParameterBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delimiter for sequence values supplied as text.
    pub fn with_list_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.list_delimiter = delimiter.into();
        self
    }

    pub fn bind(
        &self,
        descriptor: &OperationDescriptor,
        supplied: &SuppliedValues,
    ) -> Result<BoundArguments, BindingError> {
        let mut bound = BoundArguments::new();
        for parameter in &descriptor.parameters {
            let value = match supplied {
                SuppliedValues::Query(pairs) => self.bind_text(parameter, pairs)?,
                SuppliedValues::Json(members) => self.bind_json(parameter, members)?,
            };
            let value = match (value, &parameter.default) {
                (Some(value), _) => value,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(BindingError::MissingRequiredParameter {
                        parameter: parameter.name.clone(),
                    });
                }
            };
            bound.push(parameter.name.clone(), value);
        }
        Ok(bound)
    }

    /// Repeated keys are concatenated for sequence parameters; for scalars
    /// the last occurrence wins.
    fn bind_text(
        &self,
        parameter: &ParameterDescriptor,
        pairs: &[(String, String)],
    ) -> Result<Option<TypedValue>, BindingError> {
        let mut raw: Vec<&str> = pairs
            .iter()
            .filter(|(k, _)| *k == parameter.name)
            .map(|(_, v)| v.as_str())
            .collect();
        if raw.is_empty() {
            raw = pairs
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(&parameter.name))
                .map(|(_, v)| v.as_str())
                .collect();
        }

        let coerce = |text: &str| {
            parameter
                .param_type
                .coerce_text(text, &self.list_delimiter)
                .map_err(|source| coercion_error(parameter, source))
        };

        if parameter.param_type.is_sequence() {
            if raw.is_empty() {
                return Ok(None);
            }
            let mut items = Vec::new();
            for text in raw {
                match coerce(text)? {
                    TypedValue::Sequence(values) => items.extend(values),
                    other => items.push(other),
                }
            }
            return Ok(Some(TypedValue::Sequence(items)));
        }

        raw.last().map(|text| coerce(*text)).transpose()
    }

    /// `null` members count as absent.
    fn bind_json(
        &self,
        parameter: &ParameterDescriptor,
        members: &Map<String, Value>,
    ) -> Result<Option<TypedValue>, BindingError> {
        let value = members.get(&parameter.name).or_else(|| {
            members
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&parameter.name))
                .map(|(_, v)| v)
        });
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(value) => parameter
                .param_type
                .coerce_json(value, &self.list_delimiter)
                .map(Some)
                .map_err(|source| coercion_error(parameter, source)),
        }
    }
}

fn coercion_error(parameter: &ParameterDescriptor, source: CoercionError) -> BindingError {
    BindingError::Coercion {
        parameter: parameter.name.clone(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentgate_core::{CustomType, ElementType, ParameterType, PrimitiveType};
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> TypedValue {
        TypedValue::Decimal(Decimal::from_str(s).unwrap())
    }

    fn get_page() -> OperationDescriptor {
        OperationDescriptor::function("GetPage")
            .required("path", PrimitiveType::String)
            .optional("skip", PrimitiveType::Int, 0)
            .build()
    }

    #[test]
    fn test_default_substituted_and_overridden() {
        let binder = ParameterBinder::new();

        let bound = binder
            .bind(&get_page(), &SuppliedValues::query([("path", "/Root")]))
            .unwrap();
        assert_eq!(bound.i32("skip"), Some(0));
        assert_eq!(bound.str("path"), Some("/Root"));

        let bound = binder
            .bind(
                &get_page(),
                &SuppliedValues::query([("path", "/Root"), ("skip", "20")]),
            )
            .unwrap();
        assert_eq!(bound.i32("skip"), Some(20));
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = ParameterBinder::new()
            .bind(&get_page(), &SuppliedValues::query([("skip", "1")]))
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::MissingRequiredParameter {
                parameter: "path".to_string()
            }
        );
    }

    #[test]
    fn test_extra_values_ignored_and_order_kept() {
        let bound = ParameterBinder::new()
            .bind(
                &get_page(),
                &SuppliedValues::query([("skip", "3"), ("unknown", "x"), ("path", "/Root")]),
            )
            .unwrap();
        let names: Vec<&str> = bound.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["path", "skip"]);
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let bound = ParameterBinder::new()
            .bind(&get_page(), &SuppliedValues::query([("PATH", "/Root")]))
            .unwrap();
        assert_eq!(bound.str("path"), Some("/Root"));
    }

    #[test]
    fn test_sequence_from_text_and_repeated_keys() {
        let descriptor = OperationDescriptor::function("Sum")
            .required("values", ParameterType::sequence_of(PrimitiveType::Decimal))
            .build();
        let binder = ParameterBinder::new();

        let bound = binder
            .bind(&descriptor, &SuppliedValues::query([("values", "1.1, 2.1, 42.1")]))
            .unwrap();
        assert_eq!(
            bound.sequence("values").unwrap(),
            &[dec("1.1"), dec("2.1"), dec("42.1")]
        );

        let bound = binder
            .bind(
                &descriptor,
                &SuppliedValues::query([("values", "1.1,2.1"), ("values", "42.1")]),
            )
            .unwrap();
        assert_eq!(bound.sequence("values").unwrap().len(), 3);

        let array = bound.array::<Decimal>("values").unwrap().unwrap();
        assert_eq!(array[2], Decimal::from_str("42.1").unwrap());
    }

    #[test]
    fn test_empty_sequence_text() {
        let descriptor = OperationDescriptor::function("Sum")
            .required("values", ParameterType::sequence_of(PrimitiveType::Int))
            .build();
        let bound = ParameterBinder::new()
            .bind(&descriptor, &SuppliedValues::query([("values", "")]))
            .unwrap();
        assert_eq!(bound.sequence("values"), Some(&[][..]));
    }

    #[test]
    fn test_custom_delimiter() {
        let descriptor = OperationDescriptor::function("Tag")
            .required("tags", ParameterType::sequence_of(PrimitiveType::String))
            .build();
        let bound = ParameterBinder::new()
            .with_list_delimiter(";")
            .bind(&descriptor, &SuppliedValues::query([("tags", "a; b;c")]))
            .unwrap();
        assert_eq!(
            bound.sequence("tags").unwrap(),
            &[
                TypedValue::from("a"),
                TypedValue::from("b"),
                TypedValue::from("c")
            ]
        );
    }

    #[test]
    fn test_json_body() {
        let descriptor = OperationDescriptor::action("Move")
            .required("target", PrimitiveType::String)
            .required("ids", ParameterType::sequence_of(PrimitiveType::Long))
            .optional("overwrite", PrimitiveType::Bool, false)
            .required("options", ParameterType::Json)
            .build();
        let supplied = SuppliedValues::json(json!({
            "target": "/Root/Archive",
            "ids": [1, 2, 3],
            "overwrite": null,
            "Options": { "keepVersions": true }
        }))
        .unwrap();

        let bound = ParameterBinder::new().bind(&descriptor, &supplied).unwrap();
        assert_eq!(bound.len(), 4);
        assert_eq!(bound.str("target"), Some("/Root/Archive"));
        assert_eq!(
            bound.sequence("ids").unwrap(),
            &[TypedValue::Long(1), TypedValue::Long(2), TypedValue::Long(3)]
        );
        assert_eq!(bound.bool("overwrite"), Some(false));
        assert_eq!(
            bound.get("options"),
            Some(&TypedValue::Json(json!({ "keepVersions": true })))
        );
    }

    #[test]
    fn test_json_sequence_from_delimited_string() {
        let descriptor = OperationDescriptor::action("Sum")
            .required("values", ParameterType::sequence_of(PrimitiveType::Decimal))
            .build();
        let supplied = SuppliedValues::json(json!({ "values": "1.1, 2.1" })).unwrap();
        let bound = ParameterBinder::new().bind(&descriptor, &supplied).unwrap();
        assert_eq!(bound.sequence("values").unwrap(), &[dec("1.1"), dec("2.1")]);
    }

    #[test]
    fn test_coercion_failure_names_parameter() {
        let err = ParameterBinder::new()
            .bind(
                &get_page(),
                &SuppliedValues::query([("path", "/Root"), ("skip", "ten")]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            BindingError::Coercion { ref parameter, source: CoercionError::InvalidLiteral { .. } }
                if parameter == "skip"
        ));
    }

    #[test]
    fn test_custom_element_without_parser() {
        let descriptor = OperationDescriptor::function("Plot")
            .required(
                "points",
                ParameterType::Sequence(ElementType::Custom(CustomType::new("Point"))),
            )
            .build();
        let err = ParameterBinder::new()
            .bind(&descriptor, &SuppliedValues::query([("points", "1:2,3:4")]))
            .unwrap_err();
        match err {
            BindingError::Coercion { source, .. } => assert!(source.is_unsupported_parse()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_object_body() {
        let err = SuppliedValues::json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, BindingError::UnexpectedShape { expected: "object", .. }));
        assert!(SuppliedValues::json(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_supplied_len_counts_distinct_names() {
        let supplied = SuppliedValues::query([("a", "1"), ("A", "2"), ("b", "3")]);
        assert_eq!(supplied.len(), 2);
        assert_eq!(supplied.names(), vec!["a".to_string(), "b".to_string()]);

        let body = SuppliedValues::json(json!({"Text": "x", "$format": "json"})).unwrap();
        assert_eq!(body.names(), vec!["$format".to_string(), "text".to_string()]);
    }
}
