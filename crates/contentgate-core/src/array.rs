//! Fixed-length, read-only sequences used as operation parameters.
//!
//! An [`ODataArray`] is built either from values that are already typed or by
//! parsing a delimited string element by element. Both paths produce the
//! same sequence for representable values.

use std::ops::Index;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{CoercionError, Result};
use crate::value::{
    DEFAULT_LIST_DELIMITER, PrimitiveType, TypedValue, coerce_json, coerce_str, json_type_name,
};

/// Element capability required by [`ODataArray`].
///
/// The default [`parse_element`](ODataElement::parse_element) refuses to parse;
/// a type opts into string parsing by overriding it.
pub trait ODataElement: Sized + Clone {
    /// Unqualified type name used in error messages.
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn parse_element(_text: &str) -> Result<Self> {
        Err(CoercionError::unsupported_parse(Self::type_name()))
    }

    fn from_json_element(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Self::parse_element(s),
            other => Err(CoercionError::type_mismatch(
                Self::type_name(),
                json_type_name(other),
            )),
        }
    }

    /// Extract an element from a value produced by parameter binding.
    fn from_typed(value: &TypedValue) -> Result<Self> {
        match value {
            TypedValue::Json(v) => Self::from_json_element(v),
            TypedValue::String(s) => Self::parse_element(s),
            other => Err(CoercionError::type_mismatch(
                Self::type_name(),
                other.type_name(),
            )),
        }
    }
}

macro_rules! primitive_element {
    ($ty:ty, $variant:ident) => {
        impl ODataElement for $ty {
            fn type_name() -> &'static str {
                PrimitiveType::$variant.name()
            }

            fn parse_element(text: &str) -> Result<Self> {
                match coerce_str(text, PrimitiveType::$variant)? {
                    TypedValue::$variant(v) => Ok(v),
                    other => Err(CoercionError::type_mismatch(
                        Self::type_name(),
                        other.type_name(),
                    )),
                }
            }

            fn from_json_element(value: &Value) -> Result<Self> {
                match coerce_json(value, PrimitiveType::$variant)? {
                    TypedValue::$variant(v) => Ok(v),
                    other => Err(CoercionError::type_mismatch(
                        Self::type_name(),
                        other.type_name(),
                    )),
                }
            }

            fn from_typed(value: &TypedValue) -> Result<Self> {
                match value {
                    TypedValue::$variant(v) => Ok(v.clone()),
                    TypedValue::String(s) => Self::parse_element(s),
                    TypedValue::Json(v) => Self::from_json_element(v),
                    other => Err(CoercionError::type_mismatch(
                        Self::type_name(),
                        other.type_name(),
                    )),
                }
            }
        }
    };
}

primitive_element!(String, String);
primitive_element!(i32, Int);
primitive_element!(i64, Long);
primitive_element!(u8, Byte);
primitive_element!(bool, Bool);
primitive_element!(Decimal, Decimal);
primitive_element!(f32, Float);
primitive_element!(f64, Double);

/// Ordered, immutable sequence of `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct ODataArray<T> {
    items: Vec<T>,
}

impl<T: ODataElement> ODataArray<T> {
    /// Build from already-typed values. Never fails.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: values.into_iter().collect(),
        }
    }

    /// Parse a comma-separated string.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, DEFAULT_LIST_DELIMITER)
    }

    /// Parse a string split on `delimiter`; tokens are trimmed before parsing
    /// and blank input yields an empty array.
    pub fn parse_with(text: &str, delimiter: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self { items: Vec::new() });
        }
        let delimiter = if delimiter.is_empty() {
            DEFAULT_LIST_DELIMITER
        } else {
            delimiter
        };
        let items = text
            .split(delimiter)
            .map(|token| T::parse_element(token.trim()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { items })
    }

    /// Build from a JSON array, or a JSON string holding a delimited list.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(T::from_json_element)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self { items })
            }
            Value::String(s) => Self::parse(s),
            other => Err(CoercionError::type_mismatch("array", json_type_name(other))),
        }
    }

    /// Build from the elements of a bound sequence value.
    pub fn from_typed_values(values: &[TypedValue]) -> Result<Self> {
        let items = values
            .iter()
            .map(T::from_typed)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { items })
    }
}

impl<T> ODataArray<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Index<usize> for ODataArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T: ODataElement> FromIterator<T> for ODataArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

impl<T> IntoIterator for ODataArray<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ODataArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[derive(Debug, Clone, PartialEq)]
    struct Opaque(u32);

    impl ODataElement for Opaque {}

    #[derive(Debug, Clone, PartialEq)]
    struct Pair(i32, i32);

    impl ODataElement for Pair {
        fn parse_element(text: &str) -> Result<Self> {
            let (a, b) = text
                .split_once(':')
                .ok_or_else(|| CoercionError::invalid_literal(text, "Pair"))?;
            Ok(Pair(i32::parse_element(a)?, i32::parse_element(b)?))
        }
    }

    fn decimals(values: &[&str]) -> Vec<Decimal> {
        values.iter().map(|v| Decimal::from_str(v).unwrap()).collect()
    }

    #[test]
    fn test_parse_decimal_array() {
        let array = ODataArray::<Decimal>::parse("1.1, 2.1, 42.1").unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.as_slice(), decimals(&["1.1", "2.1", "42.1"]).as_slice());
    }

    #[test]
    fn test_construction_and_parse_paths_agree() {
        let built = ODataArray::from_values(decimals(&["1.1", "2.1", "42.1"]));
        let parsed = ODataArray::<Decimal>::parse("1.1,2.1,42.1").unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn test_parse_empty_string() {
        let array = ODataArray::<String>::parse("").unwrap();
        assert!(array.is_empty());
    }

    #[test]
    fn test_parse_strings_trims_tokens() {
        let array = ODataArray::<String>::parse("a , b,c ").unwrap();
        assert_eq!(array.into_vec(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_type_without_parse_capability_fails() {
        let err = ODataArray::<Opaque>::parse("1,2").unwrap_err();
        assert_eq!(err, CoercionError::unsupported_parse("Opaque"));
    }

    #[test]
    fn test_type_without_parse_capability_builds_from_values() {
        let array = ODataArray::from_values(vec![Opaque(1), Opaque(2)]);
        assert_eq!(array[1], Opaque(2));
    }

    #[test]
    fn test_custom_parse_capability() {
        let array = ODataArray::<Pair>::parse_with("1:2; 3:4", ";").unwrap();
        assert_eq!(array.into_vec(), vec![Pair(1, 2), Pair(3, 4)]);
    }

    #[test]
    fn test_from_json() {
        let from_array = ODataArray::<i64>::from_json(&json!([1, 2, 3])).unwrap();
        let from_string = ODataArray::<i64>::from_json(&json!("1,2,3")).unwrap();
        assert_eq!(from_array, from_string);
        assert!(ODataArray::<i64>::from_json(&json!(true)).is_err());
    }

    #[test]
    fn test_from_typed_values() {
        let values = vec![TypedValue::Int(4), TypedValue::Int(5)];
        let array = ODataArray::<i32>::from_typed_values(&values).unwrap();
        assert_eq!(array.iter().sum::<i32>(), 9);

        let err = ODataArray::<bool>::from_typed_values(&values).unwrap_err();
        assert!(matches!(err, CoercionError::TypeMismatch { .. }));
    }
}
