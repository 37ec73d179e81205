//! Conversion of raw request values into typed operation arguments.
//!
//! Raw values arrive either as text (query-string values, delimited lists)
//! or as JSON (action bodies). Numeric parsing is locale-neutral: `.` is the
//! only decimal separator and no grouping characters are accepted.
//!
//! # Example
//!
//! ```
//! use contentgate_core::{ElementType, PrimitiveType, TypedValue, coerce_sequence_str};
//!
//! let values = coerce_sequence_str("1, 2, 3", &ElementType::Primitive(PrimitiveType::Int), ",")
//!     .unwrap();
//! assert_eq!(values, vec![TypedValue::Int(1), TypedValue::Int(2), TypedValue::Int(3)]);
//! ```

use std::fmt;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoercionError, Result};

/// Delimiter used when a sequence is supplied as a single string.
pub const DEFAULT_LIST_DELIMITER: &str = ",";

/// Scalar types an operation parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Int,
    Long,
    Byte,
    Bool,
    Decimal,
    Float,
    Double,
}

impl PrimitiveType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Long => "long",
            Self::Byte => "byte",
            Self::Bool => "bool",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Resolve a type name, accepting the common aliases (`int32`, `boolean`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "int" | "int32" | "integer" => Some(Self::Int),
            "long" | "int64" => Some(Self::Long),
            "byte" => Some(Self::Byte),
            "bool" | "boolean" => Some(Self::Bool),
            "decimal" => Some(Self::Decimal),
            "float" | "single" => Some(Self::Float),
            "double" => Some(Self::Double),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value after coercion to its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Int(i32),
    Long(i64),
    Byte(u8),
    Bool(bool),
    Decimal(Decimal),
    Float(f32),
    Double(f64),
    /// Ordered, homogeneous sequence
    Sequence(Vec<TypedValue>),
    /// Structured value passed through untouched
    Json(Value),
}

impl TypedValue {
    /// The primitive type of a scalar value, `None` for sequences and JSON.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Self::String(_) => Some(PrimitiveType::String),
            Self::Int(_) => Some(PrimitiveType::Int),
            Self::Long(_) => Some(PrimitiveType::Long),
            Self::Byte(_) => Some(PrimitiveType::Byte),
            Self::Bool(_) => Some(PrimitiveType::Bool),
            Self::Decimal(_) => Some(PrimitiveType::Decimal),
            Self::Float(_) => Some(PrimitiveType::Float),
            Self::Double(_) => Some(PrimitiveType::Double),
            Self::Sequence(_) | Self::Json(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Sequence(_) => "sequence",
            Self::Json(_) => "json",
            other => other.primitive_type().map_or("json", PrimitiveType::name),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Byte(v) => Some(i32::from(*v)),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Byte(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[TypedValue]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Render the value as JSON for response payloads.
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Int(v) => Value::from(*v),
            Self::Long(v) => Value::from(*v),
            Self::Byte(v) => Value::from(*v),
            Self::Bool(v) => Value::Bool(*v),
            Self::Decimal(d) => serde_json::from_str::<Value>(&d.to_string())
                .unwrap_or_else(|_| Value::String(d.to_string())),
            Self::Float(v) => Value::from(f64::from(*v)),
            Self::Double(v) => Value::from(*v),
            Self::Sequence(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Json(v) => v.clone(),
        }
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<u8> for TypedValue {
    fn from(value: u8) -> Self {
        Self::Byte(value)
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Decimal> for TypedValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<f32> for TypedValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<Vec<TypedValue>> for TypedValue {
    fn from(value: Vec<TypedValue>) -> Self {
        Self::Sequence(value)
    }
}

// ============================================================================
// Scalar coercion
// ============================================================================

/// Coerce a textual value into `target`.
///
/// Strings are taken verbatim; every other type is parsed from the trimmed
/// text. Booleans accept only `true`/`false` in any letter case.
pub fn coerce_str(raw: &str, target: PrimitiveType) -> Result<TypedValue> {
    let text = raw.trim();
    let invalid = || CoercionError::invalid_literal(raw, target.name());

    match target {
        PrimitiveType::String => Ok(TypedValue::String(raw.to_string())),
        PrimitiveType::Int => parse_integer::<i32>(text, target).map(TypedValue::Int),
        PrimitiveType::Long => parse_integer::<i64>(text, target).map(TypedValue::Long),
        PrimitiveType::Byte => parse_integer::<u8>(text, target).map(TypedValue::Byte),
        PrimitiveType::Bool => {
            if text.eq_ignore_ascii_case("true") {
                Ok(TypedValue::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Ok(TypedValue::Bool(false))
            } else {
                Err(invalid())
            }
        }
        PrimitiveType::Decimal => Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map(TypedValue::Decimal)
            .map_err(|_| invalid()),
        PrimitiveType::Float => text
            .parse::<f32>()
            .map(TypedValue::Float)
            .map_err(|_| invalid()),
        PrimitiveType::Double => text
            .parse::<f64>()
            .map(TypedValue::Double)
            .map_err(|_| invalid()),
    }
}

fn parse_integer<T>(text: &str, target: PrimitiveType) -> Result<T>
where
    T: FromStr<Err = ParseIntError>,
{
    text.parse::<T>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            CoercionError::out_of_range(text, target.name())
        }
        _ => CoercionError::invalid_literal(text, target.name()),
    })
}

/// Coerce a JSON scalar into `target`.
///
/// JSON strings go through [`coerce_str`]; numbers and booleans are converted
/// directly. Integral targets reject fractional numbers.
pub fn coerce_json(value: &Value, target: PrimitiveType) -> Result<TypedValue> {
    match (value, target) {
        (Value::String(s), _) => coerce_str(s, target),
        (Value::Number(n), PrimitiveType::String) => Ok(TypedValue::String(n.to_string())),
        (Value::Bool(b), PrimitiveType::String) => Ok(TypedValue::String(b.to_string())),
        (Value::Bool(b), PrimitiveType::Bool) => Ok(TypedValue::Bool(*b)),
        (Value::Number(n), PrimitiveType::Int | PrimitiveType::Long | PrimitiveType::Byte) => {
            json_integer(n, target)
        }
        (
            Value::Number(n),
            PrimitiveType::Decimal | PrimitiveType::Float | PrimitiveType::Double,
        ) => coerce_str(&n.to_string(), target),
        (other, _) => Err(CoercionError::type_mismatch(
            target.name(),
            json_type_name(other),
        )),
    }
}

fn json_integer(n: &serde_json::Number, target: PrimitiveType) -> Result<TypedValue> {
    let literal = n.to_string();
    let Some(v) = n.as_i64() else {
        return Err(if n.is_u64() {
            CoercionError::out_of_range(literal, target.name())
        } else {
            CoercionError::invalid_literal(literal, target.name())
        });
    };

    match target {
        PrimitiveType::Int => i32::try_from(v)
            .map(TypedValue::Int)
            .map_err(|_| CoercionError::out_of_range(literal, target.name())),
        PrimitiveType::Byte => u8::try_from(v)
            .map(TypedValue::Byte)
            .map_err(|_| CoercionError::out_of_range(literal, target.name())),
        _ => Ok(TypedValue::Long(v)),
    }
}

/// Short JSON type name used in mismatch messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Element types
// ============================================================================

/// String parse routine supplied by a custom element type.
pub type ParseFn = Arc<dyn Fn(&str) -> Result<TypedValue> + Send + Sync>;

/// A non-primitive element type.
///
/// A custom type opts into string parsing by supplying a parser; without one,
/// coercion from text fails with [`CoercionError::UnsupportedParse`].
#[derive(Clone)]
pub struct CustomType {
    name: String,
    parser: Option<ParseFn>,
}

impl CustomType {
    /// A custom type without a string parse capability.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parser: None,
        }
    }

    pub fn with_parser<F>(name: impl Into<String>, parser: F) -> Self
    where
        F: Fn(&str) -> Result<TypedValue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parser: Some(Arc::new(parser)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn can_parse(&self) -> bool {
        self.parser.is_some()
    }

    pub fn parse(&self, text: &str) -> Result<TypedValue> {
        match &self.parser {
            Some(parser) => parser(text),
            None => Err(CoercionError::unsupported_parse(&self.name)),
        }
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("name", &self.name)
            .field("can_parse", &self.can_parse())
            .finish()
    }
}

impl PartialEq for CustomType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.can_parse() == other.can_parse()
    }
}

/// Element type of a sequence parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Primitive(PrimitiveType),
    Custom(CustomType),
}

impl ElementType {
    pub fn name(&self) -> &str {
        match self {
            Self::Primitive(p) => p.name(),
            Self::Custom(c) => c.name(),
        }
    }

    /// Parse a single (already trimmed) token.
    pub fn parse_str(&self, text: &str) -> Result<TypedValue> {
        match self {
            Self::Primitive(p) => coerce_str(text, *p),
            Self::Custom(c) => c.parse(text),
        }
    }

    /// Coerce a single JSON element. Custom types keep structured JSON as-is.
    pub fn coerce_json(&self, value: &Value) -> Result<TypedValue> {
        match self {
            Self::Primitive(p) => coerce_json(value, *p),
            Self::Custom(c) => match value {
                Value::String(s) if c.can_parse() => c.parse(s),
                other => Ok(TypedValue::Json(other.clone())),
            },
        }
    }
}

impl From<PrimitiveType> for ElementType {
    fn from(value: PrimitiveType) -> Self {
        Self::Primitive(value)
    }
}

// ============================================================================
// Sequence coercion
// ============================================================================

/// Split `raw` on `delimiter` and parse every trimmed token as `element`.
///
/// Blank input yields an empty sequence, never a one-element sequence
/// holding an empty string.
pub fn coerce_sequence_str(
    raw: &str,
    element: &ElementType,
    delimiter: &str,
) -> Result<Vec<TypedValue>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let delimiter = if delimiter.is_empty() {
        DEFAULT_LIST_DELIMITER
    } else {
        delimiter
    };

    raw.split(delimiter)
        .map(|token| element.parse_str(token.trim()))
        .collect()
}

/// Coerce each element of a JSON array.
pub fn coerce_sequence_json(items: &[Value], element: &ElementType) -> Result<Vec<TypedValue>> {
    items.iter().map(|item| element.coerce_json(item)).collect()
}

/// Accept an already-typed collection, checking only that every element has
/// the expected type.
pub fn coerce_values(values: Vec<TypedValue>, element: PrimitiveType) -> Result<Vec<TypedValue>> {
    for (index, value) in values.iter().enumerate() {
        if value.primitive_type() != Some(element) {
            return Err(CoercionError::MixedElementTypes {
                index,
                expected: element.name().to_string(),
                found: value.type_name().to_string(),
            });
        }
    }
    Ok(values)
}

// ============================================================================
// Parameter types
// ============================================================================

/// Declared type of an operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    Scalar(PrimitiveType),
    /// Array, list or other sequence parameter
    Sequence(ElementType),
    /// Arbitrary JSON (complex objects in action bodies)
    Json,
}

impl ParameterType {
    pub fn sequence_of(element: PrimitiveType) -> Self {
        Self::Sequence(ElementType::Primitive(element))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Coerce a query-string value.
    pub fn coerce_text(&self, raw: &str, delimiter: &str) -> Result<TypedValue> {
        match self {
            Self::Scalar(p) => coerce_str(raw, *p),
            Self::Sequence(element) => {
                coerce_sequence_str(raw, element, delimiter).map(TypedValue::Sequence)
            }
            Self::Json => Ok(TypedValue::Json(
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
            )),
        }
    }

    /// Coerce a value taken from a JSON body.
    ///
    /// Sequence parameters accept either a JSON array or a delimited string.
    pub fn coerce_json(&self, value: &Value, delimiter: &str) -> Result<TypedValue> {
        match (self, value) {
            (Self::Json, v) => Ok(TypedValue::Json(v.clone())),
            (Self::Sequence(element), Value::Array(items)) => {
                coerce_sequence_json(items, element).map(TypedValue::Sequence)
            }
            (Self::Sequence(element), Value::String(s)) => {
                coerce_sequence_str(s, element, delimiter).map(TypedValue::Sequence)
            }
            (Self::Sequence(_), other) => Err(CoercionError::type_mismatch(
                "array",
                json_type_name(other),
            )),
            (Self::Scalar(p), v) => coerce_json(v, *p),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(p) => write!(f, "{p}"),
            Self::Sequence(element) => write!(f, "sequence<{}>", element.name()),
            Self::Json => f.write_str("json"),
        }
    }
}

impl From<PrimitiveType> for ParameterType {
    fn from(value: PrimitiveType) -> Self {
        Self::Scalar(value)
    }
}
