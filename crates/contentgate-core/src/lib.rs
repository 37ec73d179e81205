pub mod array;
pub mod content_type;
pub mod entity;
pub mod error;
pub mod value;

pub use array::{ODataArray, ODataElement};
pub use content_type::{StaticTypeHierarchy, TypeHierarchy, TypeMatcher};
pub use entity::{Caller, ContentId, TargetEntity};
pub use error::{CoercionError, ErrorCategory, Result};
pub use value::{
    CustomType, DEFAULT_LIST_DELIMITER, ElementType, ParameterType, ParseFn, PrimitiveType,
    TypedValue, coerce_json, coerce_sequence_json, coerce_sequence_str, coerce_str,
    coerce_values,
};

pub use rust_decimal::Decimal;
