//! Runtime support for generated code.
//!
//! Generated declarations and definitions start with `use <runtime>::*;` and call
//! straight into the helpers below. The interpreter in [`crate::eval`] uses the same
//! helpers, so both paths fail with identical [`WireError`]s.
pub use serde_json::{Map, Value};
use thiserror::Error;

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// Failures raised while decoding or encoding wire values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WireError {
    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("expected `{field}` to be {expected}, found {actual}")]
    WrongShape { field: String, expected: String, actual: Value },

    #[error("`{field}` must be the constant \"{expected}\", found \"{actual}\"")]
    InvalidConstantValue { field: String, expected: String, actual: String },

    #[error("{value} is not a valid value of enum `{name}`")]
    InvalidEnumValue { name: String, value: i64 },

    #[error("enum `{name}` has no value for string \"{value}\"")]
    UnknownEnumString { name: String, value: String },

    #[error("`{field}` has no alternative for discriminant `{discriminant}` = \"{value}\"")]
    InvalidDiscriminantValue { field: String, discriminant: String, value: String },

    #[error("`{field}` does not hold {expected} as required by discriminant `{discriminant}` = \"{value}\"")]
    DiscriminatedUnionMismatch { field: String, discriminant: String, value: String, expected: String },

    #[error("enum `{name}` declares no label `{label}`")]
    UnknownEnumLabel { name: String, label: String },

    #[error("`{field}` holds a null object reference")]
    NullObjectReference { field: String },

    #[error("`{field}` holds none of its variant alternatives")]
    NoVariantValueHeld { field: String },
}

impl WireError {
    pub fn missing_field(field: &str) -> Self {
        WireError::MissingField { field: field.to_owned() }
    }

    pub fn wrong_shape(field: &str, expected: &str, actual: &Value) -> Self {
        WireError::WrongShape { field: field.to_owned(), expected: expected.to_owned(), actual: actual.clone() }
    }

    pub fn invalid_constant(field: &str, expected: &str, actual: &str) -> Self {
        WireError::InvalidConstantValue {
            field: field.to_owned(),
            expected: expected.to_owned(),
            actual: actual.to_owned(),
        }
    }

    pub fn invalid_enum_value(name: &str, value: i64) -> Self {
        WireError::InvalidEnumValue { name: name.to_owned(), value }
    }

    pub fn unknown_enum_string(name: &str, value: &str) -> Self {
        WireError::UnknownEnumString { name: name.to_owned(), value: value.to_owned() }
    }

    pub fn unknown_enum_label(name: &str, label: &str) -> Self {
        WireError::UnknownEnumLabel { name: name.to_owned(), label: label.to_owned() }
    }

    pub fn invalid_discriminant(field: &str, discriminant: &str, value: &str) -> Self {
        WireError::InvalidDiscriminantValue {
            field: field.to_owned(),
            discriminant: discriminant.to_owned(),
            value: value.to_owned(),
        }
    }

    pub fn discriminated_union_mismatch(field: &str, discriminant: &str, value: &str, expected: &str) -> Self {
        WireError::DiscriminatedUnionMismatch {
            field: field.to_owned(),
            discriminant: discriminant.to_owned(),
            value: value.to_owned(),
            expected: expected.to_owned(),
        }
    }

    /// `true` for the errors decoding can raise. Fallthrough variants absorb exactly these.
    pub fn is_decode_error(&self) -> bool {
        match self {
            WireError::MissingField { .. }
            | WireError::WrongShape { .. }
            | WireError::InvalidConstantValue { .. }
            | WireError::InvalidEnumValue { .. }
            | WireError::UnknownEnumString { .. }
            | WireError::InvalidDiscriminantValue { .. } => true,
            WireError::DiscriminatedUnionMismatch { .. }
            | WireError::UnknownEnumLabel { .. }
            | WireError::NullObjectReference { .. }
            | WireError::NoVariantValueHeld { .. } => false,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALUE TYPES
// ————————————————————————————————————————————————————————————————————————————

/// In-memory stand-in for a wire `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct JsonNull;

/// Arm names of the `OneOfN` sum types, in slot order.
pub const ONE_OF_ARMS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

macro_rules! one_of {
    ($name:ident { $($arm:ident),+ }) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name<$($arm),+> {
            $($arm($arm)),+
        }
    };
}

one_of!(OneOf1 { A });
one_of!(OneOf2 { A, B });
one_of!(OneOf3 { A, B, C });
one_of!(OneOf4 { A, B, C, D });
one_of!(OneOf5 { A, B, C, D, E });
one_of!(OneOf6 { A, B, C, D, E, F });
one_of!(OneOf7 { A, B, C, D, E, F, G });
one_of!(OneOf8 { A, B, C, D, E, F, G, H });

// ————————————————————————————————————————————————————————————————————————————
// CONVERSION HELPERS
// ————————————————————————————————————————————————————————————————————————————

pub fn maybe_get_json_field<'a>(val: &'a Value, key: &str) -> Option<&'a Value> {
    val.get(key)
}

pub fn assert_json_field<'a>(from: Option<&'a Value>, field: &str) -> Result<&'a Value, WireError> {
    from.ok_or_else(|| WireError::missing_field(field))
}

pub fn try_convert_to_null(from: Option<&Value>, field: &str) -> Result<JsonNull, WireError> {
    let value = assert_json_field(from, field)?;
    if value.is_null() {
        Ok(JsonNull)
    } else {
        Err(WireError::wrong_shape(field, "null", value))
    }
}

pub fn try_convert_to_bool(from: Option<&Value>, field: &str) -> Result<bool, WireError> {
    let value = assert_json_field(from, field)?;
    value.as_bool().ok_or_else(|| WireError::wrong_shape(field, "boolean", value))
}

pub fn try_convert_to_int(from: Option<&Value>, field: &str) -> Result<i64, WireError> {
    let value = assert_json_field(from, field)?;
    value.as_i64().ok_or_else(|| WireError::wrong_shape(field, "integer", value))
}

/// Accepts any JSON number, integers included.
pub fn try_convert_to_double(from: Option<&Value>, field: &str) -> Result<f64, WireError> {
    let value = assert_json_field(from, field)?;
    value.as_f64().ok_or_else(|| WireError::wrong_shape(field, "number", value))
}

pub fn try_convert_to_str<'a>(from: Option<&'a Value>, field: &str) -> Result<&'a str, WireError> {
    let value = assert_json_field(from, field)?;
    value.as_str().ok_or_else(|| WireError::wrong_shape(field, "string", value))
}

pub fn try_convert_to_string(from: Option<&Value>, field: &str) -> Result<String, WireError> {
    try_convert_to_str(from, field).map(str::to_owned)
}

pub fn try_convert_to_string_constant(
    from: Option<&Value>,
    expected: &str,
    field: &str,
) -> Result<String, WireError> {
    let value = try_convert_to_str(from, field)?;
    check_string_constant(value, expected, field)?;
    Ok(value.to_owned())
}

pub fn check_string_constant(value: &str, expected: &str, field: &str) -> Result<(), WireError> {
    if value == expected {
        Ok(())
    } else {
        Err(WireError::invalid_constant(field, expected, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_field_is_missing() {
        let err = try_convert_to_int(None, "Foo.id").unwrap_err();
        assert_eq!(err, WireError::missing_field("Foo.id"));
    }

    #[test]
    fn ints_reject_floats_but_doubles_accept_ints() {
        let half = json!(1.5);
        let five = json!(5);
        assert!(matches!(try_convert_to_int(Some(&half), "x"), Err(WireError::WrongShape { .. })));
        assert_eq!(try_convert_to_double(Some(&five), "x").unwrap(), 5.0);
    }

    #[test]
    fn null_is_its_own_shape() {
        let null = json!(null);
        let zero = json!(0);
        assert_eq!(try_convert_to_null(Some(&null), "x").unwrap(), JsonNull);
        let err = try_convert_to_null(Some(&zero), "x").unwrap_err();
        assert_eq!(err.to_string(), "expected `x` to be null, found 0");
    }

    #[test]
    fn string_constants_must_match_exactly() {
        let ok = json!("2.0");
        let other = json!("1.0");
        assert_eq!(try_convert_to_string_constant(Some(&ok), "2.0", "jsonrpc").unwrap(), "2.0");
        assert_eq!(
            try_convert_to_string_constant(Some(&other), "2.0", "jsonrpc").unwrap_err(),
            WireError::invalid_constant("jsonrpc", "2.0", "1.0")
        );
    }

    #[test]
    fn decode_errors_are_classified() {
        assert!(WireError::missing_field("a").is_decode_error());
        assert!(WireError::unknown_enum_string("E", "z").is_decode_error());
        assert!(!WireError::NoVariantValueHeld { field: "a".into() }.is_decode_error());
        assert!(!WireError::discriminated_union_mismatch("a", "k", "v", "i64").is_decode_error());
    }
}
