//! Reference interpreter: decodes and encodes `serde_json::Value`s by walking the
//! type-node graph directly.
//!
//! It follows the exact control flow of the generated routines (same helpers, same
//! diagnostic field names, same error for every failure), so it doubles as an oracle
//! for the generator and as the engine behind `json-msggen check`/`decode`. Failures
//! generated Rust rules out statically (`NullObjectReference`, `NoVariantValueHeld`,
//! labels outside an enum) surface here as the corresponding [`WireError`].
pub mod datum;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::trace;

use crate::ir::{DiscriminatedUnionType, ObjectType, TypeNode};
use crate::runtime::*;
pub use datum::{Datum, Record};

type Scope = IndexMap<String, Datum>;

/// Decodes a top-level wire value.
pub fn decode(node: &TypeNode, value: &Value, field_name: &str) -> Result<Datum, WireError> {
    decode_in(node, Some(value), field_name, &Scope::new())
}

/// Encodes a top-level datum. An absent optional encodes as `null`.
pub fn encode(node: &TypeNode, datum: &Datum, field_name: &str) -> Result<Value, WireError> {
    Ok(encode_in(node, datum, field_name, &Scope::new())?.unwrap_or(Value::Null))
}

// ————————————————————————————————————————————————————————————————————————————
// DECODE
// ————————————————————————————————————————————————————————————————————————————

fn decode_in(node: &TypeNode, from: Option<&Value>, field: &str, scope: &Scope) -> Result<Datum, WireError> {
    match node {
        TypeNode::Null => try_convert_to_null(from, field).map(|_| Datum::Null),
        TypeNode::Bool => try_convert_to_bool(from, field).map(Datum::Bool),
        TypeNode::Int => try_convert_to_int(from, field).map(Datum::Int),
        TypeNode::Double => try_convert_to_double(from, field).map(Datum::Double),
        TypeNode::String => try_convert_to_string(from, field).map(Datum::String),
        TypeNode::StringConstant(expected) => {
            try_convert_to_string_constant(from, expected, field).map(Datum::String)
        }
        TypeNode::Array(element) => {
            let unwrapped = assert_json_field(from, field)?;
            let Some(elements) = unwrapped.as_array() else {
                return Err(WireError::wrong_shape(field, "array", unwrapped));
            };
            let items = elements
                .iter()
                .map(|item| decode_in(element, Some(item), field, scope))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Datum::Array(items))
        }
        TypeNode::Optional(inner) => {
            if from.is_some_and(|v| !v.is_null()) {
                Ok(Datum::some(decode_in(inner, from, field, scope)?))
            } else {
                Ok(Datum::none())
            }
        }
        TypeNode::IntEnum(e) => {
            let value = try_convert_to_int(from, field)?;
            match e.by_value(value) {
                Some(v) => Ok(Datum::label(v.label.clone())),
                None => Err(WireError::invalid_enum_value(&e.name, value)),
            }
        }
        TypeNode::StringEnum(e) => {
            let value = try_convert_to_str(from, field)?;
            match e.by_wire(value) {
                Some(v) => Ok(Datum::label(v.label.clone())),
                None => Err(WireError::unknown_enum_string(&e.name, value)),
            }
        }
        TypeNode::Object(o) => decode_object(o, assert_json_field(from, field)?, field),
        TypeNode::BasicVariant(v) => {
            if v.allow_fallthrough {
                for (index, alternative) in v.alternatives.iter().enumerate() {
                    match decode_in(alternative, from, field, scope) {
                        Ok(value) => return Ok(Datum::variant(v.slots.slot_of[index], value)),
                        Err(err) if err.is_decode_error() => {
                            trace!(field, alternative = index, %err, "alternative rejected");
                        }
                        Err(err) => return Err(err),
                    }
                }
            } else {
                let unwrapped = assert_json_field(from, field)?;
                for (index, alternative) in v.alternatives.iter().enumerate() {
                    if alternative.protocol_kind().matches(unwrapped) {
                        let value = decode_in(alternative, from, field, scope)?;
                        return Ok(Datum::variant(v.slots.slot_of[index], value));
                    }
                }
            }
            let unwrapped = assert_json_field(from, field)?;
            Err(WireError::wrong_shape(field, &v.protocol_type(), unwrapped))
        }
        TypeNode::DiscriminatedUnion(u) => {
            let wire = discriminant_wire(u, scope);
            match u.alternative_for(&wire) {
                Some((index, alternative)) => {
                    let value = decode_in(alternative, from, field, scope)?;
                    Ok(Datum::variant(u.slots.slot_of[index], value))
                }
                None => Err(WireError::invalid_discriminant(field, &u.discriminant.target_name, &wire)),
            }
        }
    }
}

fn decode_object(o: &ObjectType, val: &Value, field_name: &str) -> Result<Datum, WireError> {
    if !val.is_object() {
        return Err(WireError::wrong_shape(field_name, "object", val));
    }
    let fields = o.fields();
    let mut scope = Scope::new();
    // Required fields first, in declaration order, then optional ones.
    for field in fields.iter().filter(|f| !f.is_optional()).chain(fields.iter().filter(|f| f.is_optional())) {
        let from = maybe_get_json_field(val, &field.protocol_name);
        let diagnostic = format!("{}.{}", o.name(), field.target_name);
        let value = decode_in(&field.ty, from, &diagnostic, &scope)?;
        scope.insert(field.target_name.clone(), value);
    }
    let mut record = IndexMap::with_capacity(scope.len());
    for field in fields.iter() {
        if let Some(value) = scope.swap_remove(&field.target_name) {
            record.insert(field.target_name.clone(), value);
        }
    }
    Ok(Datum::Record(Box::new(Record { type_name: o.name().to_owned(), fields: record })))
}

// Wire string of the discriminant held by the enclosing record; empty when the record
// has none (schemas that passed the scope check always do).
fn discriminant_wire(u: &DiscriminatedUnionType, scope: &Scope) -> String {
    let label = match scope.get(&u.discriminant.target_name) {
        Some(Datum::Enum(label)) => label.as_str(),
        _ => return String::new(),
    };
    u.discriminant
        .ty
        .as_string_enum()
        .and_then(|e| e.by_label(label))
        .map(|v| v.wire.clone())
        .unwrap_or_default()
}

// ————————————————————————————————————————————————————————————————————————————
// ENCODE
// ————————————————————————————————————————————————————————————————————————————

/// `Ok(None)` means "emit nothing": an absent optional.
fn encode_in(node: &TypeNode, datum: &Datum, field: &str, scope: &Scope) -> Result<Option<Value>, WireError> {
    let value = match (node, datum) {
        (TypeNode::Null, _) => Value::Null,
        (TypeNode::Bool, Datum::Bool(b)) => Value::Bool(*b),
        (TypeNode::Int, Datum::Int(i)) => Value::from(*i),
        (TypeNode::Double, Datum::Double(d)) => Value::from(*d),
        (TypeNode::String, Datum::String(s)) => Value::String(s.clone()),
        (TypeNode::StringConstant(expected), Datum::String(s)) => {
            check_string_constant(s, expected, field)?;
            Value::String(s.clone())
        }
        (TypeNode::Array(element), Datum::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(value) = encode_in(element, item, field, scope)? {
                    out.push(value);
                }
            }
            Value::Array(out)
        }
        (TypeNode::Optional(_), Datum::Optional(None)) => return Ok(None),
        (TypeNode::Optional(inner), Datum::Optional(Some(held))) => return encode_in(inner, held, field, scope),
        (TypeNode::IntEnum(e), Datum::Enum(label)) => match e.by_label(label) {
            Some(v) => Value::from(v.value),
            None => return Err(WireError::unknown_enum_label(&e.name, label)),
        },
        (TypeNode::StringEnum(e), Datum::Enum(label)) => match e.by_label(label) {
            Some(v) => Value::String(v.wire.clone()),
            None => return Err(WireError::unknown_enum_string(&e.name, label)),
        },
        (TypeNode::Object(o), Datum::Record(record)) => encode_object(o, record, field)?,
        (TypeNode::Object(_), _) => return Err(WireError::NullObjectReference { field: field.to_owned() }),
        (TypeNode::BasicVariant(v), Datum::Variant { slot, value }) => {
            let Some(index) = v.slots.slot_of.iter().position(|s| s == slot) else {
                return Err(WireError::NoVariantValueHeld { field: field.to_owned() });
            };
            return encode_in(&v.alternatives[index], value, field, scope);
        }
        (TypeNode::DiscriminatedUnion(u), held) => return encode_union(u, held, field, scope),
        (TypeNode::BasicVariant(_), _) => return Err(WireError::NoVariantValueHeld { field: field.to_owned() }),
        (node, datum) => return Err(WireError::wrong_shape(field, &node.target_type(), &datum.shape_hint())),
    };
    Ok(Some(value))
}

fn encode_object(o: &ObjectType, record: &Record, field_name: &str) -> Result<Value, WireError> {
    if record.type_name != o.name() {
        return Err(WireError::wrong_shape(field_name, o.name(), &Value::String(record.type_name.clone())));
    }
    let mut rv = Map::new();
    for field in o.fields().iter() {
        let diagnostic = format!("{}.{}", o.name(), field.target_name);
        let value = match record.get(&field.target_name) {
            Some(value) => encode_in(&field.ty, value, &diagnostic, &record.fields)?,
            None if field.is_optional() => None,
            None => return Err(WireError::missing_field(&diagnostic)),
        };
        if let Some(value) = value {
            rv.insert(field.protocol_name.clone(), value);
        }
    }
    Ok(Value::Object(rv))
}

fn encode_union(u: &DiscriminatedUnionType, held: &Datum, field: &str, scope: &Scope) -> Result<Option<Value>, WireError> {
    let wire = discriminant_wire(u, scope);
    let Some((index, alternative)) = u.alternative_for(&wire) else {
        return Err(WireError::invalid_discriminant(field, &u.discriminant.target_name, &wire));
    };
    match held {
        Datum::Variant { slot, value } if *slot == u.slots.slot_of[index] => encode_in(alternative, value, field, scope),
        Datum::Variant { .. } => Err(WireError::discriminated_union_mismatch(
            field,
            &u.discriminant.target_name,
            &wire,
            &alternative.target_type(),
        )),
        _ => Err(WireError::NoVariantValueHeld { field: field.to_owned() }),
    }
}
