// Strongly-typed schema IR for codegen. No serde_json::Value is decoded here.
//
// A schema is a graph of `TypeRef`s. Leaves and enums are built first, then
// composites, then objects and variants that point at them. Objects are the one
// node that can still grow after construction (see `object.rs`).
pub mod enums;
pub mod field;
pub mod object;
pub mod variant;

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::SchemaError;

pub use enums::{IntEnumType, StringEnumType};
pub use field::FieldDef;
pub use object::ObjectType;
pub use variant::{BasicVariantType, DiscriminatedUnionType};

/// Coarse shape of a type, on the Rust side or on the wire.
/// Used to decide which alternatives of an untagged variant can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseKind {
    Null,
    Boolean,
    Int,
    Double,
    /// String enums and strings.
    String,
    Object,
    Array,
    /// Optionals and variants.
    Complex,
}

impl BaseKind {
    /// The `serde_json::Value` predicate recognising this kind on the wire.
    pub fn json_predicate(self) -> Option<&'static str> {
        match self {
            BaseKind::Null => Some("is_null"),
            BaseKind::Boolean => Some("is_boolean"),
            BaseKind::Int => Some("is_i64"),
            // is_f64() is false for integers; any number converts to f64.
            BaseKind::Double => Some("is_number"),
            BaseKind::String => Some("is_string"),
            BaseKind::Object => Some("is_object"),
            BaseKind::Array => Some("is_array"),
            BaseKind::Complex => None,
        }
    }

    /// Same test as [`BaseKind::json_predicate`], evaluated directly.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            BaseKind::Null => value.is_null(),
            BaseKind::Boolean => value.is_boolean(),
            BaseKind::Int => value.is_i64(),
            BaseKind::Double => value.is_number(),
            BaseKind::String => value.is_string(),
            BaseKind::Object => value.is_object(),
            BaseKind::Array => value.is_array(),
            BaseKind::Complex => false,
        }
    }
}

pub type TypeRef = Rc<TypeNode>;

#[derive(Debug)]
pub enum TypeNode {
    Null,
    Bool,
    Int,
    Double,
    String,
    StringConstant(String),
    Array(TypeRef),
    Optional(TypeRef),
    IntEnum(IntEnumType),
    StringEnum(StringEnumType),
    Object(ObjectType),
    BasicVariant(BasicVariantType),
    DiscriminatedUnion(DiscriminatedUnionType),
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl TypeNode {
    pub fn null() -> TypeRef {
        Rc::new(TypeNode::Null)
    }
    pub fn bool() -> TypeRef {
        Rc::new(TypeNode::Bool)
    }
    pub fn int() -> TypeRef {
        Rc::new(TypeNode::Int)
    }
    pub fn double() -> TypeRef {
        Rc::new(TypeNode::Double)
    }
    pub fn string() -> TypeRef {
        Rc::new(TypeNode::String)
    }
    pub fn string_constant(value: impl Into<String>) -> TypeRef {
        Rc::new(TypeNode::StringConstant(value.into()))
    }
    pub fn array(element: TypeRef) -> TypeRef {
        Rc::new(TypeNode::Array(element))
    }
    pub fn optional(inner: TypeRef) -> TypeRef {
        Rc::new(TypeNode::Optional(inner))
    }

    pub fn int_enum<L: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = (L, i64)>,
    ) -> Result<TypeRef, SchemaError> {
        let values = values.into_iter().map(|(label, value)| (label.into(), value)).collect();
        Ok(Rc::new(TypeNode::IntEnum(IntEnumType::new(name.into(), values)?)))
    }

    /// String enum whose labels are the wire strings themselves.
    pub fn string_enum<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Result<TypeRef, SchemaError> {
        let values = values
            .into_iter()
            .map(|value| {
                let value = value.into();
                (value.clone(), value)
            })
            .collect();
        Self::string_enum_with_labels(name, values)
    }

    /// String enum with `(label, wire string)` pairs.
    pub fn string_enum_with_labels(
        name: impl Into<String>,
        values: Vec<(String, String)>,
    ) -> Result<TypeRef, SchemaError> {
        Ok(Rc::new(TypeNode::StringEnum(StringEnumType::new(name.into(), values)?)))
    }

    pub fn object(
        name: impl Into<String>,
        fields: Vec<Rc<FieldDef>>,
        extra_members: Vec<String>,
    ) -> Result<TypeRef, SchemaError> {
        Ok(Rc::new(TypeNode::Object(ObjectType::new(name.into(), fields, extra_members)?)))
    }

    pub fn basic_variant(alternatives: Vec<TypeRef>, allow_fallthrough: bool) -> Result<TypeRef, SchemaError> {
        Ok(Rc::new(TypeNode::BasicVariant(BasicVariantType::new(alternatives, allow_fallthrough)?)))
    }

    pub fn discriminated_union(
        discriminant: Rc<FieldDef>,
        by_tag: Vec<(String, TypeRef)>,
    ) -> Result<TypeRef, SchemaError> {
        Ok(Rc::new(TypeNode::DiscriminatedUnion(DiscriminatedUnionType::new(discriminant, by_tag)?)))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// QUERIES
// ————————————————————————————————————————————————————————————————————————————

impl TypeNode {
    /// The Rust type generated code stores values of this type in.
    pub fn target_type(&self) -> String {
        match self {
            TypeNode::Null => "JsonNull".to_owned(),
            TypeNode::Bool => "bool".to_owned(),
            TypeNode::Int => "i64".to_owned(),
            TypeNode::Double => "f64".to_owned(),
            TypeNode::String | TypeNode::StringConstant(_) => "String".to_owned(),
            TypeNode::Array(element) => format!("Vec<{}>", element.target_type()),
            TypeNode::Optional(inner) => format!("Option<{}>", inner.target_type()),
            TypeNode::IntEnum(e) => e.name.clone(),
            TypeNode::StringEnum(e) => e.name.clone(),
            TypeNode::Object(o) => format!("Box<{}>", o.name()),
            TypeNode::BasicVariant(v) => v.target_type(),
            TypeNode::DiscriminatedUnion(v) => v.target_type(),
        }
    }

    /// The wire type, TypeScript style. Only used in diagnostics.
    pub fn protocol_type(&self) -> String {
        match self {
            TypeNode::Null => "null".to_owned(),
            TypeNode::Bool => "boolean".to_owned(),
            TypeNode::Int => "integer".to_owned(),
            TypeNode::Double => "number".to_owned(),
            TypeNode::String => "string".to_owned(),
            TypeNode::StringConstant(value) => format!("\"{value}\""),
            TypeNode::Array(element) => format!("Array<{}>", element.protocol_type()),
            TypeNode::Optional(inner) => format!("({})?", inner.protocol_type()),
            TypeNode::IntEnum(e) => e.protocol_type(),
            TypeNode::StringEnum(e) => e.protocol_type(),
            TypeNode::Object(o) => o.name().to_owned(),
            TypeNode::BasicVariant(v) => v.protocol_type(),
            TypeNode::DiscriminatedUnion(v) => variant::join_protocol_types(&v.alternatives()),
        }
    }

    pub fn target_kind(&self) -> BaseKind {
        match self {
            TypeNode::StringEnum(_) => BaseKind::Int,
            _ => self.protocol_kind(),
        }
    }

    pub fn protocol_kind(&self) -> BaseKind {
        match self {
            TypeNode::Null => BaseKind::Null,
            TypeNode::Bool => BaseKind::Boolean,
            TypeNode::Int | TypeNode::IntEnum(_) => BaseKind::Int,
            TypeNode::Double => BaseKind::Double,
            TypeNode::String | TypeNode::StringConstant(_) | TypeNode::StringEnum(_) => BaseKind::String,
            TypeNode::Array(_) => BaseKind::Array,
            TypeNode::Object(_) => BaseKind::Object,
            TypeNode::Optional(_) | TypeNode::BasicVariant(_) | TypeNode::DiscriminatedUnion(_) => BaseKind::Complex,
        }
    }

    /// `true` when values of this type are not `Copy` and have to be cloned out of a borrow.
    pub fn want_move(&self) -> bool {
        match self {
            TypeNode::Null | TypeNode::Bool | TypeNode::Int | TypeNode::Double => false,
            TypeNode::IntEnum(_) | TypeNode::StringEnum(_) => false,
            TypeNode::String | TypeNode::StringConstant(_) | TypeNode::Object(_) => true,
            TypeNode::Array(inner) | TypeNode::Optional(inner) => inner.want_move(),
            TypeNode::BasicVariant(v) => v.alternatives.iter().any(|a| a.want_move()),
            TypeNode::DiscriminatedUnion(v) => v.alternatives().iter().any(|a| a.want_move()),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeNode::Optional(_))
    }

    /// Name of the standalone declaration, for the kinds that have one.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeNode::IntEnum(e) => Some(&e.name),
            TypeNode::StringEnum(e) => Some(&e.name),
            TypeNode::Object(o) => Some(o.name()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            TypeNode::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_string_enum(&self) -> Option<&StringEnumType> {
        match self {
            TypeNode::StringEnum(e) => Some(e),
            _ => None,
        }
    }

    /// Directly referenced types, in declaration order.
    pub fn children(&self) -> Vec<TypeRef> {
        match self {
            TypeNode::Null
            | TypeNode::Bool
            | TypeNode::Int
            | TypeNode::Double
            | TypeNode::String
            | TypeNode::StringConstant(_)
            | TypeNode::IntEnum(_)
            | TypeNode::StringEnum(_) => Vec::new(),
            TypeNode::Array(inner) | TypeNode::Optional(inner) => vec![inner.clone()],
            TypeNode::Object(o) => o.fields().iter().map(|f| f.ty.clone()).collect(),
            TypeNode::BasicVariant(v) => v.alternatives.clone(),
            TypeNode::DiscriminatedUnion(v) => {
                let mut out = vec![v.discriminant.ty.clone()];
                out.extend(v.alternatives());
                out
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IDENTIFIERS
// ————————————————————————————————————————————————————————————————————————————

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false", "fn",
    "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "abstract", "become",
    "box", "do", "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

// Keywords that cannot be written as raw identifiers either.
const UNRAW: &[&str] = &["self", "Self", "super", "crate", "_"];

// Names generated code already uses at module scope.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Value", "Map", "WireError", "JsonNull", "OneOf1", "OneOf2", "OneOf3", "OneOf4", "OneOf5", "OneOf6",
    "OneOf7", "OneOf8", "Box", "Vec", "Option", "Result", "String",
];

/// Field names may be keywords; they are emitted as raw identifiers.
pub(crate) fn validate_field_name(name: &str) -> Result<(), SchemaError> {
    if IDENTIFIER.is_match(name) && !UNRAW.contains(&name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier { what: "field", name: name.to_owned() })
    }
}

pub(crate) fn validate_type_name(name: &str) -> Result<(), SchemaError> {
    if IDENTIFIER.is_match(name)
        && !KEYWORDS.contains(&name)
        && !UNRAW.contains(&name)
        && !RESERVED_TYPE_NAMES.contains(&name)
    {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier { what: "type", name: name.to_owned() })
    }
}

pub(crate) fn validate_variant_name(name: &str) -> Result<(), SchemaError> {
    if IDENTIFIER.is_match(name) && !UNRAW.contains(&name) && !KEYWORDS.contains(&name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier { what: "enum variant", name: name.to_owned() })
    }
}

/// `name` as a Rust identifier, raw if it is a keyword.
pub fn rust_ident(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_enums_differ_by_side() {
        let e = TypeNode::string_enum("Kind", ["a", "b"]).unwrap();
        assert_eq!(e.target_kind(), BaseKind::Int);
        assert_eq!(e.protocol_kind(), BaseKind::String);
        assert_eq!(e.protocol_type(), "\"a\" | \"b\"");
    }

    #[test]
    fn composite_types_render_recursively() {
        let t = TypeNode::optional(TypeNode::array(TypeNode::string()));
        assert_eq!(t.target_type(), "Option<Vec<String>>");
        assert_eq!(t.protocol_type(), "(Array<string>)?");
        assert_eq!(t.protocol_kind(), BaseKind::Complex);
        assert!(t.want_move());
        assert!(!TypeNode::array(TypeNode::int()).want_move());
    }

    #[test]
    fn keywords_become_raw_identifiers() {
        assert_eq!(rust_ident("type"), "r#type");
        assert_eq!(rust_ident("uri"), "uri");
        assert!(validate_field_name("type").is_ok());
        assert!(validate_field_name("self").is_err());
        assert!(validate_field_name("text-document").is_err());
        assert!(validate_type_name("Value").is_err());
        assert!(validate_type_name("Position").is_ok());
    }

    #[test]
    fn wire_predicates_line_up_with_kinds() {
        let five = serde_json::json!(5);
        assert!(BaseKind::Int.matches(&five));
        assert!(BaseKind::Double.matches(&five));
        assert!(!BaseKind::String.matches(&five));
        assert_eq!(BaseKind::Complex.json_predicate(), None);
    }
}
