//! Schema description files: the JSON form a schema is written in before lowering.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Description {
    pub types: Vec<TypeDecl>,
    /// Roots to emit; every declared type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum TypeDecl {
    IntEnum {
        name: String,
        values: IndexMap<String, i64>,
    },
    StringEnum {
        name: String,
        values: Vec<EnumValueDecl>,
    },
    Object {
        name: String,
        fields: Vec<FieldDecl>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extra: Vec<String>,
    },
}

impl TypeDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::IntEnum { name, .. } | TypeDecl::StringEnum { name, .. } | TypeDecl::Object { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValueDecl {
    Wire(String),
    Labelled { label: String, wire: String },
}

impl EnumValueDecl {
    pub fn label_and_wire(&self) -> (String, String) {
        match self {
            EnumValueDecl::Wire(wire) => (wire.clone(), wire.clone()),
            EnumValueDecl::Labelled { label, wire } => (label.clone(), wire.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    /// Key on the wire.
    pub name: String,
    /// Rust member name, when it differs from the wire key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    Primitive(Primitive),
    Composite(Composite),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Null,
    Bool,
    Int,
    Double,
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Composite {
    Constant(String),
    Array(Box<TypeExpr>),
    Optional(Box<TypeExpr>),
    Ref(String),
    Variant {
        alternatives: Vec<TypeExpr>,
        #[serde(default)]
        fallthrough: bool,
    },
    Union {
        discriminant: String,
        variants: IndexMap<String, TypeExpr>,
    },
}

/// A wire value that must decode as `type_name` and re-encode to itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sample {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: Value,
}
