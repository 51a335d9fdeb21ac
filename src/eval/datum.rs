use indexmap::IndexMap;
use serde_json::Value;

/// An in-memory message as the interpreter sees it: the dynamic counterpart of the
/// types generated code declares.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// Enum value by label.
    Enum(String),
    Array(Vec<Datum>),
    Optional(Option<Box<Datum>>),
    Record(Box<Record>),
    /// Variant value; `slot` is the index of its `OneOfN` arm.
    Variant { slot: usize, value: Box<Datum> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: String,
    /// Keyed by Rust member name.
    pub fields: IndexMap<String, Datum>,
}

impl Datum {
    pub fn string(value: impl Into<String>) -> Self {
        Datum::String(value.into())
    }

    pub fn label(label: impl Into<String>) -> Self {
        Datum::Enum(label.into())
    }

    pub fn some(value: Datum) -> Self {
        Datum::Optional(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Datum::Optional(None)
    }

    pub fn variant(slot: usize, value: Datum) -> Self {
        Datum::Variant { slot, value: Box::new(value) }
    }

    pub fn record<K: Into<String>>(type_name: impl Into<String>, fields: impl IntoIterator<Item = (K, Datum)>) -> Self {
        Datum::Record(Box::new(Record {
            type_name: type_name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }))
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Datum::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Short name of the shape held, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Bool(_) => "bool",
            Datum::Int(_) => "int",
            Datum::Double(_) => "double",
            Datum::String(_) => "string",
            Datum::Enum(_) => "enum",
            Datum::Array(_) => "array",
            Datum::Optional(_) => "optional",
            Datum::Record(_) => "record",
            Datum::Variant { .. } => "variant",
        }
    }

    /// Placeholder wire value naming the shape held, for `WrongShape` diagnostics.
    pub(crate) fn shape_hint(&self) -> Value {
        Value::String(format!("<{}>", self.kind_name()))
    }
}

impl Record {
    pub fn get(&self, member: &str) -> Option<&Datum> {
        self.fields.get(member)
    }
}
