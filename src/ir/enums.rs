use std::collections::BTreeSet;

use heck::ToUpperCamelCase;

use crate::error::SchemaError;
use super::{validate_type_name, validate_variant_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntEnumValue {
    pub label: String,
    /// Rust variant name.
    pub ident: String,
    pub value: i64,
}

/// Closed set of integers on the wire, a fieldless `#[repr(i64)]` enum in Rust.
#[derive(Debug)]
pub struct IntEnumType {
    pub name: String,
    pub values: Vec<IntEnumValue>,
}

impl IntEnumType {
    pub fn new(name: String, values: Vec<(String, i64)>) -> Result<Self, SchemaError> {
        validate_type_name(&name)?;
        if values.is_empty() {
            return Err(SchemaError::EmptyEnum { name });
        }
        let mut idents = BTreeSet::new();
        let mut seen_values = BTreeSet::new();
        let mut out = Vec::with_capacity(values.len());
        for (label, value) in values {
            let ident = variant_ident(&name, &label, &mut idents)?;
            if value < 0 || !seen_values.insert(value) {
                return Err(SchemaError::InvalidEnumValue { name, label, value });
            }
            out.push(IntEnumValue { label, ident, value });
        }
        Ok(Self { name, values: out })
    }

    pub fn protocol_type(&self) -> String {
        self.values.iter().map(|v| v.value.to_string()).collect::<Vec<_>>().join(" | ")
    }

    pub fn by_value(&self, value: i64) -> Option<&IntEnumValue> {
        self.values.iter().find(|v| v.value == value)
    }

    pub fn by_label(&self, label: &str) -> Option<&IntEnumValue> {
        self.values.iter().find(|v| v.label == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringEnumValue {
    pub label: String,
    /// Rust variant name.
    pub ident: String,
    /// The string on the wire.
    pub wire: String,
}

/// Closed set of strings on the wire, a fieldless enum in Rust.
#[derive(Debug)]
pub struct StringEnumType {
    pub name: String,
    pub values: Vec<StringEnumValue>,
}

impl StringEnumType {
    pub fn new(name: String, values: Vec<(String, String)>) -> Result<Self, SchemaError> {
        validate_type_name(&name)?;
        if values.is_empty() {
            return Err(SchemaError::EmptyEnum { name });
        }
        let mut idents = BTreeSet::new();
        let mut wires = BTreeSet::new();
        let mut out = Vec::with_capacity(values.len());
        for (label, wire) in values {
            let ident = variant_ident(&name, &label, &mut idents)?;
            if !wires.insert(wire.clone()) {
                return Err(SchemaError::DuplicateEnumLabel { name, label: wire });
            }
            out.push(StringEnumValue { label, ident, wire });
        }
        Ok(Self { name, values: out })
    }

    pub fn protocol_type(&self) -> String {
        self.values.iter().map(|v| format!("\"{}\"", v.wire)).collect::<Vec<_>>().join(" | ")
    }

    pub fn by_wire(&self, wire: &str) -> Option<&StringEnumValue> {
        self.values.iter().find(|v| v.wire == wire)
    }

    pub fn by_label(&self, label: &str) -> Option<&StringEnumValue> {
        self.values.iter().find(|v| v.label == label)
    }

    /// Path of the variant for a wire string, e.g. `MarkupKind::Markdown`.
    pub fn variant_path(&self, wire: &str) -> Result<String, SchemaError> {
        match self.by_wire(wire) {
            Some(v) => Ok(format!("{}::{}", self.name, v.ident)),
            None => Err(SchemaError::UnknownDiscriminantTag { name: self.name.clone(), tag: wire.to_owned() }),
        }
    }
}

// `textDocument/didOpen` => `TextDocumentDidOpen`, `$/cancelRequest` => `CancelRequest`
fn variant_ident(enum_name: &str, label: &str, seen: &mut BTreeSet<String>) -> Result<String, SchemaError> {
    let ident = label.to_upper_camel_case();
    validate_variant_name(&ident)?;
    if !seen.insert(ident.clone()) {
        return Err(SchemaError::DuplicateEnumLabel { name: enum_name.to_owned(), label: label.to_owned() });
    }
    Ok(ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_become_variants() {
        let e = StringEnumType::new(
            "Method".into(),
            vec![
                ("textDocument/didOpen".into(), "textDocument/didOpen".into()),
                ("$/cancelRequest".into(), "$/cancelRequest".into()),
            ],
        )
        .unwrap();
        assert_eq!(e.values[0].ident, "TextDocumentDidOpen");
        assert_eq!(e.values[1].ident, "CancelRequest");
        assert_eq!(e.variant_path("$/cancelRequest").unwrap(), "Method::CancelRequest");
        assert!(matches!(e.variant_path("exit"), Err(SchemaError::UnknownDiscriminantTag { .. })));
    }

    #[test]
    fn labels_must_stay_distinct_after_case_conversion() {
        let err = StringEnumType::new("K".into(), vec![("a_b".into(), "a_b".into()), ("aB".into(), "aB".into())])
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateEnumLabel { .. }));
    }

    #[test]
    fn int_values_are_unique_and_non_negative() {
        let dup = IntEnumType::new("Level".into(), vec![("Low".into(), 0), ("High".into(), 0)]);
        assert!(matches!(dup, Err(SchemaError::InvalidEnumValue { value: 0, .. })));
        let negative = IntEnumType::new("Level".into(), vec![("Low".into(), -1)]);
        assert!(negative.is_err());
        let ok = IntEnumType::new("Level".into(), vec![("Low".into(), 0), ("High".into(), 1)]).unwrap();
        assert_eq!(ok.protocol_type(), "0 | 1");
        assert_eq!(ok.by_value(1).unwrap().ident, "High");
    }

    #[test]
    fn empty_enums_are_rejected() {
        assert_eq!(
            StringEnumType::new("Nothing".into(), Vec::new()).unwrap_err(),
            SchemaError::EmptyEnum { name: "Nothing".into() }
        );
    }
}
