use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::codegen::{Codegen, GeneratedCode};
use crate::description::{Composite, Description, Primitive, Sample, TypeDecl, TypeExpr};
use crate::error::SchemaError;
use crate::ir::{FieldDef, ObjectType, TypeNode, TypeRef};

/// A lowered description: named types, the ones to emit, and the samples to check.
#[derive(Debug)]
pub struct Schema {
    pub types: IndexMap<String, TypeRef>,
    pub roots: Vec<TypeRef>,
    pub samples: Vec<Sample>,
}

impl Schema {
    pub fn get(&self, name: &str) -> Result<&TypeRef, SchemaError> {
        self.types.get(name).ok_or_else(|| SchemaError::UnknownTypeReference { name: name.to_owned() })
    }

    /// Runs the generator over every root.
    pub fn generate(&self) -> Result<GeneratedCode, SchemaError> {
        let mut cg = Codegen::new();
        let emitted = cg.emit_all(&self.roots)?;
        debug!(roots = self.roots.len(), emitted, "generated");
        Ok(cg.into_output())
    }
}

/// Named types are created first (objects still empty), fields are attached second,
/// so objects may refer to each other and to themselves.
pub fn lower(description: &Description) -> Result<Schema, SchemaError> {
    let mut types: IndexMap<String, TypeRef> = IndexMap::new();

    // 1) shells
    for decl in &description.types {
        let node = match decl {
            TypeDecl::IntEnum { name, values } => {
                TypeNode::int_enum(name.clone(), values.iter().map(|(label, value)| (label.clone(), *value)))?
            }
            TypeDecl::StringEnum { name, values } => {
                TypeNode::string_enum_with_labels(name.clone(), values.iter().map(|v| v.label_and_wire()).collect())?
            }
            TypeDecl::Object { name, extra, .. } => TypeNode::object(name.clone(), Vec::new(), extra.clone())?,
        };
        if types.insert(decl.name().to_owned(), node).is_some() {
            return Err(SchemaError::ConflictingTypeName { name: decl.name().to_owned() });
        }
    }

    // 2) object fields
    for decl in &description.types {
        let TypeDecl::Object { name, fields, .. } = decl else { continue };
        let object = types[name.as_str()].as_object().ok_or_else(|| SchemaError::NotEmittable { name: name.clone() })?;
        for field in fields {
            let ty = resolve(&field.ty, &types, object)?;
            let def = match &field.rename {
                Some(target) => FieldDef::renamed(field.name.clone(), target.clone(), ty)?,
                None => FieldDef::new(field.name.clone(), ty)?,
            };
            trace!(object = %name, field = %def.target_name, ty = %def.ty.target_type(), "field");
            object.add_field(def)?;
        }
    }
    for node in types.values() {
        if let Some(object) = node.as_object() {
            object.check_discriminant_scope()?;
        }
    }

    let roots = match &description.emit {
        Some(names) => names
            .iter()
            .map(|name| types.get(name).cloned().ok_or_else(|| SchemaError::UnknownTypeReference { name: name.clone() }))
            .collect::<Result<Vec<_>, _>>()?,
        None => types.values().cloned().collect(),
    };
    debug!(types = types.len(), roots = roots.len(), samples = description.samples.len(), "lowered description");
    Ok(Schema { types, roots, samples: description.samples.clone() })
}

fn resolve(expr: &TypeExpr, types: &IndexMap<String, TypeRef>, object: &ObjectType) -> Result<TypeRef, SchemaError> {
    let node = match expr {
        TypeExpr::Primitive(Primitive::Null) => TypeNode::null(),
        TypeExpr::Primitive(Primitive::Bool) => TypeNode::bool(),
        TypeExpr::Primitive(Primitive::Int) => TypeNode::int(),
        TypeExpr::Primitive(Primitive::Double) => TypeNode::double(),
        TypeExpr::Primitive(Primitive::String) => TypeNode::string(),
        TypeExpr::Composite(Composite::Constant(value)) => TypeNode::string_constant(value.clone()),
        TypeExpr::Composite(Composite::Array(element)) => TypeNode::array(resolve(element, types, object)?),
        TypeExpr::Composite(Composite::Optional(inner)) => TypeNode::optional(resolve(inner, types, object)?),
        TypeExpr::Composite(Composite::Ref(name)) => types
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownTypeReference { name: name.clone() })?,
        TypeExpr::Composite(Composite::Variant { alternatives, fallthrough }) => {
            let alternatives = alternatives.iter().map(|a| resolve(a, types, object)).collect::<Result<Vec<_>, _>>()?;
            TypeNode::basic_variant(alternatives, *fallthrough)?
        }
        TypeExpr::Composite(Composite::Union { discriminant, variants }) => {
            // The discriminant is an earlier field of the object being lowered.
            let Some(field) = object.field(discriminant) else {
                return Err(SchemaError::DiscriminantNotInScope {
                    object: object.name().to_owned(),
                    field: format!("<union on {discriminant}>"),
                    discriminant: discriminant.clone(),
                });
            };
            let by_tag = variants
                .iter()
                .map(|(tag, ty)| -> Result<(String, TypeRef), SchemaError> { Ok((tag.clone(), resolve(ty, types, object)?)) })
                .collect::<Result<Vec<_>, _>>()?;
            TypeNode::discriminated_union(field, by_tag)?
        }
    };
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_de::from_str_with_path;

    const MESSAGE: &str = r#"{
        "types": [
            { "kind": "string_enum", "name": "Kind", "values": ["a", "b"] },
            { "kind": "object", "name": "Msg", "fields": [
                { "name": "kind", "type": { "ref": "Kind" } },
                { "name": "id", "type": "int" },
                { "name": "params", "rename": "payload",
                  "type": { "union": { "discriminant": "kind", "variants": { "a": "int", "b": "string" } } } },
                { "name": "tag", "type": { "optional": "string" } }
            ] }
        ],
        "emit": ["Msg"]
    }"#;

    fn lowered(src: &str) -> Result<Schema, SchemaError> {
        lower(&from_str_with_path::<Description>(src).unwrap())
    }

    #[test]
    fn lowers_and_generates() {
        let schema = lowered(MESSAGE).unwrap();
        assert_eq!(schema.roots.len(), 1);
        let msg = schema.get("Msg").unwrap().as_object().unwrap();
        let payload = msg.field("payload").unwrap();
        assert_eq!(payload.protocol_name, "params");
        assert_eq!(payload.ty.target_type(), "OneOf2<i64, String>");

        let out = schema.generate().unwrap();
        assert!(out.declarations.contains("pub enum Kind {"));
        assert!(out.declarations.contains("pub payload: OneOf2<i64, String>,"));
        assert!(out.definitions.contains("let json_payload = maybe_get_json_field(val, \"params\");"));
    }

    #[test]
    fn objects_can_refer_to_themselves() {
        let schema = lowered(
            r#"{"types": [{"kind": "object", "name": "Tree", "fields": [
                {"name": "children", "type": {"array": {"ref": "Tree"}}}]}]}"#,
        )
        .unwrap();
        let tree = schema.get("Tree").unwrap();
        let children = tree.as_object().unwrap().field("children").unwrap();
        let TypeNode::Array(element) = children.ty.as_ref() else { panic!("not an array") };
        assert!(std::rc::Rc::ptr_eq(element, tree));
    }

    #[test]
    fn unknown_references_fail() {
        let err = lowered(r#"{"types": [{"kind": "object", "name": "A", "fields": [{"name": "b", "type": {"ref": "B"}}]}]}"#)
            .unwrap_err();
        assert_eq!(err, SchemaError::UnknownTypeReference { name: "B".into() });
    }

    #[test]
    fn duplicate_names_fail() {
        let err = lowered(
            r#"{"types": [{"kind": "string_enum", "name": "A", "values": ["x"]},
                          {"kind": "object", "name": "A", "fields": []}]}"#,
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::ConflictingTypeName { name: "A".into() });
    }

    #[test]
    fn union_discriminant_must_be_declared_first() {
        let err = lowered(
            r#"{"types": [
                {"kind": "string_enum", "name": "Kind", "values": ["a"]},
                {"kind": "object", "name": "Msg", "fields": [
                    {"name": "params", "type": {"union": {"discriminant": "kind", "variants": {"a": "int"}}}},
                    {"name": "kind", "type": {"ref": "Kind"}}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DiscriminantNotInScope { .. }));
    }
}
