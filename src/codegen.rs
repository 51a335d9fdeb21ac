// Rust code generation from the type-node IR.
//
// Every kind knows how to expand into a decode fragment (`Option<&Value>` in, typed
// value out) and an encode fragment (borrowed typed value in, owned `Value` out). The
// expansions nest: an array emits its element's expansion inside its loop, an object
// emits one expansion per field. `Codegen` owns the two output streams and emits each
// named type (objects and enums) exactly once.
mod class;
mod composite;
mod leaf;
mod variant;
pub mod writer;

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::SchemaError;
use crate::ir::{TypeNode, TypeRef};
pub use writer::CodeWriter;

/// Binds an expression produced by an emitter: `req_x = <expr>;`, `items.push(<expr>);`,
/// `return Ok(<expr>);` and so on.
pub type Assign<'a> = &'a dyn Fn(&mut CodeWriter, &str);

/// A string literal for `text`, with Rust escapes.
pub(crate) fn lit(text: &str) -> String {
    format!("{text:?}")
}

/// Expands decoding of `from` (an `Option<&Value>` expression) as `node`.
pub fn emit_from_json_value(
    node: &TypeNode,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    match node {
        TypeNode::Null
        | TypeNode::Bool
        | TypeNode::Int
        | TypeNode::Double
        | TypeNode::String
        | TypeNode::StringConstant(_) => leaf::decode(node, out, from, assign, field_name),
        TypeNode::IntEnum(e) => leaf::decode_int_enum(e, out, from, assign, field_name),
        TypeNode::StringEnum(e) => leaf::decode_string_enum(e, out, from, assign, field_name),
        TypeNode::Object(o) => leaf::decode_object(o, out, from, assign, field_name),
        TypeNode::Array(element) => composite::decode_array(element, out, from, assign, field_name)?,
        TypeNode::Optional(inner) => composite::decode_optional(inner, out, from, assign, field_name)?,
        TypeNode::BasicVariant(v) => variant::decode_basic(v, out, from, assign, field_name)?,
        TypeNode::DiscriminatedUnion(v) => variant::decode_union(v, out, from, assign, field_name)?,
    }
    Ok(())
}

/// Expands encoding of the place expression `from` as `node`.
pub fn emit_to_json_value(
    node: &TypeNode,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    match node {
        TypeNode::Null
        | TypeNode::Bool
        | TypeNode::Int
        | TypeNode::Double
        | TypeNode::String
        | TypeNode::StringConstant(_) => leaf::encode(node, out, from, assign, field_name),
        TypeNode::IntEnum(_) => assign(out, &format!("Value::from({from}.wire_int())")),
        TypeNode::StringEnum(_) => assign(out, &format!("Value::String({from}.as_wire_str().to_owned())")),
        TypeNode::Object(_) => assign(out, &format!("{from}.to_json_value()?")),
        TypeNode::Array(element) => composite::encode_array(element, out, from, assign, field_name)?,
        TypeNode::Optional(inner) => composite::encode_optional(inner, out, from, assign, field_name)?,
        TypeNode::BasicVariant(v) => variant::encode_basic(v, out, from, assign, field_name)?,
        TypeNode::DiscriminatedUnion(v) => variant::encode_union(v, out, from, assign, field_name)?,
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATOR
// ————————————————————————————————————————————————————————————————————————————

/// The two output streams. Both belong in the same Rust module, after [`prelude`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedCode {
    pub declarations: String,
    pub definitions: String,
}

impl GeneratedCode {
    pub fn combined(&self, runtime_path: &str) -> String {
        format!("{}\n{}\n{}", prelude(runtime_path), self.declarations, self.definitions)
    }
}

/// Header for a file holding generated code.
pub fn prelude(runtime_path: &str) -> String {
    format!(
        "// @generated by json-msggen. Do not edit.\n#![allow(dead_code, clippy::all)]\n\nuse {runtime_path}::*;\n"
    )
}

#[derive(Debug, Default)]
pub struct Codegen {
    declarations: CodeWriter,
    definitions: CodeWriter,
    emitted: BTreeMap<String, TypeRef>,
}

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits the declaration and definition of a named type.
    ///
    /// Returns `false` when this very node was already emitted. Objects are sealed
    /// first; on error nothing reaches the output streams.
    pub fn emit(&mut self, node: &TypeRef) -> Result<bool, SchemaError> {
        let Some(name) = node.class_name() else {
            return Err(SchemaError::NotEmittable { name: node.protocol_type() });
        };
        if let Some(previous) = self.emitted.get(name) {
            if Rc::ptr_eq(previous, node) {
                trace!(type_name = %name, "already emitted");
                return Ok(false);
            }
            return Err(SchemaError::ConflictingTypeName { name: name.to_owned() });
        }

        let mut declaration = CodeWriter::new();
        let mut definition = CodeWriter::new();
        match node.as_ref() {
            TypeNode::IntEnum(e) => class::int_enum(e, &mut declaration, &mut definition),
            TypeNode::StringEnum(e) => class::string_enum(e, &mut declaration, &mut definition),
            TypeNode::Object(o) => class::object(o, &mut declaration, &mut definition)?,
            _ => unreachable!("class_name() is only set for enums and objects"),
        }
        debug!(type_name = %name, kind = ?node.protocol_kind(), "emitted");

        self.declarations.append(declaration);
        self.declarations.blank();
        self.definitions.append(definition);
        self.definitions.blank();
        self.emitted.insert(name.to_owned(), node.clone());
        Ok(true)
    }

    /// Emits every named type reachable from `roots`, dependencies first.
    /// Returns how many types were newly emitted.
    pub fn emit_all<'a>(&mut self, roots: impl IntoIterator<Item = &'a TypeRef>) -> Result<usize, SchemaError> {
        let mut order = Vec::new();
        let mut visiting = BTreeMap::new();
        for root in roots {
            collect_named(root, &mut visiting, &mut order)?;
        }
        let mut count = 0;
        for node in &order {
            if self.emit(node)? {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn into_output(self) -> GeneratedCode {
        GeneratedCode { declarations: self.declarations.into_string(), definitions: self.definitions.into_string() }
    }
}

// Post-order walk; a name is entered once, which also cuts recursive objects. A name
// already bound to another node is a conflict.
fn collect_named(
    node: &TypeRef,
    visiting: &mut BTreeMap<String, TypeRef>,
    order: &mut Vec<TypeRef>,
) -> Result<(), SchemaError> {
    if let Some(name) = node.class_name() {
        if let Some(seen) = visiting.get(name) {
            if Rc::ptr_eq(seen, node) {
                return Ok(());
            }
            return Err(SchemaError::ConflictingTypeName { name: name.to_owned() });
        }
        visiting.insert(name.to_owned(), node.clone());
    }
    for child in node.children() {
        collect_named(&child, visiting, order)?;
    }
    if node.class_name().is_some() {
        order.push(node.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FieldDef;

    fn decode_snippet(node: &TypeRef, from: &str) -> String {
        let mut out = CodeWriter::new();
        let assign = |out: &mut CodeWriter, expr: &str| out.line(format!("x = {expr};"));
        emit_from_json_value(node, &mut out, from, &assign, "Foo.x").unwrap();
        out.into_string()
    }

    fn encode_snippet(node: &TypeRef, from: &str) -> String {
        let mut out = CodeWriter::new();
        let assign = |out: &mut CodeWriter, expr: &str| out.line(format!("y = {expr};"));
        emit_to_json_value(node, &mut out, from, &assign, "Foo.x").unwrap();
        out.into_string()
    }

    fn item() -> TypeRef {
        TypeNode::object(
            "Item",
            vec![
                FieldDef::new("id", TypeNode::int()).unwrap(),
                FieldDef::new("name", TypeNode::string()).unwrap(),
                FieldDef::new("tag", TypeNode::optional(TypeNode::string())).unwrap(),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn leaves_call_runtime_helpers() {
        assert_eq!(decode_snippet(&TypeNode::int(), "json_x"), "x = try_convert_to_int(json_x, \"Foo.x\")?;\n");
        assert_eq!(encode_snippet(&TypeNode::string(), "self.x"), "y = Value::String(self.x.clone());\n");
        assert_eq!(encode_snippet(&TypeNode::int(), "self.x"), "y = Value::from(self.x);\n");
    }

    #[test]
    fn optional_treats_null_as_absent() {
        let code = decode_snippet(&TypeNode::optional(TypeNode::bool()), "json_x");
        assert_eq!(
            code,
            "if json_x.is_some_and(|v| !v.is_null()) {\n    \
             x = Some(try_convert_to_bool(json_x, \"Foo.x\")?);\n\
             } else {\n    x = Option::<bool>::None;\n}\n"
        );
    }

    #[test]
    fn nested_arrays_get_distinct_temporaries() {
        let code = decode_snippet(&TypeNode::array(TypeNode::array(TypeNode::int())), "json_x");
        assert!(code.contains("let mut items_2: Vec<Vec<i64>>"));
        assert!(code.contains("let mut items_7: Vec<i64>"));
        assert!(code.contains("items_2.push(items_7);"));
    }

    #[test]
    fn objects_emit_both_streams() {
        let mut cg = Codegen::new();
        assert!(cg.emit(&item()).unwrap());
        let out = cg.into_output();
        assert!(out.declarations.starts_with("#[derive(Debug, Clone, PartialEq)]\npub struct Item {\n"));
        assert!(out.declarations.contains("    pub tag: Option<String>,\n"));
        assert!(out.definitions.contains("pub fn new(id: i64, name: String) -> Self {"));
        assert!(out.definitions.contains("let mut rv = Box::new(Item::new(req_id, req_name));"));
        assert!(out.definitions.contains("rv.insert(\"id\".to_owned(), Value::from(self.id));"));
    }

    #[test]
    fn emitting_twice_is_a_no_op_but_name_clashes_fail() {
        let node = item();
        let mut cg = Codegen::new();
        assert!(cg.emit(&node).unwrap());
        assert!(!cg.emit(&node).unwrap());
        assert_eq!(cg.emit(&item()).unwrap_err(), SchemaError::ConflictingTypeName { name: "Item".into() });
        assert_eq!(cg.emit(&TypeNode::int()).unwrap_err(), SchemaError::NotEmittable { name: "integer".into() });
    }

    #[test]
    fn distinct_nodes_sharing_a_name_fail_when_reached_from_roots() {
        let other_item = TypeNode::object("Item", vec![FieldDef::new("label", TypeNode::string()).unwrap()], Vec::new())
            .unwrap();
        let root = TypeNode::object(
            "Root",
            vec![FieldDef::new("a", item()).unwrap(), FieldDef::new("b", other_item).unwrap()],
            Vec::new(),
        )
        .unwrap();
        let mut cg = Codegen::new();
        assert_eq!(cg.emit_all([&root]).unwrap_err(), SchemaError::ConflictingTypeName { name: "Item".into() });
        assert_eq!(cg.into_output(), GeneratedCode::default());

        let shared = item();
        let pair = TypeNode::object(
            "Pair",
            vec![FieldDef::new("a", shared.clone()).unwrap(), FieldDef::new("b", shared).unwrap()],
            Vec::new(),
        )
        .unwrap();
        assert_eq!(Codegen::new().emit_all([&pair]).unwrap(), 2);
    }

    #[test]
    fn emission_seals_objects() {
        let node = item();
        Codegen::new().emit(&node).unwrap();
        let late = node.as_object().unwrap().add_field(FieldDef::new("extra", TypeNode::int()).unwrap());
        assert!(matches!(late, Err(SchemaError::SealedObject { .. })));
    }

    #[test]
    fn emit_all_puts_dependencies_first_and_handles_cycles() {
        let tree = TypeNode::object("Tree", Vec::new(), Vec::new()).unwrap();
        let level = TypeNode::int_enum("Level", [("Low", 0), ("High", 1)]).unwrap();
        let object = tree.as_object().unwrap();
        object.add_field(FieldDef::new("level", level).unwrap()).unwrap();
        object.add_field(FieldDef::new("children", TypeNode::array(tree.clone())).unwrap()).unwrap();

        let mut cg = Codegen::new();
        assert_eq!(cg.emit_all([&tree]).unwrap(), 2);
        let out = cg.into_output();
        let level_at = out.declarations.find("pub enum Level").unwrap();
        let tree_at = out.declarations.find("pub struct Tree").unwrap();
        assert!(level_at < tree_at);
        assert!(out.definitions.contains("Tree::from_json_value(assert_json_field(maybe_element_"));
    }

    #[test]
    fn output_is_deterministic() {
        let run = || {
            let mut cg = Codegen::new();
            cg.emit_all([&item()]).unwrap();
            cg.into_output()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn prelude_imports_the_runtime() {
        assert!(prelude("json_msggen::runtime").contains("use json_msggen::runtime::*;"));
    }
}
