//! Standalone declarations: enums and objects.
use std::rc::Rc;

use crate::error::SchemaError;
use crate::ir::{FieldDef, IntEnumType, ObjectType, StringEnumType};
use super::{emit_from_json_value, emit_to_json_value, lit, CodeWriter};

// Generated `match`es keep a catch-all arm even when every variant is covered.
const DEFINITION_LINTS: &str = "#[allow(unreachable_code, unreachable_patterns, irrefutable_let_patterns, \
                                unused_mut, unused_parens, unused_variables, clippy::all)]";

// ————————————————————————————————————————————————————————————————————————————
// ENUMS
// ————————————————————————————————————————————————————————————————————————————

pub(super) fn int_enum(e: &IntEnumType, decl: &mut CodeWriter, def: &mut CodeWriter) {
    decl.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
    decl.line("#[repr(i64)]");
    decl.line(format!("pub enum {} {{", e.name));
    for v in &e.values {
        decl.line(format!("{} = {},", v.ident, v.value));
    }
    decl.line("}");

    def.line(format!("impl {} {{", e.name));
    def.line("pub fn from_wire_int(value: i64) -> Result<Self, WireError> {");
    def.line("match value {");
    for v in &e.values {
        def.line(format!("{} => Ok({}::{}),", v.value, e.name, v.ident));
    }
    def.line(format!("_ => Err(WireError::invalid_enum_value({}, value)),", lit(&e.name)));
    def.line("}");
    def.line("}");
    def.blank();
    def.line("pub fn wire_int(self) -> i64 {");
    def.line("self as i64");
    def.line("}");
    def.line("}");
}

pub(super) fn string_enum(e: &StringEnumType, decl: &mut CodeWriter, def: &mut CodeWriter) {
    decl.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
    decl.line(format!("pub enum {} {{", e.name));
    for v in &e.values {
        decl.line(format!("{},", v.ident));
    }
    decl.line("}");

    def.line(format!("impl {} {{", e.name));
    def.line("pub fn from_wire_str(value: &str) -> Result<Self, WireError> {");
    def.line("match value {");
    for v in &e.values {
        def.line(format!("{} => Ok({}::{}),", lit(&v.wire), e.name, v.ident));
    }
    def.line(format!("_ => Err(WireError::unknown_enum_string({}, value)),", lit(&e.name)));
    def.line("}");
    def.line("}");
    def.blank();
    def.line("pub fn as_wire_str(self) -> &'static str {");
    def.line("match self {");
    for v in &e.values {
        def.line(format!("{}::{} => {},", e.name, v.ident, lit(&v.wire)));
    }
    def.line("}");
    def.line("}");
    def.line("}");
}

// ————————————————————————————————————————————————————————————————————————————
// OBJECTS
// ————————————————————————————————————————————————————————————————————————————

pub(super) fn object(o: &ObjectType, decl: &mut CodeWriter, def: &mut CodeWriter) -> Result<(), SchemaError> {
    o.check_discriminant_scope()?;
    let name = o.name();
    let fields = o.seal();
    let required = o.required_fields();

    decl.line("#[derive(Debug, Clone, PartialEq)]");
    decl.line(format!("pub struct {name} {{"));
    for field in fields.iter() {
        decl.line(format!("pub {}: {},", field.ident(), field.ty.target_type()));
    }
    decl.line("}");
    if !o.extra_members().is_empty() {
        decl.blank();
        decl.line(format!("impl {name} {{"));
        for (i, member) in o.extra_members().iter().enumerate() {
            if i > 0 {
                decl.blank();
            }
            decl.lines(member);
        }
        decl.line("}");
    }

    def.line(DEFINITION_LINTS);
    def.line(format!("impl {name} {{"));
    emit_new(o, &fields, def);
    def.blank();
    emit_from_json(o, &fields, &required, def)?;
    def.blank();
    emit_to_json(o, &fields, def)?;
    def.line("}");
    Ok(())
}

fn emit_new(o: &ObjectType, fields: &[Rc<FieldDef>], def: &mut CodeWriter) {
    let params: Vec<String> = fields
        .iter()
        .filter(|f| !f.is_optional())
        .map(|f| format!("{}: {}", f.ident(), f.ty.target_type()))
        .collect();
    let inits: Vec<String> = fields
        .iter()
        .map(|f| if f.is_optional() { format!("{}: None", f.ident()) } else { f.ident() })
        .collect();
    def.line(format!("pub fn new({}) -> Self {{", params.join(", ")));
    if inits.is_empty() {
        def.line("Self {}");
    } else {
        def.line(format!("Self {{ {} }}", inits.join(", ")));
    }
    def.line("}");
    tracing::trace!(object = %o.name(), params = params.len(), "constructor");
}

fn emit_from_json(
    o: &ObjectType,
    fields: &[Rc<FieldDef>],
    required: &[Rc<FieldDef>],
    def: &mut CodeWriter,
) -> Result<(), SchemaError> {
    let name = o.name();
    def.line(format!("pub fn from_json_value(val: &Value, field_name: &str) -> Result<Box<{name}>, WireError> {{"));
    def.line("if !val.is_object() {");
    def.line("return Err(WireError::wrong_shape(field_name, \"object\", val));");
    def.line("}");
    for field in required {
        let json = format!("json_{}", field.target_name);
        let local = format!("req_{}", field.target_name);
        def.line(format!("let {json} = maybe_get_json_field(val, {});", lit(&field.protocol_name)));
        def.line(format!("let {local}: {};", field.ty.target_type()));
        let assign = |out: &mut CodeWriter, expr: &str| out.line(format!("{local} = {expr};"));
        emit_from_json_value(&field.ty, def, &json, &assign, &diagnostic_name(o, field))?;
    }
    let args: Vec<String> = required.iter().map(|f| format!("req_{}", f.target_name)).collect();
    def.line(format!("let mut rv = Box::new({name}::new({}));", args.join(", ")));
    for field in fields.iter().filter(|f| f.is_optional()) {
        let json = format!("json_{}", field.target_name);
        let member = format!("rv.{}", field.ident());
        def.line(format!("let {json} = maybe_get_json_field(val, {});", lit(&field.protocol_name)));
        let assign = |out: &mut CodeWriter, expr: &str| out.line(format!("{member} = {expr};"));
        emit_from_json_value(&field.ty, def, &json, &assign, &diagnostic_name(o, field))?;
    }
    def.line("Ok(rv)");
    def.line("}");
    Ok(())
}

fn emit_to_json(o: &ObjectType, fields: &[Rc<FieldDef>], def: &mut CodeWriter) -> Result<(), SchemaError> {
    def.line("pub fn to_json_value(&self) -> Result<Value, WireError> {");
    def.line("let mut rv = Map::new();");
    for field in fields {
        let key = lit(&field.protocol_name);
        let assign = |out: &mut CodeWriter, expr: &str| out.line(format!("rv.insert({key}.to_owned(), {expr});"));
        let place = format!("self.{}", field.ident());
        emit_to_json_value(&field.ty, def, &place, &assign, &diagnostic_name(o, field))?;
    }
    def.line("Ok(Value::Object(rv))");
    def.line("}");
    Ok(())
}

fn diagnostic_name(o: &ObjectType, field: &FieldDef) -> String {
    format!("{}.{}", o.name(), field.target_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{TypeNode, TypeRef};

    fn message(kind_first: bool) -> TypeRef {
        let kind = FieldDef::new("kind", TypeNode::string_enum("Kind", ["a", "b"]).unwrap()).unwrap();
        let union = TypeNode::discriminated_union(
            kind.clone(),
            vec![("a".into(), TypeNode::int()), ("b".into(), TypeNode::string())],
        )
        .unwrap();
        let params = FieldDef::new("params", union).unwrap();
        let fields = if kind_first { vec![kind, params] } else { vec![params, kind] };
        TypeNode::object("Msg", fields, Vec::new()).unwrap()
    }

    fn render(node: &TypeRef) -> Result<(String, String), SchemaError> {
        let mut decl = CodeWriter::new();
        let mut def = CodeWriter::new();
        object(node.as_object().unwrap(), &mut decl, &mut def)?;
        Ok((decl.into_string(), def.into_string()))
    }

    #[test]
    fn string_enums_map_both_ways() {
        let node = TypeNode::string_enum("Kind", ["a", "b-c"]).unwrap();
        let TypeNode::StringEnum(e) = node.as_ref() else { unreachable!() };
        let mut decl = CodeWriter::new();
        let mut def = CodeWriter::new();
        string_enum(e, &mut decl, &mut def);
        assert_eq!(
            decl.as_str(),
            "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\npub enum Kind {\n    A,\n    BC,\n}\n"
        );
        assert!(def.as_str().contains("            \"b-c\" => Ok(Kind::BC),\n"));
        assert!(def.as_str().contains("            Kind::BC => \"b-c\",\n"));
        assert!(def.as_str().contains("_ => Err(WireError::unknown_enum_string(\"Kind\", value)),"));
    }

    #[test]
    fn int_enums_keep_their_values() {
        let node = TypeNode::int_enum("Level", [("Low", 0), ("High", 5)]).unwrap();
        let TypeNode::IntEnum(e) = node.as_ref() else { unreachable!() };
        let mut decl = CodeWriter::new();
        let mut def = CodeWriter::new();
        int_enum(e, &mut decl, &mut def);
        assert!(decl.as_str().contains("    High = 5,\n"));
        assert!(def.as_str().contains("5 => Ok(Level::High),"));
    }

    #[test]
    fn union_reads_the_decoded_discriminant() {
        let (_, def) = render(&message(true)).unwrap();
        assert!(def.contains("match req_kind {"));
        assert!(def.contains("Kind::B => {"));
        assert!(def.contains("req_params = OneOf2::B(try_convert_to_string(json_params, \"Msg.params\")?);"));
    }

    #[test]
    fn discriminant_after_a_required_union_is_out_of_scope() {
        assert_eq!(
            render(&message(false)).unwrap_err(),
            SchemaError::DiscriminantNotInScope {
                object: "Msg".into(),
                field: "params".into(),
                discriminant: "kind".into()
            }
        );
    }

    #[test]
    fn keyword_fields_are_raw_in_rust_and_plain_on_the_wire() {
        let node = TypeNode::object("Doc", vec![FieldDef::new("type", TypeNode::string()).unwrap()], Vec::new())
            .unwrap();
        let (decl, def) = render(&node).unwrap();
        assert!(decl.contains("pub r#type: String,"));
        assert!(def.contains("let json_type = maybe_get_json_field(val, \"type\");"));
        assert!(def.contains("Self { r#type }"));
        assert!(def.contains("rv.insert(\"type\".to_owned(), Value::String(self.r#type.clone()));"));
    }

    #[test]
    fn extra_members_land_in_the_declaration() {
        let node = TypeNode::object(
            "Pos",
            vec![FieldDef::new("line", TypeNode::int()).unwrap()],
            vec!["pub fn is_origin(&self) -> bool {\nself.line == 0\n}".into()],
        )
        .unwrap();
        let (decl, _) = render(&node).unwrap();
        assert!(decl.contains("impl Pos {\n    pub fn is_origin(&self) -> bool {\n        self.line == 0\n    }\n}\n"));
    }
}
