use crate::ir::{IntEnumType, ObjectType, StringEnumType, TypeNode};
use super::{lit, Assign, CodeWriter};

pub(super) fn decode(node: &TypeNode, out: &mut CodeWriter, from: &str, assign: Assign<'_>, field_name: &str) {
    let field = lit(field_name);
    let expr = match node {
        TypeNode::Null => format!("try_convert_to_null({from}, {field})?"),
        TypeNode::Bool => format!("try_convert_to_bool({from}, {field})?"),
        TypeNode::Int => format!("try_convert_to_int({from}, {field})?"),
        TypeNode::Double => format!("try_convert_to_double({from}, {field})?"),
        TypeNode::String => format!("try_convert_to_string({from}, {field})?"),
        TypeNode::StringConstant(value) => {
            format!("try_convert_to_string_constant({from}, {}, {field})?", lit(value))
        }
        _ => unreachable!("not a leaf: {}", node.protocol_type()),
    };
    assign(out, &expr);
}

pub(super) fn encode(node: &TypeNode, out: &mut CodeWriter, from: &str, assign: Assign<'_>, field_name: &str) {
    let owned = if node.want_move() { format!("{from}.clone()") } else { from.to_owned() };
    let expr = match node {
        TypeNode::Null => "Value::Null".to_owned(),
        TypeNode::Bool => format!("Value::Bool({owned})"),
        TypeNode::Int | TypeNode::Double => format!("Value::from({owned})"),
        TypeNode::String => format!("Value::String({owned})"),
        TypeNode::StringConstant(value) => {
            out.line(format!("check_string_constant(&{from}, {}, {})?;", lit(value), lit(field_name)));
            format!("Value::String({owned})")
        }
        _ => unreachable!("not a leaf: {}", node.protocol_type()),
    };
    assign(out, &expr);
}

pub(super) fn decode_int_enum(
    e: &IntEnumType,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) {
    assign(out, &format!("{}::from_wire_int(try_convert_to_int({from}, {})?)?", e.name, lit(field_name)));
}

pub(super) fn decode_string_enum(
    e: &StringEnumType,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) {
    assign(out, &format!("{}::from_wire_str(try_convert_to_str({from}, {})?)?", e.name, lit(field_name)));
}

pub(super) fn decode_object(o: &ObjectType, out: &mut CodeWriter, from: &str, assign: Assign<'_>, field_name: &str) {
    let field = lit(field_name);
    assign(out, &format!("{}::from_json_value(assert_json_field({from}, {field})?, {field})?", o.name()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(node: &TypeNode) -> String {
        let mut out = CodeWriter::new();
        encode(node, &mut out, "self.v", &|out: &mut CodeWriter, expr: &str| out.line(format!("y = {expr};")), "T.v");
        out.into_string()
    }

    #[test]
    fn constants_are_checked_before_encoding() {
        assert_eq!(
            encoded(&TypeNode::StringConstant("2.0".into())),
            "check_string_constant(&self.v, \"2.0\", \"T.v\")?;\ny = Value::String(self.v.clone());\n"
        );
    }

    #[test]
    fn null_ignores_the_place() {
        assert_eq!(encoded(&TypeNode::Null), "y = Value::Null;\n");
        assert_eq!(encoded(&TypeNode::Double), "y = Value::from(self.v);\n");
    }

    #[test]
    fn field_names_are_escaped() {
        let mut out = CodeWriter::new();
        decode(&TypeNode::Int, &mut out, "json_x", &|out: &mut CodeWriter, expr: &str| out.line(expr), "a\"b");
        assert_eq!(out.as_str(), "try_convert_to_int(json_x, \"a\\\"b\")?\n");
    }
}
