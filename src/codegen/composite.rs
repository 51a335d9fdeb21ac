use crate::error::SchemaError;
use crate::ir::TypeNode;
use super::{emit_from_json_value, emit_to_json_value, lit, Assign, CodeWriter};

pub(super) fn decode_array(
    element: &TypeNode,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    let field = lit(field_name);
    let unwrapped = out.fresh("unwrapped");
    let elements = out.fresh("elements");
    let items = out.fresh("items");
    let item = out.fresh("element");
    let maybe_item = out.fresh("maybe_element");

    out.line("{");
    out.line(format!("let {unwrapped} = assert_json_field({from}, {field})?;"));
    out.line(format!("let Some({elements}) = {unwrapped}.as_array() else {{"));
    out.line(format!("return Err(WireError::wrong_shape({field}, \"array\", {unwrapped}));"));
    out.line("};");
    out.line(format!("let mut {items}: Vec<{}> = Vec::with_capacity({elements}.len());", element.target_type()));
    out.line(format!("for {item} in {elements} {{"));
    out.line(format!("let {maybe_item} = Some({item});"));
    let push = |out: &mut CodeWriter, expr: &str| out.line(format!("{items}.push({expr});"));
    emit_from_json_value(element, out, &maybe_item, &push, field_name)?;
    out.line("}");
    assign(out, &items);
    out.line("}");
    Ok(())
}

pub(super) fn encode_array(
    element: &TypeNode,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    let items = out.fresh("items");
    let item = out.fresh("element");

    out.line("{");
    out.line(format!("let mut {items}: Vec<Value> = Vec::with_capacity({from}.len());"));
    out.line(format!("for {item} in {from}.iter() {{"));
    let push = |out: &mut CodeWriter, expr: &str| out.line(format!("{items}.push({expr});"));
    emit_to_json_value(element, out, &format!("(*{item})"), &push, field_name)?;
    out.line("}");
    assign(out, &format!("Value::Array({items})"));
    out.line("}");
    Ok(())
}

pub(super) fn decode_optional(
    inner: &TypeNode,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    out.line(format!("if {from}.is_some_and(|v| !v.is_null()) {{"));
    let wrap = |out: &mut CodeWriter, expr: &str| assign(out, &format!("Some({expr})"));
    emit_from_json_value(inner, out, from, &wrap, field_name)?;
    out.line("} else {");
    assign(out, &format!("Option::<{}>::None", inner.target_type()));
    out.line("}");
    Ok(())
}

/// `None` assigns nothing, so the member is left out of the encoded object.
pub(super) fn encode_optional(
    inner: &TypeNode,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    let held = out.fresh("inner");
    out.line(format!("if let Some({held}) = &{from} {{"));
    emit_to_json_value(inner, out, &format!("(*{held})"), assign, field_name)?;
    out.line("}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_encode_element_wise() {
        let mut out = CodeWriter::new();
        let assign = |out: &mut CodeWriter, expr: &str| out.line(format!("y = {expr};"));
        encode_array(&TypeNode::Int, &mut out, "self.ids", &assign, "T.ids").unwrap();
        assert_eq!(
            out.as_str(),
            "{\n    let mut items_0: Vec<Value> = Vec::with_capacity(self.ids.len());\n    \
             for element_1 in self.ids.iter() {\n        items_0.push(Value::from((*element_1)));\n    }\n    \
             y = Value::Array(items_0);\n}\n"
        );
    }

    #[test]
    fn arrays_reject_other_shapes() {
        let mut out = CodeWriter::new();
        let assign = |out: &mut CodeWriter, expr: &str| out.line(format!("x = {expr};"));
        decode_array(&TypeNode::String, &mut out, "json_xs", &assign, "T.xs").unwrap();
        let code = out.into_string();
        assert!(code.contains("let Some(elements_1) = unwrapped_0.as_array() else {"));
        assert!(code.contains("return Err(WireError::wrong_shape(\"T.xs\", \"array\", unwrapped_0));"));
        assert!(code.contains("items_2.push(try_convert_to_string(maybe_element_4, \"T.xs\")?);"));
    }
}
