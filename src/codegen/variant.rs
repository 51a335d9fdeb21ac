use crate::error::SchemaError;
use crate::ir::{BasicVariantType, DiscriminatedUnionType};
use super::{emit_from_json_value, emit_to_json_value, lit, Assign, CodeWriter};

// ————————————————————————————————————————————————————————————————————————————
// BASIC VARIANT
// ————————————————————————————————————————————————————————————————————————————

pub(super) fn decode_basic(
    v: &BasicVariantType,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    if v.allow_fallthrough {
        decode_by_trial(v, out, from, assign, field_name)
    } else {
        decode_by_shape(v, out, from, assign, field_name)
    }
}

// One look at the wire value, then the alternative of that kind.
fn decode_by_shape(
    v: &BasicVariantType,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    let field = lit(field_name);
    let unwrapped = out.fresh("unwrapped");
    out.line("{");
    out.line(format!("let {unwrapped} = assert_json_field({from}, {field})?;"));
    for (index, alternative) in v.alternatives.iter().enumerate() {
        let predicate = alternative
            .protocol_kind()
            .json_predicate()
            .ok_or_else(|| SchemaError::ComplexAlternative { alternative: alternative.protocol_type() })?;
        if index == 0 {
            out.line(format!("if {unwrapped}.{predicate}() {{"));
        } else {
            out.line(format!("}} else if {unwrapped}.{predicate}() {{"));
        }
        let arm = v.slots.arm(index);
        let wrap = |out: &mut CodeWriter, expr: &str| assign(out, &format!("{arm}({expr})"));
        emit_from_json_value(alternative, out, from, &wrap, field_name)?;
    }
    out.line("} else {");
    out.line(format!("return Err(WireError::wrong_shape({field}, {}, {unwrapped}));", expected(v)));
    out.line("}");
    out.line("}");
    Ok(())
}

// Each alternative runs in its own closure; the first `Ok` wins.
fn decode_by_trial(
    v: &BasicVariantType,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    let field = lit(field_name);
    let target = v.target_type();
    let attempt = out.fresh("attempt");
    out.line("{");
    for (index, alternative) in v.alternatives.iter().enumerate() {
        if index == 0 {
            out.line(format!("let {attempt} = (|| -> Result<{target}, WireError> {{"));
        } else {
            out.line(format!("let {attempt} = {attempt}.or_else(|_| -> Result<{target}, WireError> {{"));
        }
        let arm = v.slots.arm(index);
        let ret = |out: &mut CodeWriter, expr: &str| out.line(format!("return Ok({arm}({expr}));"));
        emit_from_json_value(alternative, out, from, &ret, field_name)?;
        out.line(if index == 0 { "})();" } else { "});" });
    }
    let value = out.fresh("value");
    let unwrapped = out.fresh("unwrapped");
    out.line(format!("match {attempt} {{"));
    out.line(format!("Ok({value}) => {{"));
    assign(out, &value);
    out.line("}");
    out.line("Err(_) => {");
    out.line(format!("let {unwrapped} = assert_json_field({from}, {field})?;"));
    out.line(format!("return Err(WireError::wrong_shape({field}, {}, {unwrapped}));", expected(v)));
    out.line("}");
    out.line("}");
    out.line("}");
    Ok(())
}

pub(super) fn encode_basic(
    v: &BasicVariantType,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    let held = out.fresh("held");
    let mut covered = vec![false; v.slots.distinct.len()];
    out.line(format!("match &{from} {{"));
    for (index, alternative) in v.alternatives.iter().enumerate() {
        // Alternatives sharing a Rust type share an arm; the first one encodes it.
        let slot = v.slots.slot_of[index];
        if covered[slot] {
            continue;
        }
        covered[slot] = true;
        out.line(format!("{}({held}) => {{", v.slots.arm(index)));
        emit_to_json_value(alternative, out, &format!("(*{held})"), assign, field_name)?;
        out.line("}");
    }
    out.line("}");
    Ok(())
}

fn expected(v: &BasicVariantType) -> String {
    lit(&v.protocol_type())
}

// ————————————————————————————————————————————————————————————————————————————
// DISCRIMINATED UNION
// ————————————————————————————————————————————————————————————————————————————

/// Reads the discriminant from the `req_<name>` local the object decoder bound earlier.
pub(super) fn decode_union(
    u: &DiscriminatedUnionType,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    let discriminant = u.discriminant_enum()?;
    let local = format!("req_{}", u.discriminant.target_name);
    out.line(format!("match {local} {{"));
    for (index, (tag, alternative)) in u.by_tag.iter().enumerate() {
        out.line(format!("{} => {{", discriminant.variant_path(tag)?));
        let arm = u.slots.arm(index);
        let wrap = |out: &mut CodeWriter, expr: &str| assign(out, &format!("{arm}({expr})"));
        emit_from_json_value(alternative, out, from, &wrap, field_name)?;
        out.line("}");
    }
    out.line("_ => {");
    out.line(format!(
        "return Err(WireError::invalid_discriminant({}, {}, {local}.as_wire_str()));",
        lit(field_name),
        lit(&u.discriminant.target_name),
    ));
    out.line("}");
    out.line("}");
    Ok(())
}

/// Checks the held arm against `self.<discriminant>` before encoding it.
pub(super) fn encode_union(
    u: &DiscriminatedUnionType,
    out: &mut CodeWriter,
    from: &str,
    assign: Assign<'_>,
    field_name: &str,
) -> Result<(), SchemaError> {
    let discriminant = u.discriminant_enum()?;
    let field = lit(field_name);
    let name = lit(&u.discriminant.target_name);
    let place = format!("self.{}", u.discriminant.ident());
    out.line(format!("match {place} {{"));
    for (index, (tag, alternative)) in u.by_tag.iter().enumerate() {
        let held = out.fresh("held");
        out.line(format!("{} => {{", discriminant.variant_path(tag)?));
        out.line(format!("if let {}({held}) = &{from} {{", u.slots.arm(index)));
        emit_to_json_value(alternative, out, &format!("(*{held})"), assign, field_name)?;
        out.line("} else {");
        out.line(format!(
            "return Err(WireError::discriminated_union_mismatch({field}, {name}, {place}.as_wire_str(), {}));",
            lit(&alternative.target_type()),
        ));
        out.line("}");
        out.line("}");
    }
    out.line("_ => {");
    out.line(format!("return Err(WireError::invalid_discriminant({field}, {name}, {place}.as_wire_str()));"));
    out.line("}");
    out.line("}");
    Ok(())
}
