use std::rc::Rc;

use crate::error::SchemaError;
use super::{rust_ident, validate_field_name, TypeRef};

/// One named slot of an object: the wire key, the Rust member name and its type.
#[derive(Debug)]
pub struct FieldDef {
    pub protocol_name: String,
    pub target_name: String,
    pub ty: TypeRef,
}

impl FieldDef {
    /// Same name on the wire and in Rust.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Result<Rc<Self>, SchemaError> {
        let name = name.into();
        Self::renamed(name.clone(), name, ty)
    }

    pub fn renamed(
        protocol_name: impl Into<String>,
        target_name: impl Into<String>,
        ty: TypeRef,
    ) -> Result<Rc<Self>, SchemaError> {
        let target_name = target_name.into();
        validate_field_name(&target_name)?;
        Ok(Rc::new(Self { protocol_name: protocol_name.into(), target_name, ty }))
    }

    pub fn is_optional(&self) -> bool {
        self.ty.is_optional()
    }

    /// Member name as written in generated code.
    pub fn ident(&self) -> String {
        rust_ident(&self.target_name)
    }
}
