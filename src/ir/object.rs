use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::SchemaError;
use super::{validate_type_name, FieldDef, TypeNode};

/// A named record. Fields keep declaration order; optional-typed fields are optional,
/// everything else is required and becomes a constructor parameter.
///
/// Objects start out *building*: fields can still be added, which is how
/// self-referential and mutually referential records get wired up. The first emission
/// *seals* the object into a frozen field list and later `add_field` calls fail.
pub struct ObjectType {
    name: String,
    phase: RefCell<Phase>,
    extra_members: Vec<String>,
}

enum Phase {
    Building(Vec<Rc<FieldDef>>),
    Sealed(Rc<[Rc<FieldDef>]>),
}

impl ObjectType {
    pub fn new(name: String, fields: Vec<Rc<FieldDef>>, extra_members: Vec<String>) -> Result<Self, SchemaError> {
        validate_type_name(&name)?;
        let object = Self { name, phase: RefCell::new(Phase::Building(Vec::new())), extra_members };
        for field in fields {
            object.add_field(field)?;
        }
        Ok(object)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extra_members(&self) -> &[String] {
        &self.extra_members
    }

    /// Add a field post-definition.
    pub fn add_field(&self, field: Rc<FieldDef>) -> Result<(), SchemaError> {
        let mut phase = self.phase.borrow_mut();
        let Phase::Building(fields) = &mut *phase else {
            return Err(SchemaError::SealedObject { object: self.name.clone(), field: field.target_name.clone() });
        };
        if fields.iter().any(|f| f.target_name == field.target_name) {
            return Err(SchemaError::DuplicateField { object: self.name.clone(), field: field.target_name.clone() });
        }
        fields.push(field);
        Ok(())
    }

    /// Freezes the field list. Idempotent; every call hands out the same list.
    pub fn seal(&self) -> Rc<[Rc<FieldDef>]> {
        let mut phase = self.phase.borrow_mut();
        let frozen = match &mut *phase {
            Phase::Sealed(fields) => return fields.clone(),
            Phase::Building(fields) => Rc::<[Rc<FieldDef>]>::from(std::mem::take(fields)),
        };
        *phase = Phase::Sealed(frozen.clone());
        frozen
    }

    pub fn is_sealed(&self) -> bool {
        matches!(*self.phase.borrow(), Phase::Sealed(_))
    }

    pub fn fields(&self) -> Ref<'_, [Rc<FieldDef>]> {
        Ref::map(self.phase.borrow(), |phase| match phase {
            Phase::Building(fields) => &fields[..],
            Phase::Sealed(fields) => &fields[..],
        })
    }

    pub fn required_fields(&self) -> Vec<Rc<FieldDef>> {
        self.fields().iter().filter(|f| !f.is_optional()).cloned().collect()
    }

    pub fn optional_fields(&self) -> Vec<Rc<FieldDef>> {
        self.fields().iter().filter(|f| f.is_optional()).cloned().collect()
    }

    pub fn field(&self, target_name: &str) -> Option<Rc<FieldDef>> {
        self.fields().iter().find(|f| f.target_name == target_name).cloned()
    }

    /// Every discriminated union reachable from a field (without entering another
    /// object) reads its discriminant from this object. The discriminant has to be a
    /// required field of the same type, decoded before any required field holding the union.
    pub fn check_discriminant_scope(&self) -> Result<(), SchemaError> {
        let fields = self.fields();
        for (index, field) in fields.iter().enumerate() {
            let mut discriminants = Vec::new();
            collect_discriminants(&field.ty, &mut discriminants);
            for discriminant in discriminants {
                let in_scope = match fields.iter().position(|f| f.target_name == discriminant.target_name) {
                    Some(at) => {
                        !fields[at].is_optional()
                            && Rc::ptr_eq(&fields[at].ty, &discriminant.ty)
                            && (field.is_optional() || at < index)
                    }
                    None => false,
                };
                if !in_scope {
                    return Err(SchemaError::DiscriminantNotInScope {
                        object: self.name.clone(),
                        field: field.target_name.clone(),
                        discriminant: discriminant.target_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn collect_discriminants(node: &TypeNode, out: &mut Vec<Rc<FieldDef>>) {
    match node {
        TypeNode::Array(inner) | TypeNode::Optional(inner) => collect_discriminants(inner, out),
        TypeNode::BasicVariant(v) => v.alternatives.iter().for_each(|a| collect_discriminants(a, out)),
        TypeNode::DiscriminatedUnion(u) => {
            out.push(u.discriminant.clone());
            u.by_tag.iter().for_each(|(_, a)| collect_discriminants(a, out));
        }
        _ => {}
    }
}

// Fields may point back at this object; print names only.
impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields();
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("fields", &fields.iter().map(|f| f.target_name.as_str()).collect::<Vec<_>>())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}
