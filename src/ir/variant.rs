//! Sum types over other type nodes.
//!
//! Both variant kinds are rendered in Rust as one of the `OneOfN` enums from
//! [`crate::runtime`], parameterised by the *distinct* target types of their
//! alternatives in first-seen order. Alternatives that share a Rust type share an arm.
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::error::{SchemaError, Side};
use crate::runtime::ONE_OF_ARMS;
use super::{BaseKind, FieldDef, StringEnumType, TypeRef};

/// Distinct target types plus, for every alternative, the slot of its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSlots {
    pub distinct: Vec<String>,
    pub slot_of: Vec<usize>,
}

impl TargetSlots {
    fn compute(alternatives: &[TypeRef]) -> Result<Self, SchemaError> {
        let mut distinct: Vec<String> = Vec::new();
        let mut slot_of = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            let ty = alternative.target_type();
            let slot = match distinct.iter().position(|d| *d == ty) {
                Some(slot) => slot,
                None => {
                    distinct.push(ty);
                    distinct.len() - 1
                }
            };
            slot_of.push(slot);
        }
        if distinct.len() > ONE_OF_ARMS.len() {
            return Err(SchemaError::TooManyAlternatives { count: distinct.len(), max: ONE_OF_ARMS.len() });
        }
        Ok(Self { distinct, slot_of })
    }

    pub fn one_of_name(&self) -> String {
        format!("OneOf{}", self.distinct.len())
    }

    pub fn target_type(&self) -> String {
        format!("{}<{}>", self.one_of_name(), self.distinct.join(", "))
    }

    /// `OneOfN::X` arm holding alternative `index`.
    pub fn arm(&self, index: usize) -> String {
        format!("{}::{}", self.one_of_name(), ONE_OF_ARMS[self.slot_of[index]])
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BASIC VARIANT
// ————————————————————————————————————————————————————————————————————————————

/// Untagged union told apart by wire shape, or by trial when `allow_fallthrough`.
#[derive(Debug)]
pub struct BasicVariantType {
    pub alternatives: Vec<TypeRef>,
    pub allow_fallthrough: bool,
    pub slots: TargetSlots,
}

impl BasicVariantType {
    /// Overlapping wire kinds are refused unless `allow_fallthrough` acknowledges them;
    /// that is how "a known literal, or any string" (an open enum) is spelled.
    pub fn new(alternatives: Vec<TypeRef>, allow_fallthrough: bool) -> Result<Self, SchemaError> {
        if alternatives.len() < 2 {
            return Err(SchemaError::TooFewAlternatives { count: alternatives.len(), min: 2 });
        }
        let mut target_seen = BTreeSet::new();
        let mut protocol_seen = BTreeSet::new();
        for alternative in &alternatives {
            let target = alternative.target_kind();
            let protocol = alternative.protocol_kind();
            if target == BaseKind::Complex || protocol == BaseKind::Complex {
                return Err(SchemaError::ComplexAlternative { alternative: alternative.protocol_type() });
            }
            if !target_seen.insert(target) {
                return Err(SchemaError::AmbiguousAlternatives { side: Side::Target, kind: target });
            }
            if !protocol_seen.insert(protocol) && !allow_fallthrough {
                return Err(SchemaError::AmbiguousAlternatives { side: Side::Protocol, kind: protocol });
            }
        }
        let slots = TargetSlots::compute(&alternatives)?;
        Ok(Self { alternatives, allow_fallthrough, slots })
    }

    pub fn target_type(&self) -> String {
        self.slots.target_type()
    }

    pub fn protocol_type(&self) -> String {
        join_protocol_types(&self.alternatives)
    }
}

pub(super) fn join_protocol_types(alternatives: &[TypeRef]) -> String {
    alternatives.iter().map(|a| a.protocol_type()).collect::<Vec<_>>().join(" | ")
}

// ————————————————————————————————————————————————————————————————————————————
// DISCRIMINATED UNION
// ————————————————————————————————————————————————————————————————————————————

/// A union whose alternative is selected by a string-enum field of the same object.
#[derive(Debug)]
pub struct DiscriminatedUnionType {
    pub discriminant: Rc<FieldDef>,
    pub by_tag: Vec<(String, TypeRef)>,
    pub slots: TargetSlots,
}

impl DiscriminatedUnionType {
    pub fn new(discriminant: Rc<FieldDef>, by_tag: Vec<(String, TypeRef)>) -> Result<Self, SchemaError> {
        let Some(enum_type) = discriminant.ty.as_string_enum() else {
            return Err(SchemaError::NonEnumDiscriminant { field: discriminant.target_name.clone() });
        };
        if by_tag.is_empty() {
            return Err(SchemaError::TooFewAlternatives { count: 0, min: 1 });
        }
        let mut tags = BTreeSet::new();
        for (tag, _) in &by_tag {
            enum_type.variant_path(tag)?;
            if !tags.insert(tag.as_str()) {
                return Err(SchemaError::DuplicateDiscriminantTag { tag: tag.clone() });
            }
        }
        let alternatives: Vec<TypeRef> = by_tag.iter().map(|(_, ty)| ty.clone()).collect();
        let slots = TargetSlots::compute(&alternatives)?;
        Ok(Self { discriminant, by_tag, slots })
    }

    pub fn alternatives(&self) -> Vec<TypeRef> {
        self.by_tag.iter().map(|(_, ty)| ty.clone()).collect()
    }

    pub fn discriminant_enum(&self) -> Result<&StringEnumType, SchemaError> {
        self.discriminant
            .ty
            .as_string_enum()
            .ok_or_else(|| SchemaError::NonEnumDiscriminant { field: self.discriminant.target_name.clone() })
    }

    pub fn alternative_for(&self, tag: &str) -> Option<(usize, &TypeRef)> {
        self.by_tag.iter().enumerate().find(|(_, (t, _))| t == tag).map(|(i, (_, ty))| (i, ty))
    }

    pub fn target_type(&self) -> String {
        self.slots.target_type()
    }
}
