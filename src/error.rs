//! Generation-time errors.
//!
//! Everything here is a mistake in the schema itself. Nothing is recoverable:
//! constructors, lowering and emission return these and the run stops.
use thiserror::Error;

use crate::ir::BaseKind;

/// Which side of a type a [`BaseKind`] was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Target,
    Protocol,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Target => f.write_str("target"),
            Side::Protocol => f.write_str("protocol"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("`{name}` is not a valid {what} identifier")]
    InvalidIdentifier { what: &'static str, name: String },

    #[error("object `{object}` declares field `{field}` twice")]
    DuplicateField { object: String, field: String },

    #[error("object `{object}` is sealed; field `{field}` can no longer be added")]
    SealedObject { object: String, field: String },

    #[error("enum `{name}` has no values")]
    EmptyEnum { name: String },

    #[error("enum `{name}` declares `{label}` twice")]
    DuplicateEnumLabel { name: String, label: String },

    #[error("enum `{name}` maps `{label}` to {value}, which is already taken or negative")]
    InvalidEnumValue { name: String, label: String, value: i64 },

    #[error("invalid variant type: alternative `{alternative}` is complex; complex alternatives are not supported")]
    ComplexAlternative { alternative: String },

    #[error("invalid variant type: cannot discriminate between multiple alternatives with {side} kind {kind:?}")]
    AmbiguousAlternatives { side: Side, kind: BaseKind },

    #[error("variant type needs at least {min} alternatives, got {count}")]
    TooFewAlternatives { count: usize, min: usize },

    #[error("variant type has {count} distinct representations; at most {max} are supported")]
    TooManyAlternatives { count: usize, max: usize },

    #[error("the discriminant `{field}` of a discriminated union must be a string enum")]
    NonEnumDiscriminant { field: String },

    #[error("enum `{name}` does not contain string `{tag}`")]
    UnknownDiscriminantTag { name: String, tag: String },

    #[error("discriminated union maps tag `{tag}` twice")]
    DuplicateDiscriminantTag { tag: String },

    #[error("field `{object}.{field}` is discriminated by `{discriminant}`, which must be an earlier required field of `{object}`")]
    DiscriminantNotInScope { object: String, field: String, discriminant: String },

    #[error("type `{name}` has no standalone declaration")]
    NotEmittable { name: String },

    #[error("two different types are named `{name}`")]
    ConflictingTypeName { name: String },

    #[error("unknown type reference `{name}`")]
    UnknownTypeReference { name: String },
}
