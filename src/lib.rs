//! Schema-driven generator of `serde_json::Value` encoders and decoders.
//!
//! Build a type-node graph (by hand through [`ir::TypeNode`] or from a description
//! file through [`lower`]), run [`codegen::Codegen`] over it, and compile the emitted
//! Rust against [`runtime`]. [`eval`] executes the same schema directly.
pub mod cli;
pub mod codegen;
pub mod description;
pub mod error;
pub mod eval;
pub mod ir;
pub mod lower;
pub mod path_de;
pub mod runtime;
