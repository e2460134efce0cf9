//! Type system, value model and identifiers
//!
//! Everything a graph needs to know about the shape of its records.

/// Identifier types
pub mod ids;
/// Built-in type and feature names
pub mod builtin;
/// Types, features and subsumption
pub mod type_system;
/// Feature values and array payloads
pub mod value;

pub use ids::FsId;
pub use type_system::{ArrayKind, Feature, FeatureDecl, PrimitiveKind, TypeId, TypeKind, TypeSystem};
pub use value::{ArrayData, Value};
