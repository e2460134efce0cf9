//! Error types and handling for the analysis data store
//!
//! This module defines all error types used throughout the crate. Errors are
//! grouped by the layer that raises them so callers can match on the family
//! (type system, graph, serialization) or on the precise failure.

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the analysis data store
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Type system definition and lookup errors
    #[error("Type system error: {0}")]
    TypeSystem(#[from] TypeSystemError),

    /// Feature structure graph errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Type system errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeSystemError {
    /// No type with this name exists
    #[error("Unknown type: {name}")]
    UnknownType {
        /// Name (or numeric id) of the missing type
        name: String,
    },

    /// The type neither declares nor inherits the feature
    #[error("Unknown feature {feature} on type {type_name}")]
    UnknownFeature {
        /// Type the lookup was performed on
        type_name: String,
        /// Base name of the missing feature
        feature: String,
    },

    /// A type with this name is already registered
    #[error("Duplicate type: {name}")]
    DuplicateType {
        /// Name of the duplicated type
        name: String,
    },

    /// A feature with this base name is already visible on the type
    #[error("Duplicate feature {feature} on type {type_name}")]
    DuplicateFeature {
        /// Type the feature was declared on
        type_name: String,
        /// Base name of the duplicated feature
        feature: String,
    },

    /// The type cannot be subtyped or given new features
    #[error("Type {type_name} cannot be extended")]
    NotExtensible {
        /// Name of the rejected type
        type_name: String,
    },

    /// The type system has been committed and can no longer change
    #[error("Type system is sealed")]
    Sealed,

    /// The type system must be committed before use
    #[error("Type system has not been committed")]
    NotCommitted,
}

/// Feature structure graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// No record with this id exists in the graph
    #[error("Unknown feature structure: {id}")]
    UnknownRecord {
        /// Id of the missing record
        id: u32,
    },

    /// The feature can only be set by the store itself
    #[error("Feature {feature} is reserved and cannot be set directly")]
    ReservedFeature {
        /// Base name of the reserved feature
        feature: String,
    },

    /// Value kind does not match the declared range
    #[error("Type mismatch on {feature}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Base name of the feature (or `[index]` for array elements)
        feature: String,
        /// Name of the declared range
        expected: String,
        /// Kind of the rejected value
        actual: String,
    },

    /// Annotation offsets are inverted or outside the view text
    #[error("Invalid span [{begin}, {end}) for text of length {length}")]
    InvalidSpan {
        /// Begin offset
        begin: i32,
        /// End offset
        end: i32,
        /// Length of the view text in code points
        length: usize,
    },

    /// Instances of this type cannot be created directly
    #[error("Type {type_name} cannot be instantiated directly")]
    NotCreatable {
        /// Name of the type
        type_name: String,
    },

    /// The record is not an array
    #[error("Feature structure {id} is not an array")]
    NotAnArray {
        /// Id of the record
        id: u32,
    },

    /// The record is not an annotation
    #[error("Feature structure {id} is not an annotation")]
    NotAnAnnotation {
        /// Id of the record
        id: u32,
    },

    /// Array index outside the array bounds
    #[error("Index {index} out of bounds for array of length {length}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Array length
        length: usize,
    },

    /// The annotation already belongs to a different view
    #[error("Feature structure {id} belongs to view {bound} and cannot be indexed in {requested}")]
    ViewMismatch {
        /// Id of the record
        id: u32,
        /// View the record is bound to
        bound: String,
        /// View the caller asked for
        requested: String,
    },

    /// The annotation is not bound to any view yet
    #[error("Annotation {id} is not bound to a view")]
    UnboundAnnotation {
        /// Id of the record
        id: u32,
    },
}

/// Serialization/deserialization errors
#[derive(Error, Debug)]
pub enum SerializationError {
    /// JSON syntax or I/O error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structural token error in the payload
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The JSON value kind cannot be converted to the feature range
    #[error("Feature {feature} of type {range} cannot be set from a JSON {json_kind}")]
    IncompatibleFeatureType {
        /// Base name of the feature
        feature: String,
        /// Name of the declared range
        range: String,
        /// Kind of JSON value found
        json_kind: String,
    },

    /// A referenced id never appeared in the payload
    #[error("Unable to resolve feature structure id {id}")]
    DanglingReference {
        /// Payload id that could not be resolved
        id: i64,
    },

    /// Byte array payload is not valid base64
    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a malformed payload error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Serialization(SerializationError::MalformedPayload(msg.into()))
    }

    /// Create an unknown type error
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::TypeSystem(TypeSystemError::UnknownType { name: name.into() })
    }

    /// Create an unknown record error
    pub fn unknown_record(id: u32) -> Self {
        Self::Graph(GraphError::UnknownRecord { id })
    }

    /// Check if this is a contract violation by the immediate caller
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::TypeSystem(_) | Error::Graph(_) | Error::Serialization(_)
        )
    }

    /// Check if this error was raised while reading an exchange payload
    pub fn is_payload_error(&self) -> bool {
        matches!(self, Error::Serialization(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = Error::malformed("unexpected token");
        assert!(err.is_payload_error());
        assert!(err.is_client_error());

        let err: Error = GraphError::UnknownRecord { id: 7 }.into();
        assert!(!err.is_payload_error());
        assert_eq!(err.to_string(), "Graph error: Unknown feature structure: 7");

        let err = Error::config("bad level");
        assert!(!err.is_client_error());
    }
}
