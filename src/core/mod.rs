//! Core foundations
//!
//! Error handling and configuration shared by every other module.

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{CodecConfig, Config, FsLayout, LoggingConfig};
pub use error::{Error, GraphError, Result, SerializationError, TypeSystemError};
