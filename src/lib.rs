//! CAS Graph - An in-memory analysis data store
//!
//! A typed graph of feature structures over a committed type system, with
//! per-view annotation indexes ordered by span and a JSON codec that moves a
//! whole graph, forward and cyclic references included, in and out of the
//! JSON CAS exchange format.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;
pub mod structures;
pub mod types;

// Main functional modules
pub mod cas;
pub mod index;
pub mod json;
pub mod system;

// Re-export commonly used items for convenience
pub use cas::{Cas, DocumentAnnotationMarks, View};
pub use crate::core::{CodecConfig, Config, Error, FsLayout, LoggingConfig, Result};
pub use index::{AnnotationTree, Span};
pub use json::JsonCasCodec;
pub use structures::AdaptiveIntSet;
pub use types::{ArrayData, Feature, FsId, TypeId, TypeSystem, Value};

use tracing_subscriber::EnvFilter;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing and the metrics registry.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match logging.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.pretty().try_init(),
    };
    installed.map_err(|e| Error::config(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!("Initializing {} v{}", NAME, VERSION);
    system::metrics::init_registry();
    Ok(())
}
