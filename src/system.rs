//! System utilities and monitoring
//!
//! This module contains process-wide metrics shared by every graph.

pub mod metrics;

pub use metrics::{gather, Metrics, Timer};
