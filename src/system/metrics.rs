//! Metrics collection for the analysis data store
//!
//! Counters and histograms are registered once in the default Prometheus
//! registry and shared by every graph in the process.

use crate::core::error::Result;
use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder};
use std::time::Instant;

/// Counters for graph mutations
pub struct GraphMetrics {
    /// Total number of feature structures created
    pub records_created: IntCounter,
    /// Total number of views created
    pub views_created: IntCounter,
    /// Total number of successful index insertions
    pub records_indexed: IntCounter,
}

/// Counters and timings for the JSON codec
pub struct CodecMetrics {
    /// Total number of payloads written
    pub payloads_serialized: IntCounter,
    /// Total number of payloads read successfully
    pub payloads_deserialized: IntCounter,
    /// Total number of payloads rejected
    pub deserialize_failures: IntCounter,
    /// Total number of references resolved after their target appeared
    pub deferred_references: IntCounter,
    /// Histogram of codec call durations in seconds
    pub duration: Histogram,
}

/// Centralized metrics for all components
pub struct Metrics {
    /// Graph metrics
    pub graph: GraphMetrics,
    /// Codec metrics
    pub codec: CodecMetrics,
}

impl Metrics {
    /// Create and register all metrics
    fn new() -> Result<Self> {
        Ok(Self {
            graph: GraphMetrics::new()?,
            codec: CodecMetrics::new()?,
        })
    }

    /// Get the global metrics instance
    pub fn global() -> &'static Metrics {
        static INSTANCE: Lazy<Metrics> =
            Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
        &INSTANCE
    }
}

impl GraphMetrics {
    fn new() -> Result<Self> {
        Ok(Self {
            records_created: register_int_counter!(
                "cas_records_created_total",
                "Total number of feature structures created"
            )?,
            views_created: register_int_counter!(
                "cas_views_created_total",
                "Total number of views created"
            )?,
            records_indexed: register_int_counter!(
                "cas_records_indexed_total",
                "Total number of feature structures added to a view index"
            )?,
        })
    }
}

impl CodecMetrics {
    fn new() -> Result<Self> {
        Ok(Self {
            payloads_serialized: register_int_counter!(
                "cas_payloads_serialized_total",
                "Total number of payloads serialized"
            )?,
            payloads_deserialized: register_int_counter!(
                "cas_payloads_deserialized_total",
                "Total number of payloads deserialized"
            )?,
            deserialize_failures: register_int_counter!(
                "cas_deserialize_failures_total",
                "Total number of payloads rejected during deserialization"
            )?,
            deferred_references: register_int_counter!(
                "cas_deferred_references_total",
                "Total number of forward references resolved after their target was read"
            )?,
            duration: register_histogram!(
                "cas_codec_duration_seconds",
                "Duration of serialize and deserialize calls in seconds",
                vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
            )?,
        })
    }
}

/// Timer recording into a histogram when finished
pub struct Timer {
    start: Instant,
    histogram: Histogram,
}

impl Timer {
    /// Start a new timer
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the elapsed time and consume the timer
    pub fn finish(self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Force registration of every metric
pub fn init_registry() {
    let _ = Metrics::global();
}

/// Render all registered metrics in the Prometheus text exposition format
pub fn gather() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_exposes_counters() {
        init_registry();
        Metrics::global().graph.views_created.inc();
        let text = gather().unwrap();
        assert!(text.contains("cas_views_created_total"));
        assert!(text.contains("cas_codec_duration_seconds"));
    }

    #[test]
    fn test_timer_records_observation() {
        let histogram = Metrics::global().codec.duration.clone();
        let before = histogram.get_sample_count();
        Timer::start(histogram.clone()).finish();
        assert!(histogram.get_sample_count() > before);
    }
}
