//! Prometheus metrics for the API.
//!
//! [`ApiMetrics`] owns a dedicated [`Registry`] that the `/metrics` endpoint
//! encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_with_registry, Encoder,
    HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};

pub struct ApiMetrics {
    pub registry: Registry,

    // ── Snapshot cache ──────────────────────────────────────────────────
    /// Snapshot requests answered from a fresh cache entry.
    pub cache_hits: IntCounter,
    /// Snapshot requests that had to run the pipeline.
    pub cache_misses: IntCounter,
    /// Stale entries served after a failed refresh.
    pub stale_served: IntCounter,
    /// Pipeline runs that failed upstream.
    pub upstream_failures: IntCounter,

    // ── Proposal sync ───────────────────────────────────────────────────
    pub sync_runs: IntCounter,
    pub sync_failures: IntCounter,

    /// Wall time of one pipeline run, in seconds, by pipeline name.
    pub pipeline_duration: HistogramVec,
}

impl ApiMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let cache_hits = register_int_counter_with_registry!(
            Opts::new("inverse_cache_hits_total", "Snapshot requests served fresh from cache"),
            registry
        )
        .expect("failed to register cache_hits counter");

        let cache_misses = register_int_counter_with_registry!(
            Opts::new(
                "inverse_cache_misses_total",
                "Snapshot requests that ran the fetch pipeline"
            ),
            registry
        )
        .expect("failed to register cache_misses counter");

        let stale_served = register_int_counter_with_registry!(
            Opts::new(
                "inverse_stale_served_total",
                "Stale snapshots served after a failed refresh"
            ),
            registry
        )
        .expect("failed to register stale_served counter");

        let upstream_failures = register_int_counter_with_registry!(
            Opts::new(
                "inverse_upstream_failures_total",
                "Pipeline runs aborted by a required source"
            ),
            registry
        )
        .expect("failed to register upstream_failures counter");

        let sync_runs = register_int_counter_with_registry!(
            Opts::new("inverse_sync_runs_total", "Proposal sync runs that persisted"),
            registry
        )
        .expect("failed to register sync_runs counter");

        let sync_failures = register_int_counter_with_registry!(
            Opts::new("inverse_sync_failures_total", "Proposal sync runs that failed"),
            registry
        )
        .expect("failed to register sync_failures counter");

        // 10 ms → ~40 s.
        let pipeline_duration = register_histogram_vec_with_registry!(
            HistogramOpts::new(
                "inverse_pipeline_duration_seconds",
                "Duration of one snapshot pipeline run"
            )
            .buckets(
                prometheus::exponential_buckets(0.01, 2.0, 13)
                    .expect("valid histogram buckets")
            ),
            &["pipeline"],
            registry
        )
        .expect("failed to register pipeline_duration histogram");

        Self {
            registry,
            cache_hits,
            cache_misses,
            stale_served,
            upstream_failures,
            sync_runs,
            sync_failures,
            pipeline_duration,
        }
    }

    /// Count one snapshot request by how it was answered.
    pub fn record_served(&self, outcome: &str) {
        match outcome {
            "fresh" => self.cache_hits.inc(),
            "refreshed" => self.cache_misses.inc(),
            "stale" => {
                self.cache_misses.inc();
                self.upstream_failures.inc();
                self.stale_served.inc();
            }
            _ => {
                self.cache_misses.inc();
                self.upstream_failures.inc();
            }
        }
    }

    /// Encode every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_counts_as_miss_and_failure() {
        let metrics = ApiMetrics::new();
        metrics.record_served("fresh");
        metrics.record_served("stale");
        assert_eq!(metrics.cache_hits.get(), 1);
        assert_eq!(metrics.cache_misses.get(), 1);
        assert_eq!(metrics.stale_served.get(), 1);
        assert_eq!(metrics.upstream_failures.get(), 1);
    }

    #[test]
    fn encodes_prefixed_families() {
        let metrics = ApiMetrics::new();
        metrics.sync_runs.inc();
        metrics
            .pipeline_duration
            .with_label_values(&["dao"])
            .observe(0.2);
        let text = metrics.encode().unwrap();
        assert!(text.contains("inverse_sync_runs_total 1"));
        assert!(text.contains("inverse_pipeline_duration_seconds_bucket{pipeline=\"dao\""));
    }
}
