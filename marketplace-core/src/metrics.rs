//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the marketplace. Every collector lives in
//! the instance's own registry, so several marketplaces can coexist in one
//! process.
//!
//! # Metrics
//!
//! - `marketplace_checkouts_total` - Successful checkouts
//! - `marketplace_checkout_failures_total` - Rejected checkouts
//! - `marketplace_orders_total` - Orders created
//! - `marketplace_gross_volume_minor_total` - Σ of settled checkout totals (minor units)
//! - `marketplace_reviews_total` - Reviews accepted
//! - `marketplace_boosts_total` - Boosts purchased
//! - `marketplace_checkout_duration_seconds` - Histogram of checkout latencies
//! - `marketplace_persist_batch_size` - Histogram of change sets per write batch

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Successful checkouts
    pub checkouts_total: IntCounter,

    /// Rejected checkouts
    pub checkout_failures_total: IntCounter,

    /// Orders created
    pub orders_total: IntCounter,

    /// Gross settled volume in minor units
    pub gross_volume: IntCounter,

    /// Reviews accepted
    pub reviews_total: IntCounter,

    /// Boosts purchased
    pub boosts_total: IntCounter,

    /// Checkout duration histogram
    pub checkout_duration: Histogram,

    /// Persist batch size histogram
    pub batch_size: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let counter = |name: &str, help: &str| -> prometheus::Result<IntCounter> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let checkouts_total = counter("marketplace_checkouts_total", "Successful checkouts")?;
        let checkout_failures_total = counter(
            "marketplace_checkout_failures_total",
            "Rejected checkouts",
        )?;
        let orders_total = counter("marketplace_orders_total", "Orders created")?;
        let gross_volume = counter(
            "marketplace_gross_volume_minor_total",
            "Sum of settled checkout totals in minor units",
        )?;
        let reviews_total = counter("marketplace_reviews_total", "Reviews accepted")?;
        let boosts_total = counter("marketplace_boosts_total", "Boosts purchased")?;

        let checkout_duration = Histogram::with_opts(
            HistogramOpts::new(
                "marketplace_checkout_duration_seconds",
                "Histogram of checkout latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]),
        )?;
        registry.register(Box::new(checkout_duration.clone()))?;

        let batch_size = Histogram::with_opts(
            HistogramOpts::new(
                "marketplace_persist_batch_size",
                "Histogram of change sets per write batch",
            )
            .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        )?;
        registry.register(Box::new(batch_size.clone()))?;

        Ok(Self {
            checkouts_total,
            checkout_failures_total,
            orders_total,
            gross_volume,
            reviews_total,
            boosts_total,
            checkout_duration,
            batch_size,
            registry,
        })
    }

    /// Record a settled checkout
    pub fn record_checkout(&self, orders: usize, total_minor: u64, duration_seconds: f64) {
        self.checkouts_total.inc();
        self.orders_total.inc_by(orders as u64);
        self.gross_volume.inc_by(total_minor);
        self.checkout_duration.observe(duration_seconds);
    }

    /// Record a rejected checkout
    pub fn record_checkout_failure(&self) {
        self.checkout_failures_total.inc();
    }

    /// Record an accepted review
    pub fn record_review(&self) {
        self.reviews_total.inc();
    }

    /// Record a purchased boost
    pub fn record_boost(&self) {
        self.boosts_total.inc();
    }

    /// Record batch flush
    pub fn record_batch_flush(&self, batch_size: usize) {
        self.batch_size.observe(batch_size as f64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Export all metrics in Prometheus text format
    pub fn export(&self) -> crate::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| crate::Error::Metrics(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("checkouts_total", &self.checkouts_total.get())
            .field("orders_total", &self.orders_total.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.checkouts_total.get(), 0);
        assert_eq!(metrics.orders_total.get(), 0);
    }

    #[test]
    fn test_instances_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_review();
        assert_eq!(a.reviews_total.get(), 1);
        assert_eq!(b.reviews_total.get(), 0);
    }

    #[test]
    fn test_record_checkout() {
        let metrics = Metrics::new().unwrap();
        metrics.record_checkout(2, 1300, 0.0002);
        metrics.record_checkout_failure();

        assert_eq!(metrics.checkouts_total.get(), 1);
        assert_eq!(metrics.orders_total.get(), 2);
        assert_eq!(metrics.gross_volume.get(), 1300);
        assert_eq!(metrics.checkout_failures_total.get(), 1);
        assert_eq!(metrics.checkout_duration.get_sample_count(), 1);
    }

    #[test]
    fn test_registry_gathers_all() {
        let metrics = Metrics::new().unwrap();
        metrics.record_batch_flush(3);
        assert_eq!(metrics.registry().gather().len(), 8);
    }

    #[test]
    fn test_export_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.record_checkout(1, 750_000, 0.001);

        let text = metrics.export().unwrap();
        assert!(text.contains("# TYPE marketplace_checkouts_total counter"));
        assert!(text.contains("marketplace_checkouts_total 1"));
    }
}
