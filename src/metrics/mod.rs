// Private module declaration
mod server;

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Checkout throughput, rejections and latency
// - Stage advancements
// - Notification delivery, retries and dead-lettering
// - Health status
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Health gauge value before the first system health check has run.
pub const HEALTH_UNKNOWN: i64 = -1;

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Checkout Metrics
    pub orders_placed: IntCounterVec,
    pub orders_rejected: IntCounterVec,
    pub checkout_duration: Histogram,

    // Tracking Metrics
    pub stage_advancements: IntCounterVec,
    pub stage_advancements_rejected: IntCounterVec,

    // Notification Metrics
    pub notifications_sent: IntCounterVec,
    pub notifications_failed: IntCounterVec,

    // Retry Metrics
    pub retry_attempts_total: IntCounterVec,
    pub retry_success: IntCounterVec,
    pub retry_failure: IntCounterVec,

    // DLQ Metrics
    pub dlq_messages_total: IntCounter,
    pub dlq_messages_by_category: IntCounterVec,

    pub health_status: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_placed = IntCounterVec::new(
            Opts::new("orders_placed_total", "Total orders committed"),
            &["shipping_speed"],
        )?;
        registry.register(Box::new(orders_placed.clone()))?;

        let orders_rejected = IntCounterVec::new(
            Opts::new("orders_rejected_total", "Checkouts that did not commit"),
            &["reason"],
        )?;
        registry.register(Box::new(orders_rejected.clone()))?;

        let checkout_duration = Histogram::with_opts(
            HistogramOpts::new("checkout_duration_seconds", "Checkout transaction duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(checkout_duration.clone()))?;

        let stage_advancements = IntCounterVec::new(
            Opts::new("stage_advancements_total", "Tracking stages completed"),
            &["stage"],
        )?;
        registry.register(Box::new(stage_advancements.clone()))?;

        let stage_advancements_rejected = IntCounterVec::new(
            Opts::new("stage_advancements_rejected_total", "Stage advancements refused"),
            &["reason"],
        )?;
        registry.register(Box::new(stage_advancements_rejected.clone()))?;

        let notifications_sent = IntCounterVec::new(
            Opts::new("notifications_sent_total", "Notifications appended"),
            &["category"],
        )?;
        registry.register(Box::new(notifications_sent.clone()))?;

        let notifications_failed = IntCounterVec::new(
            Opts::new("notifications_failed_total", "Notifications that could not be appended"),
            &["category"],
        )?;
        registry.register(Box::new(notifications_failed.clone()))?;

        let retry_attempts_total = IntCounterVec::new(
            Opts::new("retry_attempts_total", "Total retry attempts"),
            &["operation", "attempt"],
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        let retry_success = IntCounterVec::new(
            Opts::new("retry_success_total", "Total successful retries"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_success.clone()))?;

        let retry_failure = IntCounterVec::new(
            Opts::new("retry_failure_total", "Total failed retries after all attempts"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_failure.clone()))?;

        let dlq_messages_total = IntCounter::new(
            "dlq_messages_total",
            "Total messages in dead letter queue",
        )?;
        registry.register(Box::new(dlq_messages_total.clone()))?;

        let dlq_messages_by_category = IntCounterVec::new(
            Opts::new("dlq_messages_by_category", "DLQ messages by notification category"),
            &["category"],
        )?;
        registry.register(Box::new(dlq_messages_by_category.clone()))?;

        let health_status = IntGauge::new(
            "health_status",
            "Service health status (-1=Not yet checked, 0=Unhealthy, 1=Degraded, 2=Healthy)",
        )?;
        health_status.set(HEALTH_UNKNOWN);
        registry.register(Box::new(health_status.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            orders_rejected,
            checkout_duration,
            stage_advancements,
            stage_advancements_rejected,
            notifications_sent,
            notifications_failed,
            retry_attempts_total,
            retry_success,
            retry_failure,
            dlq_messages_total,
            dlq_messages_by_category,
            health_status,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_placed(&self, shipping_speed: &str, duration_secs: f64) {
        self.orders_placed.with_label_values(&[shipping_speed]).inc();
        self.checkout_duration.observe(duration_secs);
    }

    pub fn record_order_rejected(&self, reason: &str) {
        self.orders_rejected.with_label_values(&[reason]).inc();
    }

    pub fn record_stage_advanced(&self, stage: &str) {
        self.stage_advancements.with_label_values(&[stage]).inc();
    }

    pub fn record_advance_rejected(&self, reason: &str) {
        self.stage_advancements_rejected.with_label_values(&[reason]).inc();
    }

    pub fn record_notification(&self, category: &str, success: bool) {
        if success {
            self.notifications_sent.with_label_values(&[category]).inc();
        } else {
            self.notifications_failed.with_label_values(&[category]).inc();
        }
    }

    /// Helper to record retry attempt
    pub fn record_retry_attempt(&self, operation: &str, attempt: u32) {
        self.retry_attempts_total.with_label_values(&[operation, &attempt.to_string()]).inc();
    }

    /// Helper to record retry outcome
    pub fn record_retry_outcome(&self, operation: &str, success: bool) {
        if success {
            self.retry_success.with_label_values(&[operation]).inc();
        } else {
            self.retry_failure.with_label_values(&[operation]).inc();
        }
    }

    /// Helper to record DLQ message
    pub fn record_dlq_message(&self, category: &str) {
        self.dlq_messages_total.inc();
        self.dlq_messages_by_category.with_label_values(&[category]).inc();
    }

    pub fn set_health_status(&self, status: i64) {
        self.health_status.set(status);
    }

    pub fn health_status(&self) -> i64 {
        self.health_status.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_rejected("validation");
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_record_order_placed() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_placed("express", 0.02);
        metrics.record_order_placed("express", 0.03);

        let gathered = metrics.registry.gather();
        let placed = gathered.iter().find(|m| m.name() == "orders_placed_total").unwrap();
        assert_eq!(placed.metric[0].counter.value, Some(2.0));
        let duration = gathered.iter().find(|m| m.name() == "checkout_duration_seconds").unwrap();
        assert_eq!(duration.metric[0].histogram.sample_count, Some(2));
    }

    #[test]
    fn test_record_retry() {
        let metrics = Metrics::new().unwrap();
        metrics.record_retry_attempt("notification_insert", 1);
        metrics.record_retry_attempt("notification_insert", 2);
        metrics.record_retry_outcome("notification_insert", true);

        let gathered = metrics.registry.gather();
        let attempts = gathered.iter().find(|m| m.name() == "retry_attempts_total").unwrap();
        assert_eq!(attempts.metric.len(), 2); // Two different attempt labels
    }

    #[test]
    fn test_record_dlq_message() {
        let metrics = Metrics::new().unwrap();
        metrics.record_dlq_message("Order Status");
        metrics.record_dlq_message("Flash Sale");

        let gathered = metrics.registry.gather();
        let dlq_total = gathered.iter().find(|m| m.name() == "dlq_messages_total").unwrap();
        assert_eq!(dlq_total.metric[0].counter.value, Some(2.0));
    }

    #[test]
    fn test_health_gauge() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.health_status(), HEALTH_UNKNOWN);
        metrics.set_health_status(1);

        let gathered = metrics.registry.gather();
        let health = gathered.iter().find(|m| m.name() == "health_status").unwrap();
        assert_eq!(health.metric[0].gauge.value, Some(1.0));
    }
}
