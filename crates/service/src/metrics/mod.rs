//! In-process metrics.
//!
//! [`Metrics`] is a cloneable aggregator handle passed through the
//! application state. Request handlers record events on it; a
//! [`MetricsReporter`] periodically takes a [`MetricsSnapshot`] and pushes it
//! as an OTLP/JSON document through a [`MetricsSink`].
//!
//! All counters are cumulative since process start. Host CPU and memory
//! usage are sampled when a snapshot is taken.

mod exporter;
pub mod otlp;
mod reporter;
mod system;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

pub use exporter::{MetricsExporter, MetricsSink};
pub use reporter::{MetricsReporter, ReporterHandle};
pub use system::SystemUsage;

use system::SystemSampler;

/// Errors pushing metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Transport failure.
    #[error("metrics request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("metrics endpoint returned status {0}")]
    Rejected(u16),
}

/// Point-in-time copy of every metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Requests per `"[METHOD] route"`.
    pub requests_by_endpoint: BTreeMap<String, u64>,
    /// Requests per HTTP method.
    pub requests_by_method: BTreeMap<String, u64>,
    pub auth_successes: u64,
    pub auth_failures: u64,
    /// Logins minus logouts.
    pub active_users: i64,
    pub pizzas_sold: u64,
    pub pizza_failures: u64,
    pub revenue: Decimal,
    /// Factory round-trip of the most recent order, in milliseconds.
    pub factory_latency_ms: u64,
    /// One-minute load average per CPU, in percent.
    pub cpu_usage_percent: f64,
    /// Used share of physical memory, in percent.
    pub memory_usage_percent: f64,
}

#[derive(Default)]
struct Inner {
    requests: Mutex<Requests>,
    auth_successes: AtomicU64,
    auth_failures: AtomicU64,
    active_users: AtomicI64,
    pizzas_sold: AtomicU64,
    pizza_failures: AtomicU64,
    revenue: Mutex<Decimal>,
    factory_latency_ms: AtomicU64,
    system: Mutex<SystemSampler>,
}

#[derive(Default)]
struct Requests {
    by_endpoint: BTreeMap<String, u64>,
    by_method: BTreeMap<String, u64>,
}

/// Metrics aggregator handle.
#[derive(Clone, Default)]
pub struct Metrics {
    inner: Arc<Inner>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one HTTP request to `route` (the matched route template).
    pub fn record_request(&self, method: &str, route: &str) {
        let mut requests = self
            .inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *requests
            .by_endpoint
            .entry(format!("[{method}] {route}"))
            .or_insert(0) += 1;
        *requests.by_method.entry(method.to_string()).or_insert(0) += 1;
    }

    /// Count one authentication attempt.
    pub fn record_auth(&self, success: bool) {
        let counter = if success {
            &self.inner.auth_successes
        } else {
            &self.inner.auth_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn user_logged_in(&self) {
        self.inner.active_users.fetch_add(1, Ordering::Relaxed);
    }

    pub fn user_logged_out(&self) {
        self.inner.active_users.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a fulfilled order.
    pub fn record_purchase(&self, pizzas: usize, revenue: Decimal, latency: Duration) {
        self.inner
            .pizzas_sold
            .fetch_add(u64::try_from(pizzas).unwrap_or(u64::MAX), Ordering::Relaxed);
        *self
            .inner
            .revenue
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += revenue;
        self.record_latency(latency);
    }

    /// Record an order the factory failed to fulfill.
    pub fn record_purchase_failure(&self, latency: Duration) {
        self.inner.pizza_failures.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
    }

    fn record_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.inner.factory_latency_ms.store(ms, Ordering::Relaxed);
    }

    /// Copy the current values.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let (requests_by_endpoint, requests_by_method) = {
            let requests = self
                .inner
                .requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            (requests.by_endpoint.clone(), requests.by_method.clone())
        };
        let revenue = *self
            .inner
            .revenue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let SystemUsage {
            cpu_percent,
            memory_percent,
        } = self
            .inner
            .system
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sample();

        MetricsSnapshot {
            requests_by_endpoint,
            requests_by_method,
            auth_successes: self.inner.auth_successes.load(Ordering::Relaxed),
            auth_failures: self.inner.auth_failures.load(Ordering::Relaxed),
            active_users: self.inner.active_users.load(Ordering::Relaxed),
            pizzas_sold: self.inner.pizzas_sold.load(Ordering::Relaxed),
            pizza_failures: self.inner.pizza_failures.load(Ordering::Relaxed),
            revenue,
            factory_latency_ms: self.inner.factory_latency_ms.load(Ordering::Relaxed),
            cpu_usage_percent: cpu_percent,
            memory_usage_percent: memory_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_are_counted_per_route_and_method() {
        let metrics = Metrics::new();
        metrics.record_request("GET", "/api/order/menu");
        metrics.record_request("GET", "/api/order/menu");
        metrics.record_request("PUT", "/api/auth");

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot.requests_by_endpoint.get("[GET] /api/order/menu"),
            Some(&2)
        );
        assert_eq!(snapshot.requests_by_endpoint.get("[PUT] /api/auth"), Some(&1));
        assert_eq!(snapshot.requests_by_method.get("GET"), Some(&2));
        assert_eq!(snapshot.requests_by_method.get("PUT"), Some(&1));
    }

    #[test]
    fn test_auth_and_active_users() {
        let metrics = Metrics::new();
        metrics.record_auth(true);
        metrics.record_auth(false);
        metrics.record_auth(false);
        metrics.user_logged_in();
        metrics.user_logged_in();
        metrics.user_logged_out();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.auth_successes, 1);
        assert_eq!(snapshot.auth_failures, 2);
        assert_eq!(snapshot.active_users, 1);
    }

    #[test]
    fn test_purchases() {
        let metrics = Metrics::new();
        metrics.record_purchase(2, Decimal::new(76, 4), Duration::from_millis(120));
        metrics.record_purchase(1, Decimal::new(5, 2), Duration::from_millis(80));
        metrics.record_purchase_failure(Duration::from_millis(300));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pizzas_sold, 3);
        assert_eq!(snapshot.pizza_failures, 1);
        assert_eq!(snapshot.revenue, Decimal::new(576, 4));
        assert_eq!(snapshot.factory_latency_ms, 300);
    }

    #[test]
    fn test_snapshot_samples_host_usage() {
        let snapshot = Metrics::new().snapshot();
        assert!(snapshot.cpu_usage_percent >= 0.0);
        assert!((0.0..=100.0).contains(&snapshot.memory_usage_percent));
    }

    #[test]
    fn test_clones_share_state() {
        let metrics = Metrics::new();
        let handle = metrics.clone();
        handle.record_auth(true);
        assert_eq!(metrics.snapshot().auth_successes, 1);
    }
}
