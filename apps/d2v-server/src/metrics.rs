//! Prometheus metrics for the query path.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::time::Duration;

/// Outcome label for a nearest-neighbour request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    NotFound,
    Cancelled,
    BadRequest,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::NotFound => "not_found",
            Outcome::Cancelled => "cancelled",
            Outcome::BadRequest => "bad_request",
            Outcome::Error => "error",
        }
    }
}

/// Query metrics, registered once at startup.
pub struct QueryMetrics {
    registry: Registry,
    queries: Family<Vec<(String, String)>, Counter>,
    latency: Histogram,
    documents: Gauge,
}

impl QueryMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let queries = Family::<Vec<(String, String)>, Counter>::default();
        registry.register(
            "d2v_queries",
            "Nearest-neighbour queries by outcome",
            queries.clone(),
        );

        // 0.5ms .. ~4s
        let latency = Histogram::new(exponential_buckets(0.0005, 2.0, 14));
        registry.register(
            "d2v_query_latency_seconds",
            "Nearest-neighbour query latency",
            latency.clone(),
        );

        let documents = Gauge::default();
        registry.register(
            "d2v_documents",
            "Documents in the loaded index",
            documents.clone(),
        );

        Self {
            registry,
            queries,
            latency,
            documents,
        }
    }

    pub fn record(&self, outcome: Outcome, elapsed: Duration) {
        self.queries
            .get_or_create(&vec![("outcome".to_string(), outcome.as_str().to_string())])
            .inc();
        self.latency.observe(elapsed.as_secs_f64());
    }

    pub fn set_documents(&self, count: usize) {
        self.documents.set(count as i64);
    }

    /// Export metrics in Prometheus text format.
    pub fn export(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for QueryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let metrics = QueryMetrics::new();
        metrics.record(Outcome::Ok, Duration::from_millis(2));
        metrics.record(Outcome::Ok, Duration::from_millis(3));
        metrics.record(Outcome::NotFound, Duration::from_micros(100));

        let output = metrics.export().unwrap();
        assert!(output.contains("d2v_queries_total{outcome=\"ok\"} 2"));
        assert!(output.contains("d2v_queries_total{outcome=\"not_found\"} 1"));
        assert!(output.contains("d2v_query_latency_seconds_count 3"));
    }

    #[test]
    fn test_documents_gauge() {
        let metrics = QueryMetrics::new();
        metrics.set_documents(42);

        let output = metrics.export().unwrap();
        assert!(output.contains("d2v_documents 42"));
    }
}
