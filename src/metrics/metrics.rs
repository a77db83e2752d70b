//! Metrics module for the YouTube Data API
//!
//! A small pluggable metrics layer: handlers and providers record through the
//! [`Metrics`] facade, which forwards to a [`MetricsExporter`] backend. Two
//! backends exist, Prometheus (rendered on `/metrics`) and a null exporter used
//! when metrics are disabled.
//!
//! Recording never fails a request. Errors raised by the exporter are logged at
//! `warn` level by the convenience methods and otherwise ignored.
//!
//! ```rust,no_run
//! use youtube_data_api::config::MetricsConfig;
//! use youtube_data_api::metrics::{create_metrics_exporter, Metrics};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metrics = Metrics::new(create_metrics_exporter(&MetricsConfig::from_env())?);
//!
//!     metrics.record_http_request("/get_title", "GET", "200", 0.042).await;
//!     metrics.record_upstream_call("youtube_data", "get_title", "success", 0.038).await;
//!
//!     let exported = metrics.export().await?;
//!     println!("{}", String::from_utf8_lossy(&exported));
//!     Ok(())
//! }
//! ```

use crate::config::MetricsConfig;
use crate::metrics::error::MetricsError;
use crate::metrics::null::NullExporter;
use crate::metrics::prometheus::PrometheusExporter;
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

/// Backend receiving metric updates
///
/// Implementations must be `Send + Sync`; a single exporter is shared by every
/// actix worker.
#[async_trait]
pub trait MetricsExporter: Send + Sync {
    /// Increment a counter by one
    async fn increment(&self, name: &str, labels: &[(&str, &str)]) -> Result<(), MetricsError>;

    /// Record a single observation in a histogram
    async fn observe_histogram(
        &self,
        name: &str,
        value: f64,
        labels: &[(&str, &str)],
    ) -> Result<(), MetricsError>;

    /// Render every metric in the backend's exposition format
    async fn export(&self) -> Result<Vec<u8>, MetricsError>;
}

/// Metrics facade for the application
#[derive(Clone)]
pub struct Metrics {
    exporter: Arc<dyn MetricsExporter>,
}

impl Metrics {
    pub fn new(exporter: Arc<dyn MetricsExporter>) -> Self {
        Self { exporter }
    }

    /// Metrics backed by the null exporter
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullExporter))
    }

    /// Export metrics in the format expected by the monitoring system
    pub async fn export(&self) -> Result<Vec<u8>, MetricsError> {
        self.exporter.export().await
    }

    /// Record an HTTP request served by one of the endpoints
    pub async fn record_http_request(
        &self,
        endpoint: &str,
        method: &str,
        status: &str,
        duration: f64,
    ) {
        let labels = [
            ("endpoint", endpoint),
            ("method", method),
            ("status", status),
        ];
        self.observe_histogram_internal("http_request_duration_seconds", duration, &labels)
            .await;
        self.increment_internal("http_requests_total", &labels).await;
    }

    /// Record a call to an upstream provider
    ///
    /// `outcome` is `success` or one of the provider error labels.
    pub async fn record_upstream_call(
        &self,
        provider: &str,
        operation: &str,
        outcome: &str,
        duration: f64,
    ) {
        self.observe_histogram_internal(
            "upstream_request_duration_seconds",
            duration,
            &[("provider", provider), ("operation", operation)],
        )
        .await;
        self.increment_internal(
            "upstream_requests_total",
            &[
                ("provider", provider),
                ("operation", operation),
                ("outcome", outcome),
            ],
        )
        .await;
    }

    /// Record authentication attempt
    pub async fn record_auth_attempt(&self, status: &str) {
        self.increment_internal("auth_attempts_total", &[("status", status)])
            .await;
    }

    async fn increment_internal(&self, name: &str, labels: &[(&str, &str)]) {
        if let Err(e) = self.exporter.increment(name, labels).await {
            warn!("Failed to increment counter '{}': {}", name, e);
        }
    }

    async fn observe_histogram_internal(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        if let Err(e) = self.exporter.observe_histogram(name, value, labels).await {
            warn!("Failed to observe histogram '{}': {}", name, e);
        }
    }
}

/// Build the exporter selected by the metrics configuration
pub fn create_metrics_exporter(
    config: &MetricsConfig,
) -> Result<Arc<dyn MetricsExporter>, MetricsError> {
    if !config.enabled {
        debug!("Metrics disabled, using null exporter");
        return Ok(Arc::new(NullExporter));
    }

    match &config.namespace {
        Some(namespace) => {
            debug!("Initializing Prometheus metrics exporter with namespace '{}'", namespace);
            Ok(Arc::new(PrometheusExporter::with_namespace(namespace.as_str())?))
        }
        None => {
            debug!("Initializing Prometheus metrics exporter");
            Ok(Arc::new(PrometheusExporter::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prometheus_metrics(namespace: Option<&str>) -> Metrics {
        let config = MetricsConfig {
            enabled: true,
            namespace: namespace.map(str::to_string),
        };
        Metrics::new(create_metrics_exporter(&config).unwrap())
    }

    async fn exported(metrics: &Metrics) -> String {
        String::from_utf8(metrics.export().await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_record_http_request() {
        let metrics = prometheus_metrics(Some("youtube_data_api"));
        metrics.record_http_request("/get_title", "GET", "200", 0.05).await;
        metrics.record_http_request("/get_title", "GET", "200", 0.07).await;

        let output = exported(&metrics).await;
        assert!(output.contains(
            "youtube_data_api_http_requests_total{endpoint=\"/get_title\",method=\"GET\",status=\"200\"} 2"
        ));
        assert!(output.contains("youtube_data_api_http_request_duration_seconds_count"));
    }

    #[tokio::test]
    async fn test_record_upstream_call() {
        let metrics = prometheus_metrics(None);
        metrics
            .record_upstream_call("youtube_transcripts", "list_transcripts", "not_found", 0.2)
            .await;

        let output = exported(&metrics).await;
        assert!(output.contains(
            "upstream_requests_total{operation=\"list_transcripts\",outcome=\"not_found\",provider=\"youtube_transcripts\"} 1"
        ));
    }

    #[tokio::test]
    async fn test_record_auth_attempt() {
        let metrics = prometheus_metrics(None);
        metrics.record_auth_attempt("denied").await;

        let output = exported(&metrics).await;
        assert!(output.contains("auth_attempts_total{status=\"denied\"} 1"));
    }

    #[tokio::test]
    async fn test_recording_errors_are_swallowed() {
        let metrics = prometheus_metrics(None);
        // A NaN duration is rejected by the exporter but must not panic or propagate
        metrics.record_http_request("/health", "GET", "200", f64::NAN).await;

        let output = exported(&metrics).await;
        assert!(output.contains("http_requests_total{endpoint=\"/health\",method=\"GET\",status=\"200\"} 1"));
    }

    #[tokio::test]
    async fn test_disabled_metrics_export_nothing() {
        let config = MetricsConfig {
            enabled: false,
            namespace: Some("youtube_data_api".to_string()),
        };
        let metrics = Metrics::new(create_metrics_exporter(&config).unwrap());
        metrics.record_auth_attempt("success").await;
        assert!(metrics.export().await.unwrap().is_empty());

        assert!(Metrics::disabled().export().await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_namespace_is_rejected() {
        let config = MetricsConfig {
            enabled: true,
            namespace: Some("not valid".to_string()),
        };
        assert!(matches!(
            create_metrics_exporter(&config),
            Err(MetricsError::ConfigurationError { .. })
        ));
    }
}
