// YouTube Data API metrics for monitoring and observability
//
// This module contains the metrics for the service.
// It tracks HTTP requests, upstream provider calls and authentication attempts.

pub mod error;
pub mod metrics;
pub mod null;
pub mod prometheus;

pub use self::error::MetricsError;
pub use self::metrics::{create_metrics_exporter, Metrics, MetricsExporter};
