/// Prometheus metrics exporter implementation
///
/// Metrics are created lazily on first use and registered in a private registry,
/// which `/metrics` renders in the Prometheus text format.
use crate::metrics::error::{validation, MetricsError};
use crate::metrics::metrics::MetricsExporter;
use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default limit on distinct metric names
const DEFAULT_MAX_METRICS: usize = 100;

/// Prometheus implementation of MetricsExporter
pub struct PrometheusExporter {
    registry: Registry,
    counters: DashMap<String, CounterVec>,
    histograms: DashMap<String, HistogramVec>,
    /// Maximum number of metrics to prevent unbounded growth
    max_metrics: usize,
    /// Optional namespace prefix for all metrics
    namespace: Option<String>,
    metric_count: AtomicUsize,
}

impl Default for PrometheusExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PrometheusExporter {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            counters: DashMap::new(),
            histograms: DashMap::new(),
            max_metrics: DEFAULT_MAX_METRICS,
            namespace: None,
            metric_count: AtomicUsize::new(0),
        }
    }

    /// Create a PrometheusExporter prefixing every metric with `namespace`
    pub fn with_namespace<S: Into<String>>(namespace: S) -> Result<Self, MetricsError> {
        let namespace = namespace.into();
        validation::validate_metric_name(&namespace).map_err(|e| {
            MetricsError::configuration_error(format!("Invalid namespace '{}': {}", namespace, e))
        })?;
        Ok(Self {
            namespace: Some(namespace),
            ..Self::new()
        })
    }

    fn apply_namespace(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}_{}", ns, name),
            None => name.to_string(),
        }
    }

    /// Turn `upstream_requests_total` into "Upstream Requests Total - counter"
    fn generate_help_text(name: &str, metric_type: &str) -> String {
        let readable_name = name
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");

        format!("{} - {}", readable_name, metric_type)
    }

    /// Atomically check and reserve a metric slot
    fn check_and_reserve_metric_slot(&self) -> Result<(), MetricsError> {
        let mut current = self.metric_count.load(Ordering::Relaxed);
        loop {
            if current >= self.max_metrics {
                return Err(MetricsError::resource_limit_exceeded(format!(
                    "Maximum number of metrics ({}) exceeded",
                    self.max_metrics
                )));
            }
            match self.metric_count.compare_exchange_weak(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(v) => current = v,
            }
        }
    }

    /// Histogram buckets by metric kind
    fn histogram_buckets(name: &str) -> Vec<f64> {
        if name.contains("duration") {
            // Upstream calls to YouTube take from tens of milliseconds to several seconds
            vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
        } else {
            prometheus::DEFAULT_BUCKETS.to_vec()
        }
    }

    fn get_or_create_counter(
        &self,
        name: &str,
        label_names: &[&str],
    ) -> Result<CounterVec, MetricsError> {
        let full_name = self.apply_namespace(name);
        if self.histograms.contains_key(&full_name) {
            return Err(MetricsError::registration_failed(
                name,
                "name already registered as a histogram",
            ));
        }

        let entry = self.counters.entry(full_name.clone());
        match entry {
            dashmap::mapref::entry::Entry::Occupied(e) => Ok(e.get().clone()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                self.check_and_reserve_metric_slot()?;

                let help = Self::generate_help_text(name, "counter");
                let counter = CounterVec::new(Opts::new(&full_name, help), label_names)
                    .and_then(|counter| {
                        self.registry.register(Box::new(counter.clone()))?;
                        Ok(counter)
                    })
                    .map_err(|err| {
                        self.metric_count.fetch_sub(1, Ordering::SeqCst);
                        MetricsError::registration_failed(name, err.to_string())
                    })?;

                Ok(e.insert(counter).clone())
            }
        }
    }

    fn get_or_create_histogram(
        &self,
        name: &str,
        label_names: &[&str],
    ) -> Result<HistogramVec, MetricsError> {
        let full_name = self.apply_namespace(name);
        if self.counters.contains_key(&full_name) {
            return Err(MetricsError::registration_failed(
                name,
                "name already registered as a counter",
            ));
        }

        let entry = self.histograms.entry(full_name.clone());
        match entry {
            dashmap::mapref::entry::Entry::Occupied(e) => Ok(e.get().clone()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                self.check_and_reserve_metric_slot()?;

                let help = Self::generate_help_text(name, "histogram");
                let opts = HistogramOpts::new(&full_name, help).buckets(Self::histogram_buckets(name));
                let histogram = HistogramVec::new(opts, label_names)
                    .and_then(|histogram| {
                        self.registry.register(Box::new(histogram.clone()))?;
                        Ok(histogram)
                    })
                    .map_err(|err| {
                        self.metric_count.fetch_sub(1, Ordering::SeqCst);
                        MetricsError::registration_failed(name, err.to_string())
                    })?;

                Ok(e.insert(histogram).clone())
            }
        }
    }

    /// Split labels into names and values, sorted by name so the label order of a call never matters
    fn split_labels<'a>(labels: &[(&'a str, &'a str)]) -> (Vec<&'a str>, Vec<&'a str>) {
        let mut sorted = labels.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        sorted.into_iter().unzip()
    }

    /// Number of registered metrics
    pub fn metric_count(&self) -> usize {
        self.metric_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsExporter for PrometheusExporter {
    async fn increment(&self, name: &str, labels: &[(&str, &str)]) -> Result<(), MetricsError> {
        validation::validate_metric_name(name)?;
        validation::validate_labels(labels)?;
        let (label_names, label_values) = Self::split_labels(labels);

        let counter = self.get_or_create_counter(name, &label_names)?;
        counter
            .get_metric_with_label_values(&label_values)
            .map_err(|e| MetricsError::invalid_label(name, e.to_string()))?
            .inc();
        debug!("Incremented counter {} with labels {:?}", name, labels);
        Ok(())
    }

    async fn observe_histogram(
        &self,
        name: &str,
        value: f64,
        labels: &[(&str, &str)],
    ) -> Result<(), MetricsError> {
        validation::validate_metric_name(name)?;
        validation::validate_labels(labels)?;
        validation::validate_numeric_value(value)?;
        let (label_names, label_values) = Self::split_labels(labels);

        let histogram = self.get_or_create_histogram(name, &label_names)?;
        histogram
            .get_metric_with_label_values(&label_values)
            .map_err(|e| MetricsError::invalid_label(name, e.to_string()))?
            .observe(value);
        debug!("Observed histogram {} with value {} and labels {:?}", name, value, labels);
        Ok(())
    }

    async fn export(&self) -> Result<Vec<u8>, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::export_failed(format!("Failed to encode metrics: {}", e)))?;
        Ok(buffer)
    }
}
