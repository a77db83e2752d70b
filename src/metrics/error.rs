//! Error types for the metrics system
//!
//! Metric names and labels are validated before they reach an exporter so a bad
//! label can never panic inside the Prometheus client.

use std::fmt;
use thiserror::Error;

/// Error types for metrics operations
#[derive(Error, Debug, Clone)]
pub enum MetricsError {
    /// Invalid metric name (e.g., empty, invalid characters)
    #[error("Invalid metric name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Invalid label name or value
    #[error("Invalid label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },

    /// Metric registration failed (e.g., name registered with another type)
    #[error("Failed to register metric '{name}': {reason}")]
    RegistrationFailed { name: String, reason: String },

    /// Metric export failed
    #[error("Failed to export metrics: {reason}")]
    ExportFailed { reason: String },

    /// Value validation error (e.g., NaN, infinite)
    #[error("Invalid value '{value}': {reason}")]
    InvalidValue { value: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    ConfigurationError { reason: String },

    /// Too many metrics registered
    #[error("Resource limit exceeded: {reason}")]
    ResourceLimitExceeded { reason: String },
}

impl MetricsError {
    pub fn invalid_name<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_label<L: Into<String>, R: Into<String>>(label: L, reason: R) -> Self {
        Self::InvalidLabel {
            label: label.into(),
            reason: reason.into(),
        }
    }

    pub fn registration_failed<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::RegistrationFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn export_failed<R: Into<String>>(reason: R) -> Self {
        Self::ExportFailed {
            reason: reason.into(),
        }
    }

    pub fn invalid_value<V: fmt::Display, R: Into<String>>(value: V, reason: R) -> Self {
        Self::InvalidValue {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn configuration_error<R: Into<String>>(reason: R) -> Self {
        Self::ConfigurationError {
            reason: reason.into(),
        }
    }

    pub fn resource_limit_exceeded<R: Into<String>>(reason: R) -> Self {
        Self::ResourceLimitExceeded {
            reason: reason.into(),
        }
    }
}

/// Checks applied before a sample reaches the Prometheus client
pub mod validation {
    use super::MetricsError;

    /// Endpoint paths and outcome labels stay far below this
    const MAX_LABEL_VALUE_LENGTH: usize = 256;

    /// Prometheus identifier: a letter or `_` followed by letters, digits or `_`
    fn is_identifier(candidate: &str, allow_colon: bool) -> bool {
        let mut chars = candidate.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
            _ => return false,
        }
        chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || (allow_colon && ch == ':'))
    }

    /// Validate a metric name, colons allowed for recording-rule style names
    pub fn validate_metric_name(name: &str) -> Result<(), MetricsError> {
        if is_identifier(name, true) {
            Ok(())
        } else {
            Err(MetricsError::invalid_name(
                name,
                "expected a letter or '_' followed by letters, digits, '_' or ':'",
            ))
        }
    }

    /// Validate label pairs: identifier keys without `__` prefix, unique,
    /// with short printable values
    pub fn validate_labels(labels: &[(&str, &str)]) -> Result<(), MetricsError> {
        for (index, (key, value)) in labels.iter().enumerate() {
            if !is_identifier(key, false) || key.starts_with("__") {
                return Err(MetricsError::invalid_label(*key, "not a valid label name"));
            }
            if labels[..index].iter().any(|(other, _)| other == key) {
                return Err(MetricsError::invalid_label(*key, "duplicate label"));
            }
            if value.len() > MAX_LABEL_VALUE_LENGTH || value.chars().any(char::is_control) {
                return Err(MetricsError::invalid_label(
                    *key,
                    "value is too long or contains control characters",
                ));
            }
        }
        Ok(())
    }

    /// Observations must be finite
    pub fn validate_numeric_value(value: f64) -> Result<(), MetricsError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(MetricsError::invalid_value(value, "not a finite number"))
        }
    }
}
