// Configuration validation module for YouTube Data API
//
// Every configuration parameter is declared once in `CONFIG_PARAMS` with its
// type, default and severity. Startup validates the environment (after the
// configuration file has been loaded into it) against this registry and aborts
// on errors.

use std::env;
use std::net::IpAddr;

use log::{error, info, warn};
use thiserror::Error;

use crate::metrics::error::validation::validate_metric_name;

/// Expected shape of a parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigType {
    Text,
    Unsigned { min: u64, max: u64 },
    Boolean,
    IpAddress,
    Port,
    Url,
}

/// What an invalid value does to startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationLevel {
    /// Startup is refused
    Error,
    /// Logged, startup continues
    Warning,
}

/// Configuration parameter definition
#[derive(Debug, Clone)]
pub struct ConfigParam {
    pub name: &'static str,
    pub description: &'static str,
    pub param_type: ConfigType,
    pub default_value: Option<&'static str>,
    pub required: bool,
    pub level: ValidationLevel,
}

const fn optional(
    name: &'static str,
    param_type: ConfigType,
    default_value: Option<&'static str>,
    level: ValidationLevel,
    description: &'static str,
) -> ConfigParam {
    ConfigParam {
        name,
        description,
        param_type,
        default_value,
        required: false,
        level,
    }
}

/// Centralized configuration parameter registry
pub const CONFIG_PARAMS: &[ConfigParam] = &[
    // Server
    optional(
        "YOUTUBE_DATA_API_HOST",
        ConfigType::IpAddress,
        Some("127.0.0.1"),
        ValidationLevel::Error,
        "Host IP address for the API server",
    ),
    optional(
        "YOUTUBE_DATA_API_PORT",
        ConfigType::Port,
        Some("8000"),
        ValidationLevel::Error,
        "Port for the API server",
    ),
    optional(
        "YOUTUBE_DATA_API_KEEPALIVE",
        ConfigType::Unsigned { min: 1, max: 3600 },
        Some("75"),
        ValidationLevel::Error,
        "Keep-alive timeout in seconds",
    ),
    optional(
        "HTTP_WORKER_NUMBER",
        ConfigType::Unsigned { min: 0, max: 64 },
        Some("0"),
        ValidationLevel::Error,
        "Number of HTTP workers (0 = use CPU cores)",
    ),
    // Providers
    ConfigParam {
        name: "YOUTUBE_API_KEY",
        description: "YouTube Data API v3 key used for titles and thumbnails",
        param_type: ConfigType::Text,
        default_value: None,
        required: true,
        level: ValidationLevel::Warning,
    },
    optional(
        "YOUTUBE_DATA_API_BASE_URL",
        ConfigType::Url,
        Some("https://www.googleapis.com/youtube/v3"),
        ValidationLevel::Error,
        "Base URL of the YouTube Data API v3",
    ),
    optional(
        "YOUTUBE_BASE_URL",
        ConfigType::Url,
        Some("https://www.youtube.com"),
        ValidationLevel::Error,
        "Base URL of the YouTube website used for caption tracks",
    ),
    optional(
        "UPSTREAM_TIMEOUT_SECONDS",
        ConfigType::Unsigned { min: 1, max: 600 },
        Some("30"),
        ValidationLevel::Error,
        "Timeout of every upstream request in seconds",
    ),
    optional(
        "TRANSCRIPT_ACCEPT_LANGUAGE",
        ConfigType::Text,
        Some("en-US"),
        ValidationLevel::Warning,
        "Accept-Language header sent when fetching caption tracks",
    ),
    // Authentication
    optional(
        "ENABLE_AUTHORIZATION",
        ConfigType::Boolean,
        Some("true"),
        ValidationLevel::Error,
        "Require the X-API-Key header on API requests",
    ),
    optional(
        "API_KEY",
        ConfigType::Text,
        None,
        ValidationLevel::Error,
        "Key clients must send in the X-API-Key header",
    ),
    // Metrics
    optional(
        "METRICS_ENABLED",
        ConfigType::Boolean,
        Some("true"),
        ValidationLevel::Error,
        "Enable Prometheus metrics on /metrics",
    ),
    optional(
        "METRICS_NAMESPACE",
        ConfigType::Text,
        Some("youtube_data_api"),
        ValidationLevel::Warning,
        "Prefix for all exported metrics",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigErrorKind {
    Missing,
    Malformed,
    OutOfRange,
}

/// A rejected configuration value
#[derive(Debug, Clone, Error)]
#[error("Configuration error in '{field}' ({kind:?}): {message} (value: '{value}'){}", hint_suffix(.hint))]
pub struct ConfigValidationError {
    pub field: String,
    pub value: String,
    pub kind: ConfigErrorKind,
    pub message: String,
    pub hint: Option<String>,
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!(" - Suggestion: {}", h))
        .unwrap_or_default()
}

impl ConfigValidationError {
    fn new(field: &str, value: &str, kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
            kind,
            message: message.into(),
            hint: None,
        }
    }

    fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Errors and warnings collected over the whole registry
#[derive(Debug, Default)]
pub struct ValidationResults {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResults {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, level: ValidationLevel, error: ConfigValidationError) {
        match level {
            ValidationLevel::Error => self.errors.push(error),
            ValidationLevel::Warning => self.warnings.push(error),
        }
    }

    pub fn log_summary(&self) {
        for (i, err) in self.errors.iter().enumerate() {
            error!("  {}. {}", i + 1, err);
        }
        for (i, warning) in self.warnings.iter().enumerate() {
            warn!("  {}. {}", i + 1, warning);
        }
        info!(
            "Configuration validation finished: {} error(s), {} warning(s)",
            self.errors.len(),
            self.warnings.len()
        );
    }
}

/// Check one value against its declared type
pub fn check_value(
    field: &str,
    param_type: ConfigType,
    value: &str,
) -> Result<(), ConfigValidationError> {
    let malformed =
        |message: &str| ConfigValidationError::new(field, value, ConfigErrorKind::Malformed, message);

    match param_type {
        ConfigType::Text => Ok(()),
        ConfigType::Boolean => value
            .parse::<bool>()
            .map(|_| ())
            .map_err(|_| malformed("Invalid boolean").hint("Use 'true' or 'false'")),
        ConfigType::IpAddress => value.parse::<IpAddr>().map(|_| ()).map_err(|_| {
            malformed("Invalid IP address").hint("Use an address such as 127.0.0.1 or ::1")
        }),
        ConfigType::Port => match value.parse::<u16>() {
            Ok(0) | Err(_) => Err(malformed("Invalid port").hint("Use a port between 1 and 65535")),
            Ok(_) => Ok(()),
        },
        ConfigType::Unsigned { min, max } => {
            let parsed = value
                .parse::<u64>()
                .map_err(|_| malformed("Invalid unsigned integer"))?;
            if (min..=max).contains(&parsed) {
                Ok(())
            } else {
                Err(ConfigValidationError::new(
                    field,
                    value,
                    ConfigErrorKind::OutOfRange,
                    format!("Value {} is outside {}..={}", parsed, min, max),
                ))
            }
        }
        ConfigType::Url => match url::Url::parse(value) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
            _ => Err(malformed("Invalid http(s) URL")
                .hint("Use an absolute URL such as https://www.youtube.com")),
        },
    }
}

/// Validate the process environment, see [`ConfigValidator::validate_with`]
pub fn validate_config() -> Result<ValidationResults, ValidationResults> {
    ConfigValidator::validate_with(|name| env::var(name).ok())
}

/// Registry-driven validator for the service configuration
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate every registered parameter using `lookup` to read values
    ///
    /// Returns `Err` when at least one error-level parameter is invalid.
    /// The summary is logged either way.
    pub fn validate_with<F>(lookup: F) -> Result<ValidationResults, ValidationResults>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut results = ValidationResults::default();

        for param in CONFIG_PARAMS {
            let value = lookup(param.name)
                .or_else(|| param.default_value.map(String::from))
                .unwrap_or_default();

            if value.is_empty() {
                if param.required {
                    results.record(
                        param.level,
                        ConfigValidationError::new(
                            param.name,
                            "",
                            ConfigErrorKind::Missing,
                            "Required parameter is missing",
                        )
                        .hint(format!("Set {} ({})", param.name, param.description)),
                    );
                }
                continue;
            }

            if let Err(error) = check_value(param.name, param.param_type, &value) {
                results.record(param.level, error);
            }
        }

        Self::validate_cross_dependencies(&mut results, &lookup);
        results.log_summary();

        if results.is_valid() {
            Ok(results)
        } else {
            Err(results)
        }
    }

    fn validate_cross_dependencies<F>(results: &mut ValidationResults, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let authorization_enabled = lookup("ENABLE_AUTHORIZATION")
            .and_then(|value| value.parse::<bool>().ok())
            .unwrap_or(true);
        let api_key_missing = lookup("API_KEY").map_or(true, |key| key.trim().is_empty());

        if authorization_enabled && api_key_missing {
            results.record(
                ValidationLevel::Error,
                ConfigValidationError::new(
                    "API_KEY",
                    "",
                    ConfigErrorKind::Missing,
                    "API_KEY is required when ENABLE_AUTHORIZATION is true",
                )
                .hint("Set API_KEY or disable authorization with ENABLE_AUTHORIZATION=false"),
            );
        }

        let namespace = lookup("METRICS_NAMESPACE").unwrap_or_default();
        if !namespace.is_empty() && validate_metric_name(&namespace).is_err() {
            results.record(
                ValidationLevel::Warning,
                ConfigValidationError::new(
                    "METRICS_NAMESPACE",
                    &namespace,
                    ConfigErrorKind::Malformed,
                    "Namespace is not a valid Prometheus metric name prefix",
                )
                .hint("Use letters, digits and underscores only"),
            );
        }
    }
}
