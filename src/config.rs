// YouTube Data API configuration
//
// This module contains configuration structures and constants for the service.
// The whole configuration is read from environment variables once at startup
// (after `config_loader` has merged the optional TOML file into the environment)
// and then handed explicitly to the providers and handlers.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default values for configuration
pub mod defaults {
    // Address the HTTP server binds to
    pub const HOST: &str = "127.0.0.1";

    // Port the HTTP server binds to
    pub const PORT: u16 = 8000;

    // Keep-alive timeout in seconds
    pub const KEEPALIVE_SECONDS: u64 = 75;

    // Number of HTTP workers (0 = one per CPU core)
    pub const HTTP_WORKER_NUMBER: usize = 0;

    // YouTube Data API v3 endpoint
    pub const DATA_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

    // YouTube web front-end, used for watch pages and the InnerTube player endpoint
    pub const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

    // Timeout in seconds for each upstream HTTP request
    pub const UPSTREAM_TIMEOUT_SECONDS: u64 = 30;

    // Accept-Language sent to YouTube when scraping caption tracks
    pub const TRANSCRIPT_ACCEPT_LANGUAGE: &str = "en-US";

    // API key authentication is on unless explicitly disabled
    pub const ENABLE_AUTHORIZATION: bool = true;

    // Name of the header carrying the client API key
    pub const API_KEY_HEADER: &str = "X-API-Key";

    // Metrics collection is on unless explicitly disabled
    pub const METRICS_ENABLED: bool = true;

    // Prefix for every exported metric
    pub const METRICS_NAMESPACE: &str = "youtube_data_api";
}

/// Read an environment variable, falling back to a default
fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an environment variable, falling back to a default when unset or unparsable
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read an environment variable, treating empty values as unset
fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Keep-alive timeout in seconds
    pub keep_alive: u64,
    /// Number of HTTP workers, 0 meaning one per CPU core
    pub workers: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("YOUTUBE_DATA_API_HOST", defaults::HOST),
            port: env_parse("YOUTUBE_DATA_API_PORT", defaults::PORT),
            keep_alive: env_parse("YOUTUBE_DATA_API_KEEPALIVE", defaults::KEEPALIVE_SECONDS),
            workers: env_parse("HTTP_WORKER_NUMBER", defaults::HTTP_WORKER_NUMBER),
        }
    }

    /// Worker count to hand to the HTTP server
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings shared by the upstream providers
#[derive(Clone)]
pub struct ProviderConfig {
    /// YouTube Data API key; requests for titles and thumbnails fail without one
    pub youtube_api_key: Option<String>,
    pub data_api_base_url: String,
    pub youtube_base_url: String,
    /// Timeout in seconds for each upstream request
    pub upstream_timeout: u64,
    pub accept_language: String,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self {
            youtube_api_key: env_non_empty("YOUTUBE_API_KEY"),
            data_api_base_url: env_or("YOUTUBE_DATA_API_BASE_URL", defaults::DATA_API_BASE_URL),
            youtube_base_url: env_or("YOUTUBE_BASE_URL", defaults::YOUTUBE_BASE_URL),
            upstream_timeout: env_parse(
                "UPSTREAM_TIMEOUT_SECONDS",
                defaults::UPSTREAM_TIMEOUT_SECONDS,
            ),
            accept_language: env_or(
                "TRANSCRIPT_ACCEPT_LANGUAGE",
                defaults::TRANSCRIPT_ACCEPT_LANGUAGE,
            ),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            data_api_base_url: defaults::DATA_API_BASE_URL.to_string(),
            youtube_base_url: defaults::YOUTUBE_BASE_URL.to_string(),
            upstream_timeout: defaults::UPSTREAM_TIMEOUT_SECONDS,
            accept_language: defaults::TRANSCRIPT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field(
                "youtube_api_key",
                &self.youtube_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("data_api_base_url", &self.data_api_base_url)
            .field("youtube_base_url", &self.youtube_base_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("accept_language", &self.accept_language)
            .finish()
    }
}

/// Client authentication settings
#[derive(Clone)]
pub struct AuthConfig {
    pub enabled: bool,
    /// Key clients must send in the `X-API-Key` header
    pub api_key: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env_parse("ENABLE_AUTHORIZATION", defaults::ENABLE_AUTHORIZATION),
            api_key: env_non_empty("API_KEY"),
        }
    }

    /// Configuration with authentication turned off
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            api_key: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Configuration for metrics collection and export
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Prefix for all metric names
    pub namespace: Option<String>,
}

impl MetricsConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env_parse("METRICS_ENABLED", defaults::METRICS_ENABLED),
            namespace: Some(env_or("METRICS_NAMESPACE", defaults::METRICS_NAMESPACE))
                .filter(|ns| !ns.trim().is_empty()),
        }
    }
}

/// Process-wide configuration built once at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub providers: ProviderConfig,
    pub auth: AuthConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            providers: ProviderConfig::from_env(),
            auth: AuthConfig::from_env(),
            metrics: MetricsConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_redacts_keys() {
        let providers = ProviderConfig {
            youtube_api_key: Some("AIza-secret".to_string()),
            ..ProviderConfig::default()
        };
        let auth = AuthConfig {
            enabled: true,
            api_key: Some("client-secret".to_string()),
        };

        let rendered = format!("{:?} {:?}", providers, auth);
        assert!(!rendered.contains("AIza-secret"));
        assert!(!rendered.contains("client-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_explicit_worker_count_is_kept() {
        let server = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 9000,
            keep_alive: 5,
            workers: 3,
        };
        assert_eq!(server.effective_workers(), 3);
        assert_eq!(server.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_zero_workers_means_cpu_count() {
        let server = ServerConfig {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            keep_alive: defaults::KEEPALIVE_SECONDS,
            workers: 0,
        };
        assert!(server.effective_workers() >= 1);
    }

    #[test]
    fn test_provider_timeout() {
        let config = ProviderConfig {
            upstream_timeout: 7,
            ..ProviderConfig::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(7));
    }
}
