// Configuration loader for YouTube Data API
//
// This module handles loading configuration from the TOML configuration file
// and environment variables with appropriate precedence.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use toml::Value;

const CONFIG_FILE_PATH: &str = "youtube_data_api.conf";

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "YOUTUBE_DATA_API_CONFIG";

/// Location of the configuration file
pub fn config_file_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_PATH))
}

/// Loads configuration from TOML file and environment variables
///
/// Configuration precedence (highest to lowest):
/// 1. Environment variables
/// 2. Configuration file values
/// 3. Default values (not handled here - application defaults)
///
/// # Returns
///
/// Returns true if the config file was successfully loaded, false otherwise
pub fn load_config() -> bool {
    load_config_from(&config_file_path())
}

/// Load a specific configuration file, see [`load_config`]
pub fn load_config_from(config_path: &Path) -> bool {
    if !config_path.exists() {
        debug!("Configuration file not found at: {}", config_path.display());
        return false;
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read configuration file: {}", e);
            return false;
        }
    };

    let config_map = match parse_config(&config_content) {
        Ok(map) => map,
        Err(e) => {
            warn!("Failed to parse configuration file: {}", e);
            return false;
        }
    };

    // Set environment variables from config file if they don't already exist
    for (key, value) in config_map {
        if env::var(&key).is_err() {
            debug!(
                "Setting env var from config file: {} = {}",
                key,
                displayable(&key, &value)
            );
            env::set_var(key, value);
        } else {
            debug!("Env var already exists, skipping: {}", key);
        }
    }

    info!("Configuration loaded from {}", config_path.display());
    true
}

/// Flatten a TOML document into string key-value pairs
///
/// The file is expected to be flat. Arrays and tables are skipped with a warning.
pub fn parse_config(content: &str) -> Result<BTreeMap<String, String>, toml::de::Error> {
    let table: toml::Table = content.parse()?;

    let mut config_map = BTreeMap::new();
    for (key, value) in table {
        let value = match value {
            Value::String(s) => s,
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            _ => {
                warn!("Skipping unsupported TOML value type for key: {}", key);
                continue;
            }
        };
        config_map.insert(key, value);
    }

    Ok(config_map)
}

/// Hide credentials from logs
fn displayable<'a>(key: &str, value: &'a str) -> &'a str {
    if key.ends_with("API_KEY") {
        "<redacted>"
    } else {
        value
    }
}
