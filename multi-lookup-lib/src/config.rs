//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files, merging
//! discovered files with proper precedence, and reading `ML_*` environment
//! variables.

use crate::error::LookupError;
use crate::types::{AddressFamily, MAX_QUEUE_CAPACITY, MAX_RESOLVER_THREADS};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Pipeline sizing defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default values that map to the sizing CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Number of resolver threads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolvers: Option<usize>,

    /// Shared queue capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,

    /// Per-lookup timeout (as string, e.g., "500ms", "5s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Output file formatting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Marker written for hostnames that do not resolve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_found_marker: Option<String>,

    /// Write every address instead of the first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_addresses: Option<bool>,

    /// Address family filter (any, v4, v6)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<AddressFamily>,

    /// Append to the output file instead of truncating it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were found and merged
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, LookupError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LookupError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            LookupError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is the lowest precedence, then the home directory file,
    /// then a file in the current directory.
    pub fn discover_and_load(&self) -> Result<FileConfig, LookupError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                }
            }
        }

        if self.verbose {
            for path in &loaded_files {
                tracing::info!(path = %path.display(), "loaded config file");
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./multi-lookup.toml", "./.multi-lookup.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let path = Path::new(&home).join(".multi-lookup.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("multi-lookup").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.resolvers.is_some() {
                        lower_defaults.resolvers = higher_defaults.resolvers;
                    }
                    if higher_defaults.queue_capacity.is_some() {
                        lower_defaults.queue_capacity = higher_defaults.queue_capacity;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    Some(lower_defaults)
                }
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            output: match (lower.output, higher.output) {
                (Some(mut lower_output), Some(higher_output)) => {
                    if higher_output.not_found_marker.is_some() {
                        lower_output.not_found_marker = higher_output.not_found_marker;
                    }
                    if higher_output.all_addresses.is_some() {
                        lower_output.all_addresses = higher_output.all_addresses;
                    }
                    if higher_output.family.is_some() {
                        lower_output.family = higher_output.family;
                    }
                    if higher_output.append.is_some() {
                        lower_output.append = higher_output.append;
                    }
                    Some(lower_output)
                }
                (lower_output, higher_output) => higher_output.or(lower_output),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), LookupError> {
        if let Some(defaults) = &config.defaults {
            if let Some(resolvers) = defaults.resolvers {
                if resolvers == 0 || resolvers > MAX_RESOLVER_THREADS {
                    return Err(LookupError::config(format!(
                        "Resolvers must be between 1 and {}",
                        MAX_RESOLVER_THREADS
                    )));
                }
            }

            if let Some(capacity) = defaults.queue_capacity {
                if capacity == 0 || capacity > MAX_QUEUE_CAPACITY {
                    return Err(LookupError::config(format!(
                        "Queue capacity must be between 1 and {}",
                        MAX_QUEUE_CAPACITY
                    )));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_duration(timeout_str).is_none() {
                    return Err(LookupError::config(format!(
                        "Invalid timeout format '{}'. Use format like '500ms', '5s', '2m'",
                        timeout_str
                    )));
                }
            }
        }

        if let Some(output) = &config.output {
            if let Some(marker) = &output.not_found_marker {
                if marker.is_empty() || marker.contains(',') || marker.contains('\n') {
                    return Err(LookupError::config(format!(
                        "Invalid not_found_marker '{}'",
                        marker
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub resolvers: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub timeout: Option<Duration>,
    pub not_found_marker: Option<String>,
    pub all_addresses: Option<bool>,
    pub family: Option<AddressFamily>,
    pub append: Option<bool>,
    pub config: Option<String>,
}

/// Load configuration from `ML_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    load_env_config_from(verbose, |key| env::var(key).ok())
}

fn load_env_config_from<F>(verbose: bool, var: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = var("ML_RESOLVERS") {
        match val.trim().parse::<usize>() {
            Ok(n) if (1..=MAX_RESOLVER_THREADS).contains(&n) => {
                env_config.resolvers = Some(n);
                log_env(verbose, "ML_RESOLVERS", &val);
            }
            _ => tracing::warn!(
                "Invalid ML_RESOLVERS='{}', must be 1-{}",
                val,
                MAX_RESOLVER_THREADS
            ),
        }
    }

    if let Some(val) = var("ML_QUEUE_CAPACITY") {
        match val.trim().parse::<usize>() {
            Ok(n) if (1..=MAX_QUEUE_CAPACITY).contains(&n) => {
                env_config.queue_capacity = Some(n);
                log_env(verbose, "ML_QUEUE_CAPACITY", &val);
            }
            _ => tracing::warn!(
                "Invalid ML_QUEUE_CAPACITY='{}', must be 1-{}",
                val,
                MAX_QUEUE_CAPACITY
            ),
        }
    }

    if let Some(val) = var("ML_TIMEOUT") {
        match parse_duration(&val) {
            Some(timeout) => {
                env_config.timeout = Some(timeout);
                log_env(verbose, "ML_TIMEOUT", &val);
            }
            None => tracing::warn!(
                "Invalid ML_TIMEOUT='{}', use format like '500ms', '5s', '2m'",
                val
            ),
        }
    }

    if let Some(val) = var("ML_NOT_FOUND") {
        if val.is_empty() || val.contains(',') || val.contains('\n') {
            tracing::warn!("Invalid ML_NOT_FOUND='{}', must be non-empty without commas", val);
        } else {
            log_env(verbose, "ML_NOT_FOUND", &val);
            env_config.not_found_marker = Some(val);
        }
    }

    if let Some(val) = var("ML_ALL_ADDRESSES") {
        env_config.all_addresses = parse_bool_var("ML_ALL_ADDRESSES", &val, verbose);
    }

    if let Some(val) = var("ML_FAMILY") {
        match val.parse::<AddressFamily>() {
            Ok(family) => {
                env_config.family = Some(family);
                log_env(verbose, "ML_FAMILY", &val);
            }
            Err(_) => tracing::warn!("Invalid ML_FAMILY='{}', use any, v4 or v6", val),
        }
    }

    if let Some(val) = var("ML_APPEND") {
        env_config.append = parse_bool_var("ML_APPEND", &val, verbose);
    }

    if let Some(path) = var("ML_CONFIG") {
        if !path.trim().is_empty() {
            log_env(verbose, "ML_CONFIG", &path);
            env_config.config = Some(path);
        }
    }

    env_config
}

fn log_env(verbose: bool, key: &str, val: &str) {
    if verbose {
        tracing::info!("Using {}={}", key, val);
    }
}

fn parse_bool_var(key: &str, val: &str, verbose: bool) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => {
            log_env(verbose, key, "true");
            Some(true)
        }
        "false" | "0" | "no" | "off" => {
            log_env(verbose, key, "false");
            Some(false)
        }
        _ => {
            tracing::warn!("Invalid {}='{}', use true/false", key, val);
            None
        }
    }
}

/// Parse a duration like "500ms", "5s" or "2m". A bare number means seconds.
///
/// Zero durations are rejected since a lookup could never succeed.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim().to_lowercase();

    let duration = if let Some(ms) = s.strip_suffix("ms") {
        Duration::from_millis(ms.trim().parse::<u64>().ok()?)
    } else if let Some(secs) = s.strip_suffix('s') {
        Duration::from_secs(secs.trim().parse::<u64>().ok()?)
    } else if let Some(mins) = s.strip_suffix('m') {
        Duration::from_secs(mins.trim().parse::<u64>().ok()?.checked_mul(60)?)
    } else {
        Duration::from_secs(s.parse::<u64>().ok()?)
    };

    if duration.is_zero() {
        None
    } else {
        Some(duration)
    }
}
