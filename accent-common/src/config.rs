//! Bootstrap configuration loading
//!
//! All settings are read once at startup from a TOML file and cannot change
//! while the service is running. The active model in particular is selected
//! only here: there is no environment or per-request override.
//!
//! # Config File Discovery
//!
//! 1. Explicit path from the command line (must exist)
//! 2. `<user config dir>/accent-id/config.toml`
//! 3. `/etc/accent-id/config.toml` (Linux)
//! 4. Built-in defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Identifier of the model loaded when the config names none
pub const DEFAULT_MODEL_NAME: &str = "Jzuluaga/accent-id-commonaccent_ecapa";

/// Directory for downloaded model artifacts, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = "pretrained_models";

/// Upload size accepted by the classify endpoint (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const CONFIG_DIR_NAME: &str = "accent-id";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Interface to bind the HTTP listener to
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Model selection and artifact location
    #[serde(default)]
    pub model: ModelConfig,

    /// Upload staging limits
    #[serde(default)]
    pub upload: UploadConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier; must name one of the supported models
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Where artifacts come from: an existing local directory or a hub repo id.
    /// Defaults to `name`.
    #[serde(default)]
    pub source: Option<String>,

    /// Local cache for downloaded artifacts
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Threads used by the inference runtime within one classification
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

/// Upload handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Request body limit for the classify endpoint
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,

    /// Directory for staged uploads (system temp dir if not specified)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Upper bound on a single classification; unbounded if not specified
    #[serde(default)]
    pub classify_timeout_secs: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

fn default_intra_threads() -> usize {
    1
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model: ModelConfig::default(),
            upload: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            source: None,
            cache_dir: default_cache_dir(),
            intra_threads: default_intra_threads(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
            temp_dir: None,
            classify_timeout_secs: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ModelConfig {
    /// Artifact source, falling back to the model identifier
    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

/// Load bootstrap configuration
///
/// An explicit path must exist and parse. Without one, the first discovered
/// config file is used, and a missing file falls back to defaults so the
/// service can start unconfigured.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        info!("Loading config from {}", path.display());
        return TomlConfig::from_file(path);
    }

    match discover_config_file() {
        Some(path) => {
            info!("Loading config from {}", path.display());
            TomlConfig::from_file(&path)
        }
        None => {
            warn!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Find the first existing config file in the platform search order
fn discover_config_file() -> Option<PathBuf> {
    default_config_paths().into_iter().find(|p| p.exists())
}

/// Candidate config file locations, highest priority first
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    if cfg!(target_os = "linux") {
        paths.push(PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    paths
}
