//! Configuration management for docpipe using the prefer crate.
//!
//! A config file is discovered with `prefer::load("docpipe")` or passed
//! explicitly, parsed by extension (TOML, YAML or JSON), then overridden from
//! `DOCPIPE_*` environment variables.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scanner::{ClamdScanner, ClamscanScanner, ContentScanner};
use crate::services::pipeline::{PipelineConfig, DEFAULT_MAX_BLOB_BYTES};
use crate::storage::{BlobFetcher, HttpFetcher, LocalFetcher};

pub const ENV_STORAGE_ROOT: &str = "DOCPIPE_STORAGE_ROOT";
pub const ENV_STORAGE_URL: &str = "DOCPIPE_STORAGE_URL";
pub const ENV_CLAMD_ADDRESS: &str = "DOCPIPE_CLAMD_ADDRESS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "DOCPIPE_FETCH_TIMEOUT_SECS";
pub const ENV_SCAN_TIMEOUT_SECS: &str = "DOCPIPE_SCAN_TIMEOUT_SECS";
pub const ENV_MAX_BLOB_BYTES: &str = "DOCPIPE_MAX_BLOB_BYTES";
pub const ENV_SCRATCH_DIR: &str = "DOCPIPE_SCRATCH_DIR";

const DEFAULT_CLAMD_ADDRESS: &str = "127.0.0.1:3310";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where blobs are fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Objects at `root/<container>/<key>`.
    Local { root: PathBuf },
    /// Objects at `<base_url>/<container>/<key>`.
    Http {
        base_url: String,
        #[serde(default = "default_connect_timeout_secs")]
        connect_timeout_secs: u64,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local {
            root: PathBuf::from("./storage"),
        }
    }
}

impl StorageConfig {
    pub fn build(&self) -> Result<Arc<dyn BlobFetcher>, ConfigError> {
        match self {
            StorageConfig::Local { root } => Ok(Arc::new(LocalFetcher::new(root.clone()))),
            StorageConfig::Http {
                base_url,
                connect_timeout_secs,
            } => {
                let fetcher =
                    HttpFetcher::new(base_url.clone(), Duration::from_secs(*connect_timeout_secs))
                        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
                Ok(Arc::new(fetcher))
            }
        }
    }
}

/// Which scanning engine to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ScannerConfig {
    Clamd {
        #[serde(default = "default_clamd_address")]
        address: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chunk_size: Option<usize>,
    },
    Clamscan {
        #[serde(default = "default_clamscan_binary")]
        binary: String,
    },
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig::Clamd {
            address: default_clamd_address(),
            chunk_size: None,
        }
    }
}

impl ScannerConfig {
    pub fn build(&self) -> Arc<dyn ContentScanner> {
        match self {
            ScannerConfig::Clamd {
                address,
                chunk_size,
            } => {
                let scanner = ClamdScanner::new(address.clone());
                match chunk_size {
                    Some(size) => Arc::new(scanner.with_chunk_size(*size)),
                    None => Arc::new(scanner),
                }
            }
            ScannerConfig::Clamscan { binary } => Arc::new(ClamscanScanner::new(binary.clone())),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_clamd_address() -> String {
    DEFAULT_CLAMD_ADDRESS.to_string()
}

fn default_clamscan_binary() -> String {
    "clamscan".to_string()
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parent directory for scratch space. System temp dir if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    /// Largest blob accepted, in bytes.
    pub max_blob_bytes: u64,
    pub fetch_timeout_secs: u64,
    pub scan_timeout_secs: u64,
    /// Documents processed at once by the `event` command.
    pub batch_concurrency: usize,
    pub storage: StorageConfig,
    pub scanner: ScannerConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            max_blob_bytes: DEFAULT_MAX_BLOB_BYTES,
            fetch_timeout_secs: 60,
            scan_timeout_secs: 120,
            batch_concurrency: 4,
            storage: StorageConfig::default(),
            scanner: ScannerConfig::default(),
            source_path: None,
        }
    }
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    ///
    /// Falls back to defaults when no file is found or the file is unusable.
    pub async fn load() -> Self {
        match prefer::load("docpipe").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Ignoring config file: {}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// Relative paths in the file are resolved against its directory.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());

        if let Some(base) = config.base_dir() {
            config.resolve_relative(&base);
        }
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }

    /// Directory of the config file, if loaded from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    fn resolve_relative(&mut self, base: &Path) {
        if let StorageConfig::Local { root } = &mut self.storage {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
        if let Some(dir) = self.scratch_dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Apply `DOCPIPE_*` environment variables.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// When both storage variables are set the URL wins.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(root) = get(ENV_STORAGE_ROOT) {
            self.storage = StorageConfig::Local {
                root: PathBuf::from(root),
            };
        }
        if let Some(base_url) = get(ENV_STORAGE_URL) {
            self.storage = StorageConfig::Http {
                base_url,
                connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            };
        }
        if let Some(address) = get(ENV_CLAMD_ADDRESS) {
            self.scanner = ScannerConfig::Clamd {
                address,
                chunk_size: None,
            };
        }
        if let Some(dir) = get(ENV_SCRATCH_DIR) {
            self.scratch_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = get(ENV_FETCH_TIMEOUT_SECS) {
            self.fetch_timeout_secs = parse_env(ENV_FETCH_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = get(ENV_SCAN_TIMEOUT_SECS) {
            self.scan_timeout_secs = parse_env(ENV_SCAN_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = get(ENV_MAX_BLOB_BYTES) {
            self.max_blob_bytes = parse_env(ENV_MAX_BLOB_BYTES, &value)?;
        }
        Ok(self)
    }

    /// Reject values that would make every run fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.scan_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "scan_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_blob_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_blob_bytes must be greater than zero".to_string(),
            ));
        }
        if self.batch_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "batch_concurrency must be greater than zero".to_string(),
            ));
        }
        if let StorageConfig::Http { base_url, .. } = &self.storage {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "storage base_url must be http(s): {}",
                    base_url
                )));
            }
        }
        Ok(())
    }

    /// Pipeline settings derived from this config.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            scratch_dir: self.scratch_dir.clone(),
            max_blob_bytes: self.max_blob_bytes,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            scan_timeout: Duration::from_secs(self.scan_timeout_secs),
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}
