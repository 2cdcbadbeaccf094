//! Configuration module for mpegflow-rs
//!
//! This module handles engine configuration:
//! - Defaults applied to newly created nodes
//! - Logging setup
//!
//! # Config Location
//!
//! The config file is stored in the platform-appropriate location:
//! - **Linux**: `~/.config/mpegflow-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/mpegflow-rs/config.toml`
//! - **Windows**: `%APPDATA%\mpegflow-rs\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use mpegflow_rs::config::EngineConfig;
//!
//! let config = EngineConfig::load_or_default(EngineConfig::default_path()?);
//! let _guard = mpegflow_rs::logging::init(&config.logging);
//! let factory = NodeFactory::new(config.defaults);
//! ```

use crate::codec::dct::DEFAULT_QUALITY;
use crate::codec::motion::{ChromaVectors, MAX_RADIUS};
use crate::codec::subsample::SamplingMode;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "mpegflow-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Graph document file extension
pub const GRAPH_FILE_EXTENSION: &str = "mpegflow.json";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,mpegflow_rs=debug";

// ==================== Paths ====================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Node Defaults ====================

/// Property values given to nodes when they are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDefaults {
    /// Motion search radius, 0..=7
    pub search_radius: u8,
    /// DCT quality, 1..=100 (50 = textbook tables)
    pub quality: u8,
    /// Chroma subsampling for Subsample nodes
    pub sampling_mode: SamplingMode,
    /// Whether chroma plane 2 reuses plane 1's vectors
    pub chroma_vectors: ChromaVectors,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            search_radius: MAX_RADIUS,
            quality: DEFAULT_QUALITY,
            sampling_mode: SamplingMode::S420,
            chroma_vectors: ChromaVectors::Shared,
        }
    }
}

impl NodeDefaults {
    /// Clamp every field into its valid range.
    pub fn sanitized(self) -> Self {
        Self {
            search_radius: self.search_radius.min(MAX_RADIUS),
            quality: self.quality.clamp(1, 100),
            ..self
        }
    }
}

// ==================== Logging ====================

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub filter: String,
    /// Directory for daily-rotated log files; console only when unset
    pub log_dir: Option<PathBuf>,
    /// Include targets in console output
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
            show_target: true,
        }
    }
}

// ==================== Engine Config ====================

/// Top-level engine configuration, stored as TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub defaults: NodeDefaults,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        default_config_path()
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config {:?}: {}", path, e)))?;

        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {:?}: {}", path, e)))?;
        Ok(Self {
            defaults: config.defaults.sanitized(),
            ..config
        })
    }

    /// Load configuration, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config {:?}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.defaults.search_radius, 7);
        assert_eq!(config.defaults.quality, 50);
        assert_eq!(config.defaults.sampling_mode, SamplingMode::S420);
        assert_eq!(config.defaults.chroma_vectors, ChromaVectors::Shared);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut config = EngineConfig::default();
        config.defaults.quality = 80;
        config.defaults.chroma_vectors = ChromaVectors::Independent;
        config.logging.log_dir = Some(dir.path().join("logs"));
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[defaults]\nsearch_radius = 12\n").unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.defaults.search_radius, 7);
        assert_eq!(loaded.defaults.quality, 50);
        assert_eq!(loaded.logging, LoggingConfig::default());
    }

    #[test]
    fn test_load_or_default_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert_eq!(EngineConfig::load_or_default(&path), EngineConfig::default());
        assert!(matches!(EngineConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(dir.path().join("absent.toml"));
        assert_eq!(config, EngineConfig::default());
    }
}
