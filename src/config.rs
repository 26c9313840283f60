//! Tool configuration
//!
//! Optional RON file; every field falls back to its default, so a file only
//! needs the values it changes:
//!
//! ```text
//! (
//!     epsilon: 0.001,
//!     bundle: (legacy_preamble: true),
//!     interpreter: (timeout_ms: 30000),
//! )
//! ```

use crate::bundle::DEFAULT_BUNDLE_PATH;
use crate::cleanup::DEFAULT_EPSILON;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_DIR: &str = "wlp-cleaner";
const CONFIG_FILE: &str = "config.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapping tolerance for transform components
    pub epsilon: f64,
    pub bundle: BundleConfig,
    pub interpreter: InterpreterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            bundle: BundleConfig::default(),
            interpreter: InterpreterConfig::default(),
        }
    }
}

/// Where the editor bundle lives and how to load it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Relative paths resolve against the working directory
    pub path: PathBuf,
    /// Script evaluated before the bundle
    pub extra_path: Option<PathBuf>,
    /// Stub browser globals for bundles built by older editors
    pub legacy_preamble: bool,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_BUNDLE_PATH),
            extra_path: None,
            legacy_preamble: false,
        }
    }
}

/// Child process used to evaluate the bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub program: String,
    pub memory_limit_mb: u64,
    pub timeout_ms: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            program: "node".to_string(),
            memory_limit_mb: 128,
            timeout_ms: 10_000,
        }
    }
}

impl Config {
    /// `<config_dir>/wlp-cleaner/config.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load an explicit config file, or the per-user one if it exists, or
    /// fall back to defaults. A missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
