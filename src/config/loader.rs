//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the run
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{EngineError, EngineResult};

use super::types::RunConfig;

/// Loads and provides access to the run configuration.
///
/// # Example
///
/// ```no_run
/// use vr_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/vr.yaml")?;
/// println!("Cutoff day: {}", loader.config().cutoff_day);
/// # Ok::<(), vr_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: RunConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified YAML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file (e.g., "./config/vr.yaml")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - The file is missing
    /// - The file contains invalid YAML or unknown fields
    /// - A value fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let config = Self::load_yaml::<RunConfig>(path)?;
        config.validate()?;

        info!(
            path = %path.display(),
            processing_month = ?config.processing_month.map(|m| m.to_string()),
            cutoff_day = config.cutoff_day,
            "Loaded run configuration"
        );

        Ok(Self { config })
    }

    /// Parses configuration from YAML text; `origin` names it in errors.
    pub fn from_yaml_str(content: &str, origin: &str) -> EngineResult<Self> {
        let config: RunConfig =
            serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> RunConfig {
        self.config
    }
}
