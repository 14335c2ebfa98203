//! Configuration management for My Code Organizer
//!
//! Configuration is merged from three sources, later ones winning:
//!
//! 1. Default values
//! 2. A YAML configuration file
//! 3. Environment variables
//!
//! # Configuration File Format
//!
//! ```yaml
//! database_path: ~/.local/share/my-code-organizer/projects.db
//! default_format: table
//! resolve_paths: true
//! ```
//!
//! # Environment Variables
//!
//! - `MCO_DATABASE_PATH`: Path of the catalog database
//! - `MCO_DEFAULT_FORMAT`: Output format (`table`, `json` or `yaml`)
//! - `MCO_RESOLVE_PATHS`: Whether added paths are made absolute (true/false)
//!
//! # Configuration File Locations
//!
//! Searched in order, first hit wins:
//!
//! 1. `./mco.yaml`
//! 2. `<config dir>/my-code-organizer/config.yaml`
//! 3. `~/.mco.yaml`

use mco_types::OutputFormat;
use mco_utils::{default_db_path, expand_tilde, APP_DIR_NAME};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_DATABASE_PATH: &str = "MCO_DATABASE_PATH";
pub const ENV_DEFAULT_FORMAT: &str = "MCO_DEFAULT_FORMAT";
pub const ENV_RESOLVE_PATHS: &str = "MCO_RESOLVE_PATHS";

/// Effective configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Database location; `None` means the per-user default
    pub database_path: Option<PathBuf>,
    /// Output format used when a command does not ask for one
    pub default_format: OutputFormat,
    /// Make paths absolute before they are stored
    pub resolve_paths: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            default_format: OutputFormat::Table,
            resolve_paths: true,
        }
    }
}

impl CatalogConfig {
    /// Database path to open, falling back to the per-user default
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database_path: Option<String>,
    pub default_format: Option<String>,
    pub resolve_paths: Option<bool>,
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from the standard file locations and the environment
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mco_config::ConfigManager;
    ///
    /// let config = ConfigManager::load_config().unwrap();
    /// println!("Output format: {}", config.default_format);
    /// ```
    pub fn load_config() -> anyhow::Result<CatalogConfig> {
        let mut config = CatalogConfig::default();

        if let Some(file_config) = Self::load_from_file()? {
            Self::merge_config_file(&mut config, file_config)?;
        }

        Self::load_from_env(&mut config)?;
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a specific file path, still applying environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<CatalogConfig> {
        let path = path.as_ref();
        let mut config = CatalogConfig::default();

        match Self::load_config_file(path)? {
            Some(file_config) => Self::merge_config_file(&mut config, file_config)?,
            None => {
                return Err(anyhow::anyhow!(
                    "Config file not found: {}",
                    path.display()
                ))
            }
        }

        Self::load_from_env(&mut config)?;
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Get the configuration file paths to check, in order
    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("mco.yaml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_DIR_NAME).join("config.yaml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".mco.yaml"));
        }

        paths
    }

    fn load_from_file() -> anyhow::Result<Option<ConfigFile>> {
        for path in Self::get_config_paths() {
            if path.exists() {
                log::debug!("Loading configuration from {}", path.display());
                return Self::load_config_file(&path);
            }
        }
        Ok(None)
    }

    fn load_config_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Option<ConfigFile>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;

        let config: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file {}: {}", path.display(), e)
        })?;

        Ok(Some(config))
    }

    fn merge_config_file(config: &mut CatalogConfig, file_config: ConfigFile) -> anyhow::Result<()> {
        if let Some(database_path) = file_config.database_path {
            config.database_path = Some(Self::parse_database_path(&database_path)?);
        }
        if let Some(format) = file_config.default_format {
            config.default_format = format.parse()?;
        }
        if let Some(resolve_paths) = file_config.resolve_paths {
            config.resolve_paths = resolve_paths;
        }
        Ok(())
    }

    fn load_from_env(config: &mut CatalogConfig) -> anyhow::Result<()> {
        Self::apply_env(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`
    ///
    /// Blank values are ignored. An unparsable `MCO_RESOLVE_PATHS` is ignored,
    /// an unknown `MCO_DEFAULT_FORMAT` is an error.
    fn apply_env<F>(config: &mut CatalogConfig, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database_path) = lookup(ENV_DATABASE_PATH) {
            if !database_path.trim().is_empty() {
                config.database_path = Some(Self::parse_database_path(&database_path)?);
            }
        }

        if let Some(format) = lookup(ENV_DEFAULT_FORMAT) {
            if !format.trim().is_empty() {
                config.default_format = format
                    .parse()
                    .map_err(|e| anyhow::anyhow!("{}: {}", ENV_DEFAULT_FORMAT, e))?;
            }
        }

        if let Some(resolve_paths) = lookup(ENV_RESOLVE_PATHS) {
            match resolve_paths.trim().parse::<bool>() {
                Ok(value) => config.resolve_paths = value,
                Err(_) => log::warn!(
                    "Ignoring {}={:?}: expected true or false",
                    ENV_RESOLVE_PATHS,
                    resolve_paths
                ),
            }
        }

        Ok(())
    }

    fn parse_database_path(value: &str) -> anyhow::Result<PathBuf> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(anyhow::anyhow!("database_path cannot be empty"));
        }
        expand_tilde(trimmed)
    }

    /// Validate configuration values
    pub fn validate_config(config: &CatalogConfig) -> anyhow::Result<()> {
        if let Some(path) = &config.database_path {
            if path.as_os_str().is_empty() {
                return Err(anyhow::anyhow!("database_path cannot be empty"));
            }
            if path.is_dir() {
                return Err(anyhow::anyhow!(
                    "database_path points to a directory: {}",
                    path.display()
                ));
            }
        }
        Ok(())
    }
}
