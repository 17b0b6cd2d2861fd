//! Configuration loading
//!
//! Resolution order, highest first:
//! 1. Command-line flag
//! 2. Environment variable (`RECON_SOURCE_DB`, `RECON_TARGET_DB`, ...)
//! 3. TOML config file (`--config`, `RECON_CONFIG`, or `./recon.toml`)
//! 4. Compiled default
//!
//! Flags and environment variables are merged by clap in the binary and
//! arrive here as [`Overrides`].

use crate::db::ACCOUNTS_QUERY;
use crate::error::{ReconError, Result};
use crate::record::Side;
use crate::validator::ValidationRules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "recon.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub database: Option<PathBuf>,
    /// Replaces the default accounts query for this side
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Optional SQLite file receiving the validation_results table
    pub results_database: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("."),
            results_database: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub source: DatabaseConfig,
    pub target: DatabaseConfig,
    pub validation: ValidationRules,
    pub output: OutputConfig,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_db: Option<PathBuf>,
    pub target_db: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub results_db: Option<PathBuf>,
}

impl ReconConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ReconError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReconError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the config file if one is found, otherwise start from defaults.
    /// An explicitly named file must exist.
    pub fn resolve(explicit: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply(overrides);
        config.check()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(path) = overrides.source_db {
            self.source.database = Some(path);
        }
        if let Some(path) = overrides.target_db {
            self.target.database = Some(path);
        }
        if let Some(dir) = overrides.output_dir {
            self.output.directory = dir;
        }
        if let Some(path) = overrides.results_db {
            self.output.results_database = Some(path);
        }
    }

    fn check(&self) -> Result<()> {
        if self.validation.account_number_length == 0 {
            return Err(ReconError::Config(
                "validation.account_number_length must be positive".to_string(),
            ));
        }
        if self.validation.required_status.is_empty() {
            return Err(ReconError::Config(
                "validation.required_status must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn side(&self, side: Side) -> &DatabaseConfig {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    pub fn database(&self, side: Side) -> Result<&Path> {
        self.side(side)
            .database
            .as_deref()
            .ok_or_else(|| ReconError::Config(format!("no {} database configured", side)))
    }

    pub fn query(&self, side: Side) -> &str {
        self.side(side).query.as_deref().unwrap_or(ACCOUNTS_QUERY)
    }
}
