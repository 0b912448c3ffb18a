//! Configuration loading from files and environment

use std::path::{Path, PathBuf};

use super::{BoundRingPolicy, Config, PartialConfig};
use crate::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════
// PUBLIC API
// ═══════════════════════════════════════════════════════════════════════════

/// Load configuration from defaults, the global file and the environment.
///
/// # Errors
///
/// Returns error if a config file is malformed TOML, an environment value
/// cannot be parsed, or the merged values fail validation.
pub fn load_config() -> Result<Config> {
    Config::load(None)
}

impl Config {
    /// Load configuration with an optional explicit file layered over the
    /// global one. Missing files are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if a config file is malformed TOML, an environment value
    /// cannot be parsed, or the merged values fail validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        // 1. Built-in defaults
        let mut config = Self::default();

        // 2. Global config if it exists
        if let Some(path) = global_config_path().filter(|path| path.exists()) {
            config.merge_partial(load_toml_file(&path)?);
        }

        // 3. Explicit config if it exists
        match explicit {
            Some(path) if path.exists() => config.merge_partial(load_toml_file(path)?),
            Some(path) => {
                tracing::debug!(path = %path.display(), "Config file not found, skipping");
            }
            None => {}
        }

        // 4. Environment overrides, then validate
        let config = config.apply_env_vars()?;
        config.validate()?;

        Ok(config)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FILES
// ═══════════════════════════════════════════════════════════════════════════

/// Get path to global config file
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "plantel")
        .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
}

/// Load a TOML file as a partial config
///
/// # Errors
///
/// Returns error if the path is a directory, cannot be read, or holds
/// malformed TOML.
pub fn load_toml_file(path: &Path) -> Result<PartialConfig> {
    if path.is_dir() {
        return Err(Error::io_error(format!(
            "Config path is a directory, not a file: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::io_error(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::parse_error(format!(
            "Failed to parse config file {}: {e}",
            path.display()
        ))
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// ENVIRONMENT VARIABLE OVERRIDES
// ═══════════════════════════════════════════════════════════════════════════

impl Config {
    /// Apply `PLANTEL_*` environment variable overrides
    ///
    /// # Errors
    ///
    /// Returns error if an environment variable value cannot be parsed
    pub fn apply_env_vars(mut self) -> Result<Self> {
        // PLANTEL_RANGE_CEILING
        if let Ok(value) = std::env::var("PLANTEL_RANGE_CEILING") {
            self.inventory.range_ceiling = value.trim().parse().map_err(|e| {
                Error::invalid_config(format!("Invalid PLANTEL_RANGE_CEILING value: {e}"))
            })?;
        }

        // PLANTEL_ENFORCE_UNIQUE_CODES
        if let Ok(value) = std::env::var("PLANTEL_ENFORCE_UNIQUE_CODES") {
            self.inventory.enforce_unique_codes = value.trim().parse().map_err(|e| {
                Error::invalid_config(format!("Invalid PLANTEL_ENFORCE_UNIQUE_CODES value: {e}"))
            })?;
        }

        // PLANTEL_BOUND_RING_POLICY
        if let Ok(value) = std::env::var("PLANTEL_BOUND_RING_POLICY") {
            self.inventory.bound_ring_policy =
                value.trim().parse::<BoundRingPolicy>().map_err(|_| {
                    Error::invalid_config(format!(
                        "Invalid PLANTEL_BOUND_RING_POLICY value '{value}': expected keep-stale, forbid or cascade"
                    ))
                })?;
        }

        // PLANTEL_GENEALOGY_DEPTH
        if let Ok(value) = std::env::var("PLANTEL_GENEALOGY_DEPTH") {
            self.genealogy.default_depth = value.trim().parse().map_err(|e| {
                Error::invalid_config(format!("Invalid PLANTEL_GENEALOGY_DEPTH value: {e}"))
            })?;
        }

        Ok(self)
    }
}
