//! Config loading and path resolution.
//!
//! Covers:
//! - `load` / `load_from` (YAML file I/O with env substitution)
//! - XDG-style path helpers (`config_path`, `config_dir`, `cache_dir`)
//! - `~/` expansion for the path-valued fields

use super::Config;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, or defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Config path: {:?}", path);

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if contents.trim().is_empty() {
            log::info!("Config file {:?} is empty, using defaults", path);
            return Ok(Self::default());
        }

        let allow_all = super::env_vars::pre_scan_allow_all_env_vars(&contents);
        let contents = super::env_vars::substitute_variables_with_allowlist(&contents, allow_all);
        let config: Config =
            serde_yaml_ng::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let problems = config.validate();
        if !problems.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{}: {}",
                path.display(),
                problems.join("; ")
            )));
        }

        log::info!("Loaded config with {} user profiles", config.profiles.len());
        Ok(config)
    }

    /// `~/.config/termprof` on every platform (XDG convention)
    pub fn config_dir() -> PathBuf {
        if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".config").join("termprof")
        } else {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("termprof")
        }
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Platform cache directory for termprof, if the platform has one.
    pub fn cache_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("termprof"))
    }

    pub fn output_path(&self) -> PathBuf {
        expand_tilde(&self.output)
    }

    pub fn aws_config_path(&self) -> PathBuf {
        expand_tilde(&self.aws_config)
    }

    pub fn aws_credentials_path(&self) -> PathBuf {
        expand_tilde(&self.aws_credentials)
    }

    pub fn kube_config_path(&self) -> PathBuf {
        expand_tilde(&self.kube_config)
    }

    pub fn ssh_config_path(&self) -> PathBuf {
        expand_tilde(&self.ssh_config)
    }

    pub fn identity_file_paths(&self) -> Vec<PathBuf> {
        self.identity_files.iter().map(|f| expand_tilde(f)).collect()
    }

    pub fn triggers_dir_path(&self) -> PathBuf {
        match &self.triggers_dir {
            Some(dir) => expand_tilde(dir),
            None => Self::config_dir().join("triggers"),
        }
    }
}

/// Expand a leading `~/` (or a bare `~`) to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
