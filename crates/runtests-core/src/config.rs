//! Launcher configuration
//!
//! Defaults reproduce the plain `tools/venv tests -q` launcher. A
//! `runtests.toml` next to the launcher replaces any of them, and the
//! `RUNTESTS_*` environment variables are applied last.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::LaunchError;

pub const CONFIG_FILE_NAME: &str = "runtests.toml";

pub const DEFAULT_TOOL: &str = "tools/venv";
pub const DEFAULT_ARGS: [&str; 2] = ["tests", "-q"];
pub const DEFAULT_ENV_VAR: &str = "TESTS_CHDIR";

/// Overrides `tool`
pub const TOOL_OVERRIDE: &str = "RUNTESTS_TOOL";
/// Overrides `env_var`
pub const ENV_VAR_OVERRIDE: &str = "RUNTESTS_ENV_VAR";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// Delegated tool, relative to the launcher root unless absolute
    pub tool: PathBuf,
    /// Leading arguments placed before the caller's arguments
    pub args: Vec<String>,
    /// Variable exported to the tool with the launcher root as its value
    pub env_var: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            tool: PathBuf::from(DEFAULT_TOOL),
            args: DEFAULT_ARGS.iter().map(ToString::to_string).collect(),
            env_var: DEFAULT_ENV_VAR.to_string(),
        }
    }
}

impl LauncherConfig {
    /// Load configuration for a launcher rooted at `root`
    ///
    /// # Errors
    ///
    /// Returns `LaunchError` if the config file exists but cannot be read or
    /// parsed, or if the resulting variable name is unusable or not Unicode
    pub fn load(root: &Path) -> Result<Self, LaunchError> {
        Self::load_with(root, |key| std::env::var_os(key))
    }

    /// Same as [`LauncherConfig::load`] with environment lookups supplied by the caller
    ///
    /// # Errors
    ///
    /// See [`LauncherConfig::load`]
    pub fn load_with<F>(root: &Path, lookup: F) -> Result<Self, LaunchError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let path = root.join(CONFIG_FILE_NAME);
        let mut config = Self::read_file(&path)?.unwrap_or_default();
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config document; `path` is only used in error messages
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::ConfigParse` for malformed TOML or unknown keys
    pub fn parse(source: &str, path: &Path) -> Result<Self, LaunchError> {
        toml::from_str(source).map_err(|source| LaunchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_file(path: &Path) -> Result<Option<Self>, LaunchError> {
        match fs::read_to_string(path) {
            Ok(source) => Self::parse(&source, path).map(Some),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LaunchError::ConfigRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    // Empty values count as unset
    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), LaunchError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(tool) = lookup(TOOL_OVERRIDE).filter(|v| !v.is_empty()) {
            self.tool = PathBuf::from(tool);
        }
        if let Some(name) = lookup(ENV_VAR_OVERRIDE).filter(|v| !v.is_empty()) {
            self.env_var = name
                .into_string()
                .map_err(|name| LaunchError::InvalidEnvVar {
                    name: name.to_string_lossy().into_owned(),
                })?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `LaunchError::InvalidEnvVar` if `env_var` could not be exported
    pub fn validate(&self) -> Result<(), LaunchError> {
        let name = &self.env_var;
        if name.is_empty() || name.contains('=') || name.contains('\0') {
            return Err(LaunchError::InvalidEnvVar { name: name.clone() });
        }
        Ok(())
    }
}
