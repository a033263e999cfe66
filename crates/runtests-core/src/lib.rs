//! Core types for the runtests launcher
//!
//! Holds the error taxonomy, the launcher configuration, and the planned
//! invocation of the delegated tool. Nothing in this crate touches the process
//! environment or spawns anything.

pub mod config;

pub use config::LauncherConfig;

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Exit status used for launcher failures that happen before delegation
pub const EXIT_FAILURE: i32 = 1;
/// Shell convention: command found but could not be executed
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Shell convention: command not found
pub const EXIT_NOT_FOUND: i32 = 127;

/// A fully planned run of the delegated tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Tool to execute, already joined onto the root
    pub program: PathBuf,
    /// Fixed leading arguments followed by the caller's arguments
    pub args: Vec<OsString>,
    /// Name of the variable that carries the root into the child
    pub env_var: String,
    /// Launcher root: the child's working directory and the exported value
    pub root: PathBuf,
}

impl Invocation {
    #[must_use]
    pub fn new<I>(root: &Path, config: &LauncherConfig, passthrough: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        let args = config
            .args
            .iter()
            .map(OsString::from)
            .chain(passthrough)
            .collect();

        Self {
            program: root.join(&config.tool),
            args,
            env_var: config.env_var.clone(),
            root: root.to_path_buf(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={} {}",
            self.env_var,
            quote(&self.root.to_string_lossy()),
            quote(&self.program.to_string_lossy())
        )?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// Single-quote a word for display when it would not survive a shell as-is
fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Error types with the exit status each one terminates the launcher with
#[derive(thiserror::Error, Debug)]
pub enum LaunchError {
    #[error("runtests: ERR_CURRENT_EXE: cannot determine launcher executable: {source}")]
    UnknownExecutable { source: io::Error },

    #[error("runtests: ERR_RESOLVE_ROOT: cannot resolve {}: {source}", .path.display())]
    ResolveRoot { path: PathBuf, source: io::Error },

    #[error("runtests: ERR_RESOLVE_ROOT: {} has no parent directory", .path.display())]
    NoParent { path: PathBuf },

    #[error("runtests: ERR_ENTER_ROOT: cannot enter {}: {source}", .path.display())]
    EnterRoot { path: PathBuf, source: io::Error },

    #[error("runtests: ERR_CONFIG: cannot read {}: {source}", .path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("runtests: ERR_CONFIG: {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("runtests: ERR_CONFIG: invalid environment variable name {name:?}")]
    InvalidEnvVar { name: String },

    #[error("runtests: ERR_TOOL_NOT_FOUND: {} not found", .tool.display())]
    ToolNotFound { tool: PathBuf },

    #[error("runtests: ERR_TOOL_NOT_EXECUTABLE: {}: {source}", .tool.display())]
    ToolNotExecutable { tool: PathBuf, source: io::Error },

    #[error("runtests: ERR_SPAWN: cannot run {}: {source}", .tool.display())]
    Spawn { tool: PathBuf, source: io::Error },
}

impl LaunchError {
    /// Process exit status the launcher reports for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ToolNotFound { .. } => EXIT_NOT_FOUND,
            Self::ToolNotExecutable { .. } | Self::Spawn { .. } => EXIT_NOT_EXECUTABLE,
            Self::UnknownExecutable { .. }
            | Self::ResolveRoot { .. }
            | Self::NoParent { .. }
            | Self::EnterRoot { .. }
            | Self::ConfigRead { .. }
            | Self::ConfigParse { .. }
            | Self::InvalidEnvVar { .. } => EXIT_FAILURE,
        }
    }

    /// Classify a failed spawn of `tool` the way a shell would
    #[must_use]
    pub fn from_spawn(tool: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::ToolNotFound {
                tool: tool.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => Self::ToolNotExecutable {
                tool: tool.to_path_buf(),
                source,
            },
            _ => Self::Spawn {
                tool: tool.to_path_buf(),
                source,
            },
        }
    }
}
