//! Runtests launcher
//!
//! Resolves the launcher root, enters it, and hands control to the delegated
//! tool, reporting the tool's exit status as its own.

use runtests_core::{Invocation, LaunchError, LauncherConfig};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, ExitStatus};
use tracing::{debug, info};

/// Directory containing `launcher_path`, with symlinks resolved
///
/// # Errors
///
/// Returns `LaunchError` if the path cannot be canonicalized or has no parent
pub fn resolve_root(launcher_path: &Path) -> Result<PathBuf, LaunchError> {
    let resolved = launcher_path
        .canonicalize()
        .map_err(|source| LaunchError::ResolveRoot {
            path: launcher_path.to_path_buf(),
            source,
        })?;

    resolved
        .parent()
        .map(Path::to_path_buf)
        .ok_or(LaunchError::NoParent { path: resolved })
}

/// Root of the running launcher executable
///
/// # Errors
///
/// Returns `LaunchError` if the executable cannot be located
pub fn current_root() -> Result<PathBuf, LaunchError> {
    let exe = env::current_exe().map_err(|source| LaunchError::UnknownExecutable { source })?;
    resolve_root(&exe)
}

/// Exit code a shell would report for `status`
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    runtests_core::EXIT_FAILURE
}

pub struct Launcher {
    root: PathBuf,
    config: LauncherConfig,
}

impl Launcher {
    #[must_use]
    pub const fn new(root: PathBuf, config: LauncherConfig) -> Self {
        Self { root, config }
    }

    /// Launcher for the running executable, configured from its root
    ///
    /// # Errors
    ///
    /// Returns `LaunchError` if the root cannot be resolved or the
    /// configuration is invalid
    pub fn discover() -> Result<Self, LaunchError> {
        let root = current_root()?;
        debug!(root = %root.display(), "resolved launcher root");
        let config = LauncherConfig::load(&root)?;
        Ok(Self::new(root, config))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn invocation<I>(&self, passthrough: I) -> Invocation
    where
        I: IntoIterator<Item = OsString>,
    {
        Invocation::new(&self.root, &self.config, passthrough)
    }

    /// Make the root the process working directory
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::EnterRoot` if the root is missing or inaccessible
    pub fn enter(&self) -> Result<(), LaunchError> {
        env::set_current_dir(&self.root).map_err(|source| LaunchError::EnterRoot {
            path: self.root.clone(),
            source,
        })
    }

    /// Run `invocation` to completion with inherited stdio
    ///
    /// # Errors
    ///
    /// Returns `LaunchError` if the tool cannot be started
    pub fn spawn(&self, invocation: &Invocation) -> Result<i32, LaunchError> {
        debug!(%invocation, "delegating");

        let status = StdCommand::new(&invocation.program)
            .args(&invocation.args)
            .env(&invocation.env_var, &invocation.root)
            .current_dir(&invocation.root)
            .status()
            .map_err(|source| {
                // The child's chdir fails with the same error kind as a missing tool
                if invocation.root.is_dir() {
                    LaunchError::from_spawn(&invocation.program, source)
                } else {
                    LaunchError::EnterRoot {
                        path: invocation.root.clone(),
                        source,
                    }
                }
            })?;

        let code = exit_code(status);
        if code == 0 {
            debug!(code, "tool finished");
        } else {
            info!(code, %status, "tool failed");
        }
        Ok(code)
    }

    /// Enter the root, then delegate. Nothing is spawned if entering fails.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError` if the root cannot be entered or the tool cannot
    /// be started
    pub fn run<I>(&self, passthrough: I) -> Result<i32, LaunchError>
    where
        I: IntoIterator<Item = OsString>,
    {
        self.enter()?;
        let invocation = self.invocation(passthrough);
        self.spawn(&invocation)
    }
}
