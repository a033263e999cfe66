//! Runtests CLI
//!
//! Runs the project's test suite through `tools/venv tests -q` from the
//! directory holding this executable. Every argument belongs to the delegated
//! tool, so the launcher has no flags of its own and reads its settings from
//! the environment.

use runtests_core::LaunchError;
use runtests_launcher::Launcher;
use std::ffi::OsString;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_ENV: &str = "RUNTESTS_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() {
    init_tracing();

    let passthrough: Vec<OsString> = std::env::args_os().skip(1).collect();

    match run(passthrough) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("{e}");
            process::exit(e.exit_code());
        }
    }
}

fn run(passthrough: Vec<OsString>) -> Result<i32, LaunchError> {
    let launcher = Launcher::discover()?;
    launcher.run(passthrough)
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
