//! Integration tests for invocation planning + spawning
//! The launcher's own working directory is never changed here; see the e2e tests for that

use crate::common::{canonical, read_log, write_executable, write_recording_tool, LOG_FILE};
use proptest::prelude::*;
use runtests_core::{LaunchError, LauncherConfig};
use runtests_launcher::Launcher;
use std::ffi::OsString;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn os_args(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

/// Scratch root holding a recording `tools/venv` that exits with `exit_code`
fn repo_with_tool(exit_code: i32) -> (TempDir, Launcher) {
    let dir = tempdir().unwrap();
    let root = canonical(dir.path());
    write_recording_tool(
        &root.join("tools/venv"),
        &root.join(LOG_FILE),
        "TESTS_CHDIR",
        exit_code,
    );
    (dir, Launcher::new(root, LauncherConfig::default()))
}

fn log_of(launcher: &Launcher) -> std::path::PathBuf {
    launcher.root().join(LOG_FILE)
}

#[test]
fn test_forwards_arguments_after_fixed_ones() {
    let (_dir, launcher) = repo_with_tool(0);

    let invocation = launcher.invocation(os_args(&["-k", "foo"]));
    let code = launcher.spawn(&invocation).unwrap();

    assert_eq!(code, 0);
    let recorded = read_log(&log_of(&launcher));
    assert_eq!(recorded.args, vec!["tests", "-q", "-k", "foo"]);
}

#[test]
fn test_zero_arguments() {
    let (_dir, launcher) = repo_with_tool(0);

    let invocation = launcher.invocation(Vec::new());
    launcher.spawn(&invocation).unwrap();

    assert_eq!(read_log(&log_of(&launcher)).args, vec!["tests", "-q"]);
}

#[test]
fn test_exports_root_and_runs_inside_it() {
    let (_dir, launcher) = repo_with_tool(0);

    let invocation = launcher.invocation(Vec::new());
    launcher.spawn(&invocation).unwrap();

    let recorded = read_log(&log_of(&launcher));
    assert_eq!(Path::new(&recorded.env), launcher.root());
    assert_eq!(recorded.cwd, launcher.root());
}

#[test]
fn test_tool_exit_status_propagates() {
    let (_dir, launcher) = repo_with_tool(2);

    let invocation = launcher.invocation(os_args(&["-x"]));
    assert_eq!(launcher.spawn(&invocation).unwrap(), 2);
}

#[test]
fn test_tool_killed_by_signal() {
    let dir = tempdir().unwrap();
    let root = canonical(dir.path());
    write_executable(&root.join("tools/venv"), "#!/bin/sh\nkill -KILL $$\n");

    let launcher = Launcher::new(root, LauncherConfig::default());
    let invocation = launcher.invocation(Vec::new());
    assert_eq!(launcher.spawn(&invocation).unwrap(), 128 + 9);
}

#[test]
fn test_non_executable_tool() {
    let dir = tempdir().unwrap();
    let root = canonical(dir.path());
    std::fs::create_dir_all(root.join("tools")).unwrap();
    std::fs::write(root.join("tools/venv"), "#!/bin/sh\nexit 0\n").unwrap();

    let launcher = Launcher::new(root, LauncherConfig::default());
    let invocation = launcher.invocation(Vec::new());
    let error = launcher.spawn(&invocation).unwrap_err();

    assert!(matches!(error, LaunchError::ToolNotExecutable { .. }));
    assert_eq!(error.exit_code(), 126);
}

#[test]
fn test_configured_tool_args_and_variable() {
    let dir = tempdir().unwrap();
    let root = canonical(dir.path());
    write_recording_tool(&root.join("bin/check"), &root.join(LOG_FILE), "PROJECT_ROOT", 0);

    let config = LauncherConfig {
        tool: "bin/check".into(),
        args: vec!["lint".to_string()],
        env_var: "PROJECT_ROOT".to_string(),
    };
    let launcher = Launcher::new(root.clone(), config);
    let invocation = launcher.invocation(os_args(&["src"]));
    launcher.spawn(&invocation).unwrap();

    let recorded = read_log(&root.join(LOG_FILE));
    assert_eq!(recorded.args, vec!["lint", "src"]);
    assert_eq!(Path::new(&recorded.env), root);
}

#[test]
fn test_non_utf8_argument_forwarded_byte_exact() {
    use std::os::unix::ffi::OsStringExt;

    let dir = tempdir().unwrap();
    let root = canonical(dir.path());
    let captured = root.join("third-arg.bin");
    write_executable(
        &root.join("tools/venv"),
        &format!("#!/bin/sh\nprintf '%s' \"$3\" > '{}'\n", captured.display()),
    );

    let launcher = Launcher::new(root, LauncherConfig::default());
    let arg = OsString::from_vec(b"a\xffb".to_vec());
    let invocation = launcher.invocation([arg]);
    assert_eq!(launcher.spawn(&invocation).unwrap(), 0);

    assert_eq!(std::fs::read(&captured).unwrap(), b"a\xffb");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_arguments_forwarded_verbatim(args in prop::collection::vec("[a-zA-Z0-9 _=:.-]{0,12}", 0..6)) {
        let (_dir, launcher) = repo_with_tool(0);

        let invocation = launcher.invocation(args.iter().map(OsString::from));
        launcher.spawn(&invocation).unwrap();

        let mut expected = vec!["tests".to_string(), "-q".to_string()];
        expected.extend(args);
        prop_assert_eq!(read_log(&log_of(&launcher)).args, expected);
    }
}
