//! End-to-end tests for the `chtholly-build` binary
//!
//! A shell script stands in for cmake: configuring writes a cache file and
//! building writes the compiler and test executables as small scripts. Exit
//! codes are steered through FAKE_* environment variables.
#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FAKE_CMAKE: &str = r#"#!/bin/sh
if [ "$1" = "-S" ]; then
    echo "-- Configuring done"
    echo "$@" > "$4/CMakeCache.txt"
    exit "${FAKE_CONFIGURE_EXIT:-0}"
fi
if [ "$1" = "--build" ]; then
    echo "[1/1] Linking chtholly"
    printf '#!/bin/sh\necho "chtholly says: $*"\nexit %s\n' "${FAKE_RUN_EXIT:-0}" > "$2/chtholly"
    printf '#!/bin/sh\necho "tests ran"\nexit %s\n' "${FAKE_TEST_EXIT:-0}" > "$2/chtholly_tests"
    chmod +x "$2/chtholly" "$2/chtholly_tests"
    exit "${FAKE_BUILD_EXIT:-0}"
fi
exit 64
"#;

const ENV_KEYS: [&str; 8] = [
    "CHTHOLLY_BUILD_DIR",
    "CHTHOLLY_CMAKE",
    "CHTHOLLY_GENERATOR",
    "CHTHOLLY_PROFILE",
    "CHTHOLLY_JOBS",
    "CHTHOLLY_JSON",
    "CHTHOLLY_NO_COLOR",
    "RUST_LOG",
];

// ============================================================================
// Test Helpers
// ============================================================================

/// Temporary project with a CMakeLists.txt and a fake cmake
struct Project {
    temp: TempDir,
    cmake: PathBuf,
}

impl Project {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let tools = temp.path().join("tools");
        fs::create_dir_all(&tools).unwrap();

        let cmake = tools.join("cmake");
        fs::write(&cmake, FAKE_CMAKE).unwrap();
        fs::set_permissions(&cmake, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(temp.path().join("CMakeLists.txt"), "project(chtholly)\n").unwrap();

        Self { temp, cmake }
    }

    fn root(&self) -> &Path {
        self.temp.path()
    }

    fn write_config(&self, content: &str) {
        fs::write(self.root().join("chtholly.toml"), content).unwrap();
    }

    /// Command with a clean environment, pointed at the fake cmake
    fn cmd(&self, subcommand: &str) -> Command {
        let mut cmd = bare(self.root());
        cmd.arg(subcommand).arg("--cmake").arg(&self.cmake);
        cmd
    }
}

fn bare(dir: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("chtholly-build");
    cmd.current_dir(dir).env("NO_COLOR", "1");
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_configure_creates_workspace() {
    let project = Project::new();

    project
        .cmd("configure")
        .assert()
        .success()
        .stdout(predicate::str::contains("==> Configuring"))
        .stdout(predicate::str::contains("-- Configuring done"))
        .stdout(predicate::str::contains("Build succeeded"))
        .stdout(predicate::str::contains("==> Compiling").not());

    let cache = fs::read_to_string(project.root().join("build/CMakeCache.txt")).unwrap();
    assert!(cache.contains("-DCMAKE_BUILD_TYPE=Debug"));
}

#[test]
fn test_build_reports_each_step() {
    let project = Project::new();

    project
        .cmd("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("==> Preparing workspace"))
        .stdout(predicate::str::contains("==> Compiling"))
        .stdout(predicate::str::contains("[1/1] Linking chtholly"))
        .stdout(predicate::str::contains("==> Locating artifact"))
        .stdout(predicate::str::contains("Running").not());

    assert!(project.root().join("build/chtholly").is_file());
}

#[test]
fn test_release_and_defines_reach_cmake() {
    let project = Project::new();

    project
        .cmd("configure")
        .args(["--release", "-G", "Ninja", "-D", "CHTHOLLY_ENABLE_TESTS=ON"])
        .assert()
        .success();

    let cache = fs::read_to_string(project.root().join("build/CMakeCache.txt")).unwrap();
    assert!(cache.contains("-G Ninja"));
    assert!(cache.contains("-DCMAKE_BUILD_TYPE=Release"));
    assert!(cache.contains("-DCHTHOLLY_ENABLE_TESTS=ON"));
}

#[test]
fn test_compile_failure_exit_code_propagates() {
    let project = Project::new();

    project
        .cmd("build")
        .arg("--test")
        .env("FAKE_BUILD_EXIT", "2")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Build failed at compile"))
        .stdout(predicate::str::contains("==> Testing").not())
        .stderr(predicate::str::contains("error: compile: failed with exit code 2"));
}

#[test]
fn test_configure_failure_stops_pipeline() {
    let project = Project::new();

    project
        .cmd("build")
        .env("FAKE_CONFIGURE_EXIT", "3")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("==> Compiling").not());
}

#[test]
fn test_run_passes_arguments() {
    let project = Project::new();

    project
        .cmd("run")
        .args(["--", "hello.cns", "--emit=ir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chtholly says: hello.cns --emit=ir"));
}

#[test]
fn test_failing_run_is_advisory() {
    let project = Project::new();

    project
        .cmd("run")
        .env("FAKE_RUN_EXIT", "7")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build succeeded with 1 advisory failure"))
        .stderr(predicate::str::contains("warning: run: exited with code 7 (advisory)"));
}

#[test]
fn test_failing_tests_fail_the_build() {
    let project = Project::new();

    project
        .cmd("test")
        .env("FAKE_TEST_EXIT", "4")
        .assert()
        .code(4)
        .stdout(predicate::str::contains("tests ran"))
        .stdout(predicate::str::contains("Build failed at test"));
}

#[test]
fn test_missing_cmake_is_reported() {
    let project = Project::new();

    bare(project.root())
        .args(["build", "--cmake", "/nonexistent/bin/cmake"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("tool not found: /nonexistent/bin/cmake"));
}

#[test]
fn test_workspace_blocked_by_file() {
    let project = Project::new();
    fs::write(project.root().join("build"), "not a directory").unwrap();

    project
        .cmd("build")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Build failed at ensure-workspace"));
}

// ============================================================================
// Output modes
// ============================================================================

#[test]
fn test_json_output_is_single_document() {
    let project = Project::new();

    let output = project.cmd("build").arg("--json").output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["exit_code"], 0);
    assert_eq!(json["failed_step"], serde_json::Value::Null);
    assert_eq!(json["steps"].as_array().unwrap().len(), 4);
    assert!(json["artifact"].as_str().unwrap().ends_with("chtholly"));
    assert!(json["steps"][2]["output"]
        .as_str()
        .unwrap()
        .contains("Linking chtholly"));
}

#[test]
fn test_json_output_on_failure() {
    let project = Project::new();

    let output = project
        .cmd("build")
        .arg("--json")
        .env("FAKE_BUILD_EXIT", "2")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["exit_code"], 2);
    assert_eq!(json["failed_step"], "compile");
}

#[test]
fn test_json_from_environment() {
    let project = Project::new();

    let output = project
        .cmd("configure")
        .env("CHTHOLLY_JSON", "1")
        .output()
        .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], true);
}

#[test]
fn test_quiet_success_prints_nothing() {
    let project = Project::new();

    project
        .cmd("build")
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_quiet_failure_replays_output() {
    let project = Project::new();

    project
        .cmd("build")
        .arg("--quiet")
        .env("FAKE_BUILD_EXIT", "2")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("[1/1] Linking chtholly"))
        .stderr(predicate::str::contains("Build failed at compile"));
}

#[test]
fn test_verbose_echoes_commands() {
    let project = Project::new();

    project
        .cmd("configure")
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains("$ ").and(predicate::str::contains(" -S ")));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_project_file_settings_apply() {
    let project = Project::new();
    project.write_config(
        r#"
[build]
dir = "out"
cmake = "tools/cmake"
profile = "RelWithDebInfo"
"#,
    );

    bare(project.root()).arg("configure").assert().success();

    let cache = fs::read_to_string(project.root().join("out/CMakeCache.txt")).unwrap();
    assert!(cache.contains("-DCMAKE_BUILD_TYPE=RelWithDebInfo"));
}

#[test]
fn test_project_file_found_from_subdirectory() {
    let project = Project::new();
    project.write_config("[build]\ncmake = \"tools/cmake\"\n");
    let nested = project.root().join("src/lexer");
    fs::create_dir_all(&nested).unwrap();

    bare(&nested).arg("configure").assert().success();

    assert!(project.root().join("build/CMakeCache.txt").is_file());
}

#[test]
fn test_environment_overrides_project_file() {
    let project = Project::new();
    project.write_config("[build]\ndir = \"out\"\ncmake = \"tools/cmake\"\n");

    bare(project.root())
        .arg("configure")
        .env("CHTHOLLY_BUILD_DIR", "env-build")
        .assert()
        .success();

    assert!(project.root().join("env-build/CMakeCache.txt").is_file());
    assert!(!project.root().join("out").exists());
}

#[test]
fn test_flag_overrides_environment() {
    let project = Project::new();

    project
        .cmd("configure")
        .args(["--build-dir", "flag-build"])
        .env("CHTHOLLY_BUILD_DIR", "env-build")
        .assert()
        .success();

    assert!(project.root().join("flag-build/CMakeCache.txt").is_file());
    assert!(!project.root().join("env-build").exists());
}

#[test]
fn test_run_args_from_project_file() {
    let project = Project::new();
    project.write_config("[build]\ncmake = \"tools/cmake\"\n\n[run]\nargs = [\"demo.cns\"]\n");

    bare(project.root())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("chtholly says: demo.cns"));
}

#[test]
fn test_invalid_project_file_is_error() {
    let project = Project::new();
    project.write_config("[build]\nunknown = true\n");

    bare(project.root())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load chtholly.toml"));
}

// ============================================================================
// Command-line surface
// ============================================================================

#[test]
fn test_help_lists_commands() {
    bare(Path::new("."))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("configure"))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_aliases_resolve() {
    let project = Project::new();

    bare(project.root())
        .args(["c", "--cmake"])
        .arg(&project.cmake)
        .assert()
        .success()
        .stdout(predicate::str::contains("==> Configuring"));
}

#[test]
fn test_completions_generated() {
    bare(Path::new("."))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chtholly-build"));
}

#[test]
fn test_malformed_define_rejected() {
    bare(Path::new("."))
        .args(["configure", "-D", "NOVALUE"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expected KEY=VALUE"));
}
