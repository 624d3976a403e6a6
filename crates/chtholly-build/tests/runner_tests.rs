//! Command runner tests against real processes
#![cfg(unix)]

use chtholly_build::{CommandRunner, CommandSpec, Outcome, ProcessRunner, Relay};
use std::fs;
use tempfile::TempDir;

fn shell(script: &str) -> CommandSpec {
    CommandSpec::new("sh").arg("-c").arg(script)
}

fn capture() -> CommandRunner {
    CommandRunner::new().with_relay(Relay::Capture)
}

#[test]
fn test_zero_exit_is_success() {
    let result = capture().run(&shell("echo hello")).unwrap();
    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.output, "hello\n");
}

#[test]
fn test_nonzero_exit_is_failure_with_code() {
    let result = capture().run(&shell("exit 3")).unwrap();
    assert_eq!(result.outcome, Outcome::Failure(3));
    assert!(!result.success());
}

#[test]
fn test_stdout_and_stderr_are_both_captured() {
    let result = capture()
        .run(&shell("echo to-stdout; echo to-stderr 1>&2; exit 1"))
        .unwrap();
    assert_eq!(result.outcome, Outcome::Failure(1));
    assert!(result.output.contains("to-stdout\n"));
    assert!(result.output.contains("to-stderr\n"));
}

#[test]
fn test_stream_relay_still_captures() {
    let runner = CommandRunner::new().with_relay(Relay::Stream);
    let result = runner.run(&shell("echo streamed")).unwrap();
    assert!(result.success());
    assert_eq!(result.output, "streamed\n");
}

#[test]
fn test_working_directory_is_explicit() {
    let temp = TempDir::new().unwrap();
    let result = capture()
        .run(&shell("pwd").current_dir(temp.path()))
        .unwrap();

    let reported = fs::canonicalize(result.output.trim()).unwrap();
    assert_eq!(reported, fs::canonicalize(temp.path()).unwrap());
}

#[test]
fn test_environment_is_passed() {
    let result = capture()
        .run(&shell("echo $CHTHOLLY_MARKER").env("CHTHOLLY_MARKER", "present"))
        .unwrap();
    assert_eq!(result.output, "present\n");
}

#[test]
fn test_arguments_are_passed_verbatim() {
    let command = CommandSpec::new("sh")
        .arg("-c")
        .arg("printf '%s|' \"$@\"")
        .arg("sh")
        .args(["two words", "--flag", ""]);
    let result = capture().run(&command).unwrap();
    assert_eq!(result.output, "two words|--flag||\n");
}

#[test]
fn test_killed_process_is_failure() {
    let result = capture().run(&shell("kill -9 $$")).unwrap();
    assert_eq!(result.outcome, Outcome::Failure(1));
}

#[test]
fn test_large_output_on_both_streams_drains() {
    let script = "i=0; while [ $i -lt 5000 ]; do echo out $i; echo err $i 1>&2; i=$((i+1)); done";
    let result = capture().run(&shell(script)).unwrap();
    assert!(result.success());
    assert_eq!(result.output.lines().count(), 10_000);
    assert!(result.output.contains("out 4999\n"));
    assert!(result.output.contains("err 4999\n"));
}

#[test]
fn test_missing_program_is_not_a_failure_outcome() {
    let error = capture()
        .run(&CommandSpec::new("/nonexistent/chtholly/cmake"))
        .unwrap_err();
    assert!(error.is_not_found());
    assert_eq!(error.program(), "/nonexistent/chtholly/cmake");
}

#[test]
fn test_non_executable_file_is_launch_error() {
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("not-executable");
    fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();

    let error = capture().run(&CommandSpec::new(&script)).unwrap_err();
    assert!(!error.is_not_found());
}
