//! Pipeline step model
//!
//! Steps are fixed and ordered. Each one records a [`FailurePolicy`] and a
//! result: a completed [`Outcome`] or a [`StepError`] when the step never got
//! as far as an exit code.

use crate::error::StepError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Named pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    /// Create the workspace directory
    EnsureWorkspace,
    /// Generate build files
    Configure,
    /// Run the build action
    Compile,
    /// Find the main executable
    LocateArtifact,
    /// Execute the main executable
    #[serde(rename = "run")]
    RunArtifact,
    /// Execute the test executable
    #[serde(rename = "test")]
    RunTests,
}

impl StepKind {
    /// Get step name
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnsureWorkspace => "ensure-workspace",
            Self::Configure => "configure",
            Self::Compile => "compile",
            Self::LocateArtifact => "locate-artifact",
            Self::RunArtifact => "run",
            Self::RunTests => "test",
        }
    }

    /// Banner shown when the step starts
    pub fn title(&self) -> &'static str {
        match self {
            Self::EnsureWorkspace => "Preparing workspace",
            Self::Configure => "Configuring",
            Self::Compile => "Compiling",
            Self::LocateArtifact => "Locating artifact",
            Self::RunArtifact => "Running",
            Self::RunTests => "Testing",
        }
    }

    /// Get all steps in execution order
    pub fn all() -> [StepKind; 6] {
        [
            Self::EnsureWorkspace,
            Self::Configure,
            Self::Compile,
            Self::LocateArtifact,
            Self::RunArtifact,
            Self::RunTests,
        ]
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a failure of the step means for the whole sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Failure halts the sequence and fails the build
    Fatal,
    /// Failure is reported but the verdict is unchanged
    Advisory,
}

/// Result of a step or of the whole sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "code", rename_all = "kebab-case")]
pub enum Outcome {
    Success,
    Failure(i32),
    /// Expected artifact is absent
    NotFound,
}

impl Outcome {
    /// Interpret a process exit code
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Self::Success
        } else {
            Self::Failure(code)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Exit code, when the outcome came from a process
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Success => Some(0),
            Self::Failure(code) => Some(*code),
            Self::NotFound => None,
        }
    }
}

/// External command invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program name (looked up in PATH) or path
    pub program: PathBuf,
    /// Arguments, passed verbatim
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory; inherited when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Additional environment variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Create a command with no arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set the working directory unless one is already set
    pub fn or_current_dir(mut self, dir: &Path) -> Self {
        if self.cwd.is_none() {
            self.cwd = Some(dir.to_path_buf());
        }
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// How a step ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepResult {
    Completed(Outcome),
    Errored(StepError),
}

/// Record of one executed step
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: StepKind,
    pub policy: FailurePolicy,
    pub result: StepResult,
    /// Command line that was run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Artifact looked up or executed by the step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    /// Captured process output
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
}

impl StepRecord {
    /// Record a step that produced an outcome
    pub fn completed(step: StepKind, policy: FailurePolicy, outcome: Outcome) -> Self {
        Self {
            step,
            policy,
            result: StepResult::Completed(outcome),
            command: None,
            artifact: None,
            output: String::new(),
        }
    }

    /// Record a step that stopped with an error
    pub fn errored(step: StepKind, policy: FailurePolicy, error: StepError) -> Self {
        Self {
            step,
            policy,
            result: StepResult::Errored(error),
            command: None,
            artifact: None,
            output: String::new(),
        }
    }

    pub fn with_command(mut self, command: &CommandSpec) -> Self {
        self.command = Some(command.to_string());
        self
    }

    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact = Some(path.into());
        self
    }

    pub fn with_output(mut self, output: String) -> Self {
        self.output = output;
        self
    }

    /// Outcome, if the step completed
    pub fn outcome(&self) -> Option<Outcome> {
        match &self.result {
            StepResult::Completed(outcome) => Some(*outcome),
            StepResult::Errored(_) => None,
        }
    }

    /// Check if step failed in any way
    pub fn failed(&self) -> bool {
        !matches!(self.result, StepResult::Completed(Outcome::Success))
    }

    /// Check if the failure halts the sequence
    ///
    /// Errors (workspace creation, launch) are always fatal; outcomes follow the policy.
    pub fn is_fatal(&self) -> bool {
        match &self.result {
            StepResult::Completed(Outcome::Success) => false,
            StepResult::Completed(_) => self.policy == FailurePolicy::Fatal,
            StepResult::Errored(_) => true,
        }
    }

    /// Check if the step failed without affecting the verdict
    pub fn is_advisory_failure(&self) -> bool {
        self.failed() && !self.is_fatal()
    }

    /// Nonzero exit code of a failed process, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self.result {
            StepResult::Completed(Outcome::Failure(code)) => Some(code),
            _ => None,
        }
    }

    /// One-line description of the result
    pub fn describe(&self) -> String {
        let text = match &self.result {
            StepResult::Completed(Outcome::Success) => match (&self.step, &self.artifact) {
                (StepKind::LocateArtifact, Some(path)) => format!("found {}", path.display()),
                _ => "ok".to_string(),
            },
            StepResult::Completed(Outcome::Failure(code)) => match self.step {
                StepKind::RunArtifact | StepKind::RunTests => format!("exited with code {}", code),
                _ => format!("failed with exit code {}", code),
            },
            StepResult::Completed(Outcome::NotFound) => match &self.artifact {
                Some(path) => format!("artifact not found at {}", path.display()),
                None => "artifact not found".to_string(),
            },
            StepResult::Errored(error) => error.to_string(),
        };

        if self.is_advisory_failure() {
            format!("{} (advisory)", text)
        } else {
            text
        }
    }
}
