/// Build orchestration error types
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors raised before a process produced an exit code
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to launch '{program}': {error}")]
    Launch {
        program: String,
        error: std::io::Error,
    },

    #[error("Failed to wait for '{program}': {error}")]
    Wait {
        program: String,
        error: std::io::Error,
    },
}

impl RunnerError {
    /// Create a launch error
    pub fn launch(program: impl Into<String>, error: std::io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            error,
        }
    }

    /// Create a wait error
    pub fn wait(program: impl Into<String>, error: std::io::Error) -> Self {
        Self::Wait {
            program: program.into(),
            error,
        }
    }

    /// Program the error refers to
    pub fn program(&self) -> &str {
        match self {
            Self::Launch { program, .. } | Self::Wait { program, .. } => program,
        }
    }

    /// True when the program does not exist (as opposed to existing but failing to start)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Launch { error, .. } if error.kind() == std::io::ErrorKind::NotFound)
    }
}

/// A step that stopped without an exit code
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StepError {
    #[error("could not create workspace {path}: {reason}")]
    WorkspaceCreation { path: PathBuf, reason: String },

    #[error("tool not found: {program}")]
    ToolNotFound { program: String },

    #[error("could not start {program}: {reason}")]
    Launch { program: String, reason: String },
}

impl StepError {
    /// Create a workspace creation error
    pub fn workspace(path: &Path, error: &std::io::Error) -> Self {
        Self::WorkspaceCreation {
            path: path.to_path_buf(),
            reason: error.to_string(),
        }
    }
}

impl From<RunnerError> for StepError {
    fn from(error: RunnerError) -> Self {
        if error.is_not_found() {
            return Self::ToolNotFound {
                program: error.program().to_string(),
            };
        }
        match error {
            RunnerError::Launch { program, error } | RunnerError::Wait { program, error } => {
                Self::Launch {
                    program,
                    reason: error.to_string(),
                }
            }
        }
    }
}
