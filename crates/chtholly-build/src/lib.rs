//! Chtholly build orchestration
//!
//! Drives the external build-generation tool for the Chtholly compiler:
//! - Workspace preparation
//! - Configure and compile steps through CMake
//! - Platform-aware artifact lookup
//! - Optional execution of the main binary and the test binary
//! - Fail-fast sequencing with advisory failures and a final report
//!
//! Every external process goes through the [`ProcessRunner`] seam, which
//! streams output to the operator while the process runs.

pub mod artifact;
pub mod error;
pub mod profile;
pub mod report;
pub mod runner;
pub mod sequencer;
pub mod step;
pub mod workspace;

// Re-export main types
pub use artifact::{ArtifactReference, Platform};
pub use error::{RunnerError, RunnerResult, StepError};
pub use profile::Profile;
pub use report::{BuildReport, FAILURE_EXIT_CODE};
pub use runner::{CommandRunner, ProcessRunner, Relay, RunOutput};
pub use sequencer::{
    Action, BuildPlan, BuildSequencer, BuildSettings, NoopObserver, SequenceObserver,
    DEFAULT_MAIN_ARTIFACT, DEFAULT_TEST_ARTIFACT,
};
pub use step::{CommandSpec, FailurePolicy, Outcome, StepKind, StepRecord, StepResult};
pub use workspace::Workspace;
