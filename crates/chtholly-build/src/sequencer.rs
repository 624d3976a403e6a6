//! Build sequencer
//!
//! Runs the fixed pipeline
//!
//! ```text
//! ensure-workspace -> configure -> compile -> locate-artifact -> [run] -> [test]
//! ```
//!
//! against one workspace. Fatal failures stop the pipeline; advisory ones are
//! recorded and the pipeline continues. The sequencer never returns an error:
//! every problem ends up as a step record in the [`BuildReport`].

use crate::artifact::{ArtifactReference, Platform};
use crate::error::StepError;
use crate::profile::Profile;
use crate::report::BuildReport;
use crate::runner::ProcessRunner;
use crate::step::{CommandSpec, FailurePolicy, Outcome, StepKind, StepRecord};
use crate::workspace::{absolutize, Workspace};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default logical name of the compiler executable
pub const DEFAULT_MAIN_ARTIFACT: &str = "chtholly";
/// Default logical name of the test executable
pub const DEFAULT_TEST_ARTIFACT: &str = "chtholly_tests";

/// Action selected by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Generate build files only
    Configure,
    /// Configure, then build
    #[default]
    Build,
}

/// What to do in one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    pub action: Action,
    /// Run the main executable after building
    pub run: bool,
    /// Arguments for the main executable, passed verbatim
    pub run_args: Vec<String>,
    /// Run the test executable after building
    pub test: bool,
}

impl BuildPlan {
    /// Configure only
    pub fn configure() -> Self {
        Self {
            action: Action::Configure,
            ..Default::default()
        }
    }

    /// Configure and build
    pub fn build() -> Self {
        Self::default()
    }

    /// Also run the main executable
    pub fn with_run(mut self, args: Vec<String>) -> Self {
        self.run = true;
        self.run_args = args;
        self
    }

    /// Also run the test executable
    pub fn with_tests(mut self) -> Self {
        self.test = true;
        self
    }
}

/// Tool and layout settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Directory holding the build description (CMakeLists.txt)
    pub source_dir: PathBuf,
    /// Workspace directory
    pub workspace: PathBuf,
    /// Build-generation tool program
    pub cmake: PathBuf,
    /// Generator name (`-G`)
    pub generator: Option<String>,
    pub profile: Profile,
    /// `-D` cache entries
    pub defines: BTreeMap<String, String>,
    /// Parallel jobs for the build action
    pub jobs: Option<usize>,
    /// Logical name of the main executable
    pub main_artifact: String,
    /// Logical name of the test executable
    pub test_artifact: String,
    pub platform: Platform,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            workspace: PathBuf::from("build"),
            cmake: PathBuf::from("cmake"),
            generator: None,
            profile: Profile::Dev,
            defines: BTreeMap::new(),
            jobs: None,
            main_artifact: DEFAULT_MAIN_ARTIFACT.to_string(),
            test_artifact: DEFAULT_TEST_ARTIFACT.to_string(),
            platform: Platform::host(),
        }
    }
}

impl BuildSettings {
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    pub fn with_workspace(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace = dir.into();
        self
    }

    pub fn with_cmake(mut self, program: impl Into<PathBuf>) -> Self {
        self.cmake = program.into();
        self
    }

    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.insert(key.into(), value.into());
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn with_artifacts(mut self, main: impl Into<String>, tests: impl Into<String>) -> Self {
        self.main_artifact = main.into();
        self.test_artifact = tests.into();
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

/// Notified as the pipeline progresses
pub trait SequenceObserver {
    /// A step is about to run; `command` is set for steps that spawn a process
    fn step_started(&mut self, _step: StepKind, _command: Option<&CommandSpec>) {}

    /// A step finished and was added to the report
    fn step_finished(&mut self, _record: &StepRecord) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct NoopObserver;

impl SequenceObserver for NoopObserver {}

/// Drives the pipeline through a [`ProcessRunner`]
pub struct BuildSequencer<R: ProcessRunner> {
    runner: R,
    settings: BuildSettings,
}

impl<R: ProcessRunner> BuildSequencer<R> {
    pub fn new(runner: R, settings: BuildSettings) -> Self {
        Self { runner, settings }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Command that generates build files into `workspace`
    pub fn configure_command(&self, workspace: &Path) -> CommandSpec {
        let source =
            absolutize(&self.settings.source_dir).unwrap_or_else(|_| self.settings.source_dir.clone());

        let mut command = CommandSpec::new(&self.settings.cmake)
            .arg("-S")
            .path_arg(&source)
            .arg("-B")
            .path_arg(workspace);

        if let Some(ref generator) = self.settings.generator {
            command = command.arg("-G").arg(generator.as_str());
        }
        if !self.settings.defines.contains_key("CMAKE_BUILD_TYPE") {
            command = command.arg(format!(
                "-DCMAKE_BUILD_TYPE={}",
                self.settings.profile.build_type()
            ));
        }
        for (key, value) in &self.settings.defines {
            command = command.arg(format!("-D{}={}", key, value));
        }

        command.current_dir(workspace)
    }

    /// Command that runs the build action in `workspace`
    pub fn compile_command(&self, workspace: &Path) -> CommandSpec {
        let mut command = CommandSpec::new(&self.settings.cmake)
            .arg("--build")
            .path_arg(workspace)
            .arg("--config")
            .arg(self.build_type());

        if let Some(jobs) = self.settings.jobs {
            command = command.arg("--parallel").arg(jobs.to_string());
        }

        command.current_dir(workspace)
    }

    fn build_type(&self) -> &str {
        self.settings
            .defines
            .get("CMAKE_BUILD_TYPE")
            .map(String::as_str)
            .unwrap_or_else(|| self.settings.profile.build_type())
    }

    /// Run the pipeline without progress notifications
    pub fn run(&self, plan: &BuildPlan) -> BuildReport {
        self.run_with_observer(plan, &mut NoopObserver)
    }

    /// Run the pipeline, notifying `observer` of each step
    pub fn run_with_observer(
        &self,
        plan: &BuildPlan,
        observer: &mut dyn SequenceObserver,
    ) -> BuildReport {
        let mut report = BuildReport::new();

        // Workspace
        let mut workspace = Workspace::new(&self.settings.workspace);
        observer.step_started(StepKind::EnsureWorkspace, None);
        let record = match workspace.ensure() {
            Ok(root) => StepRecord::completed(
                StepKind::EnsureWorkspace,
                FailurePolicy::Fatal,
                Outcome::Success,
            )
            .with_artifact(root),
            Err(e) => StepRecord::errored(
                StepKind::EnsureWorkspace,
                FailurePolicy::Fatal,
                StepError::workspace(&self.settings.workspace, &e),
            ),
        };
        if !self.record(&mut report, record, observer) {
            return report;
        }
        let root = workspace.root().to_path_buf();

        // Configure
        let command = self.configure_command(&root);
        let record = self.run_step(StepKind::Configure, FailurePolicy::Fatal, command, observer);
        if !self.record(&mut report, record, observer) || plan.action == Action::Configure {
            return report;
        }

        // Compile
        let command = self.compile_command(&root);
        let record = self.run_step(StepKind::Compile, FailurePolicy::Fatal, command, observer);
        if !self.record(&mut report, record, observer) {
            return report;
        }

        // Locate main artifact; fatal only when it is about to be executed
        let policy = if plan.run {
            FailurePolicy::Fatal
        } else {
            FailurePolicy::Advisory
        };
        observer.step_started(StepKind::LocateArtifact, None);
        let (record, main) =
            self.locate(StepKind::LocateArtifact, policy, &root, &self.settings.main_artifact);
        if !self.record(&mut report, record, observer) {
            return report;
        }

        // Run main artifact
        if plan.run {
            if let Some(artifact) = main {
                let command = CommandSpec::new(&artifact.path)
                    .args(plan.run_args.iter().cloned())
                    .current_dir(&root);
                let record = self
                    .run_step(StepKind::RunArtifact, FailurePolicy::Advisory, command, observer)
                    .with_artifact(&artifact.path);
                if !self.record(&mut report, record, observer) {
                    return report;
                }
            }
        }

        // Run tests
        if plan.test {
            let (located, tests) =
                self.locate(StepKind::RunTests, FailurePolicy::Fatal, &root, &self.settings.test_artifact);
            let record = match tests {
                Some(artifact) => {
                    let command = CommandSpec::new(&artifact.path).current_dir(&root);
                    self.run_step(StepKind::RunTests, FailurePolicy::Fatal, command, observer)
                        .with_artifact(&artifact.path)
                }
                None => {
                    observer.step_started(StepKind::RunTests, None);
                    located
                }
            };
            self.record(&mut report, record, observer);
        }

        report
    }

    /// Spawn the step's command and turn the result into a record
    fn run_step(
        &self,
        step: StepKind,
        policy: FailurePolicy,
        command: CommandSpec,
        observer: &mut dyn SequenceObserver,
    ) -> StepRecord {
        observer.step_started(step, Some(&command));
        tracing::debug!(step = %step, command = %command, "running step");

        match self.runner.run(&command) {
            Ok(output) => StepRecord::completed(step, policy, output.outcome)
                .with_command(&command)
                .with_output(output.output),
            Err(e) => StepRecord::errored(step, policy, StepError::from(e)).with_command(&command),
        }
    }

    fn locate(
        &self,
        step: StepKind,
        policy: FailurePolicy,
        workspace: &Path,
        name: &str,
    ) -> (StepRecord, Option<ArtifactReference>) {
        let platform = self.settings.platform;
        match ArtifactReference::locate(workspace, name, platform, Some(self.build_type())) {
            Some(artifact) => {
                tracing::debug!(artifact = %artifact.path.display(), "artifact located");
                let record = StepRecord::completed(step, policy, Outcome::Success)
                    .with_artifact(&artifact.path);
                (record, Some(artifact))
            }
            None => {
                let expected = ArtifactReference::resolve(workspace, name, platform);
                let record = StepRecord::completed(step, policy, Outcome::NotFound)
                    .with_artifact(expected.path);
                (record, None)
            }
        }
    }

    /// Add a record to the report; returns whether the pipeline may continue
    fn record(
        &self,
        report: &mut BuildReport,
        record: StepRecord,
        observer: &mut dyn SequenceObserver,
    ) -> bool {
        let proceed = !record.is_fatal();
        if proceed {
            tracing::debug!(step = %record.step, result = %record.describe(), "step finished");
        } else {
            tracing::warn!(step = %record.step, result = %record.describe(), "step failed");
        }
        observer.step_finished(&record);
        report.push(record);
        proceed
    }
}
