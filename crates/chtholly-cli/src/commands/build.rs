//! Build command - configure, compile, run and test through CMake

use crate::reporter::{self, ConsoleReporter};
use anyhow::{Context, Result};
use chtholly_build::{
    Action, BuildPlan, BuildReport, BuildSequencer, BuildSettings, CommandRunner, Profile, Relay,
    DEFAULT_MAIN_ARTIFACT, DEFAULT_TEST_ARTIFACT,
};
use chtholly_config::{Config, ConfigLoader};
use std::path::{Path, PathBuf};

/// Build command arguments
#[derive(Debug, Default)]
pub struct BuildArgs {
    /// Configure only, or the full pipeline
    pub action: Action,
    /// Run the main artifact after compiling
    pub run: bool,
    /// Run the test binary after compiling
    pub test: bool,
    /// Arguments for the main artifact
    pub run_args: Vec<String>,
    /// Build directory
    pub build_dir: Option<PathBuf>,
    /// Directory holding CMakeLists.txt
    pub source_dir: Option<PathBuf>,
    /// CMake executable
    pub cmake: Option<PathBuf>,
    pub generator: Option<String>,
    /// Build profile (dev, release, or custom)
    pub profile: Option<String>,
    /// Build in release mode (shorthand for --profile=release)
    pub release: bool,
    /// Cache entries from -D
    pub defines: Vec<(String, String)>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
    /// Verbose output
    pub verbose: bool,
    /// Quiet output (errors only)
    pub quiet: bool,
    /// JSON output
    pub json: bool,
    pub no_color: bool,
    /// Project directory (defaults to current directory)
    pub project_dir: Option<PathBuf>,
}

impl BuildArgs {
    /// Tool output is captured instead of streamed
    fn captures_output(&self) -> bool {
        self.json || self.quiet
    }
}

/// Run the build command, returning the exit code of the pipeline
pub fn run(args: BuildArgs) -> Result<i32> {
    let start_dir = match &args.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let config = ConfigLoader::new()
        .load_from_directory(&start_dir)
        .context("Failed to load chtholly.toml")?;

    if args.no_color {
        colored::control::set_override(false);
    }

    let settings = resolve_settings(&args, &config, &start_dir);
    let plan = build_plan(&args, &config);
    tracing::debug!(?plan, profile = %settings.profile, "resolved build settings");

    let relay = if args.captures_output() {
        Relay::Capture
    } else {
        Relay::Stream
    };
    let sequencer = BuildSequencer::new(CommandRunner::new().with_relay(relay), settings);

    let report = if args.captures_output() {
        sequencer.run(&plan)
    } else {
        let mut console = ConsoleReporter::new(args.verbose);
        sequencer.run_with_observer(&plan, &mut console)
    };

    display(&args, &report)?;
    Ok(report.exit_code())
}

fn display(args: &BuildArgs, report: &BuildReport) -> Result<()> {
    if args.json {
        let json = serde_json::to_string_pretty(&report.to_json())
            .context("Failed to serialize build report")?;
        println!("{}", json);
    } else if args.quiet {
        reporter::print_failure(report);
    } else {
        reporter::print_summary(report);
    }
    Ok(())
}

/// Merge flags, environment, chtholly.toml and defaults (in that order)
pub fn resolve_settings(args: &BuildArgs, config: &Config, start_dir: &Path) -> BuildSettings {
    let base = config.base_dir();

    let source_dir = args
        .source_dir
        .as_ref()
        .map(|dir| start_dir.join(dir))
        .or_else(|| config.source_dir())
        .unwrap_or_else(|| start_dir.to_path_buf());

    let workspace = args
        .build_dir
        .as_ref()
        .map(|dir| start_dir.join(dir))
        .or_else(|| config.build_dir())
        .unwrap_or_else(|| base.join("build"));

    let cmake = args
        .cmake
        .clone()
        .or_else(|| config.cmake())
        .unwrap_or_else(|| PathBuf::from("cmake"));

    let mut settings = BuildSettings::default()
        .with_source_dir(source_dir)
        .with_workspace(workspace)
        .with_cmake(cmake)
        .with_profile(determine_profile(args, config))
        .with_artifacts(
            config.main_artifact().unwrap_or(DEFAULT_MAIN_ARTIFACT),
            config.test_artifact().unwrap_or(DEFAULT_TEST_ARTIFACT),
        );

    if let Some(generator) = args.generator.as_deref().or_else(|| config.generator()) {
        settings = settings.with_generator(generator);
    }

    if let Some(jobs) = args.jobs.or_else(|| config.jobs()) {
        settings = settings.with_jobs(jobs);
    }

    for (key, value) in config.defines() {
        settings = settings.with_define(key, value);
    }
    for (key, value) in &args.defines {
        settings = settings.with_define(key.as_str(), value.as_str());
    }

    settings
}

/// Determine build profile from arguments, falling back to configuration
fn determine_profile(args: &BuildArgs, config: &Config) -> Profile {
    if args.release {
        Profile::Release
    } else if let Some(ref profile_name) = args.profile {
        Profile::from_str(profile_name)
    } else if let Some(profile_name) = config.profile() {
        Profile::from_str(profile_name)
    } else {
        Profile::Dev
    }
}

fn build_plan(args: &BuildArgs, config: &Config) -> BuildPlan {
    if args.action == Action::Configure {
        return BuildPlan::configure();
    }

    let mut plan = BuildPlan::build();
    if args.run {
        let run_args = if args.run_args.is_empty() {
            config.run_args().to_vec()
        } else {
            args.run_args.clone()
        };
        plan = plan.with_run(run_args);
    }
    if args.test {
        plan = plan.with_tests();
    }
    plan
}

/// Parse `KEY=VALUE` from `-D`
pub fn parse_define(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}
