use anyhow::Result;
use chtholly_build::Action;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;
mod reporter;
mod telemetry;

/// Build front-end for the Chtholly compiler.
///
/// Drives CMake through a fixed pipeline: prepare the build directory,
/// configure, compile, locate the compiler executable and optionally run it
/// and the test binary. The exit code is that of the step that failed.
///
/// EXAMPLES:
///     chtholly-build build                     Configure and compile
///     chtholly-build build --release --test    Release build, then run tests
///     chtholly-build run -- hello.cns          Build and run the compiler
///     chtholly-build configure -G Ninja        Generate build files only
///
/// ENVIRONMENT VARIABLES:
///     CHTHOLLY_JSON        Set to '1' for JSON output by default
///     CHTHOLLY_BUILD_DIR   Build directory
///     CHTHOLLY_CMAKE       CMake executable
///     CHTHOLLY_GENERATOR   CMake generator
///     CHTHOLLY_PROFILE     Build profile
///     CHTHOLLY_JOBS        Parallel compile jobs
///     NO_COLOR             Set to disable colored output
#[derive(Parser)]
#[command(name = "chtholly-build")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate build files without compiling
    ///
    /// Creates the build directory if needed and runs CMake's configure step.
    ///
    /// EXAMPLES:
    ///     chtholly-build configure                   Default settings
    ///     chtholly-build configure -G Ninja          Choose a generator
    ///     chtholly-build configure -D FOO=ON         Set a cache entry
    #[command(visible_alias = "c")]
    Configure {
        #[command(flatten)]
        options: BuildOptions,
    },

    /// Configure and compile
    ///
    /// Runs the whole pipeline. With --run the compiler executable is started
    /// afterwards; a failing run is reported but does not fail the build.
    /// With --test the test binary is run and its exit code decides the result.
    ///
    /// EXAMPLES:
    ///     chtholly-build build                        Debug build
    ///     chtholly-build build --release              Release build
    ///     chtholly-build build --test                 Build and run tests
    ///     chtholly-build build --run -- hello.cns     Build and run
    #[command(visible_alias = "b")]
    Build {
        /// Run the compiler executable after a successful build
        #[arg(long)]
        run: bool,
        /// Run the test binary after a successful build
        #[arg(long)]
        test: bool,
        /// Arguments passed to the compiler executable (with --run)
        #[arg(last = true, value_name = "ARGS")]
        args: Vec<String>,
        #[command(flatten)]
        options: BuildOptions,
    },

    /// Build, then run the compiler executable
    ///
    /// Same as `build --run`.
    ///
    /// EXAMPLES:
    ///     chtholly-build run                  Run with [run] args from chtholly.toml
    ///     chtholly-build run -- hello.cns     Run with explicit arguments
    #[command(visible_alias = "r")]
    Run {
        /// Arguments passed to the compiler executable
        #[arg(last = true, value_name = "ARGS")]
        args: Vec<String>,
        #[command(flatten)]
        options: BuildOptions,
    },

    /// Build, then run the test binary
    ///
    /// Same as `build --test`.
    ///
    /// EXAMPLES:
    ///     chtholly-build test
    ///     chtholly-build test --release -q
    #[command(visible_alias = "t")]
    Test {
        #[command(flatten)]
        options: BuildOptions,
    },

    /// Generate shell completions
    ///
    /// Outputs shell completion scripts for bash, zsh, fish, or powershell.
    ///
    /// EXAMPLES:
    ///     chtholly-build completions bash > ~/.bash_completions/chtholly-build.bash
    ///     chtholly-build completions zsh > ~/.zfunc/_chtholly-build
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every pipeline command
#[derive(Args, Debug)]
struct BuildOptions {
    /// Build directory (default: build)
    #[arg(long, value_name = "DIR")]
    build_dir: Option<PathBuf>,
    /// Directory holding CMakeLists.txt (default: project root)
    #[arg(long, value_name = "DIR")]
    source_dir: Option<PathBuf>,
    /// CMake executable
    #[arg(long, value_name = "PROGRAM")]
    cmake: Option<PathBuf>,
    /// CMake generator, e.g. Ninja
    #[arg(long, short = 'G')]
    generator: Option<String>,
    /// Build profile (dev, release, or a CMake build type)
    #[arg(long, short = 'p')]
    profile: Option<String>,
    /// Build in release mode (shorthand for --profile=release)
    #[arg(long, conflicts_with = "profile")]
    release: bool,
    /// CMake cache entry (can be repeated)
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = commands::build::parse_define)]
    define: Vec<(String, String)>,
    /// Parallel compile jobs
    #[arg(long, short = 'j', value_parser = clap::value_parser!(u32).range(1..))]
    jobs: Option<u32>,
    /// Quiet output (errors only)
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    quiet: bool,
    /// Verbose output: show commands and debug logs
    #[arg(long, short = 'v')]
    verbose: bool,
    /// JSON output
    #[arg(long)]
    json: bool,
    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

impl BuildOptions {
    fn into_args(
        self,
        cli_config: &config::Config,
        action: Action,
        run: bool,
        test: bool,
        run_args: Vec<String>,
    ) -> commands::build::BuildArgs {
        commands::build::BuildArgs {
            action,
            run,
            test,
            run_args,
            build_dir: self.build_dir,
            source_dir: self.source_dir,
            cmake: self.cmake,
            generator: self.generator,
            profile: self.profile,
            release: self.release,
            defines: self.define,
            jobs: self.jobs.map(|j| j as usize),
            verbose: self.verbose,
            quiet: self.quiet,
            // Command-line flag overrides environment variable
            json: self.json || cli_config.default_json,
            no_color: self.no_color || cli_config.no_color,
            project_dir: None,
        }
    }
}

/// Map a build exit code onto a process exit status
fn exit_status(code: i32) -> u8 {
    match code {
        0 => 0,
        1..=255 => code as u8,
        _ => 1,
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    let args = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Configure { options } => {
            options.into_args(&cli_config, Action::Configure, false, false, Vec::new())
        }
        Commands::Build {
            run,
            test,
            args,
            options,
        } => options.into_args(&cli_config, Action::Build, run, test, args),
        Commands::Run { args, options } => {
            options.into_args(&cli_config, Action::Build, true, false, args)
        }
        Commands::Test { options } => {
            options.into_args(&cli_config, Action::Build, false, true, Vec::new())
        }
    };

    telemetry::init_tracing(args.verbose);
    let code = commands::build::run(args)?;
    Ok(ExitCode::from(exit_status(code)))
}
