//! Configuration Loader
//!
//! Finds `chtholly.toml` and layers environment overrides on top of it.

use crate::project::ProjectConfig;
use crate::{ConfigError, ConfigResult, CONFIG_FILE_NAME};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

pub const ENV_BUILD_DIR: &str = "CHTHOLLY_BUILD_DIR";
pub const ENV_CMAKE: &str = "CHTHOLLY_CMAKE";
pub const ENV_GENERATOR: &str = "CHTHOLLY_GENERATOR";
pub const ENV_PROFILE: &str = "CHTHOLLY_PROFILE";
pub const ENV_JOBS: &str = "CHTHOLLY_JOBS";

/// Configuration loader
///
/// Precedence, lowest first:
/// 1. Project config (chtholly.toml)
/// 2. Environment variables (CHTHOLLY_*)
/// 3. CLI flags (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    skip_env: bool,
}

/// Loaded configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration with environment overrides applied
    pub project: ProjectConfig,

    /// Directory holding chtholly.toml, if one was found
    pub project_root: Option<PathBuf>,

    /// Directory relative paths resolve against
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore CHTHOLLY_* environment variables
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find chtholly.toml. A missing file is
    /// not an error: the result then carries only environment overrides.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project) = find_project_config(start_dir)?;
        let base_dir = project_root
            .clone()
            .unwrap_or_else(|| start_dir.to_path_buf());
        self.finish(project, project_root, base_dir, start_dir)
    }

    /// Load configuration from a specific chtholly.toml
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let project = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let start_dir = project_root.clone();
        self.finish(project, Some(project_root.clone()), project_root, &start_dir)
    }

    fn finish(
        &self,
        project: ProjectConfig,
        project_root: Option<PathBuf>,
        base_dir: PathBuf,
        start_dir: &Path,
    ) -> ConfigResult<Config> {
        let project = if self.skip_env {
            project
        } else {
            apply_env_overrides(project, start_dir)?
        };

        Ok(Config {
            project,
            project_root,
            base_dir,
        })
    }
}

/// Walk up from `start_dir` looking for chtholly.toml
fn find_project_config(start_dir: &Path) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);

        if config_path.is_file() {
            let project = ProjectConfig::load_from_file(&config_path)?;
            return Ok((Some(current), project));
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return Ok((None, ProjectConfig::default())),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Apply CHTHOLLY_* overrides
///
/// Paths given through the environment are taken relative to `start_dir`,
/// not to the directory holding chtholly.toml.
fn apply_env_overrides(mut config: ProjectConfig, start_dir: &Path) -> ConfigResult<ProjectConfig> {
    if let Some(dir) = env_value(ENV_BUILD_DIR) {
        config.build_mut().dir = Some(start_dir.join(dir));
    }

    if let Some(cmake) = env_value(ENV_CMAKE) {
        let cmake = PathBuf::from(cmake);
        config.build_mut().cmake = Some(if is_bare_program(&cmake) {
            cmake
        } else {
            start_dir.join(cmake)
        });
    }

    if let Some(generator) = env_value(ENV_GENERATOR) {
        config.build_mut().generator = Some(generator);
    }

    if let Some(profile) = env_value(ENV_PROFILE) {
        config.build_mut().profile = Some(profile);
    }

    if let Some(jobs) = env_value(ENV_JOBS) {
        let parsed = jobs
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::invalid(ENV_JOBS, format!("expected a positive integer, got '{}'", jobs))
            })?;
        config.build_mut().jobs = Some(parsed);
    }

    config.validate()?;
    Ok(config)
}

/// A program name without directory parts is looked up on PATH
fn is_bare_program(path: &Path) -> bool {
    path.components().count() == 1 && path.is_relative()
}

impl Config {
    /// Configuration with nothing set, resolving against `base_dir`
    pub fn empty(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            project: ProjectConfig::default(),
            project_root: None,
            base_dir: base_dir.into(),
        }
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a chtholly.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Workspace directory, resolved
    pub fn build_dir(&self) -> Option<PathBuf> {
        self.project
            .build()
            .and_then(|b| b.dir.as_deref())
            .map(|p| self.resolve(p))
    }

    /// Source directory, resolved; defaults to the project root when a project was found
    pub fn source_dir(&self) -> Option<PathBuf> {
        self.project
            .build()
            .and_then(|b| b.source.as_deref())
            .map(|p| self.resolve(p))
            .or_else(|| self.project_root.clone())
    }

    /// Build-generation tool; bare names are left for PATH lookup
    pub fn cmake(&self) -> Option<PathBuf> {
        self.project
            .build()
            .and_then(|b| b.cmake.as_deref())
            .map(|p| {
                if is_bare_program(p) {
                    p.to_path_buf()
                } else {
                    self.resolve(p)
                }
            })
    }

    pub fn generator(&self) -> Option<&str> {
        self.project.build().and_then(|b| b.generator.as_deref())
    }

    pub fn profile(&self) -> Option<&str> {
        self.project.build().and_then(|b| b.profile.as_deref())
    }

    pub fn jobs(&self) -> Option<usize> {
        self.project.build().and_then(|b| b.jobs)
    }

    pub fn defines(&self) -> BTreeMap<String, String> {
        self.project
            .build()
            .map(|b| b.defines.clone())
            .unwrap_or_default()
    }

    pub fn main_artifact(&self) -> Option<&str> {
        self.project.main_artifact()
    }

    pub fn test_artifact(&self) -> Option<&str> {
        self.project.test_artifact()
    }

    pub fn run_args(&self) -> &[String] {
        self.project.run_args()
    }
}
