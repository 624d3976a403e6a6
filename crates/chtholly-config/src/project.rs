//! Project Configuration (chtholly.toml)

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project configuration from chtholly.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Workspace, tool and profile settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfig>,

    /// Names of the produced executables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ArtifactsConfig>,

    /// Defaults for running the main artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunConfig>,
}

/// `[build]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Workspace directory (default: "build")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Directory holding CMakeLists.txt (default: the project root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Build-generation tool (default: "cmake" from PATH)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmake: Option<PathBuf>,

    /// CMake generator, e.g. "Ninja"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,

    /// Build profile: dev, release or a CMake build type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Parallel compile jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Cache entries passed as -DKEY=VALUE
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defines: BTreeMap<String, String>,
}

/// `[artifacts]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ArtifactsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<String>,
}

/// `[run]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Arguments passed to the main artifact when none are given on the command line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(build) = &self.build {
            for (field, path) in [
                ("build.dir", &build.dir),
                ("build.source", &build.source),
                ("build.cmake", &build.cmake),
            ] {
                if matches!(path, Some(p) if p.as_os_str().is_empty()) {
                    return Err(ConfigError::invalid(field, "path cannot be empty"));
                }
            }

            if matches!(&build.generator, Some(g) if g.trim().is_empty()) {
                return Err(ConfigError::invalid("build.generator", "generator cannot be empty"));
            }

            if matches!(&build.profile, Some(p) if p.trim().is_empty()) {
                return Err(ConfigError::invalid("build.profile", "profile cannot be empty"));
            }

            if build.jobs == Some(0) {
                return Err(ConfigError::invalid("build.jobs", "must be at least 1"));
            }

            for key in build.defines.keys() {
                validate_define_key(key)?;
            }
        }

        if let Some(artifacts) = &self.artifacts {
            for (field, name) in [
                ("artifacts.main", &artifacts.main),
                ("artifacts.tests", &artifacts.tests),
            ] {
                if let Some(name) = name {
                    validate_artifact_name(field, name)?;
                }
            }
        }

        Ok(())
    }

    pub fn build(&self) -> Option<&BuildConfig> {
        self.build.as_ref()
    }

    /// The `[build]` section, created on first write
    pub fn build_mut(&mut self) -> &mut BuildConfig {
        self.build.get_or_insert_with(BuildConfig::default)
    }

    pub fn main_artifact(&self) -> Option<&str> {
        self.artifacts.as_ref().and_then(|a| a.main.as_deref())
    }

    pub fn test_artifact(&self) -> Option<&str> {
        self.artifacts.as_ref().and_then(|a| a.tests.as_deref())
    }

    pub fn run_args(&self) -> &[String] {
        self.run.as_ref().map(|r| r.args.as_slice()).unwrap_or(&[])
    }
}

fn validate_define_key(key: &str) -> ConfigResult<()> {
    if key.is_empty() || key.contains('=') || key.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(
            format!("build.defines.{}", key),
            "keys must be non-empty and contain no '=' or whitespace",
        ));
    }
    Ok(())
}

/// Artifact names are bare file names inside the workspace
fn validate_artifact_name(field: &str, name: &str) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::invalid(field, "name cannot be empty"));
    }
    if name.contains(['/', '\\']) {
        return Err(ConfigError::invalid(
            field,
            format!("'{}' must be a file name, not a path", name),
        ));
    }
    Ok(())
}
