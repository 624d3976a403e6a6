/// Built executables and platform naming
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Executable naming convention of the target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// No executable suffix
    Posix,
    /// `.exe` suffix
    Windows,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Get the executable file suffix
    pub fn executable_suffix(&self) -> &'static str {
        match self {
            Self::Posix => "",
            Self::Windows => ".exe",
        }
    }

    /// File name of the executable for a logical name
    pub fn executable_name(&self, name: &str) -> String {
        let suffix = self.executable_suffix();
        if suffix.is_empty() || name.to_ascii_lowercase().ends_with(suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::host()
    }
}

/// Resolved path to a built executable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReference {
    /// Logical name (e.g. "chtholly")
    pub name: String,
    /// Platform-adjusted path
    pub path: PathBuf,
}

impl ArtifactReference {
    /// Conventional location: `<workspace>/<name><suffix>`
    pub fn resolve(workspace: &Path, name: &str, platform: Platform) -> Self {
        Self {
            name: name.to_string(),
            path: workspace.join(platform.executable_name(name)),
        }
    }

    /// Every place a generator may put the executable, in lookup order
    ///
    /// Multi-config generators (Visual Studio, Xcode, Ninja Multi-Config) add a
    /// per-configuration directory; some projects set a `bin/` output directory.
    pub fn candidates(
        workspace: &Path,
        name: &str,
        platform: Platform,
        build_type: Option<&str>,
    ) -> Vec<Self> {
        let file_name = platform.executable_name(name);
        let mut dirs = vec![workspace.to_path_buf()];
        if let Some(config) = build_type.filter(|config| !config.is_empty()) {
            dirs.push(workspace.join(config));
        }
        dirs.push(workspace.join("bin"));

        dirs.into_iter()
            .map(|dir| Self {
                name: name.to_string(),
                path: dir.join(&file_name),
            })
            .collect()
    }

    /// Find the first existing candidate
    pub fn locate(
        workspace: &Path,
        name: &str,
        platform: Platform,
        build_type: Option<&str>,
    ) -> Option<Self> {
        Self::candidates(workspace, name, platform, build_type)
            .into_iter()
            .find(|candidate| candidate.exists())
    }

    /// Check the file is present; never assumed
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}
