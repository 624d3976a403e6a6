//! Build workspace directory
//!
//! The workspace holds everything the build-generation tool produces. It is
//! created on demand and never removed.

use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Directory that receives all generated build files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root (absolute once [`Workspace::ensure`] succeeded)
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Create the directory if absent and resolve the root to an absolute path
    ///
    /// Calling this on an existing workspace is a no-op.
    pub fn ensure(&mut self) -> io::Result<&Path> {
        fs::create_dir_all(&self.root)?;
        self.root = absolutize(&self.root)?;
        tracing::debug!(workspace = %self.root.display(), "workspace ready");
        Ok(&self.root)
    }
}

/// Join a relative path onto the current directory, dropping `.` components
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    Ok(joined
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect())
}
