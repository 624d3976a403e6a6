//! Build profile management
//!
//! Maps profile names onto the build type understood by the build-generation
//! tool (`CMAKE_BUILD_TYPE` and `--config`).

use serde::{Deserialize, Serialize};

/// Build profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Development profile (default)
    Dev,
    /// Release profile (optimized)
    Release,
    /// Any other build type, passed through unchanged
    Custom(String),
}

impl Profile {
    /// Parse profile from string
    ///
    /// `dev`/`debug` and `release` are case-insensitive; anything else keeps its
    /// spelling since build types such as `RelWithDebInfo` are passed through.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "debug" => Self::Dev,
            "release" => Self::Release,
            _ => Self::Custom(s.to_string()),
        }
    }

    /// Get profile name
    pub fn name(&self) -> &str {
        match self {
            Self::Dev => "dev",
            Self::Release => "release",
            Self::Custom(name) => name,
        }
    }

    /// Build type handed to the build-generation tool
    pub fn build_type(&self) -> &str {
        match self {
            Self::Dev => "Debug",
            Self::Release => "Release",
            Self::Custom(name) => name,
        }
    }

    /// Check if this is a built-in profile
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Dev | Self::Release)
    }
}

#[allow(clippy::derivable_impls)]
impl Default for Profile {
    fn default() -> Self {
        Self::Dev
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_str() {
        assert_eq!(Profile::from_str("dev"), Profile::Dev);
        assert_eq!(Profile::from_str("Debug"), Profile::Dev);
        assert_eq!(Profile::from_str("RELEASE"), Profile::Release);
        assert_eq!(
            Profile::from_str("RelWithDebInfo"),
            Profile::Custom("RelWithDebInfo".to_string())
        );
    }

    #[test]
    fn test_profile_build_type() {
        assert_eq!(Profile::Dev.build_type(), "Debug");
        assert_eq!(Profile::Release.build_type(), "Release");
        assert_eq!(
            Profile::Custom("MinSizeRel".to_string()).build_type(),
            "MinSizeRel"
        );
    }

    #[test]
    fn test_profile_default_and_display() {
        assert_eq!(Profile::default(), Profile::Dev);
        assert_eq!(Profile::Release.to_string(), "release");
        assert!(Profile::Dev.is_builtin());
        assert!(!Profile::Custom("x".to_string()).is_builtin());
    }
}
