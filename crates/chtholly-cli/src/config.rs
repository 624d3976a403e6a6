//! CLI configuration via environment variables
//!
//! Output preferences come from the environment so that CI jobs can set
//! them once. Build settings live in chtholly.toml and `CHTHOLLY_*`
//! overrides handled by `chtholly-config`.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Default to JSON output (CHTHOLLY_JSON=1)
    pub default_json: bool,
    /// Disable colored output (CHTHOLLY_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            default_json: env::var("CHTHOLLY_JSON")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            no_color: is_set("CHTHOLLY_NO_COLOR") || is_set("NO_COLOR"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "json"
    )
}

/// NO_COLOR counts only when set to a non-empty value
fn is_set(key: &str) -> bool {
    env::var_os(key).is_some_and(|v| !v.is_empty())
}
