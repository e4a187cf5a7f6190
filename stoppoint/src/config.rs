// Engine configuration
//
// Read from a TOML file. Every field has a default, so an empty or missing
// file is a valid configuration.

use crate::error::{BreakpointError, BreakpointResult};
use crate::target::SuspendPolicy;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Install a one-shot breakpoint on the entry method at activation
    pub stop_on_main: bool,
    /// Entry class of the debuggee; no entry breakpoint without it
    pub main_class: Option<String>,
    pub entry_method: String,
    pub entry_args: Vec<String>,
    /// "all", "thread" or "none"; trace breakpoints always start at none
    #[serde(deserialize_with = "suspend_policy")]
    pub default_suspend_policy: SuspendPolicy,
    pub notify_capacity: usize,
    pub breakpoints_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stop_on_main: true,
            main_class: None,
            entry_method: "main".to_string(),
            entry_args: vec!["java.lang.String[]".to_string()],
            default_suspend_policy: SuspendPolicy::All,
            notify_capacity: 256,
            breakpoints_file: None,
        }
    }
}

impl EngineConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> BreakpointResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
            .map_err(|e| BreakpointError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(text: &str) -> BreakpointResult<Self> {
        toml::from_str(text).map_err(|e| BreakpointError::Config(e.to_string()))
    }
}

fn suspend_policy<'de, D>(deserializer: D) -> Result<SuspendPolicy, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    text.parse().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.stop_on_main);
        assert_eq!(config.entry_args, vec!["java.lang.String[]"]);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_toml(
            r#"
            stop_on_main = false
            main_class = "com.example.App"
            default_suspend_policy = "thread"
            notify_capacity = 16
            "#,
        )
        .unwrap();
        assert!(!config.stop_on_main);
        assert_eq!(config.main_class.as_deref(), Some("com.example.App"));
        assert_eq!(config.default_suspend_policy, SuspendPolicy::EventThread);
        assert_eq!(config.notify_capacity, 16);
        assert_eq!(config.entry_method, "main");
    }

    #[test]
    fn test_malformed_is_config_error() {
        assert!(matches!(
            EngineConfig::from_toml("stop_on_main = \"yes\""),
            Err(BreakpointError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml("default_suspend_policy = \"sometimes\""),
            Err(BreakpointError::Config(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "main_class = \"Main\"").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.main_class.as_deref(), Some("Main"));

        let missing = EngineConfig::load("/nonexistent/stoppoint.toml").unwrap();
        assert_eq!(missing, EngineConfig::default());
    }
}
