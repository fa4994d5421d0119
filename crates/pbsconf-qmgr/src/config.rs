//! Configuration for qmgr command synthesis and execution.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with PBSCONF_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::{CommandBuilder, DEFAULT_QMGR_PATH};
use crate::diff::{DiffOptions, Differ};

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QmgrConfig {
    /// Path of the qmgr binary prefixed to every command.
    #[serde(default = "default_qmgr_path")]
    pub qmgr_path: String,

    /// Quote values of map attributes (`resources_default.mem=...`) like
    /// scalar strings. Off by default, values are emitted verbatim.
    #[serde(default)]
    pub escape_map_values: bool,

    /// Reject values containing both `'` and `"` instead of emitting a
    /// command the shell would misparse.
    #[serde(default)]
    pub reject_quote_collisions: bool,

    /// Local command execution settings.
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Settings for [`ShellExecutor`](crate::executor::ShellExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Shell used to run each command (`<shell> -c <command>`).
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Optional program prefix receiving the command as its last argument,
    /// e.g. `["ssh", "pbs-head"]`. Replaces the shell when set.
    #[serde(default)]
    pub wrapper: Vec<String>,

    /// Per-command timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_qmgr_path() -> String {
    DEFAULT_QMGR_PATH.to_string()
}

fn default_shell() -> String {
    "sh".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            wrapper: Vec::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for QmgrConfig {
    fn default() -> Self {
        Self {
            qmgr_path: default_qmgr_path(),
            escape_map_values: false,
            reject_quote_collisions: false,
            executor: ExecutorConfig::default(),
        }
    }
}

impl ExecutorConfig {
    /// Per-command timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl QmgrConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: QmgrConfig = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into this configuration.
    ///
    /// Only variables that are set override the current values.
    fn merge_env(mut self) -> Self {
        if let Ok(v) = std::env::var("PBSCONF_QMGR_PATH") {
            self.qmgr_path = v;
        }
        if let Ok(v) = std::env::var("PBSCONF_ESCAPE_MAP_VALUES") {
            if let Some(val) = parse_flag(&v) {
                self.escape_map_values = val;
            }
        }
        if let Ok(v) = std::env::var("PBSCONF_REJECT_QUOTE_COLLISIONS") {
            if let Some(val) = parse_flag(&v) {
                self.reject_quote_collisions = val;
            }
        }

        // Executor
        if let Ok(v) = std::env::var("PBSCONF_SHELL") {
            self.executor.shell = v;
        }
        if let Ok(v) = std::env::var("PBSCONF_WRAPPER") {
            self.executor.wrapper = v.split_whitespace().map(str::to_string).collect();
        }
        if let Ok(v) = std::env::var("PBSCONF_TIMEOUT") {
            if let Ok(val) = v.parse() {
                self.executor.timeout_seconds = val;
            }
        }

        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.qmgr_path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "qmgr_path must not be empty".to_string(),
            ));
        }

        if self.qmgr_path.contains('\'') {
            return Err(ConfigError::ValidationError(format!(
                "qmgr_path must not contain single quotes: {}",
                self.qmgr_path
            )));
        }

        if self.executor.shell.trim().is_empty() && self.executor.wrapper.is_empty() {
            return Err(ConfigError::ValidationError(
                "executor.shell must not be empty".to_string(),
            ));
        }

        if self.executor.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "executor.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Embedding options for the differ.
    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            escape_map_values: self.escape_map_values,
            reject_quote_collisions: self.reject_quote_collisions,
        }
    }

    /// A differ configured from this configuration.
    pub fn differ(&self) -> Differ {
        Differ::new(CommandBuilder::new(&self.qmgr_path), self.diff_options())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = QmgrConfig::default();
        assert_eq!(config.qmgr_path, "/opt/pbs/bin/qmgr");
        assert!(!config.escape_map_values);
        assert!(!config.reject_quote_collisions);
        assert_eq!(config.executor.shell, "sh");
        assert_eq!(config.executor.timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_with_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "qmgr_path: /usr/local/pbs/bin/qmgr\nescape_map_values: true\nexecutor:\n  wrapper: [ssh, head1]\n"
        )
        .unwrap();

        let config = QmgrConfig::from_file(file.path()).unwrap();
        assert_eq!(config.qmgr_path, "/usr/local/pbs/bin/qmgr");
        assert!(config.escape_map_values);
        assert!(!config.reject_quote_collisions);
        assert_eq!(config.executor.wrapper, vec!["ssh", "head1"]);
        assert_eq!(config.executor.timeout_seconds, 60);
    }

    #[test]
    fn test_from_file_missing() {
        let err = QmgrConfig::from_file("/nonexistent/pbsconf.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "qmgr_path: [unclosed").unwrap();
        let err = QmgrConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = QmgrConfig::default();
        config.qmgr_path = String::new();
        assert!(config.validate().is_err());

        let mut config = QmgrConfig::default();
        config.qmgr_path = "/opt/it's/qmgr".to_string();
        assert!(config.validate().is_err());

        let mut config = QmgrConfig::default();
        config.executor.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_differ_uses_config() {
        let mut config = QmgrConfig::default();
        config.qmgr_path = "qmgr".to_string();
        config.reject_quote_collisions = true;
        let differ = config.differ();
        assert_eq!(differ.builder().qmgr_path(), "qmgr");
        assert!(differ.options().reject_quote_collisions);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
