//! Configuration management for TraceView
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `TRACEVIEW__SECTION__KEY` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::render::UnknownRolePolicy;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trace viewer configuration
    pub viewer: ViewerConfig,

    /// Annotation storage configuration
    pub storage: StorageConfig,

    /// TUI configuration
    pub tui: TuiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration, optionally layering a TOML file over the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("TRACEVIEW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Directory for annotations and logs when nothing else is configured
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("dev", "traceview", "traceview")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".traceview"))
}

/// Trace viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Path or URL of the trace collection
    pub source: String,
    /// Quiet period after the last annotation edit before it is saved
    #[serde(with = "humantime_serde")]
    pub debounce: Duration,
    /// Lane placement for roles outside system/user/tool/assistant
    pub unknown_roles: UnknownRolePolicy,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            source: "data/traces.json".to_string(),
            debounce: Duration::from_millis(600),
            unknown_roles: UnknownRolePolicy::default(),
        }
    }
}

/// Annotation storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Annotation file (defaults to the platform data directory)
    pub path: Option<PathBuf>,
    /// Namespace prepended to every trace id
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key_prefix: "trace-annotation:".to_string(),
        }
    }
}

impl StorageConfig {
    /// Resolved annotation file path
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| data_dir().join("annotations.json"))
    }
}

/// TUI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick rate in milliseconds; also bounds how late a debounced save fires
    pub tick_rate_ms: u64,
    /// Lines scrolled per PageUp/PageDown
    pub scroll_step: u16,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 100,
            scroll_step: 3,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
    /// Log file used while the TUI owns the terminal
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Resolved log file path
    pub fn resolved_file(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| data_dir().join("traceview.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.viewer.debounce, Duration::from_millis(600));
        assert_eq!(config.storage.key_prefix, "trace-annotation:");
        assert_eq!(config.viewer.unknown_roles, UnknownRolePolicy::Drop);
        assert_eq!(config.tui.tick_rate_ms, 100);
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[viewer]\nsource = \"fixtures/a.json\"\ndebounce = \"250ms\"\nunknown_roles = \"output\"\n\n[storage]\nkey_prefix = \"review:\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.viewer.source, "fixtures/a.json");
        assert_eq!(config.viewer.debounce, Duration::from_millis(250));
        assert_eq!(config.viewer.unknown_roles, UnknownRolePolicy::Output);
        assert_eq!(config.storage.key_prefix, "review:");
        // untouched sections keep their defaults
        assert_eq!(config.tui.scroll_step, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/traceview.toml")));
        assert!(result.is_err());
    }
}
