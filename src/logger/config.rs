//! Logging configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use super::LoggingError;
use crate::utils::paths::project_root;

/// Directory under the project root that receives log files.
pub const LOG_DIR: &str = "logs";
/// Size after which the active log file is rotated (5 MiB).
pub const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;
/// Number of rotated files kept next to the active one.
pub const BACKUP_COUNT: usize = 3;
/// `strftime` pattern for the log file name (process start time).
pub const LOG_FILE_STAMP: &str = "%Y_%m_%d_%H_%M_%S";

pub const LOG_DIR_ENV: &str = "PIPELINE_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "PIPELINE_LOG_LEVEL";

/// Third-party targets that flood debug output, and the level they are held to.
pub const NOISY_TARGETS: &[(&str, &str)] = &[
    ("mongodb", "error"),
    ("multer", "error"),
    ("aws_config", "error"),
    ("aws_smithy_runtime", "error"),
    ("aws_sdk_s3", "error"),
];

/// Which standard stream the console sink writes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleStream {
    #[default]
    Stderr,
    Stdout,
}

/// Settings for the process-wide logger.
///
/// Every field has a default, so a YAML file only needs to list what it
/// overrides:
///
/// ```yaml
/// log_dir: /var/log/pipeline
/// backup_count: 5
/// quiet_targets:
///   hyper: warn
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log directory. `None` means `<project-root>/logs`.
    pub log_dir: Option<PathBuf>,
    pub max_bytes: u64,
    pub backup_count: usize,
    /// Minimum level for every target not listed in `quiet_targets`.
    pub level: String,
    /// Per-target level overrides.
    pub quiet_targets: BTreeMap<String, String>,
    pub console: ConsoleStream,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            log_dir: None,
            max_bytes: MAX_LOG_SIZE,
            backup_count: BACKUP_COUNT,
            level: "debug".to_string(),
            quiet_targets: NOISY_TARGETS
                .iter()
                .map(|(target, level)| (target.to_string(), level.to_string()))
                .collect(),
            console: ConsoleStream::Stderr,
        }
    }
}

impl LogConfig {
    /// Defaults, overridden by `PIPELINE_LOG_DIR` and `PIPELINE_LOG_LEVEL`
    /// when they are set.
    pub fn from_env() -> Self {
        let mut config = LogConfig::default();
        if let Some(dir) = env::var_os(LOG_DIR_ENV).filter(|v| !v.is_empty()) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            if !level.trim().is_empty() {
                config.level = level.trim().to_string();
            }
        }
        config
    }

    /// Loads a config from a YAML file.
    #[track_caller]
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        crate::utils::read_yaml_as(path)
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_console(mut self, console: ConsoleStream) -> Self {
        self.console = console;
        self
    }

    pub fn with_rotation(mut self, max_bytes: u64, backup_count: usize) -> Self {
        self.max_bytes = max_bytes;
        self.backup_count = backup_count;
        self
    }

    /// The directory log files go to.
    pub fn resolve_log_dir(&self) -> io::Result<PathBuf> {
        match &self.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_root()?.join(LOG_DIR)),
        }
    }

    /// Filter directives, e.g. `debug,mongodb=error,multer=error`.
    pub fn directives(&self) -> String {
        let mut directives = vec![self.level.clone()];
        directives.extend(
            self.quiet_targets
                .iter()
                .map(|(target, level)| format!("{target}={level}")),
        );
        directives.join(",")
    }

    pub(crate) fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        let directives = self.directives();
        EnvFilter::try_new(&directives).map_err(|source| LoggingError::Filter { directives, source })
    }
}
