use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use super::storage::log_format::TOTAL_MARKER;

/// A nominal full work day. Every percentage is relative to it.
pub const DEFAULT_REFERENCE_SECONDS: u64 = 8 * 60 * 60;
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub tasks_path: PathBuf,
    pub log_path: PathBuf,
    /// Denominator for every percentage, in seconds.
    pub reference: u64,
    pub autosave_interval: Duration,
    /// Upper bound on how long the loop waits for a key.
    pub tick_interval: Duration,
}

impl TrackerConfig {
    pub fn new(tasks_path: PathBuf, log_path: PathBuf) -> Self {
        Self {
            tasks_path,
            log_path,
            reference: DEFAULT_REFERENCE_SECONDS,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_reference(self, reference: u64) -> Self {
        Self { reference, ..self }
    }

    pub fn with_autosave_interval(self, autosave_interval: Duration) -> Self {
        Self {
            autosave_interval,
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reference == 0 {
            return Err(ConfigError::ZeroReference);
        }
        // The CSV export takes the log name with a csv extension and would overwrite the log.
        if self
            .log_path
            .extension()
            .is_some_and(|v| v.eq_ignore_ascii_case("csv"))
        {
            return Err(ConfigError::LogPathIsCsv(self.log_path.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Can't read task list {path}: {source}")]
    TasksUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Task list {0} has no tasks")]
    NoTasks(PathBuf),
    #[error("Task {name:?} in {path} can't be stored in the log: {reason}")]
    InvalidTaskName {
        path: PathBuf,
        name: String,
        reason: &'static str,
    },
    #[error("Log path {0} would be overwritten by the CSV export")]
    LogPathIsCsv(PathBuf),
    #[error("Reference duration must be longer than 0 seconds")]
    ZeroReference,
}

/// Reason a task name can't round-trip through the log, if any.
pub fn task_name_problem(name: &str) -> Option<&'static str> {
    if name == TOTAL_MARKER {
        Some("the name is reserved for the daily summary")
    } else if name.contains(':') {
        Some("the name contains ':'")
    } else {
        None
    }
}
