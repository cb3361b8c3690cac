use std::{io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::fs::operations::overwrite_file;

use super::{
    entities::Log,
    log_format::{parse_log, render_csv, render_log},
};

/// Interface for abstracting persistence of the log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Reads every stored day. A store with nothing saved yet returns an empty log.
    async fn load(&self) -> Result<Log>;

    /// Overwrites the human readable log.
    async fn save(&self, log: &Log) -> Result<()>;

    /// Overwrites the CSV export.
    async fn save_csv(&self, log: &Log) -> Result<()>;
}

/// The main realization of [LogStore], backed by a text log and a CSV file next to it.
///
/// There is no inter-process locking. Two trackers running against the same log will overwrite
/// each other's totals.
pub struct LogStoreImpl {
    log_path: PathBuf,
    csv_path: PathBuf,
    reference: u64,
}

impl LogStoreImpl {
    pub fn new(log_path: PathBuf, reference: u64) -> Self {
        let csv_path = csv_path_for(&log_path);
        Self {
            log_path,
            csv_path,
            reference,
        }
    }

    pub fn log_path(&self) -> &PathBuf {
        &self.log_path
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

/// CSV export lives next to the log, with the same base name.
pub fn csv_path_for(log_path: &std::path::Path) -> PathBuf {
    log_path.with_extension("csv")
}

#[async_trait]
impl LogStore for LogStoreImpl {
    #[instrument(skip_all)]
    async fn load(&self) -> Result<Log> {
        match tokio::fs::read_to_string(&self.log_path).await {
            Ok(text) => {
                let log = parse_log(&text);
                debug!("Loaded {} days from {:?}", log.len(), self.log_path);
                Ok(log)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No log found at {:?}, starting from scratch", self.log_path);
                Ok(Log::new())
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read log {}", self.log_path.display()))
            }
        }
    }

    #[instrument(skip_all)]
    async fn save(&self, log: &Log) -> Result<()> {
        overwrite_file(&self.log_path, render_log(log, self.reference).as_bytes())
            .await
            .with_context(|| format!("Failed to write log {}", self.log_path.display()))?;
        debug!("Saved log to {:?}", self.log_path);
        Ok(())
    }

    #[instrument(skip_all)]
    async fn save_csv(&self, log: &Log) -> Result<()> {
        overwrite_file(&self.csv_path, render_csv(log, self.reference).as_bytes())
            .await
            .with_context(|| format!("Failed to write csv {}", self.csv_path.display()))?;
        debug!("Saved csv to {:?}", self.csv_path);
        Ok(())
    }
}
