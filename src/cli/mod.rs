use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};

use crate::{
    tracker::{config::TrackerConfig, start_tracker},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, LOG_PREFIX},
        runtime::single_thread_runtime,
    },
};

const DEFAULT_TASKS_FILE: &str = "tasks.txt";
const DEFAULT_LOG_FILE: &str = "logfile.txt";

#[derive(Parser, Debug)]
#[command(name = "daytally", version, long_about = None)]
#[command(about = "Track time spent on a fixed list of tasks, per day", long_about = None)]
pub struct Args {
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        help = "Task list with one task per line. Defaults to tasks.txt in the application directory"
    )]
    tasks: Option<PathBuf>,
    #[arg(
        long,
        help = "Text log to read and update. The CSV export is written next to it. Defaults to logfile.txt in the application directory"
    )]
    log: Option<PathBuf>,
    #[arg(
        long = "reference-hours",
        default_value_t = 8.,
        value_parser = parse_hours,
        help = "Length of a full work day. Percentages are relative to it"
    )]
    reference_hours: f64,
    #[arg(
        long = "autosave-secs",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "How often tracked time is written to disk"
    )]
    autosave_secs: u64,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    log_console: bool,
    #[arg(long = "log-filter", help = "Level of diagnostics written into the logs directory")]
    log_filter: Option<LevelFilter>,
}

fn parse_hours(value: &str) -> Result<f64, String> {
    let hours = value
        .parse::<f64>()
        .map_err(|e| format!("{value} is not a number: {e}"))?;
    if hours.is_finite() && hours > 0. {
        Ok(hours)
    } else {
        Err(format!("{value} should be a positive amount of hours"))
    }
}

impl Args {
    fn tracker_config(&self, app_dir: &std::path::Path) -> TrackerConfig {
        let tasks = self
            .tasks
            .clone()
            .unwrap_or_else(|| app_dir.join(DEFAULT_TASKS_FILE));
        let log = self
            .log
            .clone()
            .unwrap_or_else(|| app_dir.join(DEFAULT_LOG_FILE));

        TrackerConfig::new(tasks, log)
            .with_reference((self.reference_hours * 3600.).round() as u64)
            .with_autosave_interval(Duration::from_secs(self.autosave_secs))
    }
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, Ok)?;
    enable_logging(LOG_PREFIX, &app_dir.join("logs"), args.log_filter, args.log_console)?;

    let config = args.tracker_config(&app_dir);
    info!("Starting with {config:?}");
    single_thread_runtime()?.block_on(start_tracker(config))
}
