use std::sync::Arc;

use anyhow::Result;
use engine::{Control, SessionEngine};
use storage::{
    entities::Log,
    log_store::{LogStore, LogStoreImpl},
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    terminal::{console::ConsoleTerminal, Terminal},
    utils::{
        clock::{Clock, DefaultClock},
        time::date_to_record_name,
    },
};

pub mod config;
pub mod engine;
pub mod shutdown;
pub mod storage;
pub mod tasks;

use config::TrackerConfig;

/// Represents the starting point for the tracker
pub async fn start_tracker(config: TrackerConfig) -> Result<()> {
    config.validate()?;
    // Checked before the screen is taken over, so a missing list is reported plainly.
    let tasks = tasks::load_tasks(&config.tasks_path).await?;
    let store = LogStoreImpl::new(config.log_path.clone(), config.reference);

    let shutdown_token = CancellationToken::new();
    let signals = tokio::spawn(shutdown::detect_shutdown(shutdown_token.clone()));

    let result = {
        let mut terminal = ConsoleTerminal::new()?;
        run_tracker(
            tasks,
            &store,
            &mut terminal,
            &DefaultClock,
            &config,
            shutdown_token,
        )
        .await
    };
    signals.abort();

    result?;
    println!(
        "Log saved to {} and {}.",
        store.log_path().display(),
        store.csv_path().display()
    );
    Ok(())
}

/// Executes the tracker event loop. Whatever ends the loop, session time is drained and saved
/// before returning. Returns the log as it was last saved.
pub async fn run_tracker<S: LogStore>(
    tasks: Vec<Arc<str>>,
    store: &S,
    terminal: &mut impl Terminal,
    clock: &impl Clock,
    config: &TrackerConfig,
    shutdown: CancellationToken,
) -> Result<Log> {
    let log = store.load().await?;
    let mut engine = SessionEngine::new(
        tasks,
        log,
        date_to_record_name(clock.time().date_naive()),
        config.reference,
        config.autosave_interval,
        clock.instant(),
    );
    info!("Tracking {}", engine.today());

    let outcome = event_loop(&mut engine, store, terminal, clock, config, &shutdown).await;
    if let Err(e) = &outcome {
        error!("Tracker loop stopped with an error {e:?}");
    }

    engine.tick(clock.instant());
    engine.drain();
    info!("Saving before exit");
    persist(store, engine.log()).await?;

    outcome?;
    Ok(engine.into_log())
}

async fn event_loop<S: LogStore>(
    engine: &mut SessionEngine,
    store: &S,
    terminal: &mut impl Terminal,
    clock: &impl Clock,
    config: &TrackerConfig,
    shutdown: &CancellationToken,
) -> Result<()> {
    loop {
        let now = clock.instant();
        engine.tick(now);

        let rolled = engine.roll_over(date_to_record_name(clock.time().date_naive()));
        if rolled || engine.autosave_due(now) {
            autosave(engine, store, now).await;
        }

        terminal.render(&engine.snapshot(clock.time())).await?;

        let key = tokio::select! {
            // Cancelation still goes through the regular exit path of run_tracker.
            _ = shutdown.cancelled() => {
                info!("Shutdown requested");
                return Ok(());
            }
            key = terminal.read_key(config.tick_interval) => key?,
        };

        if let Some(key) = key {
            // Time up to the key press belongs to the previous state.
            engine.tick(clock.instant());
            if engine.handle(key) == Control::Quit {
                return Ok(());
            }
        }
    }
}

async fn autosave<S: LogStore>(engine: &mut SessionEngine, store: &S, now: Instant) {
    engine.drain();
    match persist(store, engine.log()).await {
        Ok(()) => info!("Autosaved"),
        Err(e) => {
            // Totals stay merged in memory and go out with the next save.
            error!("Autosave failed {e:?}");
            engine.report_failure(format!("Autosave failed: {e}"));
        }
    }
    engine.mark_saved(now);
}

async fn persist<S: LogStore>(store: &S, log: &Log) -> Result<()> {
    let text = store.save(log).await;
    let csv = store.save_csv(log).await;
    debug!("Persisted {} days", log.len());
    text.and(csv)
}

#[cfg(test)]
mod tracker_tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, Local, TimeZone};
    use tempfile::tempdir;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use crate::{
        terminal::{KeyInput, Terminal},
        tracker::{
            config::TrackerConfig,
            engine::SessionSnapshot,
            run_tracker,
            storage::{
                entities::{DayRecord, Log},
                log_store::{LogStore, LogStoreImpl, MockLogStore},
            },
        },
        utils::{clock::Clock, logging::TEST_LOGGING},
    };

    #[derive(Clone)]
    struct TestClock {
        start_time: DateTime<Local>,
        reference: Instant,
    }

    impl TestClock {
        fn at(hour: u32, minute: u32) -> Self {
            Self {
                start_time: Local.with_ymd_and_hms(2018, 7, 4, hour, minute, 0).unwrap(),
                reference: Instant::now(),
            }
        }
    }

    impl Clock for TestClock {
        fn time(&self) -> DateTime<Local> {
            self.start_time + chrono::Duration::from_std(self.reference.elapsed()).unwrap()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }
    }

    /// Plays keys back with the given delay since the previous key. Waits never exceed the
    /// requested timeout, like a real terminal. Quits once the script runs out.
    struct ScriptedTerminal {
        script: VecDeque<(Duration, KeyInput)>,
        waited: Duration,
        frames: Vec<SessionSnapshot>,
    }

    impl ScriptedTerminal {
        fn new(script: impl IntoIterator<Item = (u64, KeyInput)>) -> Self {
            Self {
                script: script
                    .into_iter()
                    .map(|(after, key)| (Duration::from_secs(after), key))
                    .collect(),
                waited: Duration::ZERO,
                frames: vec![],
            }
        }
    }

    #[async_trait]
    impl Terminal for ScriptedTerminal {
        async fn render(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
            self.frames.push(snapshot.clone());
            Ok(())
        }

        async fn read_key(&mut self, timeout: Duration) -> Result<Option<KeyInput>> {
            let Some((after, key)) = self.script.front().copied() else {
                return Ok(Some(KeyInput::Quit));
            };
            let remaining = after.saturating_sub(self.waited);
            if remaining <= timeout {
                tokio::time::sleep(remaining).await;
                self.script.pop_front();
                self.waited = Duration::ZERO;
                Ok(Some(key))
            } else {
                tokio::time::sleep(timeout).await;
                self.waited += timeout;
                Ok(None)
            }
        }
    }

    /// Keeps every saved log in memory.
    #[derive(Default)]
    struct MemoryStore {
        initial: Log,
        saved: Mutex<Vec<Log>>,
    }

    #[async_trait]
    impl LogStore for MemoryStore {
        async fn load(&self) -> Result<Log> {
            Ok(self.initial.clone())
        }

        async fn save(&self, log: &Log) -> Result<()> {
            self.saved.lock().unwrap().push(log.clone());
            Ok(())
        }

        async fn save_csv(&self, _log: &Log) -> Result<()> {
            Ok(())
        }
    }

    fn tasks() -> Vec<Arc<str>> {
        vec!["Write".into(), "Review".into()]
    }

    fn config() -> TrackerConfig {
        TrackerConfig::new("tasks.txt".into(), "logfile.txt".into())
    }

    const TODAY: &str = "2018-07-04";

    #[tokio::test(start_paused = true)]
    async fn test_write_then_pause_then_quit() -> Result<()> {
        *TEST_LOGGING;
        let store = MemoryStore::default();
        let mut terminal = ScriptedTerminal::new([
            (0, KeyInput::Select(1)),
            (65, KeyInput::TogglePause),
            (30, KeyInput::Quit),
        ]);

        let log = run_tracker(
            tasks(),
            &store,
            &mut terminal,
            &TestClock::at(12, 0),
            &config(),
            CancellationToken::new(),
        )
        .await?;

        let day = &log[TODAY];
        assert_eq!(day.get("Write"), Some(65));
        assert_eq!(day.get("Review"), Some(0));

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0], log);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_log_file() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let log_path = dir.path().join("logfile.txt");
        let store = LogStoreImpl::new(log_path.clone(), 28_800);
        let mut terminal = ScriptedTerminal::new([
            (0, KeyInput::Select(1)),
            (65, KeyInput::TogglePause),
            (30, KeyInput::Quit),
        ]);

        run_tracker(
            tasks(),
            &store,
            &mut terminal,
            &TestClock::at(12, 0),
            &config(),
            CancellationToken::new(),
        )
        .await?;

        let text = std::fs::read_to_string(&log_path)?;
        assert_eq!(
            text,
            "2018-07-04\n\
             TOTAL: 0:01:05 (0:01:05/08:00:00) 0.2%\n\
             #   Write: 0:01:05 (0:01:05/08:00:00) 0.2%\n\
             #   Review: 0:00:00 (0:00:00/08:00:00) 0.0%\n"
        );
        let csv = std::fs::read_to_string(dir.path().join("logfile.csv"))?;
        assert!(csv.contains("2018-07-04,Write,65,0.23\n"));

        let reloaded = store.load().await?;
        assert_eq!(reloaded[TODAY].get("Write"), Some(65));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_is_kept() -> Result<()> {
        let mut previous = DayRecord::new();
        previous.set("Write".into(), 3600);
        let mut today = DayRecord::new();
        today.set("Review".into(), 100);
        let mut initial = Log::new();
        initial.insert("2018-07-03".into(), previous.clone());
        initial.insert(TODAY.into(), today);
        let store = MemoryStore {
            initial,
            ..Default::default()
        };
        let mut terminal =
            ScriptedTerminal::new([(0, KeyInput::Select(2)), (20, KeyInput::Quit)]);

        let log = run_tracker(
            tasks(),
            &store,
            &mut terminal,
            &TestClock::at(12, 0),
            &config(),
            CancellationToken::new(),
        )
        .await?;

        assert_eq!(log["2018-07-03"], previous);
        assert_eq!(log[TODAY].get("Review"), Some(120));
        assert_eq!(log[TODAY].get("Write"), Some(0));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_drains_session() -> Result<()> {
        let store = MemoryStore::default();
        let mut terminal =
            ScriptedTerminal::new([(0, KeyInput::Select(1)), (310, KeyInput::Quit)]);

        let log = run_tracker(
            tasks(),
            &store,
            &mut terminal,
            &TestClock::at(12, 0),
            &config(),
            CancellationToken::new(),
        )
        .await?;

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0][TODAY].get("Write"), Some(300));
        assert_eq!(saved[1][TODAY].get("Write"), Some(310));
        assert_eq!(log[TODAY].get("Write"), Some(310));

        // The frame right after the autosave shows the same total as before it.
        let totals = terminal.frames.iter().map(|v| v.total).collect::<Vec<_>>();
        assert!(totals.windows(2).all(|v| v[0] <= v[1]));
        assert!(totals.contains(&300));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_key_is_reported_once() -> Result<()> {
        let store = MemoryStore::default();
        let mut terminal = ScriptedTerminal::new([
            (0, KeyInput::Select(1)),
            (2, KeyInput::Invalid('x')),
            (2, KeyInput::Select(7)),
            (2, KeyInput::Quit),
        ]);

        let log = run_tracker(
            tasks(),
            &store,
            &mut terminal,
            &TestClock::at(12, 0),
            &config(),
            CancellationToken::new(),
        )
        .await?;

        assert_eq!(log[TODAY].get("Write"), Some(6));
        let messages = terminal
            .frames
            .iter()
            .filter(|v| v.message.is_some())
            .count();
        assert_eq!(messages, 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_signal_saves() -> Result<()> {
        let store = MemoryStore::default();
        let mut terminal =
            ScriptedTerminal::new([(0, KeyInput::Select(1)), (1000, KeyInput::Quit)]);
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(50)).await;
            trigger.cancel();
        });

        let log = run_tracker(
            tasks(),
            &store,
            &mut terminal,
            &TestClock::at(12, 0),
            &config(),
            shutdown,
        )
        .await?;

        assert_eq!(log[TODAY].get("Write"), Some(50));
        assert_eq!(store.saved.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_midnight_starts_new_day() -> Result<()> {
        let store = MemoryStore::default();
        let mut terminal =
            ScriptedTerminal::new([(0, KeyInput::Select(2)), (120, KeyInput::Quit)]);

        let log = run_tracker(
            tasks(),
            &store,
            &mut terminal,
            &TestClock::at(23, 59),
            &config(),
            CancellationToken::new(),
        )
        .await?;

        assert_eq!(log[TODAY].get("Review"), Some(60));
        assert_eq!(log["2018-07-05"].get("Review"), Some(60));
        assert_eq!(log["2018-07-05"].get("Write"), Some(0));
        assert_eq!(store.saved.lock().unwrap().len(), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_autosave_keeps_totals() -> Result<()> {
        *TEST_LOGGING;
        let saved = Arc::new(Mutex::new(Vec::<Log>::new()));
        let mut store = MockLogStore::new();
        store.expect_load().returning(|| Ok(Log::new()));
        let mut attempts = 0;
        let captured = saved.clone();
        store.expect_save().returning(move |log| {
            attempts += 1;
            if attempts == 1 {
                Err(anyhow!("disk full"))
            } else {
                captured.lock().unwrap().push(log.clone());
                Ok(())
            }
        });
        store.expect_save_csv().times(2).returning(|_| Ok(()));

        let mut terminal =
            ScriptedTerminal::new([(0, KeyInput::Select(1)), (310, KeyInput::Quit)]);

        let log = run_tracker(
            tasks(),
            &store,
            &mut terminal,
            &TestClock::at(12, 0),
            &config(),
            CancellationToken::new(),
        )
        .await?;

        let saved = saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0][TODAY].get("Write"), Some(310));
        assert_eq!(log[TODAY].get("Write"), Some(310));
        assert!(terminal
            .frames
            .iter()
            .any(|v| v.message.as_deref() == Some("Autosave failed: disk full")));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_exit_save_is_returned() -> Result<()> {
        let mut store = MockLogStore::new();
        store.expect_load().returning(|| Ok(Log::new()));
        store
            .expect_save()
            .returning(|_| Err(anyhow!("read only file system")));
        store.expect_save_csv().returning(|_| Ok(()));
        let mut terminal = ScriptedTerminal::new([(0, KeyInput::Quit)]);

        let result = run_tracker(
            tasks(),
            &store,
            &mut terminal,
            &TestClock::at(12, 0),
            &config(),
            CancellationToken::new(),
        )
        .await;

        assert!(result.is_err());
        Ok(())
    }
}
