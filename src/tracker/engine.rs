use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::{
    terminal::KeyInput,
    utils::percentage::{seconds_percentage, Percentage},
};

use super::storage::entities::{DayRecord, Log};

pub const INVALID_INPUT_MESSAGE: &str = "Invalid input.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Running(usize),
    Paused(usize),
}

/// What the loop should do after a key was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskSummary {
    pub task: Arc<str>,
    pub seconds: u64,
    pub percentage: Percentage,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub date: String,
    pub now: DateTime<Local>,
    pub total: u64,
    pub total_percentage: Percentage,
    pub reference: u64,
    pub tasks: Vec<TaskSummary>,
    pub active: Option<Arc<str>>,
    pub paused: bool,
    pub message: Option<String>,
}

/// The tracker state machine. Time accrues into per-task session seconds, which are only moved
/// into the log by [SessionEngine::drain].
pub struct SessionEngine {
    tasks: Vec<Arc<str>>,
    log: Log,
    today: String,
    reference: u64,
    autosave_interval: Duration,
    state: TrackerState,
    session: Vec<u64>,
    carry: Duration,
    last_tick: Instant,
    last_autosave: Instant,
    message: Option<String>,
}

impl SessionEngine {
    pub fn new(
        tasks: Vec<Arc<str>>,
        log: Log,
        today: String,
        reference: u64,
        autosave_interval: Duration,
        now: Instant,
    ) -> Self {
        let session = vec![0; tasks.len()];
        let mut engine = Self {
            tasks,
            log,
            today,
            reference,
            autosave_interval,
            state: TrackerState::Idle,
            session,
            carry: Duration::ZERO,
            last_tick: now,
            last_autosave: now,
            message: None,
        };
        engine.open_today();
        engine
    }

    fn open_today(&mut self) {
        let day = self.log.entry(self.today.clone()).or_insert_with(DayRecord::new);
        for task in &self.tasks {
            day.ensure(task);
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn into_log(self) -> Log {
        self.log
    }

    pub fn today(&self) -> &str {
        &self.today
    }

    pub fn session_seconds(&self, task: usize) -> u64 {
        self.session.get(task).copied().unwrap_or(0)
    }

    pub fn committed_seconds(&self, task: usize) -> u64 {
        self.tasks
            .get(task)
            .and_then(|task| self.log.get(&self.today).and_then(|day| day.get(task)))
            .unwrap_or(0)
    }

    pub fn handle(&mut self, input: KeyInput) -> Control {
        match input {
            KeyInput::Select(position) if (1..=self.tasks.len()).contains(&position) => {
                let index = position - 1;
                if self.state != TrackerState::Running(index) {
                    // A leftover fraction belongs to the task that was running.
                    self.carry = Duration::ZERO;
                }
                self.state = TrackerState::Running(index);
                debug!("Switched to {}", self.tasks[index]);
            }
            KeyInput::TogglePause => {
                self.state = match self.state {
                    TrackerState::Idle => TrackerState::Idle,
                    TrackerState::Running(i) => TrackerState::Paused(i),
                    TrackerState::Paused(i) => TrackerState::Running(i),
                };
                debug!("Pause toggled, now {:?}", self.state);
            }
            KeyInput::Quit => {
                debug!("Quit requested");
                return Control::Quit;
            }
            KeyInput::Select(_) | KeyInput::Invalid(_) => {
                debug!("Ignoring invalid input {input:?}");
                self.message = Some(INVALID_INPUT_MESSAGE.to_string());
            }
        }
        Control::Continue
    }

    /// Credits time elapsed since the previous tick to the running task. Only whole seconds are
    /// credited; the remainder is carried while the task keeps running.
    pub fn tick(&mut self, now: Instant) {
        let delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        match self.state {
            TrackerState::Running(index) => {
                let elapsed = delta + self.carry;
                let seconds = elapsed.as_secs();
                self.carry = elapsed - Duration::from_secs(seconds);
                self.session[index] = self.session[index].saturating_add(seconds);
                trace!("Credited {seconds}s to {}", self.tasks[index]);
            }
            TrackerState::Idle | TrackerState::Paused(_) => {
                self.carry = Duration::ZERO;
            }
        }
    }

    pub fn autosave_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_autosave) >= self.autosave_interval
    }

    pub fn mark_saved(&mut self, now: Instant) {
        self.last_autosave = now;
    }

    /// Moves all session seconds into today's record and resets them.
    pub fn drain(&mut self) {
        let day = self.log.entry(self.today.clone()).or_insert_with(DayRecord::new);
        for (task, seconds) in self.tasks.iter().zip(self.session.iter_mut()) {
            day.add(task, *seconds);
            *seconds = 0;
        }
    }

    /// Starts a new day. Time tracked so far belongs to the previous one. Returns whether the day
    /// actually changed.
    pub fn roll_over(&mut self, date: String) -> bool {
        if date == self.today {
            return false;
        }
        self.drain();
        info!("Day changed from {} to {date}", self.today);
        self.today = date;
        self.open_today();
        true
    }

    /// Shows a message on the next frame only.
    pub fn report_failure(&mut self, message: String) {
        self.message = Some(message);
    }

    pub fn snapshot(&mut self, now: DateTime<Local>) -> SessionSnapshot {
        let tasks = (0..self.tasks.len())
            .map(|index| {
                let seconds = self
                    .committed_seconds(index)
                    .saturating_add(self.session_seconds(index));
                TaskSummary {
                    task: self.tasks[index].clone(),
                    seconds,
                    percentage: seconds_percentage(seconds, self.reference),
                }
            })
            .collect::<Vec<_>>();
        let total = tasks.iter().map(|v| v.seconds).fold(0, u64::saturating_add);

        let (active, paused) = match self.state {
            TrackerState::Idle => (None, false),
            TrackerState::Running(i) => (Some(self.tasks[i].clone()), false),
            TrackerState::Paused(i) => (Some(self.tasks[i].clone()), true),
        };

        SessionSnapshot {
            date: self.today.clone(),
            now,
            total,
            total_percentage: seconds_percentage(total, self.reference),
            reference: self.reference,
            tasks,
            active,
            paused,
            message: self.message.take(),
        }
    }
}
