use std::{collections::BTreeMap, sync::Arc};

/// Accumulated seconds per task for a single calendar day. Tasks keep the order in which they
/// were first added, which is also the order they are written out in.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct DayRecord {
    tasks: Vec<TaskTime>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TaskTime {
    pub task: Arc<str>,
    pub seconds: u64,
}

impl DayRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, task: &str) -> Option<u64> {
        self.tasks
            .iter()
            .find(|v| &*v.task == task)
            .map(|v| v.seconds)
    }

    /// Stores the value for a task. Existing tasks keep their position.
    pub fn set(&mut self, task: Arc<str>, seconds: u64) {
        match self.tasks.iter_mut().find(|v| v.task == task) {
            Some(entry) => entry.seconds = seconds,
            None => self.tasks.push(TaskTime { task, seconds }),
        }
    }

    pub fn add(&mut self, task: &Arc<str>, seconds: u64) {
        match self.tasks.iter_mut().find(|v| &v.task == task) {
            Some(entry) => entry.seconds = entry.seconds.saturating_add(seconds),
            None => self.tasks.push(TaskTime {
                task: task.clone(),
                seconds,
            }),
        }
    }

    /// Inserts a task with zero seconds unless it is already present.
    pub fn ensure(&mut self, task: &Arc<str>) {
        if self.get(task).is_none() {
            self.tasks.push(TaskTime {
                task: task.clone(),
                seconds: 0,
            });
        }
    }

    /// Sum of every task, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.tasks.iter().map(|v| v.seconds).fold(0, u64::saturating_add)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskTime> {
        self.tasks.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Every known day, keyed by its `YYYY-MM-DD` header. Iteration is chronological because the
/// date format sorts lexically.
pub type Log = BTreeMap<String, DayRecord>;
