use std::{path::Path, sync::Arc};

use tracing::{info, warn};

use super::config::{task_name_problem, ConfigError};

/// Reads the task list. One task per line, blank lines are ignored and duplicates dropped.
pub async fn load_tasks(path: &Path) -> Result<Vec<Arc<str>>, ConfigError> {
    let text =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::TasksUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

    let tasks = parse_tasks(&text);
    if tasks.is_empty() {
        return Err(ConfigError::NoTasks(path.to_path_buf()));
    }
    if let Some((name, reason)) = tasks
        .iter()
        .find_map(|v| task_name_problem(v).map(|reason| (v, reason)))
    {
        return Err(ConfigError::InvalidTaskName {
            path: path.to_path_buf(),
            name: name.to_string(),
            reason,
        });
    }

    info!("Loaded {} tasks from {path:?}", tasks.len());
    Ok(tasks)
}

fn parse_tasks(text: &str) -> Vec<Arc<str>> {
    let mut tasks: Vec<Arc<str>> = Vec::new();
    for line in text.lines().map(str::trim).filter(|v| !v.is_empty()) {
        if tasks.iter().any(|v| &**v == line) {
            warn!("Task {line:?} is listed twice, ignoring the repeat");
            continue;
        }
        tasks.push(line.into());
    }
    tasks
}
