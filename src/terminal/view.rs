use crate::{
    tracker::engine::SessionSnapshot,
    utils::time::format_seconds,
};

/// How a line should be emphasized. The layout itself stays plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Heading,
    Alert,
    Active,
}

/// Lays out one frame of the tracker.
pub fn screen_lines(snapshot: &SessionSnapshot) -> Vec<(Tone, String)> {
    let mut lines = Vec::new();

    if let Some(message) = &snapshot.message {
        lines.push((Tone::Alert, message.clone()));
    }
    lines.push((
        Tone::Heading,
        format!("{} | {}", snapshot.date, snapshot.now.format("%H:%M:%S")),
    ));
    lines.push((Tone::Plain, String::new()));
    lines.push((
        Tone::Plain,
        format!(
            "Total time: {} / {} ({:.1})",
            format_seconds(snapshot.total),
            format_seconds(snapshot.reference),
            snapshot.total_percentage
        ),
    ));
    for task in &snapshot.tasks {
        lines.push((
            Tone::Plain,
            format!(
                "  {}: {} ({:.1})",
                task.task,
                format_seconds(task.seconds),
                task.percentage
            ),
        ));
    }

    lines.push((Tone::Plain, String::new()));
    let current = match (&snapshot.active, snapshot.paused) {
        (Some(task), true) => format!("Current task: {task} [PAUSED]"),
        (Some(task), false) => format!("Current task: {task}"),
        (None, _) => "Current task: None".to_string(),
    };
    lines.push((Tone::Active, current));

    lines.push((Tone::Plain, String::new()));
    lines.push((Tone::Heading, "Options:".to_string()));
    for (index, task) in snapshot.tasks.iter().enumerate() {
        lines.push((Tone::Plain, format!("{}. Switch to {}", index + 1, task.task)));
    }
    lines.push((Tone::Plain, "P. Pause/Resume current task".to_string()));
    lines.push((Tone::Plain, "Q. Quit and save".to_string()));
    lines.push((Tone::Plain, String::new()));
    lines.push((Tone::Plain, "Select option (number, P, Q): ".to_string()));

    lines
}
