use std::{fmt::Write, sync::Arc};

use tracing::warn;

use crate::utils::{
    percentage::seconds_percentage,
    time::{format_reference, format_seconds, parse_seconds},
};

use super::entities::{DayRecord, Log};

/// Marks a per-task line.
pub const TASK_MARKER: char = '#';
/// Title of the per-day summary line. Never a task.
pub const TOTAL_MARKER: &str = "TOTAL";

const MAX_DATE_LINE_LENGTH: usize = 12;

pub const CSV_HEADER: &str = "date,task,seconds,percentage";

#[derive(Debug, PartialEq, Eq)]
enum LogLine<'a> {
    Date(&'a str),
    Task { task: &'a str, duration: &'a str },
    Other,
}

fn classify(line: &str) -> LogLine<'_> {
    if is_date_line(line) {
        return LogLine::Date(line);
    }
    let Some(rest) = line.strip_prefix(TASK_MARKER) else {
        return LogLine::Other;
    };
    let Some((task, value)) = rest.split_once(':') else {
        return LogLine::Other;
    };
    let value = value.trim();
    let duration = value.split(' ').next().unwrap_or(value);
    LogLine::Task {
        task: task.trim(),
        duration,
    }
}

fn is_date_line(line: &str) -> bool {
    line.len() <= MAX_DATE_LINE_LENGTH
        && !line.starts_with(TASK_MARKER)
        && line.chars().filter(|v| *v == '-').count() == 2
        && line.chars().all(|v| v.is_ascii_digit() || v == '-')
}

/// Reads a log back into memory. Lines that don't fit the grammar are skipped, so this never
/// fails.
pub fn parse_log(text: &str) -> Log {
    let mut log = Log::new();
    let mut current: Option<String> = None;

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match classify(line) {
            LogLine::Date(date) => {
                log.entry(date.to_string()).or_default();
                current = Some(date.to_string());
            }
            LogLine::Task { task, duration } => {
                let Some(date) = current.as_ref() else {
                    warn!("Line {} has a task entry without a date: {line}", number + 1);
                    continue;
                };
                if task.is_empty() || task == TOTAL_MARKER {
                    warn!("Line {} has a reserved or empty task name: {line}", number + 1);
                    continue;
                }
                match parse_seconds(duration) {
                    Ok(seconds) => log
                        .entry(date.clone())
                        .or_insert_with(DayRecord::new)
                        .set(Arc::from(task), seconds),
                    Err(e) => warn!("Skipping line {} with illegal duration: {e}", number + 1),
                }
            }
            LogLine::Other => {}
        }
    }

    log
}

/// Renders the human readable log. Output only depends on `log` and `reference`.
pub fn render_log(log: &Log, reference: u64) -> String {
    let reference_text = format_reference(reference);
    let mut out = String::new();

    for (date, day) in log {
        let total = day.total();
        let _ = writeln!(out, "{date}");
        let _ = writeln!(
            out,
            "{TOTAL_MARKER}: {} ({}/{reference_text}) {:.1}",
            format_seconds(total),
            format_seconds(total),
            seconds_percentage(total, reference)
        );
        for entry in day.iter() {
            let _ = writeln!(
                out,
                "{TASK_MARKER}   {}: {} ({}/{reference_text}) {:.1}",
                entry.task,
                format_seconds(entry.seconds),
                format_seconds(entry.seconds),
                seconds_percentage(entry.seconds, reference)
            );
        }
    }

    out
}

/// Renders the CSV export, one row per date and task.
pub fn render_csv(log: &Log, reference: u64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{CSV_HEADER}");

    for (date, day) in log {
        for entry in day.iter() {
            let _ = writeln!(
                out,
                "{},{},{},{:.2}",
                csv_field(date),
                csv_field(&entry.task),
                entry.seconds,
                *seconds_percentage(entry.seconds, reference)
            );
        }
    }

    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
