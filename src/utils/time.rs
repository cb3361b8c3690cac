use std::num::ParseIntError;

use chrono::NaiveDate;
use thiserror::Error;

/// This is the standard way of converting a date to a day key in daytally.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("duration is empty")]
    Empty,
    #[error("duration {0:?} has more than 3 components")]
    TooManyComponents(String),
    #[error("component {component:?} of {text:?} is not a number: {source}")]
    NotANumber {
        text: String,
        component: String,
        source: ParseIntError,
    },
    #[error("duration {0:?} does not fit into 64 bits of seconds")]
    Overflow(String),
}

/// Renders seconds as `H:MM:SS`. Hours are not padded and not bounded.
pub fn format_seconds(seconds: u64) -> String {
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Renders a reference duration as `HH:MM:SS`, e.g. `08:00:00` for a work day.
pub fn format_reference(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Parses `H:MM:SS`, `MM:SS` or a bare amount of seconds. Components are read left to right
/// with a radix of 60.
pub fn parse_seconds(text: &str) -> Result<u64, DurationParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DurationParseError::Empty);
    }
    let components = text.split(':').collect::<Vec<_>>();
    if components.len() > 3 {
        return Err(DurationParseError::TooManyComponents(text.to_string()));
    }

    components.into_iter().try_fold(0u64, |total, component| {
        let value = component
            .parse::<u64>()
            .map_err(|source| DurationParseError::NotANumber {
                text: text.to_string(),
                component: component.to_string(),
                source,
            })?;
        total
            .checked_mul(60)
            .and_then(|v| v.checked_add(value))
            .ok_or_else(|| DurationParseError::Overflow(text.to_string()))
    })
}
