use thiserror::Error;

pub const MIN_ALARM_INTERVAL_MS: i64 = 60_000;
const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntervalInputError {
    #[error("alarm interval is empty")]
    Empty,
    #[error("'{0}' is not a number of minutes")]
    NotANumber(String),
    #[error("alarm interval must be at least 1 minute, got {0}")]
    BelowMinimum(f64),
}

/// Parses the settings-screen interval field: a whole or fractional number
/// of minutes, at least one. Returns milliseconds, truncated.
pub fn parse_interval_minutes(input: &str) -> Result<i64, IntervalInputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IntervalInputError::Empty);
    }

    let minutes: f64 = trimmed
        .parse()
        .map_err(|_| IntervalInputError::NotANumber(trimmed.to_string()))?;
    if !minutes.is_finite() {
        return Err(IntervalInputError::NotANumber(trimmed.to_string()));
    }

    let interval_ms = (minutes * MS_PER_MINUTE) as i64;
    if interval_ms < MIN_ALARM_INTERVAL_MS {
        return Err(IntervalInputError::BelowMinimum(minutes));
    }
    Ok(interval_ms)
}
