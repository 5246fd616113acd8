use thiserror::Error;

/// The battery reader could not produce a snapshot.
#[derive(Debug, Clone, Error)]
#[error("battery reader unavailable: {reason}")]
pub struct ReaderUnavailable {
    pub reason: String,
}

impl ReaderUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A settings write failed, or the backend could not be read at all.
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    #[error("failed to store setting '{key}': {reason}")]
    Store { key: String, reason: String },
    #[error("settings backend unavailable: {0}")]
    Backend(String),
}

impl PersistenceError {
    pub fn store(key: &str, err: impl std::fmt::Display) -> Self {
        Self::Store {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }
}

/// The periodic-trigger service refused a register or cancel call.
#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    #[error("trigger {request_code} could not be registered: {reason}")]
    Register { request_code: i32, reason: String },
    #[error("trigger {request_code} could not be cancelled: {reason}")]
    Cancel { request_code: i32, reason: String },
    #[error("alarm interval must be positive, got {0}ms")]
    InvalidInterval(i64),
}

#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Reader(#[from] ReaderUnavailable),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, Error)]
pub enum ToggleError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
