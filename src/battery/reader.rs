use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::ReaderUnavailable;

use super::BatterySnapshot;

/// Source of battery telemetry. Implementations must be callable from a
/// background task and must not retry internally.
#[async_trait]
pub trait BatteryReader: Send + Sync {
    async fn fetch(&self) -> Result<BatterySnapshot, ReaderUnavailable>;
}

/// In-memory reader for previews and tests.
///
/// Scripted responses are consumed in order; once the script is exhausted
/// every fetch returns the fallback snapshot (re-stamped with the current
/// time), or `ReaderUnavailable` if there is none.
pub struct StaticReader {
    script: Mutex<VecDeque<Result<BatterySnapshot, ReaderUnavailable>>>,
    fallback: Mutex<Option<BatterySnapshot>>,
}

impl StaticReader {
    pub fn new(snapshot: BatterySnapshot) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Some(snapshot)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
        }
    }

    pub fn push(&self, response: Result<BatterySnapshot, ReaderUnavailable>) {
        let mut guard = match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push_back(response);
    }

    pub fn set_fallback(&self, snapshot: Option<BatterySnapshot>) {
        let mut guard = match self.fallback.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = snapshot;
    }
}

#[async_trait]
impl BatteryReader for StaticReader {
    async fn fetch(&self) -> Result<BatterySnapshot, ReaderUnavailable> {
        let scripted = {
            let mut guard = match self.script.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.pop_front()
        };
        if let Some(response) = scripted {
            return response;
        }

        let guard = match self.fallback.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_ref() {
            Some(snapshot) => Ok(BatterySnapshot {
                captured_at: Utc::now(),
                ..snapshot.clone()
            }),
            None => Err(ReaderUnavailable::new("no battery snapshot configured")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::ChargeStatus;

    #[tokio::test]
    async fn scripted_responses_come_before_fallback() {
        let reader = StaticReader::new(BatterySnapshot {
            level: 80,
            ..BatterySnapshot::default()
        });
        reader.push(Err(ReaderUnavailable::new("sensor busy")));
        reader.push(Ok(BatterySnapshot {
            level: 42,
            status: ChargeStatus::Charging,
            ..BatterySnapshot::default()
        }));

        assert!(reader.fetch().await.is_err());
        assert_eq!(reader.fetch().await.expect("scripted snapshot").level, 42);
        assert_eq!(reader.fetch().await.expect("fallback snapshot").level, 80);
    }

    #[tokio::test]
    async fn unavailable_reader_always_fails() {
        let reader = StaticReader::unavailable();
        let err = reader.fetch().await.expect_err("reader has no snapshot");
        assert!(err.reason.contains("no battery snapshot"));
    }
}
