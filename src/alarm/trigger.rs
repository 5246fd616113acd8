use std::{
    collections::HashMap,
    sync::Mutex as StdMutex,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::error::SchedulerError;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "battery_widget::alarm";

use crate::{log_debug, log_info};

/// What a registration asked the trigger service for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub request_code: i32,
    pub initial_delay: Duration,
    pub interval: Duration,
}

/// Periodic trigger service (an OS alarm manager or an in-process stand-in).
///
/// Both calls are best-effort and idempotent: registering an already
/// registered code replaces it, cancelling an absent code is a no-op.
#[async_trait]
pub trait PeriodicTrigger: Send + Sync {
    async fn register(
        &self,
        request_code: i32,
        initial_delay: Duration,
        interval: Duration,
    ) -> Result<(), SchedulerError>;

    async fn cancel(&self, request_code: i32) -> Result<(), SchedulerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmFired {
    pub request_code: i32,
    pub fired_at: DateTime<Utc>,
}

struct ActiveTimer {
    registration: Registration,
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// In-process trigger backed by tokio timers. Firings are delivered on the
/// channel returned from [`TokioTrigger::new`]; registrations die with the
/// process.
pub struct TokioTrigger {
    timers: Mutex<HashMap<i32, ActiveTimer>>,
    fire_tx: mpsc::UnboundedSender<AlarmFired>,
}

impl TokioTrigger {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlarmFired>) {
        let (fire_tx, fire_rx) = mpsc::unbounded_channel();
        (
            Self {
                timers: Mutex::new(HashMap::new()),
                fire_tx,
            },
            fire_rx,
        )
    }

    pub async fn registration(&self, request_code: i32) -> Option<Registration> {
        self.timers
            .lock()
            .await
            .get(&request_code)
            .map(|timer| timer.registration)
    }
}

#[async_trait]
impl PeriodicTrigger for TokioTrigger {
    async fn register(
        &self,
        request_code: i32,
        initial_delay: Duration,
        interval: Duration,
    ) -> Result<(), SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::Register {
                request_code,
                reason: "interval must be non-zero".into(),
            });
        }

        let mut timers = self.timers.lock().await;
        if let Some(previous) = timers.remove(&request_code) {
            previous.cancel_token.cancel();
            previous.handle.abort();
            log_debug!("replacing trigger {}", request_code);
        }

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let fire_tx = self.fire_tx.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(initial_delay) => {}
                _ = token.cancelled() => return,
            }

            let mut ticker = time::interval_at(Instant::now(), interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let fired = AlarmFired { request_code, fired_at: Utc::now() };
                        if fire_tx.send(fired).is_err() {
                            break;
                        }
                    }
                    _ = token.cancelled() => break,
                }
            }
        });

        timers.insert(
            request_code,
            ActiveTimer {
                registration: Registration {
                    request_code,
                    initial_delay,
                    interval,
                },
                cancel_token,
                handle,
            },
        );
        log_info!(
            "trigger {} registered: first fire in {:?}, then every {:?}",
            request_code,
            initial_delay,
            interval
        );
        Ok(())
    }

    async fn cancel(&self, request_code: i32) -> Result<(), SchedulerError> {
        if let Some(timer) = self.timers.lock().await.remove(&request_code) {
            timer.cancel_token.cancel();
            timer.handle.abort();
            log_info!("trigger {} cancelled", request_code);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCall {
    Register(Registration),
    Cancel(i32),
}

/// Trigger that only records calls. Used by tests and by hosts that drive
/// firings themselves.
#[derive(Default)]
pub struct RecordingTrigger {
    calls: StdMutex<Vec<TriggerCall>>,
    active: StdMutex<HashMap<i32, Registration>>,
    refuse: StdMutex<bool>,
}

impl RecordingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails as if the service refused it.
    pub fn refuse_calls(&self, refuse: bool) {
        *lock(&self.refuse) = refuse;
    }

    pub fn calls(&self) -> Vec<TriggerCall> {
        lock(&self.calls).clone()
    }

    pub fn active(&self, request_code: i32) -> Option<Registration> {
        lock(&self.active).get(&request_code).copied()
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[async_trait]
impl PeriodicTrigger for RecordingTrigger {
    async fn register(
        &self,
        request_code: i32,
        initial_delay: Duration,
        interval: Duration,
    ) -> Result<(), SchedulerError> {
        if *lock(&self.refuse) {
            return Err(SchedulerError::Register {
                request_code,
                reason: "refused".into(),
            });
        }
        let registration = Registration {
            request_code,
            initial_delay,
            interval,
        };
        lock(&self.calls).push(TriggerCall::Register(registration));
        lock(&self.active).insert(request_code, registration);
        Ok(())
    }

    async fn cancel(&self, request_code: i32) -> Result<(), SchedulerError> {
        if *lock(&self.refuse) {
            return Err(SchedulerError::Cancel {
                request_code,
                reason: "refused".into(),
            });
        }
        lock(&self.calls).push(TriggerCall::Cancel(request_code));
        lock(&self.active).remove(&request_code);
        Ok(())
    }
}
