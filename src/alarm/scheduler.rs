use std::{sync::Arc, time::Duration};

use crate::{
    error::{SchedulerError, ToggleError},
    events::{AppEvent, EventBus},
    settings::{SettingsStore, ALARM_INTERVAL_MS, IS_ALARM_RUNNING},
};

use super::{trigger::PeriodicTrigger, AlarmState};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "battery_widget::alarm";

use crate::{log_error, log_info, log_warn};

/// The one request code this app ever registers.
pub const ALARM_REQUEST_CODE: i32 = 0;
pub const ALARM_INITIAL_DELAY: Duration = Duration::from_secs(30);

/// Owns the running/stopped state machine and is the only component that
/// talks to the trigger service.
///
/// The persisted `isAlarmRunning` flag is the record of whether a trigger is
/// registered; the trigger service cannot be queried for it.
#[derive(Clone)]
pub struct AlarmScheduler {
    trigger: Arc<dyn PeriodicTrigger>,
    settings: SettingsStore,
    events: EventBus,
}

impl AlarmScheduler {
    pub fn new(trigger: Arc<dyn PeriodicTrigger>, settings: SettingsStore, events: EventBus) -> Self {
        Self {
            trigger,
            settings,
            events,
        }
    }

    pub fn state(&self) -> AlarmState {
        AlarmState::from_flag(self.settings.current(&IS_ALARM_RUNNING))
    }

    /// Widget toggle. `captured_is_running` and `captured_interval_ms` are the
    /// values the widget rendered when tapped; they decide the transition and
    /// the store is not re-read.
    ///
    /// The flag is inverted rather than overwritten, so two taps carrying the
    /// same stale capture net out on the flag while the trigger calls stay
    /// idempotent.
    pub async fn toggle(
        &self,
        captured_is_running: bool,
        captured_interval_ms: i64,
    ) -> Result<AlarmState, ToggleError> {
        let from = AlarmState::from_flag(captured_is_running);

        let transition = match from {
            AlarmState::Running => self.cancel().await,
            AlarmState::Stopped => self.register(captured_interval_ms).await,
        };
        if let Err(err) = transition {
            log_warn!("alarm toggle from {:?} refused: {}", from, err);
            self.events.emit(AppEvent::AlarmTransitionFailed {
                reason: err.to_string(),
            });
            return Err(err.into());
        }

        let is_running = match self.settings.invert_alarm_running().await {
            Ok(is_running) => is_running,
            Err(err) => {
                log_error!(
                    "trigger moved to {:?} but the running flag could not be saved: {}",
                    from.toggled(),
                    err
                );
                return Err(err.into());
            }
        };

        match from.toggled() {
            AlarmState::Running => self.events.emit(AppEvent::AlarmScheduled {
                interval_ms: captured_interval_ms,
            }),
            AlarmState::Stopped => self.events.emit(AppEvent::AlarmCancelled),
        }

        Ok(AlarmState::from_flag(is_running))
    }

    /// Re-registers the trigger at startup when the flag says it should be
    /// running. Registrations do not survive a restart or reboot, so the flag
    /// alone would otherwise drift from reality.
    pub async fn reconcile_on_boot(&self) -> Result<AlarmState, SchedulerError> {
        let state = self.state();
        if state.is_running() {
            let interval_ms = self.settings.current(&ALARM_INTERVAL_MS);
            self.register(interval_ms).await?;
            log_info!("restored alarm after startup ({}ms)", interval_ms);
        }
        Ok(state)
    }

    async fn register(&self, interval_ms: i64) -> Result<(), SchedulerError> {
        if interval_ms <= 0 {
            return Err(SchedulerError::InvalidInterval(interval_ms));
        }
        self.trigger
            .register(
                ALARM_REQUEST_CODE,
                ALARM_INITIAL_DELAY,
                Duration::from_millis(interval_ms as u64),
            )
            .await?;
        log_info!("alarm scheduled every {}ms", interval_ms);
        Ok(())
    }

    async fn cancel(&self) -> Result<(), SchedulerError> {
        self.trigger.cancel(ALARM_REQUEST_CODE).await?;
        log_info!("alarm cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alarm::trigger::{RecordingTrigger, Registration, TriggerCall},
        settings::MemoryBackend,
    };

    async fn scheduler() -> (AlarmScheduler, Arc<RecordingTrigger>, SettingsStore, EventBus) {
        let settings = SettingsStore::open(Arc::new(MemoryBackend::new()))
            .await
            .expect("open store");
        let trigger = Arc::new(RecordingTrigger::new());
        let events = EventBus::new();
        let scheduler = AlarmScheduler::new(trigger.clone(), settings.clone(), events.clone());
        (scheduler, trigger, settings, events)
    }

    fn registration(interval_ms: u64) -> Registration {
        Registration {
            request_code: ALARM_REQUEST_CODE,
            initial_delay: Duration::from_secs(30),
            interval: Duration::from_millis(interval_ms),
        }
    }

    #[tokio::test]
    async fn toggle_from_running_cancels_and_clears_flag() {
        let (scheduler, trigger, settings, events) = scheduler().await;
        let mut notices = events.subscribe();

        let state = scheduler.toggle(true, 60_000).await.expect("toggle");

        assert_eq!(state, AlarmState::Stopped);
        assert!(!settings.current(&IS_ALARM_RUNNING));
        assert_eq!(trigger.calls(), vec![TriggerCall::Cancel(ALARM_REQUEST_CODE)]);
        assert_eq!(notices.recv().await.expect("notice"), AppEvent::AlarmCancelled);
    }

    #[tokio::test]
    async fn toggle_from_stopped_registers_with_captured_interval() {
        let (scheduler, trigger, settings, events) = scheduler().await;
        settings.set(&IS_ALARM_RUNNING, false).await.expect("seed");
        let mut notices = events.subscribe();

        let state = scheduler.toggle(false, 60_000).await.expect("toggle");

        assert_eq!(state, AlarmState::Running);
        assert!(settings.current(&IS_ALARM_RUNNING));
        assert_eq!(trigger.active(ALARM_REQUEST_CODE), Some(registration(60_000)));
        assert_eq!(
            notices.recv().await.expect("notice"),
            AppEvent::AlarmScheduled { interval_ms: 60_000 }
        );
    }

    #[tokio::test]
    async fn repeated_cycles_converge_to_cancelled() {
        let (scheduler, trigger, settings, _) = scheduler().await;
        settings.set(&IS_ALARM_RUNNING, false).await.expect("seed");

        for _ in 0..5 {
            scheduler.toggle(false, 60_000).await.expect("start");
            assert!(trigger.active(ALARM_REQUEST_CODE).is_some());
            scheduler.toggle(true, 60_000).await.expect("stop");
        }

        assert!(trigger.active(ALARM_REQUEST_CODE).is_none());
        assert!(!settings.current(&IS_ALARM_RUNNING));
    }

    #[tokio::test]
    async fn stale_double_tap_nets_flag_back_to_original() {
        let (scheduler, trigger, settings, _) = scheduler().await;

        // Both taps captured "running" before either was processed.
        scheduler.toggle(true, 60_000).await.expect("first tap");
        scheduler.toggle(true, 60_000).await.expect("second tap");

        assert!(settings.current(&IS_ALARM_RUNNING));
        assert!(trigger.active(ALARM_REQUEST_CODE).is_none());
        assert_eq!(
            trigger.calls(),
            vec![
                TriggerCall::Cancel(ALARM_REQUEST_CODE),
                TriggerCall::Cancel(ALARM_REQUEST_CODE)
            ]
        );
    }

    #[tokio::test]
    async fn interval_change_while_running_waits_for_next_start() {
        let (scheduler, trigger, settings, _) = scheduler().await;
        settings.set(&IS_ALARM_RUNNING, false).await.expect("seed");
        scheduler.toggle(false, 60_000).await.expect("start");

        settings.save_alarm_interval(90_000).await.expect("save interval");
        assert_eq!(trigger.active(ALARM_REQUEST_CODE), Some(registration(60_000)));

        scheduler.toggle(true, 90_000).await.expect("stop");
        scheduler
            .toggle(false, settings.current(&ALARM_INTERVAL_MS))
            .await
            .expect("restart");
        assert_eq!(trigger.active(ALARM_REQUEST_CODE), Some(registration(90_000)));
    }

    #[tokio::test]
    async fn refused_registration_leaves_flag_untouched() {
        let (scheduler, trigger, settings, events) = scheduler().await;
        settings.set(&IS_ALARM_RUNNING, false).await.expect("seed");
        trigger.refuse_calls(true);
        let mut notices = events.subscribe();

        let err = scheduler
            .toggle(false, 60_000)
            .await
            .expect_err("service refused");

        assert!(matches!(err, ToggleError::Scheduler(SchedulerError::Register { .. })));
        assert!(!settings.current(&IS_ALARM_RUNNING));
        assert!(matches!(
            notices.recv().await.expect("notice"),
            AppEvent::AlarmTransitionFailed { .. }
        ));
    }

    #[tokio::test]
    async fn non_positive_interval_is_rejected_before_registering() {
        let (scheduler, trigger, settings, _) = scheduler().await;
        settings.set(&IS_ALARM_RUNNING, false).await.expect("seed");

        let err = scheduler.toggle(false, 0).await.expect_err("bad interval");
        assert!(matches!(
            err,
            ToggleError::Scheduler(SchedulerError::InvalidInterval(0))
        ));
        assert!(trigger.calls().is_empty());
    }

    #[tokio::test]
    async fn boot_reconciliation_restores_running_alarm() {
        let (scheduler, trigger, settings, _) = scheduler().await;
        settings.save_alarm_interval(120_000).await.expect("seed");

        let state = scheduler.reconcile_on_boot().await.expect("reconcile");

        assert_eq!(state, AlarmState::Running);
        assert_eq!(trigger.active(ALARM_REQUEST_CODE), Some(registration(120_000)));
    }

    #[tokio::test]
    async fn boot_reconciliation_leaves_stopped_alarm_alone() {
        let (scheduler, trigger, settings, _) = scheduler().await;
        settings.set(&IS_ALARM_RUNNING, false).await.expect("seed");

        assert_eq!(
            scheduler.reconcile_on_boot().await.expect("reconcile"),
            AlarmState::Stopped
        );
        assert!(trigger.calls().is_empty());
    }
}
