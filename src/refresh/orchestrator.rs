use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};
use uuid::Uuid;

use crate::{
    alarm::{AlarmScheduler, AlarmState},
    battery::{BatteryReader, BatterySnapshot},
    error::{RefreshError, ToggleError},
    events::{AppEvent, EventBus},
    settings::SettingsStore,
    view::WidgetHost,
};

use super::Trigger;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "battery_widget::refresh";

use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub run_id: Uuid,
    pub trigger: Trigger,
    pub update_count: i64,
    pub captured_at: DateTime<Utc>,
}

struct OrchestratorInner {
    reader: Arc<dyn BatteryReader>,
    settings: SettingsStore,
    latest: watch::Sender<Option<BatterySnapshot>>,
    widgets: WidgetHost,
    scheduler: AlarmScheduler,
    events: EventBus,
}

/// Runs one refresh per trigger: fetch a snapshot, publish it, bump the
/// update counter, then push the snapshot to every widget instance.
///
/// Each refresh runs in its own spawned task so it outlives whatever UI
/// scope asked for it. Concurrent refreshes are allowed; the latest-snapshot
/// holder is last-write-wins and the counter increment is atomic.
#[derive(Clone)]
pub struct RefreshOrchestrator {
    inner: Arc<OrchestratorInner>,
}

impl RefreshOrchestrator {
    pub fn new(
        reader: Arc<dyn BatteryReader>,
        settings: SettingsStore,
        widgets: WidgetHost,
        scheduler: AlarmScheduler,
        events: EventBus,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            inner: Arc::new(OrchestratorInner {
                reader,
                settings,
                latest,
                widgets,
                scheduler,
                events,
            }),
        }
    }

    /// The app screen's snapshot source. Empty until the first successful
    /// fetch of this process.
    pub fn latest_snapshot(&self) -> watch::Receiver<Option<BatterySnapshot>> {
        self.inner.latest.subscribe()
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    pub fn widgets(&self) -> &WidgetHost {
        &self.inner.widgets
    }

    pub fn refresh(&self, trigger: Trigger) -> JoinHandle<Result<RefreshReport, RefreshError>> {
        let this = self.clone();
        tokio::spawn(async move { this.run_refresh(trigger).await })
    }

    /// Widget refresh button.
    pub fn on_refresh_tapped(&self) -> JoinHandle<Result<RefreshReport, RefreshError>> {
        let this = self.clone();
        tokio::spawn(async move {
            let report = this.run_refresh(Trigger::Manual).await?;
            this.inner.events.emit(AppEvent::ManualRefreshConfirmed);
            Ok(report)
        })
    }

    /// Widget start/stop button, carrying the values the widget rendered.
    /// The widget is refreshed afterwards whether or not the transition
    /// went through, so the button re-renders from the stored flag.
    pub fn on_toggle_tapped(
        &self,
        is_running: bool,
        interval_ms: i64,
    ) -> JoinHandle<Result<AlarmState, ToggleError>> {
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.inner.scheduler.toggle(is_running, interval_ms).await;
            // Fetch failures are already logged and announced by the refresh.
            let _ = this.run_refresh(Trigger::Toggle).await;
            outcome
        })
    }

    async fn run_refresh(&self, trigger: Trigger) -> Result<RefreshReport, RefreshError> {
        let run_id = Uuid::new_v4();
        let inner = &self.inner;
        log_debug!("refresh {} started ({:?})", run_id, trigger);

        let snapshot = match inner.reader.fetch().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log_warn!("refresh {} aborted: {}", run_id, err);
                inner.events.emit(AppEvent::RefreshFailed {
                    trigger,
                    reason: err.to_string(),
                });
                return Err(err.into());
            }
        };
        inner.latest.send_replace(Some(snapshot.clone()));

        let update_count = match inner.settings.increment_update_count().await {
            Ok(count) => count,
            Err(err) => {
                log_error!("refresh {} could not save the update count: {}", run_id, err);
                inner.events.emit(AppEvent::RefreshFailed {
                    trigger,
                    reason: err.to_string(),
                });
                return Err(err.into());
            }
        };

        let captured_at = snapshot.captured_at;
        inner.widgets.update_all(snapshot);

        log_info!(
            "refresh {} done ({:?}): update #{}",
            run_id,
            trigger,
            update_count
        );
        inner.events.emit(AppEvent::RefreshCompleted {
            trigger,
            update_count,
        });

        Ok(RefreshReport {
            run_id,
            trigger,
            update_count,
            captured_at,
        })
    }
}
