use serde::Serialize;
use tokio::sync::broadcast;

use crate::refresh::Trigger;

const EVENT_BUFFER: usize = 64;

/// Notifications for whatever shell hosts the widget (toasts, snackbars, logs).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum AppEvent {
    AlarmScheduled { interval_ms: i64 },
    AlarmCancelled,
    AlarmTransitionFailed { reason: String },
    RefreshCompleted { trigger: Trigger, update_count: i64 },
    RefreshFailed { trigger: Trigger, reason: String },
    ManualRefreshConfirmed,
}

impl AppEvent {
    /// Short user-facing text, if this event is announced at all.
    /// Failed snapshot fetches have no toast.
    pub fn toast_message(&self) -> Option<&'static str> {
        match self {
            AppEvent::AlarmScheduled { .. } => Some("Alarm has scheduled."),
            AppEvent::AlarmCancelled => Some("Alarm has cancelled."),
            AppEvent::AlarmTransitionFailed { .. } => Some("Alarm could not be changed."),
            AppEvent::ManualRefreshConfirmed => Some("Data has updated manually."),
            AppEvent::RefreshCompleted { .. } | AppEvent::RefreshFailed { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AppEvent) {
        // No listeners is normal while the app screen is closed.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
