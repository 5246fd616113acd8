use tokio::{sync::watch, task::JoinHandle};

use crate::{
    battery::BatterySnapshot,
    settings::{SettingsStore, SettingsView},
};

const ENABLE_LOGS: bool = false;
const LOG_TARGET: &str = "battery_widget::view";

use crate::log_debug;

/// A live render model. Recomputed whenever the snapshot source or any
/// setting changes; stays `None` until a first snapshot exists.
///
/// Dropping the projection stops the background task.
pub struct Projection<M> {
    rx: watch::Receiver<Option<M>>,
    task: JoinHandle<()>,
}

impl<M: Clone> Projection<M> {
    pub fn latest(&self) -> Option<M> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<M>> {
        self.rx.clone()
    }

    /// Waits for the next model that differs from the last one seen.
    pub async fn changed(&mut self) -> Option<M> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }

    /// Waits until the current model satisfies `predicate`.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&M) -> bool) -> Option<M> {
        let model = self
            .rx
            .wait_for(|model| model.as_ref().is_some_and(&mut predicate))
            .await
            .ok()?;
        model.clone()
    }
}

impl<M> Drop for Projection<M> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn spawn_projection<M>(
    settings: &SettingsStore,
    mut snapshots: watch::Receiver<Option<BatterySnapshot>>,
    project: fn(&BatterySnapshot, &SettingsView) -> M,
) -> Projection<M>
where
    M: Clone + PartialEq + Send + Sync + 'static,
{
    let (tx, rx) = watch::channel(None);
    let mut views = settings.watch_view();

    let task = tokio::spawn(async move {
        let Some(mut view) = views.next().await else {
            return;
        };
        let mut snapshot = snapshots.borrow_and_update().clone();

        loop {
            if let Some(snapshot) = &snapshot {
                let model = project(snapshot, &view);
                tx.send_if_modified(|current| {
                    if current.as_ref() == Some(&model) {
                        return false;
                    }
                    *current = Some(model);
                    true
                });
            }

            tokio::select! {
                next = views.next() => match next {
                    Some(next) => view = next,
                    None => break,
                },
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    snapshot = snapshots.borrow_and_update().clone();
                }
            }
        }
        log_debug!("projection source closed");
    });

    Projection { rx, task }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        battery::ChargeStatus,
        settings::MemoryBackend,
        view::{project_app_screen, WidgetHost, WidgetLayout},
    };

    async fn store() -> SettingsStore {
        SettingsStore::open(Arc::new(MemoryBackend::new()))
            .await
            .expect("open store")
    }

    fn discharging() -> BatterySnapshot {
        BatterySnapshot {
            level: 55,
            status: ChargeStatus::Discharging,
            ..BatterySnapshot::default()
        }
    }

    #[tokio::test]
    async fn nothing_renders_before_first_snapshot() {
        let settings = store().await;
        let host = WidgetHost::new();
        let widget = host.spawn_instance(&settings);

        tokio::task::yield_now().await;
        assert!(widget.latest().is_none());
    }

    #[tokio::test]
    async fn widget_follows_snapshots_and_settings() {
        let settings = store().await;
        let host = WidgetHost::new();
        let mut widget = host.spawn_instance(&settings);

        host.update_all(discharging());
        let model = widget.wait_for(|m| m.is_simple()).await.expect("first render");
        assert!(model.toggle.is_running);

        settings.invert_simple_widget_ui().await.expect("switch layout");
        let model = widget.wait_for(|m| !m.is_simple()).await.expect("re-render");
        let WidgetLayout::Full(full) = model.layout else {
            panic!("simple layout was turned off");
        };
        assert_eq!(full.level, 55);

        settings.increment_update_count().await.expect("count");
        let model = widget
            .wait_for(|m| matches!(&m.layout, WidgetLayout::Full(f) if f.update_count == Some(1)))
            .await;
        assert!(model.is_some());
    }

    #[tokio::test]
    async fn every_instance_sees_the_same_model() {
        let settings = store().await;
        let host = WidgetHost::new();
        let mut first = host.spawn_instance(&settings);
        let mut second = host.spawn_instance(&settings);

        host.update_all(discharging());
        let a = first.wait_for(|_| true).await.expect("first instance");
        let b = second.wait_for(|_| true).await.expect("second instance");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn app_screen_tracks_current_unit() {
        let settings = store().await;
        let (tx, rx) = watch::channel(Some(BatterySnapshot {
            instant_current_microamps: 250_000,
            ..discharging()
        }));
        let mut screen = spawn_projection(&settings, rx, project_app_screen);

        let model = screen
            .wait_for(|m| m.value("Instant Current") == Some("250 mA"))
            .await;
        assert!(model.is_some());

        settings.set_current_in_milliamps(false).await.expect("unit");
        let model = screen
            .wait_for(|m| m.value("Instant Current") == Some("250000 μA"))
            .await;
        assert!(model.is_some());
        drop(tx);
    }
}
