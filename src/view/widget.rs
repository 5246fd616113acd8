use serde::Serialize;
use tokio::sync::watch;

use crate::{
    battery::{BatterySnapshot, ChargeStatus},
    settings::{SettingsStore, SettingsView},
};

use super::{clock_time, projection::spawn_projection, scale_current, CurrentReading, Projection};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleWidget {
    pub level: u8,
    pub status_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullWidget {
    pub level: u8,
    pub remaining_charge_time_minutes: i64,
    pub current: CurrentReading,
    pub status_label: &'static str,
    /// Hidden when the user turned the counter off.
    pub update_count: Option<i64>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "camelCase")]
pub enum WidgetLayout {
    Simple(SimpleWidget),
    Full(FullWidget),
}

/// The toggle button carries the state it was rendered with; tapping it
/// hands exactly these values to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleControl {
    pub is_running: bool,
    pub interval_ms: i64,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRenderModel {
    pub layout: WidgetLayout,
    pub toggle: ToggleControl,
}

impl WidgetRenderModel {
    pub fn is_simple(&self) -> bool {
        matches!(self.layout, WidgetLayout::Simple(_))
    }
}

pub fn project_widget(snapshot: &BatterySnapshot, settings: &SettingsView) -> WidgetRenderModel {
    let layout = if settings.is_simple_widget_ui && snapshot.status == ChargeStatus::Discharging {
        WidgetLayout::Simple(SimpleWidget {
            level: snapshot.level,
            status_label: ChargeStatus::NotCharging.label(),
        })
    } else {
        WidgetLayout::Full(FullWidget {
            level: snapshot.level,
            remaining_charge_time_minutes: snapshot.remaining_charge_time_minutes,
            current: scale_current(
                snapshot.instant_current_microamps,
                settings.is_current_in_milliamps,
            ),
            status_label: snapshot.status.label(),
            update_count: settings
                .is_update_count_visible
                .then_some(settings.update_count),
            last_updated: clock_time(snapshot.captured_at),
        })
    };

    WidgetRenderModel {
        layout,
        toggle: ToggleControl {
            is_running: settings.is_alarm_running,
            interval_ms: settings.alarm_interval_ms,
            label: if settings.is_alarm_running { "Stop" } else { "Start" },
        },
    }
}

/// Platform side of the widget: pushing a snapshot here is the
/// "update all widget instances" call.
#[derive(Clone)]
pub struct WidgetHost {
    tx: watch::Sender<Option<BatterySnapshot>>,
}

impl WidgetHost {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn update_all(&self, snapshot: BatterySnapshot) {
        self.tx.send_replace(Some(snapshot));
    }

    pub fn last_rendered(&self) -> Option<BatterySnapshot> {
        self.tx.borrow().clone()
    }

    pub fn snapshots(&self) -> watch::Receiver<Option<BatterySnapshot>> {
        self.tx.subscribe()
    }

    /// A new widget instance rendering from this host and `settings`.
    pub fn spawn_instance(&self, settings: &SettingsStore) -> Projection<WidgetRenderModel> {
        spawn_projection(settings, self.snapshots(), project_widget)
    }
}

impl Default for WidgetHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::CurrentUnit;

    fn snapshot(status: ChargeStatus) -> BatterySnapshot {
        BatterySnapshot {
            level: 81,
            instant_current_microamps: 1_020_000,
            status,
            remaining_charge_time_minutes: 30,
            ..BatterySnapshot::default()
        }
    }

    #[test]
    fn simple_layout_only_when_enabled_and_discharging() {
        let settings = SettingsView::default();

        let model = project_widget(&snapshot(ChargeStatus::Discharging), &settings);
        assert_eq!(
            model.layout,
            WidgetLayout::Simple(SimpleWidget {
                level: 81,
                status_label: "Not Charging",
            })
        );

        for status in [ChargeStatus::Charging, ChargeStatus::Full, ChargeStatus::NotCharging] {
            assert!(!project_widget(&snapshot(status), &settings).is_simple());
        }
    }

    #[test]
    fn charging_is_always_full_layout() {
        for simple in [true, false] {
            let settings = SettingsView {
                is_simple_widget_ui: simple,
                ..SettingsView::default()
            };
            assert!(!project_widget(&snapshot(ChargeStatus::Charging), &settings).is_simple());
        }

        let settings = SettingsView {
            is_simple_widget_ui: false,
            ..SettingsView::default()
        };
        assert!(!project_widget(&snapshot(ChargeStatus::Discharging), &settings).is_simple());
    }

    #[test]
    fn full_layout_respects_counter_and_unit_toggles() {
        let settings = SettingsView {
            update_count: 12,
            is_update_count_visible: false,
            is_current_in_milliamps: false,
            ..SettingsView::default()
        };
        let model = project_widget(&snapshot(ChargeStatus::Charging), &settings);

        let WidgetLayout::Full(full) = model.layout else {
            panic!("charging renders the full layout");
        };
        assert_eq!(full.update_count, None);
        assert_eq!(full.current.unit, CurrentUnit::Microamps);
        assert_eq!(full.current.value, 1_020_000);
        assert_eq!(full.remaining_charge_time_minutes, 30);
        assert_eq!(full.status_label, "Charging");

        let visible = SettingsView {
            update_count: 12,
            ..SettingsView::default()
        };
        let WidgetLayout::Full(full) = project_widget(&snapshot(ChargeStatus::Full), &visible).layout
        else {
            panic!("full battery renders the full layout");
        };
        assert_eq!(full.update_count, Some(12));
        assert_eq!(full.current.to_string(), "1020 mA");
    }

    #[test]
    fn toggle_control_captures_running_state_and_interval() {
        let settings = SettingsView {
            is_alarm_running: false,
            alarm_interval_ms: 90_000,
            ..SettingsView::default()
        };
        let model = project_widget(&snapshot(ChargeStatus::Discharging), &settings);
        assert_eq!(
            model.toggle,
            ToggleControl {
                is_running: false,
                interval_ms: 90_000,
                label: "Start",
            }
        );
    }

    #[test]
    fn projection_is_deterministic() {
        let settings = SettingsView::default();
        let snap = snapshot(ChargeStatus::Charging);
        assert_eq!(project_widget(&snap, &settings), project_widget(&snap, &settings));
    }
}
