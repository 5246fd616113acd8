pub mod backend;
pub mod interval;
pub mod keys;
pub mod store;

use serde::{Deserialize, Serialize};

pub use backend::{MemoryBackend, SettingsBackend};
pub use interval::{parse_interval_minutes, IntervalInputError, MIN_ALARM_INTERVAL_MS};
pub use keys::{
    Setting, SettingValue, ALARM_INTERVAL_MS, DEFAULT_ALARM_INTERVAL_MS, IS_ALARM_RUNNING,
    IS_CURRENT_IN_MILLIAMPS, IS_SIMPLE_WIDGET_UI, IS_UPDATE_COUNT_VISIBLE, UPDATE_COUNT,
};
pub use store::{SettingStream, SettingsStore, SettingsViewStream};

/// All settings at one point in time, as handed to view projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub alarm_interval_ms: i64,
    pub is_alarm_running: bool,
    pub update_count: i64,
    pub is_update_count_visible: bool,
    pub is_simple_widget_ui: bool,
    pub is_current_in_milliamps: bool,
}

impl Default for SettingsView {
    fn default() -> Self {
        Self {
            alarm_interval_ms: ALARM_INTERVAL_MS.default_value(),
            is_alarm_running: IS_ALARM_RUNNING.default_value(),
            update_count: UPDATE_COUNT.default_value(),
            is_update_count_visible: IS_UPDATE_COUNT_VISIBLE.default_value(),
            is_simple_widget_ui: IS_SIMPLE_WIDGET_UI.default_value(),
            is_current_in_milliamps: IS_CURRENT_IN_MILLIAMPS.default_value(),
        }
    }
}
