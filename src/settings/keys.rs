use serde::{de::DeserializeOwned, Serialize};

/// Values a setting can hold. Everything is stored as JSON text.
pub trait SettingValue:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> SettingValue for T where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// A typed key with the default returned while nothing has been written.
#[derive(Debug, Clone, Copy)]
pub struct Setting<T> {
    name: &'static str,
    default: T,
}

impl<T> Setting<T> {
    pub const fn new(name: &'static str, default: T) -> Self {
        Self { name, default }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: Clone> Setting<T> {
    pub fn default_value(&self) -> T {
        self.default.clone()
    }
}

pub const DEFAULT_ALARM_INTERVAL_MS: i64 = 60_000;

// Key names match what earlier installs already wrote to disk.
pub const ALARM_INTERVAL_MS: Setting<i64> = Setting::new("alarmInterval", DEFAULT_ALARM_INTERVAL_MS);
pub const IS_ALARM_RUNNING: Setting<bool> = Setting::new("isAlarmRunning", true);
pub const UPDATE_COUNT: Setting<i64> = Setting::new("updateTimes", 0);
pub const IS_UPDATE_COUNT_VISIBLE: Setting<bool> = Setting::new("isUpdateTimesManifest", true);
pub const IS_SIMPLE_WIDGET_UI: Setting<bool> = Setting::new("isWidgetUIManifest", true);
pub const IS_CURRENT_IN_MILLIAMPS: Setting<bool> = Setting::new("isMilliAmpere", true);
