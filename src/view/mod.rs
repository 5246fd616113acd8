pub mod app_screen;
pub mod projection;
pub mod widget;

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

pub use app_screen::{project_app_screen, AppScreenModel, InfoRow};
pub use projection::{spawn_projection, Projection};
pub use widget::{
    project_widget, FullWidget, SimpleWidget, ToggleControl, WidgetHost, WidgetLayout,
    WidgetRenderModel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CurrentUnit {
    Milliamps,
    Microamps,
}

impl CurrentUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            CurrentUnit::Milliamps => "mA",
            CurrentUnit::Microamps => "μA",
        }
    }
}

/// A current value already scaled to the unit the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentReading {
    pub value: i64,
    pub unit: CurrentUnit,
}

impl fmt::Display for CurrentReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.symbol())
    }
}

/// Milliamps truncate toward zero, so -1999 μA reads as -1 mA.
pub fn scale_current(microamps: i32, in_milliamps: bool) -> CurrentReading {
    if in_milliamps {
        CurrentReading {
            value: i64::from(microamps) / 1000,
            unit: CurrentUnit::Milliamps,
        }
    } else {
        CurrentReading {
            value: i64::from(microamps),
            unit: CurrentUnit::Microamps,
        }
    }
}

pub(crate) fn clock_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}
