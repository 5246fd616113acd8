use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChargeStatus {
    Charging,
    Full,
    Discharging,
    NotCharging,
    Unknown,
}

impl Default for ChargeStatus {
    fn default() -> Self {
        ChargeStatus::Unknown
    }
}

impl ChargeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ChargeStatus::Charging => "Charging",
            ChargeStatus::Full => "Full",
            ChargeStatus::Discharging => "Discharging",
            ChargeStatus::NotCharging => "Not Charging",
            ChargeStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PluggedSource {
    Ac,
    Usb,
    Wireless,
    Dock,
    None,
    Unknown,
}

impl Default for PluggedSource {
    fn default() -> Self {
        PluggedSource::Unknown
    }
}

impl PluggedSource {
    pub fn label(&self) -> &'static str {
        match self {
            PluggedSource::Ac => "AC",
            PluggedSource::Usb => "USB",
            PluggedSource::Wireless => "Wireless",
            PluggedSource::Dock => "Dock",
            PluggedSource::None => "Not Plugged",
            PluggedSource::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BatteryHealth {
    Cold,
    Dead,
    Good,
    Overheat,
    OverVoltage,
    UnspecifiedFailure,
    Unknown,
}

impl Default for BatteryHealth {
    fn default() -> Self {
        BatteryHealth::Unknown
    }
}

impl BatteryHealth {
    pub fn label(&self) -> &'static str {
        match self {
            BatteryHealth::Cold => "COLD",
            BatteryHealth::Dead => "DEAD",
            BatteryHealth::Good => "GOOD",
            BatteryHealth::Overheat => "OVERHEAT",
            BatteryHealth::OverVoltage => "OVER_VOLTAGE",
            BatteryHealth::UnspecifiedFailure => "UNSPECIFIED_FAILURE",
            BatteryHealth::Unknown => "UNKNOWN",
        }
    }
}

/// One immutable reading of battery telemetry.
///
/// Current values are signed microamps: positive while charging, negative
/// while discharging. Optional fields are absent when the platform does not
/// report them (cycle count only exists on newer platforms).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatterySnapshot {
    pub level: u8,
    pub instant_current_microamps: i32,
    pub average_current_microamps: i32,
    pub status: ChargeStatus,
    pub plugged_source: PluggedSource,
    pub technology: String,
    pub voltage_millivolts: Option<f32>,
    pub temperature_tenths_celsius: Option<f32>,
    pub cycle_count: Option<i32>,
    pub health: BatteryHealth,
    pub remaining_charge_time_minutes: i64,
    pub captured_at: DateTime<Utc>,
}

impl Default for BatterySnapshot {
    fn default() -> Self {
        Self {
            level: 0,
            instant_current_microamps: 0,
            average_current_microamps: 0,
            status: ChargeStatus::Unknown,
            plugged_source: PluggedSource::Unknown,
            technology: "Unknown".into(),
            voltage_millivolts: None,
            temperature_tenths_celsius: None,
            cycle_count: None,
            health: BatteryHealth::Unknown,
            remaining_charge_time_minutes: 0,
            captured_at: DateTime::<Utc>::default(),
        }
    }
}

impl BatterySnapshot {
    pub fn voltage_volts(&self) -> Option<f32> {
        self.voltage_millivolts.map(|mv| mv / 1000.0)
    }

    pub fn temperature_celsius(&self) -> Option<f32> {
        self.temperature_tenths_celsius.map(|t| t / 10.0)
    }
}
