use serde::Serialize;

use crate::{battery::BatterySnapshot, settings::SettingsView};

use super::scale_current;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppScreenModel {
    pub rows: Vec<InfoRow>,
}

impl AppScreenModel {
    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.value.as_str())
    }
}

fn row(label: &'static str, value: impl Into<String>) -> InfoRow {
    InfoRow {
        label,
        value: value.into(),
    }
}

fn or_unknown<T: std::fmt::Display>(value: Option<T>, suffix: &str) -> String {
    match value {
        Some(value) => format!("{value}{suffix}"),
        None => "Unknown".to_string(),
    }
}

pub fn project_app_screen(snapshot: &BatterySnapshot, settings: &SettingsView) -> AppScreenModel {
    let milliamps = settings.is_current_in_milliamps;

    AppScreenModel {
        rows: vec![
            row("Status", snapshot.status.label()),
            row("Power Source", snapshot.plugged_source.label()),
            row("Remaining Battery", format!("{}%", snapshot.level)),
            row(
                "Remaining Time for Charging",
                format!("{} min", snapshot.remaining_charge_time_minutes),
            ),
            row(
                "Instant Current",
                scale_current(snapshot.instant_current_microamps, milliamps).to_string(),
            ),
            row(
                "Average Current",
                scale_current(snapshot.average_current_microamps, milliamps).to_string(),
            ),
            row("Technology", snapshot.technology.clone()),
            row("Voltage", or_unknown(snapshot.voltage_volts(), " V")),
            row("Temperature", or_unknown(snapshot.temperature_celsius(), " ℃")),
            row("Health", snapshot.health.label()),
            row("Cycle Count", or_unknown(snapshot.cycle_count, "")),
            row("Update Times", settings.update_count.to_string()),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::{BatteryHealth, ChargeStatus, PluggedSource};

    fn snapshot() -> BatterySnapshot {
        BatterySnapshot {
            level: 64,
            instant_current_microamps: -412_000,
            average_current_microamps: -398_500,
            status: ChargeStatus::Discharging,
            plugged_source: PluggedSource::None,
            technology: "Li-ion".into(),
            voltage_millivolts: Some(3_850.0),
            temperature_tenths_celsius: Some(287.0),
            cycle_count: None,
            health: BatteryHealth::Good,
            remaining_charge_time_minutes: 0,
            ..BatterySnapshot::default()
        }
    }

    #[test]
    fn rows_follow_fixed_order() {
        let model = project_app_screen(&snapshot(), &SettingsView::default());
        let labels: Vec<_> = model.rows.iter().map(|row| row.label).collect();
        assert_eq!(
            labels,
            vec![
                "Status",
                "Power Source",
                "Remaining Battery",
                "Remaining Time for Charging",
                "Instant Current",
                "Average Current",
                "Technology",
                "Voltage",
                "Temperature",
                "Health",
                "Cycle Count",
                "Update Times",
            ]
        );
    }

    #[test]
    fn formats_values_with_units() {
        let settings = SettingsView {
            update_count: 7,
            ..SettingsView::default()
        };
        let model = project_app_screen(&snapshot(), &settings);

        assert_eq!(model.value("Status"), Some("Discharging"));
        assert_eq!(model.value("Power Source"), Some("Not Plugged"));
        assert_eq!(model.value("Remaining Battery"), Some("64%"));
        assert_eq!(model.value("Instant Current"), Some("-412 mA"));
        assert_eq!(model.value("Average Current"), Some("-398 mA"));
        assert_eq!(model.value("Voltage"), Some("3.85 V"));
        assert_eq!(model.value("Temperature"), Some("28.7 ℃"));
        assert_eq!(model.value("Health"), Some("GOOD"));
        assert_eq!(model.value("Cycle Count"), Some("Unknown"));
        assert_eq!(model.value("Update Times"), Some("7"));
    }

    #[test]
    fn microamp_setting_changes_current_rows_only() {
        let settings = SettingsView {
            is_current_in_milliamps: false,
            ..SettingsView::default()
        };
        let model = project_app_screen(&snapshot(), &settings);
        assert_eq!(model.value("Instant Current"), Some("-412000 μA"));
        assert_eq!(model.value("Average Current"), Some("-398500 μA"));
        assert_eq!(model.value("Voltage"), Some("3.85 V"));
    }
}
