use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;

use crate::error::ReaderUnavailable;

use super::{BatteryHealth, BatteryReader, BatterySnapshot, ChargeStatus, PluggedSource};

pub const DEFAULT_POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

/// Reads the kernel power-supply class (`<root>/<supply>/uevent`), which is
/// what both desktop Linux and Android kernels expose.
pub struct SysfsReader {
    root: PathBuf,
}

impl SysfsReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn supplies(&self) -> Result<Vec<(PathBuf, HashMap<String, String>)>, ReaderUnavailable> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|err| {
            ReaderUnavailable::new(format!("cannot list {}: {err}", self.root.display()))
        })?;

        let mut supplies = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| ReaderUnavailable::new(format!("cannot list power supplies: {err}")))?
        {
            let path = entry.path();
            match read_uevent(&path).await {
                Ok(props) => supplies.push((path, props)),
                Err(err) => debug!("skipping power supply {}: {err}", path.display()),
            }
        }

        supplies.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(supplies)
    }
}

#[async_trait]
impl BatteryReader for SysfsReader {
    async fn fetch(&self) -> Result<BatterySnapshot, ReaderUnavailable> {
        let supplies = self.supplies().await?;

        let battery = supplies
            .iter()
            .find(|(_, props)| supply_type(props) == Some("Battery"))
            .map(|(_, props)| props)
            .ok_or_else(|| {
                ReaderUnavailable::new(format!("no battery under {}", self.root.display()))
            })?;

        let external: Vec<&HashMap<String, String>> = supplies
            .iter()
            .map(|(_, props)| props)
            .filter(|props| supply_type(props) != Some("Battery"))
            .collect();

        snapshot_from_uevent(battery, plugged_source(&external), Utc::now())
    }
}

async fn read_uevent(supply_dir: &Path) -> std::io::Result<HashMap<String, String>> {
    let contents = tokio::fs::read_to_string(supply_dir.join("uevent")).await?;
    Ok(parse_uevent(&contents))
}

/// Parses `POWER_SUPPLY_KEY=value` lines, dropping the prefix.
pub fn parse_uevent(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let key = key.trim();
            let key = key.strip_prefix("POWER_SUPPLY_").unwrap_or(key);
            (key.to_string(), value.trim().to_string())
        })
        .collect()
}

fn supply_type(props: &HashMap<String, String>) -> Option<&str> {
    props.get("TYPE").map(String::as_str)
}

fn int_prop(props: &HashMap<String, String>, key: &str) -> Option<i64> {
    props.get(key).and_then(|value| value.parse::<i64>().ok())
}

fn plugged_source(external: &[&HashMap<String, String>]) -> PluggedSource {
    if external.is_empty() {
        return PluggedSource::Unknown;
    }

    external
        .iter()
        .find(|props| int_prop(props, "ONLINE") == Some(1))
        .map(|props| match supply_type(props) {
            Some("Mains") => PluggedSource::Ac,
            Some(kind) if kind.starts_with("USB") => PluggedSource::Usb,
            Some("Wireless") => PluggedSource::Wireless,
            _ => PluggedSource::Unknown,
        })
        .unwrap_or(PluggedSource::None)
}

fn parse_status(value: Option<&String>) -> ChargeStatus {
    match value.map(String::as_str) {
        Some("Charging") => ChargeStatus::Charging,
        Some("Discharging") => ChargeStatus::Discharging,
        Some("Full") => ChargeStatus::Full,
        Some("Not charging") => ChargeStatus::NotCharging,
        _ => ChargeStatus::Unknown,
    }
}

fn parse_health(value: Option<&String>) -> BatteryHealth {
    match value.map(String::as_str) {
        Some("Good") => BatteryHealth::Good,
        Some("Cold") => BatteryHealth::Cold,
        Some("Dead") => BatteryHealth::Dead,
        Some("Overheat") => BatteryHealth::Overheat,
        Some("Over voltage") => BatteryHealth::OverVoltage,
        Some("Unspecified failure") => BatteryHealth::UnspecifiedFailure,
        _ => BatteryHealth::Unknown,
    }
}

/// Kernels disagree on the sign of `CURRENT_NOW`; normalise so that positive
/// always means charging.
fn signed_current(raw: i64, status: ChargeStatus) -> i32 {
    let magnitude = raw.unsigned_abs().min(i32::MAX as u64) as i32;
    match status {
        ChargeStatus::Discharging => -magnitude,
        ChargeStatus::Charging => magnitude,
        _ => raw.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
    }
}

pub fn snapshot_from_uevent(
    props: &HashMap<String, String>,
    plugged_source: PluggedSource,
    captured_at: DateTime<Utc>,
) -> Result<BatterySnapshot, ReaderUnavailable> {
    let level = match int_prop(props, "CAPACITY") {
        Some(capacity) => capacity,
        None => match (int_prop(props, "ENERGY_NOW"), int_prop(props, "ENERGY_FULL")) {
            (Some(now), Some(full)) if full > 0 => now * 100 / full,
            _ => match (int_prop(props, "CHARGE_NOW"), int_prop(props, "CHARGE_FULL")) {
                (Some(now), Some(full)) if full > 0 => now * 100 / full,
                _ => return Err(ReaderUnavailable::new("battery reports no capacity")),
            },
        },
    };

    let status = parse_status(props.get("STATUS"));
    let voltage_microvolts = int_prop(props, "VOLTAGE_NOW");

    // Some laptops only report power draw (µW); derive current from voltage.
    let instant_raw = int_prop(props, "CURRENT_NOW").or_else(|| {
        match (int_prop(props, "POWER_NOW"), voltage_microvolts) {
            (Some(power), Some(voltage)) if voltage > 0 => Some(power * 1_000_000 / voltage),
            _ => None,
        }
    });
    let instant = signed_current(instant_raw.unwrap_or(0), status);
    let average = int_prop(props, "CURRENT_AVG")
        .map(|raw| signed_current(raw, status))
        .unwrap_or(instant);

    let remaining_charge_time_minutes = match status {
        ChargeStatus::Charging => int_prop(props, "TIME_TO_FULL_NOW")
            .filter(|seconds| *seconds > 0)
            .map(|seconds| seconds / 60)
            .unwrap_or(0),
        _ => 0,
    };

    Ok(BatterySnapshot {
        level: level.clamp(0, 100) as u8,
        instant_current_microamps: instant,
        average_current_microamps: average,
        status,
        plugged_source,
        technology: props
            .get("TECHNOLOGY")
            .cloned()
            .unwrap_or_else(|| "Unknown".into()),
        voltage_millivolts: voltage_microvolts.map(|uv| uv as f32 / 1000.0),
        temperature_tenths_celsius: int_prop(props, "TEMP").map(|t| t as f32),
        cycle_count: int_prop(props, "CYCLE_COUNT").map(|c| c as i32),
        health: parse_health(props.get("HEALTH")),
        remaining_charge_time_minutes,
        captured_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAPTOP_UEVENT: &str = "\
POWER_SUPPLY_NAME=BAT0
POWER_SUPPLY_TYPE=Battery
POWER_SUPPLY_STATUS=Discharging
POWER_SUPPLY_PRESENT=1
POWER_SUPPLY_TECHNOLOGY=Li-ion
POWER_SUPPLY_CYCLE_COUNT=212
POWER_SUPPLY_VOLTAGE_NOW=11820000
POWER_SUPPLY_CURRENT_NOW=1450000
POWER_SUPPLY_CAPACITY=63
POWER_SUPPLY_HEALTH=Good
POWER_SUPPLY_TEMP=301
";

    #[test]
    fn parses_discharging_battery_with_negative_current() {
        let props = parse_uevent(LAPTOP_UEVENT);
        let snapshot =
            snapshot_from_uevent(&props, PluggedSource::None, Utc::now()).expect("valid uevent");

        assert_eq!(snapshot.level, 63);
        assert_eq!(snapshot.status, ChargeStatus::Discharging);
        assert_eq!(snapshot.instant_current_microamps, -1_450_000);
        assert_eq!(snapshot.average_current_microamps, -1_450_000);
        assert_eq!(snapshot.voltage_millivolts, Some(11820.0));
        assert_eq!(snapshot.temperature_tenths_celsius, Some(301.0));
        assert_eq!(snapshot.cycle_count, Some(212));
        assert_eq!(snapshot.health, BatteryHealth::Good);
        assert_eq!(snapshot.technology, "Li-ion");
        assert_eq!(snapshot.remaining_charge_time_minutes, 0);
    }

    #[test]
    fn derives_level_from_energy_and_current_from_power() {
        let props = parse_uevent(
            "POWER_SUPPLY_TYPE=Battery\n\
             POWER_SUPPLY_STATUS=Charging\n\
             POWER_SUPPLY_ENERGY_NOW=25000000\n\
             POWER_SUPPLY_ENERGY_FULL=50000000\n\
             POWER_SUPPLY_POWER_NOW=12000000\n\
             POWER_SUPPLY_VOLTAGE_NOW=12000000\n\
             POWER_SUPPLY_TIME_TO_FULL_NOW=5400\n",
        );
        let snapshot =
            snapshot_from_uevent(&props, PluggedSource::Ac, Utc::now()).expect("valid uevent");

        assert_eq!(snapshot.level, 50);
        assert_eq!(snapshot.instant_current_microamps, 1_000_000);
        assert_eq!(snapshot.remaining_charge_time_minutes, 90);
        assert_eq!(snapshot.cycle_count, None);
    }

    #[test]
    fn missing_capacity_is_reader_unavailable() {
        let props = parse_uevent("POWER_SUPPLY_TYPE=Battery\nPOWER_SUPPLY_STATUS=Full\n");
        assert!(snapshot_from_uevent(&props, PluggedSource::Ac, Utc::now()).is_err());
    }

    #[tokio::test]
    async fn reads_battery_and_online_charger_from_directory() {
        let root = std::env::temp_dir().join(format!("bw-sysfs-{}", uuid::Uuid::new_v4()));
        let bat = root.join("BAT0");
        let ac = root.join("AC");
        std::fs::create_dir_all(&bat).expect("create battery dir");
        std::fs::create_dir_all(&ac).expect("create charger dir");
        std::fs::write(
            bat.join("uevent"),
            LAPTOP_UEVENT.replace("Discharging", "Charging"),
        )
        .expect("write battery uevent");
        std::fs::write(ac.join("uevent"), "POWER_SUPPLY_TYPE=Mains\nPOWER_SUPPLY_ONLINE=1\n")
            .expect("write charger uevent");

        let snapshot = SysfsReader::new(&root).fetch().await.expect("battery present");
        assert_eq!(snapshot.plugged_source, PluggedSource::Ac);
        assert_eq!(snapshot.status, ChargeStatus::Charging);
        assert_eq!(snapshot.instant_current_microamps, 1_450_000);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn missing_root_is_reader_unavailable() {
        let reader = SysfsReader::new("/nonexistent/power_supply");
        assert!(reader.fetch().await.is_err());
    }
}
