use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::battery::sysfs::DEFAULT_POWER_SUPPLY_ROOT;

const APP_DIR_NAME: &str = "battery-widget";
const DB_FILE_NAME: &str = "battery-widget.sqlite3";

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub power_supply_root: PathBuf,
    pub debug: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = match lookup("BATTERY_WIDGET_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .ok_or_else(|| anyhow!("no data directory for this platform; set BATTERY_WIDGET_DATA_DIR"))?
                .join(APP_DIR_NAME),
        };

        let power_supply_root = lookup("BATTERY_WIDGET_POWER_SUPPLY")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_POWER_SUPPLY_ROOT));

        let debug = lookup("BATTERY_WIDGET_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            data_dir,
            power_supply_root,
            debug,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}
