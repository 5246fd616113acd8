use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{helpers::parse_datetime, Database};

/// Raw settings row. `value` is JSON text; decoding belongs to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSetting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

fn row_to_setting(row: &Row) -> Result<StoredSetting> {
    let updated_at: String = row.get("updated_at")?;
    Ok(StoredSetting {
        key: row.get("key")?,
        value: row.get("value")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn get_setting(&self, key: &str) -> Result<Option<StoredSetting>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key, value, updated_at
                 FROM settings
                 WHERE key = ?1",
            )?;

            let mut rows = stmt.query(params![key])?;
            let setting = match rows.next()? {
                Some(row) => Some(row_to_setting(row)?),
                None => None,
            };
            Ok(setting)
        })
        .await
    }

    pub async fn get_all_settings(&self) -> Result<Vec<StoredSetting>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key, value, updated_at
                 FROM settings
                 ORDER BY key",
            )?;

            let mut rows = stmt.query([])?;
            let mut settings = Vec::new();
            while let Some(row) = rows.next()? {
                settings.push(row_to_setting(row)?);
            }

            Ok(settings)
        })
        .await
    }

    /// Insert or replace a single key. Commits before returning.
    pub async fn upsert_setting(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        let updated_at = Utc::now().to_rfc3339();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO settings (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, updated_at],
            )
            .with_context(|| format!("failed to upsert setting {key}"))?;
            Ok(())
        })
        .await
    }
}
