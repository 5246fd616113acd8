use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{db::Database, error::PersistenceError};

/// Durable key-value layer under the settings store. A successful `store`
/// must survive a process restart.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    async fn load_all(&self) -> Result<Vec<(String, String)>, PersistenceError>;
    async fn store(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

#[async_trait]
impl SettingsBackend for Database {
    async fn load_all(&self) -> Result<Vec<(String, String)>, PersistenceError> {
        let rows = self
            .get_all_settings()
            .await
            .map_err(|err| PersistenceError::Backend(format!("{err:#}")))?;
        Ok(rows.into_iter().map(|row| (row.key, row.value)).collect())
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.upsert_setting(key, value.to_string())
            .await
            .map_err(|err| PersistenceError::store(key, format!("{err:#}")))
    }
}

/// Volatile backend for tests and previews. `fail_writes(true)` makes every
/// subsequent `store` fail without touching the data.
#[derive(Default)]
pub struct MemoryBackend {
    data: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let backend = Self::default();
        {
            let mut guard = backend.lock_data();
            for (key, value) in entries {
                guard.insert(key.into(), value.into());
            }
        }
        backend
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock_data().get(key).cloned()
    }

    fn lock_data(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl SettingsBackend for MemoryBackend {
    async fn load_all(&self) -> Result<Vec<(String, String)>, PersistenceError> {
        Ok(self
            .lock_data()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::store(key, "storage unavailable"));
        }
        self.lock_data().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        // Yield so concurrent writers actually interleave in tests.
        tokio::task::yield_now().await;
        Ok(())
    }
}
