use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde_json::Value;
use tokio::sync::{watch, Mutex as AsyncMutex};

use crate::error::PersistenceError;

use super::{
    backend::SettingsBackend,
    keys::{
        Setting, SettingValue, ALARM_INTERVAL_MS, IS_ALARM_RUNNING, IS_CURRENT_IN_MILLIAMPS,
        IS_SIMPLE_WIDGET_UI, IS_UPDATE_COUNT_VISIBLE, UPDATE_COUNT,
    },
    SettingsView,
};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "battery_widget::settings";

use crate::{log_debug, log_warn};

struct Slot {
    tx: watch::Sender<Value>,
    // Held across read-modify-write so same-key writers serialize.
    write_lock: AsyncMutex<()>,
}

struct StoreInner {
    backend: Arc<dyn SettingsBackend>,
    loaded: HashMap<String, Value>,
    slots: Mutex<HashMap<&'static str, Arc<Slot>>>,
    revision: watch::Sender<u64>,
}

/// Durable, observable settings.
///
/// Each key is backed by its own `watch` channel: subscribers see the
/// current value immediately and every committed write after that. Writes
/// hit the backend first; the channel only changes once the backend has
/// accepted the value, so a failed write is invisible to subscribers.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<StoreInner>,
}

impl SettingsStore {
    pub async fn open(backend: Arc<dyn SettingsBackend>) -> Result<Self, PersistenceError> {
        let rows = backend.load_all().await?;

        let mut loaded = HashMap::with_capacity(rows.len());
        for (key, raw) in rows {
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    loaded.insert(key, value);
                }
                Err(err) => {
                    log_warn!("ignoring unreadable stored value for '{}': {}", key, err);
                }
            }
        }
        log_debug!("settings store opened with {} persisted keys", loaded.len());

        let (revision, _) = watch::channel(0);
        Ok(Self {
            inner: Arc::new(StoreInner {
                backend,
                loaded,
                slots: Mutex::new(HashMap::new()),
                revision,
            }),
        })
    }

    fn slot<T: SettingValue>(&self, key: &Setting<T>) -> Arc<Slot> {
        let mut slots = match self.inner.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        slots
            .entry(key.name())
            .or_insert_with(|| {
                let initial = self
                    .inner
                    .loaded
                    .get(key.name())
                    .cloned()
                    .unwrap_or_else(|| encode_default(key));
                let (tx, _) = watch::channel(initial);
                Arc::new(Slot {
                    tx,
                    write_lock: AsyncMutex::new(()),
                })
            })
            .clone()
    }

    /// Stream of values for `key`, starting with the current one.
    pub fn get<T: SettingValue>(&self, key: &Setting<T>) -> SettingStream<T> {
        let slot = self.slot(key);
        SettingStream {
            key: key.clone(),
            rx: slot.tx.subscribe(),
            primed: false,
        }
    }

    pub fn current<T: SettingValue>(&self, key: &Setting<T>) -> T {
        let slot = self.slot(key);
        let value = slot.tx.borrow();
        decode(key, &value)
    }

    /// Persists `value`; returns once the backend has committed it.
    pub async fn set<T: SettingValue>(
        &self,
        key: &Setting<T>,
        value: T,
    ) -> Result<(), PersistenceError> {
        self.update(key, move |_| value).await.map(|_| ())
    }

    /// Atomic read-modify-write for a single key. Returns the committed value.
    pub async fn update<T, F>(&self, key: &Setting<T>, f: F) -> Result<T, PersistenceError>
    where
        T: SettingValue,
        F: FnOnce(T) -> T,
    {
        let slot = self.slot(key);
        let _write_guard = slot.write_lock.lock().await;

        let current = {
            let value = slot.tx.borrow();
            decode(key, &value)
        };
        let next = f(current);

        let encoded = serde_json::to_value(&next)
            .map_err(|err| PersistenceError::store(key.name(), err))?;
        self.inner
            .backend
            .store(key.name(), &encoded.to_string())
            .await?;

        let changed = slot.tx.send_if_modified(|stored| {
            if *stored == encoded {
                false
            } else {
                *stored = encoded;
                true
            }
        });
        if changed {
            self.inner.revision.send_modify(|revision| *revision += 1);
        }

        Ok(next)
    }

    /// Every setting at its current value.
    pub fn view(&self) -> SettingsView {
        SettingsView {
            alarm_interval_ms: self.current(&ALARM_INTERVAL_MS),
            is_alarm_running: self.current(&IS_ALARM_RUNNING),
            update_count: self.current(&UPDATE_COUNT),
            is_update_count_visible: self.current(&IS_UPDATE_COUNT_VISIBLE),
            is_simple_widget_ui: self.current(&IS_SIMPLE_WIDGET_UI),
            is_current_in_milliamps: self.current(&IS_CURRENT_IN_MILLIAMPS),
        }
    }

    /// Emits a fresh [`SettingsView`] now and after any committed change.
    pub fn watch_view(&self) -> SettingsViewStream {
        SettingsViewStream {
            store: self.clone(),
            rx: self.inner.revision.subscribe(),
            primed: false,
        }
    }
}

// Settings screen and widget operations.
impl SettingsStore {
    pub async fn increment_update_count(&self) -> Result<i64, PersistenceError> {
        self.update(&UPDATE_COUNT, |count| count.saturating_add(1)).await
    }

    pub async fn reset_update_count(&self) -> Result<(), PersistenceError> {
        self.set(&UPDATE_COUNT, 0).await
    }

    pub async fn save_alarm_interval(&self, interval_ms: i64) -> Result<(), PersistenceError> {
        self.set(&ALARM_INTERVAL_MS, interval_ms).await
    }

    pub async fn invert_alarm_running(&self) -> Result<bool, PersistenceError> {
        self.update(&IS_ALARM_RUNNING, |running| !running).await
    }

    pub async fn invert_update_count_visible(&self) -> Result<bool, PersistenceError> {
        self.update(&IS_UPDATE_COUNT_VISIBLE, |visible| !visible).await
    }

    pub async fn invert_simple_widget_ui(&self) -> Result<bool, PersistenceError> {
        self.update(&IS_SIMPLE_WIDGET_UI, |simple| !simple).await
    }

    pub async fn set_current_in_milliamps(&self, milliamps: bool) -> Result<(), PersistenceError> {
        self.set(&IS_CURRENT_IN_MILLIAMPS, milliamps).await
    }
}

fn encode_default<T: SettingValue>(key: &Setting<T>) -> Value {
    serde_json::to_value(key.default_value()).unwrap_or(Value::Null)
}

fn decode<T: SettingValue>(key: &Setting<T>, value: &Value) -> T {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => decoded,
        Err(err) => {
            log_warn!(
                "setting '{}' holds {} which is not readable ({}); using default",
                key.name(),
                value,
                err
            );
            key.default_value()
        }
    }
}

/// Values of one key: the current value first, then each committed change.
pub struct SettingStream<T> {
    key: Setting<T>,
    rx: watch::Receiver<Value>,
    primed: bool,
}

impl<T: SettingValue> SettingStream<T> {
    /// `None` once the store has been dropped.
    pub async fn next(&mut self) -> Option<T> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        let value = self.rx.borrow_and_update();
        Some(decode(&self.key, &value))
    }

    pub fn current(&self) -> T {
        let value = self.rx.borrow();
        decode(&self.key, &value)
    }
}

pub struct SettingsViewStream {
    store: SettingsStore,
    rx: watch::Receiver<u64>,
    primed: bool,
}

impl SettingsViewStream {
    pub async fn next(&mut self) -> Option<SettingsView> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        self.rx.borrow_and_update();
        Some(self.store.view())
    }
}
