pub mod alarm;
pub mod battery;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod refresh;
pub mod settings;
mod utils;
pub mod view;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::sync::{broadcast::error::RecvError, mpsc};

use alarm::{AlarmFired, AlarmScheduler, TokioTrigger};
use battery::SysfsReader;
use config::AppConfig;
use db::Database;
use events::EventBus;
use refresh::{RefreshOrchestrator, Trigger};
use settings::SettingsStore;
use view::{project_app_screen, spawn_projection, WidgetHost};

/// Everything a host needs to drive the widget core.
pub struct AppState {
    pub db: Database,
    pub settings: SettingsStore,
    pub events: EventBus,
    pub scheduler: AlarmScheduler,
    pub orchestrator: RefreshOrchestrator,
}

impl AppState {
    /// Opens the database under `config.data_dir` and wires the components.
    /// Alarm firings arrive on the returned receiver; the caller decides how
    /// to dispatch them.
    pub async fn open(config: &AppConfig) -> Result<(Self, mpsc::UnboundedReceiver<AlarmFired>)> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating {}", config.data_dir.display()))?;

        let db = Database::new(config.db_path())?;
        let settings = SettingsStore::open(Arc::new(db.clone())).await?;
        let events = EventBus::new();

        let (trigger, firings) = TokioTrigger::new();
        let scheduler = AlarmScheduler::new(Arc::new(trigger), settings.clone(), events.clone());
        let orchestrator = RefreshOrchestrator::new(
            Arc::new(SysfsReader::new(config.power_supply_root.clone())),
            settings.clone(),
            WidgetHost::new(),
            scheduler.clone(),
            events.clone(),
        );

        Ok((
            Self {
                db,
                settings,
                events,
                scheduler,
                orchestrator,
            },
            firings,
        ))
    }
}

/// Headless host: refreshes on every alarm firing and logs the render
/// models and notices until Ctrl-C.
pub fn run() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Reads RUST_LOG; BATTERY_WIDGET_DEBUG raises the floor to debug.
    env_logger::Builder::from_default_env()
        .filter_level(if config.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    info!("battery widget starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(serve(config))
}

async fn serve(config: AppConfig) -> Result<()> {
    let (state, mut firings) = AppState::open(&config).await?;
    if let Some(path) = state.db.path() {
        info!("settings stored at {}", path.display());
    }

    match state.scheduler.reconcile_on_boot().await {
        Ok(alarm) => info!("alarm is {:?}", alarm),
        Err(err) => warn!("could not restore the alarm: {err}"),
    }

    let dispatcher = {
        let orchestrator = state.orchestrator.clone();
        tokio::spawn(async move {
            while let Some(fired) = firings.recv().await {
                debug!("alarm {} fired at {}", fired.request_code, fired.fired_at);
                drop(orchestrator.refresh(Trigger::Alarm));
            }
        })
    };

    let mut widget = state.orchestrator.widgets().spawn_instance(&state.settings);
    let mut screen = spawn_projection(
        &state.settings,
        state.orchestrator.latest_snapshot(),
        project_app_screen,
    );
    let mut notices = state.events.subscribe();

    drop(state.orchestrator.refresh(Trigger::Manual));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(model) = widget.changed() => {
                info!("widget: {}", serde_json::to_string(&model)?);
            }
            Some(model) = screen.changed() => {
                for row in &model.rows {
                    debug!("{:<28} {}", row.label, row.value);
                }
            }
            notice = notices.recv() => match notice {
                Ok(event) => match event.toast_message() {
                    Some(message) => info!("{message}"),
                    None => debug!("{}", serde_json::to_string(&event)?),
                },
                Err(RecvError::Lagged(missed)) => warn!("missed {missed} notices"),
                Err(RecvError::Closed) => break,
            },
            result = &mut shutdown => {
                result.context("waiting for ctrl-c")?;
                break;
            }
        }
    }

    info!("battery widget shutting down");
    dispatcher.abort();
    Ok(())
}
