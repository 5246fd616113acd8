pub mod orchestrator;

use serde::{Deserialize, Serialize};

pub use orchestrator::{RefreshOrchestrator, RefreshReport};

/// What started a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    Manual,
    Alarm,
    Toggle,
}
