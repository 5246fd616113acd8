use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AlarmState {
    Running,
    Stopped,
}

impl Default for AlarmState {
    fn default() -> Self {
        AlarmState::Running
    }
}

impl AlarmState {
    pub fn from_flag(is_running: bool) -> Self {
        if is_running {
            AlarmState::Running
        } else {
            AlarmState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, AlarmState::Running)
    }

    /// The state a toggle moves to from here.
    pub fn toggled(&self) -> Self {
        match self {
            AlarmState::Running => AlarmState::Stopped,
            AlarmState::Stopped => AlarmState::Running,
        }
    }
}
