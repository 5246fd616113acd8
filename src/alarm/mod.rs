pub mod scheduler;
pub mod state;
pub mod trigger;

pub use scheduler::{AlarmScheduler, ALARM_INITIAL_DELAY, ALARM_REQUEST_CODE};
pub use state::AlarmState;
pub use trigger::{AlarmFired, PeriodicTrigger, RecordingTrigger, Registration, TokioTrigger};
