//! Conditional logging macros keyed on two module-level constants.
//!
//! Every module that uses them declares:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TARGET: &str = "battery_widget::alarm";
//!
//! use crate::{log_info, log_warn};
//! log_info!("alarm registered every {}ms", interval_ms);
//! ```
//!
//! `LOG_TARGET` lets `RUST_LOG=battery_widget::alarm=debug` narrow output to a
//! single subsystem while `ENABLE_LOGS` silences a noisy module at compile time.

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Errors are never compiled out; `ENABLE_LOGS` only gates the lower levels.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!(target: LOG_TARGET, $($arg)*);
    };
}
