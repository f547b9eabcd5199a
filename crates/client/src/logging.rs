//! Logging macros over `tracing`.
//!
//! Kept as macros so call sites read the same in every module and the
//! backend can change in one place.

pub fn log_info_impl(msg: &str) {
    tracing::info!("{}", msg);
}

pub fn log_error_impl(msg: &str) {
    tracing::error!("{}", msg);
}

pub fn log_warn_impl(msg: &str) {
    tracing::warn!("{}", msg);
}

pub fn log_debug_impl(msg: &str) {
    tracing::debug!("{}", msg);
}

/// Log an info message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log_info_impl(&format!($($arg)*))
    };
}

/// Log an error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log_error_impl(&format!($($arg)*))
    };
}

/// Log a warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::log_warn_impl(&format!($($arg)*))
    };
}

/// Log a debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::log_debug_impl(&format!($($arg)*))
    };
}
