//! Standardized emoji logging for vault operations
//!
//! Value-moving paths log through these macros so deposits, fees and
//! reallocations are easy to pick out of a busy keeper log.

/// Standard emoji set for vault logging
pub struct LogEmoji;

impl LogEmoji {
    // Status indicators
    pub const SUCCESS: &'static str = "✅";
    pub const ERROR: &'static str = "❌";
    pub const WARNING: &'static str = "⚠️";

    // Vault-specific
    pub const SEARCH: &'static str = "🔍"; // Evaluating strategies / upkeep checks
    pub const CHART: &'static str = "📊"; // Share and value metrics
    pub const EXECUTE: &'static str = "⚡"; // Capital movement
    pub const MONEY: &'static str = "💰"; // Fees collected
    pub const BOOST: &'static str = "🚀"; // Flash boost lifecycle
    pub const LOCK: &'static str = "🔒"; // Pause / access changes
    pub const CLOCK: &'static str = "⏱️"; // Interval gates and expiry

    // Share events
    pub const MINT: &'static str = "➕";
    pub const BURN: &'static str = "➖";
    pub const SWAP: &'static str = "🔄";
}

// Convenience macros for standardized logging
#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SUCCESS, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!("{} {}", $crate::logging::LogEmoji::ERROR, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        tracing::warn!("{} {}", $crate::logging::LogEmoji::WARNING, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_search {
    ($($arg:tt)*) => {
        tracing::debug!("{} {}", $crate::logging::LogEmoji::SEARCH, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_metrics {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::CHART, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_execution {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::EXECUTE, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_profit {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::MONEY, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_boost {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::BOOST, format!($($arg)*))
    };
}
