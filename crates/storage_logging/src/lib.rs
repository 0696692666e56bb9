#![deny(missing_docs)]
//! Logging for the storage refresh workspace.
//!
//! All `refresh_*` macros log under the [`LOG_TARGET`] target. Lines written
//! on the consumer thread carry the tick they were raised in, so a run's
//! start, hand-off and publication can be lined up with the request that
//! caused them. Worker threads have no tick and log without the prefix.

use std::cell::Cell;
use std::fmt;

/// Log target shared by every refresh log line.
pub const LOG_TARGET: &str = "storage_refresh";

thread_local! {
    static CONSUMER_TICK: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Records the consumer tick for the current thread.
/// The consumer loop calls this once per tick before driving the coordinator.
pub fn set_consumer_tick(tick: u64) {
    CONSUMER_TICK.with(|v| v.set(Some(tick)));
}

/// Returns the consumer tick recorded for the current thread, if any.
pub fn consumer_tick() -> Option<u64> {
    CONSUMER_TICK.with(|v| v.get())
}

/// Renders `[tick N] ` on a thread that recorded a consumer tick, else nothing.
#[doc(hidden)]
pub struct TickPrefix;

impl fmt::Display for TickPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match consumer_tick() {
            Some(tick) => write!(f, "[tick {tick}] "),
            None => Ok(()),
        }
    }
}

/// Logs a debug-level refresh message.
#[macro_export]
macro_rules! refresh_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::LOG_TARGET, "{}{}", $crate::TickPrefix, format_args!($($arg)*));
    }};
}

/// Logs an info-level refresh message.
#[macro_export]
macro_rules! refresh_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::LOG_TARGET, "{}{}", $crate::TickPrefix, format_args!($($arg)*));
    }};
}

/// Logs a warn-level refresh message.
#[macro_export]
macro_rules! refresh_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::LOG_TARGET, "{}{}", $crate::TickPrefix, format_args!($($arg)*));
    }};
}

/// Logs an error-level refresh message.
#[macro_export]
macro_rules! refresh_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::LOG_TARGET, "{}{}", $crate::TickPrefix, format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
