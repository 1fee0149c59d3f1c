//! Time-related utilities with clock abstraction for testability.
//!
//! Wire timestamps are ISO-8601 strings in UTC with millisecond precision
//! (`2024-01-01T09:30:00.000Z`).

use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current time as an ISO-8601 string
    fn now_iso8601(&self) -> String;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_iso8601(&self) -> String {
        iso8601_now()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone)]
pub struct FixedClock {
    fixed_time: String,
}

impl FixedClock {
    /// Create a new fixed clock returning the given ISO-8601 timestamp
    pub fn new(fixed_time: impl Into<String>) -> Self {
        Self {
            fixed_time: fixed_time.into(),
        }
    }
}

impl Clock for FixedClock {
    fn now_iso8601(&self) -> String {
        self.fixed_time.clone()
    }
}

/// Get the current UTC time as an ISO-8601 string
pub fn iso8601_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render an ISO-8601 timestamp as local wall-clock time (`HH:MM:SS`).
///
/// Peers are not guaranteed to send well-formed timestamps, so anything that
/// does not parse is returned unchanged.
pub fn iso8601_to_local_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.with_timezone(&Local).format("%H:%M:%S").to_string(),
        Err(_) => timestamp.to_string(),
    }
}
