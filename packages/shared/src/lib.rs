//! Utilities shared by the Tsunagu crates.

pub mod logger;
pub mod time;
