//! Shared test fixtures for the Herald workspace.
//!
//! Provides an in-memory [`host::MemoryHost`] plus configuration
//! builders, so engine behaviour is testable without a network or a
//! real hosting service. It is a dev-dependency only and never
//! published.
//!
//! # Modules
//!
//! - [`host`]: [`MemoryHost`], a scriptable [`herald_core::DocumentHost`]
//! - [`config`]: inline-TOML configuration builders

pub mod config;
pub mod host;

pub use config::{base_config, config_from_toml};
pub use host::MemoryHost;

use chrono::{DateTime, TimeZone, Utc};

/// Fixed UTC instant for deterministic schedule tests.
///
/// # Panics
/// Panics on an invalid calendar date.
pub fn datetime(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("fixture datetime should be valid")
}
