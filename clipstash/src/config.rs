//! Runtime configuration
//!
//! Supplied by the host (settings UI, TOML file). Unknown keys are ignored and
//! missing keys take their defaults.

use crate::interface::ClipStashError;
use crate::search::{AllViewPolicy, FilterOptions};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 1.0;
pub const DEFAULT_CAPACITY: usize = 40;

/// Intervals below this (including zero, negative and NaN) are clamped up to it
pub const MIN_POLL_INTERVAL_SECS: f64 = 0.5;
pub const MAX_POLL_INTERVAL_SECS: f64 = 3600.0;

/// What `clear()` removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearPolicy {
    #[default]
    Everything,
    KeepFavorites,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    pub poll_interval_secs: f64,
    /// Maximum number of non-favorite items kept
    pub capacity: usize,
    pub notifications_enabled: bool,
    pub clear_policy: ClearPolicy,
    pub all_view_policy: AllViewPolicy,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            capacity: DEFAULT_CAPACITY,
            notifications_enabled: true,
            clear_policy: ClearPolicy::default(),
            all_view_policy: AllViewPolicy::default(),
        }
    }
}

impl StashConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ClipStashError> {
        Ok(toml::from_str(source)?)
    }

    pub fn poll_interval(&self) -> Duration {
        effective_poll_interval(self.poll_interval_secs)
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            capacity: self.capacity,
            all_view: self.all_view_policy,
        }
    }
}

/// Clamp a requested interval to a safe, finite duration
pub fn effective_poll_interval(secs: f64) -> Duration {
    if secs.is_finite() && secs >= MIN_POLL_INTERVAL_SECS {
        Duration::from_secs_f64(secs.min(MAX_POLL_INTERVAL_SECS))
    } else {
        Duration::from_secs_f64(MIN_POLL_INTERVAL_SECS)
    }
}
