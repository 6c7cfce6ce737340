//! Default values for every configuration setting.

use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::{DEFAULT_BACKOFF_STEP, DEFAULT_CELL_CONCURRENCY, DEFAULT_MAX_ATTEMPTS};
use crate::provider::DEFAULT_TIMEOUT;

/// Requested size tier (2048 px).
pub const DEFAULT_SIZE: u8 = 2;

/// Floor size tier (512 px).
pub const DEFAULT_SIZE_DOWN: u8 = 0;

/// Radius of a center-point request, in nautical miles.
pub const DEFAULT_RADIUS_NM: f64 = 10.0;

/// Map server used when none is named.
pub const DEFAULT_SERVER_ID: u32 = 1;

/// Tiles fetched at once. One keeps commits in priority order.
pub const DEFAULT_TILE_CONCURRENCY: usize = 1;

/// Upper bound for tile and cell concurrency settings.
pub const MAX_CONCURRENCY: usize = 64;

pub const DEFAULT_LOG_FILE: &str = "photoscenery.log";

/// Referer sent with every request, as the public imagery endpoints expect.
pub const DEFAULT_REFERER: &str = "https://services.arcgisonline.com";

pub fn default_cell_concurrency() -> usize {
    DEFAULT_CELL_CONCURRENCY
}

pub fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

pub fn default_backoff_secs() -> u64 {
    DEFAULT_BACKOFF_STEP.as_secs()
}

pub fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// `~/Photoscenery`, or `./Photoscenery` without a home directory.
pub fn default_output_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Photoscenery")
}

/// `~/.photoscenery/logs`.
pub fn default_log_dir() -> PathBuf {
    super::config_directory().join("logs")
}

/// Clamp a concurrency setting into `1..=MAX_CONCURRENCY`.
pub fn clamp_concurrency(value: usize) -> usize {
    value.clamp(1, MAX_CONCURRENCY)
}

pub(crate) fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}
