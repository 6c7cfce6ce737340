//! Fetch pipeline tuning.

use std::time::Duration;

use crate::provider::DEFAULT_TIMEOUT;

use super::codec::OutputFormat;

/// Concurrent sub-image downloads per tile.
pub const DEFAULT_CELL_CONCURRENCY: usize = 4;

/// Download attempts per sub-image, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Backoff before retry `n` is `n × DEFAULT_BACKOFF_STEP`.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(5);

/// Configuration for [`FetchPipeline`](super::FetchPipeline).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sub-image downloads in flight at once for one tile
    pub cell_concurrency: usize,
    /// Attempts per sub-image before the tile fails
    pub max_attempts: u32,
    /// Linear backoff unit between attempts
    pub backoff_step: Duration,
    /// Timeout for a single sub-image request
    pub request_timeout: Duration,
    /// Container written to the store
    pub output: OutputFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cell_concurrency: DEFAULT_CELL_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: DEFAULT_BACKOFF_STEP,
            request_timeout: DEFAULT_TIMEOUT,
            output: OutputFormat::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_cell_concurrency(mut self, n: usize) -> Self {
        self.cell_concurrency = n.max(1);
        self
    }

    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    /// Wait before attempt `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}
