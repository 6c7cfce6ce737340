//! Run-level tuning.

use crate::config::DEFAULT_TILE_CONCURRENCY;

/// Configuration for [`Orchestrator`](super::Orchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Tiles fetched at once; 1 commits strictly in plan order
    pub tile_concurrency: usize,
    /// Remove stray artifacts from every touched 1° cell after a run
    pub prune: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tile_concurrency: DEFAULT_TILE_CONCURRENCY,
            prune: true,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_tile_concurrency(mut self, n: usize) -> Self {
        self.tile_concurrency = n.max(1);
        self
    }

    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }
}
