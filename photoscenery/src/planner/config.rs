//! Planner tuning.

use super::lod::MAX_REQUESTED_TIER;
use super::plan::RegionPlanner;

/// Size tiers requested for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Tier for the focal tile (0 = 512 px .. 6 = 32768 px)
    pub size: u8,
    /// Lowest tier handed to distant tiles
    pub size_down: u8,
    /// Tiers already dropped by earlier incomplete runs
    pub downgrade: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            size: 2,
            size_down: 0,
            downgrade: 0,
        }
    }
}

impl PlannerConfig {
    pub fn with_size(mut self, size: u8) -> Self {
        self.size = size.min(MAX_REQUESTED_TIER);
        self
    }

    pub fn with_size_down(mut self, size_down: u8) -> Self {
        self.size_down = size_down.min(MAX_REQUESTED_TIER);
        self
    }

    pub fn with_downgrade(mut self, downgrade: u32) -> Self {
        self.downgrade = downgrade;
        self
    }

    pub fn planner(&self) -> RegionPlanner {
        RegionPlanner::new(self.size, self.size_down)
    }
}
