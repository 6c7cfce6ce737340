//! Run summaries.

use std::fmt;

use crate::tile::{CellName, TileId};

/// One tile that could not be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFailure {
    pub id: TileId,
    pub tier: u8,
    /// Failures of this tile so far, across runs of the same orchestrator
    pub attempts: u32,
    pub error: String,
}

impl fmt::Display for TileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tile {} (tier {}, attempt {}): {}",
            self.id, self.tier, self.attempts, self.error
        )
    }
}

/// Outcome of one run over a region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Tiles in the plan
    pub total: usize,
    /// Tiles downloaded and committed by this run
    pub stored: usize,
    /// Tiles already in the store
    pub cached: usize,
    pub failures: Vec<TileFailure>,
    /// The run was cancelled before every tile was attempted
    pub cancelled: bool,
    /// Stray artifacts removed after the run
    pub pruned: usize,
    /// Cell checked for completeness when the region is smaller than 1°
    pub subregion_cell: Option<CellName>,
    /// Sub-tiles of `subregion_cell` still absent from the store
    pub missing_subtiles: Vec<TileId>,
}

impl RunReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Tiles at their canonical path after this run.
    pub fn success_count(&self) -> usize {
        self.stored + self.cached
    }

    /// Tiles neither committed nor failed: cancelled before or during fetch.
    pub fn unfinished(&self) -> usize {
        self.total
            .saturating_sub(self.success_count() + self.failures.len())
    }

    /// Every planned tile is at its canonical path.
    pub fn all_committed(&self) -> bool {
        self.success_count() == self.total
    }

    /// Every planned tile is committed and, for a sub-degree region, every
    /// sub-tile of its cell is stored.
    pub fn is_complete(&self) -> bool {
        self.all_committed() && self.missing_subtiles.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} tiles committed ({} stored, {} cached), {} failed",
            self.success_count(),
            self.total,
            self.stored,
            self.cached,
            self.failures.len()
        )?;
        if self.cancelled {
            write!(f, ", cancelled with {} unfinished", self.unfinished())?;
        }
        if let Some(cell) = self.subregion_cell {
            if !self.missing_subtiles.is_empty() {
                write!(f, ", {} sub-tiles of {} missing", self.missing_subtiles.len(), cell)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line() {
        let mut report = RunReport::new(5);
        report.stored = 2;
        report.cached = 1;
        report.failures.push(TileFailure {
            id: TileId::encode(-30.0, -45.0).unwrap(),
            tier: 2,
            attempts: 1,
            error: "HTTP 404".to_string(),
        });

        assert_eq!(report.success_count(), 3);
        assert_eq!(report.unfinished(), 1);
        assert!(!report.all_committed());
        assert_eq!(
            report.to_string(),
            "3/5 tiles committed (2 stored, 1 cached), 1 failed"
        );

        report.cancelled = true;
        assert!(report.to_string().ends_with("cancelled with 1 unfinished"));
    }

    #[test]
    fn test_empty_plan_is_complete() {
        assert!(RunReport::new(0).all_committed());
        assert!(RunReport::new(0).is_complete());
    }

    #[test]
    fn test_missing_subtiles_make_run_incomplete() {
        let mut report = RunReport::new(1);
        report.stored = 1;
        report.subregion_cell = Some("w045s30".parse().unwrap());
        report.missing_subtiles.push(TileId::encode(-29.5, -44.5).unwrap());

        assert!(report.all_committed());
        assert!(!report.is_complete());
        assert_eq!(
            report.to_string(),
            "1/1 tiles committed (1 stored, 0 cached), 0 failed, 1 sub-tiles of w045s30 missing"
        );
    }
}
