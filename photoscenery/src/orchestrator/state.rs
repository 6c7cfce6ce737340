//! Per-tile progress within one run.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use tracing::warn;

use crate::pipeline::FetchStage;
use crate::tile::TileId;

/// Where a tile is in its fetch.
///
/// ```text
/// Pending ─▶ Cached
///    └────▶ Fetching ─▶ Assembled ─▶ Encoded ─▶ Stored
///              └──────────┴─────────────┴────▶ Failed
/// ```
///
/// Any non-terminal state may also move to `Cancelled` when the run is
/// stopped; a cancelled tile is unfinished, not failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileState {
    Pending,
    Cached,
    Fetching,
    Assembled,
    Encoded,
    Stored,
    Failed,
    Cancelled,
}

impl TileState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TileState::Cached | TileState::Stored | TileState::Failed | TileState::Cancelled
        )
    }

    /// Whether the artifact is at its canonical path.
    pub fn is_committed(&self) -> bool {
        matches!(self, TileState::Cached | TileState::Stored)
    }

    pub fn can_transition_to(&self, next: TileState) -> bool {
        use TileState::*;
        if next == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Pending, Cached)
                | (Pending, Fetching)
                | (Pending, Failed)
                | (Fetching, Assembled)
                | (Fetching, Failed)
                | (Assembled, Encoded)
                | (Assembled, Failed)
                | (Encoded, Stored)
                | (Encoded, Failed)
        )
    }
}

impl From<FetchStage> for TileState {
    fn from(stage: FetchStage) -> Self {
        match stage {
            FetchStage::Downloading => TileState::Fetching,
            FetchStage::Assembled => TileState::Assembled,
            FetchStage::Encoded => TileState::Encoded,
        }
    }
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileState::Pending => "pending",
            TileState::Cached => "cached",
            TileState::Fetching => "fetching",
            TileState::Assembled => "assembled",
            TileState::Encoded => "encoded",
            TileState::Stored => "stored",
            TileState::Failed => "failed",
            TileState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Shared table of tile states for the current run.
#[derive(Debug, Default)]
pub struct TileStateTable {
    states: Mutex<HashMap<TileId, TileState>>,
}

impl TileStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run: forget the previous one, mark `ids` pending.
    pub fn reset(&self, ids: impl IntoIterator<Item = TileId>) {
        let mut states = self.states.lock();
        states.clear();
        states.extend(ids.into_iter().map(|id| (id, TileState::Pending)));
    }

    pub fn get(&self, id: TileId) -> Option<TileState> {
        self.states.lock().get(&id).copied()
    }

    /// Move `id` to `next`. Illegal moves are logged and ignored.
    pub fn advance(&self, id: TileId, next: TileState) -> bool {
        let mut states = self.states.lock();
        let Some(current) = states.get_mut(&id) else {
            warn!(tile = %id, state = %next, "State change for unplanned tile");
            return false;
        };
        if !current.can_transition_to(next) {
            warn!(tile = %id, from = %current, to = %next, "Illegal tile state change");
            return false;
        }
        *current = next;
        true
    }

    /// Number of tiles in each state.
    pub fn counts(&self) -> HashMap<TileState, usize> {
        let mut counts = HashMap::new();
        for state in self.states.lock().values() {
            *counts.entry(*state).or_insert(0) += 1;
        }
        counts
    }
}
