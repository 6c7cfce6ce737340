//! Drives a tile plan through the fetch pipeline.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::pipeline::{FetchOutcome, FetchPipeline, ImageCodec, RasterCodec};
use crate::planner::{NormalizedRegion, PlannerConfig, RegionPlanner, RegionQuery, TilePlan, TileWorkItem};
use crate::provider::AsyncHttpClient;
use crate::tile::{CellName, TileId};

use super::config::OrchestratorConfig;
use super::error::OrchestratorError;
use super::position::{FixedPosition, PositionSource};
use super::report::{RunReport, TileFailure};
use super::state::{TileState, TileStateTable};

enum TileResult {
    Stored,
    Cached,
    Failed(TileFailure),
    Cancelled,
}

/// Runs region requests tile by tile, nearest first.
///
/// All mutable run state lives here rather than in globals, so separate
/// instances never interfere:
///
/// - a per-tile failure counter and the state table, shared by the tiles in
///   flight
/// - the cancellation handle of the run in progress
/// - the size downgrade, bumped after every run that leaves tiles missing
///   and applied to the next plan
pub struct Orchestrator<C, K = RasterCodec> {
    pipeline: FetchPipeline<C, K>,
    planner: RegionPlanner,
    config: OrchestratorConfig,
    position: Arc<dyn PositionSource>,
    states: TileStateTable,
    attempts: Mutex<HashMap<TileId, u32>>,
    current: Mutex<Option<CancellationToken>>,
    downgrade: AtomicU32,
}

impl<C, K> Orchestrator<C, K>
where
    C: AsyncHttpClient + 'static,
    K: ImageCodec,
{
    pub fn new(pipeline: FetchPipeline<C, K>, planner: PlannerConfig, config: OrchestratorConfig) -> Self {
        Self {
            pipeline,
            planner: planner.planner(),
            config,
            position: Arc::new(FixedPosition::none()),
            states: TileStateTable::new(),
            attempts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            downgrade: AtomicU32::new(planner.downgrade),
        }
    }

    /// Follow a live focal point instead of the region centre.
    pub fn with_position(mut self, source: impl PositionSource + 'static) -> Self {
        self.position = Arc::new(source);
        self
    }

    pub fn pipeline(&self) -> &FetchPipeline<C, K> {
        &self.pipeline
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Tiers currently subtracted from the requested sizes.
    pub fn downgrade(&self) -> u32 {
        self.downgrade.load(Ordering::SeqCst)
    }

    /// State of a tile in the current or last run.
    pub fn state_of(&self, id: TileId) -> Option<TileState> {
        self.states.get(id)
    }

    /// Failures recorded for `id` by this orchestrator.
    pub fn attempts_for(&self, id: TileId) -> u32 {
        self.attempts.lock().get(&id).copied().unwrap_or(0)
    }

    /// Cancel the run in progress. Returns false if nothing was running.
    pub fn cancel(&self) -> bool {
        match self.current.lock().as_ref() {
            Some(token) => {
                info!("Cancelling run");
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Plan `query` against the latest position and current downgrade.
    pub fn plan(&self, query: &RegionQuery) -> Result<TilePlan, OrchestratorError> {
        let region = query.normalize()?;
        Ok(self
            .planner
            .plan(&region, self.position.latest(), self.downgrade()))
    }

    /// Plan and fetch every tile of `query`.
    pub async fn run(&self, query: &RegionQuery) -> Result<RunReport, OrchestratorError> {
        let plan = self.plan(query)?;
        self.run_plan(plan).await
    }

    /// Fetch every tile of an existing plan.
    ///
    /// Fails only if the output root is unusable; tile failures are
    /// collected in the report.
    #[instrument(skip_all, fields(tiles = plan.len(), subregion = plan.is_subregion))]
    pub async fn run_plan(&self, plan: TilePlan) -> Result<RunReport, OrchestratorError> {
        let store = self.pipeline.store().clone();
        tokio::task::spawn_blocking(move || store.ensure_writable())
            .await
            .map_err(|e| OrchestratorError::TaskFailed(e.to_string()))??;

        let token = CancellationToken::new();
        *self.current.lock() = Some(token.clone());

        let downgrade = self.downgrade();
        let mut report = RunReport::new(plan.len());
        self.states.reset(plan.ids());
        info!(
            tiles = plan.len(),
            skipped = plan.skipped,
            downgrade,
            server = %self.pipeline.server(),
            "Starting run"
        );

        let subregion_cell = plan.completeness_cell();
        let cells: BTreeSet<CellName> = plan
            .items
            .iter()
            .filter_map(|item| CellName::new(item.id.lat_base(), item.id.lon_base()).ok())
            .collect();

        let region = plan.region;
        let region = &region;
        let token_ref = &token;
        let mut results = stream::iter(plan.items)
            .map(move |item| self.fetch_one(item, region, downgrade, token_ref))
            .buffer_unordered(self.config.tile_concurrency);

        while let Some(result) = results.next().await {
            match result {
                TileResult::Stored => report.stored += 1,
                TileResult::Cached => report.cached += 1,
                TileResult::Failed(failure) => report.failures.push(failure),
                TileResult::Cancelled => {}
            }
        }
        drop(results);

        report.cancelled = token.is_cancelled();
        self.current.lock().take();

        if self.config.prune && !report.cancelled {
            report.pruned = self.prune(cells).await;
        }

        if let (Some(cell), false) = (subregion_cell, report.cancelled) {
            report.subregion_cell = Some(cell);
            report.missing_subtiles = self.missing_subtiles(cell).await?;
            if !report.missing_subtiles.is_empty() {
                info!(
                    cell = %cell,
                    missing = report.missing_subtiles.len(),
                    "Sub-degree region: cell not yet complete"
                );
            }
        }

        if !report.all_committed() && !report.cancelled {
            let level = self.downgrade.fetch_add(1, Ordering::SeqCst) + 1;
            warn!(
                downgrade = level,
                missing = report.total - report.success_count(),
                "Region incomplete, lowering size tiers for the next run"
            );
        }

        info!(%report, "Run finished");
        Ok(report)
    }

    async fn fetch_one(
        &self,
        item: TileWorkItem,
        region: &NormalizedRegion,
        downgrade: u32,
        token: &CancellationToken,
    ) -> TileResult {
        if token.is_cancelled() {
            self.states.advance(item.id, TileState::Cancelled);
            return TileResult::Cancelled;
        }

        // Tiers follow the focal point as it moves; committed tiles are not revisited
        let item = self
            .planner
            .retier(&item, region, self.position.latest(), downgrade);
        let id = item.id;
        let states = &self.states;

        let outcome = self
            .pipeline
            .fetch_observed(&item, token, |stage| {
                states.advance(id, stage.into());
            })
            .await;

        match outcome {
            Ok(FetchOutcome::Cached(_)) => {
                states.advance(id, TileState::Cached);
                TileResult::Cached
            }
            Ok(FetchOutcome::Stored(_)) => {
                states.advance(id, TileState::Stored);
                TileResult::Stored
            }
            Err(e) if e.is_cancelled() => {
                states.advance(id, TileState::Cancelled);
                debug!(tile = %id, "Tile cancelled");
                TileResult::Cancelled
            }
            Err(e) => {
                states.advance(id, TileState::Failed);
                let attempts = {
                    let mut attempts = self.attempts.lock();
                    let count = attempts.entry(id).or_insert(0);
                    *count += 1;
                    *count
                };
                warn!(tile = %id, tier = item.tier, attempts, error = %e, "Tile failed");
                TileResult::Failed(TileFailure {
                    id,
                    tier: item.tier,
                    attempts,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Sub-tiles of `cell` without an artifact in the output format.
    async fn missing_subtiles(&self, cell: CellName) -> Result<Vec<TileId>, OrchestratorError> {
        let store = self.pipeline.store().clone();
        let format = self.pipeline.config().output.artifact();
        tokio::task::spawn_blocking(move || store.missing_subtiles(cell, format))
            .await
            .map_err(|e| OrchestratorError::TaskFailed(e.to_string()))?
            .map_err(OrchestratorError::from)
    }

    /// Remove stray artifacts from `cells`. Errors are logged, not returned.
    async fn prune(&self, cells: BTreeSet<CellName>) -> usize {
        let store = self.pipeline.store().clone();
        let pruned = tokio::task::spawn_blocking(move || {
            let mut removed = 0;
            for cell in cells {
                match store.prune_cell(cell) {
                    Ok(paths) => removed += paths.len(),
                    Err(e) => warn!(cell = %cell, error = %e, "Prune failed"),
                }
            }
            removed
        })
        .await;

        pruned.unwrap_or_else(|e| {
            warn!(error = %e, "Prune task failed");
            0
        })
    }
}
