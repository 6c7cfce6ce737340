//! End-to-end region runs against an in-memory map server.
//!
//! Covers:
//! - idempotent reruns (no network traffic, everything cached)
//! - DDS artifacts with the planned pixel size
//! - all-or-nothing failure handling with scratch cleanup
//! - recovery from throttling (HTTP 503)
//! - cancellation leaving nothing at canonical paths
//! - the check/remove surface over the resulting store

use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;
use photoscenery::coord::GeoPoint;
use photoscenery::dds::DdsFormat;
use photoscenery::orchestrator::{Orchestrator, OrchestratorConfig, TileState};
use photoscenery::pipeline::{FetchPipeline, OutputFormat, PipelineConfig, RasterCodec};
use photoscenery::planner::{PlannerConfig, RegionQuery};
use photoscenery::provider::{AsyncHttpClient, MapServer, ProviderError};
use photoscenery::store::{ArtifactFormat, TileStore};
use photoscenery::tile::CellName;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Map server stand-in that renders an image of the requested size.
#[derive(Clone, Default)]
struct RenderingClient {
    requests: Arc<AtomicUsize>,
    /// Requests whose URL contains this text fail with HTTP 404
    fail_containing: Option<String>,
    /// Answer each URL's first request with HTTP 503
    throttle_first: bool,
    seen: Arc<Mutex<HashSet<String>>>,
    delay: Duration,
}

impl RenderingClient {
    fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn requested_size(url: &str) -> Option<(u32, u32)> {
    let rest = &url[url.find("size=")? + 5..];
    let end = rest.find('&').unwrap_or(rest.len());
    let (w, h) = rest[..end].split_once(',')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn render(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

impl AsyncHttpClient for RenderingClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self
            .fail_containing
            .as_deref()
            .is_some_and(|needle| url.contains(needle))
        {
            return Err(ProviderError::Status {
                status: 404,
                url: url.to_string(),
            });
        }
        if self.throttle_first && self.seen.lock().insert(url.to_string()) {
            return Err(ProviderError::Status {
                status: 503,
                url: url.to_string(),
            });
        }

        let (w, h) = requested_size(url)
            .ok_or_else(|| ProviderError::InvalidResponse(format!("no size in {}", url)))?;
        let format = if url.contains("format=jpg") {
            ImageFormat::Jpeg
        } else {
            ImageFormat::Png
        };
        Ok(render(w, h, format))
    }
}

fn server() -> MapServer {
    MapServer::new(
        1,
        "local",
        "http://wms.local/export",
        "?bbox={lonLL},{latLL},{lonUR},{latUR}|size={szWidth},{szHight}|format=png",
    )
}

fn orchestrator(
    client: RenderingClient,
    root: &Path,
    output: OutputFormat,
    size: u8,
) -> Orchestrator<RenderingClient> {
    let pipeline = FetchPipeline::new(
        client,
        RasterCodec::new(),
        server(),
        TileStore::new(root),
        PipelineConfig::default()
            .with_output(output)
            .with_backoff_step(Duration::from_millis(1)),
    );
    Orchestrator::new(
        pipeline,
        PlannerConfig::default().with_size(size).with_size_down(0),
        OrchestratorConfig::default(),
    )
}

/// A few tiles, all inside the w045s30 cell.
fn region() -> RegionQuery {
    RegionQuery::polar(GeoPoint::new(-29.6, -44.6).unwrap(), 3.0).unwrap()
}

fn tmp_is_empty(store: &TileStore) -> bool {
    match std::fs::read_dir(store.temp_dir()) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_second_run_is_fully_cached() {
    let dir = TempDir::new().unwrap();
    let client = RenderingClient::default();
    let orch = orchestrator(
        client.clone(),
        dir.path(),
        OutputFormat::Dds(DdsFormat::BC3),
        0,
    );

    let first = orch.run(&region()).await.unwrap();
    assert!(first.total > 1);
    assert!(first.all_committed(), "{}", first);
    assert_eq!(first.stored, first.total);
    let requests = client.request_count();

    let second = orch.run(&region()).await.unwrap();
    assert_eq!(second.cached, second.total);
    assert_eq!(second.stored, 0);
    assert_eq!(client.request_count(), requests);
    assert!(tmp_is_empty(orch.pipeline().store()));
}

#[tokio::test]
async fn test_dds_artifacts_have_planned_size() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(
        RenderingClient::default(),
        dir.path(),
        OutputFormat::Dds(DdsFormat::BC1),
        0,
    );
    let plan = orch.plan(&region()).unwrap();
    let report = orch.run_plan(plan.clone()).await.unwrap();
    assert!(report.all_committed());

    let store = orch.pipeline().store();
    for item in &plan.items {
        let tile = store.stored(item.id, ArtifactFormat::Dds).unwrap().unwrap();
        assert_eq!((tile.pixel_w, tile.pixel_h), (512, 256));
        assert_eq!(tile.path, store.path_for(item.id, ArtifactFormat::Dds));
        assert!(tile
            .path
            .starts_with(dir.path().join("Orthophotos/w050s30/w045s30")));
    }
}

#[tokio::test]
async fn test_failed_tile_leaves_nothing_behind() {
    let dir = TempDir::new().unwrap();
    let planner = orchestrator(RenderingClient::default(), dir.path(), OutputFormat::Png, 0);
    let plan = planner.plan(&region()).unwrap();
    assert!(plan.len() > 1);
    let doomed = plan.items[0].clone();

    let client = RenderingClient {
        fail_containing: Some(format!(
            "bbox={:.6},{:.6}",
            doomed.bounds.lon_min, doomed.bounds.lat_min
        )),
        ..RenderingClient::default()
    };
    let orch = orchestrator(client, dir.path(), OutputFormat::Png, 0);
    let report = orch.run_plan(plan.clone()).await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, doomed.id);
    assert_eq!(report.success_count(), plan.len() - 1);
    assert_eq!(orch.state_of(doomed.id), Some(TileState::Failed));

    let store = orch.pipeline().store();
    assert!(!store.exists(doomed.id, ArtifactFormat::Png));
    assert!(tmp_is_empty(store));
    assert_eq!(orch.downgrade(), 1);
}

#[tokio::test]
async fn test_throttled_requests_are_retried() {
    let dir = TempDir::new().unwrap();
    let client = RenderingClient {
        throttle_first: true,
        ..RenderingClient::default()
    };
    let orch = orchestrator(client.clone(), dir.path(), OutputFormat::Png, 0);

    let report = orch.run(&region()).await.unwrap();
    assert!(report.all_committed(), "{}", report);
    assert_eq!(client.request_count(), 2 * report.total);
}

#[tokio::test]
async fn test_cancel_leaves_no_canonical_files() {
    let dir = TempDir::new().unwrap();
    let client = RenderingClient {
        delay: Duration::from_secs(30),
        ..RenderingClient::default()
    };
    let orch = orchestrator(client.clone(), dir.path(), OutputFormat::Png, 0);
    let plan = orch.plan(&region()).unwrap();

    let (report, _) = tokio::join!(orch.run_plan(plan.clone()), async {
        while client.request_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        orch.cancel();
    });

    let report = report.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.success_count(), 0);

    let store = orch.pipeline().store();
    for id in plan.ids() {
        assert!(!store.exists(id, ArtifactFormat::Png));
    }
    assert!(tmp_is_empty(store));
}

#[tokio::test]
async fn test_check_and_remove_after_run() {
    let dir = TempDir::new().unwrap();
    let box_query = RegionQuery::bounding_box(
        GeoPoint::new(-30.0, -45.0).unwrap(),
        GeoPoint::new(-29.8, -44.6).unwrap(),
    )
    .unwrap();
    let orch = orchestrator(RenderingClient::default(), dir.path(), OutputFormat::Png, 0);
    let report = orch.run(&box_query).await.unwrap();
    assert!(report.all_committed());

    let store = orch.pipeline().store();
    let cell: CellName = "w045s30".parse().unwrap();
    let checked = store.check(&[cell]).unwrap();
    assert!(checked[0].present);
    assert_eq!(checked[0].tiles.len(), report.total);
    assert!(checked[0]
        .tiles
        .iter()
        .all(|tile| cell.bounds().contains(tile.bounds().lat_min, tile.bounds().lon_min)));

    let removed = store.remove(cell, &[]).unwrap();
    assert_eq!(removed, report.total);
    assert!(!store.cell_dir(cell).exists());
}
