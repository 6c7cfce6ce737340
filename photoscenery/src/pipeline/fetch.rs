//! Per-tile fetch: cache check, download, compose, encode, commit.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::planner::TileWorkItem;
use crate::provider::{AsyncHttpClient, MapServer};
use crate::store::{StoredTile, TileStore};

use super::codec::{ImageCodec, RasterCodec};
use super::config::PipelineConfig;
use super::download::download_grid;
use super::error::TileFetchError;
use super::grid::plan_cells;

/// Result of a successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The artifact was already in the store; nothing was downloaded
    Cached(StoredTile),
    /// The tile was downloaded and committed by this call
    Stored(StoredTile),
}

impl FetchOutcome {
    pub fn tile(&self) -> &StoredTile {
        match self {
            FetchOutcome::Cached(tile) | FetchOutcome::Stored(tile) => tile,
        }
    }

    pub fn was_cached(&self) -> bool {
        matches!(self, FetchOutcome::Cached(_))
    }
}

/// Progress points reported while a tile is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Downloading,
    Assembled,
    Encoded,
}

/// Scratch directory removed on drop, whatever the outcome.
struct WorkDir(PathBuf);

impl WorkDir {
    async fn create(path: PathBuf) -> Result<Self, TileFetchError> {
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| TileFetchError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self(path))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.0) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(dir = %self.0.display(), error = %e, "Failed to clean up work directory"),
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T, TileFetchError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TileFetchError::TaskFailed(e.to_string()))
}

/// Builds tile artifacts from a map server into a [`TileStore`].
///
/// A fetch is idempotent: a tile already present in the store is returned
/// as [`FetchOutcome::Cached`] without any network traffic. Otherwise all
/// sub-images must succeed before anything is written to the canonical
/// path, and the scratch files are always removed.
pub struct FetchPipeline<C, K = RasterCodec> {
    client: Arc<C>,
    codec: Arc<K>,
    server: Arc<MapServer>,
    store: TileStore,
    config: PipelineConfig,
}

impl<C, K> FetchPipeline<C, K>
where
    C: AsyncHttpClient + 'static,
    K: ImageCodec,
{
    pub fn new(
        client: C,
        codec: K,
        server: MapServer,
        store: TileStore,
        config: PipelineConfig,
    ) -> Self {
        Self {
            client: Arc::new(client),
            codec: Arc::new(codec),
            server: Arc::new(server),
            store,
            config,
        }
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    pub fn server(&self) -> &MapServer {
        &self.server
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch one tile.
    pub async fn fetch(
        &self,
        item: &TileWorkItem,
        token: &CancellationToken,
    ) -> Result<FetchOutcome, TileFetchError> {
        self.fetch_observed(item, token, |_| {}).await
    }

    /// Fetch one tile, reporting each completed stage to `observe`.
    #[instrument(skip_all, fields(tile = %item.id, resolution = %item.resolution))]
    pub async fn fetch_observed<F>(
        &self,
        item: &TileWorkItem,
        token: &CancellationToken,
        observe: F,
    ) -> Result<FetchOutcome, TileFetchError>
    where
        F: Fn(FetchStage) + Send + Sync,
    {
        let output = self.config.output;
        let artifact = output.artifact();

        match self.store.stored(item.id, artifact) {
            Ok(Some(tile)) => {
                debug!(path = %tile.path.display(), "Tile already stored");
                return Ok(FetchOutcome::Cached(tile));
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Stored artifact is unreadable, fetching again"),
        }
        if token.is_cancelled() {
            return Err(TileFetchError::Cancelled);
        }

        let requests = plan_cells(item)
            .into_iter()
            .map(|cell| Ok((cell, self.server.request_url(&cell.request)?)))
            .collect::<Result<Vec<_>, TileFetchError>>()?;

        let work = WorkDir::create(self.store.work_dir(item.id)).await?;
        observe(FetchStage::Downloading);
        debug!(cells = requests.len(), "Downloading sub-images");
        let cells = download_grid(
            Arc::clone(&self.client),
            requests,
            work.path(),
            &self.config,
            token,
        )
        .await?;

        let codec = Arc::clone(&self.codec);
        let (grid, cell_w, cell_h) = (
            item.grid_size(),
            item.resolution.cell_w(),
            item.resolution.cell_h(),
        );
        let mosaic = blocking(move || codec.compose(&cells, grid, cell_w, cell_h)).await??;
        let (actual_w, actual_h) = mosaic.dimensions();
        if (actual_w, actual_h) != (item.pixel_w(), item.pixel_h()) {
            return Err(TileFetchError::DimensionMismatch {
                expected_w: item.pixel_w(),
                expected_h: item.pixel_h(),
                actual_w,
                actual_h,
            });
        }
        observe(FetchStage::Assembled);
        if token.is_cancelled() {
            return Err(TileFetchError::Cancelled);
        }

        let codec = Arc::clone(&self.codec);
        let bytes = blocking(move || codec.encode(&mosaic, output)).await??;
        observe(FetchStage::Encoded);

        let encoded = work
            .path()
            .join(format!("{}.{}", item.id, output.extension()));
        tokio::fs::write(&encoded, &bytes)
            .await
            .map_err(|source| TileFetchError::Io {
                path: encoded.clone(),
                source,
            })?;
        if token.is_cancelled() {
            return Err(TileFetchError::Cancelled);
        }

        let store = self.store.clone();
        let id = item.id;
        let stored = blocking(move || store.commit(&encoded, id, artifact)).await??;
        info!(
            path = %stored.path.display(),
            bytes = stored.byte_size,
            "Tile stored"
        );
        Ok(FetchOutcome::Stored(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dds::DdsFormat;
    use crate::pipeline::codec::{CodecError, OutputFormat};
    use crate::planner::TileResolution;
    use crate::provider::{MockAsyncHttpClient, ProviderError};
    use crate::store::ArtifactFormat;
    use crate::tile::TileId;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::time::Duration;
    use tempfile::TempDir;

    fn server() -> MapServer {
        MapServer::new(
            1,
            "test",
            "http://tiles.test/wms",
            "?bbox={lonLL},{latLL},{lonUR},{latUR}|size={szWidth},{szHight}|format=png",
        )
    }

    fn png(w: u32, h: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbaImage::from_pixel(w, h, Rgba([30, 90, 30, 255]))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn item() -> TileWorkItem {
        let id = TileId::encode(-29.9, -44.9).unwrap();
        TileWorkItem {
            id,
            bounds: id.bounds(),
            distance_nm: 0.0,
            tier: 0,
            resolution: TileResolution::for_tier(0, -29.9),
        }
    }

    fn config(output: OutputFormat) -> PipelineConfig {
        PipelineConfig::default()
            .with_output(output)
            .with_backoff_step(Duration::from_millis(1))
    }

    /// Codec producing a fixed-size mosaic regardless of input.
    struct WrongSizeCodec;

    impl ImageCodec for WrongSizeCodec {
        fn compose(
            &self,
            _cells: &[PathBuf],
            _grid: u32,
            _cell_w: u32,
            _cell_h: u32,
        ) -> Result<RgbaImage, CodecError> {
            Ok(RgbaImage::new(3, 3))
        }

        fn encode(&self, _image: &RgbaImage, _format: OutputFormat) -> Result<Vec<u8>, CodecError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_fetch_stores_then_caches() {
        let dir = TempDir::new().unwrap();
        let store = TileStore::new(dir.path());
        store.ensure_writable().unwrap();
        let item = item();
        let client = MockAsyncHttpClient::always(Ok(png(item.pixel_w(), item.pixel_h())));
        let pipeline = FetchPipeline::new(
            client.clone(),
            RasterCodec::new(),
            server(),
            store.clone(),
            config(OutputFormat::Dds(DdsFormat::BC1)),
        );
        let token = CancellationToken::new();

        let first = pipeline.fetch(&item, &token).await.unwrap();
        assert!(!first.was_cached());
        assert_eq!(first.tile().pixel_w, item.pixel_w());
        assert!(store.exists(item.id, ArtifactFormat::Dds));
        assert!(!store.work_dir(item.id).exists());
        assert_eq!(client.request_count(), 1);

        let second = pipeline.fetch(&item, &token).await.unwrap();
        assert!(second.was_cached());
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_request_url_carries_bounds() {
        let dir = TempDir::new().unwrap();
        let item = item();
        let client = MockAsyncHttpClient::always(Ok(png(item.pixel_w(), item.pixel_h())));
        let pipeline = FetchPipeline::new(
            client.clone(),
            RasterCodec::new(),
            server(),
            TileStore::new(dir.path()),
            config(OutputFormat::Png),
        );
        pipeline
            .fetch(&item, &CancellationToken::new())
            .await
            .unwrap();
        let url = &client.urls()[0];
        assert!(url.starts_with("http://tiles.test/wms?bbox=-45.000000,-30.000000,-44.750000,-29.875000"));
        assert!(url.contains("&size=512,256&format=png"));
    }

    #[tokio::test]
    async fn test_failed_cell_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let store = TileStore::new(dir.path());
        let item = item();
        let client = MockAsyncHttpClient::always(Err(ProviderError::Status {
            status: 500,
            url: "u".into(),
        }));
        let pipeline = FetchPipeline::new(
            client,
            RasterCodec::new(),
            server(),
            store.clone(),
            config(OutputFormat::Png),
        );

        let err = pipeline
            .fetch(&item, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TileFetchError::Cell(_)));
        assert!(!store.exists(item.id, ArtifactFormat::Png));
        assert!(!store.work_dir(item.id).exists());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = TileStore::new(dir.path());
        let item = item();
        let pipeline = FetchPipeline::new(
            MockAsyncHttpClient::always(Ok(png(8, 8))),
            WrongSizeCodec,
            server(),
            store.clone(),
            config(OutputFormat::Png),
        );

        let err = pipeline
            .fetch(&item, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TileFetchError::DimensionMismatch {
                actual_w: 3,
                actual_h: 3,
                ..
            }
        ));
        assert!(!store.exists(item.id, ArtifactFormat::Png));
        assert!(!store.work_dir(item.id).exists());
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_download() {
        let dir = TempDir::new().unwrap();
        let item = item();
        let client = MockAsyncHttpClient::always(Ok(png(8, 8)));
        let pipeline = FetchPipeline::new(
            client.clone(),
            RasterCodec::new(),
            server(),
            TileStore::new(dir.path()),
            config(OutputFormat::Png),
        );
        let token = CancellationToken::new();
        token.cancel();

        let err = pipeline.fetch(&item, &token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_observer_sees_stages_in_order() {
        let dir = TempDir::new().unwrap();
        let item = item();
        let pipeline = FetchPipeline::new(
            MockAsyncHttpClient::always(Ok(png(item.pixel_w(), item.pixel_h()))),
            RasterCodec::new(),
            server(),
            TileStore::new(dir.path()),
            config(OutputFormat::Png),
        );
        let seen = parking_lot::Mutex::new(Vec::new());
        pipeline
            .fetch_observed(&item, &CancellationToken::new(), |stage| seen.lock().push(stage))
            .await
            .unwrap();
        assert_eq!(
            *seen.lock(),
            vec![FetchStage::Downloading, FetchStage::Assembled, FetchStage::Encoded]
        );
    }
}
