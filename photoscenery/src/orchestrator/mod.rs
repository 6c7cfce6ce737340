//! Region runs.
//!
//! An [`Orchestrator`] plans a region, then feeds the tiles nearest-first
//! through a [`FetchPipeline`](crate::pipeline::FetchPipeline). Tiles are
//! fetched one at a time by default; each tile's sub-images are still
//! downloaded in parallel inside the pipeline. A tile failure never stops
//! the run; it is listed in the [`RunReport`].
//!
//! ```no_run
//! use photoscenery::config::ConfigFile;
//! use photoscenery::coord::GeoPoint;
//! use photoscenery::orchestrator::{Orchestrator, OrchestratorConfig};
//! use photoscenery::pipeline::{FetchPipeline, RasterCodec};
//! use photoscenery::planner::{PlannerConfig, RegionQuery};
//! use photoscenery::provider::AsyncReqwestClient;
//! use photoscenery::store::TileStore;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigFile::default();
//! let server = config.servers.require(1)?.clone();
//! let client = AsyncReqwestClient::new(&config.client_options(&server))?;
//! let pipeline = FetchPipeline::new(
//!     client,
//!     RasterCodec::new(),
//!     server,
//!     TileStore::new("/tmp/scenery"),
//!     config.pipeline_config(),
//! );
//! let orchestrator = Orchestrator::new(pipeline, PlannerConfig::default(), OrchestratorConfig::default());
//!
//! let region = RegionQuery::polar(GeoPoint::new(45.63, 8.72)?, 10.0)?;
//! let report = orchestrator.run(&region).await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod position;
mod report;
mod runner;
mod state;

pub use config::OrchestratorConfig;
pub use error::OrchestratorError;
pub use position::{FixedPosition, PositionSource, WatchPosition};
pub use report::{RunReport, TileFailure};
pub use runner::Orchestrator;
pub use state::{TileState, TileStateTable};
