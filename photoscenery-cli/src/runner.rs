//! Shared setup for every command: configuration, logging and wiring.

use std::path::PathBuf;

use tracing::info;

use photoscenery::config::{ConfigFile, MapServerCatalog};
use photoscenery::logging::{init_logging, LoggingGuard};
use photoscenery::orchestrator::Orchestrator;
use photoscenery::pipeline::{FetchPipeline, RasterCodec};
use photoscenery::provider::AsyncReqwestClient;
use photoscenery::store::TileStore;

use crate::error::CliError;

/// Options accepted by every command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GlobalArgs {
    /// Configuration file [default: ~/.photoscenery/config.ini]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Extra map server catalog (INI with [server.<id>] sections)
    #[arg(long, global = true)]
    pub servers: Option<PathBuf>,

    /// Output root holding the Orthophotos directory
    #[arg(short = 'o', long, global = true)]
    pub output: Option<PathBuf>,
}

/// Loaded configuration plus the logging guard.
pub struct CliRunner {
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    pub fn new(args: &GlobalArgs) -> Result<Self, CliError> {
        let mut config = match &args.config {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };
        if let Some(path) = &args.servers {
            let catalog = MapServerCatalog::load_from(path)?;
            for server in catalog.iter() {
                config.servers.insert(server.clone());
            }
        }
        if let Some(root) = &args.output {
            config.output.root = root.clone();
        }

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = photoscenery::VERSION,
            command,
            root = %self.config.output.root.display(),
            "Photoscenery starting"
        );
    }

    pub fn store(&self) -> TileStore {
        TileStore::new(self.config.output.root.clone())
    }

    /// Wire an orchestrator for the configured server, planner and run settings.
    pub fn orchestrator(&self) -> Result<Orchestrator<AsyncReqwestClient>, CliError> {
        let server = self.config.servers.require(self.config.server_id)?.clone();
        server
            .validate()
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        let client = AsyncReqwestClient::new(&self.config.client_options(&server))
            .map_err(CliError::Client)?;
        info!(server = %server, "Using map server");

        let pipeline = FetchPipeline::new(
            client,
            RasterCodec::new().with_mipmap_count(self.config.output.mipmap_count),
            server,
            self.store(),
            self.config.pipeline_config(),
        );
        Ok(Orchestrator::new(
            pipeline,
            self.config.planner,
            self.config.run,
        ))
    }
}
