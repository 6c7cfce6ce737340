//! Settings structs, one per INI section.

use std::path::PathBuf;
use std::time::Duration;

use crate::orchestrator::OrchestratorConfig;
use crate::pipeline::{OutputFormat, PipelineConfig};
use crate::planner::PlannerConfig;
use crate::provider::{ClientOptions, MapServer};

use super::catalog::MapServerCatalog;
use super::defaults::*;

/// `[output]`
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub root: PathBuf,
    pub format: OutputFormat,
    /// Mipmap levels for DDS output; `None` builds the full chain
    pub mipmap_count: Option<usize>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            format: OutputFormat::default(),
            mipmap_count: None,
        }
    }
}

/// `[download]`
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub cell_concurrency: usize,
    pub max_attempts: u32,
    /// Linear backoff unit, seconds
    pub backoff_secs: u64,
    /// Per-request timeout, seconds
    pub timeout_secs: u64,
    pub proxy: Option<String>,
    pub referer: String,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            cell_concurrency: default_cell_concurrency(),
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
            timeout_secs: default_timeout_secs(),
            proxy: None,
            referer: DEFAULT_REFERER.to_string(),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

/// Everything read from `config.ini`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub output: OutputSettings,
    pub download: DownloadSettings,
    pub planner: PlannerConfig,
    pub run: OrchestratorConfig,
    pub logging: LoggingSettings,
    /// Server used when a run does not name one
    pub server_id: u32,
    pub servers: MapServerCatalog,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            output: OutputSettings::default(),
            download: DownloadSettings::default(),
            planner: PlannerConfig::default()
                .with_size(DEFAULT_SIZE)
                .with_size_down(DEFAULT_SIZE_DOWN),
            run: OrchestratorConfig::default(),
            logging: LoggingSettings::default(),
            server_id: DEFAULT_SERVER_ID,
            servers: MapServerCatalog::builtin(),
        }
    }
}

impl ConfigFile {
    /// Download and output settings for the fetch pipeline. The mipmap
    /// count belongs to the codec, see [`OutputSettings::mipmap_count`].
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_cell_concurrency(self.download.cell_concurrency)
            .with_max_attempts(self.download.max_attempts)
            .with_backoff_step(secs(self.download.backoff_secs))
            .with_request_timeout(secs(self.download.timeout_secs))
            .with_output(self.output.format)
    }

    /// HTTP client options for `server`; a proxy on the server wins over the
    /// `[download]` one.
    pub fn client_options(&self, server: &MapServer) -> ClientOptions {
        let proxy = server.proxy.clone().or_else(|| self.download.proxy.clone());
        ClientOptions::default()
            .with_timeout(Duration::from_secs(self.download.timeout_secs))
            .with_referer(self.download.referer.clone())
            .with_proxy(proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_from_settings() {
        let mut config = ConfigFile::default();
        config.download.max_attempts = 3;
        config.download.backoff_secs = 1;
        config.output.format = OutputFormat::Png;

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.max_attempts, 3);
        assert_eq!(pipeline.backoff_step, Duration::from_secs(1));
        assert_eq!(pipeline.output, OutputFormat::Png);
        assert_eq!(pipeline.cell_concurrency, 4);
    }

    #[test]
    fn test_server_proxy_overrides_download_proxy() {
        let mut config = ConfigFile::default();
        config.download.proxy = Some("http://global:3128".to_string());

        let plain = MapServer::new(9, "plain", "http://h/", "?");
        assert_eq!(
            config.client_options(&plain).proxy.as_deref(),
            Some("http://global:3128")
        );

        let proxied = plain.with_proxy(Some("http://local:8080".to_string()));
        assert_eq!(
            config.client_options(&proxied).proxy.as_deref(),
            Some("http://local:8080")
        );
    }
}
