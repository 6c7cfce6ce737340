//! User configuration.
//!
//! Settings come from `~/.photoscenery/config.ini` when it exists, with
//! defaults for everything it leaves out. Map servers are `[server.<id>]`
//! sections in the same file or in a standalone catalog. Configuration is
//! never written back.
//!
//! ```ini
//! [output]
//! root = ~/Photoscenery
//! format = 1
//! compression = bc3
//!
//! [download]
//! concurrency = 4
//! max_attempts = 5
//! backoff = 5
//! timeout = 30
//!
//! [planner]
//! size = 2
//! size_down = 0
//!
//! [run]
//! tile_concurrency = 1
//! prune = true
//! server = 1
//! ```

mod catalog;
mod defaults;
mod file;
mod parser;
mod settings;

pub use catalog::MapServerCatalog;
pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, DownloadSettings, LoggingSettings, OutputSettings};
