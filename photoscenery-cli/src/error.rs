//! CLI errors and exit codes.

use std::fmt;
use std::process;

use photoscenery::config::ConfigFileError;
use photoscenery::orchestrator::OrchestratorError;
use photoscenery::provider::ProviderError;
use photoscenery::store::StoreError;

/// Exit code for a run that finished with tiles missing.
pub const EXIT_INCOMPLETE: i32 = 2;

#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file or catalog problem
    Config(ConfigFileError),
    /// Bad command-line value
    InvalidArgument(String),
    /// HTTP client could not be built
    Client(ProviderError),
    /// The run could not start
    Run(OrchestratorError),
    /// Store query or removal failed
    Store(StoreError),
    /// The run finished without committing every tile, or left sub-tiles
    /// of a sub-degree region's cell missing
    Incomplete {
        committed: usize,
        total: usize,
        missing_subtiles: usize,
    },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Incomplete { .. } => EXIT_INCOMPLETE,
            _ => 1,
        }
    }

    /// Exit the process with an error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Run(OrchestratorError::Store(_)) => {
                eprintln!();
                eprintln!("Check that the output root exists and is writable,");
                eprintln!("or choose another one with --output.");
            }
            CliError::Incomplete { .. } => {
                eprintln!();
                eprintln!("Run the same command again to retry the missing tiles.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Run(e) => write!(f, "Run failed: {}", e),
            CliError::Store(e) => write!(f, "Store error: {}", e),
            CliError::Incomplete {
                committed,
                total,
                missing_subtiles,
            } => {
                if committed < total {
                    write!(f, "Only {} of {} tiles committed", committed, total)
                } else {
                    write!(
                        f,
                        "All {} tiles committed, but {} sub-tiles of the cell are missing",
                        total, missing_subtiles
                    )
                }
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Run(e) => Some(e),
            CliError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<OrchestratorError> for CliError {
    fn from(e: OrchestratorError) -> Self {
        CliError::Run(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::Incomplete {
                committed: 3,
                total: 5,
                missing_subtiles: 0,
            }
            .exit_code(),
            EXIT_INCOMPLETE
        );
        assert_eq!(CliError::InvalidArgument("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_incomplete_cell_message() {
        let e = CliError::Incomplete {
            committed: 4,
            total: 4,
            missing_subtiles: 28,
        };
        assert_eq!(e.exit_code(), EXIT_INCOMPLETE);
        assert_eq!(
            e.to_string(),
            "All 4 tiles committed, but 28 sub-tiles of the cell are missing"
        );
    }

    #[test]
    fn test_messages() {
        let e = CliError::Config(ConfigFileError::UnknownServer(9));
        assert_eq!(e.to_string(), "Configuration error: Unknown map server id 9");
    }
}
