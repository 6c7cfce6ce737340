//! Sub-image downloads with retry, validation and cancellation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::provider::{AsyncHttpClient, ProviderError};

use super::config::PipelineConfig;
use super::error::CellError;
use super::grid::GridCell;

/// Check that a payload decodes to an image with a nonzero area.
async fn validate_payload(bytes: Vec<u8>) -> Result<Vec<u8>, String> {
    tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
        if image.width() == 0 || image.height() == 0 {
            return Err("image has zero area".to_string());
        }
        Ok(bytes)
    })
    .await
    .map_err(|e| format!("validation task failed: {}", e))?
}

/// Download one cell into `dest`, retrying timeouts, 503s and undecodable
/// payloads with linear backoff. Other HTTP errors fail at once.
pub(crate) async fn download_cell<C>(
    client: &C,
    url: &str,
    cell: &GridCell,
    dest: &Path,
    config: &PipelineConfig,
    token: &CancellationToken,
) -> Result<PathBuf, CellError>
where
    C: AsyncHttpClient,
{
    let (row, col) = (cell.row, cell.col);
    let mut last_error = CellError::Cancelled;

    for attempt in 1..=config.max_attempts {
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(CellError::Cancelled),
            result = tokio::time::timeout(config.request_timeout, client.get(url)) => {
                result.unwrap_or_else(|_| Err(ProviderError::Timeout(url.to_string())))
            }
        };

        match response {
            Ok(bytes) => match validate_payload(bytes).await {
                Ok(bytes) => {
                    tokio::fs::write(dest, &bytes)
                        .await
                        .map_err(|source| CellError::Io {
                            row,
                            col,
                            path: dest.to_path_buf(),
                            source,
                        })?;
                    debug!(row, col, attempt, bytes = bytes.len(), "Cell downloaded");
                    return Ok(dest.to_path_buf());
                }
                Err(message) => {
                    warn!(row, col, attempt, error = %message, "Cell payload is not a valid image");
                    last_error = CellError::InvalidImage {
                        row,
                        col,
                        attempts: attempt,
                        message,
                    };
                }
            },
            Err(e) if e.is_retryable() => {
                warn!(row, col, attempt, max_attempts = config.max_attempts, error = %e, "Cell download failed, will retry");
                last_error = CellError::Download {
                    row,
                    col,
                    attempts: attempt,
                    source: e,
                };
            }
            Err(e) => {
                warn!(row, col, attempt, error = %e, "Cell download failed permanently");
                return Err(CellError::Download {
                    row,
                    col,
                    attempts: attempt,
                    source: e,
                });
            }
        }

        if attempt < config.max_attempts {
            let wait = config.backoff(attempt);
            debug!(row, col, attempt, backoff_ms = wait.as_millis() as u64, "Backing off");
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(CellError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    Err(last_error)
}

/// Download every cell of a tile, at most `cell_concurrency` at a time.
///
/// Returns the cell files in the order the cells were given. The first cell
/// that fails stops the others; the caller owns cleanup of `work_dir`.
pub(crate) async fn download_grid<C>(
    client: Arc<C>,
    cells: Vec<(GridCell, String)>,
    work_dir: &Path,
    config: &PipelineConfig,
    token: &CancellationToken,
) -> Result<Vec<PathBuf>, CellError>
where
    C: AsyncHttpClient + 'static,
{
    if token.is_cancelled() {
        return Err(CellError::Cancelled);
    }

    let grid_token = token.child_token();
    let semaphore = Arc::new(Semaphore::new(config.cell_concurrency));
    let mut results: Vec<Option<PathBuf>> = vec![None; cells.len()];
    let mut tasks = JoinSet::new();

    for (index, (cell, url)) in cells.into_iter().enumerate() {
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        let token = grid_token.clone();
        let config = config.clone();
        let dest = work_dir.join(format!("cell_{}_{}.img", cell.row, cell.col));

        tasks.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = token.cancelled() => return (index, Err(CellError::Cancelled)),
                permit = semaphore.acquire_owned() => permit,
            };
            let Ok(_permit) = permit else {
                return (index, Err(CellError::Cancelled));
            };
            let result = download_cell(client.as_ref(), &url, &cell, &dest, &config, &token).await;
            (index, result)
        });
    }

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => {
                debug!("Grid download cancelled - aborting remaining cells");
                tasks.abort_all();
                return Err(CellError::Cancelled);
            }

            joined = tasks.join_next() => match joined {
                Some(Ok((index, Ok(path)))) => results[index] = Some(path),
                Some(Ok((_, Err(e)))) => {
                    grid_token.cancel();
                    tasks.abort_all();
                    return Err(e);
                }
                Some(Err(join_err)) => {
                    grid_token.cancel();
                    tasks.abort_all();
                    return Err(CellError::TaskFailed(join_err.to_string()));
                }
                None => break,
            },
        }
    }

    results
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(CellError::Cancelled)
}
