use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::tile::{subtile_ids, CellName, TileBounds, TileId};

use super::{ArtifactFormat, StoreError, StoredTile};

/// Directory under the output root that holds committed artifacts.
pub const ORTHOPHOTOS_DIR: &str = "Orthophotos";

/// Directory under the output root for in-progress work.
pub const TEMP_DIR: &str = ".tmp";

const WRITE_CHECK: &str = ".write-check";

/// Existence and contents of one 1° cell directory.
#[derive(Debug, Clone)]
pub struct CellReport {
    pub cell: CellName,
    pub present: bool,
    pub tiles: Vec<StoredTile>,
}

/// Addresses, reads and prunes tile artifacts under an output root.
#[derive(Debug, Clone)]
pub struct TileStore {
    root: PathBuf,
}

impl TileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn orthophotos_dir(&self) -> PathBuf {
        self.root.join(ORTHOPHOTOS_DIR)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR)
    }

    /// Scratch directory for one tile's cells and mosaic.
    pub fn work_dir(&self, id: TileId) -> PathBuf {
        self.temp_dir().join(id.to_string())
    }

    /// Create the store directories and prove a file can be written there.
    pub fn ensure_writable(&self) -> Result<(), StoreError> {
        let not_writable = |path: &Path, source: io::Error| StoreError::NotWritable {
            path: path.to_path_buf(),
            source,
        };
        for dir in [self.orthophotos_dir(), self.temp_dir()] {
            fs::create_dir_all(&dir).map_err(|e| not_writable(&dir, e))?;
        }
        let marker = self.temp_dir().join(WRITE_CHECK);
        fs::write(&marker, b"").map_err(|e| not_writable(&self.root, e))?;
        fs::remove_file(&marker).map_err(|e| not_writable(&self.root, e))?;
        Ok(())
    }

    pub fn cell_dir(&self, cell: CellName) -> PathBuf {
        self.orthophotos_dir().join(cell.folder_path())
    }

    /// Canonical path of a tile artifact.
    pub fn path_for(&self, id: TileId, format: ArtifactFormat) -> PathBuf {
        self.orthophotos_dir()
            .join(id.folder_path())
            .join(format!("{}.{}", id, format.extension()))
    }

    pub fn exists(&self, id: TileId, format: ArtifactFormat) -> bool {
        self.path_for(id, format).is_file()
    }

    /// The stored artifact for `id`, or `None` when nothing is committed.
    pub fn stored(
        &self,
        id: TileId,
        format: ArtifactFormat,
    ) -> Result<Option<StoredTile>, StoreError> {
        let path = self.path_for(id, format);
        if !path.is_file() {
            return Ok(None);
        }
        StoredTile::read(id, format, &path).map(Some)
    }

    /// Move a finished file into the canonical path for `id`.
    ///
    /// `source` must be on the same filesystem as the store (the temp
    /// directory is) so the rename is atomic.
    pub fn commit(
        &self,
        source: &Path,
        id: TileId,
        format: ArtifactFormat,
    ) -> Result<StoredTile, StoreError> {
        let target = self.path_for(id, format);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        fs::rename(source, &target).map_err(|e| StoreError::io(&target, e))?;
        debug!(tile = %id, path = %target.display(), "Committed tile");
        StoredTile::read(id, format, &target)
    }

    /// Every readable artifact in a 1° cell, ordered by id.
    pub fn list_cell(&self, cell: CellName) -> Result<Vec<StoredTile>, StoreError> {
        let mut tiles = Vec::new();
        for (path, id, format) in artifacts_in(&self.cell_dir(cell))? {
            match StoredTile::read(id, format, &path) {
                Ok(tile) => tiles.push(tile),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable artifact"),
            }
        }
        tiles.sort_by_key(|t| (t.id, t.format.extension()));
        Ok(tiles)
    }

    /// Report presence and contents for each named cell.
    pub fn check(&self, cells: &[CellName]) -> Result<Vec<CellReport>, StoreError> {
        cells
            .iter()
            .map(|&cell| {
                Ok(CellReport {
                    cell,
                    present: self.cell_dir(cell).is_dir(),
                    tiles: self.list_cell(cell)?,
                })
            })
            .collect()
    }

    /// Delete a whole cell, or only the listed sub-tiles when `subtiles` is
    /// non-empty. Directories left empty are removed. Returns the number of
    /// artifacts deleted.
    pub fn remove(&self, cell: CellName, subtiles: &[TileId]) -> Result<usize, StoreError> {
        let dir = self.cell_dir(cell);
        let mut removed = 0;
        for (path, id, _) in artifacts_in(&dir)? {
            if subtiles.is_empty() || subtiles.contains(&id) {
                fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
                removed += 1;
            }
        }
        if subtiles.is_empty() && dir.is_dir() {
            fs::remove_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        self.remove_empty_parents(&dir)?;
        info!(cell = %cell, removed, "Removed artifacts");
        Ok(removed)
    }

    /// Delete artifacts in `folder` whose decoded bounds fall outside
    /// `parent`. Returns the deleted paths.
    ///
    /// A tile is kept when its whole extent lies inside `parent`. Its
    /// longitude span is first clamped to its own 1° cell, since polar tiles
    /// are wider than a degree.
    pub fn prune_invalid_subtiles(
        &self,
        folder: &Path,
        parent: &TileBounds,
    ) -> Result<Vec<PathBuf>, StoreError> {
        let mut pruned = Vec::new();
        for (path, id, _) in artifacts_in(folder)? {
            let bounds = id.bounds();
            let lon_base = id.lon_base() as f64;
            let clamped = TileBounds {
                lon_min: bounds.lon_min.max(lon_base),
                lon_max: bounds.lon_max.min(lon_base + 1.0),
                ..bounds
            };
            if !parent.encloses(&clamped) {
                warn!(tile = %id, bounds = %bounds, parent = %parent, "Pruning misplaced artifact");
                fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
                pruned.push(path);
            }
        }
        Ok(pruned)
    }

    /// [`prune_invalid_subtiles`](Self::prune_invalid_subtiles) against the
    /// cell's own 1° square.
    pub fn prune_cell(&self, cell: CellName) -> Result<Vec<PathBuf>, StoreError> {
        self.prune_invalid_subtiles(&self.cell_dir(cell), &cell.bounds())
    }

    /// Delete artifacts whose headers cannot be read.
    pub fn scan_invalid(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut removed = Vec::new();
        for block in subdirs(&self.orthophotos_dir())? {
            for cell_dir in subdirs(&block)? {
                for (path, id, format) in artifacts_in(&cell_dir)? {
                    if let Err(e) = StoredTile::read(id, format, &path) {
                        warn!(path = %path.display(), error = %e, "Removing corrupt artifact");
                        fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
                        removed.push(path);
                    }
                }
            }
        }
        if !removed.is_empty() {
            info!(count = removed.len(), "Removed corrupt artifacts");
        }
        Ok(removed)
    }

    /// Ids of the cell's tiles that have no artifact in `format`.
    pub fn missing_subtiles(
        &self,
        cell: CellName,
        format: ArtifactFormat,
    ) -> Result<Vec<TileId>, StoreError> {
        Ok(subtile_ids(cell.lat_base, cell.lon_base)?
            .into_iter()
            .filter(|&id| !self.exists(id, format))
            .collect())
    }

    fn remove_empty_parents(&self, cell_dir: &Path) -> Result<(), StoreError> {
        let stop = self.orthophotos_dir();
        let mut dir = Some(cell_dir);
        while let Some(current) = dir {
            if current == stop || !current.starts_with(&stop) {
                break;
            }
            match fs::remove_dir(current) {
                Ok(()) => debug!(dir = %current.display(), "Removed empty directory"),
                // Not empty, or already gone
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(_) if current.is_dir() => break,
                Err(e) => return Err(StoreError::io(current, e)),
            }
            dir = current.parent();
        }
        Ok(())
    }
}

/// Artifact files directly inside `dir`. A missing directory has none.
fn artifacts_in(dir: &Path) -> Result<Vec<(PathBuf, TileId, ArtifactFormat)>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };
    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StoreError::io(dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        if let Some((id, format)) = ArtifactFormat::parse_file_name(&path) {
            found.push((path, id, format));
        }
    }
    Ok(found)
}

fn subdirs(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StoreError::io(dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}
