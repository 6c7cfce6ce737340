//! Store maintenance commands: `check`, `remove` and `prune`.

use clap::Args;

use photoscenery::store::{ArtifactFormat, TileStore};
use photoscenery::tile::{CellName, TileId};

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Cells to inspect, as w045s30 or -30,-45
    #[arg(required = true, allow_hyphen_values = true)]
    pub cells: Vec<String>,

    /// Also list sub-tiles that have no artifact
    #[arg(long)]
    pub missing: bool,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Cell to delete from
    #[arg(allow_hyphen_values = true)]
    pub cell: String,

    /// Only these tile ids; the whole cell when omitted
    pub tiles: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Cells whose misplaced artifacts are deleted
    #[arg(allow_hyphen_values = true)]
    pub cells: Vec<String>,

    /// Also delete artifacts with unreadable headers anywhere under the root
    #[arg(long)]
    pub invalid: bool,
}

fn parse_cells(names: &[String]) -> Result<Vec<CellName>, CliError> {
    names
        .iter()
        .map(|name| {
            name.parse::<CellName>()
                .map_err(|e| CliError::InvalidArgument(e.to_string()))
        })
        .collect()
}

fn parse_tiles(ids: &[String]) -> Result<Vec<TileId>, CliError> {
    ids.iter()
        .map(|id| {
            id.parse::<TileId>()
                .map_err(|e| CliError::InvalidArgument(e.to_string()))
        })
        .collect()
}

pub fn check(args: CheckArgs, runner: CliRunner) -> Result<(), CliError> {
    runner.log_startup("check");
    let store = runner.store();
    let cells = parse_cells(&args.cells)?;
    let artifact = runner.config().output.format.artifact();

    for report in store.check(&cells)? {
        if !report.present {
            println!("{}: not present", report.cell);
            continue;
        }
        println!("{}: {} artifacts", report.cell, report.tiles.len());
        for tile in &report.tiles {
            println!("  {}", tile);
        }
        if args.missing {
            print_missing(&store, report.cell, artifact)?;
        }
    }
    Ok(())
}

fn print_missing(store: &TileStore, cell: CellName, format: ArtifactFormat) -> Result<(), CliError> {
    let missing = store.missing_subtiles(cell, format)?;
    if missing.is_empty() {
        println!("  complete in {}", format);
    } else {
        let ids: Vec<String> = missing.iter().map(TileId::to_string).collect();
        println!("  missing {} {}: {}", missing.len(), format, ids.join(" "));
    }
    Ok(())
}

pub fn remove(args: RemoveArgs, runner: CliRunner) -> Result<(), CliError> {
    runner.log_startup("remove");
    let cell = args
        .cell
        .parse::<CellName>()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    let tiles = parse_tiles(&args.tiles)?;

    let removed = runner.store().remove(cell, &tiles)?;
    println!("Removed {} artifacts from {}", removed, cell);
    Ok(())
}

pub fn prune(args: PruneArgs, runner: CliRunner) -> Result<(), CliError> {
    runner.log_startup("prune");
    if args.cells.is_empty() && !args.invalid {
        return Err(CliError::InvalidArgument(
            "name at least one cell or pass --invalid".to_string(),
        ));
    }
    let store = runner.store();

    let mut total = 0;
    for cell in parse_cells(&args.cells)? {
        let pruned = store.prune_cell(cell)?;
        for path in &pruned {
            println!("  pruned {}", path.display());
        }
        total += pruned.len();
    }
    if args.invalid {
        let corrupt = store.scan_invalid()?;
        for path in &corrupt {
            println!("  removed corrupt {}", path.display());
        }
        total += corrupt.len();
    }
    println!("Deleted {} artifacts", total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cells_accepts_both_spellings() {
        let cells = parse_cells(&["w045s30".to_string(), "-30,-45".to_string()]).unwrap();
        assert_eq!(cells[0], cells[1]);
        assert_eq!(cells[0].to_string(), "w045s30");
    }

    #[test]
    fn test_parse_cells_rejects_garbage() {
        assert!(parse_cells(&["nowhere".to_string()]).is_err());
    }

    #[test]
    fn test_parse_tiles_rejects_garbage() {
        assert!(parse_tiles(&["tile".to_string()]).is_err());
    }
}
