//! `photoscenery fetch`: plan a region and download its tiles.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use photoscenery::config::DEFAULT_RADIUS_NM;
use photoscenery::coord::GeoPoint;
use photoscenery::orchestrator::RunReport;
use photoscenery::pipeline::OutputFormat;
use photoscenery::planner::{RegionQuery, TilePlan};

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Centre point as lat,lon (e.g. -29.94,-44.9)
    #[arg(short = 'c', long, allow_hyphen_values = true, conflicts_with = "bbox")]
    pub center: Option<String>,

    /// Bounding box as latLL,lonLL,latUR,lonUR
    #[arg(short = 'b', long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Radius around the centre, nautical miles
    #[arg(short = 'r', long, default_value_t = DEFAULT_RADIUS_NM)]
    pub radius: f64,

    /// Size tier for the nearest tiles (0=512 .. 6=32768 px)
    #[arg(short = 's', long, value_parser = clap::value_parser!(u8).range(0..=6))]
    pub size: Option<u8>,

    /// Lowest size tier for distant tiles
    #[arg(short = 'd', long = "size-down", value_parser = clap::value_parser!(u8).range(0..=6))]
    pub size_down: Option<u8>,

    /// Output format: 0/png or 1/dds (bc1, bc3 pick the compression)
    #[arg(short = 'f', long)]
    pub format: Option<String>,

    /// Map server id from the catalog
    #[arg(short = 'm', long = "map-server")]
    pub map_server: Option<u32>,

    /// Proxy for all requests (e.g. http://proxy:3128)
    #[arg(short = 'p', long)]
    pub proxy: Option<String>,

    /// Tiles fetched at once
    #[arg(long)]
    pub tile_concurrency: Option<usize>,

    /// Keep stray artifacts in the touched cells
    #[arg(long)]
    pub no_prune: bool,

    /// Print the plan without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Write the plan's tile ids to this file, one per line
    #[arg(long)]
    pub plan_out: Option<PathBuf>,
}

/// Parse `a,b,...` into exactly `N` numbers.
fn parse_numbers<const N: usize>(text: &str, what: &str) -> Result<[f64; N], CliError> {
    let values: Vec<f64> = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| CliError::InvalidArgument(format!("{} '{}' is not numeric", what, text)))?;
    values.try_into().map_err(|_| {
        CliError::InvalidArgument(format!("{} '{}' needs {} comma-separated values", what, text, N))
    })
}

fn point(lat: f64, lon: f64) -> Result<GeoPoint, CliError> {
    GeoPoint::new(lat, lon).map_err(|e| CliError::InvalidArgument(e.to_string()))
}

impl FetchArgs {
    pub fn region(&self) -> Result<RegionQuery, CliError> {
        let invalid = |e: photoscenery::coord::CoordError| CliError::InvalidArgument(e.to_string());
        match (&self.center, &self.bbox) {
            (Some(center), None) => {
                let [lat, lon] = parse_numbers::<2>(center, "centre")?;
                RegionQuery::polar(point(lat, lon)?, self.radius).map_err(invalid)
            }
            (None, Some(bbox)) => {
                let [lat_ll, lon_ll, lat_ur, lon_ur] = parse_numbers::<4>(bbox, "bounding box")?;
                RegionQuery::bounding_box(point(lat_ll, lon_ll)?, point(lat_ur, lon_ur)?)
                    .map_err(invalid)
            }
            _ => Err(CliError::InvalidArgument(
                "give either --center or --bbox".to_string(),
            )),
        }
    }

    /// Fold command-line overrides into the loaded configuration.
    pub fn apply(&self, runner: &mut CliRunner) -> Result<(), CliError> {
        let config = runner.config_mut();
        if let Some(size) = self.size {
            config.planner = config.planner.with_size(size);
        }
        if let Some(size_down) = self.size_down {
            config.planner = config.planner.with_size_down(size_down);
        }
        if let Some(format) = &self.format {
            config.output.format = format
                .parse::<OutputFormat>()
                .map_err(CliError::InvalidArgument)?;
        }
        if let Some(id) = self.map_server {
            config.server_id = id;
        }
        if self.proxy.is_some() {
            config.download.proxy = self.proxy.clone();
        }
        if let Some(n) = self.tile_concurrency {
            config.run = config.run.with_tile_concurrency(n);
        }
        if self.no_prune {
            config.run = config.run.with_prune(false);
        }
        Ok(())
    }
}

fn print_plan(plan: &TilePlan) {
    println!(
        "{} tiles planned{}",
        plan.len(),
        if plan.is_subregion { " (sub-degree region)" } else { "" }
    );
    for item in &plan.items {
        println!(
            "  {:>8}  {}  {:>8.3} nm  tier {}  {}",
            item.id, item.bounds, item.distance_nm, item.tier, item.resolution
        );
    }
}

fn print_report(report: &RunReport) {
    println!("{}", report);
    for failure in &report.failures {
        println!("  failed: {}", failure);
    }
    if let Some(cell) = report.subregion_cell {
        if !report.missing_subtiles.is_empty() {
            let ids: Vec<String> = report.missing_subtiles.iter().map(|id| id.to_string()).collect();
            println!("  {} still missing: {}", cell, ids.join(" "));
        }
    }
    if report.pruned > 0 {
        println!("  pruned {} stray artifacts", report.pruned);
    }
}

pub async fn run(args: FetchArgs, mut runner: CliRunner) -> Result<(), CliError> {
    args.apply(&mut runner)?;
    runner.log_startup("fetch");

    let query = args.region()?;
    let orchestrator = runner.orchestrator()?;
    let plan = orchestrator.plan(&query)?;

    if let Some(path) = &args.plan_out {
        let ids: String = plan.ids().map(|id| format!("{}\n", id)).collect();
        std::fs::write(path, ids)
            .map_err(|e| CliError::InvalidArgument(format!("{}: {}", path.display(), e)))?;
    }
    if args.dry_run {
        print_plan(&plan);
        return Ok(());
    }

    println!(
        "Fetching {} tiles into {}",
        plan.len(),
        runner.config().output.root.display()
    );

    let run = orchestrator.run_plan(plan);
    tokio::pin!(run);
    let report = tokio::select! {
        report = &mut run => report,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, cancelling");
            orchestrator.cancel();
            run.await
        }
    }?;

    print_report(&report);
    outcome(&report)
}

/// Success only when every tile is committed and, for a sub-degree region,
/// its whole cell is stored.
fn outcome(report: &RunReport) -> Result<(), CliError> {
    if report.is_complete() {
        Ok(())
    } else {
        Err(CliError::Incomplete {
            committed: report.success_count(),
            total: report.total,
            missing_subtiles: report.missing_subtiles.len(),
        })
    }
}
