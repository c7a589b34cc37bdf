//! Command line front end for burst-to-tile mosaicking.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use vegmosaic::core::{map_bursts_to_tiles, ChannelMosaic};
use vegmosaic::{
    AreaMosaicAssembler, BurstTableReader, GdalCommandLine, MosaicConfig, TileAuditor, TileGrid,
    TileGridReader, TileMosaicBuilder,
};

#[derive(Parser, Debug)]
#[command(name = "vegmosaic")]
#[command(about = "Map Sentinel-1 RTC bursts onto a tile grid and build per-tile mosaics")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the {burst_id}_tmean_{pol}.tif rasters
    #[arg(long, global = true, env = "VEGMOSAIC_RTC_DIR")]
    rtc_dir: Option<PathBuf>,

    /// Output directory for tile products (default: <rtc_dir>/tile_vrts)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Number of parallel tile workers
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Map bursts to tiles and write burst_to_tile_map.csv
    Assign {
        #[arg(long)]
        grid: PathBuf,
        #[arg(long)]
        bursts: PathBuf,
        /// Output CSV (default: <rtc_dir>/burst_to_tile_map.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Assign bursts, then build one cropped raster per tile and polarization
    Build {
        #[arg(long)]
        grid: PathBuf,
        #[arg(long)]
        bursts: PathBuf,
    },
    /// Check that every active tile has all polarizations on disk
    Audit {
        #[arg(long)]
        grid: PathBuf,
    },
    /// Merge all tile rasters into one VRT per polarization
    Mosaic,
    /// Build, audit and mosaic in one go
    Run {
        #[arg(long)]
        grid: PathBuf,
        #[arg(long)]
        bursts: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = load_config(&args)?;

    match &args.command {
        Commands::Assign { grid, bursts, out } => {
            let csv_path = out.clone().unwrap_or_else(|| config.assignment_csv());
            assign(&config, grid, bursts, &csv_path)?;
        }
        Commands::Build { grid, bursts } => {
            let grid = assign(&config, grid, bursts, &config.assignment_csv())?;
            build(&config, &grid)?;
        }
        Commands::Audit { grid } => {
            let grid = TileGridReader::read(grid, config.grid_epsg)?;
            audit(&config, &grid)?;
        }
        Commands::Mosaic => mosaic(&config)?,
        Commands::Run { grid, bursts } => {
            let grid = assign(&config, grid, bursts, &config.assignment_csv())?;
            build(&config, &grid)?;
            audit(&config, &grid)?;
            mosaic(&config)?;
        }
    }

    Ok(())
}

/// Configuration file (if any) with command line overrides applied
fn load_config(args: &Args) -> Result<MosaicConfig> {
    let mut config = match &args.config {
        Some(path) => MosaicConfig::from_yaml_file(path)?,
        None => MosaicConfig::default(),
    };
    if let Some(rtc_dir) = &args.rtc_dir {
        config.rtc_dir = rtc_dir.clone();
    }
    if let Some(out_dir) = &args.out_dir {
        config.out_dir = Some(out_dir.clone());
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    config.validate()?;
    Ok(config)
}

fn assign(config: &MosaicConfig, grid_path: &Path, bursts_path: &Path, csv_path: &Path) -> Result<TileGrid> {
    let mut grid = TileGridReader::read(grid_path, config.grid_epsg)
        .with_context(|| format!("reading tile grid {}", grid_path.display()))?;
    let bursts = BurstTableReader::read(bursts_path)
        .with_context(|| format!("reading burst footprints {}", bursts_path.display()))?;

    map_bursts_to_tiles(&mut grid, &bursts, config.source_epsg, csv_path)?;
    Ok(grid)
}

fn build(config: &MosaicConfig, grid: &TileGrid) -> Result<()> {
    let builder = TileMosaicBuilder::new(
        config.clone(),
        grid.target_crs(),
        GdalCommandLine::from_config(config),
    );
    let summary = builder.build_all(&grid.tiles)?;

    let summary_path = builder.out_dir().join("build_summary.json");
    let file = std::fs::File::create(&summary_path)
        .with_context(|| format!("creating {}", summary_path.display()))?;
    serde_json::to_writer_pretty(file, &summary)?;
    log::info!("Build summary written to: {}", summary_path.display());
    Ok(())
}

fn audit(config: &MosaicConfig, grid: &TileGrid) -> Result<()> {
    let report = TileAuditor::from_config(config).audit(&grid.tiles);
    for (tile, channel) in report.missing() {
        log::warn!("Missing tile_h{}_v{}_{}.tif", tile.h, tile.v, channel);
    }

    let out_dir = config.output_dir();
    if out_dir.is_dir() {
        let report_path = out_dir.join("audit_report.json");
        let file = std::fs::File::create(&report_path)
            .with_context(|| format!("creating {}", report_path.display()))?;
        serde_json::to_writer_pretty(file, &report)?;
        log::info!("Audit report written to: {}", report_path.display());
    }

    println!("{}", report.verdict);
    Ok(())
}

fn mosaic(config: &MosaicConfig) -> Result<()> {
    let toolkit = GdalCommandLine::from_config(config);
    let assembler = AreaMosaicAssembler::new(&toolkit, config.channels.clone());

    for (channel, outcome) in assembler.assemble(&config.output_dir())? {
        match outcome {
            ChannelMosaic::Created(path) => println!("{} mosaic created at: {}", channel, path.display()),
            ChannelMosaic::NoTiles => println!("No {} tiles found. Mosaic not created.", channel),
        }
    }
    Ok(())
}
