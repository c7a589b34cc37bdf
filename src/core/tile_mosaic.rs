use crate::config::MosaicConfig;
use crate::core::raster_tools::RasterToolkit;
use crate::core::reprojection_cache::{Reservation, ReprojectionCache};
use crate::io::naming;
use crate::types::{BoundingBox, MosaicError, MosaicResult, Polarization, Tile, TileId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Products written for one tile
#[derive(Debug, Clone, Serialize)]
pub struct TileOutputs {
    pub tile: TileId,
    /// Tile was inactive and left untouched
    pub inactive: bool,
    /// Final cropped rasters, one per channel that had sources
    pub rasters: Vec<PathBuf>,
    /// Channels with no source raster on disk
    pub empty_channels: Vec<Polarization>,
}

impl TileOutputs {
    fn inactive(tile: TileId) -> Self {
        Self {
            tile,
            inactive: true,
            rasters: Vec::new(),
            empty_channels: Vec::new(),
        }
    }
}

/// Outcome of one tile task, in grid order
#[derive(Debug)]
pub struct TileReport {
    pub tile: TileId,
    pub result: MosaicResult<TileOutputs>,
}

/// Run summary written next to the tile products
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub target_crs: String,
    pub tiles_total: usize,
    pub tiles_built: usize,
    pub tiles_inactive: usize,
    pub reprojections_run: usize,
    pub rasters: Vec<PathBuf>,
}

/// Builds one cropped raster per (tile, channel) from the tile's contributing bursts
pub struct TileMosaicBuilder<T: RasterToolkit> {
    config: MosaicConfig,
    out_dir: PathBuf,
    target_crs: String,
    toolkit: T,
    cache: ReprojectionCache,
    reprojections_run: AtomicUsize,
}

impl<T: RasterToolkit> TileMosaicBuilder<T> {
    pub fn new(config: MosaicConfig, target_crs: impl Into<String>, toolkit: T) -> Self {
        let out_dir = config.output_dir();
        Self {
            config,
            out_dir,
            target_crs: target_crs.into(),
            toolkit,
            cache: ReprojectionCache::new(),
            reprojections_run: AtomicUsize::new(0),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn cache(&self) -> &ReprojectionCache {
        &self.cache
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    /// Number of reprojections actually handed to the toolkit so far
    pub fn reprojections_run(&self) -> usize {
        self.reprojections_run.load(Ordering::SeqCst)
    }

    /// Process every tile and return each tile's result in grid order
    ///
    /// A failing tile never cancels the others; all tasks run to completion.
    pub fn build_each(&self, tiles: &[Tile]) -> MosaicResult<Vec<TileReport>> {
        std::fs::create_dir_all(&self.out_dir)?;
        log::info!(
            "🚀 Building {} tiles into {} ({})",
            tiles.len(),
            self.out_dir.display(),
            self.target_crs
        );

        let results = self.run_tasks(tiles)?;
        Ok(tiles
            .iter()
            .zip(results)
            .map(|(tile, result)| TileReport { tile: tile.id, result })
            .collect())
    }

    /// Process every tile; the first failure in grid order is returned
    pub fn build_all(&self, tiles: &[Tile]) -> MosaicResult<BuildSummary> {
        let started_at = Utc::now();
        let reports = self.build_each(tiles)?;

        let mut first_error = None;
        let mut tiles_built = 0;
        let mut tiles_inactive = 0;
        let mut rasters = Vec::new();
        for report in reports {
            match report.result {
                Ok(outputs) if outputs.inactive => tiles_inactive += 1,
                Ok(outputs) => {
                    tiles_built += 1;
                    rasters.extend(outputs.rasters);
                }
                Err(e) => {
                    log::error!("❌ Tile {} failed: {}", report.tile, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let summary = BuildSummary {
            started_at,
            finished_at: Utc::now(),
            target_crs: self.target_crs.clone(),
            tiles_total: tiles.len(),
            tiles_built,
            tiles_inactive,
            reprojections_run: self.reprojections_run(),
            rasters,
        };
        log::info!(
            "🎉 Built {} tiles ({} inactive), {} rasters, {} reprojections",
            summary.tiles_built,
            summary.tiles_inactive,
            summary.rasters.len(),
            summary.reprojections_run
        );
        Ok(summary)
    }

    #[cfg(feature = "parallel")]
    fn run_tasks(&self, tiles: &[Tile]) -> MosaicResult<Vec<MosaicResult<TileOutputs>>> {
        use rayon::prelude::*;

        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = self.config.workers {
            pool = pool.num_threads(workers);
        }
        let pool = pool
            .build()
            .map_err(|e| MosaicError::Processing(format!("Failed to create worker pool: {}", e)))?;
        log::debug!("Worker pool with {} threads", pool.current_num_threads());

        Ok(pool.install(|| tiles.par_iter().map(|tile| self.process_tile(tile)).collect()))
    }

    #[cfg(not(feature = "parallel"))]
    fn run_tasks(&self, tiles: &[Tile]) -> MosaicResult<Vec<MosaicResult<TileOutputs>>> {
        Ok(tiles.iter().map(|tile| self.process_tile(tile)).collect())
    }

    /// Build every channel of one tile; inactive tiles are skipped without side effects
    pub fn process_tile(&self, tile: &Tile) -> MosaicResult<TileOutputs> {
        if !tile.active {
            log::debug!("Tile {} is masked out, skipping", tile.id);
            return Ok(TileOutputs::inactive(tile.id));
        }

        let bbox = tile.bounding_box()?;
        let mut outputs = TileOutputs {
            tile: tile.id,
            inactive: false,
            rasters: Vec::new(),
            empty_channels: Vec::new(),
        };

        for &channel in &self.config.channels {
            match self.process_channel(tile, &bbox, channel)? {
                Some(raster) => outputs.rasters.push(raster),
                None => outputs.empty_channels.push(channel),
            }
        }

        log::info!("✅ Tile {} done ({} rasters)", tile.id, outputs.rasters.len());
        Ok(outputs)
    }

    fn process_channel(&self, tile: &Tile, bbox: &BoundingBox, channel: Polarization) -> MosaicResult<Option<PathBuf>> {
        let sources: Vec<PathBuf> = tile
            .contributors
            .iter()
            .map(|burst_id| naming::source_raster(&self.config.rtc_dir, burst_id, channel))
            .filter(|path| {
                let exists = path.exists();
                if !exists {
                    log::debug!("Missing source {}, dropped from tile {}", path.display(), tile.id);
                }
                exists
            })
            .collect();

        if sources.is_empty() {
            log::info!("No {} sources on disk for tile {}, nothing to build", channel, tile.id);
            return Ok(None);
        }

        let reprojected = sources
            .iter()
            .map(|source| self.ensure_reprojected(source))
            .collect::<MosaicResult<Vec<_>>>()?;

        let mosaic = naming::tile_mosaic_vrt(&self.out_dir, tile.id, channel);
        self.toolkit
            .build_virtual_mosaic(&mosaic, &reprojected, Some(&self.config.nodata))?;

        let output = naming::tile_raster(&self.out_dir, tile.id, channel);
        self.toolkit
            .crop_and_resample(&mosaic, &output, bbox, &self.target_crs)?;

        log::debug!("Tile {} {}: {} sources -> {}", tile.id, channel, reprojected.len(), output.display());
        Ok(Some(output))
    }

    /// Reprojected VRT for `source`, produced at most once per run
    fn ensure_reprojected(&self, source: &Path) -> MosaicResult<PathBuf> {
        let target = naming::reprojected(source);

        if self.cache.reserve(&target) {
            self.cache.wait_ready(&target)?;
            return Ok(target);
        }
        let reservation = Reservation::new(&self.cache, &target);

        if self.config.reuse_existing && target.exists() {
            log::debug!("Reusing existing {}", target.display());
            reservation.complete(Ok(()));
            return Ok(target);
        }

        let outcome = self.reproject_atomically(source, &target);
        reservation.complete(outcome.as_ref().map(|_| ()).map_err(|e| e.to_string()));
        outcome.map(|_| target)
    }

    /// Warp into a private staging directory beside `target`, then publish with one rename
    fn reproject_atomically(&self, source: &Path, target: &Path) -> MosaicResult<()> {
        let parent = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let file_name = target.file_name().ok_or_else(|| {
            MosaicError::Processing(format!("Invalid reprojection target: {}", target.display()))
        })?;

        // Removed on drop, so a failed warp leaves nothing behind
        let staging = tempfile::Builder::new()
            .prefix(".reproject-")
            .tempdir_in(parent)?;
        let staged = staging.path().join(file_name);

        // Staged VRTs live one directory down, so sources must not be relative
        let source = source.canonicalize()?;

        log::info!("🌐 Reprojecting {} to {}", source.display(), self.target_crs);
        self.reprojections_run.fetch_add(1, Ordering::SeqCst);
        self.toolkit.reproject(&source, &staged, &self.target_crs)?;

        std::fs::rename(&staged, target)?;
        staging.close()?;
        Ok(())
    }
}
