use crate::core::raster_tools::RasterToolkit;
use crate::io::naming;
use crate::types::{MosaicResult, Polarization};
use std::path::{Path, PathBuf};

/// What happened to one channel's full-area mosaic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMosaic {
    Created(PathBuf),
    NoTiles,
}

/// Merges all final tile rasters of a channel into `tile_mosaic_{channel}.vrt`
pub struct AreaMosaicAssembler<'a, T: RasterToolkit> {
    toolkit: &'a T,
    channels: Vec<Polarization>,
}

impl<'a, T: RasterToolkit> AreaMosaicAssembler<'a, T> {
    pub fn new(toolkit: &'a T, channels: Vec<Polarization>) -> Self {
        Self { toolkit, channels }
    }

    /// One mosaic per channel; a channel without tiles is reported and skipped
    pub fn assemble(&self, dir: &Path) -> MosaicResult<Vec<(Polarization, ChannelMosaic)>> {
        let mut outcomes = Vec::with_capacity(self.channels.len());

        for &channel in &self.channels {
            let tiles = collect_tile_rasters(dir, channel)?;
            if tiles.is_empty() {
                log::warn!("No tiles found ending in *{}. Mosaic not created.", naming::tile_raster_suffix(channel));
                outcomes.push((channel, ChannelMosaic::NoTiles));
                continue;
            }

            let output = naming::area_mosaic_vrt(dir, channel);
            self.toolkit.build_virtual_mosaic(&output, &tiles, None)?;
            log::info!("🗺️  {} mosaic of {} tiles created at: {}", channel, tiles.len(), output.display());
            outcomes.push((channel, ChannelMosaic::Created(output)));
        }

        Ok(outcomes)
    }
}

/// Final tile rasters of a channel in `dir`, sorted by name
pub fn collect_tile_rasters(dir: &Path, channel: Polarization) -> MosaicResult<Vec<PathBuf>> {
    let suffix = naming::tile_raster_suffix(channel);
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .map(|name| name.to_string_lossy().ends_with(&suffix))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
