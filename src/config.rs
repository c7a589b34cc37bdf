//! Run configuration for the mosaicking pipeline

use crate::types::{MosaicError, MosaicResult, Polarization};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Parameters shared by assignment, tile building, auditing and area mosaicking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Directory holding `{burst_id}_tmean_{channel}.tif` rasters
    pub rtc_dir: PathBuf,
    /// Output directory for tile products, `{rtc_dir}/tile_vrts` when unset
    pub out_dir: Option<PathBuf>,
    /// Channels processed for every tile
    pub channels: Vec<Polarization>,
    /// No-data sentinel handed to the raster tools
    pub nodata: String,
    /// GeoTIFF compression for final tiles
    pub compression: String,
    /// Worker pool size, rayon's default when unset
    pub workers: Option<usize>,
    /// CRS of burst footprints
    pub source_epsg: u32,
    /// Overrides the CRS declared by the tile grid file
    pub grid_epsg: Option<u32>,
    /// Reuse `_reprojected.vrt` files left by an earlier run
    pub reuse_existing: bool,
    pub gdalwarp: PathBuf,
    pub gdalbuildvrt: PathBuf,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            rtc_dir: PathBuf::from("."),
            out_dir: None,
            channels: vec![Polarization::VV, Polarization::VH],
            nodata: "nan".to_string(),
            compression: "LZW".to_string(), // lossless
            workers: None,
            source_epsg: 4326, // burst summaries are always WGS84
            grid_epsg: None,
            reuse_existing: true,
            gdalwarp: PathBuf::from("gdalwarp"),
            gdalbuildvrt: PathBuf::from("gdalbuildvrt"),
        }
    }
}

impl MosaicConfig {
    /// Configuration rooted at an RTC directory, everything else default
    pub fn for_rtc_dir<P: AsRef<Path>>(rtc_dir: P) -> Self {
        Self {
            rtc_dir: rtc_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file; absent keys keep their defaults
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> MosaicResult<Self> {
        log::info!("Loading configuration from: {}", path.as_ref().display());
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&text).map_err(|e| {
            MosaicError::Config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MosaicResult<()> {
        if self.channels.is_empty() {
            return Err(MosaicError::Config("At least one channel is required".to_string()));
        }
        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel) {
                return Err(MosaicError::Config(format!("Duplicate channel: {}", channel)));
            }
        }
        if self.workers == Some(0) {
            return Err(MosaicError::Config("Worker count must be positive".to_string()));
        }
        if self.nodata.trim().is_empty() {
            return Err(MosaicError::Config("No-data sentinel must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolved output directory for tile products
    pub fn output_dir(&self) -> PathBuf {
        self.out_dir
            .clone()
            .unwrap_or_else(|| self.rtc_dir.join("tile_vrts"))
    }

    /// Location of the burst-to-tile CSV written by assignment
    pub fn assignment_csv(&self) -> PathBuf {
        self.rtc_dir.join("burst_to_tile_map.csv")
    }
}
