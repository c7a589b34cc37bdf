#![allow(dead_code)]

use geo::polygon;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use vegmosaic::{BoundingBox, MosaicError, MosaicResult, RasterToolkit, Tile, TileId};

/// Toolkit double: writes placeholder files, records calls, injects delays and failures
#[derive(Default)]
pub struct FakeToolkit {
    pub reprojected_sources: Mutex<Vec<PathBuf>>,
    pub mosaics: Mutex<Vec<(PathBuf, Vec<PathBuf>)>>,
    pub crops: Mutex<Vec<(PathBuf, BoundingBox)>>,
    pub reproject_delay: Duration,
    /// Crop fails when the output file name contains this text
    pub fail_crop_for: Option<String>,
    /// Reprojection fails (after writing a partial file) when the source name contains this text
    pub fail_reproject_for: Option<String>,
}

fn failure(tool: &str, what: &Path) -> MosaicError {
    MosaicError::ToolFailed {
        tool: tool.to_string(),
        status: "exit status: 1".to_string(),
        stderr: format!("ERROR 1: cannot process {}", what.display()),
    }
}

fn name_contains(path: &Path, needle: &Option<String>) -> bool {
    match needle {
        Some(needle) => path
            .file_name()
            .map(|n| n.to_string_lossy().contains(needle.as_str()))
            .unwrap_or(false),
        None => false,
    }
}

impl RasterToolkit for FakeToolkit {
    fn reproject(&self, src: &Path, dst: &Path, _target_crs: &str) -> MosaicResult<()> {
        self.reprojected_sources.lock().unwrap().push(src.to_path_buf());
        std::thread::sleep(self.reproject_delay);
        std::fs::write(dst, "<VRTDataset partial")?;
        if name_contains(src, &self.fail_reproject_for) {
            return Err(failure("gdalwarp", src));
        }
        std::fs::write(dst, format!("<VRTDataset source=\"{}\"/>", src.display()))?;
        Ok(())
    }

    fn build_virtual_mosaic(&self, dst: &Path, inputs: &[PathBuf], _nodata: Option<&str>) -> MosaicResult<()> {
        for input in inputs {
            assert!(input.exists(), "mosaic input {} not published yet", input.display());
        }
        self.mosaics.lock().unwrap().push((dst.to_path_buf(), inputs.to_vec()));
        std::fs::write(dst, "<VRTDataset/>")?;
        Ok(())
    }

    fn crop_and_resample(&self, _src: &Path, dst: &Path, bbox: &BoundingBox, _target_crs: &str) -> MosaicResult<()> {
        if name_contains(dst, &self.fail_crop_for) {
            return Err(failure("gdalwarp", dst));
        }
        self.crops.lock().unwrap().push((dst.to_path_buf(), *bbox));
        std::fs::write(dst, format!("{} {} {} {}", bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y))?;
        Ok(())
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 150 km EASE-grid style square tile at grid position (h, v)
pub fn grid_tile(h: i64, v: i64, active: bool, contributors: &[&str]) -> Tile {
    let size = 150_000.0;
    let x = h as f64 * size;
    let y = -(v as f64) * size;
    let mut tile = Tile::new(
        TileId::new(h, v),
        polygon![
            (x: x, y: y - size),
            (x: x + size, y: y - size),
            (x: x + size, y: y),
            (x: x, y: y),
        ],
        active,
    );
    tile.contributors = contributors.iter().map(|s| s.to_string()).collect();
    tile
}

/// Create `{burst}_tmean_{pol}.tif` placeholders for every burst and polarization
pub fn write_sources(dir: &Path, bursts: &[&str], pols: &[&str]) {
    for burst in bursts {
        for pol in pols {
            std::fs::write(dir.join(format!("{}_tmean_{}.tif", burst, pol)), "tif").unwrap();
        }
    }
}

pub fn files_with_suffix(dir: &Path, suffix: &str) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(suffix))
        .collect();
    names.sort();
    names
}
