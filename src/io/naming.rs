//! File naming conventions shared by every pipeline stage

use crate::types::{Polarization, TileId};
use std::path::{Path, PathBuf};

/// RTC burst raster for one channel: `{burst_id}_tmean_{channel}.tif`
pub fn source_raster(rtc_dir: &Path, burst_id: &str, channel: Polarization) -> PathBuf {
    rtc_dir.join(format!("{}_tmean_{}.tif", burst_id, channel))
}

/// Reprojected companion of a source raster: `{stem}_reprojected.vrt` beside it
pub fn reprojected(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{}_reprojected.vrt", stem))
}

pub fn tile_mosaic_vrt(out_dir: &Path, tile: TileId, channel: Polarization) -> PathBuf {
    out_dir.join(format!("mosaic_h{}_v{}_{}.vrt", tile.h, tile.v, channel))
}

pub fn tile_raster(out_dir: &Path, tile: TileId, channel: Polarization) -> PathBuf {
    out_dir.join(format!("tile_h{}_v{}_{}.tif", tile.h, tile.v, channel))
}

/// Suffix identifying final tile rasters of a channel
pub fn tile_raster_suffix(channel: Polarization) -> String {
    format!("_{}.tif", channel)
}

pub fn area_mosaic_vrt(out_dir: &Path, channel: Polarization) -> PathBuf {
    out_dir.join(format!("tile_mosaic_{}.vrt", channel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_conventions() {
        let rtc = Path::new("/rtc");
        let src = source_raster(rtc, "t064_135523_iw2", Polarization::VH);
        assert_eq!(src, PathBuf::from("/rtc/t064_135523_iw2_tmean_VH.tif"));
        assert_eq!(
            reprojected(&src),
            PathBuf::from("/rtc/t064_135523_iw2_tmean_VH_reprojected.vrt")
        );

        let out = Path::new("/rtc/tile_vrts");
        let id = TileId::new(12, 4);
        assert_eq!(
            tile_mosaic_vrt(out, id, Polarization::VV),
            PathBuf::from("/rtc/tile_vrts/mosaic_h12_v4_VV.vrt")
        );
        assert_eq!(
            tile_raster(out, id, Polarization::VV),
            PathBuf::from("/rtc/tile_vrts/tile_h12_v4_VV.tif")
        );
        assert_eq!(
            area_mosaic_vrt(out, Polarization::VH),
            PathBuf::from("/rtc/tile_vrts/tile_mosaic_VH.vrt")
        );
        assert!("tile_h12_v4_VV.tif".ends_with(&tile_raster_suffix(Polarization::VV)));
    }
}
