use crate::config::MosaicConfig;
use crate::types::{BoundingBox, MosaicError, MosaicResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The raster operations the mosaicking pipeline depends on
///
/// Every call is synchronous and either fully writes `dst` or returns an error.
pub trait RasterToolkit: Send + Sync {
    /// Warp `src` into `target_crs` (nearest neighbour) as a VRT written to `dst`
    fn reproject(&self, src: &Path, dst: &Path, target_crs: &str) -> MosaicResult<()>;

    /// Build a VRT at `dst` referencing `inputs`, honouring `nodata` when given
    fn build_virtual_mosaic(&self, dst: &Path, inputs: &[PathBuf], nodata: Option<&str>) -> MosaicResult<()>;

    /// Warp `src` onto exactly `bbox` in `target_crs`, overwriting `dst`
    fn crop_and_resample(&self, src: &Path, dst: &Path, bbox: &BoundingBox, target_crs: &str) -> MosaicResult<()>;
}

/// `RasterToolkit` backed by the `gdalwarp` and `gdalbuildvrt` executables
#[derive(Debug, Clone)]
pub struct GdalCommandLine {
    gdalwarp: PathBuf,
    gdalbuildvrt: PathBuf,
    nodata: String,
    compression: String,
}

impl GdalCommandLine {
    pub fn new(gdalwarp: PathBuf, gdalbuildvrt: PathBuf, nodata: String, compression: String) -> Self {
        Self {
            gdalwarp,
            gdalbuildvrt,
            nodata,
            compression,
        }
    }

    pub fn from_config(config: &MosaicConfig) -> Self {
        Self::new(
            config.gdalwarp.clone(),
            config.gdalbuildvrt.clone(),
            config.nodata.clone(),
            config.compression.clone(),
        )
    }

    fn reproject_args(&self, src: &Path, dst: &Path, target_crs: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-q", "-t_srs", target_crs, "-r", "near"]
            .iter()
            .map(OsString::from)
            .collect();
        args.extend(self.nodata_args());
        args.extend(["-of", "VRT"].iter().map(OsString::from));
        args.push(src.into());
        args.push(dst.into());
        args
    }

    fn buildvrt_args(&self, dst: &Path, inputs: &[PathBuf], nodata: Option<&str>) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-q", "-r", "nearest"].iter().map(OsString::from).collect();
        if let Some(nodata) = nodata {
            args.extend(
                ["-srcnodata", nodata, "-vrtnodata", nodata]
                    .iter()
                    .map(OsString::from),
            );
        }
        args.push(dst.into());
        args.extend(inputs.iter().map(OsString::from));
        args
    }

    fn crop_args(&self, src: &Path, dst: &Path, bbox: &BoundingBox, target_crs: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-q", "-overwrite", "-t_srs", target_crs, "-et", "0", "-te"]
            .iter()
            .map(OsString::from)
            .collect();
        args.extend(bbox.to_te_args().into_iter().map(OsString::from));
        args.extend(self.nodata_args());
        args.extend(
            [
                "-r".to_string(),
                "near".to_string(),
                "-co".to_string(),
                format!("COMPRESS={}", self.compression),
                "-of".to_string(),
                "GTiff".to_string(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(src.into());
        args.push(dst.into());
        args
    }

    fn nodata_args(&self) -> Vec<OsString> {
        ["-srcnodata", self.nodata.as_str(), "-dstnodata", self.nodata.as_str()]
            .iter()
            .map(OsString::from)
            .collect()
    }
}

/// Run a tool to completion; a non-zero exit becomes `ToolFailed` carrying stderr
pub fn run_tool(tool: &Path, args: &[OsString]) -> MosaicResult<()> {
    let name = tool.display().to_string();
    log::debug!(
        "Running: {} {}",
        name,
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|source| MosaicError::ToolLaunch {
            tool: name.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(MosaicError::ToolFailed {
            tool: name,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

impl RasterToolkit for GdalCommandLine {
    fn reproject(&self, src: &Path, dst: &Path, target_crs: &str) -> MosaicResult<()> {
        run_tool(&self.gdalwarp, &self.reproject_args(src, dst, target_crs))
    }

    fn build_virtual_mosaic(&self, dst: &Path, inputs: &[PathBuf], nodata: Option<&str>) -> MosaicResult<()> {
        run_tool(&self.gdalbuildvrt, &self.buildvrt_args(dst, inputs, nodata))
    }

    fn crop_and_resample(&self, src: &Path, dst: &Path, bbox: &BoundingBox, target_crs: &str) -> MosaicResult<()> {
        run_tool(&self.gdalwarp, &self.crop_args(src, dst, bbox, target_crs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn toolkit() -> GdalCommandLine {
        GdalCommandLine::from_config(&MosaicConfig::default())
    }

    #[test]
    fn test_reproject_arguments() {
        let args = toolkit().reproject_args(Path::new("a.tif"), Path::new("a.vrt"), "EPSG:6933");
        assert_eq!(
            strings(&args),
            vec![
                "-q", "-t_srs", "EPSG:6933", "-r", "near", "-srcnodata", "nan", "-dstnodata", "nan",
                "-of", "VRT", "a.tif", "a.vrt"
            ]
        );
    }

    #[test]
    fn test_crop_arguments_use_exact_extent() {
        let bbox = BoundingBox {
            min_x: -1000.5,
            min_y: 0.0,
            max_x: 149000.25,
            max_y: 150000.0,
        };
        let args = strings(&toolkit().crop_args(Path::new("m.vrt"), Path::new("t.tif"), &bbox, "EPSG:6933"));

        let te = args.iter().position(|a| a == "-te").unwrap();
        assert_eq!(&args[te + 1..te + 5], &["-1000.5", "0", "149000.25", "150000"]);
        assert!(args.contains(&"-overwrite".to_string()));
        assert!(args.contains(&"COMPRESS=LZW".to_string()));
        assert_eq!(args.last().unwrap(), "t.tif");
    }

    #[test]
    fn test_buildvrt_arguments() {
        let inputs = vec![PathBuf::from("x.vrt"), PathBuf::from("y.vrt")];
        let with_nodata = strings(&toolkit().buildvrt_args(Path::new("m.vrt"), &inputs, Some("nan")));
        assert_eq!(
            with_nodata,
            vec!["-q", "-r", "nearest", "-srcnodata", "nan", "-vrtnodata", "nan", "m.vrt", "x.vrt", "y.vrt"]
        );

        let plain = strings(&toolkit().buildvrt_args(Path::new("m.vrt"), &inputs, None));
        assert_eq!(plain, vec!["-q", "-r", "nearest", "m.vrt", "x.vrt", "y.vrt"]);
    }

    #[test]
    fn test_missing_tool_is_a_launch_error() {
        let result = run_tool(Path::new("/nonexistent/gdalwarp"), &[]);
        assert!(matches!(result, Err(MosaicError::ToolLaunch { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_tool_reports_status() {
        let result = run_tool(Path::new("false"), &[]);
        assert!(matches!(result, Err(MosaicError::ToolFailed { .. })));
    }
}
