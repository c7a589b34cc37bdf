//! vegmosaic: burst-to-tile assignment and tile mosaicking for Sentinel-1 RTC backscatter
//!
//! Bursts are mapped onto a fixed tile grid by footprint overlap, then every
//! active tile gets one cropped GeoTIFF per polarization built from its
//! reprojected bursts. Raster work is delegated to the GDAL command line tools.

pub mod types;
pub mod config;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use crate::types::{
    BoundingBox, BurstFootprint, MosaicError, MosaicResult, Polarization, Tile, TileGrid, TileId,
};
pub use crate::config::MosaicConfig;
pub use crate::io::{BurstTableReader, TileGridReader, TileMapWriter};
pub use crate::core::{
    AreaMosaicAssembler, AuditVerdict, BurstAssigner, GdalCommandLine, RasterToolkit,
    TileAuditor, TileMosaicBuilder,
};
