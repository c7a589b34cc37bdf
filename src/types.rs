use geo::{BoundingRect, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Polarization channels produced by Sentinel-1 RTC processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Polarization {
    VV,
    VH,
    HV,
    HH,
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::VV => write!(f, "VV"),
            Polarization::VH => write!(f, "VH"),
            Polarization::HV => write!(f, "HV"),
            Polarization::HH => write!(f, "HH"),
        }
    }
}

impl FromStr for Polarization {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "VV" => Ok(Polarization::VV),
            "VH" => Ok(Polarization::VH),
            "HV" => Ok(Polarization::HV),
            "HH" => Ok(Polarization::HH),
            _ => Err(MosaicError::InvalidFormat(format!("Invalid polarization: {}", s))),
        }
    }
}

/// Grid position of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    pub h: i64,
    pub v: i64,
}

impl TileId {
    pub fn new(h: i64, v: i64) -> Self {
        Self { h, v }
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "h{}v{}", self.h, self.v)
    }
}

/// Rectangular extent in the coordinates of the tile grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Extent of a polygon, `None` for an empty polygon
    pub fn of_polygon(polygon: &Polygon<f64>) -> Option<Self> {
        polygon.bounding_rect().map(|rect| Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        })
    }

    /// `gdalwarp -te` ordering: xmin ymin xmax ymax
    pub fn to_te_args(&self) -> [String; 4] {
        [
            self.min_x.to_string(),
            self.min_y.to_string(),
            self.max_x.to_string(),
            self.max_y.to_string(),
        ]
    }
}

/// A cell of the output grid
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    /// Boundary in the grid's coordinate system
    pub boundary: Polygon<f64>,
    /// Whether outputs are expected for this tile
    pub active: bool,
    /// Burst identifiers whose footprint intersects the boundary, filled by assignment
    pub contributors: Vec<String>,
}

impl Tile {
    pub fn new(id: TileId, boundary: Polygon<f64>, active: bool) -> Self {
        Self {
            id,
            boundary,
            active,
            contributors: Vec::new(),
        }
    }

    pub fn bounding_box(&self) -> MosaicResult<BoundingBox> {
        BoundingBox::of_polygon(&self.boundary).ok_or_else(|| {
            MosaicError::InvalidFormat(format!("Tile {} has an empty boundary", self.id))
        })
    }
}

/// The reference tile grid with its coordinate system
#[derive(Debug, Clone)]
pub struct TileGrid {
    pub tiles: Vec<Tile>,
    pub epsg: u32,
}

impl TileGrid {
    pub fn new(tiles: Vec<Tile>, epsg: u32) -> Self {
        Self { tiles, epsg }
    }

    /// CRS string understood by the GDAL command line tools
    pub fn target_crs(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }

    pub fn active_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.active).count()
    }
}

/// Footprint of a single RTC burst raster
#[derive(Debug, Clone)]
pub struct BurstFootprint {
    pub burst_id: String,
    /// Footprint in the burst summary's CRS; antimeridian bursts have two parts
    pub footprint: MultiPolygon<f64>,
}

impl BurstFootprint {
    pub fn new(burst_id: impl Into<String>, footprint: MultiPolygon<f64>) -> Self {
        Self {
            burst_id: burst_id.into(),
            footprint,
        }
    }
}

/// Error types for tile mosaicking
#[derive(Debug, thiserror::Error)]
pub enum MosaicError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("WKT parsing error: {0}")]
    Wkt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Reprojection of {} failed in another task: {message}", path.display())]
    Reprojection { path: PathBuf, message: String },

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for mosaicking operations
pub type MosaicResult<T> = Result<T, MosaicError>;
