use crate::types::{MosaicError, MosaicResult, Tile, TileGrid, TileId};
use geojson::{Feature, FeatureCollection, GeoJson};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::OnceLock;

/// CRS assumed by GeoJSON when no `crs` member is present
const GEOJSON_DEFAULT_EPSG: u32 = 4326;

/// Reader for the reference tile grid (GeoJSON polygons with `h`, `v`, `mask`)
pub struct TileGridReader;

impl TileGridReader {
    /// Read a tile grid file; `epsg_override` replaces whatever CRS the file declares
    pub fn read<P: AsRef<Path>>(path: P, epsg_override: Option<u32>) -> MosaicResult<TileGrid> {
        log::info!("Reading tile grid from: {}", path.as_ref().display());
        let text = std::fs::read_to_string(path.as_ref())?;
        let grid = Self::parse(&text, epsg_override)?;
        log::info!(
            "Loaded {} tiles ({} active) in EPSG:{}",
            grid.tiles.len(),
            grid.active_count(),
            grid.epsg
        );
        Ok(grid)
    }

    pub fn parse(text: &str, epsg_override: Option<u32>) -> MosaicResult<TileGrid> {
        let geojson: GeoJson = text.parse()?;
        let collection = FeatureCollection::try_from(geojson)?;

        let declared = collection
            .foreign_members
            .as_ref()
            .and_then(|members| members.get("crs"))
            .map(parse_crs_member)
            .transpose()?;
        let epsg = match (epsg_override, declared) {
            (Some(epsg), _) => epsg,
            (None, Some(epsg)) => epsg,
            (None, None) => {
                log::warn!("Tile grid declares no CRS, assuming EPSG:{}", GEOJSON_DEFAULT_EPSG);
                GEOJSON_DEFAULT_EPSG
            }
        };

        let tiles = collection
            .features
            .iter()
            .enumerate()
            .map(|(index, feature)| parse_tile(index, feature))
            .collect::<MosaicResult<Vec<_>>>()?;

        Ok(TileGrid::new(tiles, epsg))
    }
}

fn parse_tile(index: usize, feature: &Feature) -> MosaicResult<Tile> {
    let h = integer_property(feature, "h", index)?;
    let v = integer_property(feature, "v", index)?;
    let active = match feature.property("mask") {
        Some(value) => mask_flag(value).ok_or_else(|| {
            MosaicError::InvalidFormat(format!("Feature {} has an unreadable mask: {}", index, value))
        })?,
        // Grids without a mask column process every tile
        None => true,
    };

    let geometry = feature.geometry.clone().ok_or_else(|| {
        MosaicError::InvalidFormat(format!("Feature {} (h{}v{}) has no geometry", index, h, v))
    })?;
    let boundary = match geo::Geometry::<f64>::try_from(geometry)? {
        geo::Geometry::Polygon(polygon) => polygon,
        geo::Geometry::MultiPolygon(multi) if multi.0.len() == 1 => {
            multi.0.into_iter().next().ok_or_else(|| {
                MosaicError::InvalidFormat(format!("Feature {} has an empty MultiPolygon", index))
            })?
        }
        _ => {
            return Err(MosaicError::InvalidFormat(format!(
                "Feature {} (h{}v{}) is not a polygon",
                index, h, v
            )))
        }
    };

    Ok(Tile::new(TileId::new(h, v), boundary, active))
}

fn integer_property(feature: &Feature, key: &str, index: usize) -> MosaicResult<i64> {
    let value = feature.property(key).ok_or_else(|| {
        MosaicError::InvalidFormat(format!("Feature {} is missing property '{}'", index, key))
    })?;
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .ok_or_else(|| {
            MosaicError::InvalidFormat(format!(
                "Feature {} property '{}' is not an integer: {}",
                index, key, value
            ))
        })
}

fn mask_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim() {
            "1" | "true" | "True" => Some(true),
            "0" | "false" | "False" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Extract the EPSG code from a legacy GeoJSON `crs` member
fn parse_crs_member(member: &Value) -> MosaicResult<u32> {
    let name = member
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| MosaicError::InvalidFormat(format!("Unsupported crs member: {}", member)))?;
    epsg_from_name(name)
}

/// `EPSG:n` and `urn:ogc:def:crs:EPSG::n`, compiled once per process
fn epsg_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)EPSG:{1,2}(\d+)").expect("EPSG pattern is a valid regex"))
}

pub fn epsg_from_name(name: &str) -> MosaicResult<u32> {
    if name.ends_with("CRS84") {
        return Ok(GEOJSON_DEFAULT_EPSG);
    }
    epsg_pattern()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|code| code.as_str().parse().ok())
        .ok_or_else(|| MosaicError::InvalidFormat(format!("Cannot read EPSG code from '{}'", name)))
}
