use crate::types::{BurstFootprint, MosaicError, MosaicResult};
use geo::{Geometry, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use serde::Deserialize;
use std::path::Path;
use wkt::TryFromWkt;

/// One row of a burst summary table
#[derive(Debug, Deserialize)]
struct BurstRecord {
    burst_id: String,
    /// Footprint as WKT
    geometry: String,
}

/// Reader for burst footprint summaries (CSV with WKT, or GeoJSON)
pub struct BurstTableReader;

impl BurstTableReader {
    /// Read footprints, choosing the format from the file extension
    pub fn read<P: AsRef<Path>>(path: P) -> MosaicResult<Vec<BurstFootprint>> {
        let path = path.as_ref();
        log::info!("Reading burst footprints from: {}", path.display());

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let bursts = match extension.as_str() {
            "geojson" | "json" => Self::parse_geojson(&std::fs::read_to_string(path)?)?,
            _ => Self::read_csv(std::fs::File::open(path)?)?,
        };

        log::info!("Loaded {} burst footprints", bursts.len());
        Ok(bursts)
    }

    /// Parse a CSV stream with `burst_id` and `geometry` columns; other columns are ignored
    pub fn read_csv<R: std::io::Read>(reader: R) -> MosaicResult<Vec<BurstFootprint>> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut bursts = Vec::new();

        for record in csv_reader.deserialize() {
            let record: BurstRecord = record?;
            let geometry = Geometry::<f64>::try_from_wkt_str(&record.geometry).map_err(|e| {
                MosaicError::Wkt(format!("burst {}: {}", record.burst_id, e))
            })?;
            let footprint = to_multipolygon(geometry, &record.burst_id)?;
            bursts.push(BurstFootprint::new(record.burst_id, footprint));
        }

        Ok(bursts)
    }

    /// Parse a GeoJSON collection whose features carry a `burst_id` property
    pub fn parse_geojson(text: &str) -> MosaicResult<Vec<BurstFootprint>> {
        let geojson: GeoJson = text.parse()?;
        let collection = FeatureCollection::try_from(geojson)?;

        collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| {
                let burst_id = feature
                    .property("burst_id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        MosaicError::InvalidFormat(format!("Feature {} has no burst_id", index))
                    })?;
                let geometry = feature.geometry.ok_or_else(|| {
                    MosaicError::InvalidFormat(format!("Burst {} has no geometry", burst_id))
                })?;
                let footprint = to_multipolygon(Geometry::<f64>::try_from(geometry)?, &burst_id)?;
                Ok(BurstFootprint::new(burst_id, footprint))
            })
            .collect()
    }
}

fn to_multipolygon(geometry: Geometry<f64>, burst_id: &str) -> MosaicResult<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi) => Ok(multi),
        _ => Err(MosaicError::InvalidFormat(format!(
            "Footprint of burst {} is not polygonal",
            burst_id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_with_extra_columns() {
        let csv_text = "burst_id,n_acquisitions,geometry\n\
            t064_135523_iw2,12,\"POLYGON ((-120 35, -119 35, -119 36, -120 36, -120 35))\"\n\
            t064_135524_iw2,11,\"MULTIPOLYGON (((179 10, 180 10, 180 11, 179 11, 179 10)), ((-180 10, -179 10, -179 11, -180 11, -180 10)))\"\n";

        let bursts = BurstTableReader::read_csv(csv_text.as_bytes()).unwrap();
        assert_eq!(bursts.len(), 2);
        assert_eq!(bursts[0].burst_id, "t064_135523_iw2");
        assert_eq!(bursts[0].footprint.0.len(), 1);
        assert_eq!(bursts[1].footprint.0.len(), 2);
    }

    #[test]
    fn test_point_footprint_rejected() {
        let csv_text = "burst_id,geometry\nb1,POINT (1 2)\n";
        assert!(BurstTableReader::read_csv(csv_text.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_geojson() {
        let text = r#"{ "type": "FeatureCollection", "features": [
            { "type": "Feature", "properties": { "burst_id": "b1" },
              "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]] } } ] }"#;
        let bursts = BurstTableReader::parse_geojson(text).unwrap();
        assert_eq!(bursts.len(), 1);
        assert_eq!(bursts[0].burst_id, "b1");
    }
}
