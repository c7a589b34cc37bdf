use crate::types::{MosaicResult, TileGrid};
use serde::Serialize;
use std::path::Path;
use wkt::ToWkt;

/// One exported row of the burst-to-tile map
#[derive(Debug, Serialize)]
struct TileMapRow {
    h: i64,
    v: i64,
    mask: u8,
    geometry: String,
    overlapping_bursts: String,
}

/// Writer for the assignment side output (`burst_to_tile_map.csv`)
pub struct TileMapWriter;

impl TileMapWriter {
    pub fn write<P: AsRef<Path>>(grid: &TileGrid, path: P) -> MosaicResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path.as_ref())?;
        Self::write_to(grid, file)?;
        log::info!("Burst-to-tile map written to: {}", path.as_ref().display());
        Ok(())
    }

    pub fn write_to<W: std::io::Write>(grid: &TileGrid, writer: W) -> MosaicResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for tile in &grid.tiles {
            csv_writer.serialize(TileMapRow {
                h: tile.id.h,
                v: tile.id.v,
                mask: u8::from(tile.active),
                geometry: tile.boundary.wkt_string(),
                overlapping_bursts: tile.contributors.join(","),
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Tile, TileId};
    use geo::polygon;

    #[test]
    fn test_rows_carry_wkt_and_joined_bursts() {
        let mut covered = Tile::new(
            TileId::new(0, 1),
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
            true,
        );
        covered.contributors = vec!["b1".to_string(), "b2".to_string()];
        let empty = Tile::new(
            TileId::new(1, 1),
            polygon![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0)],
            false,
        );
        let grid = TileGrid::new(vec![covered, empty], 4326);

        let mut buffer = Vec::new();
        TileMapWriter::write_to(&grid, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "h,v,mask,geometry,overlapping_bursts");
        assert!(lines[1].starts_with("0,1,1,\"POLYGON"));
        assert!(lines[1].ends_with(",\"b1,b2\""));
        assert!(lines[2].starts_with("1,1,0,"));
        assert!(lines[2].ends_with(','));
    }
}
