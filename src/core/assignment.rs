use crate::core::projection::{projector_for, FootprintProjector};
use crate::io::TileMapWriter;
use crate::types::{BurstFootprint, MosaicResult, TileGrid};
use geo::{BoundingRect, Intersects, MultiPolygon, Rect};
use std::path::Path;

/// Summary of a burst-to-tile assignment pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentStats {
    pub bursts: usize,
    pub tiles_with_bursts: usize,
    pub unassigned_bursts: usize,
}

/// Spatial join of burst footprints onto the tile grid
pub struct BurstAssigner {
    projector: Box<dyn FootprintProjector>,
}

impl BurstAssigner {
    pub fn new(projector: Box<dyn FootprintProjector>) -> Self {
        Self { projector }
    }

    /// Assigner reprojecting footprints from `source_epsg` into the grid CRS
    pub fn for_grid(grid: &TileGrid, source_epsg: u32) -> MosaicResult<Self> {
        Ok(Self::new(projector_for(source_epsg, grid.epsg)?))
    }

    /// Fill each tile's contributor list with the bursts whose footprint intersects it
    ///
    /// Lists are rebuilt from scratch, keep burst input order and hold no duplicates.
    pub fn assign(&self, grid: &mut TileGrid, bursts: &[BurstFootprint]) -> MosaicResult<AssignmentStats> {
        log::info!("🧩 Assigning {} bursts to {} tiles", bursts.len(), grid.tiles.len());

        let projected = bursts
            .iter()
            .map(|burst| {
                let footprint = self.projector.project(&burst.footprint)?;
                let extent = footprint.bounding_rect();
                Ok((burst.burst_id.as_str(), footprint, extent))
            })
            .collect::<MosaicResult<Vec<(&str, MultiPolygon<f64>, Option<Rect<f64>>)>>>()?;

        let mut assigned = vec![false; projected.len()];
        for tile in grid.tiles.iter_mut() {
            tile.contributors.clear();
            let Some(tile_extent) = tile.boundary.bounding_rect() else {
                continue;
            };

            for (index, (burst_id, footprint, extent)) in projected.iter().enumerate() {
                let candidate = extent.map_or(false, |e| e.intersects(&tile_extent));
                if !candidate || !footprint.intersects(&tile.boundary) {
                    continue;
                }
                assigned[index] = true;
                if !tile.contributors.iter().any(|id| id == burst_id) {
                    tile.contributors.push(burst_id.to_string());
                }
            }
        }

        let stats = AssignmentStats {
            bursts: bursts.len(),
            tiles_with_bursts: grid.tiles.iter().filter(|t| !t.contributors.is_empty()).count(),
            unassigned_bursts: assigned.iter().filter(|a| !**a).count(),
        };
        if stats.unassigned_bursts > 0 {
            log::warn!("{} bursts do not intersect any tile", stats.unassigned_bursts);
        }
        log::info!("✅ {} tiles have at least one contributing burst", stats.tiles_with_bursts);
        Ok(stats)
    }
}

/// Assign bursts to tiles and write the burst-to-tile map for inspection
pub fn map_bursts_to_tiles<P: AsRef<Path>>(
    grid: &mut TileGrid,
    bursts: &[BurstFootprint],
    source_epsg: u32,
    csv_path: P,
) -> MosaicResult<AssignmentStats> {
    let assigner = BurstAssigner::for_grid(grid, source_epsg)?;
    let stats = assigner.assign(grid, bursts)?;
    TileMapWriter::write(grid, csv_path)?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::projection::IdentityProjector;
    use crate::types::{Tile, TileId};
    use geo::polygon;

    fn square(x0: f64, y0: f64, size: f64) -> geo::Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ]
    }

    fn grid() -> TileGrid {
        TileGrid::new(
            vec![
                Tile::new(TileId::new(0, 0), square(0.0, 0.0, 10.0), true),
                Tile::new(TileId::new(1, 0), square(10.0, 0.0, 10.0), true),
                Tile::new(TileId::new(2, 0), square(20.0, 0.0, 10.0), false),
            ],
            4326,
        )
    }

    #[test]
    fn test_overlapping_burst_reaches_both_tiles() {
        let mut grid = grid();
        let bursts = vec![
            BurstFootprint::new("shared", MultiPolygon::new(vec![square(8.0, 2.0, 4.0)])),
            BurstFootprint::new("left", MultiPolygon::new(vec![square(1.0, 1.0, 2.0)])),
            BurstFootprint::new("far", MultiPolygon::new(vec![square(100.0, 100.0, 1.0)])),
        ];

        let assigner = BurstAssigner::new(Box::new(IdentityProjector));
        let stats = assigner.assign(&mut grid, &bursts).unwrap();

        assert_eq!(grid.tiles[0].contributors, vec!["shared", "left"]);
        assert_eq!(grid.tiles[1].contributors, vec!["shared"]);
        assert!(grid.tiles[2].contributors.is_empty());
        assert_eq!(stats.tiles_with_bursts, 2);
        assert_eq!(stats.unassigned_bursts, 1);
    }

    #[test]
    fn test_duplicate_burst_ids_listed_once() {
        let mut grid = grid();
        let bursts = vec![
            BurstFootprint::new("b", MultiPolygon::new(vec![square(1.0, 1.0, 1.0)])),
            BurstFootprint::new("b", MultiPolygon::new(vec![square(3.0, 3.0, 1.0)])),
        ];

        let assigner = BurstAssigner::new(Box::new(IdentityProjector));
        assigner.assign(&mut grid, &bursts).unwrap();
        assert_eq!(grid.tiles[0].contributors, vec!["b"]);
    }

    #[test]
    fn test_reassignment_replaces_previous_lists() {
        let mut grid = grid();
        grid.tiles[2].contributors = vec!["stale".to_string()];

        let assigner = BurstAssigner::for_grid(&grid, 4326).unwrap();
        assigner.assign(&mut grid, &[]).unwrap();
        assert!(grid.tiles.iter().all(|t| t.contributors.is_empty()));
    }

    fn mercator_square(lon0: f64, lat0: f64, size_deg: f64) -> geo::Polygon<f64> {
        let radius = 6_378_137.0;
        let x = |lon: f64| lon.to_radians() * radius;
        let y = |lat: f64| (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() * radius;
        polygon![
            (x: x(lon0), y: y(lat0)),
            (x: x(lon0 + size_deg), y: y(lat0)),
            (x: x(lon0 + size_deg), y: y(lat0 + size_deg)),
            (x: x(lon0), y: y(lat0 + size_deg)),
        ]
    }

    #[test]
    fn test_lon_lat_bursts_join_projected_grid() {
        let mut grid = TileGrid::new(
            vec![
                Tile::new(TileId::new(0, 0), mercator_square(-121.0, 35.0, 1.0), true),
                Tile::new(TileId::new(1, 0), mercator_square(-120.0, 35.0, 1.0), true),
                Tile::new(TileId::new(0, 1), mercator_square(-121.0, 36.0, 1.0), true),
            ],
            3857,
        );
        let bursts = vec![
            BurstFootprint::new("west", MultiPolygon::new(vec![square(-120.8, 35.2, 0.3)])),
            BurstFootprint::new("straddle", MultiPolygon::new(vec![square(-120.2, 35.6, 0.6)])),
        ];

        let assigner = BurstAssigner::for_grid(&grid, 4326).unwrap();
        let stats = assigner.assign(&mut grid, &bursts).unwrap();

        assert_eq!(grid.tiles[0].contributors, vec!["west", "straddle"]);
        assert_eq!(grid.tiles[1].contributors, vec!["straddle"]);
        assert_eq!(grid.tiles[2].contributors, vec!["straddle"]);
        assert_eq!(stats.unassigned_bursts, 0);
    }
}
