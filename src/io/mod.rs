//! I/O modules for tile grids, burst footprints and pipeline file naming

pub mod naming;
pub mod tile_grid;
pub mod bursts;
pub mod tile_map;

pub use tile_grid::TileGridReader;
pub use bursts::BurstTableReader;
pub use tile_map::TileMapWriter;
