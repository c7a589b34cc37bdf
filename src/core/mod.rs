//! Tile assignment, mosaicking and product checks

pub mod projection;
pub mod assignment;
pub mod raster_tools;
pub mod reprojection_cache;
pub mod tile_mosaic;
pub mod tile_audit;
pub mod area_mosaic;

// Re-export main types
pub use projection::{FootprintProjector, GdalProjector, IdentityProjector, projector_for};
pub use assignment::{BurstAssigner, AssignmentStats, map_bursts_to_tiles};
pub use raster_tools::{RasterToolkit, GdalCommandLine};
pub use reprojection_cache::{Reservation, ReprojectionCache};
pub use tile_mosaic::{TileMosaicBuilder, TileOutputs, TileReport, BuildSummary};
pub use tile_audit::{TileAuditor, AuditReport, AuditVerdict, ChannelPresence};
pub use area_mosaic::{AreaMosaicAssembler, ChannelMosaic, collect_tile_rasters};
