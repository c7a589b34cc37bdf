use crate::types::{MosaicError, MosaicResult};
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Moves burst footprints into the tile grid's coordinate system
pub trait FootprintProjector {
    fn project(&self, footprint: &MultiPolygon<f64>) -> MosaicResult<MultiPolygon<f64>>;
}

/// Used when footprints already share the grid's CRS
pub struct IdentityProjector;

impl FootprintProjector for IdentityProjector {
    fn project(&self, footprint: &MultiPolygon<f64>) -> MosaicResult<MultiPolygon<f64>> {
        Ok(footprint.clone())
    }
}

/// OSR coordinate transformation between two EPSG codes
pub struct GdalProjector {
    transform: CoordTransform,
    source_epsg: u32,
    target_epsg: u32,
}

impl GdalProjector {
    pub fn new(source_epsg: u32, target_epsg: u32) -> MosaicResult<Self> {
        let source = SpatialRef::from_epsg(source_epsg)?;
        let target = SpatialRef::from_epsg(target_epsg)?;

        // Footprints are stored x=lon, y=lat regardless of the EPSG axis order
        source.set_axis_mapping_strategy(
            gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER,
        );
        target.set_axis_mapping_strategy(
            gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER,
        );

        let transform = CoordTransform::new(&source, &target)?;
        log::debug!("Footprint transform EPSG:{} -> EPSG:{}", source_epsg, target_epsg);

        Ok(Self {
            transform,
            source_epsg,
            target_epsg,
        })
    }

    fn project_ring(&self, ring: &LineString<f64>) -> MosaicResult<LineString<f64>> {
        let mut xs: Vec<f64> = ring.coords().map(|c| c.x).collect();
        let mut ys: Vec<f64> = ring.coords().map(|c| c.y).collect();
        let mut zs = vec![0.0; xs.len()];

        self.transform
            .transform_coords(&mut xs, &mut ys, &mut zs)
            .map_err(|e| {
                MosaicError::Processing(format!(
                    "Failed to transform footprint from EPSG:{} to EPSG:{}: {}",
                    self.source_epsg, self.target_epsg, e
                ))
            })?;

        Ok(xs
            .into_iter()
            .zip(ys)
            .map(|(x, y)| Coord { x, y })
            .collect::<Vec<_>>()
            .into())
    }
}

impl FootprintProjector for GdalProjector {
    fn project(&self, footprint: &MultiPolygon<f64>) -> MosaicResult<MultiPolygon<f64>> {
        let polygons = footprint
            .iter()
            .map(|polygon| {
                let exterior = self.project_ring(polygon.exterior())?;
                let interiors = polygon
                    .interiors()
                    .iter()
                    .map(|ring| self.project_ring(ring))
                    .collect::<MosaicResult<Vec<_>>>()?;
                Ok(Polygon::new(exterior, interiors))
            })
            .collect::<MosaicResult<Vec<_>>>()?;
        Ok(MultiPolygon::new(polygons))
    }
}

/// Pick the cheapest projector for a source/target pair
pub fn projector_for(source_epsg: u32, target_epsg: u32) -> MosaicResult<Box<dyn FootprintProjector>> {
    if source_epsg == target_epsg {
        Ok(Box::new(IdentityProjector))
    } else {
        Ok(Box::new(GdalProjector::new(source_epsg, target_epsg)?))
    }
}
