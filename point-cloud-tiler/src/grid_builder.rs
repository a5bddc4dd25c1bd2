/// Range-grid mesh construction over a pixel region
use crate::error::{MeshError, Result};
use crate::mesh::Mesh;
use crate::partition::PixelRegion;
use crate::projector::{Projection, Projector};
use crate::raster::SourceRasters;

/// Project every pixel of `region` and collect the accepted points.
///
/// The mesh covers exactly the region; vertices follow row-major scan order
/// and projection uses global pixel coordinates.
pub fn build_region(
    rasters: &SourceRasters,
    projector: &Projector,
    region: &PixelRegion,
) -> Result<Mesh> {
    if region.rows.end > rasters.height() || region.cols.end > rasters.width() {
        return Err(MeshError::InvalidPartition(format!(
            "region rows {:?} cols {:?} exceeds {}x{} image",
            region.rows,
            region.cols,
            rasters.width(),
            rasters.height()
        )));
    }

    let mut mesh = Mesh::new(region.cols.len(), region.rows.len());

    for (local_row, row) in region.rows.clone().enumerate() {
        for (local_col, col) in region.cols.clone().enumerate() {
            let projection = projector.project(
                row,
                col,
                rasters.depth(row, col),
                rasters.normal(row, col),
                rasters.color(row, col),
            );
            if let Projection::Valid(point) = projection {
                mesh.push_point(local_row, local_col, point);
            }
        }
    }

    Ok(mesh)
}

/// Build the mesh for the whole image.
pub fn build_full(rasters: &SourceRasters, projector: &Projector) -> Result<Mesh> {
    build_region(
        rasters,
        projector,
        &PixelRegion::new(0..rasters.height(), 0..rasters.width()),
    )
}
