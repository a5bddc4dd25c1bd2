/// End-to-end workflows: single-shot generation, tiled generation and merge setup
use crate::config::{CameraConfig, PlyFormat, TilingConfig};
use crate::error::Result;
use crate::grid_builder::{build_full, build_region};
use crate::manifest::{TileEntry, TileManifest};
use crate::merger::MergeParams;
use crate::mesh::Mesh;
use crate::partition::TileGrid;
use crate::ply::{self, TileInfo};
use crate::progress::progress_bar;
use crate::projector::Projector;
use crate::raster::SourceRasters;
use constants::camera::{CAPTURE_HEIGHT, CAPTURE_WIDTH};
use constants::tiling::tile_file_name;
use log::info;
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Project the whole image and write it as one mesh file.
pub fn generate_single(
    rasters: &SourceRasters,
    camera: &CameraConfig,
    out_path: &Path,
    format: PlyFormat,
) -> Result<Mesh> {
    info!(
        "Generating {}x{} point mesh -> {}",
        rasters.width(),
        rasters.height(),
        out_path.display()
    );

    let projector = Projector::new(*camera, rasters.width(), rasters.height());
    let mesh = build_full(rasters, &projector)?;
    ply::write_mesh(out_path, &mesh, format, None)?;

    log_coverage(&mesh);
    info!("Saved {}", out_path.display());
    Ok(mesh)
}

/// Partition the image, write one binary mesh per tile and a manifest.
///
/// Tiles share no state and are generated in parallel.
pub fn generate_tiles(
    rasters: &SourceRasters,
    camera: &CameraConfig,
    tiling: &TilingConfig,
    out_dir: &Path,
) -> Result<TileManifest> {
    let grid = TileGrid::new(
        rasters.width(),
        rasters.height(),
        tiling.num_samples,
        tiling.padding,
    )?;
    fs::create_dir_all(out_dir)?;

    info!(
        "Splitting {}x{} image into {}x{} tiles (padding {}) -> {}",
        rasters.width(),
        rasters.height(),
        tiling.num_samples,
        tiling.num_samples,
        tiling.padding,
        out_dir.display()
    );

    let projector = Projector::new(*camera, rasters.width(), rasters.height());
    let tiles = grid.tiles();
    let pb = progress_bar(tiles.len(), "tiles", "Generating tiles");

    let entries = tiles
        .par_iter()
        .map(|tile| -> Result<TileEntry> {
            let mesh = build_region(rasters, &projector, &tile.region())?;
            let file = tile_file_name(tile.tile_row, tile.tile_col);
            let info = TileInfo {
                tile_row: tile.tile_row,
                tile_col: tile.tile_col,
                num_samples: grid.num_samples(),
                padding: grid.padding(),
                image_cols: grid.image_width(),
                image_rows: grid.image_height(),
            };
            ply::write_mesh(
                &out_dir.join(&file),
                &mesh,
                PlyFormat::BinaryLittleEndian,
                Some(&info),
            )?;
            pb.inc(1);

            Ok(TileEntry {
                descriptor: tile.clone(),
                file,
                vertex_count: mesh.vertices.len(),
            })
        })
        .collect::<Result<Vec<TileEntry>>>()?;
    pb.finish_with_message("Tiles generated");

    let manifest = TileManifest {
        image_width: grid.image_width(),
        image_height: grid.image_height(),
        num_samples: grid.num_samples(),
        padding: grid.padding(),
        camera: *camera,
        tiles: entries,
    };
    manifest.write(out_dir)?;
    Ok(manifest)
}

/// Caller-supplied merge settings; `None` falls back to the tile manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOverrides {
    pub image_width: Option<usize>,
    pub image_height: Option<usize>,
    pub num_samples: Option<usize>,
    pub padding: Option<usize>,
}

/// Combine overrides, the manifest in `dir` and built-in defaults.
pub fn resolve_merge_params(
    dir: &Path,
    overrides: &MergeOverrides,
    tiling: &TilingConfig,
) -> Result<MergeParams> {
    let base = match TileManifest::read(dir)? {
        Some(manifest) => {
            info!("Using tile manifest {}", TileManifest::path_in(dir).display());
            MergeParams::from_manifest(&manifest)
        }
        None => MergeParams {
            image_width: CAPTURE_WIDTH,
            image_height: CAPTURE_HEIGHT,
            num_samples: tiling.num_samples,
            padding: tiling.padding,
        },
    };

    Ok(MergeParams {
        image_width: overrides.image_width.unwrap_or(base.image_width),
        image_height: overrides.image_height.unwrap_or(base.image_height),
        num_samples: overrides.num_samples.unwrap_or(base.num_samples),
        padding: overrides.padding.unwrap_or(base.padding),
    })
}

fn log_coverage(mesh: &Mesh) {
    let total = mesh.range_grid.len();
    let valid = mesh.vertices.len();
    info!(
        "  Valid: {} of {} pixels ({:.1}%)",
        valid,
        total,
        if total > 0 {
            valid as f32 / total as f32 * 100.0
        } else {
            0.0
        }
    );
}
