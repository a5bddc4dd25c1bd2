/// Stitches tile meshes back into one full-resolution mesh.
///
/// Tiles are folded in `(tile_row, tile_col)` order. Each tile drops its
/// padding pixels, and the rest land at their global position with fresh,
/// contiguous vertex indices.
use crate::config::PlyFormat;
use crate::error::{MeshError, Result};
use crate::manifest::TileManifest;
use crate::mesh::Mesh;
use crate::partition::{TileDescriptor, TileGrid};
use crate::ply::{self, MeshFile, TileInfo};
use crate::progress::progress_bar;
use constants::tiling::tile_file_name;
use log::{info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Geometry of the tile set being merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeParams {
    pub image_width: usize,
    pub image_height: usize,
    pub num_samples: usize,
    pub padding: usize,
}

impl MergeParams {
    pub fn from_manifest(manifest: &TileManifest) -> Self {
        Self {
            image_width: manifest.image_width,
            image_height: manifest.image_height,
            num_samples: manifest.num_samples,
            padding: manifest.padding,
        }
    }

    pub fn tile_grid(&self) -> Result<TileGrid> {
        TileGrid::new(
            self.image_width,
            self.image_height,
            self.num_samples,
            self.padding,
        )
    }
}

/// What a merge consumed and what it had to skip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub merged_tiles: Vec<(usize, usize)>,
    pub missing_tiles: Vec<PathBuf>,
    /// Unreadable tiles and the reason each was rejected.
    pub malformed_tiles: Vec<(PathBuf, String)>,
    pub vertex_count: usize,
}

/// Global vertex list and range grid built up one tile at a time.
pub struct MergeAccumulator {
    grid: TileGrid,
    mesh: Mesh,
}

impl MergeAccumulator {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            mesh: Mesh::new(grid.image_width(), grid.image_height()),
            grid,
        }
    }

    /// Fold one tile in. Returns the number of vertices it contributed.
    ///
    /// `source` only labels errors.
    pub fn absorb(&mut self, tile: &TileDescriptor, mesh: &Mesh, source: &Path) -> Result<usize> {
        let (rows, cols) = (&self.grid.rows, &self.grid.cols);
        let (tile_row, tile_col) = (tile.tile_row, tile.tile_col);
        let local_cols = mesh.cols();
        let local_rows = mesh.rows();

        if local_cols != tile.col_span.len() || local_rows != tile.row_span.len() {
            return Err(MeshError::TilingMismatch {
                path: source.to_path_buf(),
                reason: format!(
                    "tile is {}x{} but the partition expects {}x{}",
                    local_cols,
                    local_rows,
                    tile.col_span.len(),
                    tile.row_span.len()
                ),
            });
        }
        mesh.check_invariants()
            .map_err(|reason| MeshError::malformed(source, reason))?;

        let col_pitch = cols.retained_len(tile_col);
        let col_origin = tile_col * cols.base_pitch();
        let row_origin = tile_row * rows.base_pitch();
        let before = self.mesh.vertices.len();
        let mut retained = 0usize;

        for (local, cell) in mesh.range_grid.cells().iter().enumerate() {
            let (local_row, local_col) = (local / local_cols, local % local_cols);
            if rows.is_padding(tile_row, local_row, local_rows)
                || cols.is_padding(tile_col, local_col, local_cols)
            {
                continue;
            }

            let global_col = retained % col_pitch + col_origin;
            let global_row = retained / col_pitch + row_origin;
            retained += 1;

            if let Some(index) = cell {
                let point = mesh.vertices[*index as usize];
                self.mesh.push_point(global_row, global_col, point);
            }
        }

        Ok(self.mesh.vertices.len() - before)
    }

    pub fn finish(self) -> Mesh {
        self.mesh
    }
}

/// Merge in-memory tile meshes, given in any order, into one mesh.
pub fn merge_meshes(grid: TileGrid, tiles: Vec<(TileDescriptor, Mesh)>) -> Result<Mesh> {
    let mut tiles = tiles;
    tiles.sort_by_key(|(t, _)| (t.tile_row, t.tile_col));

    let mut acc = MergeAccumulator::new(grid);
    for (tile, mesh) in &tiles {
        let label = PathBuf::from(tile_file_name(tile.tile_row, tile.tile_col));
        acc.absorb(tile, mesh, &label)?;
    }
    Ok(acc.finish())
}

/// Reject a tile whose recorded tiling disagrees with the merge parameters.
fn check_tile_info(
    info: &TileInfo,
    tile: &TileDescriptor,
    params: &MergeParams,
    path: &Path,
) -> Result<()> {
    let checks = [
        ("tile_row", info.tile_row, tile.tile_row),
        ("tile_col", info.tile_col, tile.tile_col),
        ("num_samples", info.num_samples, params.num_samples),
        ("padding", info.padding, params.padding),
        ("image_cols", info.image_cols, params.image_width),
        ("image_rows", info.image_rows, params.image_height),
    ];

    match checks.iter().find(|(_, found, expected)| found != expected) {
        Some((key, found, expected)) => Err(MeshError::TilingMismatch {
            path: path.to_path_buf(),
            reason: format!("{} is {} in the file but {} for this merge", key, found, expected),
        }),
        None => Ok(()),
    }
}

/// Read every tile in `dir` and stitch the available ones.
///
/// Missing and malformed tiles are skipped and listed in the report; their
/// region stays invalid. A tile recorded with different tiling parameters
/// aborts the merge.
pub fn merge_tiles(dir: &Path, params: &MergeParams) -> Result<(Mesh, MergeReport)> {
    let grid = params.tile_grid()?;
    let tiles = grid.tiles();

    info!(
        "Merging {}x{} tiles from {} into {}x{} grid",
        params.num_samples,
        params.num_samples,
        dir.display(),
        params.image_width,
        params.image_height
    );

    let pb = progress_bar(tiles.len(), "tiles", "Reading tiles");
    let reads: Vec<(PathBuf, Result<MeshFile>)> = tiles
        .par_iter()
        .map(|tile| {
            let path = dir.join(tile_file_name(tile.tile_row, tile.tile_col));
            let read = ply::read_mesh(&path);
            pb.inc(1);
            (path, read)
        })
        .collect();
    pb.finish_with_message("Tiles read");

    let mut acc = MergeAccumulator::new(grid);
    let mut report = MergeReport::default();

    for (tile, (path, read)) in tiles.iter().zip(reads) {
        let file = match read {
            Ok(file) => file,
            Err(MeshError::MissingTileFile(path)) => {
                warn!("{} does not exist", path.display());
                report.missing_tiles.push(path);
                continue;
            }
            Err(MeshError::MalformedMeshFile { path, reason }) => {
                warn!("Skipping {}: {}", path.display(), reason);
                report.malformed_tiles.push((path, reason));
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some(info) = &file.tile {
            check_tile_info(info, tile, params, &path)?;
        }

        let contributed = acc.absorb(tile, &file.mesh, &path)?;
        log::debug!(
            "Tile ({}, {}) contributed {} vertices",
            tile.tile_row,
            tile.tile_col,
            contributed
        );
        report.merged_tiles.push((tile.tile_row, tile.tile_col));
    }

    let mesh = acc.finish();
    report.vertex_count = mesh.vertices.len();

    info!(
        "Merged {} tiles ({} missing, {} malformed), {} vertices",
        report.merged_tiles.len(),
        report.missing_tiles.len(),
        report.malformed_tiles.len(),
        report.vertex_count
    );

    Ok((mesh, report))
}

/// Merge the tiles in `dir` and write the result to `out_path`.
pub fn merge_to_file(
    dir: &Path,
    params: &MergeParams,
    out_path: &Path,
    format: PlyFormat,
) -> Result<MergeReport> {
    let (mesh, report) = merge_tiles(dir, params)?;
    ply::write_mesh(out_path, &mesh, format, None)?;
    info!("Saved {}", out_path.display());
    Ok(report)
}
