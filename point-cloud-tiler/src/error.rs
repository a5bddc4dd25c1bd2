/// Error types for raster loading, mesh encoding and tile merging.
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum MeshError {
    /// Colour, depth and normal rasters must share one resolution.
    #[error("{raster} raster is {found:?} but depth raster is {expected:?}")]
    DimensionMismatch {
        raster: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("tile file {} does not exist", .0.display())]
    MissingTileFile(PathBuf),

    #[error("malformed mesh file {}: {reason}", .path.display())]
    MalformedMeshFile { path: PathBuf, reason: String },

    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    /// Tile header disagrees with the parameters the merge was asked to use.
    #[error("tile {} does not match merge parameters: {reason}", .path.display())]
    TilingMismatch { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("EXR error: {0}")]
    Exr(#[from] exr::error::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MeshError {
    /// Whether a merge may skip the tile and carry on with the rest.
    pub fn is_tile_unavailable(&self) -> bool {
        matches!(
            self,
            MeshError::MissingTileFile(_) | MeshError::MalformedMeshFile { .. }
        )
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MeshError::MalformedMeshFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MeshError>;
