//! Depth image to range-grid point mesh conversion, with overlapping tile
//! generation and seamless re-stitching.

pub mod config;
pub mod error;
pub mod grid_builder;
pub mod manifest;
pub mod merger;
pub mod mesh;
pub mod partition;
pub mod pipeline;
pub mod ply;
pub mod projector;
pub mod raster;

mod progress;

pub use config::{CameraConfig, DepthSign, PipelineConfig, PlyFormat, TilingConfig};
pub use error::{MeshError, Result};
pub use merger::{MergeParams, MergeReport};
pub use mesh::{Mesh, Point, RangeGrid};
pub use partition::{PixelRegion, TileDescriptor, TileGrid};
pub use projector::{Projection, Projector};
pub use raster::{Raster, SourceRasters};
