/// Shared configuration for depth image projection, tiling and mesh files
pub mod camera;
pub mod ply;
pub mod tiling;
