//! Shared fixtures for the integration suites.

use point_cloud_tiler::{CameraConfig, Raster, SourceRasters};
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Camera with unit pixel pitch on a `width` x `height` sensor.
pub fn unit_pitch_camera(width: usize, height: usize) -> CameraConfig {
    CameraConfig {
        focal_length: 0.05,
        sensor_width: width as f32,
        sensor_height: height as f32,
        nominal_distance: 4.9,
        acceptance_half_range: 3.0,
        ..CameraConfig::default()
    }
}

/// Rasters whose depth comes from `depth_at(row, col)`; colour encodes position.
pub fn rasters_with(
    width: usize,
    height: usize,
    depth_at: impl Fn(usize, usize) -> f32,
) -> SourceRasters {
    let mut color = Raster::filled(width, height, [0u8; 3]);
    let mut depth = Raster::filled(width, height, 0.0f32);
    let mut normal = Raster::filled(width, height, [0.0f32; 3]);
    for row in 0..height {
        for col in 0..width {
            color.set(row, col, [row as u8, col as u8, 200]);
            depth.set(row, col, depth_at(row, col));
            normal.set(row, col, [col as f32, row as f32, 1.0]);
        }
    }
    SourceRasters::new(color, depth, normal).expect("rasters share dimensions")
}

/// Scratch directory removed again when the test that created it finishes.
pub struct ScratchDir(PathBuf);

impl Deref for ScratchDir {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Fresh, empty scratch directory unique to this test process.
pub fn scratch_dir(name: &str) -> ScratchDir {
    let dir = std::env::temp_dir().join(format!(
        "point-cloud-tiler-{}-{}",
        name,
        std::process::id()
    ));
    if dir.exists() {
        fs::remove_dir_all(&dir).expect("clear scratch dir");
    }
    fs::create_dir_all(&dir).expect("create scratch dir");
    ScratchDir(dir)
}

#[test]
fn test_scratch_dir_is_removed_on_drop() {
    let dir = scratch_dir("drop-check");
    fs::write(dir.join("tile.ply"), b"ply\n").unwrap();
    let path = dir.to_path_buf();
    assert!(path.is_dir());

    drop(dir);
    assert!(!path.exists());
}
