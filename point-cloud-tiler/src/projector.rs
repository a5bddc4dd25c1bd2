/// Depth sample back-projection onto camera space
use crate::config::{CameraConfig, DepthSign};
use crate::mesh::Point;

/// Outcome of projecting one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// No depth, or depth outside the accepted band around the nominal distance.
    Invalid,
    Valid(Point),
}

/// Projects pixels of a `width` x `height` image through a fixed camera.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    camera: CameraConfig,
    center_x: f32,
    center_y: f32,
    x_pitch: f32,
    y_pitch: f32,
}

impl Projector {
    pub fn new(camera: CameraConfig, width: usize, height: usize) -> Self {
        Self {
            camera,
            center_x: width as f32 / 2.0,
            center_y: height as f32 / 2.0,
            x_pitch: camera.sensor_width / width as f32,
            y_pitch: camera.sensor_height / height as f32,
        }
    }

    /// Project the pixel at global `(row, col)`.
    pub fn project(
        &self,
        row: usize,
        col: usize,
        depth: f32,
        normal: [f32; 3],
        color: [u8; 3],
    ) -> Projection {
        if depth == 0.0 {
            return Projection::Invalid;
        }

        let scale = depth / self.camera.focal_length;
        let x = (col as f32 - self.center_x) * scale * self.x_pitch;
        let y = (self.center_y - row as f32) * scale * self.y_pitch;

        let (z, deviation) = match self.camera.depth_sign {
            DepthSign::Positive => (depth, depth - self.camera.nominal_distance),
            DepthSign::Negative => (-depth, -depth + self.camera.nominal_distance),
        };
        if deviation.abs() > self.camera.acceptance_half_range {
            return Projection::Invalid;
        }

        Projection::Valid(Point {
            position: [x, y, z],
            normal,
            color,
        })
    }
}
