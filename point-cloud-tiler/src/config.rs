/// Camera, tiling and output configuration with JSON file support
use crate::error::Result;
use constants::camera::{
    ACCEPTANCE_HALF_RANGE, FOCAL_LENGTH, NOMINAL_DISTANCE, SENSOR_HEIGHT, SENSOR_WIDTH,
};
use constants::tiling::{DEFAULT_NUM_SAMPLES, DEFAULT_PADDING};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sign applied to depth when it becomes the Z coordinate.
///
/// The acceptance test follows the sign so both conventions keep the same
/// samples: `|Z - nominal| <= r` for `Positive`, `|Z + nominal| <= r` for
/// `Negative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthSign {
    #[default]
    Positive,
    Negative,
}

/// Pinhole camera used to back-project depth samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub focal_length: f32,
    pub sensor_width: f32,
    pub sensor_height: f32,
    pub nominal_distance: f32,
    pub acceptance_half_range: f32,
    pub depth_sign: DepthSign,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            focal_length: FOCAL_LENGTH,
            sensor_width: SENSOR_WIDTH,
            sensor_height: SENSOR_HEIGHT,
            nominal_distance: NOMINAL_DISTANCE,
            acceptance_half_range: ACCEPTANCE_HALF_RANGE,
            depth_sign: DepthSign::Positive,
        }
    }
}

/// Tiles per axis and the overlap added on interior tile edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    pub num_samples: usize,
    pub padding: usize,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            num_samples: DEFAULT_NUM_SAMPLES,
            padding: DEFAULT_PADDING,
        }
    }
}

/// Body encoding for written mesh files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlyFormat {
    #[default]
    BinaryLittleEndian,
    Ascii,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub camera: CameraConfig,
    pub tiling: TilingConfig,
    pub format: PlyFormat,
}

impl PipelineConfig {
    /// Load configuration from a JSON file. Absent fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
