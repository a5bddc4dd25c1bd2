/// Default pinhole camera parameters for depth back-projection

/// Lens focal length (metres)
pub const FOCAL_LENGTH: f32 = 0.05;

/// Physical sensor width (metres)
pub const SENSOR_WIDTH: f32 = 0.025;

/// Physical sensor height (metres)
pub const SENSOR_HEIGHT: f32 = 0.024;

/// Expected camera-to-subject distance used to reject background samples
pub const NOMINAL_DISTANCE: f32 = 4.9;

/// Accepted deviation from the nominal distance (either side)
pub const ACCEPTANCE_HALF_RANGE: f32 = 3.0;

/// Native capture resolution of the scanning rig
pub const CAPTURE_WIDTH: usize = 2160;
pub const CAPTURE_HEIGHT: usize = 3840;
