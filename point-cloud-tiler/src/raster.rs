/// Colour, depth and normal raster loading
use crate::error::{MeshError, Result};
use exr::image::FlatSamples;
use half::f16;
use image::{ColorType, DynamicImage};
use log::{debug, info};
use std::path::Path;

/// Channels tried, in order, when picking the depth channel of an EXR file.
const DEPTH_CHANNEL_PREFERENCE: [&str; 3] = ["R", "Y", "Z"];

/// Row-major single-layer image.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<T>,
}

impl<T: Copy> Raster<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Raster filled with a single value.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self::new(width, height, vec![value; width * height])
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.pixels[row * self.width + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.pixels[row * self.width + col] = value;
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

/// Registered colour, depth and normal rasters of one capture.
#[derive(Debug, Clone)]
pub struct SourceRasters {
    color: Raster<[u8; 3]>,
    depth: Raster<f32>,
    normal: Raster<[f32; 3]>,
}

impl SourceRasters {
    /// Bundle the three rasters, rejecting any resolution mismatch.
    pub fn new(
        color: Raster<[u8; 3]>,
        depth: Raster<f32>,
        normal: Raster<[f32; 3]>,
    ) -> Result<Self> {
        let expected = depth.dimensions();
        for (raster, found) in [("colour", color.dimensions()), ("normal", normal.dimensions())] {
            if found != expected {
                return Err(MeshError::DimensionMismatch {
                    raster,
                    expected,
                    found,
                });
            }
        }

        Ok(Self {
            color,
            depth,
            normal,
        })
    }

    /// Load colour, depth and normal files from disk.
    pub fn load(color_path: &Path, depth_path: &Path, normal_path: &Path) -> Result<Self> {
        info!("Loading colour raster {}", color_path.display());
        let color = load_color(color_path)?;
        info!("Loading depth raster {}", depth_path.display());
        let depth = load_depth(depth_path)?;
        info!("Loading normal raster {}", normal_path.display());
        let normal = load_normal(normal_path)?;

        Self::new(color, depth, normal)
    }

    pub fn width(&self) -> usize {
        self.depth.width
    }

    pub fn height(&self) -> usize {
        self.depth.height
    }

    pub fn color(&self, row: usize, col: usize) -> [u8; 3] {
        self.color.get(row, col)
    }

    pub fn depth(&self, row: usize, col: usize) -> f32 {
        self.depth.get(row, col)
    }

    pub fn normal(&self, row: usize, col: usize) -> [f32; 3] {
        self.normal.get(row, col)
    }
}

/// Load an 8-bit RGB colour image.
pub fn load_color(path: &Path) -> Result<Raster<[u8; 3]>> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let pixels = rgb.pixels().map(|p| p.0).collect();
    Ok(Raster::new(width, height, pixels))
}

/// Load a normal map, keeping the stored channel values un-normalised.
pub fn load_normal(path: &Path) -> Result<Raster<[f32; 3]>> {
    Ok(pass_through_rgb(&image::open(path)?))
}

/// Load a depth map. EXR files are read directly; other formats use channel 0.
pub fn load_depth(path: &Path) -> Result<Raster<f32>> {
    let is_exr = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("exr"))
        .unwrap_or(false);

    if is_exr {
        return load_exr_depth(path);
    }

    let rgb = pass_through_rgb(&image::open(path)?);
    let pixels = rgb.pixels.iter().map(|p| p[0]).collect();
    Ok(Raster::new(rgb.width, rgb.height, pixels))
}

fn load_exr_depth(path: &Path) -> Result<Raster<f32>> {
    let image = exr::image::read::read_first_flat_layer_from_file(path)?;
    let layer = image.layer_data;
    let (width, height) = (layer.size.width(), layer.size.height());
    let channels = &layer.channel_data.list;

    let channel = DEPTH_CHANNEL_PREFERENCE
        .iter()
        .find_map(|name| {
            channels
                .iter()
                .find(|c| c.name.as_slice() == name.as_bytes())
        })
        .or_else(|| channels.first())
        .ok_or_else(|| {
            MeshError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} has no channels", path.display()),
            ))
        })?;

    debug!(
        "Depth channel '{}' from {}",
        String::from_utf8_lossy(channel.name.as_slice()),
        path.display()
    );

    let pixels: Vec<f32> = match &channel.sample_data {
        FlatSamples::F16(samples) => samples.iter().map(|s: &f16| s.to_f32()).collect(),
        FlatSamples::F32(samples) => samples.clone(),
        FlatSamples::U32(samples) => samples.iter().map(|&s| s as f32).collect(),
    };

    Ok(Raster::new(width, height, pixels))
}

/// Convert to three channels without rescaling integer samples.
fn pass_through_rgb(image: &DynamicImage) -> Raster<[f32; 3]> {
    let (width, height, pixels): (u32, u32, Vec<[f32; 3]>) = match image.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => {
            let buf = image.to_rgb32f();
            (buf.width(), buf.height(), buf.pixels().map(|p| p.0).collect())
        }
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
            let buf = image.to_rgb16();
            let pixels = buf
                .pixels()
                .map(|p| [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32])
                .collect();
            (buf.width(), buf.height(), pixels)
        }
        _ => {
            let buf = image.to_rgb8();
            let pixels = buf
                .pixels()
                .map(|p| [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32])
                .collect();
            (buf.width(), buf.height(), pixels)
        }
    };

    Raster::new(width as usize, height as usize, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let color = Raster::filled(4, 3, [0u8; 3]);
        let depth = Raster::filled(4, 4, 1.0f32);
        let normal = Raster::filled(4, 4, [0.0f32; 3]);

        let err = SourceRasters::new(color, depth, normal).unwrap_err();
        assert!(matches!(
            err,
            MeshError::DimensionMismatch {
                raster: "colour",
                expected: (4, 4),
                found: (4, 3),
            }
        ));
    }

    #[test]
    fn test_16_bit_normals_pass_through() {
        let buf = image::ImageBuffer::from_pixel(2, 1, image::Rgb([1000u16, 2000, 65535]));
        let raster = pass_through_rgb(&DynamicImage::ImageRgb16(buf));
        assert_eq!(raster.get(0, 1), [1000.0, 2000.0, 65535.0]);
    }

    #[test]
    fn test_8_bit_normals_pass_through() {
        let buf = image::ImageBuffer::from_pixel(1, 2, image::Rgb([128u8, 0, 255]));
        let raster = pass_through_rgb(&DynamicImage::ImageRgb8(buf));
        assert_eq!((raster.width, raster.height), (1, 2));
        assert_eq!(raster.get(1, 0), [128.0, 0.0, 255.0]);
    }
}
