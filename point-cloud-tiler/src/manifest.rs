/// Tile set manifest written beside generated tiles.
use crate::config::CameraConfig;
use crate::error::Result;
use crate::partition::TileDescriptor;
use constants::tiling::TILE_MANIFEST_NAME;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Describes one generated tile file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TileEntry {
    #[serde(flatten)]
    pub descriptor: TileDescriptor,
    /// File name relative to the tile directory.
    pub file: String,
    pub vertex_count: usize,
}

/// Everything needed to stitch a tile directory back together.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TileManifest {
    pub image_width: usize,
    pub image_height: usize,
    pub num_samples: usize,
    pub padding: usize,
    /// Camera the tiles were projected with.
    pub camera: CameraConfig,
    pub tiles: Vec<TileEntry>,
}

impl TileManifest {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(TILE_MANIFEST_NAME)
    }

    /// Write `tiles.json` into `dir`.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(dir);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!("Generated tile manifest: {}", path.display());
        self.log_summary();
        Ok(path)
    }

    /// Read the manifest in `dir`, if one was written.
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = Self::path_in(dir);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    pub fn total_vertices(&self) -> usize {
        self.tiles.iter().map(|t| t.vertex_count).sum()
    }

    fn log_summary(&self) {
        info!("Manifest Summary:");
        info!("  Image: {}x{}", self.image_width, self.image_height);
        info!(
            "  Tiles: {}x{} with {} px padding",
            self.num_samples, self.num_samples, self.padding
        );
        info!("  Tile vertices (padding included): {}", self.total_vertices());
    }
}
