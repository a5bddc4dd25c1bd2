/// Tile partitioning defaults and on-disk naming

/// Tiles per image axis
pub const DEFAULT_NUM_SAMPLES: usize = 5;

/// Overlap in pixels added on interior tile edges
pub const DEFAULT_PADDING: usize = 8;

/// Manifest written beside generated tiles
pub const TILE_MANIFEST_NAME: &str = "tiles.json";

/// File name for the tile at `(tile_row, tile_col)`.
pub fn tile_file_name(tile_row: usize, tile_col: usize) -> String {
    format!("result{} {}.ply", tile_row, tile_col)
}
