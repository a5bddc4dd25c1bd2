/// PLY header vocabulary for range-grid point meshes

pub const MAGIC: &str = "ply";
pub const FORMAT_BINARY_LE: &str = "binary_little_endian";
pub const FORMAT_ASCII: &str = "ascii";
pub const FORMAT_VERSION: &str = "1.0";
pub const END_HEADER: &str = "end_header";

pub const ELEMENT_VERTEX: &str = "vertex";
pub const ELEMENT_RANGE_GRID: &str = "range_grid";

/// Per-vertex float properties, in file order
pub const VERTEX_FLOAT_PROPERTIES: [&str; 6] = ["x", "y", "z", "nx", "ny", "nz"];

/// Per-vertex colour properties, in file order
pub const VERTEX_COLOUR_PROPERTIES: [&str; 3] = ["red", "green", "blue"];

/// Colour property names some tools write instead of `red/green/blue`
pub const VERTEX_COLOUR_PROPERTIES_ALT: [&str; 3] = ["diffuse_red", "diffuse_green", "diffuse_blue"];

pub const RANGE_GRID_PROPERTY: &str = "property list uchar int vertex_indices";

/// Serialised size of one binary vertex record
pub const BINARY_VERTEX_SIZE: usize = 6 * 4 + 3;

pub const OBJ_INFO_IS_MESH: &str = "is_mesh";
pub const OBJ_INFO_NUM_COLS: &str = "num_cols";
pub const OBJ_INFO_NUM_ROWS: &str = "num_rows";
pub const OBJ_INFO_TILE_ROW: &str = "tile_row";
pub const OBJ_INFO_TILE_COL: &str = "tile_col";
pub const OBJ_INFO_NUM_SAMPLES: &str = "num_samples";
pub const OBJ_INFO_PADDING: &str = "padding";
pub const OBJ_INFO_IMAGE_COLS: &str = "image_cols";
pub const OBJ_INFO_IMAGE_ROWS: &str = "image_rows";
