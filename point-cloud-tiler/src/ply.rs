/// PLY reader/writer for range-grid point meshes
///
/// Layout: ASCII header, then either a little-endian binary body
/// (`6 x f32`, `3 x u8` per vertex; `u8` count plus optional `u32` index per
/// grid cell) or the equivalent ASCII rows.
use crate::config::PlyFormat;
use crate::error::{MeshError, Result};
use crate::mesh::{Mesh, Point, RangeGrid};
use constants::ply::{
    BINARY_VERTEX_SIZE, ELEMENT_RANGE_GRID, ELEMENT_VERTEX, END_HEADER, FORMAT_ASCII,
    FORMAT_BINARY_LE, FORMAT_VERSION, MAGIC, OBJ_INFO_IMAGE_COLS, OBJ_INFO_IMAGE_ROWS,
    OBJ_INFO_IS_MESH, OBJ_INFO_NUM_COLS, OBJ_INFO_NUM_ROWS, OBJ_INFO_NUM_SAMPLES,
    OBJ_INFO_PADDING, OBJ_INFO_TILE_COL, OBJ_INFO_TILE_ROW, RANGE_GRID_PROPERTY,
    VERTEX_COLOUR_PROPERTIES, VERTEX_COLOUR_PROPERTIES_ALT, VERTEX_FLOAT_PROPERTIES,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Upper bound on header lines before the header is considered corrupt.
const MAX_HEADER_LINES: usize = 256;

/// Cap on pre-allocation driven by header counts.
const MAX_PREALLOCATED: usize = 1 << 20;

/// Tiling parameters recorded in a tile's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInfo {
    pub tile_row: usize,
    pub tile_col: usize,
    pub num_samples: usize,
    pub padding: usize,
    pub image_cols: usize,
    pub image_rows: usize,
}

/// A decoded mesh file.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshFile {
    pub format: PlyFormat,
    pub mesh: Mesh,
    pub tile: Option<TileInfo>,
}

/// Write a mesh to `path`.
pub fn write_mesh(
    path: &Path,
    mesh: &Mesh,
    format: PlyFormat,
    tile: Option<&TileInfo>,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    encode(&mut writer, mesh, format, tile)?;
    writer.flush()?;
    Ok(())
}

/// Read a mesh from `path`. A missing file is reported as `MissingTileFile`.
pub fn read_mesh(path: &Path) -> Result<MeshFile> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(MeshError::MissingTileFile(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    decode(&mut BufReader::new(file), path)
}

pub fn encode<W: Write>(
    writer: &mut W,
    mesh: &Mesh,
    format: PlyFormat,
    tile: Option<&TileInfo>,
) -> io::Result<()> {
    write_header(writer, mesh, format, tile)?;

    match format {
        PlyFormat::BinaryLittleEndian => {
            for point in &mesh.vertices {
                for value in point.position.iter().chain(point.normal.iter()) {
                    writer.write_all(&value.to_le_bytes())?;
                }
                writer.write_all(&point.color)?;
            }
            for cell in mesh.range_grid.cells() {
                match cell {
                    Some(index) => {
                        writer.write_all(&[1])?;
                        writer.write_all(&index.to_le_bytes())?;
                    }
                    None => writer.write_all(&[0])?,
                }
            }
        }
        PlyFormat::Ascii => {
            for p in &mesh.vertices {
                writeln!(
                    writer,
                    "{} {} {} {} {} {} {} {} {}",
                    p.position[0],
                    p.position[1],
                    p.position[2],
                    p.normal[0],
                    p.normal[1],
                    p.normal[2],
                    p.color[0],
                    p.color[1],
                    p.color[2]
                )?;
            }
            for cell in mesh.range_grid.cells() {
                match cell {
                    Some(index) => writeln!(writer, "1 {}", index)?,
                    None => writeln!(writer, "0")?,
                }
            }
        }
    }

    Ok(())
}

fn write_header<W: Write>(
    writer: &mut W,
    mesh: &Mesh,
    format: PlyFormat,
    tile: Option<&TileInfo>,
) -> io::Result<()> {
    let format_name = match format {
        PlyFormat::BinaryLittleEndian => FORMAT_BINARY_LE,
        PlyFormat::Ascii => FORMAT_ASCII,
    };

    writeln!(writer, "{}", MAGIC)?;
    writeln!(writer, "format {} {}", format_name, FORMAT_VERSION)?;
    writeln!(writer, "obj_info {} 0", OBJ_INFO_IS_MESH)?;
    writeln!(writer, "obj_info {} {}", OBJ_INFO_NUM_COLS, mesh.cols())?;
    writeln!(writer, "obj_info {} {}", OBJ_INFO_NUM_ROWS, mesh.rows())?;

    if let Some(tile) = tile {
        for (key, value) in [
            (OBJ_INFO_TILE_ROW, tile.tile_row),
            (OBJ_INFO_TILE_COL, tile.tile_col),
            (OBJ_INFO_NUM_SAMPLES, tile.num_samples),
            (OBJ_INFO_PADDING, tile.padding),
            (OBJ_INFO_IMAGE_COLS, tile.image_cols),
            (OBJ_INFO_IMAGE_ROWS, tile.image_rows),
        ] {
            writeln!(writer, "obj_info {} {}", key, value)?;
        }
    }

    writeln!(writer, "element {} {}", ELEMENT_VERTEX, mesh.vertices.len())?;
    for name in VERTEX_FLOAT_PROPERTIES {
        writeln!(writer, "property float {}", name)?;
    }
    for name in VERTEX_COLOUR_PROPERTIES {
        writeln!(writer, "property uchar {}", name)?;
    }
    writeln!(writer, "element {} {}", ELEMENT_RANGE_GRID, mesh.range_grid.len())?;
    writeln!(writer, "{}", RANGE_GRID_PROPERTY)?;
    writeln!(writer, "{}", END_HEADER)?;
    Ok(())
}

/// Header fields gathered while parsing.
#[derive(Default)]
struct Header {
    format: Option<PlyFormat>,
    cols: Option<usize>,
    rows: Option<usize>,
    vertex_count: Option<usize>,
    range_grid_count: Option<usize>,
    vertex_properties: Vec<String>,
    range_grid_properties: Vec<String>,
    tile_row: Option<usize>,
    tile_col: Option<usize>,
    num_samples: Option<usize>,
    padding: Option<usize>,
    image_cols: Option<usize>,
    image_rows: Option<usize>,
}

impl Header {
    fn tile_info(&self) -> Option<TileInfo> {
        Some(TileInfo {
            tile_row: self.tile_row?,
            tile_col: self.tile_col?,
            num_samples: self.num_samples?,
            padding: self.padding?,
            image_cols: self.image_cols?,
            image_rows: self.image_rows?,
        })
    }
}

#[derive(Clone, Copy)]
enum Section {
    None,
    Vertex,
    RangeGrid,
}

/// Decode a mesh. `path` only labels errors.
pub fn decode<R: BufRead>(reader: &mut R, path: &Path) -> Result<MeshFile> {
    let header = read_header(reader, path)?;
    let bad = |reason: String| MeshError::malformed(path, reason);

    let format = header.format.ok_or_else(|| bad("missing format line".into()))?;
    let cols = header.cols.ok_or_else(|| bad("missing num_cols".into()))?;
    let rows = header.rows.ok_or_else(|| bad("missing num_rows".into()))?;
    let vertex_count = header
        .vertex_count
        .ok_or_else(|| bad("missing vertex element".into()))?;
    let grid_count = header
        .range_grid_count
        .ok_or_else(|| bad("missing range_grid element".into()))?;

    let pixel_count = cols
        .checked_mul(rows)
        .ok_or_else(|| bad(format!("{}x{} grid overflows", cols, rows)))?;
    if grid_count != pixel_count {
        return Err(bad(format!(
            "range_grid has {} entries for a {}x{} grid",
            grid_count, cols, rows
        )));
    }
    check_vertex_properties(&header.vertex_properties).map_err(bad)?;
    if header.range_grid_properties != [RANGE_GRID_PROPERTY] {
        return Err(bad(format!(
            "unexpected range_grid properties {:?}",
            header.range_grid_properties
        )));
    }

    let (vertices, cells) = match format {
        PlyFormat::BinaryLittleEndian => read_binary_body(reader, vertex_count, grid_count),
        PlyFormat::Ascii => read_ascii_body(reader, vertex_count, grid_count),
    }
    .map_err(|e| match e {
        BodyError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            bad("truncated body".into())
        }
        BodyError::Io(e) => MeshError::Io(e),
        BodyError::Invalid(reason) => bad(reason),
    })?;

    let mesh = Mesh {
        vertices,
        range_grid: RangeGrid::from_cells(cols, rows, cells),
    };
    mesh.check_invariants().map_err(bad)?;

    Ok(MeshFile {
        format,
        mesh,
        tile: header.tile_info(),
    })
}

fn read_header<R: BufRead>(reader: &mut R, path: &Path) -> Result<Header> {
    let bad = |reason: String| MeshError::malformed(path, reason);
    let mut header = Header::default();
    let mut section = Section::None;
    let mut line = String::new();

    for line_no in 0..MAX_HEADER_LINES {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => bad("header is not text".into()),
            _ => MeshError::Io(e),
        })?;
        if read == 0 {
            return Err(bad("file ends inside header".into()));
        }

        let text = line.trim_end_matches(['\n', '\r']);
        if line_no == 0 {
            if text != MAGIC {
                return Err(bad("missing ply magic".into()));
            }
            continue;
        }

        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            [END_HEADER] => return Ok(header),
            ["comment", ..] | [] => {}
            ["format", name, version] => {
                if *version != FORMAT_VERSION {
                    return Err(bad(format!("unsupported version {}", version)));
                }
                header.format = Some(match *name {
                    FORMAT_BINARY_LE => PlyFormat::BinaryLittleEndian,
                    FORMAT_ASCII => PlyFormat::Ascii,
                    other => return Err(bad(format!("unsupported format {}", other))),
                });
            }
            ["obj_info", key, value] => {
                let slot = match *key {
                    OBJ_INFO_NUM_COLS => &mut header.cols,
                    OBJ_INFO_NUM_ROWS => &mut header.rows,
                    OBJ_INFO_TILE_ROW => &mut header.tile_row,
                    OBJ_INFO_TILE_COL => &mut header.tile_col,
                    OBJ_INFO_NUM_SAMPLES => &mut header.num_samples,
                    OBJ_INFO_PADDING => &mut header.padding,
                    OBJ_INFO_IMAGE_COLS => &mut header.image_cols,
                    OBJ_INFO_IMAGE_ROWS => &mut header.image_rows,
                    _ => continue,
                };
                *slot = Some(parse_count(value).map_err(bad)?);
            }
            ["obj_info", ..] => {}
            ["element", name, count] => {
                let count = parse_count(count).map_err(bad)?;
                section = match *name {
                    ELEMENT_VERTEX => {
                        header.vertex_count = Some(count);
                        Section::Vertex
                    }
                    ELEMENT_RANGE_GRID => {
                        header.range_grid_count = Some(count);
                        Section::RangeGrid
                    }
                    other => return Err(bad(format!("unsupported element {}", other))),
                };
            }
            ["property", ..] => match section {
                Section::Vertex => header.vertex_properties.push(tokens[1..].join(" ")),
                Section::RangeGrid => header.range_grid_properties.push(text.to_string()),
                Section::None => return Err(bad("property before any element".into())),
            },
            _ => return Err(bad(format!("unrecognised header line '{}'", text))),
        }
    }

    Err(bad("header too long".into()))
}

fn parse_count(value: &str) -> std::result::Result<usize, String> {
    value
        .parse()
        .map_err(|_| format!("'{}' is not a count", value))
}

fn check_vertex_properties(properties: &[String]) -> std::result::Result<(), String> {
    let floats = VERTEX_FLOAT_PROPERTIES.iter().map(|n| format!("float {}", n));
    let expected: Vec<String> = floats
        .clone()
        .chain(VERTEX_COLOUR_PROPERTIES.iter().map(|n| format!("uchar {}", n)))
        .collect();
    let alternative: Vec<String> = floats
        .chain(VERTEX_COLOUR_PROPERTIES_ALT.iter().map(|n| format!("uchar {}", n)))
        .collect();

    if properties == expected.as_slice() || properties == alternative.as_slice() {
        Ok(())
    } else {
        Err(format!("unexpected vertex properties {:?}", properties))
    }
}

enum BodyError {
    Io(io::Error),
    Invalid(String),
}

impl From<io::Error> for BodyError {
    fn from(err: io::Error) -> Self {
        BodyError::Io(err)
    }
}

type Body = (Vec<Point>, Vec<Option<u32>>);

fn read_binary_body<R: Read>(
    reader: &mut R,
    vertex_count: usize,
    grid_count: usize,
) -> std::result::Result<Body, BodyError> {
    let mut vertices = Vec::with_capacity(vertex_count.min(MAX_PREALLOCATED));
    let mut record = [0u8; BINARY_VERTEX_SIZE];
    for _ in 0..vertex_count {
        reader.read_exact(&mut record)?;
        let float = |i: usize| {
            f32::from_le_bytes([
                record[i * 4],
                record[i * 4 + 1],
                record[i * 4 + 2],
                record[i * 4 + 3],
            ])
        };
        vertices.push(Point {
            position: [float(0), float(1), float(2)],
            normal: [float(3), float(4), float(5)],
            color: [record[24], record[25], record[26]],
        });
    }

    let mut cells = Vec::with_capacity(grid_count.min(MAX_PREALLOCATED));
    for entry in 0..grid_count {
        let mut count = [0u8; 1];
        reader.read_exact(&mut count)?;
        match count[0] {
            0 => cells.push(None),
            1 => {
                let mut index = [0u8; 4];
                reader.read_exact(&mut index)?;
                cells.push(Some(u32::from_le_bytes(index)));
            }
            n => {
                return Err(BodyError::Invalid(format!(
                    "range_grid entry {} lists {} indices",
                    entry, n
                )));
            }
        }
    }

    Ok((vertices, cells))
}

fn read_ascii_body<R: Read>(
    reader: &mut R,
    vertex_count: usize,
    grid_count: usize,
) -> std::result::Result<Body, BodyError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let truncated = || BodyError::Io(io::ErrorKind::UnexpectedEof.into());

    let mut vertices = Vec::with_capacity(vertex_count.min(MAX_PREALLOCATED));
    for index in 0..vertex_count {
        let line = lines.next().ok_or_else(truncated)?;
        vertices.push(parse_ascii_vertex(line).ok_or_else(|| {
            BodyError::Invalid(format!("vertex {} is not 6 floats and 3 bytes", index))
        })?);
    }

    let mut cells = Vec::with_capacity(grid_count.min(MAX_PREALLOCATED));
    for entry in 0..grid_count {
        let line = lines.next().ok_or_else(truncated)?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let cell = match tokens.as_slice() {
            ["0"] => None,
            ["1", index] => Some(index.parse::<u32>().map_err(|_| {
                BodyError::Invalid(format!("range_grid entry {} has bad index", entry))
            })?),
            _ => {
                return Err(BodyError::Invalid(format!(
                    "range_grid entry {} is '{}'",
                    entry, line
                )));
            }
        };
        cells.push(cell);
    }

    Ok((vertices, cells))
}

fn parse_ascii_vertex(line: &str) -> Option<Point> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 9 {
        return None;
    }
    let float = |i: usize| tokens[i].parse::<f32>().ok();
    let byte = |i: usize| tokens[i].parse::<u8>().ok();

    Some(Point {
        position: [float(0)?, float(1)?, float(2)?],
        normal: [float(3)?, float(4)?, float(5)?],
        color: [byte(6)?, byte(7)?, byte(8)?],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_mesh() -> Mesh {
        let mut mesh = Mesh::new(3, 2);
        mesh.push_point(
            0,
            1,
            Point {
                position: [0.1, -2.5e-7, 4.9],
                normal: [0.25, 0.5, 1.0],
                color: [255, 0, 17],
            },
        );
        mesh.push_point(
            1,
            2,
            Point {
                position: [-1.0e10, 3.0, f32::MIN_POSITIVE],
                normal: [1000.0, 2000.0, 65535.0],
                color: [1, 2, 3],
            },
        );
        mesh
    }

    fn encode_to_vec(mesh: &Mesh, format: PlyFormat, tile: Option<&TileInfo>) -> Vec<u8> {
        let mut bytes = Vec::new();
        encode(&mut bytes, mesh, format, tile).unwrap();
        bytes
    }

    fn decode_bytes(bytes: &[u8]) -> Result<MeshFile> {
        decode(&mut Cursor::new(bytes), Path::new("<memory>"))
    }

    #[test]
    fn test_binary_layout() {
        let mesh = sample_mesh();
        let bytes = encode_to_vec(&mesh, PlyFormat::BinaryLittleEndian, None);

        let header_end = bytes
            .windows(b"end_header\n".len())
            .position(|w| w == b"end_header\n")
            .unwrap()
            + b"end_header\n".len();
        let header = std::str::from_utf8(&bytes[..header_end]).unwrap();
        assert!(header.starts_with("ply\nformat binary_little_endian 1.0\nobj_info is_mesh 0\n"));
        assert!(header.contains("obj_info num_cols 3\nobj_info num_rows 2\nelement vertex 2\n"));
        assert!(header.contains("element range_grid 6\nproperty list uchar int vertex_indices\n"));

        let body = &bytes[header_end..];
        assert_eq!(body.len(), 2 * 27 + 6 + 2 * 4);
        assert_eq!(&body[..4], &0.1f32.to_le_bytes());
        assert_eq!(&body[24..27], &[255, 0, 17]);
        // grid: 0, 1 idx0, 0, 0, 0, 1 idx1
        let grid = &body[54..];
        assert_eq!(grid, &[0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_binary_round_trip_is_bit_exact() {
        let mesh = sample_mesh();
        let decoded = decode_bytes(&encode_to_vec(&mesh, PlyFormat::BinaryLittleEndian, None)).unwrap();
        assert_eq!(decoded.mesh, mesh);
        assert_eq!(decoded.format, PlyFormat::BinaryLittleEndian);
        assert_eq!(decoded.tile, None);
    }

    #[test]
    fn test_ascii_round_trip() {
        let mesh = sample_mesh();
        let bytes = encode_to_vec(&mesh, PlyFormat::Ascii, None);
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("format ascii 1.0\n"));
        assert!(text.ends_with("0\n0\n0\n1 1\n"));

        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded.mesh, mesh);
        assert_eq!(decoded.format, PlyFormat::Ascii);
    }

    #[test]
    fn test_tile_info_round_trip() {
        let tile = TileInfo {
            tile_row: 1,
            tile_col: 0,
            num_samples: 2,
            padding: 1,
            image_cols: 4,
            image_rows: 4,
        };
        let bytes = encode_to_vec(&sample_mesh(), PlyFormat::BinaryLittleEndian, Some(&tile));
        assert_eq!(decode_bytes(&bytes).unwrap().tile, Some(tile));
    }

    #[test]
    fn test_empty_mesh_round_trip() {
        let mesh = Mesh::new(0, 0);
        let decoded = decode_bytes(&encode_to_vec(&mesh, PlyFormat::BinaryLittleEndian, None)).unwrap();
        assert_eq!(decoded.mesh, mesh);
    }

    #[test]
    fn test_truncated_body_is_malformed() {
        let bytes = encode_to_vec(&sample_mesh(), PlyFormat::BinaryLittleEndian, None);
        let err = decode_bytes(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, MeshError::MalformedMeshFile { ref reason, .. } if reason == "truncated body"));
        assert!(err.is_tile_unavailable());
    }

    #[test]
    fn test_inconsistent_counts_are_malformed() {
        let text = "ply\nformat ascii 1.0\nobj_info num_cols 2\nobj_info num_rows 2\n\
                    element vertex 0\nproperty float x\nproperty float y\nproperty float z\n\
                    property float nx\nproperty float ny\nproperty float nz\n\
                    property uchar red\nproperty uchar green\nproperty uchar blue\n\
                    element range_grid 3\nproperty list uchar int vertex_indices\nend_header\n0\n0\n0\n";
        assert!(matches!(
            decode_bytes(text.as_bytes()),
            Err(MeshError::MalformedMeshFile { .. })
        ));
    }

    #[test]
    fn test_dangling_index_is_malformed() {
        let text = "ply\nformat ascii 1.0\nobj_info num_cols 1\nobj_info num_rows 1\n\
                    element vertex 0\nproperty float x\nproperty float y\nproperty float z\n\
                    property float nx\nproperty float ny\nproperty float nz\n\
                    property uchar diffuse_red\nproperty uchar diffuse_green\nproperty uchar diffuse_blue\n\
                    element range_grid 1\nproperty list uchar int vertex_indices\nend_header\n1 0\n";
        assert!(matches!(
            decode_bytes(text.as_bytes()),
            Err(MeshError::MalformedMeshFile { .. })
        ));
    }

    #[test]
    fn test_oversized_grid_is_malformed() {
        let text = "ply\nformat binary_little_endian 1.0\nobj_info num_cols 18446744073709551615\n\
                    obj_info num_rows 2\nelement vertex 0\nproperty float x\nproperty float y\n\
                    property float z\nproperty float nx\nproperty float ny\nproperty float nz\n\
                    property uchar red\nproperty uchar green\nproperty uchar blue\n\
                    element range_grid 0\nproperty list uchar int vertex_indices\nend_header\n";
        let err = decode_bytes(text.as_bytes()).unwrap_err();
        assert!(matches!(err, MeshError::MalformedMeshFile { ref reason, .. } if reason.contains("overflows")));
        assert!(err.is_tile_unavailable());
    }

    #[test]
    fn test_bad_magic_and_format() {
        assert!(matches!(
            decode_bytes(b"obj\n"),
            Err(MeshError::MalformedMeshFile { .. })
        ));
        assert!(matches!(
            decode_bytes(b"ply\nformat binary_big_endian 1.0\nend_header\n"),
            Err(MeshError::MalformedMeshFile { .. })
        ));
        assert!(matches!(
            decode_bytes(b"ply\nformat ascii 1.0\n"),
            Err(MeshError::MalformedMeshFile { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_reported_as_missing() {
        let path = std::env::temp_dir().join("point-cloud-tiler-no-such-tile.ply");
        let err = read_mesh(&path).unwrap_err();
        assert!(matches!(err, MeshError::MissingTileFile(ref p) if *p == path));
        assert!(err.is_tile_unavailable());
    }
}
