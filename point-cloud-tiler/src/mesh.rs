/// Range-grid point meshes: vertex list plus a dense per-pixel index grid
use serde::{Deserialize, Serialize};

/// One projected pixel: position, pass-through normal and colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [u8; 3],
}

/// Dense row-major grid holding, per pixel, the vertex it produced (if any).
///
/// Stored as one flat allocation so rows can never alias each other.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeGrid {
    cols: usize,
    rows: usize,
    cells: Vec<Option<u32>>,
}

impl RangeGrid {
    /// Create a grid with every pixel marked invalid.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![None; cols * rows],
        }
    }

    pub(crate) fn from_cells(cols: usize, rows: usize, cells: Vec<Option<u32>>) -> Self {
        debug_assert_eq!(cells.len(), cols * rows);
        Self { cols, rows, cells }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        self.cells[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, vertex: Option<u32>) {
        self.cells[row * self.cols + col] = vertex;
    }

    /// Entries in row-major order.
    pub fn cells(&self) -> &[Option<u32>] {
        &self.cells
    }

    pub fn valid_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Row-major validity pattern, ignoring which vertex each pixel maps to.
    pub fn validity(&self) -> Vec<bool> {
        self.cells.iter().map(Option::is_some).collect()
    }
}

/// Vertex list and range grid for a `cols` x `rows` pixel domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point>,
    pub range_grid: RangeGrid,
}

impl Mesh {
    /// Empty mesh with every pixel invalid.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            vertices: Vec::new(),
            range_grid: RangeGrid::new(cols, rows),
        }
    }

    pub fn cols(&self) -> usize {
        self.range_grid.cols()
    }

    pub fn rows(&self) -> usize {
        self.range_grid.rows()
    }

    /// Append a point and bind it to `(row, col)`.
    pub fn push_point(&mut self, row: usize, col: usize, point: Point) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(point);
        self.range_grid.set(row, col, Some(index));
        index
    }

    /// The point a pixel produced, if it is valid.
    pub fn point_at(&self, row: usize, col: usize) -> Option<&Point> {
        self.range_grid
            .get(row, col)
            .and_then(|index| self.vertices.get(index as usize))
    }

    /// Check the grid/vertex invariants, returning the first violation.
    ///
    /// Every vertex must be referenced by exactly one pixel and every
    /// reference must be in range.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = vec![false; self.vertices.len()];
        for (pixel, cell) in self.range_grid.cells().iter().enumerate() {
            let Some(index) = cell else { continue };
            let slot = seen.get_mut(*index as usize).ok_or_else(|| {
                format!(
                    "pixel {} references vertex {} but only {} vertices exist",
                    pixel,
                    index,
                    self.vertices.len()
                )
            })?;
            if *slot {
                return Err(format!("vertex {} referenced more than once", index));
            }
            *slot = true;
        }

        let valid = self.range_grid.valid_count();
        if valid != self.vertices.len() {
            return Err(format!(
                "{} valid pixels for {} vertices",
                valid,
                self.vertices.len()
            ));
        }
        Ok(())
    }
}
