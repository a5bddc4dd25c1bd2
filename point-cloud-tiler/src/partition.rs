/// Overlapping tile layout over a W x H pixel grid
///
/// Each axis is cut into `num_samples` pieces of `length / num_samples` pixels,
/// the last piece absorbing the remainder. Tiles grow by `padding` pixels on
/// every edge shared with a neighbour; image-boundary edges get none.
use crate::error::{MeshError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Rectangular block of global pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRegion {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl PixelRegion {
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self { rows, cols }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows.contains(&row) && self.cols.contains(&col)
    }
}

/// One tile of the partition. Spans are global and include padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDescriptor {
    pub tile_row: usize,
    pub tile_col: usize,
    pub row_span: Range<usize>,
    pub col_span: Range<usize>,
}

impl TileDescriptor {
    pub fn region(&self) -> PixelRegion {
        PixelRegion::new(self.row_span.clone(), self.col_span.clone())
    }
}

/// Split of a single axis into overlapping pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPartition {
    length: usize,
    num_samples: usize,
    padding: usize,
    base_pitch: usize,
}

impl AxisPartition {
    pub fn new(length: usize, num_samples: usize, padding: usize) -> Result<Self> {
        if num_samples == 0 {
            return Err(MeshError::InvalidPartition(
                "at least one tile per axis is required".into(),
            ));
        }
        if length < num_samples {
            return Err(MeshError::InvalidPartition(format!(
                "{} pixels cannot be split into {} tiles",
                length, num_samples
            )));
        }

        let base_pitch = length / num_samples;
        if num_samples > 1 && padding > base_pitch {
            return Err(MeshError::InvalidPartition(format!(
                "padding {} exceeds tile pitch {}",
                padding, base_pitch
            )));
        }

        Ok(Self {
            length,
            num_samples,
            padding,
            base_pitch,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn base_pitch(&self) -> usize {
        self.base_pitch
    }

    fn is_last(&self, index: usize) -> bool {
        index + 1 == self.num_samples
    }

    /// Padding in front of tile `index` (zero on the image's first edge).
    pub fn leading_padding(&self, index: usize) -> usize {
        if index == 0 { 0 } else { self.padding }
    }

    /// Padding after tile `index` (zero on the image's last edge).
    pub fn trailing_padding(&self, index: usize) -> usize {
        if self.is_last(index) { 0 } else { self.padding }
    }

    /// Non-padding pixels owned by tile `index`.
    pub fn interior(&self, index: usize) -> Range<usize> {
        let start = index * self.base_pitch;
        let end = if self.is_last(index) {
            self.length
        } else {
            start + self.base_pitch
        };
        start..end
    }

    /// Pixels stored by tile `index`, padding included.
    pub fn span(&self, index: usize) -> Range<usize> {
        let interior = self.interior(index);
        interior.start - self.leading_padding(index)..interior.end + self.trailing_padding(index)
    }

    /// Owned pixel count of tile `index`; the last tile absorbs the remainder.
    pub fn retained_len(&self, index: usize) -> usize {
        self.interior(index).len()
    }

    /// Whether the tile-local coordinate `local` of tile `index` is overlap.
    pub fn is_padding(&self, index: usize, local: usize, local_len: usize) -> bool {
        local < self.leading_padding(index)
            || local + self.trailing_padding(index) >= local_len
    }
}

/// Full two-dimensional partition of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub rows: AxisPartition,
    pub cols: AxisPartition,
    num_samples: usize,
    padding: usize,
}

impl TileGrid {
    pub fn new(
        image_width: usize,
        image_height: usize,
        num_samples: usize,
        padding: usize,
    ) -> Result<Self> {
        Ok(Self {
            rows: AxisPartition::new(image_height, num_samples, padding)?,
            cols: AxisPartition::new(image_width, num_samples, padding)?,
            num_samples,
            padding,
        })
    }

    pub fn image_width(&self) -> usize {
        self.cols.length()
    }

    pub fn image_height(&self) -> usize {
        self.rows.length()
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn tile(&self, tile_row: usize, tile_col: usize) -> TileDescriptor {
        TileDescriptor {
            tile_row,
            tile_col,
            row_span: self.rows.span(tile_row),
            col_span: self.cols.span(tile_col),
        }
    }

    /// Every tile, ordered by `(tile_row, tile_col)`.
    pub fn tiles(&self) -> Vec<TileDescriptor> {
        (0..self.num_samples)
            .flat_map(|r| (0..self.num_samples).map(move |c| (r, c)))
            .map(|(r, c)| self.tile(r, c))
            .collect()
    }

    /// Pixels owned by a tile once its padding is removed.
    pub fn interior(&self, tile_row: usize, tile_col: usize) -> PixelRegion {
        PixelRegion::new(self.rows.interior(tile_row), self.cols.interior(tile_col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_by_two_with_one_pixel_padding() {
        let axis = AxisPartition::new(4, 2, 1).unwrap();
        assert_eq!(axis.span(0), 0..3);
        assert_eq!(axis.span(1), 1..4);
        assert_eq!(axis.interior(0), 0..2);
        assert_eq!(axis.interior(1), 2..4);
    }

    #[test]
    fn test_interior_and_edge_tiles() {
        let axis = AxisPartition::new(11, 3, 2).unwrap();
        assert_eq!(axis.base_pitch(), 3);
        assert_eq!(axis.span(0), 0..5);
        assert_eq!(axis.span(1), 1..8);
        assert_eq!(axis.span(2), 4..11);
        assert_eq!(axis.retained_len(2), 5);
    }

    #[test]
    fn test_single_tile_covers_axis() {
        let axis = AxisPartition::new(7, 1, 3).unwrap();
        assert_eq!(axis.span(0), 0..7);
        assert_eq!(axis.interior(0), 0..7);
        assert!(!axis.is_padding(0, 0, 7));
        assert!(!axis.is_padding(0, 6, 7));
    }

    #[test]
    fn test_padding_predicate_matches_spans() {
        let axis = AxisPartition::new(11, 3, 2).unwrap();
        for index in 0..3 {
            let span = axis.span(index);
            let interior = axis.interior(index);
            for (local, global) in span.clone().enumerate() {
                assert_eq!(
                    axis.is_padding(index, local, span.len()),
                    !interior.contains(&global),
                    "tile {} local {}",
                    index,
                    local
                );
            }
        }
    }

    #[test]
    fn test_interiors_cover_image_exactly_once() {
        for (width, height) in [(1, 1), (4, 4), (10, 7), (13, 29), (64, 33)] {
            for num_samples in 0..=width.min(height).min(6) + 1 {
                for padding in 0..=3 {
                    let label = format!("{}x{} n={} p={}", width, height, num_samples, padding);
                    let accepted = num_samples >= 1
                        && width >= num_samples
                        && height >= num_samples
                        && (num_samples == 1
                            || (padding <= width / num_samples
                                && padding <= height / num_samples));

                    let grid = match TileGrid::new(width, height, num_samples, padding) {
                        Ok(grid) => grid,
                        Err(e) => {
                            assert!(!accepted, "{} rejected: {}", label, e);
                            assert!(matches!(e, MeshError::InvalidPartition(_)), "{}", label);
                            continue;
                        }
                    };
                    assert!(accepted, "{} should be rejected", label);

                    let interiors: Vec<PixelRegion> = grid
                        .tiles()
                        .iter()
                        .map(|tile| {
                            let interior = grid.interior(tile.tile_row, tile.tile_col);
                            assert!(tile.row_span.start <= interior.rows.start);
                            assert!(tile.col_span.end >= interior.cols.end);
                            interior
                        })
                        .collect();
                    for row in 0..height {
                        for col in 0..width {
                            let owners = interiors.iter().filter(|i| i.contains(row, col)).count();
                            assert_eq!(owners, 1, "{} pixel ({}, {})", label, row, col);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_tiles_in_row_major_order() {
        let grid = TileGrid::new(9, 6, 3, 1).unwrap();
        let order: Vec<(usize, usize)> = grid
            .tiles()
            .iter()
            .map(|t| (t.tile_row, t.tile_col))
            .collect();
        assert_eq!(order[0], (0, 0));
        assert_eq!(order[1], (0, 1));
        assert_eq!(order[3], (1, 0));
        assert_eq!(order.len(), 9);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            AxisPartition::new(4, 0, 0),
            Err(MeshError::InvalidPartition(_))
        ));
        assert!(matches!(
            AxisPartition::new(3, 4, 0),
            Err(MeshError::InvalidPartition(_))
        ));
        assert!(matches!(
            AxisPartition::new(8, 4, 3),
            Err(MeshError::InvalidPartition(_))
        ));
    }
}
