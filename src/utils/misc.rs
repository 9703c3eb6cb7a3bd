use crate::types::config::SliceGeometry;

/// Represents a 2D pixel coordinate using row and column, signed so that
/// out-of-image addresses can be reported as computed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub row: i64,
    pub col: i64,
}

/// Pixel sampled by slice `slice` at position `sample`.
///
/// Slices fan out around the central diagonal: the row offset steps 0, -1, -1, -2, -2, ...
/// and the column offset 0, 0, 1, 1, 2, ... as `slice` increases.
pub fn slice_pixel(geometry: &SliceGeometry, slice: usize, sample: usize) -> Coordinate {
    Coordinate {
        row: geometry.slice_start_x as i64 + sample as i64 - ((slice + 1) / 2) as i64,
        col: geometry.slice_start_y as i64 + (slice / 2) as i64 + sample as i64,
    }
}

/// Corners of the region touched by a geometry: (top-left, bottom-right), inclusive.
/// Requires at least one slice of at least one sample.
pub fn slice_extent(geometry: &SliceGeometry) -> (Coordinate, Coordinate) {
    let last_slice = geometry.num_slices - 1;
    let last_sample = geometry.slice_length - 1;
    let top = slice_pixel(geometry, last_slice, 0).row;
    let left = slice_pixel(geometry, 0, 0).col;
    let bottom = slice_pixel(geometry, 0, last_sample).row;
    let right = slice_pixel(geometry, last_slice, last_sample).col;
    (
        Coordinate { row: top, col: left },
        Coordinate {
            row: bottom,
            col: right,
        },
    )
}
