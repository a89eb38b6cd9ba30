use crate::types::Shape;

/// Offsets of the 8 corners of a grid cell relative to its low corner.
///
/// Corners are ordered the same way throughout the crate:
/// ```text
///     6----7          Y
///    /|   /|          |
///   2----3 |          *-- X
///   | 4--|-5         /
///   |/   |/         Z
///   0----1
/// ```
pub const CORNER_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// Index of the upper neighbour of `i` along an axis of length `n`.
///
/// Clamped to the last valid index, so the last cell samples its own plane twice.
#[inline]
pub fn upper_index(i: usize, n: usize) -> usize {
    if i + 1 < n { i + 1 } else { i }
}

/// Returns the 8 corner indices `[x, y, z]` of the cell whose low corner is `(i, j, k)`.
///
/// Upper indices are clamped with [`upper_index`]; ordering follows [`CORNER_OFFSETS`].
#[inline]
pub fn cell_corner_indices(i: usize, j: usize, k: usize, shape: Shape) -> [[usize; 3]; 8] {
    let hi = [
        upper_index(i, shape[0]),
        upper_index(j, shape[1]),
        upper_index(k, shape[2]),
    ];
    let lo = [i, j, k];
    CORNER_OFFSETS.map(|[dx, dy, dz]| {
        [
            if dx == 0 { lo[0] } else { hi[0] },
            if dy == 0 { lo[1] } else { hi[1] },
            if dz == 0 { lo[2] } else { hi[2] },
        ]
    })
}

/// Number of cells in a grid of the given shape.
#[inline]
pub fn cell_count(shape: Shape) -> usize {
    shape.iter().product()
}
