use crate::types::{Value, Vector};
use crate::utils::CORNER_OFFSETS;

// Linear interpolation
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

/// Componentwise [`lerp`] between two vectors.
#[inline]
pub fn lerp_vector(a: &Vector, b: &Vector, t: Value) -> Vector {
    Vector::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t), lerp(a.z, b.z, t))
}

/// Trilinear interpolation of the 8 corner vectors of a cell.
///
/// Corners follow [`CORNER_OFFSETS`]. The cell is collapsed along x, then y,
/// then z, so the low corner of each axis is weighted `1 - t` and the high
/// corner `t`. At `(u, v, w) = (0, 0, 0)` the result is exactly corner 0.
#[inline]
pub fn trilinear(corners: &[Vector; 8], u: Value, v: Value, w: Value) -> Vector {
    let x00 = lerp_vector(&corners[0], &corners[1], u);
    let x10 = lerp_vector(&corners[2], &corners[3], u);
    let x01 = lerp_vector(&corners[4], &corners[5], u);
    let x11 = lerp_vector(&corners[6], &corners[7], u);

    let y0 = lerp_vector(&x00, &x10, v);
    let y1 = lerp_vector(&x01, &x11, v);

    lerp_vector(&y0, &y1, w)
}
