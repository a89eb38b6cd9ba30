//! Free functions over the coordinate triple types.
//!
//! [`Point`] and [`Vector`] share one representation. Positions are points,
//! offsets and field samples are vectors, and `point + vector` is the only
//! addition the integrator performs.

use crate::types::{Point, Value, Vector};

/// Builds a [`Point`], coercing every component into [`Value`].
pub fn point(x: impl Into<Value>, y: impl Into<Value>, z: impl Into<Value>) -> Point {
    Point::new(x.into(), y.into(), z.into())
}

/// Builds a [`Vector`], coercing every component into [`Value`].
pub fn vector(x: impl Into<Value>, y: impl Into<Value>, z: impl Into<Value>) -> Vector {
    Vector::new(x.into(), y.into(), z.into())
}

/// Grid point at integer index `(i, j, k)`.
#[inline]
pub fn grid_point(i: usize, j: usize, k: usize) -> Point {
    Point::new(i as Value, j as Value, k as Value)
}

/// Exact zero test on all three components.
#[inline]
pub fn is_zero(v: &Vector) -> bool {
    v.x == 0.0 && v.y == 0.0 && v.z == 0.0
}

/// Truncates each coordinate toward zero into the grid index it lies in.
///
/// Only meaningful for non-negative coordinates.
#[inline]
pub fn as_indices(p: &Point) -> [usize; 3] {
    [p.x as usize, p.y as usize, p.z as usize]
}

/// Euclidean norm.
#[inline]
pub fn length(v: &Vector) -> Value {
    (v.x * v.x + v.y * v.y + v.z * v.z).sqrt()
}

/// Multiplies every component by `k` in place.
#[inline]
pub fn scale(v: &mut Vector, k: Value) {
    v.x *= k;
    v.y *= k;
    v.z *= k;
}

/// Returns a copy of `v` with every component multiplied by `k`.
#[inline]
pub fn scaled(mut v: Vector, k: Value) -> Vector {
    scale(&mut v, k);
    v
}

/// Scales `v` to unit length. Leaves an exactly zero vector untouched.
pub fn normalize(v: &mut Vector) {
    let len = length(v);
    if len != 0.0 {
        scale(v, 1.0 / len);
    }
}
