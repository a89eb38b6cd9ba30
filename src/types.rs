use nalgebra::{Point3, Vector3};

/// Scalar type of field samples and coordinates.
pub type Value = f64;

/// A 3D grid-space coordinate with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D direction/magnitude with [`Value`] components.
pub type Vector = Vector3<Value>;

/// Grid dimensions `[nx, ny, nz]`.
pub type Shape = [usize; 3];

/// Reduced-precision scalar stored in LIC output volumes.
pub type Texel = half::f16;
