use derive_more::{Display, From};

use crate::types::{Shape, Value};

pub type Result<T> = core::result::Result<T, LicError>;

#[derive(Debug, Display, From)]
pub enum LicError {
    /// Vector field data whose trailing axis is not exactly 3 components.
    #[display("vector field data must have 3 components per cell, got {_0}")]
    InvalidComponentCount(usize),
    #[display("an ensemble needs at least one field")]
    EmptyEnsemble,
    #[display("shape mismatch: expected {expected:?}, got {found:?}")]
    ShapeMismatch { expected: Shape, found: Shape },
    #[display("noise volume of shape {found:?} does not match field shape {expected:?}")]
    NoiseShapeMismatch { expected: Shape, found: Shape },
    #[display("point {point:?} lies outside the field domain {shape:?}")]
    PointOutOfDomain { point: [Value; 3], shape: Shape },
    #[display("grid index {index:?} lies outside the field shape {shape:?}")]
    IndexOutOfBounds { index: [usize; 3], shape: Shape },
    #[display("time step must be positive and finite, got {_0}")]
    InvalidTimeStep(Value),
    #[display("at least one integration step is required")]
    InvalidStepCount,
    #[display("convolution cancelled")]
    Cancelled,
    #[from]
    #[display("{_0}")]
    Shape(ndarray::ShapeError),
}

impl std::error::Error for LicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LicError::Shape(e) => Some(e),
            _ => None,
        }
    }
}
