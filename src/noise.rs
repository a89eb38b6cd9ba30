//! Noise volumes convolved along streamlines.
//!
//! The driver never generates noise itself; a [`NoiseSource`] is handed in so
//! tests and callers control determinism.

use ndarray::Array3;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::types::{Shape, Value};

/// Produces a volume of independent values, conventionally uniform in `[0, 1)`.
pub trait NoiseSource {
    fn volume(&mut self, shape: Shape) -> Array3<Value>;
}

/// Uniform white noise in `[0, 1)`.
pub struct UniformNoise {
    rng: StdRng,
}

impl UniformNoise {
    /// Reproducible noise: the same seed always yields the same volumes.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for UniformNoise {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl NoiseSource for UniformNoise {
    fn volume(&mut self, shape: Shape) -> Array3<Value> {
        let rng = &mut self.rng;
        Array3::from_shape_fn((shape[0], shape[1], shape[2]), |_| rng.r#gen::<Value>())
    }
}

/// Hands out clones of a prepared volume, regardless of the requested shape.
///
/// The driver still checks the shape against the field.
#[derive(Clone, Debug)]
pub struct FixedNoise(pub Array3<Value>);

impl NoiseSource for FixedNoise {
    fn volume(&mut self, _shape: Shape) -> Array3<Value> {
        self.0.clone()
    }
}

impl<F> NoiseSource for F
where
    F: FnMut(Shape) -> Array3<Value>,
{
    fn volume(&mut self, shape: Shape) -> Array3<Value> {
        self(shape)
    }
}
