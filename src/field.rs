use derive_more::Display;
use ndarray::{Array4, ArrayView4};

use crate::{
    error::{LicError, Result},
    interp::trilinear,
    streamline::{Sense, Streamline},
    types::{Point, Shape, Value, Vector},
    utils::cell_corner_indices,
    vector::{grid_point, is_zero, scale},
};

/// A dense grid of 3-component vector samples.
///
/// Samples are stored as `data[[i, j, k, c]]` where `c` is the component axis,
/// which is always exactly 3 long. Between samples the field is reconstructed by
/// trilinear interpolation over the half-open box `[0, nx) × [0, ny) × [0, nz)`.
#[derive(Clone, Debug, Display)]
#[display("VectorField(shape={shape:?})")]
pub struct VectorField {
    data: Array4<Value>,
    shape: Shape,
}

impl VectorField {
    /// Wraps an `(nx, ny, nz, 3)` array.
    ///
    /// Returns [`LicError::InvalidComponentCount`] if the trailing axis is not 3 long.
    pub fn new(data: Array4<Value>) -> Result<Self> {
        let dim = data.dim();
        if dim.3 != 3 {
            return Err(LicError::InvalidComponentCount(dim.3));
        }
        Ok(Self {
            shape: [dim.0, dim.1, dim.2],
            data,
        })
    }

    /// Builds a field from a flat, row-major list of `nx * ny * nz * 3` values.
    pub fn from_shape_vec(shape: Shape, values: Vec<Value>) -> Result<Self> {
        let data = Array4::from_shape_vec((shape[0], shape[1], shape[2], 3), values)?;
        Self::new(data)
    }

    /// Fills a field by evaluating `function` at every integer grid point.
    pub fn from_fn<F>(shape: Shape, mut function: F) -> Self
    where
        F: FnMut(Point) -> Vector,
    {
        let mut field = Self::zeros(shape);
        for i in 0..shape[0] {
            for j in 0..shape[1] {
                for k in 0..shape[2] {
                    field.set(i, j, k, function(grid_point(i, j, k)));
                }
            }
        }
        field
    }

    /// A field holding the same vector everywhere.
    pub fn uniform(shape: Shape, value: Vector) -> Self {
        Self::from_fn(shape, |_| value)
    }

    /// A field of zero vectors.
    pub fn zeros(shape: Shape) -> Self {
        Self {
            data: Array4::zeros((shape[0], shape[1], shape[2], 3)),
            shape,
        }
    }

    /// Grid dimensions `[nx, ny, nz]`, without the component axis.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn data(&self) -> ArrayView4<'_, Value> {
        self.data.view()
    }

    pub fn into_data(self) -> Array4<Value> {
        self.data
    }

    /// Whether `point` lies inside the half-open sampling box.
    ///
    /// A coordinate exactly equal to the axis length is outside.
    pub fn contains_point(&self, point: &Point) -> bool {
        (0..3).all(|d| 0.0 <= point[d] && point[d] < self.shape[d] as Value)
    }

    /// Stored sample at grid index `(i, j, k)`.
    pub fn get_raw(&self, i: usize, j: usize, k: usize) -> Result<Vector> {
        if i >= self.shape[0] || j >= self.shape[1] || k >= self.shape[2] {
            return Err(LicError::IndexOutOfBounds {
                index: [i, j, k],
                shape: self.shape,
            });
        }
        Ok(self.sample(i, j, k))
    }

    /// Sets the stored sample at grid index `(i, j, k)`.
    pub fn set(&mut self, i: usize, j: usize, k: usize, v: Vector) {
        for c in 0..3 {
            self.data[[i, j, k, c]] = v[c];
        }
    }

    #[inline]
    fn sample(&self, i: usize, j: usize, k: usize) -> Vector {
        Vector::new(
            self.data[[i, j, k, 0]],
            self.data[[i, j, k, 1]],
            self.data[[i, j, k, 2]],
        )
    }

    /// Trilinearly interpolated vector at `point`.
    ///
    /// Returns [`LicError::PointOutOfDomain`] unless [`contains_point`](Self::contains_point)
    /// holds. In the last cell of an axis the upper corners are clamped onto the
    /// lower ones instead of extrapolating.
    pub fn get(&self, point: &Point) -> Result<Vector> {
        if !self.contains_point(point) {
            return Err(self.out_of_domain(point));
        }

        // indices of the cell
        let i = point.x.floor() as usize;
        let j = point.y.floor() as usize;
        let k = point.z.floor() as usize;

        // weights for each dimension
        let u = point.x - i as Value;
        let v = point.y - j as Value;
        let w = point.z - k as Value;

        let corners = cell_corner_indices(i, j, k, self.shape).map(|[a, b, c]| self.sample(a, b, c));
        Ok(trilinear(&corners, u, v, w))
    }

    /// Integrates a streamline from `seed` with explicit Euler steps of `delta_t`.
    ///
    /// Each direction takes at most `steps` steps and stops early when the sampled
    /// vector is exactly zero or the next point would leave the domain. Neither
    /// case is an error; the streamline is just shorter.
    pub fn make_streamline(
        &self,
        seed: Point,
        delta_t: Value,
        steps: usize,
        sense: Sense,
    ) -> Result<Streamline> {
        if !self.contains_point(&seed) {
            return Err(self.out_of_domain(&seed));
        }
        if !(delta_t > 0.0 && delta_t.is_finite()) {
            return Err(LicError::InvalidTimeStep(delta_t));
        }
        if steps == 0 {
            return Err(LicError::InvalidStepCount);
        }

        let forward = if sense.forwards() {
            self.integrate(seed, delta_t, steps, true)?
        } else {
            Vec::new()
        };

        let backward = if sense.backwards() {
            let mut points = self.integrate(seed, delta_t, steps, false)?;
            points.reverse();
            points
        } else {
            Vec::new()
        };

        Ok(Streamline::compose(backward, seed, forward))
    }

    /// Bidirectional [`make_streamline`](Self::make_streamline).
    pub fn make_streamline_both(&self, seed: Point, delta_t: Value, steps: usize) -> Result<Streamline> {
        self.make_streamline(seed, delta_t, steps, Sense::Both)
    }

    /// Points visited after `seed` in one direction, nearest first. The seed is not included.
    fn integrate(&self, seed: Point, delta_t: Value, steps: usize, forwards: bool) -> Result<Vec<Point>> {
        let factor = Sense::sign(forwards) * delta_t;
        let mut points = Vec::with_capacity(steps);
        let mut current = seed;

        for _ in 0..steps {
            let mut offset = self.get(&current)?;
            if is_zero(&offset) {
                break;
            }
            scale(&mut offset, factor);

            let next = current + offset;
            if !self.contains_point(&next) {
                break;
            }
            points.push(next);
            current = next;
        }

        Ok(points)
    }

    fn out_of_domain(&self, point: &Point) -> LicError {
        LicError::PointOutOfDomain {
            point: [point.x, point.y, point.z],
            shape: self.shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{point, vector};

    fn swirl(shape: Shape) -> VectorField {
        VectorField::from_fn(shape, |p| {
            vector(
                (p.y * 0.7 + p.z).sin(),
                (p.x * 1.3 - p.z * 0.2).cos(),
                p.x * 0.1 - p.y * 0.25 + 0.5,
            )
        })
    }

    #[test]
    fn rejects_wrong_component_count() {
        let err = VectorField::new(Array4::zeros((2, 2, 2, 2))).unwrap_err();
        assert!(matches!(err, LicError::InvalidComponentCount(2)));
    }

    #[test]
    fn from_shape_vec_checks_length() {
        let err = VectorField::from_shape_vec([2, 2, 2], vec![0.0; 10]).unwrap_err();
        assert!(matches!(err, LicError::Shape(_)));

        let field = VectorField::from_shape_vec([1, 1, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(field.get_raw(0, 0, 1).unwrap(), vector(4.0, 5.0, 6.0));
    }

    #[test]
    fn display_names_shape() {
        assert_eq!(VectorField::zeros([2, 3, 4]).to_string(), "VectorField(shape=[2, 3, 4])");
    }

    #[test]
    fn containment_is_half_open() {
        let field = VectorField::zeros([3, 4, 5]);
        assert!(field.contains_point(&point(0.0, 0.0, 0.0)));
        assert!(field.contains_point(&point(2.999, 3.5, 4.0)));
        assert!(!field.contains_point(&point(3.0, 0.0, 0.0)));
        assert!(!field.contains_point(&point(0.0, 4.0, 0.0)));
        assert!(!field.contains_point(&point(0.0, 0.0, 5.0)));
        assert!(!field.contains_point(&point(-0.001, 0.0, 0.0)));
        assert!(!field.contains_point(&point(0.0, -1.0, 0.0)));
        assert!(!field.contains_point(&point(f64::NAN, 0.0, 0.0)));
    }

    #[test]
    fn get_is_exact_at_grid_points() {
        let field = swirl([4, 3, 5]);
        for i in 0..4 {
            for j in 0..3 {
                for k in 0..5 {
                    let sampled = field.get(&grid_point(i, j, k)).unwrap();
                    assert_eq!(sampled, field.get_raw(i, j, k).unwrap(), "at ({i}, {j}, {k})");
                }
            }
        }
    }

    #[test]
    fn get_stays_within_corner_bounds() {
        let field = swirl([4, 4, 4]);
        let offsets = [0.0, 0.13, 0.5, 0.77, 0.999];
        for (i, j, k) in [(0, 0, 0), (1, 2, 0), (2, 1, 3), (3, 3, 3)] {
            let corners = cell_corner_indices(i, j, k, field.shape())
                .map(|[a, b, c]| field.get_raw(a, b, c).unwrap());
            for &u in &offsets {
                for &v in &offsets {
                    for &w in &offsets {
                        let p = point(i as f64 + u, j as f64 + v, k as f64 + w);
                        let sampled = field.get(&p).unwrap();
                        for c in 0..3 {
                            let lo = corners.iter().map(|x| x[c]).fold(f64::INFINITY, f64::min);
                            let hi = corners.iter().map(|x| x[c]).fold(f64::NEG_INFINITY, f64::max);
                            assert!(
                                sampled[c] >= lo - 1e-12 && sampled[c] <= hi + 1e-12,
                                "component {c} = {} outside [{lo}, {hi}] at {p}",
                                sampled[c]
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn get_interpolates_between_samples() {
        let field = VectorField::from_fn([3, 2, 2], |p| vector(p.x * 2.0, p.y, -p.z));
        let sampled = field.get(&point(0.25, 0.5, 0.75)).unwrap();
        assert!((sampled.x - 0.5).abs() < 1e-12);
        assert!((sampled.y - 0.5).abs() < 1e-12);
        assert!((sampled.z + 0.75).abs() < 1e-12);
    }

    #[test]
    fn last_cell_is_clamped() {
        let field = VectorField::from_fn([2, 1, 1], |p| vector(p.x + 1.0, 0.0, 0.0));
        // beyond the last sample along x the value stays constant
        assert_eq!(field.get(&point(1.5, 0.0, 0.0)).unwrap(), vector(2.0, 0.0, 0.0));
        let flat = field.get(&point(0.5, 0.9, 0.9)).unwrap();
        assert!((flat.x - 1.5).abs() < 1e-12);
    }

    #[test]
    fn get_rejects_points_outside() {
        let field = VectorField::zeros([2, 2, 2]);
        let err = field.get(&point(2.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, LicError::PointOutOfDomain { shape: [2, 2, 2], .. }));
        assert!(field.get_raw(0, 2, 0).is_err());
    }

    #[test]
    fn streamline_preconditions() {
        let field = VectorField::uniform([3, 3, 3], vector(1.0, 0.0, 0.0));
        let seed = point(1.0, 1.0, 1.0);
        assert!(matches!(
            field.make_streamline_both(point(3.0, 1.0, 1.0), 1.0, 2),
            Err(LicError::PointOutOfDomain { .. })
        ));
        assert!(matches!(field.make_streamline_both(seed, 0.0, 2), Err(LicError::InvalidTimeStep(_))));
        assert!(matches!(field.make_streamline_both(seed, -1.0, 2), Err(LicError::InvalidTimeStep(_))));
        assert!(matches!(
            field.make_streamline_both(seed, f64::NAN, 2),
            Err(LicError::InvalidTimeStep(_))
        ));
        assert!(matches!(field.make_streamline_both(seed, 1.0, 0), Err(LicError::InvalidStepCount)));
    }

    #[test]
    fn zero_field_gives_seed_only() {
        let field = VectorField::zeros([4, 4, 4]);
        for steps in [1, 5, 100] {
            let line = field.make_streamline_both(point(2.0, 1.0, 3.0), 0.5, steps).unwrap();
            assert_eq!(line.points(), &[point(2.0, 1.0, 3.0)]);
        }
    }

    #[test]
    fn boundary_stops_forward_run() {
        let field = VectorField::uniform([3, 3, 3], vector(1.0, 0.0, 0.0));
        let line = field.make_streamline_both(point(2.0, 1.0, 1.0), 1.0, 4).unwrap();
        assert!(line.forward().is_empty());
        assert_eq!(line.backward(), &[point(0.0, 1.0, 1.0), point(1.0, 1.0, 1.0)]);
        assert_eq!(line.seed_index(), 2);
    }

    #[test]
    fn uniform_flow_walks_along_x() {
        let field = VectorField::uniform([10, 2, 2], vector(0.5, 0.0, 0.0));
        let line = field.make_streamline_both(point(5.0, 0.0, 1.0), 2.0, 2).unwrap();
        let xs: Vec<f64> = line.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn single_direction_streamlines() {
        let field = VectorField::uniform([5, 1, 1], vector(1.0, 0.0, 0.0));
        let seed = point(2.0, 0.0, 0.0);

        let fwd = field.make_streamline(seed, 1.0, 5, Sense::Forward).unwrap();
        assert_eq!(fwd.seed_index(), 0);
        assert_eq!(fwd.points(), &[seed, point(3.0, 0.0, 0.0), point(4.0, 0.0, 0.0)]);

        let back = field.make_streamline(seed, 1.0, 5, Sense::Backward).unwrap();
        assert_eq!(back.seed_index(), 2);
        assert_eq!(back.points(), &[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), seed]);
    }

    #[test]
    fn stops_after_reaching_zero_velocity() {
        // flow toward x = 2 where the field vanishes
        let field = VectorField::from_fn([5, 1, 1], |p| vector(2.0 - p.x, 0.0, 0.0));
        let line = field.make_streamline(point(0.0, 0.0, 0.0), 0.5, 50, Sense::Forward).unwrap();
        assert!(line.len() <= 51);
        for p in line.iter() {
            assert!(p.x <= 2.0);
        }
        let from_sink = field.make_streamline_both(point(2.0, 0.0, 0.0), 0.5, 50).unwrap();
        assert_eq!(from_sink.len(), 1);
    }

    #[test]
    fn composition_law_holds() {
        let field = swirl([6, 6, 6]);
        let steps = 8;
        for seed in [point(0.0, 0.0, 0.0), point(3.0, 2.0, 4.0), point(5.0, 5.0, 5.0)] {
            let line = field.make_streamline_both(seed, 0.4, steps).unwrap();
            let back = line.backward().len();
            let fwd = line.forward().len();
            assert!(back <= steps && fwd <= steps);
            assert_eq!(line.len(), back + 1 + fwd);
            assert_eq!(line.points()[back], seed);
            assert!(line.iter().all(|p| field.contains_point(p)));
        }
    }
}
