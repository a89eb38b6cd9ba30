use crate::types::{Point, Value};

/// Which way(s) in time a streamline is integrated from its seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Sense {
    Forward,
    Backward,
    #[default]
    Both,
}

impl Sense {
    pub fn forwards(self) -> bool {
        matches!(self, Sense::Forward | Sense::Both)
    }

    pub fn backwards(self) -> bool {
        matches!(self, Sense::Backward | Sense::Both)
    }

    /// Sign applied to the time step when integrating in this single direction.
    pub(crate) fn sign(forwards: bool) -> Value {
        if forwards { 1.0 } else { -1.0 }
    }
}

/// An integrated path through a vector field, ordered from the furthest
/// backward point to the furthest forward point.
///
/// The seed appears exactly once, at [`seed_index`](Streamline::seed_index):
///
/// ```text
/// [ b_n, ..., b_1, seed, f_1, ..., f_m ]
///                  ^-- seed_index = n
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Streamline {
    points: Vec<Point>,
    seed_index: usize,
}

impl Streamline {
    /// Joins a backward run (already oldest-first), the seed and a forward run.
    pub fn compose(mut backward: Vec<Point>, seed: Point, forward: Vec<Point>) -> Self {
        let seed_index = backward.len();
        backward.reserve(forward.len() + 1);
        backward.push(seed);
        backward.extend(forward);
        Self {
            points: backward,
            seed_index,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    pub fn seed(&self) -> Point {
        self.points[self.seed_index]
    }

    pub fn seed_index(&self) -> usize {
        self.seed_index
    }

    /// Points integrated backward in time, oldest first.
    pub fn backward(&self) -> &[Point] {
        &self.points[..self.seed_index]
    }

    /// Points integrated forward in time, excluding the seed.
    pub fn forward(&self) -> &[Point] {
        &self.points[self.seed_index + 1..]
    }

    /// Total point count, seed included. Never zero.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a Streamline {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
