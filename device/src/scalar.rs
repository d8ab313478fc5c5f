use std::ops::{Index, IndexMut};

/// Four-component scalar value.
///
/// Single values are stored in the first component; `Scalar::all` broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scalar(pub [f64; 4]);

impl Scalar {
    pub const fn new(v0: f64, v1: f64, v2: f64, v3: f64) -> Self {
        Self([v0, v1, v2, v3])
    }

    /// Same value in every component.
    pub const fn all(v: f64) -> Self {
        Self([v; 4])
    }

    pub const fn as_array(&self) -> &[f64; 4] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// Apply `f` to every component.
    pub fn map(self, f: impl FnMut(f64) -> f64) -> Self {
        Self(self.0.map(f))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self([v, 0.0, 0.0, 0.0])
    }
}

impl From<[f64; 4]> for Scalar {
    fn from(values: [f64; 4]) -> Self {
        Self(values)
    }
}

impl Index<usize> for Scalar {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Scalar {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.0[index]
    }
}
