//! Flat `f64` buffer tagged with a spatial dimension.

use super::Encapsulation;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Buffers at least this long use rayon for element-wise kernels.
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 1 << 14;

/// Solution values on a periodic grid of `DIM` dimensions.
///
/// For `DIM > 1` the buffer holds a cube of side `n` in row-major order with
/// axis 0 varying fastest (see [`linearized_index`](super::linearized_index)).
#[derive(Clone, Debug, PartialEq)]
pub struct GridVector<const DIM: usize> {
    pub data: Vec<f64>,
}

/// One-dimensional vector.
pub type Vector1D = GridVector<1>;
/// Square grid.
pub type Cube2D = GridVector<2>;
/// Cubic grid.
pub type Cube3D = GridVector<3>;

impl<const DIM: usize> GridVector<DIM> {
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Fill with `f(i)` for every linear index `i`.
    pub fn from_fn(num_dofs: usize, f: impl Fn(usize) -> f64) -> Self {
        Self {
            data: (0..num_dofs).map(f).collect(),
        }
    }

    /// Euclidean norm.
    pub fn norm2(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

impl<const DIM: usize> Encapsulation for GridVector<DIM> {
    const DIM: usize = DIM;

    fn zeros(num_dofs: usize) -> Self {
        Self {
            data: vec![0.0; num_dofs],
        }
    }

    fn data(&self) -> &[f64] {
        &self.data
    }

    fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn scale(&mut self, c: f64) {
        #[cfg(feature = "parallel")]
        if self.data.len() >= PARALLEL_THRESHOLD {
            self.data.par_iter_mut().for_each(|v| *v *= c);
            return;
        }
        for v in &mut self.data {
            *v *= c;
        }
    }

    fn scaled_add(&mut self, a: f64, other: &Self) {
        assert_eq!(self.data.len(), other.data.len());
        #[cfg(feature = "parallel")]
        if self.data.len() >= PARALLEL_THRESHOLD {
            self.data
                .par_iter_mut()
                .zip(other.data.par_iter())
                .for_each(|(v, o)| *v += a * o);
            return;
        }
        for (v, o) in self.data.iter_mut().zip(other.data.iter()) {
            *v += a * o;
        }
    }

    fn norm0(&self) -> f64 {
        #[cfg(feature = "parallel")]
        if self.data.len() >= PARALLEL_THRESHOLD {
            return self
                .data
                .par_iter()
                .map(|v| v.abs())
                .reduce(|| 0.0, f64::max);
        }
        self.data.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PfasstError;

    #[test]
    fn test_zero_and_norm() {
        let mut v = Vector1D::from_vec(vec![1.0, -3.5, 2.0]);
        assert_eq!(v.norm0(), 3.5);
        v.zero();
        assert_eq!(v.norm0(), 0.0);
        assert_eq!(v.num_dofs(), 3);
    }

    #[test]
    fn test_scaled_add() {
        let mut u = Vector1D::from_vec(vec![1.0, 2.0]);
        let v = Vector1D::from_vec(vec![10.0, 20.0]);
        u.scaled_add(0.5, &v);
        assert_eq!(u.data, vec![6.0, 12.0]);
        u.scale(-1.0);
        assert_eq!(u.data, vec![-6.0, -12.0]);
    }

    #[test]
    #[should_panic]
    fn test_scaled_add_length_mismatch_panics() {
        let mut u = Vector1D::zeros(2);
        u.scaled_add(1.0, &Vector1D::zeros(3));
    }

    #[test]
    fn test_copy_from_rejects_incompatible() {
        let mut u = Cube3D::zeros(8);
        let err = u.copy_from(&Cube3D::zeros(27)).unwrap_err();
        assert!(matches!(err, PfasstError::IncompatibleShape { .. }));

        let src = Cube3D::from_fn(8, |i| i as f64);
        u.copy_from(&src).unwrap();
        assert_eq!(u, src);
    }

    #[test]
    fn test_dim_tag() {
        assert_eq!(<Vector1D as Encapsulation>::DIM, 1);
        assert_eq!(<Cube2D as Encapsulation>::DIM, 2);
        assert_eq!(<Cube3D as Encapsulation>::DIM, 3);
    }
}
