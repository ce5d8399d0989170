//! State containers ("encapsulations") for per-node solution data.
//!
//! The iteration machinery only needs vector-space operations and raw buffer
//! access. [`GridVector`] is the concrete container; its `DIM` parameter tags
//! the spatial dimensionality so spectral transfers can interpret the buffer
//! as a periodic cube.

mod grid_vector;
mod ops;

pub use grid_vector::{Cube2D, Cube3D, GridVector, Vector1D};
pub use ops::{axpy, cube_side, linearized_index, mat_apply, split_index};

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::error::{PfasstError, Result};

/// Vector-space operations required from a state container.
///
/// Implementors own a fixed-length `f64` buffer. Two containers are compatible
/// when they have the same `DIM` and the same number of degrees of freedom.
pub trait Encapsulation: Clone + Debug + Send + Sync + Sized + 'static {
    /// Spatial dimensionality of the data layout.
    const DIM: usize;

    /// Zero-initialised container with `num_dofs` entries.
    fn zeros(num_dofs: usize) -> Self;

    fn data(&self) -> &[f64];

    fn data_mut(&mut self) -> &mut [f64];

    fn num_dofs(&self) -> usize {
        self.data().len()
    }

    fn zero(&mut self) {
        self.data_mut().fill(0.0);
    }

    /// self <- c * self
    fn scale(&mut self, c: f64);

    /// self <- self + a * other
    ///
    /// Panics if the lengths differ.
    fn scaled_add(&mut self, a: f64, other: &Self);

    /// Maximum absolute entry.
    fn norm0(&self) -> f64;

    /// Copy the contents of `other` into `self`.
    fn copy_from(&mut self, other: &Self) -> Result<()> {
        if self.num_dofs() != other.num_dofs() {
            return Err(PfasstError::incompatible_shape(
                format!("{} dofs", self.num_dofs()),
                format!("{} dofs", other.num_dofs()),
            ));
        }
        self.data_mut().copy_from_slice(other.data());
        Ok(())
    }
}

/// Creates zero-initialised containers of a fixed size.
#[derive(Clone, Debug)]
pub struct EncapFactory<E> {
    size: usize,
    _marker: PhantomData<E>,
}

impl<E: Encapsulation> EncapFactory<E> {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            _marker: PhantomData,
        }
    }

    /// Number of degrees of freedom of created containers.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn create(&self) -> E {
        E::zeros(self.size)
    }

    /// `n` fresh containers.
    pub fn create_many(&self, n: usize) -> Vec<E> {
        (0..n).map(|_| self.create()).collect()
    }
}
