//! Model problems for the IMEX sweeper.
//!
//! All spatial problems live on the periodic unit cube with `side` points per
//! axis at x_i = i / side and use FFT-based operators.

mod advec_diff;
mod dahlquist;
mod heat;

pub use advec_diff::AdvecDiff1D;
pub use dahlquist::Dahlquist;
pub use heat::{Heat, Heat1D, Heat3D};

use crate::encap::{Encapsulation, GridVector, split_index};
use crate::spectral::{Complex, FftWorkspace, wave_number};

/// Symbol of the Laplacian at every linear FFT index.
pub(crate) fn laplacian_symbol(side: usize, dim: usize) -> Vec<f64> {
    let total = side.pow(dim as u32);
    (0..total)
        .map(|i| {
            split_index(i, side, dim)
                .into_iter()
                .map(|k| -wave_number(k, side).powi(2))
                .sum::<f64>()
        })
        .collect()
}

/// Inverse transform of `spectrum * symbol`, normalised, real part.
pub(crate) fn apply_symbol<const DIM: usize>(
    fft: &mut FftWorkspace,
    u: &GridVector<DIM>,
    side: usize,
    symbol: impl Fn(usize) -> Complex<f64>,
) -> GridVector<DIM> {
    let n = u.num_dofs() as f64;
    let mut spectrum = fft.forward(u.data(), side, DIM);
    for (i, z) in spectrum.iter_mut().enumerate() {
        *z *= symbol(i) / n;
    }
    fft.backward(&mut spectrum, side, DIM);
    GridVector::from_vec(spectrum.iter().map(|z| z.re).collect())
}
