//! Fourier interpolation between periodic cube grids.
//!
//! FFT storage puts the positive frequencies of each axis at its start and the
//! negative ones at its end. Refining by two keeps both blocks at their ends
//! and fills the gap with zeros, so in 2D the zero padding forms a "plus":
//!
//! ```text
//! + + . .        + + 0 0 0 0 . .
//! + + . .        + + 0 0 0 0 . .
//! . . - -   ->   0 0 0 0 0 0 0 0
//! . . - -        0 0 0 0 0 0 0 0
//!                0 0 0 0 0 0 0 0
//!                0 0 0 0 0 0 0 0
//!                . . 0 0 0 0 - -
//!                . . 0 0 0 0 - -
//! ```
//!
//! Restriction samples every second grid point along each axis.

use std::fmt;

use rustfft::num_complex::Complex;
use tracing::{debug, trace};

use super::polynomial::PolynomialTransfer;
use super::traits::DataTransfer;
use crate::encap::{Encapsulation, GridVector, cube_side, linearized_index, split_index};
use crate::error::{PfasstError, Result};
use crate::spectral::FftWorkspace;

/// Spectral [`DataTransfer`] for `DIM`-dimensional cube grids.
#[derive(Default)]
pub struct SpectralTransfer<const DIM: usize> {
    fft: FftWorkspace,
}

impl<const DIM: usize> fmt::Debug for SpectralTransfer<DIM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralTransfer")
            .field("dim", &DIM)
            .field("fft", &self.fft)
            .finish()
    }
}

/// Level transfer for 1D spectral problems.
pub type Spectral1DTransfer = PolynomialTransfer<SpectralTransfer<1>>;
/// Level transfer for 2D spectral problems.
pub type Spectral2DTransfer = PolynomialTransfer<SpectralTransfer<2>>;
/// Level transfer for 3D spectral problems.
pub type Spectral3DTransfer = PolynomialTransfer<SpectralTransfer<3>>;

impl<const DIM: usize> SpectralTransfer<DIM> {
    pub fn new() -> Self {
        Self {
            fft: FftWorkspace::new(),
        }
    }

    /// Cube sides of both grids; the fine side must be twice the even coarse one.
    fn sides(coarse_dofs: usize, fine_dofs: usize) -> Result<(usize, usize)> {
        let coarse_side = cube_side(coarse_dofs, DIM, "coarse")?;
        let fine_side = cube_side(fine_dofs, DIM, "fine")?;
        if fine_side != 2 * coarse_side {
            return Err(PfasstError::UnsupportedCoarsening {
                coarse: coarse_side,
                fine: fine_side,
            });
        }
        if coarse_side % 2 != 0 {
            return Err(PfasstError::OddCoarseSide { side: coarse_side });
        }
        Ok((coarse_side, fine_side))
    }

    /// Position of coarse frequency index `ci` along one fine axis.
    fn fine_axis_index(ci: usize, coarse_side: usize, fine_side: usize) -> usize {
        let half = coarse_side / 2;
        if ci < half { ci } else { fine_side - half + (ci - half) }
    }
}

impl<const DIM: usize> PolynomialTransfer<SpectralTransfer<DIM>> {
    /// Level transfer with a fresh spectral workspace.
    pub fn spectral() -> Self {
        PolynomialTransfer::new(SpectralTransfer::new())
    }
}

impl<const DIM: usize> DataTransfer<GridVector<DIM>> for SpectralTransfer<DIM> {
    fn interpolate_data(&mut self, coarse: &GridVector<DIM>, fine: &mut GridVector<DIM>) -> Result<()> {
        let coarse_dofs = coarse.num_dofs();
        let fine_dofs = fine.num_dofs();
        if coarse_dofs == 0 {
            return Err(PfasstError::InvalidArgument("empty coarse container".into()));
        }
        if coarse_dofs == fine_dofs {
            debug!(target: "transfer", dofs = coarse_dofs, "same number of dofs, copying without FFT");
            return fine.copy_from(coarse);
        }

        let (coarse_side, fine_side) = Self::sides(coarse_dofs, fine_dofs)?;
        trace!(target: "transfer", dim = DIM, coarse_side, fine_side, "spectral interpolation");

        let coarse_z = self.fft.forward(coarse.data(), coarse_side, DIM);
        let mut fine_z = vec![Complex::new(0.0, 0.0); fine_dofs];

        // the forward transform is unnormalised
        let c = 1.0 / coarse_dofs as f64;
        let mut fine_index = [0usize; DIM];
        for (ci, &value) in coarse_z.iter().enumerate() {
            let coarse_index = split_index(ci, coarse_side, DIM);
            for (f, &c_axis) in fine_index.iter_mut().zip(&coarse_index) {
                *f = Self::fine_axis_index(c_axis, coarse_side, fine_side);
            }
            fine_z[linearized_index(&fine_index, fine_side)] = value * c;
        }

        self.fft.backward(&mut fine_z, fine_side, DIM);
        for (dst, z) in fine.data_mut().iter_mut().zip(&fine_z) {
            *dst = z.re;
        }
        Ok(())
    }

    fn restrict_data(&mut self, fine: &GridVector<DIM>, coarse: &mut GridVector<DIM>) -> Result<()> {
        let coarse_dofs = coarse.num_dofs();
        let fine_dofs = fine.num_dofs();
        if coarse_dofs == 0 {
            return Err(PfasstError::InvalidArgument("empty coarse container".into()));
        }
        if coarse_dofs == fine_dofs {
            debug!(target: "transfer", dofs = coarse_dofs, "same number of dofs, copying");
            return coarse.copy_from(fine);
        }

        let (coarse_side, fine_side) = Self::sides(coarse_dofs, fine_dofs)?;
        let factor = fine_side / coarse_side;
        trace!(target: "transfer", dim = DIM, coarse_side, fine_side, "restriction by injection");

        let mut fine_index = [0usize; DIM];
        for (ci, dst) in coarse.data_mut().iter_mut().enumerate() {
            let coarse_index = split_index(ci, coarse_side, DIM);
            for (f, &c_axis) in fine_index.iter_mut().zip(&coarse_index) {
                *f = factor * c_axis;
            }
            *dst = fine.data()[linearized_index(&fine_index, fine_side)];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encap::{Cube3D, Vector1D};
    use std::f64::consts::PI;

    fn sampled(n: usize, f: impl Fn(f64) -> f64) -> Vector1D {
        Vector1D::from_fn(n, |i| f(i as f64 / n as f64))
    }

    #[test]
    fn test_fine_axis_index() {
        // coarse side 4 into fine side 8: 0 1 | 2 3 -> 0 1 | 6 7
        let idx: Vec<usize> = (0..4).map(|ci| SpectralTransfer::<1>::fine_axis_index(ci, 4, 8)).collect();
        assert_eq!(idx, vec![0, 1, 6, 7]);
    }

    #[test]
    fn test_interpolation_is_exact_for_resolved_modes() {
        let mut transfer = SpectralTransfer::<1>::new();
        let f = |x: f64| (2.0 * PI * x).sin() + 0.5 * (4.0 * PI * x).cos();
        let coarse = sampled(8, f);
        let mut fine = Vector1D::zeros(16);
        transfer.interpolate_data(&coarse, &mut fine).unwrap();

        let expected = sampled(16, f);
        for (a, b) in fine.data.iter().zip(&expected.data) {
            assert!((a - b).abs() < 1e-13, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_restriction_samples_every_other_point() {
        let mut transfer = SpectralTransfer::<1>::new();
        let fine = Vector1D::from_fn(8, |i| i as f64);
        let mut coarse = Vector1D::zeros(4);
        transfer.restrict_data(&fine, &mut coarse).unwrap();
        assert_eq!(coarse.data, vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_3d_restriction_strides_every_axis() {
        let mut transfer = SpectralTransfer::<3>::new();
        let fine = Cube3D::from_fn(64, |i| i as f64);
        let mut coarse = Cube3D::zeros(8);
        transfer.restrict_data(&fine, &mut coarse).unwrap();
        // (x, y, z) -> (2x, 2y, 2z) on the side-4 grid
        assert_eq!(coarse.data[1], 2.0);
        assert_eq!(coarse.data[2], 8.0);
        assert_eq!(coarse.data[4], 32.0);
        assert_eq!(coarse.data[7], 42.0);
    }

    #[test]
    fn test_odd_coarse_side_rejected() {
        for side in [1usize, 3, 5] {
            let mut transfer = SpectralTransfer::<1>::new();
            let coarse = Vector1D::zeros(side);
            let mut fine = Vector1D::zeros(2 * side);
            assert!(matches!(
                transfer.interpolate_data(&coarse, &mut fine),
                Err(PfasstError::OddCoarseSide { side: s }) if s == side
            ));
        }
    }

    #[test]
    fn test_non_cube_rejected() {
        let mut transfer = SpectralTransfer::<3>::new();
        let coarse = Cube3D::zeros(8);
        let mut fine = Cube3D::zeros(60);
        assert!(matches!(
            transfer.interpolate_data(&coarse, &mut fine),
            Err(PfasstError::NonCubeShape { which: "fine", .. })
        ));
    }
}
