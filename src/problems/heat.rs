//! Heat equation u_t = ν Δu on the periodic unit cube, diffusion treated implicitly.

use std::f64::consts::PI;

use crate::encap::{Encapsulation, GridVector, cube_side, split_index};
use crate::error::Result;
use crate::spectral::{Complex, FftWorkspace};
use crate::sweeper::ImexProblem;

use super::{apply_symbol, laplacian_symbol};

/// Spectral heat problem in `DIM` dimensions.
///
/// The exact solution starts from Σ_a sin(2π x_a) and decays with
/// e^{-4π²νt}.
#[derive(Debug)]
pub struct Heat<const DIM: usize> {
    side: usize,
    nu: f64,
    lap: Vec<f64>,
    fft: FftWorkspace,
}

pub type Heat1D = Heat<1>;
pub type Heat3D = Heat<3>;

impl<const DIM: usize> Heat<DIM> {
    /// `side` points per axis.
    pub fn new(side: usize, nu: f64) -> Self {
        Self {
            side,
            nu,
            lap: laplacian_symbol(side, DIM),
            fft: FftWorkspace::new(),
        }
    }

    /// Problem on a cube with `num_dofs` points in total.
    pub fn with_dofs(num_dofs: usize, nu: f64) -> Result<Self> {
        let side = cube_side(num_dofs, DIM, "heat")?;
        Ok(Self::new(side, nu))
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn nu(&self) -> f64 {
        self.nu
    }

    pub fn initial_value(&self) -> GridVector<DIM> {
        self.profile(0.0)
    }

    fn profile(&self, t: f64) -> GridVector<DIM> {
        let decay = (-4.0 * PI * PI * self.nu * t).exp();
        let side = self.side;
        GridVector::from_fn(self.lap.len(), |i| {
            let s: f64 = split_index(i, side, DIM)
                .into_iter()
                .map(|x| (2.0 * PI * x as f64 / side as f64).sin())
                .sum();
            s * decay
        })
    }
}

impl<const DIM: usize> ImexProblem for Heat<DIM> {
    type Encap = GridVector<DIM>;

    fn num_dofs(&self) -> usize {
        self.lap.len()
    }

    fn evaluate_rhs_expl(&mut self, _t: f64, u: &GridVector<DIM>) -> Result<GridVector<DIM>> {
        Ok(GridVector::zeros(u.num_dofs()))
    }

    fn evaluate_rhs_impl(&mut self, _t: f64, u: &GridVector<DIM>) -> Result<GridVector<DIM>> {
        let nu = self.nu;
        let lap = &self.lap;
        Ok(apply_symbol(&mut self.fft, u, self.side, |i| {
            Complex::new(nu * lap[i], 0.0)
        }))
    }

    fn implicit_solve(
        &mut self,
        f: &mut GridVector<DIM>,
        u: &mut GridVector<DIM>,
        t: f64,
        dt: f64,
        rhs: &GridVector<DIM>,
    ) -> Result<()> {
        if dt == 0.0 {
            u.copy_from(rhs)?;
            *f = self.evaluate_rhs_impl(t, u)?;
            return Ok(());
        }
        let c = self.nu * dt;
        let lap = &self.lap;
        let solved = apply_symbol(&mut self.fft, rhs, self.side, |i| {
            Complex::new(1.0 / (1.0 - c * lap[i]), 0.0)
        });
        u.copy_from(&solved)?;
        for ((fi, ui), ri) in f.data.iter_mut().zip(&u.data).zip(&rhs.data) {
            *fi = (ui - ri) / dt;
        }
        Ok(())
    }

    fn exact(&self, t: f64) -> Result<GridVector<DIM>> {
        Ok(self.profile(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rhs_of_exact_solution() {
        let mut heat = Heat1D::new(16, 0.1);
        let u = heat.exact(0.0).unwrap();
        let f = heat.evaluate_rhs_impl(0.0, &u).unwrap();
        let rate = -4.0 * PI * PI * 0.1;
        for (fi, ui) in f.data.iter().zip(&u.data) {
            assert!((fi - rate * ui).abs() < 1e-10);
        }
    }

    #[test]
    fn test_implicit_solve_inverts_operator() {
        let mut heat = Heat3D::new(4, 0.05);
        let rhs = heat.initial_value();
        let mut u = GridVector::zeros(64);
        let mut f = GridVector::zeros(64);
        heat.implicit_solve(&mut f, &mut u, 0.0, 0.1, &rhs).unwrap();

        let fu = heat.evaluate_rhs_impl(0.0, &u).unwrap();
        for i in 0..64 {
            assert!((u.data[i] - 0.1 * f.data[i] - rhs.data[i]).abs() < 1e-12);
            assert!((f.data[i] - fu.data[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_with_dofs_requires_cube() {
        assert_eq!(Heat3D::with_dofs(27, 0.1).unwrap().side(), 3);
        assert!(Heat3D::with_dofs(30, 0.1).is_err());
    }
}
