//! Advection-diffusion u_t = -v u_x + ν u_xx on the periodic unit interval.

use std::f64::consts::PI;

use crate::encap::{Encapsulation, Vector1D};
use crate::error::Result;
use crate::spectral::{Complex, FftWorkspace, wave_number};
use crate::sweeper::ImexProblem;

use super::{apply_symbol, laplacian_symbol};

/// Advection explicit, diffusion implicit.
#[derive(Debug)]
pub struct AdvecDiff1D {
    num_dofs: usize,
    velocity: f64,
    nu: f64,
    ddx: Vec<Complex<f64>>,
    lap: Vec<f64>,
    fft: FftWorkspace,
}

impl AdvecDiff1D {
    pub fn new(num_dofs: usize, velocity: f64, nu: f64) -> Self {
        let ddx = (0..num_dofs)
            .map(|k| {
                // the Nyquist mode has no well-defined derivative
                if num_dofs % 2 == 0 && k == num_dofs / 2 {
                    Complex::new(0.0, 0.0)
                } else {
                    Complex::new(0.0, wave_number(k, num_dofs))
                }
            })
            .collect();
        Self {
            num_dofs,
            velocity,
            nu,
            ddx,
            lap: laplacian_symbol(num_dofs, 1),
            fft: FftWorkspace::new(),
        }
    }

    pub fn initial_value(&self) -> Vector1D {
        self.profile(0.0)
    }

    /// sin(2π(x - v t)) e^{-4π²νt}
    fn profile(&self, t: f64) -> Vector1D {
        let n = self.num_dofs as f64;
        let decay = (-4.0 * PI * PI * self.nu * t).exp();
        Vector1D::from_fn(self.num_dofs, |i| {
            (2.0 * PI * (i as f64 / n - self.velocity * t)).sin() * decay
        })
    }
}

impl ImexProblem for AdvecDiff1D {
    type Encap = Vector1D;

    fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    fn evaluate_rhs_expl(&mut self, _t: f64, u: &Vector1D) -> Result<Vector1D> {
        let v = self.velocity;
        let ddx = &self.ddx;
        Ok(apply_symbol(&mut self.fft, u, self.num_dofs, |i| ddx[i] * -v))
    }

    fn evaluate_rhs_impl(&mut self, _t: f64, u: &Vector1D) -> Result<Vector1D> {
        let nu = self.nu;
        let lap = &self.lap;
        Ok(apply_symbol(&mut self.fft, u, self.num_dofs, |i| {
            Complex::new(nu * lap[i], 0.0)
        }))
    }

    fn implicit_solve(
        &mut self,
        f: &mut Vector1D,
        u: &mut Vector1D,
        t: f64,
        dt: f64,
        rhs: &Vector1D,
    ) -> Result<()> {
        if dt == 0.0 {
            u.copy_from(rhs)?;
            *f = self.evaluate_rhs_impl(t, u)?;
            return Ok(());
        }
        let c = self.nu * dt;
        let lap = &self.lap;
        let solved = apply_symbol(&mut self.fft, rhs, self.num_dofs, |i| {
            Complex::new(1.0 / (1.0 - c * lap[i]), 0.0)
        });
        u.copy_from(&solved)?;
        for ((fi, ui), ri) in f.data.iter_mut().zip(&u.data).zip(&rhs.data) {
            *fi = (ui - ri) / dt;
        }
        Ok(())
    }

    fn exact(&self, t: f64) -> Result<Vector1D> {
        Ok(self.profile(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_rhs_matches_time_derivative() {
        let mut p = AdvecDiff1D::new(32, 1.0, 0.02);
        let t = 0.1;
        let u = p.exact(t).unwrap();
        let mut f = p.evaluate_rhs_expl(t, &u).unwrap();
        f.scaled_add(1.0, &p.evaluate_rhs_impl(t, &u).unwrap());

        let h = 1e-6;
        let up = p.exact(t + h).unwrap();
        let um = p.exact(t - h).unwrap();
        for i in 0..32 {
            let dudt = (up.data[i] - um.data[i]) / (2.0 * h);
            assert!((f.data[i] - dudt).abs() < 1e-6, "dof {}: {} vs {}", i, f.data[i], dudt);
        }
    }
}
