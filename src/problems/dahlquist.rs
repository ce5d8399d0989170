//! Scalar test equation u' = λ_E u + λ_I u.

use crate::encap::{Encapsulation, Vector1D};
use crate::error::{PfasstError, Result};
use crate::sweeper::ImexProblem;

/// Dahlquist equation with the eigenvalue split into an explicit and an
/// implicit part.
#[derive(Clone, Debug, PartialEq)]
pub struct Dahlquist {
    pub lambda_expl: f64,
    pub lambda_impl: f64,
    /// Value at `t = 0`.
    pub u0: f64,
}

impl Dahlquist {
    /// Fully implicit treatment of `lambda`, u(0) = 1.
    pub fn new(lambda: f64) -> Self {
        Self {
            lambda_expl: 0.0,
            lambda_impl: lambda,
            u0: 1.0,
        }
    }

    pub fn with_split(lambda_expl: f64, lambda_impl: f64) -> Self {
        Self {
            lambda_expl,
            lambda_impl,
            u0: 1.0,
        }
    }

    pub fn initial_value(&self) -> Vector1D {
        Vector1D::from_vec(vec![self.u0])
    }
}

impl ImexProblem for Dahlquist {
    type Encap = Vector1D;

    fn num_dofs(&self) -> usize {
        1
    }

    fn evaluate_rhs_expl(&mut self, _t: f64, u: &Vector1D) -> Result<Vector1D> {
        Ok(Vector1D::from_vec(vec![self.lambda_expl * u.data[0]]))
    }

    fn evaluate_rhs_impl(&mut self, _t: f64, u: &Vector1D) -> Result<Vector1D> {
        Ok(Vector1D::from_vec(vec![self.lambda_impl * u.data[0]]))
    }

    fn implicit_solve(
        &mut self,
        f: &mut Vector1D,
        u: &mut Vector1D,
        _t: f64,
        dt: f64,
        rhs: &Vector1D,
    ) -> Result<()> {
        let denom = 1.0 - dt * self.lambda_impl;
        if denom == 0.0 {
            return Err(PfasstError::InvalidArgument(format!(
                "implicit step singular for dt = {} and lambda = {}",
                dt, self.lambda_impl
            )));
        }
        u.copy_from(rhs)?;
        u.data[0] /= denom;
        f.data[0] = self.lambda_impl * u.data[0];
        Ok(())
    }

    fn exact(&self, t: f64) -> Result<Vector1D> {
        let lambda = self.lambda_expl + self.lambda_impl;
        Ok(Vector1D::from_vec(vec![self.u0 * (lambda * t).exp()]))
    }
}
