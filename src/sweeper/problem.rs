//! Problem interface consumed by the IMEX sweeper.

use crate::encap::Encapsulation;
use crate::error::{PfasstError, Result};

/// Right-hand side split u' = f_expl(t, u) + f_impl(t, u).
///
/// Every method defaults to [`PfasstError::NotImplemented`]; a concrete
/// problem supplies at least the two evaluations and the implicit solve.
pub trait ImexProblem {
    type Encap: Encapsulation;

    /// Degrees of freedom of the containers this problem works on.
    fn num_dofs(&self) -> usize;

    /// Explicit (non-stiff) part.
    fn evaluate_rhs_expl(&mut self, _t: f64, _u: &Self::Encap) -> Result<Self::Encap> {
        Err(PfasstError::NotImplemented("explicit right-hand side evaluation"))
    }

    /// Implicit (stiff) part.
    fn evaluate_rhs_impl(&mut self, _t: f64, _u: &Self::Encap) -> Result<Self::Encap> {
        Err(PfasstError::NotImplemented("implicit right-hand side evaluation"))
    }

    /// Solve u - dt * f_impl(t, u) = rhs for `u` and store f_impl(t, u) in `f`.
    fn implicit_solve(
        &mut self,
        _f: &mut Self::Encap,
        _u: &mut Self::Encap,
        _t: f64,
        _dt: f64,
        _rhs: &Self::Encap,
    ) -> Result<()> {
        Err(PfasstError::NotImplemented("implicit solve"))
    }

    /// Analytic solution, where known.
    fn exact(&self, _t: f64) -> Result<Self::Encap> {
        Err(PfasstError::NotImplemented("exact solution"))
    }
}
