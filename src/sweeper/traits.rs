//! Sweeper lifecycle.

use crate::encap::Encapsulation;
use crate::error::{PfasstError, Result};

use super::base::SweeperCore;

/// Lifecycle of a level: setup → predict → (save → sweep)* → advance.
///
/// Implementors hold a [`SweeperCore`] and override the numerical hooks. The
/// generic `predict`/`sweep` are no-ops; operations that need problem
/// knowledge fail with [`PfasstError::NotImplemented`] until overridden.
pub trait Sweeper {
    type Encap: Encapsulation;

    fn core(&self) -> &SweeperCore<Self::Encap>;

    fn core_mut(&mut self) -> &mut SweeperCore<Self::Encap>;

    fn setup(&mut self) -> Result<()> {
        self.core_mut().setup()
    }

    fn spread(&mut self) -> Result<()> {
        self.core_mut().spread()
    }

    fn save(&mut self) -> Result<()> {
        self.core_mut().save()
    }

    fn pre_predict(&mut self) -> Result<()> {
        Ok(())
    }

    fn predict(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_predict(&mut self) -> Result<()> {
        self.core_mut().integrate_end_state()
    }

    fn pre_sweep(&mut self) -> Result<()> {
        Ok(())
    }

    fn sweep(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_sweep(&mut self) -> Result<()> {
        self.core_mut().integrate_end_state()
    }

    fn post_step(&mut self) -> Result<()> {
        Ok(())
    }

    /// Move the end state into the initial slot for the next step.
    fn advance(&mut self, _num_steps: usize) -> Result<()> {
        Err(PfasstError::NotImplemented("advance for generic sweeper"))
    }

    /// Recompute cached right-hand sides (initial node only if `initial_only`).
    fn reevaluate(&mut self, _initial_only: bool) -> Result<()> {
        Err(PfasstError::NotImplemented("reevaluation for generic sweeper"))
    }

    /// Cumulative quadrature integrals of the right-hand side, one per slot.
    fn integrate(&self, _dt: f64) -> Result<Vec<Self::Encap>> {
        Err(PfasstError::NotImplemented("integration for generic sweeper"))
    }

    /// Fill the residual vectors (last node only if `only_last`).
    fn compute_residuals(&mut self, _only_last: bool) -> Result<()> {
        Err(PfasstError::NotImplemented("residual computation for generic sweeper"))
    }

    /// Compute residuals and run the convergence check.
    fn converged(&mut self, pre_check: bool) -> Result<bool> {
        self.compute_residuals(pre_check)?;
        self.core_mut().check_convergence(pre_check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encap::Vector1D;
    use crate::quadrature::{Quadrature, QuadratureType};
    use crate::status::Status;
    use std::sync::Arc;

    struct PlainSweeper {
        core: SweeperCore<Vector1D>,
    }

    impl Sweeper for PlainSweeper {
        type Encap = Vector1D;

        fn core(&self) -> &SweeperCore<Vector1D> {
            &self.core
        }

        fn core_mut(&mut self) -> &mut SweeperCore<Vector1D> {
            &mut self.core
        }
    }

    fn plain() -> PlainSweeper {
        let mut core = SweeperCore::new(1);
        core.set_quadrature(Arc::new(Quadrature::new(QuadratureType::GaussLobatto, 3).unwrap()));
        core.set_status(Status::new(0.0, 0.1, 1, 2));
        PlainSweeper { core }
    }

    #[test]
    fn test_generic_hooks_are_noops() {
        let mut sweeper = plain();
        sweeper.setup().unwrap();
        sweeper.core_mut().initial_state_mut().unwrap().data[0] = 3.0;
        sweeper.spread().unwrap();
        sweeper.predict().unwrap();
        sweeper.post_predict().unwrap();
        sweeper.save().unwrap();
        sweeper.sweep().unwrap();
        sweeper.post_sweep().unwrap();
        assert_eq!(sweeper.core().end_state().unwrap().data, vec![3.0]);
    }

    #[test]
    fn test_missing_specialisations_report_not_implemented() {
        let mut sweeper = plain();
        sweeper.setup().unwrap();
        assert!(sweeper.advance(1).unwrap_err().is_not_implemented());
        assert!(sweeper.reevaluate(true).unwrap_err().is_not_implemented());
        assert!(sweeper.integrate(0.1).unwrap_err().is_not_implemented());
        assert!(sweeper.converged(false).unwrap_err().is_not_implemented());
    }
}
