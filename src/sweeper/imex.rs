//! Implicit-explicit SDC sweeper.
//!
//! With nodes τ_0 < ... < τ_{M-1}, sub-steps Δτ_m = τ_m - τ_{m-1} (τ_{-1} = 0)
//! and slot m + 1 holding node m, one sweep updates the nodes left to right:
//!
//! u_{m+1}^{k+1} = u_m^{k+1} + Δt_m [f_E(u_m^{k+1}) - f_E(u_m^k)]
//!               + Δt_m [f_I(u_{m+1}^{k+1}) - f_I(u_{m+1}^k)]
//!               + Δt S_m F(u^k) + (τ_{m+1} - τ_m)
//!
//! where the last term is the FAS correction injected by a finer level.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::base::SweeperCore;
use super::problem::ImexProblem;
use super::traits::Sweeper;
use crate::encap::{Encapsulation, mat_apply};
use crate::error::{PfasstError, Result};
use crate::quadrature::Quadrature;

/// Sub-steps shorter than this (in units of the step) are treated as zero.
const ZERO_SUBSTEP: f64 = 1e-14;

/// SDC sweeper for problems with an implicit-explicit splitting.
pub struct ImexSweeper<P: ImexProblem> {
    core: SweeperCore<P::Encap>,
    problem: P,
    expl_rhs: Vec<P::Encap>,
    impl_rhs: Vec<P::Encap>,
    q_integrals: Vec<P::Encap>,
    num_expl_evals: usize,
    num_impl_evals: usize,
    num_impl_solves: usize,
}

impl<P: ImexProblem> ImexSweeper<P> {
    pub fn new(problem: P) -> Self {
        let num_dofs = problem.num_dofs();
        Self {
            core: SweeperCore::new(num_dofs),
            problem,
            expl_rhs: Vec::new(),
            impl_rhs: Vec::new(),
            q_integrals: Vec::new(),
            num_expl_evals: 0,
            num_impl_evals: 0,
            num_impl_solves: 0,
        }
    }

    /// Sweeper with its quadrature already attached.
    pub fn with_quadrature(problem: P, quadrature: Arc<Quadrature>) -> Self {
        let mut sweeper = Self::new(problem);
        sweeper.core.set_quadrature(quadrature);
        sweeper
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn problem_mut(&mut self) -> &mut P {
        &mut self.problem
    }

    /// Cached explicit right-hand sides, one per slot.
    pub fn expl_rhs(&self) -> &[P::Encap] {
        &self.expl_rhs
    }

    /// Cached implicit right-hand sides, one per slot.
    pub fn impl_rhs(&self) -> &[P::Encap] {
        &self.impl_rhs
    }

    /// Node-to-node integrals of the last sweep, including correction terms.
    pub fn q_integrals(&self) -> &[P::Encap] {
        &self.q_integrals
    }

    pub fn num_expl_evals(&self) -> usize {
        self.num_expl_evals
    }

    pub fn num_impl_evals(&self) -> usize {
        self.num_impl_evals
    }

    pub fn num_impl_solves(&self) -> usize {
        self.num_impl_solves
    }

    /// Node storage and right-hand side caches are allocated by `setup()`.
    fn ensure_set_up(&self, what: &'static str) -> Result<()> {
        self.core.ensure_set_up(what)?;
        if self.expl_rhs.len() != self.core.states.len() {
            return Err(PfasstError::NotSetUp(what));
        }
        Ok(())
    }

    fn step_bounds(&self) -> Result<(f64, f64)> {
        let status = self.core.status()?;
        Ok((status.time, status.dt))
    }

    fn node_time(nodes: &[f64], t0: f64, dt: f64, slot: usize) -> f64 {
        if slot == 0 { t0 } else { t0 + dt * nodes[slot - 1] }
    }

    /// Δτ_m in units of the step.
    fn unit_substep(nodes: &[f64], m: usize) -> f64 {
        if m == 0 { nodes[0] } else { nodes[m] - nodes[m - 1] }
    }

    fn eval_expl(&mut self, slot: usize, t: f64) -> Result<()> {
        self.expl_rhs[slot] = self.problem.evaluate_rhs_expl(t, &self.core.states[slot])?;
        self.num_expl_evals += 1;
        Ok(())
    }

    fn eval_impl(&mut self, slot: usize, t: f64) -> Result<()> {
        self.impl_rhs[slot] = self.problem.evaluate_rhs_impl(t, &self.core.states[slot])?;
        self.num_impl_evals += 1;
        Ok(())
    }

    /// Set slot `m + 1` from `rhs`: an implicit solve over `ds`, or a plain
    /// copy when node m coincides with its predecessor.
    fn solve_node(&mut self, m: usize, t: f64, ds: f64, unit_ds: f64, rhs: &P::Encap) -> Result<()> {
        if unit_ds.abs() < ZERO_SUBSTEP {
            self.core.states[m + 1].copy_from(rhs)?;
            self.eval_impl(m + 1, t)
        } else {
            self.problem.implicit_solve(
                &mut self.impl_rhs[m + 1],
                &mut self.core.states[m + 1],
                t,
                ds,
                rhs,
            )?;
            self.num_impl_solves += 1;
            Ok(())
        }
    }

    /// Max-norm error against [`ImexProblem::exact`] in every slot.
    pub fn compute_error(&self) -> Result<Vec<f64>> {
        let quad = self.core.quadrature()?;
        let (t0, dt) = self.step_bounds()?;
        self.core
            .states
            .iter()
            .enumerate()
            .map(|(slot, state)| {
                let mut diff = self.problem.exact(Self::node_time(quad.nodes(), t0, dt, slot))?;
                diff.scaled_add(-1.0, state);
                Ok(diff.norm0())
            })
            .collect()
    }

    /// Max-norm error of the end state against the exact solution at step end.
    pub fn end_error(&self) -> Result<f64> {
        let (t0, dt) = self.step_bounds()?;
        let mut diff = self.problem.exact(t0 + dt)?;
        diff.scaled_add(-1.0, self.core.end_state()?);
        Ok(diff.norm0())
    }
}

impl<P: ImexProblem> Sweeper for ImexSweeper<P> {
    type Encap = P::Encap;

    fn core(&self) -> &SweeperCore<P::Encap> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SweeperCore<P::Encap> {
        &mut self.core
    }

    fn setup(&mut self) -> Result<()> {
        self.core.setup()?;
        let quad = self.core.quadrature()?;
        if !quad.right_is_node() {
            warn!(
                target: "sweeper",
                level = %self.core.logger_id(),
                "{} nodes do not include the step end; end state integration will fail",
                quad.kind()
            );
        }
        let len = quad.num_nodes() + 1;
        let factory = self.core.factory();
        self.expl_rhs = factory.create_many(len);
        self.impl_rhs = factory.create_many(len);
        self.q_integrals = factory.create_many(len);
        Ok(())
    }

    fn predict(&mut self) -> Result<()> {
        self.ensure_set_up("predict")?;
        let quad = Arc::clone(self.core.quadrature()?);
        let nodes = quad.nodes();
        let (t0, dt) = self.step_bounds()?;

        debug!(target: "sweeper", level = %self.core.logger_id(), t0, dt, "predicting");

        self.eval_expl(0, t0)?;
        self.eval_impl(0, t0)?;

        for m in 0..nodes.len() {
            let t = t0 + dt * nodes[m];
            let unit_ds = Self::unit_substep(nodes, m);
            let ds = dt * unit_ds;

            let mut rhs = self.core.states[m].clone();
            rhs.scaled_add(ds, &self.expl_rhs[m]);
            rhs.scaled_add(1.0, &self.core.tau[m + 1]);
            rhs.scaled_add(-1.0, &self.core.tau[m]);

            self.solve_node(m, t, ds, unit_ds, &rhs)?;
            self.eval_expl(m + 1, t)?;
        }
        Ok(())
    }

    fn sweep(&mut self) -> Result<()> {
        self.ensure_set_up("sweep")?;
        let quad = Arc::clone(self.core.quadrature()?);
        let nodes = quad.nodes();
        let s_mat = quad.s_mat();
        let num_nodes = nodes.len();
        let (t0, dt) = self.step_bounds()?;

        debug!(target: "sweeper", level = %self.core.logger_id(), t0, dt, "sweeping");

        // integrals of the previous iterate, with the old sub-step terms removed
        for m in 0..num_nodes {
            let ds = dt * Self::unit_substep(nodes, m);
            let q = &mut self.q_integrals[m + 1];
            q.zero();
            for j in 0..num_nodes {
                let w = dt * s_mat[(m, j)];
                q.scaled_add(w, &self.expl_rhs[j + 1]);
                q.scaled_add(w, &self.impl_rhs[j + 1]);
            }
            q.scaled_add(1.0, &self.core.tau[m + 1]);
            q.scaled_add(-1.0, &self.core.tau[m]);
            q.scaled_add(-ds, &self.expl_rhs[m]);
            q.scaled_add(-ds, &self.impl_rhs[m + 1]);
        }

        for m in 0..num_nodes {
            let t = t0 + dt * nodes[m];
            let unit_ds = Self::unit_substep(nodes, m);
            let ds = dt * unit_ds;

            let mut rhs = self.core.states[m].clone();
            rhs.scaled_add(ds, &self.expl_rhs[m]);
            rhs.scaled_add(1.0, &self.q_integrals[m + 1]);

            self.solve_node(m, t, ds, unit_ds, &rhs)?;
            self.eval_expl(m + 1, t)?;
        }
        Ok(())
    }

    fn post_step(&mut self) -> Result<()> {
        info!(
            target: "sweeper",
            level = %self.core.logger_id(),
            expl_evals = self.num_expl_evals,
            impl_evals = self.num_impl_evals,
            impl_solves = self.num_impl_solves,
            "step finished"
        );
        self.num_expl_evals = 0;
        self.num_impl_evals = 0;
        self.num_impl_solves = 0;
        Ok(())
    }

    fn advance(&mut self, num_steps: usize) -> Result<()> {
        self.ensure_set_up("advance")?;
        let last = self.core.states.len() - 1;
        let end = self.core.end_state()?.clone();
        self.core.states[0].copy_from(&end)?;

        // f(t0 + dt, u_end) is the first evaluation of the next step
        self.expl_rhs[0] = self.expl_rhs[last].clone();
        self.impl_rhs[0] = self.impl_rhs[last].clone();
        self.core.reset_tau();

        debug!(target: "sweeper", level = %self.core.logger_id(), num_steps, "advanced");
        Ok(())
    }

    fn reevaluate(&mut self, initial_only: bool) -> Result<()> {
        self.ensure_set_up("reevaluate")?;
        let (t0, dt) = self.step_bounds()?;
        if initial_only {
            self.eval_expl(0, t0)?;
            return self.eval_impl(0, t0);
        }

        let quad = Arc::clone(self.core.quadrature()?);
        for slot in 0..self.core.states.len() {
            let t = Self::node_time(quad.nodes(), t0, dt, slot);
            self.eval_expl(slot, t)?;
            self.eval_impl(slot, t)?;
        }
        Ok(())
    }

    fn integrate(&self, dt: f64) -> Result<Vec<P::Encap>> {
        self.ensure_set_up("integrate")?;
        let quad = self.core.quadrature()?;
        let num_nodes = quad.num_nodes();

        let totals: Vec<P::Encap> = (1..=num_nodes)
            .map(|j| {
                let mut f = self.expl_rhs[j].clone();
                f.scaled_add(1.0, &self.impl_rhs[j]);
                f
            })
            .collect();

        let mut result = self.core.factory().create_many(num_nodes + 1);
        mat_apply(&mut result[1..], dt, quad.q_mat(), &totals, true)?;
        Ok(result)
    }

    fn compute_residuals(&mut self, only_last: bool) -> Result<()> {
        self.ensure_set_up("residuals")?;
        let dt = self.core.status()?.dt;
        let integrals = self.integrate(dt)?;
        let last = integrals.len() - 1;
        let first = if only_last { last } else { 1 };

        let core = &mut self.core;
        for m in first..=last {
            let residual = &mut core.residuals[m];
            residual.copy_from(&core.states[0])?;
            residual.scaled_add(1.0, &integrals[m]);
            residual.scaled_add(1.0, &core.tau[m]);
            residual.scaled_add(-1.0, &core.states[m]);
        }
        core.residuals[0].zero();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encap::Vector1D;
    use crate::quadrature::QuadratureType;
    use crate::status::Status;

    /// u' = a (explicit) + b u (implicit), scalar.
    struct Affine {
        a: f64,
        b: f64,
    }

    impl ImexProblem for Affine {
        type Encap = Vector1D;

        fn num_dofs(&self) -> usize {
            1
        }

        fn evaluate_rhs_expl(&mut self, _t: f64, _u: &Vector1D) -> Result<Vector1D> {
            Ok(Vector1D::from_vec(vec![self.a]))
        }

        fn evaluate_rhs_impl(&mut self, _t: f64, u: &Vector1D) -> Result<Vector1D> {
            Ok(Vector1D::from_vec(vec![self.b * u.data[0]]))
        }

        fn implicit_solve(
            &mut self,
            f: &mut Vector1D,
            u: &mut Vector1D,
            _t: f64,
            dt: f64,
            rhs: &Vector1D,
        ) -> Result<()> {
            u.data[0] = rhs.data[0] / (1.0 - dt * self.b);
            f.data[0] = self.b * u.data[0];
            Ok(())
        }

        fn exact(&self, t: f64) -> Result<Vector1D> {
            // u(0) = 1
            let u = if self.b == 0.0 {
                1.0 + self.a * t
            } else {
                (1.0 + self.a / self.b) * (self.b * t).exp() - self.a / self.b
            };
            Ok(Vector1D::from_vec(vec![u]))
        }
    }

    fn sweeper(problem: Affine, kind: QuadratureType, nodes: usize, dt: f64) -> ImexSweeper<Affine> {
        let quad = Arc::new(Quadrature::new(kind, nodes).unwrap());
        let mut s = ImexSweeper::with_quadrature(problem, quad);
        s.core_mut().set_status(Status::new(0.0, dt, 1, 10));
        s.setup().unwrap();
        s.core_mut().initial_state_mut().unwrap().data[0] = 1.0;
        s
    }

    #[test]
    fn test_constant_rhs_residual_vanishes() {
        let mut s = sweeper(Affine { a: 2.0, b: 0.0 }, QuadratureType::GaussLobatto, 4, 0.5);
        s.predict().unwrap();
        s.post_predict().unwrap();
        // constant RHS: the predictor is already the collocation solution
        s.compute_residuals(false).unwrap();
        for (m, r) in s.core().residuals().iter().enumerate() {
            assert!(r.norm0() < 1e-14, "residual at slot {}: {}", m, r.norm0());
        }
        assert!(s.end_error().unwrap() < 1e-14);
    }

    #[test]
    fn test_sweeps_reach_collocation_solution() {
        let dt = 0.1;
        let mut s = sweeper(Affine { a: 0.5, b: -1.0 }, QuadratureType::GaussRadau, 3, dt);
        s.predict().unwrap();
        s.post_predict().unwrap();
        for _ in 0..12 {
            s.save().unwrap();
            s.sweep().unwrap();
            s.post_sweep().unwrap();
        }
        s.compute_residuals(false).unwrap();
        s.core_mut().check_convergence(false).unwrap();
        assert!(s.core().status().unwrap().abs_res_norm < 1e-13);
        // Radau IIA with 3 nodes is 5th order
        assert!(s.end_error().unwrap() < 1e-8, "error {}", s.end_error().unwrap());
    }

    #[test]
    fn test_residual_decreases() {
        let mut s = sweeper(Affine { a: 0.0, b: -5.0 }, QuadratureType::GaussLobatto, 5, 0.1);
        s.predict().unwrap();
        s.post_predict().unwrap();
        let mut prev = f64::INFINITY;
        for _ in 0..6 {
            s.save().unwrap();
            s.sweep().unwrap();
            s.post_sweep().unwrap();
            assert!(!s.converged(false).unwrap());
            let res = s.core().status().unwrap().abs_res_norm;
            assert!(res < prev, "{} !< {}", res, prev);
            prev = res;
        }
    }

    #[test]
    fn test_zero_substep_is_copied_not_solved() {
        let mut s = sweeper(Affine { a: 0.0, b: -1.0 }, QuadratureType::GaussLobatto, 3, 0.1);
        s.predict().unwrap();
        // three nodes, the first at the left end
        assert_eq!(s.num_impl_solves(), 2);
        assert_eq!(s.core().states()[1].data, s.core().states()[0].data);
        s.post_step().unwrap();
        assert_eq!(s.num_impl_solves(), 0);
    }

    #[test]
    fn test_integrate_shape_and_first_slot() {
        let mut s = sweeper(Affine { a: 1.0, b: 0.0 }, QuadratureType::ClenshawCurtis, 3, 0.2);
        s.predict().unwrap();
        let integrals = s.integrate(0.2).unwrap();
        assert_eq!(integrals.len(), 4);
        assert_eq!(integrals[0].norm0(), 0.0);
        // ∫ 1 over the whole step
        assert!((integrals[3].data[0] - 0.2).abs() < 1e-14);
    }

    #[test]
    fn test_advance_moves_end_state() {
        let mut s = sweeper(Affine { a: 1.0, b: 0.0 }, QuadratureType::GaussLobatto, 3, 0.2);
        s.predict().unwrap();
        s.post_predict().unwrap();
        s.advance(1).unwrap();
        assert!((s.core().initial_state().unwrap().data[0] - 1.2).abs() < 1e-14);
        assert_eq!(s.expl_rhs()[0].data, vec![1.0]);
    }

    #[test]
    fn test_operations_before_setup_fail() {
        let quad = Arc::new(Quadrature::new(QuadratureType::GaussLobatto, 3).unwrap());
        let mut s = ImexSweeper::with_quadrature(Affine { a: 1.0, b: -1.0 }, quad);
        s.core_mut().set_status(Status::new(0.0, 0.1, 1, 5));

        assert!(matches!(s.predict(), Err(PfasstError::NotSetUp("predict"))));
        assert!(matches!(s.sweep(), Err(PfasstError::NotSetUp("sweep"))));
        assert!(matches!(s.integrate(0.1), Err(PfasstError::NotSetUp(_))));
        assert!(matches!(s.compute_residuals(false), Err(PfasstError::NotSetUp(_))));
        assert!(matches!(s.reevaluate(true), Err(PfasstError::NotSetUp(_))));
        assert!(matches!(s.advance(1), Err(PfasstError::NotSetUp(_))));

        s.setup().unwrap();
        s.predict().unwrap();
    }

    #[test]
    fn test_unimplemented_problem() {
        struct Empty;
        impl ImexProblem for Empty {
            type Encap = Vector1D;
            fn num_dofs(&self) -> usize {
                1
            }
        }
        let quad = Arc::new(Quadrature::new(QuadratureType::GaussLobatto, 3).unwrap());
        let mut s = ImexSweeper::with_quadrature(Empty, quad);
        s.core_mut().set_status(Status::new(0.0, 0.1, 1, 1));
        s.setup().unwrap();
        assert!(s.predict().unwrap_err().is_not_implemented());
        assert!(s.compute_error().unwrap_err().is_not_implemented());
    }
}
