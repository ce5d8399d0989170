//! Per-level data shared by every sweeper.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SdcConfig;
use crate::encap::{EncapFactory, Encapsulation};
use crate::error::{PfasstError, Result};
use crate::logging::DEFAULT_LOGGER_ID;
use crate::quadrature::Quadrature;
use crate::status::{ConvergenceState, Status};

/// Node vectors, status and tolerances of one level.
///
/// Index 0 of `states`, `previous_states`, `tau` and `residuals` belongs to the
/// initial value; index `m + 1` to quadrature node `m`. All four vectors have
/// `num_nodes + 1` entries after [`setup`](Self::setup).
#[derive(Clone, Debug)]
pub struct SweeperCore<E: Encapsulation> {
    pub(crate) quadrature: Option<Arc<Quadrature>>,
    pub(crate) status: Option<Status>,
    pub(crate) factory: EncapFactory<E>,
    pub(crate) states: Vec<E>,
    pub(crate) previous_states: Vec<E>,
    pub(crate) tau: Vec<E>,
    pub(crate) residuals: Vec<E>,
    pub(crate) end_state: Option<E>,
    abs_residual_tol: f64,
    rel_residual_tol: f64,
    logger_id: String,
    warned_no_tolerance: bool,
}

impl<E: Encapsulation> SweeperCore<E> {
    /// Core for containers with `num_dofs` degrees of freedom.
    pub fn new(num_dofs: usize) -> Self {
        Self {
            quadrature: None,
            status: None,
            factory: EncapFactory::new(num_dofs),
            states: Vec::new(),
            previous_states: Vec::new(),
            tau: Vec::new(),
            residuals: Vec::new(),
            end_state: None,
            abs_residual_tol: 0.0,
            rel_residual_tol: 0.0,
            logger_id: DEFAULT_LOGGER_ID.to_string(),
            warned_no_tolerance: false,
        }
    }

    // ===== Configuration =====

    /// Read residual tolerances from the configuration.
    pub fn set_options(&mut self, config: &SdcConfig) {
        self.abs_residual_tol = config.abs_residual_tol;
        self.rel_residual_tol = config.rel_residual_tol;
    }

    pub fn set_abs_residual_tol(&mut self, tol: f64) {
        self.abs_residual_tol = tol;
    }

    pub fn set_rel_residual_tol(&mut self, tol: f64) {
        self.rel_residual_tol = tol;
    }

    pub fn abs_residual_tol(&self) -> f64 {
        self.abs_residual_tol
    }

    pub fn rel_residual_tol(&self) -> f64 {
        self.rel_residual_tol
    }

    pub fn set_logger_id(&mut self, id: impl Into<String>) {
        self.logger_id = id.into();
    }

    pub fn logger_id(&self) -> &str {
        &self.logger_id
    }

    pub fn set_quadrature(&mut self, quadrature: Arc<Quadrature>) {
        self.quadrature = Some(quadrature);
    }

    pub fn quadrature(&self) -> Result<&Arc<Quadrature>> {
        self.quadrature.as_ref().ok_or(PfasstError::NotSetUp("quadrature"))
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }

    pub fn status(&self) -> Result<&Status> {
        self.status.as_ref().ok_or(PfasstError::NotSetUp("status"))
    }

    pub fn status_mut(&mut self) -> Result<&mut Status> {
        self.status.as_mut().ok_or(PfasstError::NotSetUp("status"))
    }

    pub fn factory(&self) -> &EncapFactory<E> {
        &self.factory
    }

    // ===== Lifecycle =====

    /// Allocate node vectors. Status and quadrature must be attached first.
    pub fn setup(&mut self) -> Result<()> {
        if self.status.is_none() {
            return Err(PfasstError::SetupIncomplete { what: "status" });
        }
        let num_nodes = match &self.quadrature {
            Some(q) => q.num_nodes(),
            None => return Err(PfasstError::SetupIncomplete { what: "quadrature" }),
        };
        if self.factory.size() == 0 {
            return Err(PfasstError::InvalidArgument("zero degrees of freedom".into()));
        }

        let len = num_nodes + 1;
        self.states = self.factory.create_many(len);
        self.previous_states = self.factory.create_many(len);
        self.tau = self.factory.create_many(len);
        self.residuals = self.factory.create_many(len);
        self.end_state = Some(self.factory.create());
        if let Some(status) = self.status.as_mut() {
            status.resize_residuals(len);
        }

        if let Some(q) = &self.quadrature {
            info!(
                target: "sweeper",
                level = %self.logger_id,
                nodes = num_nodes,
                dofs = self.factory.size(),
                "setup with {} quadrature",
                q.kind()
            );
        }
        Ok(())
    }

    pub fn is_set_up(&self) -> bool {
        !self.states.is_empty()
    }

    pub(crate) fn ensure_set_up(&self, what: &'static str) -> Result<()> {
        if self.is_set_up() {
            Ok(())
        } else {
            Err(PfasstError::NotSetUp(what))
        }
    }

    /// Number of quadrature nodes (node vectors hold one more entry).
    pub fn num_nodes(&self) -> Result<usize> {
        Ok(self.quadrature()?.num_nodes())
    }

    pub fn states(&self) -> &[E] {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut [E] {
        &mut self.states
    }

    pub fn previous_states(&self) -> &[E] {
        &self.previous_states
    }

    pub fn tau(&self) -> &[E] {
        &self.tau
    }

    pub fn tau_mut(&mut self) -> &mut [E] {
        &mut self.tau
    }

    pub fn residuals(&self) -> &[E] {
        &self.residuals
    }

    pub fn initial_state(&self) -> Result<&E> {
        self.states.first().ok_or(PfasstError::NotSetUp("initial state"))
    }

    pub fn initial_state_mut(&mut self) -> Result<&mut E> {
        self.states.first_mut().ok_or(PfasstError::NotSetUp("initial state"))
    }

    pub fn end_state(&self) -> Result<&E> {
        self.end_state.as_ref().ok_or(PfasstError::NotSetUp("end state"))
    }

    /// Copy the initial value into every node.
    pub fn spread(&mut self) -> Result<()> {
        self.ensure_set_up("states")?;
        let (initial, rest) = self.states.split_at_mut(1);
        for state in rest {
            state.copy_from(&initial[0])?;
        }
        Ok(())
    }

    /// Snapshot the node values before a sweep.
    pub fn save(&mut self) -> Result<()> {
        self.ensure_set_up("states")?;
        for (prev, state) in self.previous_states.iter_mut().zip(&self.states) {
            prev.copy_from(state)?;
        }
        Ok(())
    }

    /// Read the end-of-step value off the last node.
    pub fn integrate_end_state(&mut self) -> Result<()> {
        if !self.quadrature()?.right_is_node() {
            return Err(PfasstError::UnsupportedQuadrature(format!(
                "{} nodes exclude the right end point; end state cannot be read off the last node",
                self.quadrature()?.kind()
            )));
        }
        self.ensure_set_up("states")?;
        let last = self.states.len() - 1;
        match self.end_state.as_mut() {
            Some(end) => end.copy_from(&self.states[last]),
            None => Err(PfasstError::NotSetUp("end state")),
        }
    }

    /// Zero every FAS correction.
    pub fn reset_tau(&mut self) {
        self.tau.iter_mut().for_each(|t| t.zero());
    }

    // ===== Convergence =====

    /// Decide convergence from the residuals already stored in `residuals`.
    ///
    /// The last node is always evaluated. With `pre_check` only the last node
    /// counts; otherwise the remaining nodes are evaluated too and the maxima
    /// over all nodes are stored into the status. The absolute tolerance is
    /// tested first; either one being met is sufficient.
    pub fn check_convergence(&mut self, pre_check: bool) -> Result<bool> {
        self.ensure_set_up("residuals")?;
        let abs_tol = self.abs_residual_tol;
        let rel_tol = self.rel_residual_tol;
        let last = self.residuals.len() - 1;

        let norms = |residual: &E, state: &E| {
            let abs = residual.norm0();
            let state_norm = state.norm0();
            let rel = if state_norm > 0.0 { abs / state_norm } else { abs };
            (abs, rel)
        };

        let status = self.status.as_mut().ok_or(PfasstError::NotSetUp("status"))?;

        let (abs_last, rel_last) = norms(&self.residuals[last], &self.states[last]);
        status.abs_res_norms[last] = abs_last;
        status.rel_res_norms[last] = rel_last;

        let (abs_norm, rel_norm) = if pre_check {
            (abs_last, rel_last)
        } else {
            for m in 0..last {
                let (abs, rel) = norms(&self.residuals[m], &self.states[m]);
                status.abs_res_norms[m] = abs;
                status.rel_res_norms[m] = rel;
            }
            let abs_max = status.abs_res_norms.iter().fold(0.0_f64, |a, &b| a.max(b));
            let rel_max = status.rel_res_norms.iter().fold(0.0_f64, |a, &b| a.max(b));
            status.abs_res_norm = abs_max;
            status.rel_res_norm = rel_max;
            (abs_max, rel_max)
        };

        if abs_tol <= 0.0 && rel_tol <= 0.0 {
            if !self.warned_no_tolerance {
                warn!(
                    target: "sweeper",
                    level = %self.logger_id,
                    "No residual tolerances set. Thus skipping convergence check."
                );
                self.warned_no_tolerance = true;
            }
            status.state = ConvergenceState::NotConverged;
            return Ok(false);
        }

        let converged = (abs_tol > 0.0 && abs_norm < abs_tol) || (rel_tol > 0.0 && rel_norm < rel_tol);
        status.state = if converged {
            ConvergenceState::Converged
        } else {
            ConvergenceState::NotConverged
        };

        debug!(
            target: "sweeper",
            level = %self.logger_id,
            iteration = status.iteration,
            abs_res = abs_norm,
            rel_res = rel_norm,
            pre_check,
            converged,
            "convergence check"
        );
        Ok(converged)
    }
}
