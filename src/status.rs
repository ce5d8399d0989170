//! Per-level iteration status.

use std::fmt;

use crate::error::{PfasstError, Result};

/// Outcome of the most recent convergence check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConvergenceState {
    /// No decision yet for the current step.
    #[default]
    Checking,
    Converged,
    NotConverged,
}

impl ConvergenceState {
    fn to_code(self) -> f64 {
        match self {
            ConvergenceState::Checking => 0.0,
            ConvergenceState::Converged => 1.0,
            ConvergenceState::NotConverged => 2.0,
        }
    }

    fn from_code(code: f64) -> Result<Self> {
        match code as i64 {
            0 => Ok(ConvergenceState::Checking),
            1 => Ok(ConvergenceState::Converged),
            2 => Ok(ConvergenceState::NotConverged),
            other => Err(PfasstError::InvalidArgument(format!(
                "unknown convergence state code {}",
                other
            ))),
        }
    }
}

/// Time-stepping and residual bookkeeping for one level.
///
/// The residual vectors hold one entry per quadrature node (plus the initial
/// slot); `abs_res_norm`/`rel_res_norm` are the maxima stored by the last
/// full convergence check.
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    pub step: usize,
    pub num_steps: usize,
    pub iteration: usize,
    pub max_iterations: usize,
    /// Start time of the current step.
    pub time: f64,
    pub dt: f64,
    pub abs_res_norm: f64,
    pub rel_res_norm: f64,
    pub abs_res_norms: Vec<f64>,
    pub rel_res_norms: Vec<f64>,
    pub state: ConvergenceState,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            step: 0,
            num_steps: 1,
            iteration: 0,
            max_iterations: 1,
            time: 0.0,
            dt: 0.0,
            abs_res_norm: 0.0,
            rel_res_norm: 0.0,
            abs_res_norms: Vec::new(),
            rel_res_norms: Vec::new(),
            state: ConvergenceState::Checking,
        }
    }
}

impl Status {
    pub fn new(t0: f64, dt: f64, num_steps: usize, max_iterations: usize) -> Self {
        Self {
            time: t0,
            dt,
            num_steps,
            max_iterations,
            ..Self::default()
        }
    }

    /// End of the current step.
    pub fn t_end(&self) -> f64 {
        self.time + self.dt
    }

    /// Size the per-node residual vectors.
    pub fn resize_residuals(&mut self, len: usize) {
        self.abs_res_norms = vec![0.0; len];
        self.rel_res_norms = vec![0.0; len];
    }

    /// Prepare for a new step: iteration counter and convergence state reset.
    pub fn reset_for_step(&mut self) {
        self.iteration = 0;
        self.state = ConvergenceState::Checking;
        self.abs_res_norm = 0.0;
        self.rel_res_norm = 0.0;
        self.abs_res_norms.iter_mut().for_each(|v| *v = 0.0);
        self.rel_res_norms.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Move to the start of step `step`, `steps_forward` steps later.
    pub fn advance(&mut self, steps_forward: usize) {
        self.time += self.dt * steps_forward as f64;
        self.step += steps_forward;
        self.reset_for_step();
    }

    pub fn is_converged(&self) -> bool {
        self.state == ConvergenceState::Converged
    }

    /// Whether another iteration fits in the budget.
    pub fn has_iterations_left(&self) -> bool {
        self.iteration < self.max_iterations
    }

    /// Compact representation exchanged between time-parallel workers:
    /// `[state, iteration, abs_res_norm, rel_res_norm]`.
    pub fn to_wire(&self) -> Vec<f64> {
        vec![
            self.state.to_code(),
            self.iteration as f64,
            self.abs_res_norm,
            self.rel_res_norm,
        ]
    }

    /// Apply a message produced by [`to_wire`](Self::to_wire).
    pub fn update_from_wire(&mut self, wire: &[f64]) -> Result<()> {
        if wire.len() != 4 {
            return Err(PfasstError::incompatible_shape(
                "4 status values",
                format!("{} values", wire.len()),
            ));
        }
        self.state = ConvergenceState::from_code(wire[0])?;
        self.iteration = wire[1] as usize;
        self.abs_res_norm = wire[2];
        self.rel_res_norm = wire[3];
        Ok(())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {}/{} iter {}/{} t={:.6} dt={:.3e} abs_res={:.3e} rel_res={:.3e} ({:?})",
            self.step + 1,
            self.num_steps,
            self.iteration,
            self.max_iterations,
            self.time,
            self.dt,
            self.abs_res_norm,
            self.rel_res_norm,
            self.state
        )
    }
}
