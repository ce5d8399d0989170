//! Controllers driving a level hierarchy through time.
//!
//! - [`Controller`] owns the levels and transfers and runs serial SDC
//!   ([`Controller::run_sdc`]) or the MLSDC V-cycle ([`Controller::run_mlsdc`])
//! - [`Pfasst`] pipelines a hierarchy across the ranks of a [`Communicator`](crate::comm::Communicator)

mod hierarchy;
mod mlsdc;
mod pfasst;
mod sdc;

pub use hierarchy::{Controller, LevelCursor};
pub use pfasst::Pfasst;

// =============================================================================
// Run Summary
// =============================================================================

/// Outcome of a controller run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// End time of the last step computed.
    pub final_time: f64,
    /// Number of time steps computed by this controller.
    pub n_steps: usize,
    /// Iterations spent on each step.
    pub iterations: Vec<usize>,
    /// Whether each step met its residual tolerance.
    pub converged: Vec<bool>,
    /// Finest-level absolute residual after the last step.
    pub abs_res_norm: f64,
    /// Finest-level relative residual after the last step.
    pub rel_res_norm: f64,
    /// Total wall-clock time in seconds.
    pub wall_time: f64,
}

impl RunSummary {
    pub(crate) fn new(t0: f64) -> Self {
        Self {
            final_time: t0,
            n_steps: 0,
            iterations: Vec::new(),
            converged: Vec::new(),
            abs_res_norm: 0.0,
            rel_res_norm: 0.0,
            wall_time: 0.0,
        }
    }

    pub(crate) fn record_step(&mut self, status: &crate::status::Status) {
        self.final_time = status.t_end();
        self.n_steps += 1;
        self.iterations.push(status.iteration);
        self.converged.push(status.is_converged());
        self.abs_res_norm = status.abs_res_norm;
        self.rel_res_norm = status.rel_res_norm;
    }

    pub fn total_iterations(&self) -> usize {
        self.iterations.iter().sum()
    }

    pub fn all_converged(&self) -> bool {
        self.converged.iter().all(|&c| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{ConvergenceState, Status};

    #[test]
    fn test_summary_records_steps() {
        let mut summary = RunSummary::new(0.0);
        let mut status = Status::new(0.0, 0.5, 2, 4);
        status.iteration = 3;
        status.state = ConvergenceState::Converged;
        summary.record_step(&status);
        status.advance(1);
        status.iteration = 4;
        status.state = ConvergenceState::NotConverged;
        summary.record_step(&status);

        assert_eq!(summary.n_steps, 2);
        assert_eq!(summary.total_iterations(), 7);
        assert!(!summary.all_converged());
        assert!((summary.final_time - 1.0).abs() < 1e-15);
    }
}
