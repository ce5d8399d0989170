//! Single-level SDC on the finest level.

use std::time::Instant;

use tracing::{debug, info};

use super::RunSummary;
use super::hierarchy::Controller;
use crate::error::Result;
use crate::sweeper::Sweeper;
use crate::transfer::Transfer;

impl<S: Sweeper, T: Transfer<S>> Controller<S, T> {
    /// Integrate all steps with SDC sweeps on the finest level only.
    ///
    /// Each step predicts, then sweeps until the residual check passes or the
    /// iteration budget is spent. The initial value is read from the finest
    /// level's initial slot, which must be filled after [`setup`](Self::setup).
    pub fn run_sdc(&mut self) -> Result<RunSummary> {
        self.ensure_ready()?;
        let start_wall = Instant::now();
        let num_steps = self.num_steps();
        let mut summary = RunSummary::new(self.t0());

        let fine = self.finest_level_mut()?;
        for step in 0..num_steps {
            fine.core_mut().status_mut()?.reset_for_step();

            fine.spread()?;
            fine.pre_predict()?;
            fine.predict()?;
            fine.post_predict()?;

            loop {
                let status = fine.core_mut().status_mut()?;
                if !status.has_iterations_left() {
                    break;
                }
                status.iteration += 1;

                fine.save()?;
                fine.pre_sweep()?;
                fine.sweep()?;
                fine.post_sweep()?;
                if fine.converged(false)? {
                    break;
                }
            }

            fine.post_step()?;
            let status = fine.core().status()?;
            debug!(target: "controller", "SDC {}", status);
            summary.record_step(status);

            if step + 1 < num_steps {
                fine.advance(1)?;
                fine.core_mut().status_mut()?.advance(1);
            }
        }

        summary.wall_time = start_wall.elapsed().as_secs_f64();
        info!(
            target: "controller",
            steps = summary.n_steps,
            iterations = summary.total_iterations(),
            wall_time = summary.wall_time,
            "SDC run finished"
        );
        Ok(summary)
    }
}
