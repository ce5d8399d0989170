//! Multi-level SDC: one V-cycle per iteration.

use std::time::Instant;

use tracing::{debug, info, trace};

use super::RunSummary;
use super::hierarchy::Controller;
use crate::error::Result;
use crate::sweeper::Sweeper;
use crate::transfer::Transfer;

impl<S: Sweeper, T: Transfer<S>> Controller<S, T> {
    /// Integrate all steps with MLSDC.
    ///
    /// Per iteration: sweep the finest level, then walk down restricting and
    /// sweeping each coarser level with its FAS correction, then walk back up
    /// interpolating the coarse corrections and sweeping the intermediate
    /// levels. Convergence is judged on the finest level after the cycle.
    pub fn run_mlsdc(&mut self) -> Result<RunSummary> {
        self.ensure_ready()?;
        let start_wall = Instant::now();
        let num_steps = self.num_steps();
        let finest = self.num_levels() - 1;
        let mut summary = RunSummary::new(self.t0());

        for step in 0..num_steps {
            self.for_each_status(|s| s.reset_for_step())?;
            self.predict_mlsdc()?;

            loop {
                if !self.finest_level()?.core().status()?.has_iterations_left() {
                    break;
                }
                self.for_each_status(|s| s.iteration += 1)?;
                self.cycle_v()?;
                if self.finest_level_mut()?.converged(false)? {
                    break;
                }
            }

            for sweeper in self.levels_mut() {
                sweeper.post_step()?;
            }
            let status = self.finest_level()?.core().status()?;
            debug!(target: "controller", "MLSDC {}", status);
            summary.record_step(status);

            if step + 1 < num_steps {
                self.finest_level_mut()?.advance(1)?;
                for sweeper in &mut self.levels_mut()[..finest] {
                    sweeper.core_mut().reset_tau();
                }
                self.for_each_status(|s| s.advance(1))?;
            }
        }

        summary.wall_time = start_wall.elapsed().as_secs_f64();
        info!(
            target: "controller",
            levels = self.num_levels(),
            steps = summary.n_steps,
            iterations = summary.total_iterations(),
            wall_time = summary.wall_time,
            "MLSDC run finished"
        );
        Ok(summary)
    }

    /// Predict on the finest level and restrict the prediction downwards.
    fn predict_mlsdc(&mut self) -> Result<()> {
        let fine = self.finest_level_mut()?;
        fine.spread()?;
        fine.pre_predict()?;
        fine.predict()?;
        fine.post_predict()?;

        for level in (1..self.num_levels()).rev() {
            let (coarse, fine, transfer) = self.pair_mut(level)?;
            transfer.restrict(fine, coarse, true)?;
            coarse.core_mut().integrate_end_state()?;
        }
        Ok(())
    }

    /// One V-cycle from the finest level down to the coarsest and back.
    pub(crate) fn cycle_v(&mut self) -> Result<()> {
        let finest = self.num_levels() - 1;
        self.sweep_level(finest)?;

        for level in (1..=finest).rev() {
            trace!(target: "controller", level, "cycle down");
            self.restrict_level(level)?;
            self.sweep_level(level - 1)?;
        }

        for level in 1..=finest {
            trace!(target: "controller", level, "cycle up");
            self.interpolate_level(level, true)?;
            if level < finest {
                self.sweep_level(level)?;
            }
        }
        Ok(())
    }
}
