//! PFASST: the MLSDC hierarchy pipelined over consecutive time steps.
//!
//! Steps are processed in blocks of `size` steps, rank `r` owning step
//! `block * size + r`. Per block:
//! 1. predictor: `r + 1` coarse sweeps, each seeded with the coarse end value
//!    of rank `r - 1`, then interpolation up the hierarchy
//! 2. iterations: a V-cycle per iteration where the finer levels exchange
//!    initial values non-blocking and the coarsest level blocks, followed by a
//!    status exchange
//! 3. the last rank broadcasts its fine end value as the next block's initial value
//!
//! A rank stops iterating once its own residual check passes and its
//! predecessor has reported convergence; from then on its successor no longer
//! waits for messages from it.

use std::time::Instant;

use tracing::{debug, info, trace};

use super::RunSummary;
use super::hierarchy::Controller;
use crate::comm::{Communicator, Tag};
use crate::encap::Encapsulation;
use crate::error::{PfasstError, Result};
use crate::status::{ConvergenceState, Status};
use crate::sweeper::Sweeper;
use crate::transfer::Transfer;

#[derive(Clone, Copy, Debug)]
enum MessageKind {
    Predict = 0,
    State = 1,
    Status = 2,
}

/// Time-parallel driver around a [`Controller`] and a [`Communicator`].
pub struct Pfasst<S, T, C> {
    controller: Controller<S, T>,
    comm: C,
}

impl<S: Sweeper, T: Transfer<S>, C: Communicator> Pfasst<S, T, C> {
    pub fn new(controller: Controller<S, T>, comm: C) -> Self {
        Self { controller, comm }
    }

    pub fn controller(&self) -> &Controller<S, T> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller<S, T> {
        &mut self.controller
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn into_parts(self) -> (Controller<S, T>, C) {
        (self.controller, self.comm)
    }

    /// Set up the hierarchy; the step count must fill whole blocks.
    pub fn setup(&mut self) -> Result<()> {
        let size = self.comm.size();
        let num_steps = self.controller.num_steps();
        if size == 0 || num_steps % size != 0 {
            return Err(PfasstError::InvalidArgument(format!(
                "{} steps cannot be distributed in blocks over {} ranks",
                num_steps, size
            )));
        }
        self.controller.setup()
    }

    fn tag(&self, block: usize, iteration: usize, level: usize, kind: MessageKind) -> Tag {
        let iters = self.controller.num_iters() as Tag + 1;
        let levels = self.controller.num_levels() as Tag;
        ((block as Tag * iters + iteration as Tag) * levels + level as Tag) * 3 + kind as Tag
    }

    /// Run all blocks; the summary covers the steps owned by this rank.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.controller.ensure_ready()?;
        let start_wall = Instant::now();
        let size = self.comm.size();
        let rank = self.comm.rank();
        let num_blocks = self.controller.num_steps() / size;
        let t0 = self.controller.t0();
        let dt = self.controller.dt();
        let mut summary = RunSummary::new(t0 + rank as f64 * dt);

        for block in 0..num_blocks {
            let step = block * size + rank;
            let time = t0 + step as f64 * dt;
            self.controller.for_each_status(|s| {
                s.step = step;
                s.time = time;
                s.reset_for_step();
            })?;
            for sweeper in self.controller.levels_mut() {
                sweeper.core_mut().reset_tau();
            }

            self.predict(block)?;
            self.iterate(block)?;

            for sweeper in self.controller.levels_mut() {
                sweeper.post_step()?;
            }
            let status = self.controller.finest_level()?.core().status()?;
            debug!(target: "pfasst", rank, "{}", status);
            summary.record_step(status);

            self.broadcast()?;
            self.comm.cleanup()?;
        }

        summary.wall_time = start_wall.elapsed().as_secs_f64();
        info!(
            target: "pfasst",
            rank,
            blocks = num_blocks,
            iterations = summary.total_iterations(),
            wall_time = summary.wall_time,
            "PFASST run finished"
        );
        Ok(summary)
    }

    /// Coarse burn-in followed by interpolation up the hierarchy.
    fn predict(&mut self, block: usize) -> Result<()> {
        let rank = self.comm.rank();
        let last = self.comm.is_last();
        let finest = self.controller.num_levels() - 1;
        let tag = self.tag(block, 0, 0, MessageKind::Predict);

        self.controller.finest_level_mut()?.spread()?;
        for level in (1..=finest).rev() {
            let (coarse, fine, transfer) = self.controller.pair_mut(level)?;
            transfer.restrict(fine, coarse, true)?;
        }

        for burn_in in 0..=rank {
            if burn_in == 0 {
                let coarse = self.controller.get_level_mut(0)?;
                coarse.pre_predict()?;
                coarse.predict()?;
                coarse.post_predict()?;
            } else {
                let data = self.comm.recv(rank - 1, tag)?;
                load_initial(self.controller.get_level_mut(0)?, &data)?;
                self.controller.sweep_level(0)?;
            }
            if !last {
                let end = end_values(self.controller.get_level(0)?)?;
                self.comm.send(&end, rank + 1, tag)?;
            }
        }
        trace!(target: "pfasst", rank, sweeps = rank + 1, "coarse prediction done");

        for level in 1..=finest {
            self.controller.interpolate_level(level, true)?;
        }
        Ok(())
    }

    fn iterate(&mut self, block: usize) -> Result<()> {
        let rank = self.comm.rank();
        let last = self.comm.is_last();
        let finest = self.controller.num_levels() - 1;
        let mut prev_done = self.comm.is_first();

        for iteration in 1..=self.controller.num_iters() {
            self.controller.for_each_status(|s| s.iteration = iteration)?;
            let receive = !prev_done;

            if receive {
                for level in 1..=finest {
                    let tag = self.tag(block, iteration, level, MessageKind::State);
                    self.comm.irecv(rank - 1, tag)?;
                }
            }

            for level in (1..=finest).rev() {
                self.controller.sweep_level(level)?;
                if !last {
                    let tag = self.tag(block, iteration, level, MessageKind::State);
                    let end = end_values(self.controller.get_level(level)?)?;
                    self.comm.isend(&end, rank + 1, tag)?;
                }
                self.controller.restrict_level(level)?;
            }

            let tag = self.tag(block, iteration, 0, MessageKind::State);
            if receive {
                let data = self.comm.recv(rank - 1, tag)?;
                load_initial(self.controller.get_level_mut(0)?, &data)?;
            }
            self.controller.sweep_level(0)?;
            if !last {
                let end = end_values(self.controller.get_level(0)?)?;
                self.comm.send(&end, rank + 1, tag)?;
            }

            for level in 1..=finest {
                self.controller.interpolate_level(level, true)?;
                if receive {
                    let tag = self.tag(block, iteration, level, MessageKind::State);
                    let data = self.comm.wait_recv(rank - 1, tag)?;
                    load_initial(self.controller.get_level_mut(level)?, &data)?;
                }
                if level < finest {
                    self.controller.sweep_level(level)?;
                }
            }

            let local = self.controller.finest_level_mut()?.converged(false)?;
            let tag = self.tag(block, iteration, 0, MessageKind::Status);
            if receive {
                let wire = self.comm.recv(rank - 1, tag)?;
                let mut prev = Status::default();
                prev.update_from_wire(&wire)?;
                prev_done = prev.is_converged();
            }

            let done = local && prev_done;
            let status = self.controller.finest_level_mut()?.core_mut().status_mut()?;
            status.state = if done {
                ConvergenceState::Converged
            } else {
                ConvergenceState::NotConverged
            };
            trace!(target: "pfasst", rank, iteration, local, prev_done, "iteration done");
            if !last {
                let wire = status.to_wire();
                self.comm.send(&wire, rank + 1, tag)?;
            }
            if done {
                break;
            }
        }
        Ok(())
    }

    /// Distribute the last rank's fine end value as every rank's next initial value.
    fn broadcast(&mut self) -> Result<()> {
        let root = self.comm.size() - 1;
        let fine = self.controller.finest_level_mut()?;
        let mut buf = end_values(fine)?;
        self.comm.bcast(&mut buf, root)?;
        fine.core_mut().initial_state_mut()?.data_mut().copy_from_slice(&buf);
        Ok(())
    }
}

fn end_values<S: Sweeper>(sweeper: &S) -> Result<Vec<f64>> {
    Ok(sweeper.core().end_state()?.data().to_vec())
}

/// Replace the initial value of `sweeper` with a received buffer.
fn load_initial<S: Sweeper>(sweeper: &mut S, data: &[f64]) -> Result<()> {
    let initial = sweeper.core_mut().initial_state_mut()?;
    if initial.num_dofs() != data.len() {
        return Err(PfasstError::incompatible_shape(
            format!("{} values", initial.num_dofs()),
            format!("{} values", data.len()),
        ));
    }
    initial.data_mut().copy_from_slice(data);
    sweeper.reevaluate(true)?;
    sweeper.core_mut().integrate_end_state()
}
