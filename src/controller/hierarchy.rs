//! Level hierarchy, coarsest level first.

use tracing::{debug, info};

use crate::error::{PfasstError, Result};
use crate::logging::DEFAULT_LOGGER_ID;
use crate::status::Status;
use crate::sweeper::Sweeper;
use crate::transfer::Transfer;

/// Position in a hierarchy of `num_levels` levels (0 is the coarsest).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LevelCursor {
    level: usize,
    num_levels: usize,
}

impl LevelCursor {
    pub fn new(level: usize, num_levels: usize) -> Result<Self> {
        if level >= num_levels {
            return Err(PfasstError::index_out_of_range(level as isize, num_levels));
        }
        Ok(Self { level, num_levels })
    }

    /// Level index.
    pub fn current(&self) -> usize {
        self.level
    }

    /// The next finer level.
    pub fn fine(&self) -> Result<LevelCursor> {
        Self::new(self.level + 1, self.num_levels)
    }

    /// The next coarser level.
    pub fn coarse(&self) -> Result<LevelCursor> {
        if self.level == 0 {
            return Err(PfasstError::index_out_of_range(-1, self.num_levels));
        }
        Self::new(self.level - 1, self.num_levels)
    }

    pub fn is_finest(&self) -> bool {
        self.level + 1 == self.num_levels
    }

    pub fn is_coarsest(&self) -> bool {
        self.level == 0
    }

    /// Step one level finer.
    pub fn increment(&mut self) -> Result<()> {
        *self = self.fine()?;
        Ok(())
    }

    /// Step one level coarser.
    pub fn decrement(&mut self) -> Result<()> {
        *self = self.coarse()?;
        Ok(())
    }
}

/// Ordered stack of sweepers with one transfer per adjacent pair.
///
/// The transfer stored with level `l > 0` links it to level `l - 1`. After
/// [`setup`](Self::setup) the number of levels is the number of transfers plus
/// one.
pub struct Controller<S, T> {
    levels: Vec<S>,
    transfers: Vec<Option<T>>,
    t0: f64,
    dt: f64,
    num_steps: usize,
    num_iters: usize,
    ready: bool,
}

impl<S, T> Default for Controller<S, T> {
    fn default() -> Self {
        Self {
            levels: Vec::new(),
            transfers: Vec::new(),
            t0: 0.0,
            dt: 0.01,
            num_steps: 1,
            num_iters: 5,
            ready: false,
        }
    }
}

impl<S: Sweeper, T: Transfer<S>> Controller<S, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step size, number of steps and iteration budget per step.
    pub fn set_duration(&mut self, dt: f64, num_steps: usize, num_iters: usize) {
        self.dt = dt;
        self.num_steps = num_steps;
        self.num_iters = num_iters;
    }

    pub fn set_start_time(&mut self, t0: f64) {
        self.t0 = t0;
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn num_iters(&self) -> usize {
        self.num_iters
    }

    pub fn t_end(&self) -> f64 {
        self.t0 + self.dt * self.num_steps as f64
    }

    /// Add a level at the coarse end (`is_coarse`) or at the fine end.
    ///
    /// `transfer` links the new level to its coarser neighbour; it is required
    /// for every level except the eventual coarsest one.
    pub fn add_level(&mut self, sweeper: S, transfer: Option<T>, is_coarse: bool) {
        self.ready = false;
        if is_coarse {
            self.levels.insert(0, sweeper);
            self.transfers.insert(0, transfer);
        } else {
            self.levels.push(sweeper);
            self.transfers.push(transfer);
        }
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Transfers linking adjacent levels.
    pub fn num_transfers(&self) -> usize {
        self.transfers.iter().skip(1).filter(|t| t.is_some()).count()
    }

    /// Attach a status to every level and set them up, coarsest first.
    pub fn setup(&mut self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(PfasstError::InvalidArgument("controller has no levels".into()));
        }
        if self.dt <= 0.0 || self.num_steps == 0 {
            return Err(PfasstError::InvalidArgument(format!(
                "invalid duration: dt = {}, {} steps",
                self.dt, self.num_steps
            )));
        }
        if let Some(first) = self.transfers.first_mut() {
            if first.take().is_some() {
                debug!(target: "controller", "dropping transfer of the coarsest level");
            }
        }
        if let Some(level) = (1..self.levels.len()).find(|&l| self.transfers[l].is_none()) {
            return Err(PfasstError::InvalidArgument(format!(
                "level {} has no transfer to its coarser neighbour",
                level
            )));
        }

        let num_levels = self.levels.len();
        for (l, sweeper) in self.levels.iter_mut().enumerate() {
            let core = sweeper.core_mut();
            if core.logger_id() == DEFAULT_LOGGER_ID && num_levels > 1 {
                core.set_logger_id(match l {
                    0 => "COARSE".to_string(),
                    l if l + 1 == num_levels => "FINE".to_string(),
                    l => format!("LEVEL{}", l),
                });
            }
            core.set_status(Status::new(self.t0, self.dt, self.num_steps, self.num_iters));
            sweeper.setup()?;
        }

        info!(
            target: "controller",
            levels = num_levels,
            dt = self.dt,
            steps = self.num_steps,
            iters = self.num_iters,
            "hierarchy set up"
        );
        self.ready = true;
        Ok(())
    }

    pub(crate) fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(PfasstError::NotSetUp("controller"))
        }
    }

    pub fn finest(&self) -> Result<LevelCursor> {
        let n = self.num_levels();
        LevelCursor::new(n.wrapping_sub(1), n)
    }

    pub fn coarsest(&self) -> Result<LevelCursor> {
        LevelCursor::new(0, self.num_levels())
    }

    /// Cursors are only valid for a hierarchy of the size they were built for.
    fn check_cursor(&self, cursor: LevelCursor) -> Result<usize> {
        let n = self.num_levels();
        if cursor.num_levels != n || cursor.current() >= n {
            return Err(PfasstError::index_out_of_range(cursor.current() as isize, n));
        }
        Ok(cursor.current())
    }

    pub fn level(&self, cursor: LevelCursor) -> Result<&S> {
        let level = self.check_cursor(cursor)?;
        Ok(&self.levels[level])
    }

    pub fn level_mut(&mut self, cursor: LevelCursor) -> Result<&mut S> {
        let level = self.check_cursor(cursor)?;
        Ok(&mut self.levels[level])
    }

    /// Level by index, coarsest first.
    pub fn get_level(&self, level: usize) -> Result<&S> {
        let n = self.num_levels();
        self.levels
            .get(level)
            .ok_or(PfasstError::index_out_of_range(level as isize, n))
    }

    pub fn get_level_mut(&mut self, level: usize) -> Result<&mut S> {
        let n = self.num_levels();
        self.levels
            .get_mut(level)
            .ok_or(PfasstError::index_out_of_range(level as isize, n))
    }

    /// Finest level.
    pub fn finest_level(&self) -> Result<&S> {
        self.get_level(self.num_levels().wrapping_sub(1))
    }

    pub fn finest_level_mut(&mut self) -> Result<&mut S> {
        self.get_level_mut(self.num_levels().wrapping_sub(1))
    }

    /// Transfer between `cursor` and its coarser neighbour.
    pub fn transfer_mut(&mut self, cursor: LevelCursor) -> Result<&mut T> {
        let level = self.check_cursor(cursor)?;
        cursor.coarse()?;
        self.transfers[level]
            .as_mut()
            .ok_or(PfasstError::NotSetUp("transfer"))
    }

    /// (coarse, fine, transfer) for the pair whose finer level is `fine_level`.
    pub(crate) fn pair_mut(&mut self, fine_level: usize) -> Result<(&mut S, &mut S, &mut T)> {
        let n = self.levels.len();
        if fine_level == 0 || fine_level >= n {
            return Err(PfasstError::index_out_of_range(fine_level as isize - 1, n));
        }
        let (lower, upper) = self.levels.split_at_mut(fine_level);
        let coarse = &mut lower[fine_level - 1];
        let fine = &mut upper[0];
        let transfer = self.transfers[fine_level]
            .as_mut()
            .ok_or(PfasstError::NotSetUp("transfer"))?;
        Ok((coarse, fine, transfer))
    }

    pub(crate) fn levels_mut(&mut self) -> &mut [S] {
        &mut self.levels
    }

    /// Apply `f` to the status of every level.
    pub(crate) fn for_each_status(&mut self, mut f: impl FnMut(&mut Status)) -> Result<()> {
        for sweeper in &mut self.levels {
            f(sweeper.core_mut().status_mut()?);
        }
        Ok(())
    }

    // ===== Cycle building blocks =====

    /// save → pre_sweep → sweep → post_sweep on one level.
    pub(crate) fn sweep_level(&mut self, level: usize) -> Result<()> {
        let sweeper = self.get_level_mut(level)?;
        sweeper.save()?;
        sweeper.pre_sweep()?;
        sweeper.sweep()?;
        sweeper.post_sweep()
    }

    /// Restrict level `fine_level` onto its coarser neighbour and set up the
    /// coarse FAS correction.
    pub(crate) fn restrict_level(&mut self, fine_level: usize) -> Result<()> {
        let dt = self.dt;
        let (coarse, fine, transfer) = self.pair_mut(fine_level)?;
        transfer.restrict(fine, coarse, true)?;
        transfer.fas(dt, fine, coarse)?;
        coarse.save()
    }

    /// Interpolate the coarse correction onto level `fine_level`.
    pub(crate) fn interpolate_level(&mut self, fine_level: usize, initial: bool) -> Result<()> {
        let (coarse, fine, transfer) = self.pair_mut(fine_level)?;
        transfer.interpolate(coarse, fine, initial)?;
        fine.core_mut().integrate_end_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_navigation() {
        let mut cursor = LevelCursor::new(0, 3).unwrap();
        assert!(cursor.is_coarsest());
        cursor.increment().unwrap();
        assert_eq!(cursor.current(), 1);
        assert_eq!(cursor.fine().unwrap().current(), 2);
        assert_eq!(cursor.coarse().unwrap().current(), 0);
        cursor.increment().unwrap();
        assert!(cursor.is_finest());
        assert!(cursor.increment().is_err());
        assert_eq!(cursor.current(), 2);
    }

    #[test]
    fn test_cursor_bounds_are_errors() {
        let finest = LevelCursor::new(2, 3).unwrap();
        let coarsest = LevelCursor::new(0, 3).unwrap();
        assert!(matches!(
            finest.fine(),
            Err(PfasstError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            coarsest.coarse(),
            Err(PfasstError::IndexOutOfRange { index: -1, len: 3 })
        ));
        assert!(LevelCursor::new(3, 3).is_err());
    }

    #[test]
    fn test_cursor_ordering() {
        let a = LevelCursor::new(0, 2).unwrap();
        let b = LevelCursor::new(1, 2).unwrap();
        assert!(a < b);
        assert_eq!(b.coarse().unwrap(), a);
    }
}
