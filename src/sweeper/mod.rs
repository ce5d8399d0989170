//! Sweepers: per-level SDC state and the sweep that improves it.
//!
//! - [`SweeperCore`]: node vectors, status and the convergence check
//! - [`Sweeper`]: lifecycle hooks driven by the controllers
//! - [`ImexProblem`] + [`ImexSweeper`]: IMEX-SDC for a problem-supplied splitting

mod base;
mod imex;
mod problem;
mod traits;

pub use base::SweeperCore;
pub use imex::ImexSweeper;
pub use problem::ImexProblem;
pub use traits::Sweeper;
