//! # pfasst-rs
//!
//! Spectral deferred correction time integrators and their multi-level and
//! time-parallel extensions.
//!
//! This crate provides the building blocks:
//! - Quadrature tables (Gauss-Legendre, Gauss-Lobatto, Gauss-Radau, Clenshaw-Curtis, uniform)
//! - State containers on periodic cube grids
//! - IMEX-SDC sweeper for problems with an explicit/implicit right-hand side split
//! - Inter-level transfer: Lagrange interpolation in time, FFT zero-padding in space, FAS correction
//! - Controllers: SDC, MLSDC (V-cycles) and PFASST over an in-process communicator
//! - Model problems (Dahlquist, heat, advection-diffusion)
//!
//! Indexing convention: every per-node vector has one slot per quadrature
//! node plus a leading slot for the initial value, so slot `m + 1` holds node `m`.

pub mod comm;
pub mod config;
pub mod controller;
pub mod encap;
pub mod error;
pub mod logging;
pub mod problems;
pub mod quadrature;
pub mod spectral;
pub mod status;
pub mod sweeper;
pub mod transfer;

// Re-export main types for convenience
pub use comm::{CommError, Communicator, ThreadComm};
pub use config::{ConfigError, ConfigSource, SdcConfig};
pub use controller::{Controller, LevelCursor, Pfasst, RunSummary};
pub use encap::{Cube2D, Cube3D, EncapFactory, Encapsulation, GridVector, Vector1D};
pub use error::{PfasstError, Result};
pub use logging::init_logging;
pub use problems::{AdvecDiff1D, Dahlquist, Heat, Heat1D, Heat3D};
pub use quadrature::{Quadrature, QuadratureType};
pub use status::{ConvergenceState, Status};
pub use sweeper::{ImexProblem, ImexSweeper, Sweeper, SweeperCore};
pub use transfer::{
    DataTransfer, PolynomialTransfer, Spectral1DTransfer, Spectral2DTransfer, Spectral3DTransfer,
    SpectralTransfer, Transfer,
};
