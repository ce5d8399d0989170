//! Error types shared by all subsystems.
//!
//! The variants follow the three fatal categories of the iteration machinery:
//! - precondition violations (setup order, cursor range, operand shapes)
//! - unsupported configurations (cube shapes, coarsening factors, quadrature families)
//! - missing specialisations (`NotImplemented`)
//!
//! Transport and configuration failures come from their own modules and are
//! wrapped via `#[from]`. Reaching the iteration budget without convergence is
//! *not* an error; it is reported through [`crate::Status`].

use thiserror::Error;

use crate::comm::CommError;
use crate::config::ConfigError;

/// Errors raised by sweepers, transfers, controllers and their collaborators.
#[derive(Error, Debug)]
pub enum PfasstError {
    /// A required collaborator was not attached before `setup()`.
    #[error("Setup incomplete: {what} not yet set")]
    SetupIncomplete { what: &'static str },

    /// Data was queried before the level was set up.
    #[error("Not set up: {0}")]
    NotSetUp(&'static str),

    /// Level or node index outside the valid range.
    #[error("Index out of range: {index} not in 0..{len}")]
    IndexOutOfRange { index: isize, len: usize },

    /// Two containers with different shapes were combined.
    #[error("Incompatible shape: expected {expected}, got {actual}")]
    IncompatibleShape { expected: String, actual: String },

    /// Generic invalid argument (zero sizes, missing transfers, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Degrees of freedom do not form a cube of the container's dimension.
    #[error("{which} space is not a cube: {dofs} is not a {dim}-th power")]
    NonCubeShape {
        which: &'static str,
        dofs: usize,
        dim: usize,
    },

    /// Spectral transfer only supports a coarsening factor of exactly 2.
    #[error("Unsupported coarsening factor: coarse side {coarse}, fine side {fine} (only factor 2 supported)")]
    UnsupportedCoarsening { coarse: usize, fine: usize },

    /// Spectral interpolation needs an even coarse side to split its frequencies.
    #[error("Unsupported coarse side {side}: spectral transfer needs an even side")]
    OddCoarseSide { side: usize },

    /// Quadrature cannot provide what was requested.
    #[error("Unsupported quadrature: {0}")]
    UnsupportedQuadrature(String),

    /// Operation requires a specialisation which was not supplied.
    #[error("Not implemented yet: {0}")]
    NotImplemented(&'static str),

    /// Communication layer failure.
    #[error(transparent)]
    Comm(#[from] CommError),

    /// Configuration loading failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PfasstError {
    /// Create an incompatible shape error.
    pub fn incompatible_shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::IncompatibleShape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an index error from a (possibly negative) index.
    pub fn index_out_of_range(index: isize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Whether this error marks an incomplete specialisation rather than bad input.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PfasstError>;
