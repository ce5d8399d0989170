//! Level and data transfer contracts.

use crate::encap::Encapsulation;
use crate::error::{PfasstError, Result};
use crate::sweeper::Sweeper;

/// Moves iterates and FAS corrections between a coarse and a fine level.
///
/// Every operation fails with [`PfasstError::NotImplemented`] until a
/// specialisation overrides it.
pub trait Transfer<S: Sweeper> {
    /// Correct the fine initial value with the coarse one.
    fn interpolate_initial(&mut self, _coarse: &S, _fine: &mut S) -> Result<()> {
        Err(PfasstError::NotImplemented(
            "interpolation of initial values for generic sweeper",
        ))
    }

    /// Correct all fine node values with the coarse correction.
    fn interpolate(&mut self, _coarse: &S, _fine: &mut S, _initial: bool) -> Result<()> {
        Err(PfasstError::NotImplemented("interpolation for generic sweeper"))
    }

    /// Overwrite the coarse initial value with the restricted fine one.
    fn restrict_initial(&mut self, _fine: &S, _coarse: &mut S) -> Result<()> {
        Err(PfasstError::NotImplemented(
            "restriction of initial value for generic sweeper",
        ))
    }

    /// Overwrite coarse node values with restricted fine ones.
    fn restrict(&mut self, _fine: &S, _coarse: &mut S, _initial: bool) -> Result<()> {
        Err(PfasstError::NotImplemented("restriction for generic sweeper"))
    }

    /// Store the FAS correction for step size `dt` into the coarse `tau`.
    fn fas(&mut self, _dt: f64, _fine: &S, _coarse: &mut S) -> Result<()> {
        Err(PfasstError::NotImplemented("FAS correction for generic sweeper"))
    }
}

/// Spatial interpolation and restriction of single containers.
pub trait DataTransfer<E: Encapsulation> {
    fn interpolate_data(&mut self, _coarse: &E, _fine: &mut E) -> Result<()> {
        Err(PfasstError::NotImplemented(
            "interpolation for generic encapsulation",
        ))
    }

    fn restrict_data(&mut self, _fine: &E, _coarse: &mut E) -> Result<()> {
        Err(PfasstError::NotImplemented(
            "restriction for generic encapsulation",
        ))
    }
}
