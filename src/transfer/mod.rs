//! Inter-level transfer of iterates and FAS corrections.
//!
//! - [`Transfer`]: the five level operations (interpolate/restrict with and
//!   without the initial value, FAS)
//! - [`DataTransfer`]: spatial interpolation/restriction of single containers
//! - [`PolynomialTransfer`]: level operations on top of any [`DataTransfer`]
//! - [`SpectralTransfer`]: FFT zero-padding interpolation on cube grids

mod polynomial;
mod spectral;
mod traits;

pub use polynomial::PolynomialTransfer;
pub use spectral::{Spectral1DTransfer, Spectral2DTransfer, Spectral3DTransfer, SpectralTransfer};
pub use traits::{DataTransfer, Transfer};
