//! FFT helpers for periodic cube grids.
//!
//! - [`FftWorkspace`]: cached rustfft plans and N-D transforms over axis lines
//! - [`wave_number`]: signed frequency of an FFT output index

mod fft;

pub use fft::{FftWorkspace, wave_number};

pub use rustfft::num_complex::Complex;
