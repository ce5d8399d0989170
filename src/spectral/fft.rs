//! N-dimensional FFT on cube grids built from 1D rustfft plans.
//!
//! Data is stored with axis 0 varying fastest, so the line along axis `a`
//! through a base point has stride `side^a`. Transforms are unnormalised in
//! both directions, matching rustfft.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Plan cache plus scratch line buffer.
pub struct FftWorkspace {
    planner: FftPlanner<f64>,
    plans: HashMap<(usize, bool), Arc<dyn Fft<f64>>>,
    line: Vec<Complex<f64>>,
}

impl Default for FftWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FftWorkspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sizes: Vec<_> = self.plans.keys().collect();
        sizes.sort();
        f.debug_struct("FftWorkspace").field("plans", &sizes).finish()
    }
}

impl FftWorkspace {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            plans: HashMap::new(),
            line: Vec::new(),
        }
    }

    fn plan(&mut self, len: usize, inverse: bool) -> Arc<dyn Fft<f64>> {
        let planner = &mut self.planner;
        self.plans
            .entry((len, inverse))
            .or_insert_with(|| {
                if inverse {
                    planner.plan_fft_inverse(len)
                } else {
                    planner.plan_fft_forward(len)
                }
            })
            .clone()
    }

    /// Forward transform of real cube data of side `side` in `dim` dimensions.
    pub fn forward(&mut self, data: &[f64], side: usize, dim: usize) -> Vec<Complex<f64>> {
        let mut spectrum: Vec<Complex<f64>> = data.iter().map(|&v| Complex::new(v, 0.0)).collect();
        self.transform(&mut spectrum, side, dim, false);
        spectrum
    }

    /// In-place unnormalised inverse transform.
    pub fn backward(&mut self, spectrum: &mut [Complex<f64>], side: usize, dim: usize) {
        self.transform(spectrum, side, dim, true);
    }

    fn transform(&mut self, buf: &mut [Complex<f64>], side: usize, dim: usize, inverse: bool) {
        assert_eq!(buf.len(), side.pow(dim as u32));
        if side <= 1 {
            return;
        }
        let plan = self.plan(side, inverse);

        if dim == 1 {
            plan.process(buf);
            return;
        }

        self.line.resize(side, Complex::new(0.0, 0.0));
        let total = buf.len();
        for axis in 0..dim {
            let stride = side.pow(axis as u32);
            // base points: every index whose digit along `axis` is zero
            for base in (0..total).filter(|i| (i / stride) % side == 0) {
                for k in 0..side {
                    self.line[k] = buf[base + k * stride];
                }
                plan.process(&mut self.line);
                for k in 0..side {
                    buf[base + k * stride] = self.line[k];
                }
            }
        }
    }
}

/// Angular wave number of FFT index `k` on a periodic grid of `n` points over
/// a unit-length domain: 2π k for k ≤ n/2, 2π (k - n) above.
pub fn wave_number(k: usize, n: usize) -> f64 {
    let signed = if k <= n / 2 { k as f64 } else { k as f64 - n as f64 };
    2.0 * PI * signed
}
