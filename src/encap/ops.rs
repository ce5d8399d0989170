//! Free functions over containers and cube index arithmetic.

use faer::Mat;

use super::Encapsulation;
use crate::error::{PfasstError, Result};

/// Return `a * x + y` as a new container.
pub fn axpy<E: Encapsulation>(a: f64, x: &E, y: &E) -> E {
    let mut result = y.clone();
    result.scaled_add(a, x);
    result
}

/// dst[i] <- (zero_first ? 0 : dst[i]) + a * Σ_j mat[i, j] src[j]
///
/// Used to apply quadrature and interpolation matrices to node vectors.
pub fn mat_apply<E: Encapsulation>(
    dst: &mut [E],
    a: f64,
    mat: &Mat<f64>,
    src: &[E],
    zero_first: bool,
) -> Result<()> {
    if mat.nrows() != dst.len() || mat.ncols() != src.len() {
        return Err(PfasstError::incompatible_shape(
            format!("{}x{} matrix", dst.len(), src.len()),
            format!("{}x{} matrix", mat.nrows(), mat.ncols()),
        ));
    }

    for (i, d) in dst.iter_mut().enumerate() {
        if zero_first {
            d.zero();
        }
        for (j, s) in src.iter().enumerate() {
            let w = mat[(i, j)];
            if w != 0.0 {
                d.scaled_add(a * w, s);
            }
        }
    }
    Ok(())
}

/// Side length `n` with `n^dim == dofs`.
///
/// `which` names the offending space ("coarse"/"fine") in the error.
pub fn cube_side(dofs: usize, dim: usize, which: &'static str) -> Result<usize> {
    let guess = (dofs as f64).powf(1.0 / dim as f64).round() as usize;
    // Rounding of the root may be off by one for large sides
    for side in guess.saturating_sub(1)..=guess + 1 {
        if side.checked_pow(dim as u32) == Some(dofs) {
            return Ok(side);
        }
    }
    Err(PfasstError::NonCubeShape { which, dofs, dim })
}

/// Linear index of a multi-index on a cube of side `side` (axis 0 fastest).
pub fn linearized_index(index: &[usize], side: usize) -> usize {
    index.iter().rev().fold(0, |acc, &i| acc * side + i)
}

/// Inverse of [`linearized_index`] for `dim` axes.
pub fn split_index(mut linear: usize, side: usize, dim: usize) -> Vec<usize> {
    let mut index = Vec::with_capacity(dim);
    for _ in 0..dim {
        index.push(linear % side);
        linear /= side;
    }
    index
}
