//! Quadrature table: nodes plus integration and interpolation matrices.
//!
//! All matrices are built in the Legendre basis. With the Legendre-Vandermonde
//! matrix V[i,k] = P_k(2τ_i - 1), the Lagrange basis polynomial of node j has
//! modal coefficients C[:, j] where C = V^{-1}, so
//!
//! Q[m, j] = ∫_0^{τ_m} ℓ_j(s) ds = Σ_k I_k(τ_m) C[k, j]
//!
//! with I_k the antiderivative from [`legendre_integral`].

use faer::{Mat, linalg::solvers::Solve};
use tracing::info;

use super::legendre::{legendre, legendre_integral};
use super::nodes::{QuadratureType, compute_nodes};
use crate::error::{PfasstError, Result};

/// Nodes and integration matrices for one collocation rule.
#[derive(Clone, Debug)]
pub struct Quadrature {
    kind: QuadratureType,
    nodes: Vec<f64>,
    /// Modal coefficients of the Lagrange basis (inverse Vandermonde)
    lagrange_coeffs: Mat<f64>,
    q_mat: Mat<f64>,
    s_mat: Mat<f64>,
    weights: Vec<f64>,
}

impl Quadrature {
    /// Build the rule for `num_nodes` nodes of the given family.
    pub fn new(kind: QuadratureType, num_nodes: usize) -> Result<Self> {
        let nodes = compute_nodes(kind, num_nodes)?;
        let m = nodes.len();

        let lagrange_coeffs = invert_vandermonde(&nodes)?;

        let mut q_mat = Mat::<f64>::zeros(m, m);
        for (row, &tau) in nodes.iter().enumerate() {
            for j in 0..m {
                q_mat[(row, j)] = (0..m)
                    .map(|k| legendre_integral(k, tau) * lagrange_coeffs[(k, j)])
                    .sum::<f64>();
            }
        }

        let mut s_mat = Mat::<f64>::zeros(m, m);
        for j in 0..m {
            s_mat[(0, j)] = q_mat[(0, j)];
        }
        for row in 1..m {
            for j in 0..m {
                s_mat[(row, j)] = q_mat[(row, j)] - q_mat[(row - 1, j)];
            }
        }

        // Only the k = 0 mode survives integration over the whole interval
        let weights = (0..m).map(|j| lagrange_coeffs[(0, j)]).collect();

        Ok(Self {
            kind,
            nodes,
            lagrange_coeffs,
            q_mat,
            s_mat,
            weights,
        })
    }

    pub fn kind(&self) -> QuadratureType {
        self.kind
    }

    /// Node positions in [0, 1], ascending.
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Cumulative integration matrix: row m integrates from 0 to τ_m.
    pub fn q_mat(&self) -> &Mat<f64> {
        &self.q_mat
    }

    /// Node-to-node integration matrix: row m integrates from τ_{m-1} to τ_m
    /// (from 0 for the first row).
    pub fn s_mat(&self) -> &Mat<f64> {
        &self.s_mat
    }

    /// Row `m` of the cumulative integration matrix.
    pub fn row(&self, m: usize) -> Vec<f64> {
        (0..self.num_nodes()).map(|j| self.q_mat[(m, j)]).collect()
    }

    /// Quadrature weights for the full interval [0, 1].
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn left_is_node(&self) -> bool {
        self.kind.left_is_node()
    }

    /// Whether the last node is the right end of the interval.
    pub fn right_is_node(&self) -> bool {
        self.kind.right_is_node()
    }

    /// Error of the rule on the lowest-degree monomial it does not integrate
    /// exactly.
    pub fn expected_error(&self) -> f64 {
        let max_degree = 2 * self.num_nodes() + 2;
        for degree in 0..=max_degree {
            let exact = 1.0 / (degree + 1) as f64;
            let approx: f64 = self
                .nodes
                .iter()
                .zip(&self.weights)
                .map(|(&t, &w)| w * t.powi(degree as i32))
                .sum::<f64>();
            let err = (approx - exact).abs();
            if err > 1e-13 {
                return err;
            }
        }
        0.0
    }

    /// Lagrange interpolation matrix from the nodes of `from` onto the nodes of
    /// `self`: shape `self.num_nodes() × from.num_nodes()`.
    pub fn interpolation_matrix(&self, from: &Quadrature) -> Mat<f64> {
        let n_to = self.num_nodes();
        let n_from = from.num_nodes();
        let mut mat = Mat::<f64>::zeros(n_to, n_from);
        for (i, &tau) in self.nodes.iter().enumerate() {
            let x = 2.0 * tau - 1.0;
            for j in 0..n_from {
                mat[(i, j)] = (0..n_from)
                    .map(|k| legendre(k, x) * from.lagrange_coeffs[(k, j)])
                    .sum::<f64>();
            }
        }
        mat
    }

    /// Human-readable summary of nodes and matrices.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} quadrature, {} nodes (left is node: {}, right is node: {})\n",
            self.kind,
            self.num_nodes(),
            self.left_is_node(),
            self.right_is_node()
        );
        out.push_str(&format!("  nodes:   {:?}\n", self.nodes));
        out.push_str(&format!("  weights: {:?}\n", self.weights));
        for m in 0..self.num_nodes() {
            out.push_str(&format!("  Q[{}]:    {:?}\n", m, self.row(m)));
        }
        out.push_str(&format!("  expected error: {:e}", self.expected_error()));
        out
    }

    /// Log [`summary`](Self::summary) at info level.
    pub fn print_summary(&self) {
        for line in self.summary().lines() {
            info!(target: "quadrature", "{}", line);
        }
    }
}

/// Invert V[i,k] = P_k(2τ_i - 1) by LU with full pivoting, one column at a time.
fn invert_vandermonde(nodes: &[f64]) -> Result<Mat<f64>> {
    let n = nodes.len();
    let mut v = Mat::<f64>::zeros(n, n);
    for (i, &tau) in nodes.iter().enumerate() {
        for k in 0..n {
            v[(i, k)] = legendre(k, 2.0 * tau - 1.0);
        }
    }

    let lu = v.as_ref().full_piv_lu();
    let mut v_inv = Mat::<f64>::zeros(n, n);
    for j in 0..n {
        let mut rhs = Mat::<f64>::zeros(n, 1);
        rhs[(j, 0)] = 1.0;
        let col = lu.solve(&rhs);
        for i in 0..n {
            v_inv[(i, j)] = col[(i, 0)];
        }
    }

    if (0..n).any(|i| (0..n).any(|j| !v_inv[(i, j)].is_finite())) {
        return Err(PfasstError::UnsupportedQuadrature(
            "singular Vandermonde matrix (repeated nodes?)".into(),
        ));
    }
    Ok(v_inv)
}
