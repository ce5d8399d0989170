//! Node families on the unit time interval [0, 1].
//!
//! Gauss-type nodes are computed on [-1, 1] by Newton iteration (or bracketing
//! where no good initial guess exists) and mapped with τ = (x + 1) / 2.

use std::f64::consts::PI;
use std::fmt;

use serde::Deserialize;

use super::legendre::{legendre, legendre_and_derivative};
use crate::error::{PfasstError, Result};

/// Supported node families.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuadratureType {
    /// Roots of P_M; neither endpoint is a node.
    GaussLegendre,
    /// Roots of (1-x²)P'_{M-1}; both endpoints are nodes.
    #[serde(alias = "gauss_lobatto_legendre")]
    GaussLobatto,
    /// Right Radau: roots of P_{M-1} - P_M; the right endpoint is a node.
    GaussRadau,
    /// Chebyshev extrema; both endpoints are nodes.
    ClenshawCurtis,
    /// Equidistant nodes including both endpoints.
    Uniform,
}

impl QuadratureType {
    /// Smallest node count this family can provide.
    pub fn min_nodes(self) -> usize {
        match self {
            QuadratureType::GaussLegendre | QuadratureType::GaussRadau => 1,
            QuadratureType::GaussLobatto
            | QuadratureType::ClenshawCurtis
            | QuadratureType::Uniform => 2,
        }
    }

    pub fn left_is_node(self) -> bool {
        matches!(
            self,
            QuadratureType::GaussLobatto | QuadratureType::ClenshawCurtis | QuadratureType::Uniform
        )
    }

    pub fn right_is_node(self) -> bool {
        !matches!(self, QuadratureType::GaussLegendre)
    }
}

impl fmt::Display for QuadratureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuadratureType::GaussLegendre => "Gauss-Legendre",
            QuadratureType::GaussLobatto => "Gauss-Lobatto",
            QuadratureType::GaussRadau => "Gauss-Radau",
            QuadratureType::ClenshawCurtis => "Clenshaw-Curtis",
            QuadratureType::Uniform => "Uniform",
        };
        f.write_str(name)
    }
}

/// Compute `num_nodes` nodes of the given family, sorted ascending in [0, 1].
pub fn compute_nodes(kind: QuadratureType, num_nodes: usize) -> Result<Vec<f64>> {
    if num_nodes < kind.min_nodes() {
        return Err(PfasstError::UnsupportedQuadrature(format!(
            "{} needs at least {} nodes, got {}",
            kind,
            kind.min_nodes(),
            num_nodes
        )));
    }

    let nodes = match kind {
        QuadratureType::GaussLegendre => to_unit(gauss_legendre_roots(num_nodes)),
        QuadratureType::GaussLobatto => to_unit(gauss_lobatto_roots(num_nodes - 1)),
        QuadratureType::GaussRadau => to_unit(gauss_radau_right_roots(num_nodes)?),
        QuadratureType::ClenshawCurtis => {
            let n = (num_nodes - 1) as f64;
            (0..num_nodes)
                .map(|j| 0.5 * (1.0 - (PI * j as f64 / n).cos()))
                .collect()
        }
        QuadratureType::Uniform => {
            let n = (num_nodes - 1) as f64;
            (0..num_nodes).map(|j| j as f64 / n).collect()
        }
    };

    Ok(nodes)
}

fn to_unit(mut xs: Vec<f64>) -> Vec<f64> {
    xs.sort_by(|a, b| a.total_cmp(b));
    xs.into_iter().map(|x| 0.5 * (x + 1.0)).collect()
}

/// Roots of P_n by Newton iteration from the asymptotic initial guess.
fn gauss_legendre_roots(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
            for _ in 0..100 {
                let (p, dp) = legendre_and_derivative(n, x);
                let update = p / dp;
                x -= update;
                if update.abs() < 1e-15 {
                    break;
                }
            }
            x
        })
        .collect()
}

/// Roots of (1-x²)P'_N(x), i.e. N+1 Gauss-Lobatto-Legendre points.
///
/// Newton on L(x) = (1-x²)P'_N(x), whose derivative simplifies to -N(N+1)P_N(x),
/// started from Chebyshev-Lobatto points.
fn gauss_lobatto_roots(order: usize) -> Vec<f64> {
    let n = order;
    if n == 1 {
        return vec![-1.0, 1.0];
    }

    let mut nodes: Vec<f64> = (0..=n).map(|j| -(PI * j as f64 / n as f64).cos()).collect();
    nodes[0] = -1.0;
    nodes[n] = 1.0;

    for x in nodes.iter_mut().take(n).skip(1) {
        for _ in 0..100 {
            let (p_n, dp_n) = legendre_and_derivative(n, *x);
            let update = (1.0 - *x * *x) * dp_n / ((n * (n + 1)) as f64 * p_n);
            *x += update;
            if update.abs() < 1e-15 {
                break;
            }
        }
    }

    nodes
}

/// Right Radau points: roots of P_{n-1}(x) - P_n(x), which include x = 1.
///
/// The interior roots are bracketed on a fine scan and refined by bisection.
fn gauss_radau_right_roots(n: usize) -> Result<Vec<f64>> {
    let f = |x: f64| legendre(n - 1, x) - legendre(n, x);

    let mut roots = Vec::with_capacity(n);
    let samples = 400 * n;
    let upper = 1.0 - 1e-9;
    let h = (upper + 1.0) / samples as f64;

    let mut a = -1.0;
    let mut fa = f(a);
    for i in 1..=samples {
        let b = -1.0 + i as f64 * h;
        let fb = f(b);
        if fa * fb < 0.0 {
            roots.push(bisect(&f, a, b, fa));
        }
        a = b;
        fa = fb;
    }
    roots.push(1.0);

    if roots.len() != n {
        return Err(PfasstError::UnsupportedQuadrature(format!(
            "Gauss-Radau: found {} of {} nodes",
            roots.len(),
            n
        )));
    }
    Ok(roots)
}

fn bisect(f: &impl Fn(f64) -> f64, mut a: f64, mut b: f64, mut fa: f64) -> f64 {
    for _ in 0..200 {
        let mid = 0.5 * (a + b);
        let fm = f(mid);
        if fm == 0.0 || (b - a) < 1e-16 {
            return mid;
        }
        if fa * fm < 0.0 {
            b = mid;
        } else {
            a = mid;
            fa = fm;
        }
    }
    0.5 * (a + b)
}
