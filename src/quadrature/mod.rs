//! Collocation quadrature for one time step.
//!
//! This module provides:
//! - Legendre polynomials and their antiderivatives on the unit interval
//! - Node families (Gauss-Legendre, Gauss-Lobatto, right Gauss-Radau, Clenshaw-Curtis, uniform)
//! - The [`Quadrature`] table with cumulative (Q) and node-to-node (S) integration
//!   matrices and Lagrange interpolation between node sets

mod legendre;
mod matrices;
mod nodes;

pub use legendre::{legendre, legendre_and_derivative, legendre_integral};
pub use matrices::Quadrature;
pub use nodes::{QuadratureType, compute_nodes};
