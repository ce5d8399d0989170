//! Level transfer built on a spatial [`DataTransfer`] plus Lagrange
//! interpolation between node sets.
//!
//! Restriction injects: every coarse node must coincide with a fine node.
//! Interpolation adds the coarse correction (coarse value minus restricted
//! fine value), spatially interpolated and mapped in time with the Lagrange
//! matrix of the coarse nodes.

use faer::Mat;
use tracing::trace;

use super::traits::{DataTransfer, Transfer};
use crate::encap::{Encapsulation, mat_apply};
use crate::error::{PfasstError, Result};
use crate::quadrature::Quadrature;
use crate::sweeper::Sweeper;

/// Node coincidence tolerance.
const NODE_TOL: f64 = 1e-12;

#[derive(Clone, Debug)]
struct TimeMaps {
    coarse_nodes: Vec<f64>,
    fine_nodes: Vec<f64>,
    /// Fine node index of every coarse node.
    coarse_to_fine: Vec<usize>,
    /// Fine nodes × coarse nodes.
    interpolation: Mat<f64>,
}

impl TimeMaps {
    fn new(coarse: &Quadrature, fine: &Quadrature) -> Result<Self> {
        let coarse_to_fine = coarse
            .nodes()
            .iter()
            .map(|&tc| {
                fine.nodes()
                    .iter()
                    .position(|&tf| (tf - tc).abs() < NODE_TOL)
                    .ok_or_else(|| {
                        PfasstError::UnsupportedQuadrature(format!(
                            "coarse node {} is not a {} fine node",
                            tc,
                            fine.kind()
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            coarse_nodes: coarse.nodes().to_vec(),
            fine_nodes: fine.nodes().to_vec(),
            coarse_to_fine,
            interpolation: fine.interpolation_matrix(coarse),
        })
    }

    fn matches(&self, coarse: &Quadrature, fine: &Quadrature) -> bool {
        self.coarse_nodes == coarse.nodes() && self.fine_nodes == fine.nodes()
    }
}

/// [`Transfer`] for any sweeper whose containers `D` can move in space.
#[derive(Clone, Debug, Default)]
pub struct PolynomialTransfer<D> {
    data: D,
    maps: Option<TimeMaps>,
}

impl<D> PolynomialTransfer<D> {
    pub fn new(data: D) -> Self {
        Self { data, maps: None }
    }

    pub fn data_transfer(&self) -> &D {
        &self.data
    }

    pub fn data_transfer_mut(&mut self) -> &mut D {
        &mut self.data
    }

    fn time_maps(&mut self, coarse: &Quadrature, fine: &Quadrature) -> Result<&TimeMaps> {
        let stale = !self.maps.as_ref().is_some_and(|m| m.matches(coarse, fine));
        if stale {
            self.maps = Some(TimeMaps::new(coarse, fine)?);
        }
        self.maps.as_ref().ok_or(PfasstError::NotSetUp("time transfer maps"))
    }
}

impl<D> PolynomialTransfer<D> {
    /// `coarse_value - R(fine_value)` on the coarse grid.
    fn coarse_correction<E: Encapsulation>(
        &mut self,
        coarse_value: &E,
        fine_value: &E,
    ) -> Result<E>
    where
        D: DataTransfer<E>,
    {
        let mut delta = E::zeros(coarse_value.num_dofs());
        self.data.restrict_data(fine_value, &mut delta)?;
        delta.scale(-1.0);
        delta.scaled_add(1.0, coarse_value);
        Ok(delta)
    }
}

impl<S, D> Transfer<S> for PolynomialTransfer<D>
where
    S: Sweeper,
    D: DataTransfer<S::Encap>,
{
    fn interpolate_initial(&mut self, coarse: &S, fine: &mut S) -> Result<()> {
        trace!(target: "transfer", "interpolate initial value");
        let delta = self.coarse_correction(coarse.core().initial_state()?, fine.core().initial_state()?)?;

        let mut fine_delta = fine.core().factory().create();
        self.data.interpolate_data(&delta, &mut fine_delta)?;
        fine.core_mut().initial_state_mut()?.scaled_add(1.0, &fine_delta);
        fine.reevaluate(true)
    }

    fn interpolate(&mut self, coarse: &S, fine: &mut S, initial: bool) -> Result<()> {
        if initial {
            self.interpolate_initial(coarse, fine)?;
        }
        trace!(target: "transfer", initial, "interpolate");

        let coarse_quad = coarse.core().quadrature()?.clone();
        let fine_quad = fine.core().quadrature()?.clone();
        let maps = self.time_maps(&coarse_quad, &fine_quad)?.clone();

        let mut fine_deltas = Vec::with_capacity(maps.coarse_to_fine.len());
        for (m, &fm) in maps.coarse_to_fine.iter().enumerate() {
            let delta = self.coarse_correction(&coarse.core().states()[m + 1], &fine.core().states()[fm + 1])?;
            let mut fine_delta = fine.core().factory().create();
            self.data.interpolate_data(&delta, &mut fine_delta)?;
            fine_deltas.push(fine_delta);
        }

        let states = fine.core_mut().states_mut();
        mat_apply(&mut states[1..], 1.0, &maps.interpolation, &fine_deltas, false)?;
        fine.reevaluate(false)
    }

    fn restrict_initial(&mut self, fine: &S, coarse: &mut S) -> Result<()> {
        trace!(target: "transfer", "restrict initial value");
        self.data
            .restrict_data(fine.core().initial_state()?, coarse.core_mut().initial_state_mut()?)
    }

    fn restrict(&mut self, fine: &S, coarse: &mut S, initial: bool) -> Result<()> {
        if initial {
            self.restrict_initial(fine, coarse)?;
        }
        trace!(target: "transfer", initial, "restrict");

        let coarse_quad = coarse.core().quadrature()?.clone();
        let fine_quad = fine.core().quadrature()?.clone();
        let coarse_to_fine = self.time_maps(&coarse_quad, &fine_quad)?.coarse_to_fine.clone();

        for (m, fm) in coarse_to_fine.into_iter().enumerate() {
            let fine_state = &fine.core().states()[fm + 1];
            let coarse_state = &mut coarse.core_mut().states_mut()[m + 1];
            self.data.restrict_data(fine_state, coarse_state)?;
        }
        coarse.reevaluate(false)
    }

    fn fas(&mut self, dt: f64, fine: &S, coarse: &mut S) -> Result<()> {
        trace!(target: "transfer", dt, "FAS correction");

        let coarse_quad = coarse.core().quadrature()?.clone();
        let fine_quad = fine.core().quadrature()?.clone();
        let coarse_to_fine = self.time_maps(&coarse_quad, &fine_quad)?.coarse_to_fine.clone();

        let fine_integrals = fine.integrate(dt)?;
        let coarse_integrals = coarse.integrate(dt)?;
        let factory = coarse.core().factory().clone();

        let mut tau = factory.create_many(coarse_to_fine.len() + 1);
        for (m, fm) in coarse_to_fine.into_iter().enumerate() {
            let slot = &mut tau[m + 1];
            self.data.restrict_data(&fine_integrals[fm + 1], slot)?;
            slot.scaled_add(-1.0, &coarse_integrals[m + 1]);

            let mut restricted_tau = factory.create();
            self.data.restrict_data(&fine.core().tau()[fm + 1], &mut restricted_tau)?;
            slot.scaled_add(1.0, &restricted_tau);
        }

        for (dst, src) in coarse.core_mut().tau_mut().iter_mut().zip(&tau) {
            dst.copy_from(src)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encap::Vector1D;
    use crate::quadrature::QuadratureType;

    /// Injection between containers of equal size.
    struct Identity;
    impl DataTransfer<Vector1D> for Identity {
        fn interpolate_data(&mut self, coarse: &Vector1D, fine: &mut Vector1D) -> Result<()> {
            fine.copy_from(coarse)
        }
        fn restrict_data(&mut self, fine: &Vector1D, coarse: &mut Vector1D) -> Result<()> {
            coarse.copy_from(fine)
        }
    }

    #[test]
    fn test_time_maps_for_nested_lobatto() {
        let coarse = Quadrature::new(QuadratureType::GaussLobatto, 3).unwrap();
        let fine = Quadrature::new(QuadratureType::GaussLobatto, 5).unwrap();
        let maps = TimeMaps::new(&coarse, &fine).unwrap();
        assert_eq!(maps.coarse_to_fine, vec![0, 2, 4]);
        // coarse nodes are reproduced exactly
        for (m, &fm) in maps.coarse_to_fine.iter().enumerate() {
            for j in 0..3 {
                let expected = if j == m { 1.0 } else { 0.0 };
                assert!((maps.interpolation[(fm, j)] - expected).abs() < 1e-13);
            }
        }
    }

    #[test]
    fn test_non_nested_nodes_rejected() {
        let coarse = Quadrature::new(QuadratureType::GaussLegendre, 2).unwrap();
        let fine = Quadrature::new(QuadratureType::GaussLegendre, 3).unwrap();
        assert!(matches!(
            TimeMaps::new(&coarse, &fine),
            Err(PfasstError::UnsupportedQuadrature(_))
        ));
    }

    #[test]
    fn test_coarse_correction() {
        let mut transfer = PolynomialTransfer::new(Identity);
        let delta = transfer
            .coarse_correction(&Vector1D::from_vec(vec![3.0]), &Vector1D::from_vec(vec![1.0]))
            .unwrap();
        assert_eq!(delta.data, vec![2.0]);
    }
}
