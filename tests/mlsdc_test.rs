//! Two-level MLSDC with spectral space coarsening and Lobatto time coarsening.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use pfasst_rs::{
    Controller, Encapsulation, Heat, Heat1D, Heat3D, ImexProblem, ImexSweeper, PolynomialTransfer,
    Quadrature, QuadratureType, SpectralTransfer, Sweeper,
};

fn lobatto(num_nodes: usize) -> Arc<Quadrature> {
    Arc::new(Quadrature::new(QuadratureType::GaussLobatto, num_nodes).unwrap())
}

fn sweeper<const DIM: usize>(
    side: usize,
    num_nodes: usize,
    abs_tol: f64,
) -> ImexSweeper<Heat<DIM>> {
    let mut s = ImexSweeper::with_quadrature(Heat::<DIM>::new(side, 0.1), lobatto(num_nodes));
    s.core_mut().set_abs_residual_tol(abs_tol);
    s
}

type Hierarchy<const DIM: usize> =
    Controller<ImexSweeper<Heat<DIM>>, PolynomialTransfer<SpectralTransfer<DIM>>>;

fn two_levels<const DIM: usize>(
    fine_side: usize,
    dt: f64,
    num_steps: usize,
    abs_tol: f64,
) -> Hierarchy<DIM> {
    let mut controller = Controller::new();
    controller.add_level(sweeper::<DIM>(fine_side, 5, abs_tol), Some(PolynomialTransfer::spectral()), false);
    controller.add_level(sweeper::<DIM>(fine_side / 2, 3, abs_tol), None, true);
    controller.set_duration(dt, num_steps, 30);
    controller.setup().unwrap();

    let fine = controller.finest_level_mut().unwrap();
    let u0 = fine.problem().initial_value();
    fine.core_mut().initial_state_mut().unwrap().copy_from(&u0).unwrap();
    controller
}

fn single_level(side: usize, dt: f64, num_steps: usize, abs_tol: f64) -> Hierarchy<1> {
    let mut controller = Controller::new();
    controller.add_level(sweeper::<1>(side, 5, abs_tol), None, true);
    controller.set_duration(dt, num_steps, 30);
    controller.setup().unwrap();

    let fine = controller.finest_level_mut().unwrap();
    let u0 = fine.problem().initial_value();
    fine.core_mut().initial_state_mut().unwrap().copy_from(&u0).unwrap();
    controller
}

#[test]
fn test_hierarchy_shape() {
    let controller = two_levels::<1>(16, 0.05, 1, 1e-11);
    assert_eq!(controller.num_levels(), 2);
    assert_eq!(controller.num_transfers(), 1);
    assert_eq!(controller.get_level(0).unwrap().core().factory().size(), 8);
    assert_eq!(controller.get_level(1).unwrap().core().factory().size(), 16);
    assert_eq!(controller.get_level(0).unwrap().core().logger_id(), "COARSE");
    assert_eq!(controller.get_level(1).unwrap().core().logger_id(), "FINE");
}

#[test]
fn test_mlsdc_matches_sdc() {
    let mut mlsdc = two_levels::<1>(16, 0.05, 2, 1e-11);
    let ml_summary = mlsdc.run_mlsdc().unwrap();
    assert!(ml_summary.all_converged(), "{:?}", ml_summary);

    let mut sdc = single_level(16, 0.05, 2, 1e-11);
    let sdc_summary = sdc.run_sdc().unwrap();
    assert!(sdc_summary.all_converged());

    let a = mlsdc.finest_level().unwrap().core().end_state().unwrap();
    let b = sdc.finest_level().unwrap().core().end_state().unwrap();
    for (x, y) in a.data.iter().zip(&b.data) {
        assert_abs_diff_eq!(*x, *y, epsilon = 1e-8);
    }
    assert_abs_diff_eq!(ml_summary.final_time, 0.1, epsilon = 1e-14);
}

#[test]
fn test_mlsdc_heat_1d_accuracy() {
    let mut controller: Hierarchy<1> = two_levels::<1>(16, 0.05, 4, 1e-11);
    controller.run_mlsdc().unwrap();

    let fine = controller.finest_level().unwrap();
    let exact = Heat1D::new(16, 0.1).exact(0.2).unwrap();
    let u = fine.core().end_state().unwrap();
    let mut diff = exact.clone();
    diff.scaled_add(-1.0, u);
    assert!(diff.norm0() < 1e-8, "error {:e}", diff.norm0());
}

#[test]
fn test_mlsdc_heat_3d_accuracy() {
    let mut controller: Hierarchy<3> = two_levels::<3>(8, 0.02, 1, 1e-10);
    let summary = controller.run_mlsdc().unwrap();
    assert!(summary.all_converged());

    let fine = controller.finest_level().unwrap();
    let exact = Heat3D::new(8, 0.1).exact(0.02).unwrap();
    let u = fine.core().end_state().unwrap();
    let mut diff = exact.clone();
    diff.scaled_add(-1.0, u);
    assert!(diff.norm0() < 1e-8, "error {:e}", diff.norm0());
}
