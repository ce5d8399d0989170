//! Spectral transfer between levels of different resolution.

use std::f64::consts::PI;
use std::sync::Arc;

use pfasst_rs::transfer::DataTransfer;
use pfasst_rs::{
    Cube3D, Encapsulation, Heat1D, ImexSweeper, PfasstError, Quadrature, QuadratureType,
    Spectral1DTransfer, SpectralTransfer, Status, Sweeper, Transfer, Vector1D,
};

fn sine(n: usize) -> Vector1D {
    Vector1D::from_fn(n, |i| (2.0 * PI * i as f64 / n as f64).sin())
}

#[test]
fn test_same_size_roundtrip_is_exact() {
    let mut transfer = SpectralTransfer::<1>::new();
    let u = Vector1D::from_fn(10, |i| (i as f64).sqrt());
    let mut fine = Vector1D::zeros(10);
    let mut back = Vector1D::zeros(10);
    transfer.interpolate_data(&u, &mut fine).unwrap();
    transfer.restrict_data(&fine, &mut back).unwrap();
    assert_eq!(back, u);
}

#[test]
fn test_sine_survives_interpolate_then_restrict() {
    let mut transfer = SpectralTransfer::<1>::new();
    let coarse = sine(4);
    let mut fine = Vector1D::zeros(8);
    transfer.interpolate_data(&coarse, &mut fine).unwrap();
    for (a, b) in fine.data.iter().zip(&sine(8).data) {
        assert!((a - b).abs() < 1e-14);
    }

    let mut back = Vector1D::zeros(4);
    transfer.restrict_data(&fine, &mut back).unwrap();
    for (a, b) in back.data.iter().zip(&coarse.data) {
        assert!((a - b).abs() < 1e-14);
    }
}

#[test]
fn test_factor_other_than_two_is_rejected() {
    let mut transfer = SpectralTransfer::<1>::new();
    let coarse = sine(8);
    let mut fine = Vector1D::zeros(12);
    let err = transfer.interpolate_data(&coarse, &mut fine).unwrap_err();
    assert!(matches!(err, PfasstError::UnsupportedCoarsening { coarse: 8, fine: 12 }));
}

#[test]
fn test_odd_coarse_side_is_rejected() {
    let mut transfer = SpectralTransfer::<1>::new();
    let coarse = Vector1D::from_fn(3, |i| i as f64);
    let mut fine = Vector1D::zeros(6);
    let err = transfer.interpolate_data(&coarse, &mut fine).unwrap_err();
    assert!(matches!(err, PfasstError::OddCoarseSide { side: 3 }), "{}", err);

    let mut transfer = SpectralTransfer::<3>::new();
    let coarse = Cube3D::from_fn(27, |i| i as f64);
    let mut fine = Cube3D::zeros(216);
    let err = transfer.interpolate_data(&coarse, &mut fine).unwrap_err();
    assert!(matches!(err, PfasstError::OddCoarseSide { side: 3 }), "{}", err);
}

fn level(side: usize, num_nodes: usize) -> ImexSweeper<Heat1D> {
    let quad = Arc::new(Quadrature::new(QuadratureType::GaussLobatto, num_nodes).unwrap());
    let mut s = ImexSweeper::with_quadrature(Heat1D::new(side, 0.1), quad);
    s.core_mut().set_status(Status::new(0.0, 0.05, 1, 5));
    s.setup().unwrap();
    let u0 = s.problem().initial_value();
    s.core_mut().initial_state_mut().unwrap().copy_from(&u0).unwrap();
    s
}

#[test]
fn test_restricted_levels_have_no_coarse_correction() {
    let mut fine = level(16, 5);
    let mut coarse = level(8, 3);
    let mut transfer = Spectral1DTransfer::spectral();

    fine.spread().unwrap();
    fine.predict().unwrap();
    fine.post_predict().unwrap();
    let before: Vec<Vector1D> = fine.core().states().to_vec();

    transfer.restrict(&fine, &mut coarse, true).unwrap();
    transfer.fas(0.05, &fine, &mut coarse).unwrap();
    transfer.interpolate(&coarse, &mut fine, true).unwrap();

    // the coarse level equals the restricted fine level, so nothing changes
    for (a, b) in fine.core().states().iter().zip(&before) {
        for (x, y) in a.data.iter().zip(&b.data) {
            assert!((x - y).abs() < 1e-13);
        }
    }
}

#[test]
fn test_fas_makes_coarse_residual_match_restricted_fine() {
    let mut fine = level(16, 5);
    let mut coarse = level(8, 3);
    let mut transfer = Spectral1DTransfer::spectral();

    fine.spread().unwrap();
    fine.predict().unwrap();
    fine.post_predict().unwrap();
    for _ in 0..20 {
        fine.sweep().unwrap();
        fine.post_sweep().unwrap();
    }
    // fine level at its collocation solution
    assert!(fine.converged(false).is_ok());
    assert!(fine.core().status().unwrap().abs_res_norm < 1e-12);

    transfer.restrict(&fine, &mut coarse, true).unwrap();
    transfer.fas(0.05, &fine, &mut coarse).unwrap();
    coarse.compute_residuals(false).unwrap();
    for r in coarse.core().residuals() {
        assert!(r.norm0() < 1e-12, "coarse residual {:e}", r.norm0());
    }
}
