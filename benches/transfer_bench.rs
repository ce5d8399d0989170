//! Benchmarks for spectral interpolation and restriction.
//!
//! Run with: `cargo bench --bench transfer_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pfasst_rs::transfer::DataTransfer;
use pfasst_rs::{Cube3D, Encapsulation, SpectralTransfer, Vector1D};
use std::f64::consts::PI;

fn bench_interpolate_1d(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectral_interpolate_1d");

    for coarse_dofs in [64, 256, 1024, 4096] {
        let coarse = Vector1D::from_fn(coarse_dofs, |i| (2.0 * PI * i as f64 / coarse_dofs as f64).sin());
        let mut fine = Vector1D::zeros(2 * coarse_dofs);
        let mut transfer = SpectralTransfer::<1>::new();

        group.bench_with_input(BenchmarkId::from_parameter(coarse_dofs), &coarse_dofs, |b, _| {
            b.iter(|| {
                transfer.interpolate_data(black_box(&coarse), &mut fine).unwrap();
                black_box(&fine);
            })
        });
    }

    group.finish();
}

fn bench_interpolate_3d(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectral_interpolate_3d");

    for side in [4, 8, 16] {
        let dofs = side * side * side;
        let coarse = Cube3D::from_fn(dofs, |i| ((i % side) as f64 / side as f64 * 2.0 * PI).cos());
        let mut fine = Cube3D::zeros(8 * dofs);
        let mut transfer = SpectralTransfer::<3>::new();

        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| {
                transfer.interpolate_data(black_box(&coarse), &mut fine).unwrap();
                black_box(&fine);
            })
        });
    }

    group.finish();
}

fn bench_restrict_3d(c: &mut Criterion) {
    let mut group = c.benchmark_group("restrict_3d");

    for side in [8, 16, 32] {
        let dofs = side * side * side;
        let fine = Cube3D::from_fn(dofs, |i| i as f64);
        let mut coarse = Cube3D::zeros(dofs / 8);
        let mut transfer = SpectralTransfer::<3>::new();

        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| {
                transfer.restrict_data(black_box(&fine), &mut coarse).unwrap();
                black_box(&coarse);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_interpolate_1d, bench_interpolate_3d, bench_restrict_3d);
criterion_main!(benches);
