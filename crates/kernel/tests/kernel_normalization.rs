//! Kernel normalization test via SPH density summation.
//!
//! On a regular lattice at spacing `dx` with `h = 1.3 dx`, the summation
//! density `m0 (W(0) + sum_j W_ij)` of an interior particle must match the
//! reference density within 2%, in both 2D and 3D.

use glam::DVec3;
use wcsph_kernel::sph::wendland_value;
use wcsph_kernel::{
    CpuKernel, Dimension, NeighborGrid, ParticleBuffers, PhysicalConstants,
};

fn lattice_density(dimension: Dimension) -> f64 {
    let spacing = 0.01;
    let h = 1.3 * spacing;
    let rho0 = 1000.0;
    let d = dimension.count();
    let nz = if d == 3 { 7 } else { 1 };

    let mut buffers = ParticleBuffers::new();
    for iz in 0..nz {
        for iy in 0..7 {
            for ix in 0..7 {
                let p = DVec3::new(ix as f64, iy as f64, iz as f64) * spacing;
                buffers.push_particle(p, rho0, 1.0);
            }
        }
    }
    let center = if d == 3 { 3 + 3 * 7 + 3 * 49 } else { 3 + 3 * 7 };

    let constants = PhysicalConstants {
        h,
        alpha_d: dimension.wendland_normalization(h),
        c0: 20.0,
        gamma: 7.0,
        rho0,
        m0: rho0 * spacing.powi(d),
        alpha: 0.01,
        delta: 0.1,
        g: 0.0,
    };

    let mut grid = NeighborGrid::new(
        constants.support_radius(),
        DVec3::splat(-spacing),
        DVec3::splat(8.0 * spacing),
    )
    .unwrap();
    grid.update(&buffers.position);
    let mut pairs = Vec::new();
    grid.collect_pairs(&buffers.position, constants.support_radius(), &mut pairs);

    let mut kernel = CpuKernel::new(buffers, constants, dimension).unwrap();
    kernel.compute_rates(&pairs).unwrap();

    let sum = kernel.buffers().kernel_value[center] + wendland_value(constants.alpha_d, 0.0);
    constants.m0 * sum
}

#[test]
fn density_at_rest_lattice_matches_rho0_3d() {
    let rho = lattice_density(Dimension::Three);
    eprintln!("3D summation density = {rho:.3}");
    assert!((rho - 1000.0).abs() / 1000.0 < 0.02, "rho = {rho}");
}

#[test]
fn density_at_rest_lattice_matches_rho0_2d() {
    let rho = lattice_density(Dimension::Two);
    eprintln!("2D summation density = {rho:.3}");
    assert!((rho - 1000.0).abs() / 1000.0 < 0.02, "rho = {rho}");
}
