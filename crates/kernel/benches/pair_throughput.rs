//! Pair-loop throughput, serial vs parallel.
//!
//! Run with: cargo bench -p wcsph_kernel --bench pair_throughput

use std::time::Instant;

use glam::DVec3;
use wcsph_kernel::{
    CpuKernel, Dimension, Execution, NeighborGrid, NeighborPair, ParticleBuffers,
    PhysicalConstants,
};

fn create_particle_cube(n_per_axis: usize) -> (ParticleBuffers, PhysicalConstants, Vec<NeighborPair>) {
    let spacing = 0.1 / n_per_axis as f64;
    let h = 1.3 * spacing;
    let rest_density = 1000.0;

    let mut buffers = ParticleBuffers::new();
    for iz in 0..n_per_axis {
        for iy in 0..n_per_axis {
            for ix in 0..n_per_axis {
                let p = (DVec3::new(ix as f64, iy as f64, iz as f64) + 0.5) * spacing;
                buffers.push_particle(p, rest_density, 1.0);
            }
        }
    }

    let constants = PhysicalConstants {
        h,
        alpha_d: Dimension::Three.wendland_normalization(h),
        c0: 20.0,
        gamma: 7.0,
        rho0: rest_density,
        m0: rest_density * spacing.powi(3),
        alpha: 0.01,
        delta: 0.1,
        g: 9.81,
    };

    let radius = constants.support_radius();
    let mut pairs = Vec::new();
    if let Some(mut grid) = NeighborGrid::new(radius, DVec3::ZERO, DVec3::splat(0.1)) {
        grid.update(&buffers.position);
        grid.collect_pairs(&buffers.position, radius, &mut pairs);
    }
    (buffers, constants, pairs)
}

fn main() {
    println!("=== Pair Throughput ===\n");
    println!(
        "{:>10} {:>10} {:>10} {:>12} {:>12}",
        "Particles", "Pairs", "Mode", "ms/eval", "Mpairs/s"
    );

    let evals = 10;
    for n_per_axis in [16, 24, 32, 40] {
        let (buffers, constants, pairs) = create_particle_cube(n_per_axis);
        let n = buffers.len();

        for execution in [Execution::Serial, Execution::Parallel] {
            let mut kernel = match CpuKernel::new(buffers.clone(), constants, Dimension::Three) {
                Ok(k) => k.with_execution(execution),
                Err(e) => {
                    eprintln!("setup failed: {e}");
                    return;
                }
            };

            // Warm-up
            if let Err(e) = kernel.compute_rates(&pairs) {
                eprintln!("evaluation failed: {e}");
                return;
            }

            let start = Instant::now();
            for _ in 0..evals {
                if let Err(e) = kernel.compute_rates(&pairs) {
                    eprintln!("evaluation failed: {e}");
                    return;
                }
            }
            let elapsed = start.elapsed().as_secs_f64();
            let ms_per_eval = elapsed * 1000.0 / evals as f64;
            let mpairs = (pairs.len() * evals) as f64 / elapsed / 1.0e6;

            println!(
                "{:>10} {:>10} {:>10} {:>12.3} {:>12.2}",
                n,
                pairs.len(),
                format!("{execution:?}"),
                ms_per_eval,
                mpairs
            );
        }
    }
}
