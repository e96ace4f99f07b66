//! Domain setup: fluid block and fixed wall particles for a tank

use glam::DVec3;
use wcsph_kernel::{Dimension, ParticleBuffers};

use crate::config::SimulationConfig;

/// One lattice coordinate along an axis, flagged when it lies in a wall.
#[derive(Debug, Clone, Copy)]
struct AxisSample {
    coord: f64,
    wall: bool,
}

/// Number of cell-centred samples of width `spacing` that fit in `extent`.
fn lattice_count(extent: f64, spacing: f64) -> usize {
    ((extent / spacing) + 1.0e-9).floor().max(1.0) as usize
}

/// Cell-centred samples in `[min, max]`.
fn interior(min: f64, max: f64, spacing: f64) -> impl Iterator<Item = f64> {
    (0..lattice_count(max - min, spacing)).map(move |k| min + (k as f64 + 0.5) * spacing)
}

/// Samples along one axis: `below` wall layers under `min`, the interior,
/// then `above` wall layers over `max`.
fn axis_samples(min: f64, max: f64, spacing: f64, below: usize, above: usize) -> Vec<AxisSample> {
    let mut samples = Vec::new();
    for k in (0..below).rev() {
        samples.push(AxisSample { coord: min - (k as f64 + 0.5) * spacing, wall: true });
    }
    samples.extend(interior(min, max, spacing).map(|coord| AxisSample { coord, wall: false }));
    for k in 0..above {
        samples.push(AxisSample { coord: max + (k as f64 + 0.5) * spacing, wall: true });
    }
    samples
}

/// Set up a tank: a lattice block of fluid plus fixed wall layers.
///
/// Fluid particles fill `config.fluid` on a cell-centred lattice and are
/// free to move (motion limiter `1`). `config.boundary_layers` layers of
/// fixed particles (motion limiter `0`) line the floor and the side walls
/// just outside `config.domain`; the top is open. In 2D the particles lie in
/// the x-z plane at the middle of the fluid block's y range.
///
/// All particles start at rest at `rest_density`. Fluid particles come
/// first in the returned buffers.
pub fn setup_tank(config: &SimulationConfig) -> ParticleBuffers {
    let dx = config.particle_spacing;
    let rho0 = config.rest_density;
    let layers = config.boundary_layers;
    let fluid_min = config.fluid.min_corner();
    let fluid_max = config.fluid.max_corner();
    let domain_min = config.domain.min_corner();
    let domain_max = config.domain.max_corner();
    let planar = config.dimension == Dimension::Two;
    let mid_y = 0.5 * (fluid_min.y + fluid_max.y);

    let mut buffers = ParticleBuffers::new();

    // Fluid block
    let ys: Vec<f64> = if planar {
        vec![mid_y]
    } else {
        interior(fluid_min.y, fluid_max.y, dx).collect()
    };
    for z in interior(fluid_min.z, fluid_max.z, dx) {
        for &y in &ys {
            for x in interior(fluid_min.x, fluid_max.x, dx) {
                buffers.push_particle(DVec3::new(x, y, z), rho0, 1.0);
            }
        }
    }
    let fluid_count = buffers.len();

    // Walls: every lattice site of the thickened tank that is not interior
    let xs = axis_samples(domain_min.x, domain_max.x, dx, layers, layers);
    let ys = if planar {
        vec![AxisSample { coord: mid_y, wall: false }]
    } else {
        axis_samples(domain_min.y, domain_max.y, dx, layers, layers)
    };
    let zs = axis_samples(domain_min.z, domain_max.z, dx, layers, 0);
    for sz in &zs {
        for sy in &ys {
            for sx in &xs {
                if sx.wall || sy.wall || sz.wall {
                    buffers.push_particle(DVec3::new(sx.coord, sy.coord, sz.coord), rho0, 0.0);
                }
            }
        }
    }

    tracing::info!(
        "Domain setup complete: {} fluid particles, {} boundary particles",
        fluid_count,
        buffers.len() - fluid_count
    );

    buffers
}
