//! Weakly-compressible SPH interaction engine.
//!
//! This crate computes, for one simulation step, the per-particle density
//! rate, acceleration and kernel sums of a weakly-compressible SPH fluid
//! from a neighbor pair list. Integrating the state forward is left to the
//! caller.
//!
//! # Modules
//! - [`particle`] -- Struct-of-arrays buffer set with `reset` / `resize`.
//! - [`pairs`] -- Neighbor pair records and the pairwise field aggregator.
//! - [`sph`] -- Wendland quintic kernel, gradient, and kernel sums.
//! - [`eos`] -- Tait equation of state.
//! - [`continuity`] -- Density rate, plain and with density diffusion.
//! - [`momentum`] -- Pressure acceleration.
//! - [`viscosity`] -- Monaghan artificial viscosity.
//! - [`timestep`] -- CFL-style adaptive timestep.
//! - [`neighbor`] -- Uniform-grid spatial hash producing the pair list.
//! - [`constants`] -- Per-run physical constants.
//! - [`error`] -- Error type shared by every operation.

#![warn(missing_docs)]

pub mod constants;
pub mod continuity;
pub mod eos;
pub mod error;
pub mod momentum;
pub mod neighbor;
pub mod pairs;
pub mod particle;
pub mod sph;
pub mod timestep;
pub mod viscosity;

use glam::DVec3;

pub use constants::{Dimension, PhysicalConstants, UP_AXIS};
pub use eos::tait_pressure;
pub use error::KernelError;
pub use neighbor::NeighborGrid;
pub use pairs::{
    Accumulators, AggregateScratch, Execution, NeighborPair, PairContribution, PairList,
};
pub use particle::{ParticleBuffers, ParticleFields};
pub use sph::{wendland_gradient, wendland_value};
pub use timestep::estimate_timestep;

/// Extremes of the state after a rate evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSummary {
    /// Number of interactions evaluated.
    pub pair_count: usize,
    /// Largest particle speed (m/s).
    pub max_speed: f64,
    /// Largest total acceleration magnitude (m/s^2).
    pub max_acceleration: f64,
    /// Smallest density (kg/m^3).
    pub min_density: f64,
    /// Largest density (kg/m^3).
    pub max_density: f64,
}

/// Reference CPU pipeline over one [`ParticleBuffers`] set.
///
/// Each call to [`compute_rates`](Self::compute_rates) runs, in order:
/// 1. Kernel sums (`sum W`, `sum grad W`) and their per-interaction lists
/// 2. Equation of state into the pressure buffer
/// 3. Continuity (with density diffusion unless disabled)
/// 4. Pressure acceleration
/// 5. Artificial viscosity, kept in its own buffer
/// 6. Total acceleration = pressure + viscosity + gravity
#[derive(Debug, Clone)]
pub struct CpuKernel {
    buffers: ParticleBuffers,
    constants: PhysicalConstants,
    dimension: Dimension,
    density_diffusion: bool,
    execution: Execution,
    scratch: AggregateScratch,
}

impl CpuKernel {
    /// Create a kernel that owns `buffers`.
    ///
    /// Fails if the constants are out of range or the buffer arrays do not
    /// all have the same length.
    pub fn new(
        buffers: ParticleBuffers,
        constants: PhysicalConstants,
        dimension: Dimension,
    ) -> Result<Self, KernelError> {
        constants.validate()?;
        buffers.check_shape()?;
        Ok(Self {
            buffers,
            constants,
            dimension,
            density_diffusion: true,
            execution: Execution::Serial,
            scratch: AggregateScratch::default(),
        })
    }

    /// Enable or disable the density-diffusion term.
    pub fn with_density_diffusion(mut self, enabled: bool) -> Self {
        self.density_diffusion = enabled;
        self
    }

    /// Select how pair loops are executed.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Particle buffers (read-only).
    pub fn buffers(&self) -> &ParticleBuffers {
        &self.buffers
    }

    /// Particle buffers, for the integrator to advance state in place.
    pub fn buffers_mut(&mut self) -> &mut ParticleBuffers {
        &mut self.buffers
    }

    /// Physical constants of the run.
    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    /// Spatial dimensionality of the run.
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Number of particles.
    pub fn particle_count(&self) -> usize {
        self.buffers.len()
    }

    /// Gravity vector: magnitude `g` pointing down the up axis.
    pub fn gravity(&self) -> DVec3 {
        let mut gravity = DVec3::ZERO;
        gravity[UP_AXIS] = -self.constants.g;
        gravity
    }

    /// Evaluate every derived quantity for the current state and `pairs`.
    ///
    /// The pair list is validated once against the particle count; all
    /// derived buffers are overwritten.
    pub fn compute_rates(&mut self, pairs: &[NeighborPair]) -> Result<RateSummary, KernelError> {
        let gravity = self.gravity();
        let c = &self.constants;
        let b = &mut self.buffers;
        let s = &mut self.scratch;

        b.check_shape()?;
        let list = PairList::new(pairs, b.len())?.with_execution(self.execution);
        b.reset_derived();

        sph::kernel_value_sum(
            &list,
            c,
            Accumulators::new(&mut b.kernel_value, &mut b.kernel_value_list)
                .with_scratch(&mut s.scalars),
        )?;
        sph::kernel_gradient_sum(
            &list,
            c,
            &b.position,
            Accumulators::new(&mut b.kernel_gradient, &mut b.kernel_gradient_list)
                .with_scratch(&mut s.vectors),
        )?;

        eos::compute_pressures(c, &b.density, &mut b.pressure)?;

        let fields = ParticleFields {
            positions: &b.position,
            velocities: &b.velocity,
            densities: &b.density,
        };

        if self.density_diffusion {
            continuity::density_rate_diffusive(
                &list,
                c,
                &fields,
                &b.kernel_gradient_list,
                &b.motion_limiter,
                Accumulators::new(&mut b.density_rate, &mut b.density_rate_list)
                    .with_scratch(&mut s.scalars),
            )?;
        } else {
            continuity::density_rate(
                &list,
                c,
                &fields,
                &b.kernel_gradient_list,
                Accumulators::new(&mut b.density_rate, &mut b.density_rate_list)
                    .with_scratch(&mut s.scalars),
            )?;
        }

        momentum::acceleration_rate(
            &list,
            c,
            &b.density,
            &b.pressure,
            &b.kernel_gradient_list,
            Accumulators::new(&mut b.acceleration, &mut b.acceleration_list)
                .with_scratch(&mut s.vectors),
        )?;

        viscosity::viscosity_rate(
            &list,
            c,
            &fields,
            &b.kernel_gradient_list,
            Accumulators::new(&mut b.viscous_acceleration, &mut b.viscous_acceleration_list)
                .with_scratch(&mut s.vectors),
        )?;

        for (a, viscous) in b.acceleration.iter_mut().zip(&b.viscous_acceleration) {
            *a += *viscous + gravity;
        }

        let summary = RateSummary {
            pair_count: list.len(),
            max_speed: b.velocity.iter().map(|v| v.length()).fold(0.0, f64::max),
            max_acceleration: b.acceleration.iter().map(|a| a.length()).fold(0.0, f64::max),
            min_density: b.density.iter().copied().fold(f64::INFINITY, f64::min),
            max_density: b.density.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        tracing::debug!(
            "rates: {} pairs, |v|max={:.4}, |a|max={:.4}, rho=[{:.3}, {:.3}]",
            summary.pair_count,
            summary.max_speed,
            summary.max_acceleration,
            summary.min_density,
            summary.max_density
        );
        Ok(summary)
    }

    /// Stable timestep for the current velocities and accelerations.
    pub fn estimate_timestep(&self, cfl_number: f64) -> f64 {
        timestep::estimate_timestep(
            &self.constants,
            self.dimension,
            cfl_number,
            &self.buffers.velocity,
            &self.buffers.acceleration,
        )
    }
}
