//! Time-marching driver
//!
//! `SimulationRunner` advances a [`CpuKernel`] with a kick-drift-kick
//! scheme and an adaptive timestep. A step whose rate evaluation hits a
//! non-physical density is rolled back and retried with half the timestep.

use std::fmt;
use std::time::Instant;

use glam::DVec3;
use wcsph_kernel::{
    CpuKernel, KernelError, NeighborGrid, NeighborPair, ParticleBuffers, RateSummary,
};

use crate::config::SimulationConfig;

/// Failure of the time-marching driver.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverError {
    /// A kernel operation failed and cannot be retried.
    Kernel(KernelError),
    /// A step kept producing non-physical densities after every retry.
    RetriesExhausted {
        /// Step that could not be completed (1-based).
        step: u64,
        /// Last timestep tried (seconds).
        dt: f64,
    },
    /// Configuration could not be loaded or used.
    Config(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kernel(e) => write!(f, "kernel error: {e}"),
            Self::RetriesExhausted { step, dt } => {
                write!(f, "step {step} failed after all retries (last dt={dt:.3e}s)")
            }
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Kernel(e) => Some(e),
            _ => None,
        }
    }
}

impl From<KernelError> for DriverError {
    fn from(e: KernelError) -> Self {
        Self::Kernel(e)
    }
}

/// Time-marching settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerOptions {
    /// CFL number applied to the timestep estimate.
    pub cfl_number: f64,
    /// Halved-timestep retries allowed per step.
    pub max_retries: u32,
    /// Stop after this many timesteps.
    pub max_timesteps: Option<u64>,
    /// Stop after this much simulated time (seconds).
    pub max_time: Option<f64>,
    /// Steps between progress log lines.
    pub log_interval: u64,
}

impl RunnerOptions {
    /// Settings taken from a validated configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            cfl_number: config.cfl_number,
            max_retries: config.max_retries,
            max_timesteps: config.max_timesteps,
            max_time: config.max_time,
            log_interval: config.log_interval.max(1),
        }
    }
}

/// Outcome of one accepted step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Step number (1-based).
    pub step: u64,
    /// Simulated time after the step (seconds).
    pub time: f64,
    /// Timestep actually used (seconds).
    pub dt: f64,
    /// Number of halvings needed before the step was accepted.
    pub retries: u32,
    /// Rates at the end of the step.
    pub rates: RateSummary,
}

/// Outcome of a full run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Steps completed.
    pub steps: u64,
    /// Simulated time reached (seconds).
    pub sim_time: f64,
    /// Total halved-timestep retries over the run.
    pub retries: u64,
    /// Smallest accepted timestep (seconds).
    pub min_dt: f64,
    /// Largest accepted timestep (seconds).
    pub max_dt: f64,
    /// Wall-clock duration of the run (seconds).
    pub wall_time: f64,
}

/// Drives a kernel forward in time.
pub struct SimulationRunner {
    kernel: CpuKernel,
    grid: NeighborGrid,
    pairs: Vec<NeighborPair>,
    checkpoint: ParticleBuffers,
    options: RunnerOptions,
    sim_time: f64,
    step_count: u64,
    retry_count: u64,
    rates_ready: bool,
}

impl SimulationRunner {
    /// Create a runner over `kernel`, finding neighbors with `grid`.
    pub fn new(kernel: CpuKernel, grid: NeighborGrid, options: RunnerOptions) -> Self {
        Self {
            kernel,
            grid,
            pairs: Vec::new(),
            checkpoint: ParticleBuffers::new(),
            options,
            sim_time: 0.0,
            step_count: 0,
            retry_count: 0,
            rates_ready: false,
        }
    }

    /// Build a runner from a configuration and an initial particle set.
    ///
    /// The neighbor grid covers the domain grown by the wall thickness and
    /// one support radius.
    pub fn from_config(
        config: &SimulationConfig,
        buffers: ParticleBuffers,
    ) -> Result<Self, DriverError> {
        config.validate().map_err(DriverError::Config)?;
        let constants = config.physical_constants();
        let kernel = CpuKernel::new(buffers, constants, config.dimension)?
            .with_density_diffusion(config.density_diffusion)
            .with_execution(config.execution);

        let radius = constants.support_radius();
        let margin = DVec3::splat(config.boundary_layers as f64 * config.particle_spacing + radius);
        let grid = NeighborGrid::new(
            radius,
            config.domain.min_corner() - margin,
            config.domain.max_corner() + margin,
        )
        .ok_or_else(|| DriverError::Config("Support radius must be positive".to_string()))?;

        tracing::info!(
            "Runner ready: {} particles, h={:.4e}, c0={}, {:?}",
            kernel.particle_count(),
            constants.h,
            constants.c0,
            config.execution
        );
        Ok(Self::new(kernel, grid, RunnerOptions::from_config(config)))
    }

    /// The kernel and its particle buffers.
    pub fn kernel(&self) -> &CpuKernel {
        &self.kernel
    }

    /// Current simulated time (seconds).
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Number of completed steps.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Pair list of the most recent rate evaluation.
    pub fn pairs(&self) -> &[NeighborPair] {
        &self.pairs
    }

    /// Rebuild the pair list and recompute every rate for the current state.
    fn refresh_rates(&mut self) -> Result<RateSummary, KernelError> {
        let radius = self.kernel.constants().support_radius();
        let positions = &self.kernel.buffers().position;
        self.grid.update(positions);
        self.grid.collect_pairs(positions, radius, &mut self.pairs);
        self.kernel.compute_rates(&self.pairs)
    }

    /// Half-kick, drift, density update, new rates, second half-kick.
    fn advance(&mut self, dt: f64) -> Result<RateSummary, KernelError> {
        let half = 0.5 * dt;
        {
            let b = self.kernel.buffers_mut();
            let moving = b
                .position
                .iter_mut()
                .zip(b.velocity.iter_mut())
                .zip(&b.acceleration)
                .zip(&b.motion_limiter);
            for (((x, v), a), &limiter) in moving {
                if limiter != 0.0 {
                    *v += *a * half;
                    *x += *v * dt;
                }
            }
            for (rho, drho) in b.density.iter_mut().zip(&b.density_rate) {
                *rho += drho * dt;
            }
        }

        let rates = self.refresh_rates()?;

        let b = self.kernel.buffers_mut();
        let kick = b.velocity.iter_mut().zip(&b.acceleration).zip(&b.motion_limiter);
        for ((v, a), &limiter) in kick {
            if limiter != 0.0 {
                *v += *a * half;
            }
        }
        Ok(rates)
    }

    /// Advance one timestep.
    ///
    /// On a [`KernelError::DomainViolation`] the state is restored from the
    /// checkpoint and the step is retried with half the timestep, up to
    /// `max_retries` times. Any other kernel error restores the checkpoint
    /// and is returned as is.
    pub fn step(&mut self) -> Result<StepReport, DriverError> {
        if !self.rates_ready {
            self.refresh_rates()?;
            self.rates_ready = true;
        }

        let mut dt = self.kernel.estimate_timestep(self.options.cfl_number);
        self.checkpoint.clone_from(self.kernel.buffers());
        let step = self.step_count + 1;
        let mut retries = 0;

        loop {
            match self.advance(dt) {
                Ok(rates) => {
                    self.step_count = step;
                    self.sim_time += dt;
                    self.retry_count += u64::from(retries);
                    return Ok(StepReport {
                        step,
                        time: self.sim_time,
                        dt,
                        retries,
                        rates,
                    });
                }
                Err(KernelError::DomainViolation { particle, density }) => {
                    self.kernel.buffers_mut().clone_from(&self.checkpoint);
                    if retries >= self.options.max_retries {
                        self.rates_ready = false;
                        return Err(DriverError::RetriesExhausted { step, dt });
                    }
                    retries += 1;
                    tracing::warn!(
                        "Step {} rejected: density {:.4e} at particle {} with dt={:.3e}s, retrying ({}/{})",
                        step,
                        density,
                        particle,
                        dt,
                        retries,
                        self.options.max_retries
                    );
                    dt *= 0.5;
                    self.refresh_rates()?;
                }
                Err(e) => {
                    self.kernel.buffers_mut().clone_from(&self.checkpoint);
                    self.rates_ready = false;
                    return Err(e.into());
                }
            }
        }
    }

    /// Step until `max_timesteps` or `max_time` is reached.
    pub fn run(&mut self) -> Result<RunSummary, DriverError> {
        let start_wall_time = Instant::now();
        let first_step = self.step_count;
        let first_retries = self.retry_count;
        let mut min_dt = f64::INFINITY;
        let mut max_dt = 0.0_f64;

        tracing::info!(
            "Starting run: {} particles, max_timesteps={:?}, max_time={:?}",
            self.kernel.particle_count(),
            self.options.max_timesteps,
            self.options.max_time
        );

        loop {
            if let Some(max_steps) = self.options.max_timesteps {
                if self.step_count >= max_steps {
                    tracing::info!("Simulation finished: reached max_timesteps = {}", max_steps);
                    break;
                }
            }
            if let Some(max_t) = self.options.max_time {
                if self.sim_time >= max_t {
                    tracing::info!("Simulation finished: reached max_time = {:.3}s", max_t);
                    break;
                }
            }
            if self.options.max_timesteps.is_none() && self.options.max_time.is_none() {
                tracing::warn!("No stopping condition set; nothing to run");
                break;
            }

            let report = self.step()?;
            min_dt = min_dt.min(report.dt);
            max_dt = max_dt.max(report.dt);

            if report.step % self.options.log_interval == 0 {
                tracing::info!(
                    "Step {}: sim_time={:.4}s, dt={:.3e}s, |v|max={:.3}, rho=[{:.2}, {:.2}], wall_time={:.2}s",
                    report.step,
                    report.time,
                    report.dt,
                    report.rates.max_speed,
                    report.rates.min_density,
                    report.rates.max_density,
                    start_wall_time.elapsed().as_secs_f64()
                );
            }
        }

        Ok(RunSummary {
            steps: self.step_count - first_step,
            sim_time: self.sim_time,
            retries: self.retry_count - first_retries,
            min_dt,
            max_dt,
            wall_time: start_wall_time.elapsed().as_secs_f64(),
        })
    }
}
