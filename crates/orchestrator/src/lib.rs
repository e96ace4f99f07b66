//! Orchestration Layer
//!
//! This crate drives the pairwise interaction engine over time:
//! - JSON configuration loading and validation
//! - Initial tank setup (fluid block plus fixed wall particles)
//! - Kick-drift-kick time marching with adaptive, retried timesteps

#![warn(missing_docs)]

pub mod config;
pub mod domain;
pub mod runner;

pub use config::SimulationConfig;
pub use runner::{DriverError, RunSummary, RunnerOptions, SimulationRunner, StepReport};

/// Create a complete simulation from a configuration file
///
/// This function performs the full simulation setup pipeline:
/// 1. Load and validate the configuration
/// 2. Set up the tank with fluid and boundary particles
/// 3. Create the CPU kernel and wrap it in a `SimulationRunner`
///
/// # Example
/// ```no_run
/// use wcsph_orchestrator::create_simulation;
///
/// let mut runner = create_simulation("config/dam_break.json")?;
/// let summary = runner.run()?;
/// println!("{} steps, t = {:.3}s", summary.steps, summary.sim_time);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn create_simulation(config_path: &str) -> Result<SimulationRunner, DriverError> {
    tracing::info!("Creating simulation from config: {}", config_path);

    let config = SimulationConfig::load(config_path).map_err(DriverError::Config)?;
    tracing::info!("Configuration loaded: {}", config.name);

    let buffers = domain::setup_tank(&config);
    SimulationRunner::from_config(&config, buffers)
}
