//! Configuration parsing and validation for SPH simulations

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fs;
use wcsph_kernel::eos::{WATER_GAMMA, WATER_REST_DENSITY};
use wcsph_kernel::{Dimension, Execution, PhysicalConstants};

/// Main simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Human-readable simulation name
    pub name: String,
    /// 2D (x-z plane) or 3D
    #[serde(default)]
    pub dimension: Dimension,
    /// Tank interior; boundary layers are placed outside it
    pub domain: Bounds,
    /// Initial fluid block, inside `domain`
    pub fluid: Bounds,
    /// Initial inter-particle distance (meters)
    pub particle_spacing: f64,
    /// Smoothing length as a multiple of the particle spacing
    #[serde(default = "default_smoothing_ratio")]
    pub smoothing_ratio: f64,
    /// Reference density (kg/m^3)
    #[serde(default = "default_rest_density")]
    pub rest_density: f64,
    /// Reference speed of sound (m/s)
    pub speed_of_sound: f64,
    /// Tait exponent
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// Artificial viscosity coefficient
    #[serde(default = "default_viscosity_alpha")]
    pub viscosity_alpha: f64,
    /// Density diffusion coefficient
    #[serde(default = "default_diffusion_delta")]
    pub diffusion_delta: f64,
    /// Gravitational acceleration magnitude (m/s^2), acting along -z
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// Use the diffusive continuity equation
    #[serde(default = "default_true")]
    pub density_diffusion: bool,
    /// Serial or parallel pair loops
    #[serde(default)]
    pub execution: Execution,
    /// CFL condition for adaptive timestep
    #[serde(default = "default_cfl")]
    pub cfl_number: f64,
    /// Fixed particle layers on the floor and side walls
    #[serde(default = "default_boundary_layers")]
    pub boundary_layers: usize,
    /// Stop after this many timesteps
    pub max_timesteps: Option<u64>,
    /// Stop after this much simulated time (seconds)
    pub max_time: Option<f64>,
    /// Halved-timestep retries allowed for one step
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Steps between progress log lines
    #[serde(default = "default_log_interval")]
    pub log_interval: u64,
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum corner [x, y, z]
    pub min: [f64; 3],
    /// Maximum corner [x, y, z]
    pub max: [f64; 3],
}

impl Bounds {
    /// Minimum corner as a vector.
    pub fn min_corner(&self) -> DVec3 {
        DVec3::from_array(self.min)
    }

    /// Maximum corner as a vector.
    pub fn max_corner(&self) -> DVec3 {
        DVec3::from_array(self.max)
    }

    fn contains(&self, other: &Bounds) -> bool {
        (0..3).all(|a| other.min[a] >= self.min[a] && other.max[a] <= self.max[a])
    }
}

// Default values
fn default_smoothing_ratio() -> f64 {
    1.3
}

fn default_rest_density() -> f64 {
    WATER_REST_DENSITY
}

fn default_gamma() -> f64 {
    WATER_GAMMA
}

fn default_viscosity_alpha() -> f64 {
    0.01
}

fn default_diffusion_delta() -> f64 {
    0.1
}

fn default_gravity() -> f64 {
    9.81
}

fn default_true() -> bool {
    true
}

fn default_cfl() -> f64 {
    0.2
}

fn default_boundary_layers() -> usize {
    2
}

fn default_max_retries() -> u32 {
    4
}

fn default_log_interval() -> u64 {
    100
}

impl SimulationConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &str) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path, e))?;
        Self::from_json(&contents)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let config: SimulationConfig = serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse config JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        const AXES: [char; 3] = ['x', 'y', 'z'];
        for (a, axis) in AXES.iter().enumerate() {
            if self.domain.min[a] >= self.domain.max[a] {
                return Err(format!("Domain min.{axis} must be less than max.{axis}"));
            }
            if self.fluid.min[a] >= self.fluid.max[a] {
                return Err(format!("Fluid min.{axis} must be less than max.{axis}"));
            }
        }
        if !self.domain.contains(&self.fluid) {
            return Err("Fluid block must lie inside the domain".to_string());
        }

        if self.particle_spacing <= 0.0 {
            return Err("Particle spacing must be positive".to_string());
        }
        if self.smoothing_ratio <= 0.0 {
            return Err("Smoothing ratio must be positive".to_string());
        }
        if self.rest_density <= 0.0 {
            return Err("Rest density must be positive".to_string());
        }
        if self.speed_of_sound <= 0.0 {
            return Err("Speed of sound must be positive".to_string());
        }
        if self.gamma <= 0.0 {
            return Err("Tait exponent must be positive".to_string());
        }
        if self.viscosity_alpha < 0.0 {
            return Err("Viscosity coefficient must be non-negative".to_string());
        }
        if self.diffusion_delta < 0.0 {
            return Err("Diffusion coefficient must be non-negative".to_string());
        }
        if self.gravity < 0.0 {
            return Err("Gravity magnitude must be non-negative".to_string());
        }

        if self.cfl_number <= 0.0 || self.cfl_number > 1.0 {
            return Err("CFL number must be in range (0, 1]".to_string());
        }
        if self.log_interval == 0 {
            return Err("log_interval must be at least 1".to_string());
        }

        if let Some(max_timesteps) = self.max_timesteps {
            if max_timesteps == 0 {
                return Err("max_timesteps must be at least 1".to_string());
            }
        }
        if let Some(max_time) = self.max_time {
            if max_time <= 0.0 {
                return Err("max_time must be positive".to_string());
            }
        }
        if self.max_timesteps.is_none() && self.max_time.is_none() {
            return Err("One of max_timesteps or max_time must be set".to_string());
        }

        Ok(())
    }

    /// Calculate smoothing length from particle spacing
    pub fn smoothing_length(&self) -> f64 {
        self.smoothing_ratio * self.particle_spacing
    }

    /// Mass of one particle: `rho0 * dx^D`
    pub fn particle_mass(&self) -> f64 {
        self.rest_density * self.particle_spacing.powi(self.dimension.count())
    }

    /// Constants shared by every physics term for this run
    pub fn physical_constants(&self) -> PhysicalConstants {
        let h = self.smoothing_length();
        PhysicalConstants {
            h,
            alpha_d: self.dimension.wendland_normalization(h),
            c0: self.speed_of_sound,
            gamma: self.gamma,
            rho0: self.rest_density,
            m0: self.particle_mass(),
            alpha: self.viscosity_alpha,
            delta: self.diffusion_delta,
            g: self.gravity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "name": "test",
        "domain": { "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 1.0] },
        "fluid": { "min": [0.0, 0.0, 0.0], "max": [0.5, 1.0, 0.5] },
        "particle_spacing": 0.01,
        "speed_of_sound": 20.0,
        "max_timesteps": 10
    }"#;

    fn minimal() -> SimulationConfig {
        SimulationConfig::from_json(MINIMAL).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = minimal();
        assert_eq!(config.dimension, Dimension::Three);
        assert_eq!(config.execution, Execution::Serial);
        assert!(config.density_diffusion);
        assert_eq!(config.boundary_layers, 2);
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.log_interval, 100);
        assert_eq!(config.cfl_number, 0.2);
        assert_eq!(config.gravity, 9.81);
        assert_eq!(config.rest_density, WATER_REST_DENSITY);
        assert_eq!(config.gamma, WATER_GAMMA);
        assert!(config.max_time.is_none());
    }

    #[test]
    fn test_smoothing_length() {
        let config = minimal();
        assert!((config.smoothing_length() - 0.013).abs() < 1e-12);
    }

    #[test]
    fn test_physical_constants() {
        let mut config = minimal();
        let c = config.physical_constants();
        assert!(c.validate().is_ok());
        assert!((c.m0 - 1000.0 * 1.0e-6).abs() < 1e-15);
        assert_eq!(c.alpha_d, Dimension::Three.wendland_normalization(c.h));

        config.dimension = Dimension::Two;
        let c = config.physical_constants();
        assert!((c.m0 - 1000.0 * 1.0e-4).abs() < 1e-15);
    }

    #[test]
    fn test_parse_enums() {
        let json = MINIMAL.replace(
            "\"max_timesteps\": 10",
            "\"max_timesteps\": 10, \"dimension\": \"Two\", \"execution\": \"Parallel\"",
        );
        let config = SimulationConfig::from_json(&json).unwrap();
        assert_eq!(config.dimension, Dimension::Two);
        assert_eq!(config.execution, Execution::Parallel);
    }

    #[test]
    fn test_validation_domain_bounds() {
        let mut config = minimal();
        config.domain.min[0] = 2.0;
        assert!(config.validate().is_err());

        config.domain.min[0] = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_fluid_inside_domain() {
        let mut config = minimal();
        config.fluid.max[2] = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.contains("inside the domain"), "{err}");
    }

    #[test]
    fn test_validation_particle_spacing() {
        let mut config = minimal();
        config.particle_spacing = -0.01;
        assert!(config.validate().is_err());

        config.particle_spacing = 0.01;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_cfl_range() {
        let mut config = minimal();
        config.cfl_number = 0.0;
        assert!(config.validate().is_err());
        config.cfl_number = 1.5;
        assert!(config.validate().is_err());
        config.cfl_number = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_requires_stop_condition() {
        let mut config = minimal();
        config.max_timesteps = None;
        assert!(config.validate().is_err());
        config.max_time = Some(0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let err = SimulationConfig::from_json(r#"{ "name": "x" }"#).unwrap_err();
        assert!(err.starts_with("Failed to parse config JSON"), "{err}");
    }
}
