//! Per-run physical constants.
//!
//! Constructed once at configuration time and read-only for the rest of the
//! run. All units are SI.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// Index of the vertical ("up") axis. Gravity acts along `-UP_AXIS` and the
/// hydrostatic correction of the diffusive continuity term uses this
/// component of the separation vector.
pub const UP_AXIS: usize = 2;

/// Spatial dimensionality used to normalize the smoothing kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dimension {
    /// Planar simulation (particles share one coordinate).
    Two,
    /// Full 3D simulation.
    #[default]
    Three,
}

impl Dimension {
    /// Number of spatial dimensions.
    pub fn count(self) -> i32 {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }

    /// Normalization `alpha_D` of the Wendland quintic kernel with support `2h`.
    ///
    /// ```text
    /// 2D: alpha_D = 7 / (4 pi h^2)
    /// 3D: alpha_D = 21 / (16 pi h^3)
    /// ```
    pub fn wendland_normalization(self, h: f64) -> f64 {
        match self {
            Dimension::Two => 7.0 / (4.0 * PI * h * h),
            Dimension::Three => 21.0 / (16.0 * PI * h * h * h),
        }
    }
}

/// Immutable scalar constants shared by every physics term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Smoothing length `h` (m). Kernel support radius is `2h`.
    pub h: f64,
    /// Kernel normalization `alpha_D` (already scaled by `h^-D`).
    pub alpha_d: f64,
    /// Reference speed of sound `c0` (m/s).
    pub c0: f64,
    /// Tait exponent `gamma`.
    pub gamma: f64,
    /// Reference density `rho0` (kg/m^3).
    pub rho0: f64,
    /// Uniform particle mass `m0` (kg).
    pub m0: f64,
    /// Artificial viscosity coefficient `alpha`.
    pub alpha: f64,
    /// Density diffusion coefficient `delta_phi`.
    pub delta: f64,
    /// Gravitational acceleration magnitude `g` (m/s^2).
    pub g: f64,
}

impl PhysicalConstants {
    /// Kernel support radius `2h`.
    pub fn support_radius(&self) -> f64 {
        2.0 * self.h
    }

    /// Tait stiffness `B = c0^2 rho0 / gamma`.
    pub fn tait_stiffness(&self) -> f64 {
        self.c0 * self.c0 * self.rho0 / self.gamma
    }

    /// Check every constant against its admissible range.
    pub fn validate(&self) -> Result<(), KernelError> {
        let fields = [
            self.h, self.alpha_d, self.c0, self.gamma, self.rho0, self.m0, self.alpha,
            self.delta, self.g,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(KernelError::InvalidConstants { reason: "all constants must be finite" });
        }
        if self.h <= 0.0 {
            return Err(KernelError::InvalidConstants { reason: "smoothing length must be positive" });
        }
        if self.alpha_d <= 0.0 {
            return Err(KernelError::InvalidConstants { reason: "kernel normalization must be positive" });
        }
        if self.c0 <= 0.0 {
            return Err(KernelError::InvalidConstants { reason: "speed of sound must be positive" });
        }
        if self.gamma <= 0.0 {
            return Err(KernelError::InvalidConstants { reason: "Tait exponent must be positive" });
        }
        if self.rho0 <= 0.0 {
            return Err(KernelError::InvalidConstants { reason: "reference density must be positive" });
        }
        if self.m0 <= 0.0 {
            return Err(KernelError::InvalidConstants { reason: "particle mass must be positive" });
        }
        if self.alpha < 0.0 {
            return Err(KernelError::InvalidConstants { reason: "viscosity coefficient must be non-negative" });
        }
        if self.delta < 0.0 {
            return Err(KernelError::InvalidConstants { reason: "diffusion coefficient must be non-negative" });
        }
        if self.g < 0.0 {
            return Err(KernelError::InvalidConstants { reason: "gravity magnitude must be non-negative" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> PhysicalConstants {
        let h = 0.02;
        PhysicalConstants {
            h,
            alpha_d: Dimension::Three.wendland_normalization(h),
            c0: 20.0,
            gamma: 7.0,
            rho0: 1000.0,
            m0: 1000.0 * 0.015_f64.powi(3),
            alpha: 0.01,
            delta: 0.1,
            g: 9.81,
        }
    }

    #[test]
    fn water_constants_are_valid() {
        assert!(water().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_smoothing_length() {
        let mut c = water();
        c.h = 0.0;
        assert!(matches!(c.validate(), Err(KernelError::InvalidConstants { .. })));
    }

    #[test]
    fn rejects_nan() {
        let mut c = water();
        c.c0 = f64::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn zero_viscosity_and_diffusion_are_allowed() {
        let mut c = water();
        c.alpha = 0.0;
        c.delta = 0.0;
        c.g = 0.0;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn normalization_scales_with_dimension() {
        let h = 0.5;
        let a2 = Dimension::Two.wendland_normalization(h);
        let a3 = Dimension::Three.wendland_normalization(h);
        assert!((a2 - 7.0 / (4.0 * PI * 0.25)).abs() < 1.0e-12);
        assert!((a3 - 21.0 / (16.0 * PI * 0.125)).abs() < 1.0e-12);
    }

    #[test]
    fn tait_stiffness_matches_definition() {
        let c = water();
        assert!((c.tait_stiffness() - 400.0 * 1000.0 / 7.0).abs() < 1.0e-9);
    }
}
