//! Tait equation of state for weakly-compressible SPH.
//!
//! All units are SI: meters, kg, seconds, Pascals.

use crate::constants::PhysicalConstants;
use crate::error::{check_len, KernelError};

/// Rest density for liquid water (kg/m^3); the default `rest_density`.
pub const WATER_REST_DENSITY: f64 = 1000.0;

/// Tait equation exponent (gamma) for water -- standard WCSPH value and
/// the default `gamma`.
pub const WATER_GAMMA: f64 = 7.0;

/// Tait equation of state.
///
/// ```text
/// P = (c0^2 rho0 / gamma) * ((rho / rho0)^gamma - 1)
/// ```
///
/// Gauge pressure: zero at `rho0`, negative (tension) below it.
#[inline]
pub fn tait_pressure(density: f64, c0: f64, gamma: f64, rho0: f64) -> f64 {
    let b = c0 * c0 * rho0 / gamma;
    b * ((density / rho0).powf(gamma) - 1.0)
}

/// Evaluate the equation of state for every particle into `pressures`.
///
/// A density that is not strictly positive (including NaN) means the step
/// has gone unstable upstream; it is reported instead of producing NaN
/// pressures.
pub fn compute_pressures(
    constants: &PhysicalConstants,
    densities: &[f64],
    pressures: &mut [f64],
) -> Result<(), KernelError> {
    check_len("pressures", densities.len(), pressures.len())?;
    for (particle, (&rho, p)) in densities.iter().zip(pressures.iter_mut()).enumerate() {
        if !(rho > 0.0 && rho.is_finite()) {
            return Err(KernelError::DomainViolation { particle, density: rho });
        }
        *p = tait_pressure(rho, constants.c0, constants.gamma, constants.rho0);
    }
    Ok(())
}
