//! Momentum equation: pressure acceleration.
//!
//! ```text
//! Pfac  = (P_i + P_j) / (rho_i rho_j)
//! a_i  += -m Pfac grad_i W_ij,   a_j -= the same
//! ```
//!
//! Viscous dissipation is not included; see [`crate::viscosity`].

use glam::DVec3;

use crate::constants::PhysicalConstants;
use crate::error::{check_len, KernelError};
use crate::pairs::{aggregate, Accumulators, PairContribution, PairList};

/// Pressure acceleration per particle and per interaction.
///
/// `pressures` comes from [`compute_pressures`](crate::eos::compute_pressures)
/// for the same `densities`. The per-interaction output holds the
/// acceleration applied to particle `i`.
pub fn acceleration_rate(
    pairs: &PairList<'_>,
    constants: &PhysicalConstants,
    densities: &[f64],
    pressures: &[f64],
    gradients: &[DVec3],
    out: Accumulators<'_, DVec3>,
) -> Result<(), KernelError> {
    let n = pairs.particle_count();
    check_len("densities", n, densities.len())?;
    check_len("pressures", n, pressures.len())?;
    check_len("kernel gradient list", pairs.len(), gradients.len())?;

    let m = constants.m0;
    aggregate(pairs, out, |k, pair| {
        let (i, j) = (pair.i, pair.j);
        let p_fac = (pressures[i] + pressures[j]) / (densities[i] * densities[j]);
        PairContribution::antisymmetric(-m * p_fac * gradients[k])
    })
}
