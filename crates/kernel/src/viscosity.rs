//! Monaghan artificial viscosity.
//!
//! ```text
//! mu_ij = h (v_ij . x_ij) / (|x_ij|^2 + eta^2),   eta^2 = (0.1 h)^2
//! Pi_ij = -alpha c0 mu_ij / rho_ij                when v_ij . x_ij < 0
//!       = 0                                       otherwise
//! a_i  += -m0 Pi_ij grad_i W_ij,   a_j -= the same
//! ```
//!
//! Only approaching pairs are damped. The result is kept apart from the
//! pressure term so the two can be tested and toggled independently.

use glam::DVec3;

use crate::constants::PhysicalConstants;
use crate::error::{check_len, KernelError};
use crate::pairs::{aggregate, Accumulators, PairContribution, PairList};
use crate::particle::ParticleFields;

/// Viscous acceleration per particle and per interaction.
///
/// `gradients` is the per-interaction `grad_i W_ij` list from
/// [`kernel_gradient_sum`](crate::sph::kernel_gradient_sum). The
/// per-interaction output holds the acceleration applied to particle `i`.
pub fn viscosity_rate(
    pairs: &PairList<'_>,
    constants: &PhysicalConstants,
    fields: &ParticleFields<'_>,
    gradients: &[DVec3],
    out: Accumulators<'_, DVec3>,
) -> Result<(), KernelError> {
    fields.check(pairs.particle_count())?;
    check_len("kernel gradient list", pairs.len(), gradients.len())?;

    let h = constants.h;
    let eta_sq = (0.1 * h) * (0.1 * h);
    let alpha = constants.alpha;
    let c0 = constants.c0;
    let m0 = constants.m0;

    aggregate(pairs, out, |k, pair| {
        let (i, j) = (pair.i, pair.j);
        let v_ij = fields.velocities[i] - fields.velocities[j];
        let x_ij = fields.positions[i] - fields.positions[j];
        let rho_ij = 0.5 * (fields.densities[i] + fields.densities[j]);

        let vx = v_ij.dot(x_ij);
        let pi_ij = if vx < 0.0 {
            let mu_ij = h * vx / (x_ij.dot(x_ij) + eta_sq);
            -alpha * c0 * mu_ij / rho_ij
        } else {
            0.0
        };

        PairContribution::antisymmetric(-pi_ij * m0 * gradients[k])
    })
}
