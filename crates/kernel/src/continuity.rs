//! Continuity equation: density rate with and without delta-SPH diffusion.
//!
//! The plain form per pair:
//! ```text
//! drho_i += rho_i * ((m / rho_j) v_ij) . grad_i W_ij
//! drho_j += rho_j * ((m / rho_i) v_ji) . grad_j W_ij
//! ```
//! with `v_ji = -v_ij` and `grad_j W_ij = -grad_i W_ij`. The two sides use
//! different density weights, so `j` is not simply the negation of `i`.
//!
//! The diffusive form adds a density-diffusion term (Molteni & Colagrossi
//! 2009, with the hydrostatic correction of Fourtakas et al. 2019) gated per
//! particle by the motion limiter.

use glam::DVec3;

use crate::constants::{PhysicalConstants, UP_AXIS};
use crate::error::{check_len, KernelError};
use crate::pairs::{aggregate, Accumulators, PairContribution, PairList};
use crate::particle::ParticleFields;

/// `i` and `j` contributions of the plain continuity term for one pair.
#[inline]
fn continuity_pair(m: f64, rho_i: f64, rho_j: f64, v_ij: DVec3, grad_ij: DVec3) -> (f64, f64) {
    let to_i = rho_i * ((m / rho_j) * v_ij).dot(grad_ij);
    let to_j = rho_j * ((m / rho_i) * -v_ij).dot(-grad_ij);
    (to_i, to_j)
}

/// Plain continuity equation.
///
/// The per-interaction list stores the `i`-side rate only.
pub fn density_rate(
    pairs: &PairList<'_>,
    constants: &PhysicalConstants,
    fields: &ParticleFields<'_>,
    gradients: &[DVec3],
    out: Accumulators<'_, f64>,
) -> Result<(), KernelError> {
    fields.check(pairs.particle_count())?;
    check_len("kernel gradient list", pairs.len(), gradients.len())?;

    let m = constants.m0;
    aggregate(pairs, out, |k, pair| {
        let (i, j) = (pair.i, pair.j);
        let v_ij = fields.velocities[i] - fields.velocities[j];
        let (to_i, to_j) =
            continuity_pair(m, fields.densities[i], fields.densities[j], v_ij, gradients[k]);
        PairContribution {
            to_i,
            to_j,
            recorded: to_i,
        }
    })
}

/// Continuity equation with density diffusion.
///
/// ```text
/// Cb      = c0^2 rho0 / gamma
/// drhop   = rho0 (1 + rho0 g dz / Cb)^(1/gamma) - rho0     (dz = up component of x_ij)
/// psi_i   = 2 h delta c0 (rho_j - rho_i - drhop_i) / (r^2 + eta^2)
/// delta_i = psi_i * (-x_ij . grad_i W_ij) * m0 / rho_j
/// ```
/// mirrored for `j` with `dz -> -dz` and `i <-> j`. Each side adds
/// `delta * motion_limiter[particle]`, so a zero entry removes the
/// diffusive correction for that particle and leaves its plain continuity
/// term intact. The per-interaction list stores the `i`-side total
/// (continuity plus gated diffusion).
///
/// Fails with [`KernelError::HydrostaticRange`] if a pair's vertical span
/// reaches `B / (rho0 g)`, where `drhop` has no real value.
pub fn density_rate_diffusive(
    pairs: &PairList<'_>,
    constants: &PhysicalConstants,
    fields: &ParticleFields<'_>,
    gradients: &[DVec3],
    motion_limiter: &[f64],
    out: Accumulators<'_, f64>,
) -> Result<(), KernelError> {
    fields.check(pairs.particle_count())?;
    check_len("motion_limiter", pairs.particle_count(), motion_limiter.len())?;
    check_len("kernel gradient list", pairs.len(), gradients.len())?;

    let h = constants.h;
    let m0 = constants.m0;
    let c0 = constants.c0;
    let rho0 = constants.rho0;
    let inv_gamma = 1.0 / constants.gamma;
    let eta_sq = (0.1 * h) * (0.1 * h);
    let ddt_gz = rho0 * constants.g / constants.tait_stiffness();
    let ddt_kh = 2.0 * h * constants.delta;

    let hydrostatic_offset = |dz: f64| rho0 * (1.0 + ddt_gz * dz).powf(inv_gamma) - rho0;

    // Both sides evaluate the offset, at dz and -dz.
    for (pair, record) in pairs.as_slice().iter().enumerate() {
        let dz = fields.positions[record.i][UP_AXIS] - fields.positions[record.j][UP_AXIS];
        if !(ddt_gz * dz.abs() < 1.0) {
            return Err(KernelError::HydrostaticRange { pair, dz });
        }
    }

    aggregate(pairs, out, |k, pair| {
        let (i, j) = (pair.i, pair.j);
        let rho_i = fields.densities[i];
        let rho_j = fields.densities[j];
        let v_ij = fields.velocities[i] - fields.velocities[j];
        let x_ij = fields.positions[i] - fields.positions[j];
        let grad = gradients[k];

        let (cont_i, cont_j) = continuity_pair(m0, rho_i, rho_j, v_ij, grad);

        let r_sq = x_ij.dot(x_ij);
        let dot3 = -x_ij.dot(grad);
        let dz = x_ij[UP_AXIS];

        let psi_i = ddt_kh * c0 * (rho_j - rho_i - hydrostatic_offset(dz)) / (r_sq + eta_sq);
        let delta_i = psi_i * dot3 * m0 / rho_j;

        let psi_j = ddt_kh * c0 * (rho_i - rho_j - hydrostatic_offset(-dz)) / (r_sq + eta_sq);
        let delta_j = psi_j * dot3 * m0 / rho_i;

        let to_i = cont_i + delta_i * motion_limiter[i];
        let to_j = cont_j + delta_j * motion_limiter[j];
        PairContribution {
            to_i,
            to_j,
            recorded: to_i,
        }
    })
}
