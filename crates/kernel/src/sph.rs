//! Wendland quintic smoothing kernel and the per-step kernel sums.
//!
//! The kernel is written in terms of the normalized distance `q = r / h`
//! with support `q <= 2`. The normalization `alpha_D` already carries the
//! `h^-D` factor (see [`Dimension::wendland_normalization`]).
//!
//! [`Dimension::wendland_normalization`]: crate::constants::Dimension::wendland_normalization

use glam::DVec3;

use crate::constants::PhysicalConstants;
use crate::error::{check_len, KernelError};
use crate::pairs::{aggregate, Accumulators, PairContribution, PairList};

/// Regularization of the gradient denominator for near-coincident pairs.
pub const GRADIENT_EPSILON: f64 = 1.0e-6;

/// Wendland quintic kernel value.
///
/// ```text
/// W(q) = alpha_D * (1 - q/2)^4 * (2q + 1)
/// ```
///
/// Only meaningful for `q` in `[0, 2]`; the neighbor list guarantees this.
#[inline]
pub fn wendland_value(alpha_d: f64, q: f64) -> f64 {
    let t = 1.0 - 0.5 * q;
    let t2 = t * t;
    alpha_d * t2 * t2 * (2.0 * q + 1.0)
}

/// Gradient of the Wendland quintic kernel with respect to `x_i`.
///
/// ```text
/// grad_i W = x_ij * alpha_D * 5 (q - 2)^3 q / (8 h (q h + eps))
/// ```
///
/// Returns exactly zero outside the open interval `0 < q < 2`, including a
/// coincident pair at `q = 0`.
#[inline]
pub fn wendland_gradient(alpha_d: f64, q: f64, x_ij: DVec3, h: f64) -> DVec3 {
    if q > 0.0 && q < 2.0 {
        let qm2 = q - 2.0;
        let fac = alpha_d * 5.0 * qm2 * qm2 * qm2 * q / (8.0 * h * (q * h + GRADIENT_EPSILON));
        x_ij * fac
    } else {
        DVec3::ZERO
    }
}

/// Compute `sum_j W_ij` for every particle.
///
/// The kernel is symmetric, so both particles of a pair receive the same
/// value. The per-interaction list holds `W_ij`.
pub fn kernel_value_sum(
    pairs: &PairList<'_>,
    constants: &PhysicalConstants,
    out: Accumulators<'_, f64>,
) -> Result<(), KernelError> {
    let alpha_d = constants.alpha_d;
    let h = constants.h;
    aggregate(pairs, out, |_, pair| {
        PairContribution::symmetric(wendland_value(alpha_d, pair.distance / h))
    })
}

/// Compute `sum_j grad_i W_ij` for every particle.
///
/// Particle `i` receives `grad_i W_ij`, particle `j` its negation. The
/// per-interaction list holds `grad_i W_ij`, which every downstream physics
/// term reads instead of recomputing pair geometry.
pub fn kernel_gradient_sum(
    pairs: &PairList<'_>,
    constants: &PhysicalConstants,
    positions: &[DVec3],
    out: Accumulators<'_, DVec3>,
) -> Result<(), KernelError> {
    check_len("positions", pairs.particle_count(), positions.len())?;
    let alpha_d = constants.alpha_d;
    let h = constants.h;
    aggregate(pairs, out, |_, pair| {
        let x_ij = positions[pair.i] - positions[pair.j];
        PairContribution::antisymmetric(wendland_gradient(alpha_d, pair.distance / h, x_ij, h))
    })
}
