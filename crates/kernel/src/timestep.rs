//! Adaptive timestep via the CFL condition.

use glam::DVec3;

use crate::constants::{Dimension, PhysicalConstants};

/// Default CFL number.
pub const DEFAULT_CFL: f64 = 0.2;

/// Acceleration magnitude below which the force criterion is ignored.
const MIN_ACCEL: f64 = 1.0e-12;

/// Individual stability bounds, before the CFL factor is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestepCriteria {
    /// Signal-speed bound `h / (c0 + |v|_max)`.
    pub convective: f64,
    /// Force bound `sqrt(h / |a|_max)`; infinite when nothing accelerates.
    pub force: f64,
    /// Viscous diffusion bound `0.125 h^2 / nu_art` with
    /// `nu_art = alpha h c0 / (2 (D + 2))`; infinite when `alpha = 0`.
    pub viscous: f64,
}

impl TimestepCriteria {
    /// The tightest of the three bounds.
    pub fn min(&self) -> f64 {
        self.convective.min(self.force).min(self.viscous)
    }
}

/// Evaluate every stability bound for the current kinematic state.
pub fn timestep_criteria(
    constants: &PhysicalConstants,
    dimension: Dimension,
    velocities: &[DVec3],
    accelerations: &[DVec3],
) -> TimestepCriteria {
    let h = constants.h;
    let v_max = velocities.iter().map(|v| v.length()).fold(0.0, f64::max);
    let a_max = accelerations.iter().map(|a| a.length()).fold(0.0, f64::max);

    let convective = h / (constants.c0 + v_max);

    let force = if a_max > MIN_ACCEL {
        (h / a_max).sqrt()
    } else {
        f64::INFINITY
    };

    let nu_art = constants.alpha * h * constants.c0 / (2.0 * (dimension.count() as f64 + 2.0));
    let viscous = if nu_art > 0.0 {
        0.125 * h * h / nu_art
    } else {
        f64::INFINITY
    };

    TimestepCriteria {
        convective,
        force,
        viscous,
    }
}

/// Stable timestep for the next step.
///
/// ```text
/// dt = cfl * min(h / (c0 + |v|_max), sqrt(h / |a|_max), 0.125 h^2 / nu_art)
/// ```
///
/// Shrinks when the maximum speed, the speed of sound, the acceleration or
/// the viscosity coefficient grow, and grows with `h`.
pub fn estimate_timestep(
    constants: &PhysicalConstants,
    dimension: Dimension,
    cfl_number: f64,
    velocities: &[DVec3],
    accelerations: &[DVec3],
) -> f64 {
    let criteria = timestep_criteria(constants, dimension, velocities, accelerations);
    let dt = cfl_number * criteria.min();
    tracing::trace!(
        "dt criteria: convective={:.3e}, force={:.3e}, viscous={:.3e} -> dt={:.3e}",
        criteria.convective,
        criteria.force,
        criteria.viscous,
        dt
    );
    dt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constants() -> PhysicalConstants {
        PhysicalConstants {
            h: 0.02,
            alpha_d: 1.0,
            c0: 20.0,
            gamma: 7.0,
            rho0: 1000.0,
            m0: 0.001,
            alpha: 0.01,
            delta: 0.1,
            g: 9.81,
        }
    }

    fn dt_for(c: &PhysicalConstants, speed: f64, accel: f64) -> f64 {
        let v = [DVec3::new(speed, 0.0, 0.0), DVec3::ZERO];
        let a = [DVec3::new(0.0, 0.0, -accel), DVec3::ZERO];
        estimate_timestep(c, Dimension::Three, DEFAULT_CFL, &v, &a)
    }

    #[test]
    fn at_rest_limited_by_sound_speed() {
        let c = constants();
        let dt = dt_for(&c, 0.0, 0.0);
        assert!((dt - DEFAULT_CFL * c.h / c.c0).abs() < 1.0e-15, "dt={dt}");
    }

    #[test]
    fn shrinks_with_speed() {
        let c = constants();
        assert!(dt_for(&c, 5.0, 0.0) < dt_for(&c, 1.0, 0.0));
    }

    #[test]
    fn shrinks_with_sound_speed() {
        let slow = constants();
        let mut fast = constants();
        fast.c0 = 40.0;
        assert!(dt_for(&fast, 1.0, 9.81) < dt_for(&slow, 1.0, 9.81));
    }

    #[test]
    fn shrinks_with_viscosity() {
        // Large alpha so the viscous bound is the active one.
        let mut low = constants();
        low.alpha = 20.0;
        let mut high = constants();
        high.alpha = 40.0;
        assert!(dt_for(&high, 0.0, 0.0) < dt_for(&low, 0.0, 0.0));
    }

    #[test]
    fn shrinks_with_acceleration() {
        let c = constants();
        assert!(dt_for(&c, 0.0, 1.0e6) < dt_for(&c, 0.0, 1.0e5));
    }

    #[test]
    fn grows_with_smoothing_length() {
        let small = constants();
        let mut large = constants();
        large.h = 0.04;
        for (speed, accel) in [(0.0, 0.0), (3.0, 9.81), (1.0, 1.0e6)] {
            assert!(
                dt_for(&large, speed, accel) > dt_for(&small, speed, accel),
                "speed={speed}, accel={accel}"
            );
        }
    }

    #[test]
    fn inviscid_has_no_viscous_bound() {
        let mut c = constants();
        c.alpha = 0.0;
        let criteria = timestep_criteria(&c, Dimension::Two, &[DVec3::ZERO], &[DVec3::ZERO]);
        assert!(criteria.viscous.is_infinite());
        assert!(criteria.force.is_infinite());
        assert_eq!(criteria.min(), criteria.convective);
    }
}
