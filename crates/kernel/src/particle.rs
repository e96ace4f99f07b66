//! Particle buffer set using struct-of-arrays layout.
//!
//! [`ParticleBuffers`] is the sole owner of every per-particle array and of
//! the per-interaction lists that physics terms hand to each other. Terms
//! borrow these buffers and overwrite them; nothing in the engine allocates
//! fresh per-particle storage during a step.

use glam::DVec3;

use crate::error::{check_len, KernelError};

/// Fill every entry of `values` with the type's zero value, in place.
pub fn reset<T: Default + Clone>(values: &mut [T]) {
    values.fill(T::default());
}

/// Make `values` exactly `n` long.
///
/// Only the length is guaranteed. Existing entries are kept and new slots
/// are default-filled; when the length already matches this is a no-op.
pub fn resize<T: Default + Clone>(values: &mut Vec<T>, n: usize) {
    if values.len() != n {
        values.resize(n, T::default());
    }
}

/// Read-only view of the integrated particle state.
#[derive(Debug, Clone, Copy)]
pub struct ParticleFields<'a> {
    /// Positions (m).
    pub positions: &'a [DVec3],
    /// Velocities (m/s).
    pub velocities: &'a [DVec3],
    /// Densities (kg/m^3).
    pub densities: &'a [f64],
}

impl ParticleFields<'_> {
    /// Check that all three arrays have `n` entries.
    pub fn check(&self, n: usize) -> Result<(), KernelError> {
        check_len("positions", n, self.positions.len())?;
        check_len("velocities", n, self.velocities.len())?;
        check_len("densities", n, self.densities.len())
    }
}

/// Struct-of-arrays particle storage.
///
/// Per-particle arrays are parallel: index `k` across each of them refers to
/// the same particle. Per-interaction arrays (`*_list`) are aligned with the
/// neighbor list of the current step instead.
#[derive(Debug, Clone, Default)]
pub struct ParticleBuffers {
    // ---- Integrated state ----
    /// Positions (m).
    pub position: Vec<DVec3>,
    /// Velocities (m/s).
    pub velocity: Vec<DVec3>,
    /// Densities (kg/m^3).
    pub density: Vec<f64>,

    // ---- Caller-supplied mask ----
    /// Motion limiter: `0` for fixed particles, `1` for free ones.
    pub motion_limiter: Vec<f64>,

    // ---- Derived per particle ----
    /// Total acceleration (m/s^2): pressure + viscosity + gravity.
    pub acceleration: Vec<DVec3>,
    /// Viscous part of the acceleration (m/s^2).
    pub viscous_acceleration: Vec<DVec3>,
    /// Density rate (kg/m^3/s).
    pub density_rate: Vec<f64>,
    /// Pressure (Pa).
    pub pressure: Vec<f64>,
    /// Sum of kernel values over neighbors.
    pub kernel_value: Vec<f64>,
    /// Sum of kernel gradients over neighbors.
    pub kernel_gradient: Vec<DVec3>,

    // ---- Derived per interaction ----
    /// `W_ij` per pair.
    pub kernel_value_list: Vec<f64>,
    /// `grad_i W_ij` per pair.
    pub kernel_gradient_list: Vec<DVec3>,
    /// Density rate of the `i` side per pair.
    pub density_rate_list: Vec<f64>,
    /// Pressure acceleration applied to `i` per pair.
    pub acceleration_list: Vec<DVec3>,
    /// Viscous acceleration applied to `i` per pair.
    pub viscous_acceleration_list: Vec<DVec3>,
}

impl ParticleBuffers {
    /// Create an empty buffer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer set from initial state.
    ///
    /// Every particle starts free to move (motion limiter `1`). All three
    /// arrays must have the same length.
    pub fn from_state(
        position: Vec<DVec3>,
        velocity: Vec<DVec3>,
        density: Vec<f64>,
    ) -> Result<Self, KernelError> {
        let n = position.len();
        check_len("velocity", n, velocity.len())?;
        check_len("density", n, density.len())?;
        let mut buffers = Self {
            position,
            velocity,
            density,
            motion_limiter: vec![1.0; n],
            ..Self::default()
        };
        buffers.resize(n);
        Ok(buffers)
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.position.len()
    }

    /// Return `true` if there are no particles.
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Append one particle at rest. Derived arrays grow with it.
    pub fn push_particle(&mut self, position: DVec3, density: f64, motion_limiter: f64) {
        self.position.push(position);
        self.velocity.push(DVec3::ZERO);
        self.density.push(density);
        self.motion_limiter.push(motion_limiter);
        let n = self.len();
        self.resize_derived(n);
    }

    /// Read-only view of positions, velocities and densities.
    pub fn fields(&self) -> ParticleFields<'_> {
        ParticleFields {
            positions: &self.position,
            velocities: &self.velocity,
            densities: &self.density,
        }
    }

    /// Zero every derived per-particle array before re-accumulation.
    ///
    /// Integrated state and the motion limiter are untouched.
    pub fn reset_derived(&mut self) {
        reset(&mut self.acceleration);
        reset(&mut self.viscous_acceleration);
        reset(&mut self.density_rate);
        reset(&mut self.pressure);
        reset(&mut self.kernel_value);
        reset(&mut self.kernel_gradient);
    }

    /// Make every per-particle array exactly `n` long.
    ///
    /// Used when the particle count changes between steps. Arrays that
    /// already have length `n` are not touched.
    pub fn resize(&mut self, n: usize) {
        resize(&mut self.position, n);
        resize(&mut self.velocity, n);
        resize(&mut self.density, n);
        resize(&mut self.motion_limiter, n);
        self.resize_derived(n);
    }

    fn resize_derived(&mut self, n: usize) {
        resize(&mut self.acceleration, n);
        resize(&mut self.viscous_acceleration, n);
        resize(&mut self.density_rate, n);
        resize(&mut self.pressure, n);
        resize(&mut self.kernel_value, n);
        resize(&mut self.kernel_gradient, n);
    }

    /// Check every per-particle array against `len()`.
    pub fn check_shape(&self) -> Result<(), KernelError> {
        let n = self.len();
        self.fields().check(n)?;
        check_len("motion_limiter", n, self.motion_limiter.len())?;
        check_len("acceleration", n, self.acceleration.len())?;
        check_len("viscous_acceleration", n, self.viscous_acceleration.len())?;
        check_len("density_rate", n, self.density_rate.len())?;
        check_len("pressure", n, self.pressure.len())?;
        check_len("kernel_value", n, self.kernel_value.len())?;
        check_len("kernel_gradient", n, self.kernel_gradient.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffers() {
        let b = ParticleBuffers::new();
        assert_eq!(b.len(), 0);
        assert!(b.is_empty());
        assert!(b.check_shape().is_ok());
    }

    #[test]
    fn push_and_len() {
        let mut b = ParticleBuffers::new();
        b.push_particle(DVec3::new(1.0, 2.0, 3.0), 1000.0, 0.0);
        assert_eq!(b.len(), 1);
        assert!(!b.is_empty());
        assert_eq!(b.position[0], DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.density[0], 1000.0);
        assert_eq!(b.motion_limiter[0], 0.0);
        assert_eq!(b.velocity[0], DVec3::ZERO);
        assert_eq!(b.acceleration.len(), 1);
        assert!(b.check_shape().is_ok());
    }

    #[test]
    fn from_state_rejects_mismatched_lengths() {
        let err = ParticleBuffers::from_state(
            vec![DVec3::ZERO; 2],
            vec![DVec3::ZERO; 2],
            vec![1000.0; 3],
        )
        .unwrap_err();
        assert_eq!(err, KernelError::ShapeMismatch { field: "density", expected: 2, found: 3 });
    }

    #[test]
    fn reset_zeroes_every_entry() {
        let mut scalars = vec![1.5, -2.0, 3.0];
        reset(&mut scalars);
        assert!(scalars.iter().all(|&v| v == 0.0));

        let mut vectors = vec![DVec3::ONE; 4];
        reset(&mut vectors);
        assert!(vectors.iter().all(|&v| v == DVec3::ZERO));
    }

    #[test]
    fn resize_sets_exact_length() {
        let mut values = vec![1.0; 3];
        resize(&mut values, 5);
        assert_eq!(values.len(), 5);
        resize(&mut values, 2);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn resize_keeps_allocation_when_unchanged() {
        let mut values: Vec<f64> = Vec::with_capacity(64);
        values.extend([1.0, 2.0]);
        let ptr = values.as_ptr();
        resize(&mut values, 2);
        assert_eq!(values.as_ptr(), ptr);
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn reset_derived_keeps_state() {
        let mut b = ParticleBuffers::from_state(
            vec![DVec3::X, DVec3::Y],
            vec![DVec3::Z, DVec3::Z],
            vec![1000.0, 1001.0],
        )
        .unwrap();
        b.acceleration[1] = DVec3::ONE;
        b.density_rate[0] = 4.0;
        b.reset_derived();
        assert_eq!(b.acceleration, vec![DVec3::ZERO; 2]);
        assert_eq!(b.density_rate, vec![0.0; 2]);
        assert_eq!(b.position, vec![DVec3::X, DVec3::Y]);
        assert_eq!(b.density, vec![1000.0, 1001.0]);
    }

    #[test]
    fn resize_grows_every_array() {
        let mut b = ParticleBuffers::new();
        b.resize(7);
        assert_eq!(b.len(), 7);
        assert!(b.check_shape().is_ok());
        b.resize(3);
        assert!(b.check_shape().is_ok());
        assert_eq!(b.kernel_gradient.len(), 3);
    }
}
