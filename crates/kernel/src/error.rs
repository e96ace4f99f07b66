//! Error type for the pairwise interaction engine.
//!
//! The engine is pure numeric code, so every failure is terminal for the
//! current step. The driver decides whether to abort or to retry the step
//! with a smaller timestep.

use std::fmt;

/// Failure raised by a kernel operation.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// A non-positive (or non-finite) density reached the equation of state.
    DomainViolation {
        /// Offending particle index.
        particle: usize,
        /// Density found at that particle.
        density: f64,
    },
    /// An array length differs from the count it must match.
    ShapeMismatch {
        /// Name of the array that was checked.
        field: &'static str,
        /// Required length.
        expected: usize,
        /// Actual length.
        found: usize,
    },
    /// A neighbor pair references a particle that does not exist.
    PairOutOfRange {
        /// Position of the record in the pair list.
        pair: usize,
        /// Particle index stored in the record.
        particle: usize,
        /// Current particle count.
        count: usize,
    },
    /// A neighbor pair references the same particle twice.
    SelfInteraction {
        /// Position of the record in the pair list.
        pair: usize,
        /// The repeated particle index.
        particle: usize,
    },
    /// A pair is so tall that the hydrostatic density offset of the
    /// diffusion term is undefined (`1 + rho0 g dz / B <= 0`).
    HydrostaticRange {
        /// Position of the record in the pair list.
        pair: usize,
        /// Vertical separation `z_i - z_j` of the pair.
        dz: f64,
    },
    /// A physical constant is outside its valid range.
    InvalidConstants {
        /// Which constraint failed.
        reason: &'static str,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomainViolation { particle, density } => {
                write!(f, "density {density} at particle {particle} is not positive")
            }
            Self::ShapeMismatch { field, expected, found } => {
                write!(f, "{field} has length {found}, expected {expected}")
            }
            Self::PairOutOfRange { pair, particle, count } => {
                write!(f, "pair {pair} references particle {particle} (count={count})")
            }
            Self::SelfInteraction { pair, particle } => {
                write!(f, "pair {pair} links particle {particle} to itself")
            }
            Self::HydrostaticRange { pair, dz } => {
                write!(f, "pair {pair} spans dz={dz} beyond the hydrostatic correction range")
            }
            Self::InvalidConstants { reason } => {
                write!(f, "invalid physical constants: {reason}")
            }
        }
    }
}

impl std::error::Error for KernelError {}

/// Check that `found` matches `expected`, naming the array on failure.
pub(crate) fn check_len(field: &'static str, expected: usize, found: usize) -> Result<(), KernelError> {
    if expected == found {
        Ok(())
    } else {
        Err(KernelError::ShapeMismatch { field, expected, found })
    }
}
