//! Neighbor pair records and the pairwise field aggregator.
//!
//! Every physics term walks the same neighbor list and produces two outputs:
//! a per-particle total (length `N`) and a per-interaction record aligned
//! with the list. Each record appears once, so a term must say explicitly
//! what it adds to particle `i` and what it adds to particle `j`.
//!
//! Pair lists are validated once, when a [`PairList`] is built, so the hot
//! loops index particle arrays without re-checking.

use std::ops::{AddAssign, Neg};

use rayon::prelude::*;

use crate::error::KernelError;

/// Smallest pair range worth a partition of its own in [`Execution::Parallel`].
pub const MIN_PARTITION_PAIRS: usize = 4096;

/// Number of contiguous pair ranges used by [`Execution::Parallel`].
///
/// Bounded by the rayon pool size, so the scratch held by the aggregator is
/// at most `current_num_threads() * N` entries whatever the pair count.
pub fn partition_count(pair_count: usize) -> usize {
    rayon::current_num_threads()
        .min(pair_count.div_ceil(MIN_PARTITION_PAIRS))
        .max(1)
}

/// One interaction `(i, j, distance)` from the neighbor search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborPair {
    /// First particle index.
    pub i: usize,
    /// Second particle index.
    pub j: usize,
    /// Euclidean separation `|x_i - x_j|`.
    pub distance: f64,
}

impl NeighborPair {
    /// Create a pair record.
    pub fn new(i: usize, j: usize, distance: f64) -> Self {
        Self { i, j, distance }
    }
}

/// How the aggregator traverses the pair list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Execution {
    /// One pass in list order.
    #[default]
    Serial,
    /// One contiguous pair range per rayon worker, each with a local
    /// accumulator. Locals are merged in range order, so results are
    /// reproducible for a given pool size (but not bit-identical to `Serial`).
    Parallel,
}

/// A neighbor list checked against the current particle count.
#[derive(Debug, Clone, Copy)]
pub struct PairList<'a> {
    pairs: &'a [NeighborPair],
    particle_count: usize,
    execution: Execution,
}

impl<'a> PairList<'a> {
    /// Validate `pairs` against `particle_count`.
    ///
    /// Fails if any record points past the particle arrays or links a
    /// particle to itself.
    pub fn new(pairs: &'a [NeighborPair], particle_count: usize) -> Result<Self, KernelError> {
        for (k, pair) in pairs.iter().enumerate() {
            for particle in [pair.i, pair.j] {
                if particle >= particle_count {
                    return Err(KernelError::PairOutOfRange {
                        pair: k,
                        particle,
                        count: particle_count,
                    });
                }
            }
            if pair.i == pair.j {
                return Err(KernelError::SelfInteraction { pair: k, particle: pair.i });
            }
        }
        Ok(Self {
            pairs,
            particle_count,
            execution: Execution::Serial,
        })
    }

    /// Select the traversal strategy.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Number of interaction records.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Return `true` if there are no interactions.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Particle count the list was validated against.
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Traversal strategy in use.
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Underlying records.
    pub fn as_slice(&self) -> &'a [NeighborPair] {
        self.pairs
    }
}

/// What one interaction adds to each side, and what it records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairContribution<T> {
    /// Added to particle `i`.
    pub to_i: T,
    /// Added to particle `j`.
    pub to_j: T,
    /// Stored in the per-interaction list.
    pub recorded: T,
}

impl<T: Copy + Neg<Output = T>> PairContribution<T> {
    /// `value` on `i`, `-value` on `j`, `value` recorded.
    pub fn antisymmetric(value: T) -> Self {
        Self {
            to_i: value,
            to_j: -value,
            recorded: value,
        }
    }
}

impl<T: Copy> PairContribution<T> {
    /// The same `value` on both sides and in the record.
    pub fn symmetric(value: T) -> Self {
        Self {
            to_i: value,
            to_j: value,
            recorded: value,
        }
    }
}

/// Output pair of a physics term: per-particle totals and per-interaction
/// records.
///
/// Both are overwritten. `per_particle` must already have length `N`;
/// `per_interaction` is resized to the pair count, reusing its allocation.
/// Parallel runs keep their worker-local totals in `scratch` when one is
/// attached, so repeated calls do not allocate.
#[derive(Debug)]
pub struct Accumulators<'a, T> {
    /// One entry per particle.
    pub per_particle: &'a mut [T],
    /// One entry per pair record.
    pub per_interaction: &'a mut Vec<T>,
    /// Worker-local per-particle totals for [`Execution::Parallel`].
    pub scratch: Option<&'a mut Vec<Vec<T>>>,
}

impl<'a, T> Accumulators<'a, T> {
    /// Bundle the two output buffers.
    pub fn new(per_particle: &'a mut [T], per_interaction: &'a mut Vec<T>) -> Self {
        Self {
            per_particle,
            per_interaction,
            scratch: None,
        }
    }

    /// Reuse `scratch` for the worker-local totals.
    pub fn with_scratch(mut self, scratch: &'a mut Vec<Vec<T>>) -> Self {
        self.scratch = Some(scratch);
        self
    }
}

/// Reusable worker-local totals for both value types the physics terms use.
#[derive(Debug, Clone, Default)]
pub struct AggregateScratch {
    /// Scalar totals (kernel values, density rates).
    pub scalars: Vec<Vec<f64>>,
    /// Vector totals (gradients, accelerations).
    pub vectors: Vec<Vec<glam::DVec3>>,
}

/// Run `contribution` over every pair and scatter the results.
///
/// `contribution` receives the record's position in the list and the record
/// itself. Accumulators start from `T::default()`, which is zero for `f64`
/// and `DVec3`.
pub fn aggregate<T, F>(
    pairs: &PairList<'_>,
    out: Accumulators<'_, T>,
    contribution: F,
) -> Result<(), KernelError>
where
    T: Copy + Default + AddAssign + Send + Sync,
    F: Fn(usize, &NeighborPair) -> PairContribution<T> + Sync,
{
    let n = pairs.particle_count();
    crate::error::check_len("per-particle accumulator", n, out.per_particle.len())?;

    out.per_particle.fill(T::default());
    out.per_interaction.clear();
    out.per_interaction.resize(pairs.len(), T::default());

    match pairs.execution() {
        Execution::Serial => {
            for (k, pair) in pairs.as_slice().iter().enumerate() {
                let c = contribution(k, pair);
                out.per_particle[pair.i] += c.to_i;
                out.per_particle[pair.j] += c.to_j;
                out.per_interaction[k] = c.recorded;
            }
        }
        Execution::Parallel => {
            let parts = partition_count(pairs.len());
            let span = pairs.len().div_ceil(parts).max(1);

            let mut owned = Vec::new();
            let locals = match out.scratch {
                Some(scratch) => scratch,
                None => &mut owned,
            };
            if locals.len() < parts {
                locals.resize_with(parts, Vec::new);
            }
            let locals = &mut locals[..parts];
            for local in locals.iter_mut() {
                local.clear();
                local.resize(n, T::default());
            }

            out.per_interaction
                .par_chunks_mut(span)
                .zip(pairs.as_slice().par_chunks(span))
                .zip(locals.par_iter_mut())
                .enumerate()
                .for_each(|(part, ((records, part_pairs), local))| {
                    let offset = part * span;
                    for (k, (slot, pair)) in records.iter_mut().zip(part_pairs).enumerate() {
                        let c = contribution(offset + k, pair);
                        local[pair.i] += c.to_i;
                        local[pair.j] += c.to_j;
                        *slot = c.recorded;
                    }
                });

            for local in locals.iter() {
                for (total, &value) in out.per_particle.iter_mut().zip(local) {
                    *total += value;
                }
            }
        }
    }
    Ok(())
}
