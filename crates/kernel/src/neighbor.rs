//! Uniform-grid spatial hash producing the neighbor pair list.
//!
//! Uses sorted-index + cell-offset arrays rather than `HashMap`, so a rebuild
//! with an unchanged particle count does not allocate.

use glam::DVec3;

use crate::pairs::NeighborPair;

/// Uniform-grid spatial hash for O(1) neighbor cell lookup.
///
/// The grid covers a fixed axis-aligned domain. Cell size should equal the
/// kernel support radius (2h) so that the 27 (3x3x3) cells around a
/// particle contain every neighbor within 2h. Positions outside the domain
/// are clamped into the edge cells.
#[derive(Debug, Clone)]
pub struct NeighborGrid {
    cell_size: f64,
    grid_min: DVec3,
    grid_dims: [usize; 3],
    /// Cell index for each particle (parallel to particle arrays).
    cell_indices: Vec<usize>,
    /// Particle indices sorted by cell index.
    sorted_indices: Vec<usize>,
    /// Start offset in `sorted_indices` for each cell.
    cell_offsets: Vec<usize>,
    /// Number of particles in each cell.
    cell_counts: Vec<usize>,
    /// Scatter cursor per cell, kept to avoid a per-update allocation.
    write_heads: Vec<usize>,
}

impl NeighborGrid {
    /// Create a new neighbor grid covering `[domain_min, domain_max]`.
    ///
    /// Returns `None` if `cell_size` is not positive.
    pub fn new(cell_size: f64, domain_min: DVec3, domain_max: DVec3) -> Option<Self> {
        if !(cell_size > 0.0) {
            return None;
        }
        let extent = (domain_max - domain_min) / cell_size;
        let dims = [
            extent.x.ceil().max(1.0) as usize,
            extent.y.ceil().max(1.0) as usize,
            extent.z.ceil().max(1.0) as usize,
        ];
        let total_cells = dims[0] * dims[1] * dims[2];
        Some(Self {
            cell_size,
            grid_min: domain_min,
            grid_dims: dims,
            cell_indices: Vec::new(),
            sorted_indices: Vec::new(),
            cell_offsets: vec![0; total_cells],
            cell_counts: vec![0; total_cells],
            write_heads: vec![0; total_cells],
        })
    }

    /// Edge length of one cell; the largest search radius the grid supports.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Total number of cells in the grid.
    pub fn total_cells(&self) -> usize {
        self.grid_dims[0] * self.grid_dims[1] * self.grid_dims[2]
    }

    /// Map a world-space position to a cell (cx, cy, cz), clamped to grid bounds.
    #[inline]
    fn pos_to_cell(&self, p: DVec3) -> [usize; 3] {
        let rel = (p - self.grid_min) / self.cell_size;
        let clamp = |v: f64, dim: usize| v.floor().max(0.0).min((dim - 1) as f64) as usize;
        [
            clamp(rel.x, self.grid_dims[0]),
            clamp(rel.y, self.grid_dims[1]),
            clamp(rel.z, self.grid_dims[2]),
        ]
    }

    /// Flat cell index from (cx, cy, cz).
    #[inline]
    fn cell_hash(&self, c: [usize; 3]) -> usize {
        c[0] + c[1] * self.grid_dims[0] + c[2] * self.grid_dims[0] * self.grid_dims[1]
    }

    /// Rebuild the grid from current particle positions.
    pub fn update(&mut self, positions: &[DVec3]) {
        let n = positions.len();

        // --- 1. Cell index for each particle ---
        self.cell_indices.resize(n, 0);
        for (i, &p) in positions.iter().enumerate() {
            self.cell_indices[i] = self.cell_hash(self.pos_to_cell(p));
        }

        // --- 2. Count particles per cell ---
        self.cell_counts.fill(0);
        for &ci in &self.cell_indices {
            self.cell_counts[ci] += 1;
        }

        // --- 3. Prefix-sum to get cell offsets ---
        let mut running = 0;
        for (offset, &count) in self.cell_offsets.iter_mut().zip(&self.cell_counts) {
            *offset = running;
            running += count;
        }

        // --- 4. Scatter particle indices into sorted order ---
        self.sorted_indices.resize(n, 0);
        self.write_heads.copy_from_slice(&self.cell_offsets);
        for i in 0..n {
            let ci = self.cell_indices[i];
            self.sorted_indices[self.write_heads[ci]] = i;
            self.write_heads[ci] += 1;
        }
    }

    /// Iterate over all neighbors of `particle_idx` within `radius`.
    ///
    /// Checks the 27 (3x3x3) adjacent cells around the particle's cell and
    /// calls `f(j, distance)` for every other particle within `radius`.
    /// `update` must have been called with the same `positions`, and
    /// `radius` must not exceed the cell size.
    pub fn for_each_neighbor<F>(&self, particle_idx: usize, positions: &[DVec3], radius: f64, mut f: F)
    where
        F: FnMut(usize, f64),
    {
        debug_assert!(
            radius <= self.cell_size,
            "search radius {radius} exceeds cell size {}",
            self.cell_size
        );
        let p = positions[particle_idx];
        let [cx, cy, cz] = self.pos_to_cell(p);
        let radius_sq = radius * radius;

        for nz in cz.saturating_sub(1)..=(cz + 1).min(self.grid_dims[2] - 1) {
            for ny in cy.saturating_sub(1)..=(cy + 1).min(self.grid_dims[1] - 1) {
                for nx in cx.saturating_sub(1)..=(cx + 1).min(self.grid_dims[0] - 1) {
                    let cell = self.cell_hash([nx, ny, nz]);
                    let start = self.cell_offsets[cell];
                    let count = self.cell_counts[cell];

                    for &j in &self.sorted_indices[start..start + count] {
                        if j == particle_idx {
                            continue;
                        }
                        let dist_sq = p.distance_squared(positions[j]);
                        if dist_sq <= radius_sq {
                            f(j, dist_sq.sqrt());
                        }
                    }
                }
            }
        }
    }

    /// Overwrite `out` with every unordered pair within `radius`.
    ///
    /// Each pair appears once with `i < j`, ordered by ascending `i` and
    /// then grid traversal order. `update` must have been called with the
    /// same `positions`, and `radius` must not exceed [`cell_size`](Self::cell_size).
    pub fn collect_pairs(&self, positions: &[DVec3], radius: f64, out: &mut Vec<NeighborPair>) {
        out.clear();
        for i in 0..positions.len() {
            self.for_each_neighbor(i, positions, radius, |j, distance| {
                if i < j {
                    out.push(NeighborPair::new(i, j, distance));
                }
            });
        }
    }
}
