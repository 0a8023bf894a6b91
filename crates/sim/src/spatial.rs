//! Uniform-grid spatial hash for near-O(1) neighbor queries.
//!
//! Buckets particle indices by floored grid cell. The hash is rebuilt from
//! scratch once per tick; at the particle counts this engine targets, a
//! full rebuild beats incremental bookkeeping. `clear` empties buckets but
//! keeps their storage, so steady-state frames allocate nothing.
//!
//! Queries visit only the 3x3 cell block around the query point, then apply
//! an exact squared-distance filter. That makes the query radius bounded by
//! the cell size: a larger radius under-reports neighbors instead of
//! widening the search block, so callers must keep `radius <= cell_size`.
//! The simulation satisfies this by using the smoothing radius for both.

use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::error::ConfigError;

/// Bucket entries carry the position captured at insert time, so the
/// distance filter needs no external lookups. Entries live one tick (full
/// rebuild), so the captured position cannot go stale.
type Bucket = Vec<(u32, Vec2)>;

/// Spatial hash over 2D positions.
pub struct SpatialHash {
    cell_size: f32,
    inv_cell_size: f32,
    cells: FxHashMap<(i32, i32), Bucket>,
}

impl SpatialHash {
    /// Creates a hash with the given cell size. Rejects non-positive or
    /// non-finite sizes.
    pub fn new(cell_size: f32) -> Result<Self, ConfigError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::BadCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: FxHashMap::default(),
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Reconfigures the cell size, emptying all buckets (cell keys mean
    /// something different under the new size). Same validation as `new`.
    pub fn set_cell_size(&mut self, cell_size: f32) -> Result<(), ConfigError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::BadCellSize(cell_size));
        }
        self.resize_cells(cell_size);
        Ok(())
    }

    /// Infallible variant for callers that already validated the size.
    pub(crate) fn resize_cells(&mut self, cell_size: f32) {
        debug_assert!(cell_size.is_finite() && cell_size > 0.0);
        self.cell_size = cell_size;
        self.inv_cell_size = 1.0 / cell_size;
        self.clear();
    }

    /// Empties every bucket, retaining bucket storage for reuse.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
    }

    fn cell_of(&self, position: Vec2) -> (i32, i32) {
        (
            (position.x * self.inv_cell_size).floor() as i32,
            (position.y * self.inv_cell_size).floor() as i32,
        )
    }

    /// Inserts a particle index into the bucket for its cell.
    pub fn insert(&mut self, index: u32, position: Vec2) {
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push((index, position));
    }

    /// Visits every inserted index within `radius` of `position`.
    ///
    /// Scans the 3x3 block of cells around the query point and invokes the
    /// callback with the index and exact distance of each hit. Cell
    /// membership alone is not enough to be reported; the Euclidean filter
    /// always runs. Visit order is deterministic: cells row-major through
    /// the block, insertion order within a bucket.
    pub fn for_each_neighbor<F: FnMut(u32, f32)>(
        &self,
        position: Vec2,
        radius: f32,
        mut f: F,
    ) {
        let radius_sq = radius * radius;
        let (cx, cy) = self.cell_of(position);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &(index, entry_pos) in bucket {
                    let dist_sq = position.distance_squared(entry_pos);
                    if dist_sq <= radius_sq {
                        f(index, dist_sq.sqrt());
                    }
                }
            }
        }
    }

    /// Collects neighbor indices into a caller-owned buffer (cleared
    /// first), so repeated queries reuse one allocation.
    pub fn query(&self, position: Vec2, radius: f32, out: &mut Vec<u32>) {
        out.clear();
        self.for_each_neighbor(position, radius, |index, _| out.push(index));
    }

    /// Number of cell buckets currently allocated (empty ones included).
    pub fn bucket_count(&self) -> usize {
        self.cells.len()
    }
}
