//! Reuse of visibility grids across repeated queries.

use std::collections::{HashMap, VecDeque};

use super::FovAlgorithm;
use crate::error::Result;
use crate::grid::Grid;
use crate::point::IntPoint;

/// Number of visibility grids kept by `VisibilityCache::new`
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

type CacheKey = (IntPoint, u32);

/// Memoizes visibility grids per (viewer, radius) for a fixed opacity grid.
///
/// The cache owns the opacity grid so that every mutation goes through it and
/// drops all stored results. At most `capacity` grids are kept; the oldest
/// entry is evicted first.
pub struct VisibilityCache<A> {
    algorithm: A,
    opacity: Grid<f32>,
    entries: HashMap<CacheKey, Grid<f32>>,
    /// Insertion order of `entries`, oldest first
    order: VecDeque<CacheKey>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<A: FovAlgorithm> VisibilityCache<A> {
    pub fn new(algorithm: A, opacity: Grid<f32>) -> Self {
        Self::with_capacity(algorithm, opacity, DEFAULT_CACHE_CAPACITY)
    }

    /// Keep at most `capacity` grids (at least one).
    pub fn with_capacity(algorithm: A, opacity: Grid<f32>, capacity: usize) -> Self {
        VisibilityCache {
            algorithm,
            opacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn opacity(&self) -> &Grid<f32> {
        &self.opacity
    }

    /// Visibility from `viewer`, computed at most once per opacity revision.
    pub fn visibility(&mut self, viewer: IntPoint, los_radius: f32) -> Result<&Grid<f32>> {
        let key = (viewer, los_radius.to_bits());
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            let grid = self.algorithm.compute(viewer, los_radius, &self.opacity)?;
            self.misses += 1;
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
            self.order.push_back(key);
            self.entries.insert(key, grid);
        }
        Ok(&self.entries[&key])
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.order.pop_front() {
            log::trace!("Evicting cached visibility from {}", oldest.0);
            self.entries.remove(&oldest);
        }
    }

    /// Change one cell's opacity. Cached results are dropped if it differs.
    pub fn set_opacity(&mut self, p: IntPoint, value: f32) -> Result<()> {
        let old = self.opacity.get(p)?;
        if old != value {
            self.opacity.set(p, value)?;
            self.invalidate();
        }
        Ok(())
    }

    /// Swap in a whole new opacity grid.
    pub fn replace_opacity(&mut self, opacity: Grid<f32>) -> Grid<f32> {
        self.invalidate();
        std::mem::replace(&mut self.opacity, opacity)
    }

    pub fn invalidate(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("Invalidating {} cached visibility grids", self.entries.len());
        }
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since construction
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fov::{FovConfig, SpiralFov};

    fn cache() -> VisibilityCache<SpiralFov> {
        let fov = SpiralFov::new(&FovConfig {
            max_radius: 6,
            decay_factor: 0.0,
        })
        .unwrap();
        VisibilityCache::new(fov, Grid::new(9, 9, 1.0))
    }

    #[test]
    fn test_repeated_query_hits() {
        let mut cache = cache();
        let viewer = IntPoint::new(4, 4);

        let first = cache.visibility(viewer, 4.0).unwrap().clone();
        let second = cache.visibility(viewer, 4.0).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(cache.stats(), (1, 1));

        // Different radius is a different entry
        let _ = cache.visibility(viewer, 3.0).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_opacity_change_invalidates() {
        let mut cache = cache();
        let viewer = IntPoint::new(4, 4);
        let behind = IntPoint::new(4, 1);

        assert_eq!(cache.visibility(viewer, 4.0).unwrap()[behind], 1.0);

        // Same value: nothing to drop
        cache.set_opacity(IntPoint::new(4, 2), 1.0).unwrap();
        assert_eq!(cache.len(), 1);

        cache.set_opacity(IntPoint::new(4, 2), 0.0).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.visibility(viewer, 4.0).unwrap()[behind], 0.0);

        let old = cache.replace_opacity(Grid::new(9, 9, 1.0));
        assert_eq!(old[IntPoint::new(4, 2)], 0.0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oldest_entry_is_evicted() {
        let fov = SpiralFov::new(&FovConfig {
            max_radius: 6,
            decay_factor: 0.0,
        })
        .unwrap();
        let mut cache = VisibilityCache::with_capacity(fov, Grid::new(9, 9, 1.0), 2);
        let viewers = [IntPoint::new(1, 1), IntPoint::new(4, 4), IntPoint::new(7, 7)];

        for viewer in viewers {
            let _ = cache.visibility(viewer, 3.0).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats(), (0, 3));

        // The two newest are still cached, the first one is recomputed
        let _ = cache.visibility(viewers[2], 3.0).unwrap();
        let _ = cache.visibility(viewers[1], 3.0).unwrap();
        assert_eq!(cache.stats(), (2, 3));
        let _ = cache.visibility(viewers[0], 3.0).unwrap();
        assert_eq!(cache.stats(), (2, 4));
        assert_eq!(cache.len(), 2);

        let tiny = VisibilityCache::with_capacity(SpiralFov::default(), Grid::new(2, 2, 1.0), 0);
        assert_eq!(tiny.capacity(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache = cache();
        assert!(cache.visibility(IntPoint::new(20, 0), 2.0).is_err());
        assert!(cache.set_opacity(IntPoint::new(-1, 0), 0.0).is_err());
        assert!(cache.is_empty());
    }
}
