//! Symmetry check for visibility algorithms.
//!
//! Samples origin/target pairs within the line-of-sight radius, computes the
//! field of view from both ends and reports every pair whose two visibility
//! values differ. Mismatches are findings for regression tracking, not errors.

use std::fmt;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::error::{FovError, Result};
use crate::fov::FovAlgorithm;
use crate::grid::Grid;
use crate::point::IntPoint;
use crate::spiral::OffsetSpiral;

/// Sampling parameters for `verify_symmetry`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryConfig {
    /// Number of origin cells to sample (at most one pair per cell)
    pub sample_count: usize,
    /// Seed for reproducible sampling
    pub seed: u64,
    /// Largest difference still treated as symmetric (0.0 = exact)
    pub tolerance: f32,
}

impl Default for SymmetryConfig {
    fn default() -> Self {
        Self {
            sample_count: 100,
            seed: 0x5eed,
            tolerance: 0.0,
        }
    }
}

/// A pair of cells that do not see each other equally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetryMismatch {
    pub from: IntPoint,
    pub to: IntPoint,
    /// Visibility of `to` as seen from `from`
    pub forward: f32,
    /// Visibility of `from` as seen from `to`
    pub backward: f32,
}

impl SymmetryMismatch {
    pub fn difference(&self) -> f32 {
        (self.forward - self.backward).abs()
    }
}

impl fmt::Display for SymmetryMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {:.4} vs {:.4}",
            self.from, self.to, self.forward, self.backward
        )
    }
}

/// Check that `algorithm` scores sampled pairs the same in both directions.
///
/// Offsets are drawn from `spiral.range(1, los_radius)`, so every pair lies
/// within the radius. Pairs are evaluated in parallel; the result is ordered
/// by sampling order and is identical for a given seed.
pub fn verify_symmetry<A>(
    algorithm: &A,
    spiral: &OffsetSpiral,
    los_radius: f32,
    opacity: &Grid<f32>,
    config: &SymmetryConfig,
) -> Result<Vec<SymmetryMismatch>>
where
    A: FovAlgorithm + Sync,
{
    if los_radius > spiral.max_radius() as f32 {
        return Err(FovError::RadiusTooLarge {
            requested: los_radius,
            max: spiral.max_radius(),
        });
    }

    let pairs = sample_pairs(spiral.range(1.0, los_radius), opacity, config);
    log::debug!("Checking symmetry over {} pairs", pairs.len());

    let checked = pairs
        .par_iter()
        .map(|&(from, to)| -> Result<SymmetryMismatch> {
            let forward = algorithm.compute(from, los_radius, opacity)?[to];
            let backward = algorithm.compute(to, los_radius, opacity)?[from];
            Ok(SymmetryMismatch {
                from,
                to,
                forward,
                backward,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mismatches: Vec<_> = checked
        .into_iter()
        // NaN on either side counts as a mismatch
        .filter(|m| !(m.difference() <= config.tolerance))
        .collect();

    for mismatch in &mismatches {
        log::warn!("Asymmetric visibility {}", mismatch);
    }
    log::info!(
        "Symmetry check: {} of {} pairs asymmetric",
        mismatches.len(),
        pairs.len()
    );

    Ok(mismatches)
}

/// Distinct random origins, each paired with one random in-bounds offset.
fn sample_pairs(
    offsets: &[IntPoint],
    opacity: &Grid<f32>,
    config: &SymmetryConfig,
) -> Vec<(IntPoint, IntPoint)> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let cells = opacity.len();
    let amount = config.sample_count.min(cells);
    if amount < config.sample_count {
        log::debug!(
            "Requested {} samples but the grid only has {} cells",
            config.sample_count,
            cells
        );
    }

    let origins = rand::seq::index::sample(&mut rng, cells, amount);
    let mut pairs = Vec::with_capacity(amount);
    let mut candidates = Vec::new();
    for index in origins.into_iter() {
        let from = opacity.position_of(index);
        candidates.clear();
        candidates.extend(
            offsets
                .iter()
                .map(|&o| from + o)
                .filter(|&p| opacity.in_bounds(p)),
        );
        if let Some(&to) = candidates.choose(&mut rng) {
            pairs.push((from, to));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fov::{CombineStrategy, FovConfig, RhombusFov, SpiralFov};

    fn pillars(size: usize) -> Grid<f32> {
        let mut grid = Grid::new(size, size, 1.0);
        for p in grid.positions().collect::<Vec<_>>() {
            if p.x % 4 == 2 && p.y % 3 == 1 {
                grid[p] = 0.0;
            }
        }
        grid
    }

    #[test]
    fn test_pairs_are_within_radius_and_bounds() {
        let spiral = OffsetSpiral::new(6).unwrap();
        let opacity = pillars(12);
        let config = SymmetryConfig {
            sample_count: 40,
            ..SymmetryConfig::default()
        };
        let pairs = sample_pairs(spiral.range(1.0, 5.0), &opacity, &config);

        assert_eq!(pairs.len(), 40);
        for &(from, to) in &pairs {
            assert!(opacity.in_bounds(from) && opacity.in_bounds(to));
            assert_ne!(from, to);
            assert!((to - from).squared_length() <= 25);
        }
        let origins: std::collections::HashSet<_> = pairs.iter().map(|p| p.0).collect();
        assert_eq!(origins.len(), pairs.len());
    }

    #[test]
    fn test_sample_count_clamped_to_grid() {
        let spiral = OffsetSpiral::new(3).unwrap();
        let opacity = Grid::new(3, 2, 1.0);
        let config = SymmetryConfig {
            sample_count: 50,
            ..SymmetryConfig::default()
        };
        assert_eq!(sample_pairs(spiral.range(1.0, 3.0), &opacity, &config).len(), 6);

        // A single cell has no partner at all
        let lonely = Grid::new(1, 1, 1.0);
        assert!(sample_pairs(spiral.range(1.0, 3.0), &lonely, &config).is_empty());
    }

    #[test]
    fn test_open_floor_without_decay_is_symmetric() {
        let fov = SpiralFov::new(&FovConfig {
            max_radius: 8,
            decay_factor: 0.0,
        })
        .unwrap();
        let opacity = Grid::new(16, 16, 1.0);
        let mismatches = verify_symmetry(
            &fov,
            fov.spiral(),
            6.0,
            &opacity,
            &SymmetryConfig::default(),
        )
        .unwrap();
        assert!(mismatches.is_empty(), "{mismatches:?}");
    }

    #[test]
    fn test_reports_are_reproducible() {
        let fov = SpiralFov::default();
        let opacity = pillars(14);
        let config = SymmetryConfig {
            sample_count: 30,
            seed: 7,
            tolerance: 0.0,
        };

        let a = verify_symmetry(&fov, fov.spiral(), 6.0, &opacity, &config).unwrap();
        let b = verify_symmetry(&fov, fov.spiral(), 6.0, &opacity, &config).unwrap();
        assert_eq!(a, b);
        for m in &a {
            assert!(m.difference() > 0.0);
            assert!((m.to - m.from).squared_length() <= 36);
        }
    }

    #[test]
    fn test_both_combine_strategies_can_be_checked() {
        let spiral = OffsetSpiral::new(6).unwrap();
        let opacity = pillars(12);
        let config = SymmetryConfig {
            sample_count: 20,
            ..SymmetryConfig::default()
        };

        for combine in [CombineStrategy::Add, CombineStrategy::Max] {
            let fov = RhombusFov::new(0.5, combine).unwrap();
            let mismatches = verify_symmetry(&fov, &spiral, 5.0, &opacity, &config).unwrap();
            assert!(mismatches.len() <= 20);
            for m in &mismatches {
                assert!(m.difference() > config.tolerance);
            }
        }
    }

    #[test]
    fn test_radius_beyond_spiral_is_rejected() {
        let spiral = OffsetSpiral::new(3).unwrap();
        let fov = RhombusFov::default();
        let opacity = Grid::new(8, 8, 1.0);
        assert!(matches!(
            verify_symmetry(&fov, &spiral, 4.0, &opacity, &SymmetryConfig::default()),
            Err(FovError::RadiusTooLarge { .. })
        ));
    }
}
