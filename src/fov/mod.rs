//! Continuous field-of-view calculation (pure geometry)
//!
//! This module provides algorithms that score how well a viewer sees each cell
//! of an opacity grid. All algorithms implement the `FovAlgorithm` trait.

pub mod cache;
pub mod rhombus;
pub mod spiral_scan;

pub use cache::{DEFAULT_CACHE_CAPACITY, VisibilityCache};
pub use rhombus::{CombineStrategy, RhombusFov};
pub use spiral_scan::{FovStep, FovSteps, Predecessors, SpiralFov};

use crate::error::{FovError, Result};
use crate::grid::Grid;
use crate::point::IntPoint;
use rayon::prelude::*;

/// Default maximum supported line-of-sight radius
pub const DEFAULT_MAX_RADIUS: usize = 20;

/// Default decay factor: visibility is close to zero at the edge of the radius
pub const DEFAULT_DECAY_FACTOR: f32 = 0.9;

/// Trait for field-of-view algorithms.
///
/// Implementations turn an opacity grid into a visibility grid of the same
/// size, values in [0, 1].
pub trait FovAlgorithm {
    /// Calculate visibility from a single viewer.
    ///
    /// # Arguments
    /// * `viewer` - Viewer cell, must be inside `opacity`
    /// * `los_radius` - Line-of-sight radius; non-positive means only the viewer is seen
    /// * `opacity` - Per-cell opacity (1.0 = transparent, 0.0 = opaque)
    ///
    /// # Returns
    /// A fresh visibility grid where the viewer cell is always 1.0
    fn compute(&self, viewer: IntPoint, los_radius: f32, opacity: &Grid<f32>) -> Result<Grid<f32>>;

    /// Independent queries for several viewers, run in parallel.
    fn compute_batch(
        &self,
        viewers: &[IntPoint],
        los_radius: f32,
        opacity: &Grid<f32>,
    ) -> Result<Vec<Grid<f32>>>
    where
        Self: Sync,
    {
        viewers
            .par_iter()
            .map(|&viewer| self.compute(viewer, los_radius, opacity))
            .collect()
    }
}

/// Configuration for the spiral-scan propagator.
#[derive(Debug, Clone, PartialEq)]
pub struct FovConfig {
    /// Largest radius the shared offset spiral is built for, at most
    /// `MAX_SPIRAL_RADIUS`
    pub max_radius: usize,
    /// Fraction of visibility lost over a full radius (0.0 = no falloff)
    pub decay_factor: f32,
}

impl Default for FovConfig {
    fn default() -> Self {
        Self {
            max_radius: DEFAULT_MAX_RADIUS,
            decay_factor: DEFAULT_DECAY_FACTOR,
        }
    }
}

impl FovConfig {
    pub fn validate(&self) -> Result<()> {
        validate_decay(self.decay_factor)
    }
}

pub(crate) fn validate_decay(decay_factor: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&decay_factor) {
        return Err(FovError::InvalidConfig(format!(
            "decay factor must be within [0, 1], got {decay_factor}"
        )));
    }
    Ok(())
}

pub(crate) fn check_viewer(opacity: &Grid<f32>, viewer: IntPoint) -> Result<()> {
    if opacity.in_bounds(viewer) {
        Ok(())
    } else {
        Err(FovError::OutOfBounds {
            pos: viewer,
            width: opacity.width(),
            height: opacity.height(),
        })
    }
}

/// Linear interpolation; exact when `a == b`.
#[inline]
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(FovConfig::default().validate().is_ok());
        for bad in [-0.1, 1.5, f32::NAN] {
            let config = FovConfig {
                decay_factor: bad,
                ..FovConfig::default()
            };
            assert!(matches!(config.validate(), Err(FovError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_oversized_spiral_is_rejected() {
        let config = FovConfig {
            max_radius: crate::spiral::MAX_SPIRAL_RADIUS + 1,
            ..FovConfig::default()
        };
        assert!(matches!(SpiralFov::new(&config), Err(FovError::InvalidConfig(_))));
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(0.3, 0.3, 0.7), 0.3);
        assert_eq!(lerp(1.0, 0.0, 0.0), 1.0);
        assert!((lerp(1.0, 0.0, 0.25) - 0.75).abs() < 1e-6);
    }
}
