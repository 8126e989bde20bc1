//! Continuous field of view over 2D grids.
//!
//! Scores, for every cell, how well a viewer sees it (0.0 to 1.0), given a
//! per-cell opacity grid and a linear distance decay. The shipped algorithm is
//! `SpiralFov`; `RhombusFov` is an alternative octant-mesh formulation.

mod error;
mod fov;
mod grid;
mod point;
mod spiral;
mod symmetry;


// Re-export public API
pub use error::{FovError, Result};
pub use fov::{
    CombineStrategy, DEFAULT_CACHE_CAPACITY, DEFAULT_DECAY_FACTOR, DEFAULT_MAX_RADIUS, FovAlgorithm, FovConfig, FovStep,
    FovSteps, Predecessors, RhombusFov, SpiralFov, VisibilityCache,
};
pub use grid::Grid;
pub use point::IntPoint;
pub use spiral::{MAX_SPIRAL_RADIUS, OffsetSpiral};
pub use symmetry::{SymmetryConfig, SymmetryMismatch, verify_symmetry};
