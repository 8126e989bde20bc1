//! Error types for field-of-view queries

use crate::point::IntPoint;
use thiserror::Error;

/// Contract violations reported by grids, spirals and visibility algorithms.
///
/// Offsets that fall off the grid during a scan and symmetry mismatches are
/// not errors and never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FovError {
    #[error("position {pos} is outside the {width}x{height} grid")]
    OutOfBounds {
        pos: IntPoint,
        width: usize,
        height: usize,
    },

    #[error("grid data has {len} cells but {width}x{height} were requested")]
    DimensionMismatch {
        len: usize,
        width: usize,
        height: usize,
    },

    #[error("line-of-sight radius {requested} exceeds the spiral's maximum radius {max}")]
    RadiusTooLarge { requested: f32, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, FovError>;
