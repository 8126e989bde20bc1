//! Octant rhombus-mesh visibility propagation.
//!
//! The eight straight and diagonal rays from the viewer are filled first by
//! multiplying opacities outward. Each octant is then swept row by row as a
//! (col, row) mesh, where `col` runs along the octant's forward axis and `row`
//! towards its diagonal. A cell pushes its visibility forward into two
//! incoming slots of its neighbours:
//!
//! - the diagonal neighbour `(col + 1, row + 1)`, weighted `(row + 1) / (col + 1)`
//! - the forward neighbour `(col + 1, row)`, weighted `1 - row / (col + 1)`
//!
//! How the two slots of a cell combine is the `CombineStrategy`. Adding them
//! can count a diagonal source twice; keeping the larger one cannot, but only
//! ever propagates one source.
//!
//! Decay is subtracted after propagation, so it never compounds.

use super::{FovAlgorithm, DEFAULT_DECAY_FACTOR, check_viewer, validate_decay};
use crate::error::{FovError, Result};
use crate::grid::Grid;
use crate::point::IntPoint;

const DIAGONAL: usize = 0;
const STRAIGHT: usize = 1;

const RAYS: [IntPoint; 8] = [
    IntPoint::new(-1, -1),
    IntPoint::new(0, -1),
    IntPoint::new(1, -1),
    IntPoint::new(-1, 0),
    IntPoint::new(1, 0),
    IntPoint::new(-1, 1),
    IntPoint::new(0, 1),
    IntPoint::new(1, 1),
];

/// (forward, up) axis pairs, one per octant
const OCTANTS: [(IntPoint, IntPoint); 8] = [
    (IntPoint::new(1, 0), IntPoint::new(0, 1)),
    (IntPoint::new(1, 0), IntPoint::new(0, -1)),
    (IntPoint::new(0, 1), IntPoint::new(1, 0)),
    (IntPoint::new(0, 1), IntPoint::new(-1, 0)),
    (IntPoint::new(-1, 0), IntPoint::new(0, 1)),
    (IntPoint::new(-1, 0), IntPoint::new(0, -1)),
    (IntPoint::new(0, -1), IntPoint::new(-1, 0)),
    (IntPoint::new(0, -1), IntPoint::new(1, 0)),
];

/// How the two incoming visibility sources of a mesh cell are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineStrategy {
    /// Sum the weighted contributions in each slot and across both slots
    #[default]
    Add,
    /// Keep the strongest contribution per slot and across both slots
    Max,
}

impl CombineStrategy {
    #[inline]
    fn accumulate(self, slot: &mut f32, amount: f32) {
        match self {
            CombineStrategy::Add => *slot += amount,
            CombineStrategy::Max => *slot = slot.max(amount),
        }
    }

    #[inline]
    fn merge(self, slots: [f32; 2]) -> f32 {
        match self {
            CombineStrategy::Add => slots[DIAGONAL] + slots[STRAIGHT],
            CombineStrategy::Max => slots[DIAGONAL].max(slots[STRAIGHT]),
        }
    }
}

/// Rhombus-mesh field-of-view algorithm.
#[derive(Debug, Clone)]
pub struct RhombusFov {
    /// Fraction of visibility lost over a full radius (0.0 = no falloff)
    pub decay_factor: f32,
    pub combine: CombineStrategy,
}

impl Default for RhombusFov {
    fn default() -> Self {
        RhombusFov {
            decay_factor: DEFAULT_DECAY_FACTOR,
            combine: CombineStrategy::default(),
        }
    }
}

impl RhombusFov {
    pub fn new(decay_factor: f32, combine: CombineStrategy) -> Result<Self> {
        validate_decay(decay_factor)?;
        Ok(RhombusFov {
            decay_factor,
            combine,
        })
    }

    /// Default decay with a custom combination strategy.
    pub fn with_combine(combine: CombineStrategy) -> Self {
        RhombusFov {
            combine,
            ..Self::default()
        }
    }
}

impl FovAlgorithm for RhombusFov {
    fn compute(&self, viewer: IntPoint, los_radius: f32, opacity: &Grid<f32>) -> Result<Grid<f32>> {
        check_viewer(opacity, viewer)?;
        validate_decay(self.decay_factor)?;

        if los_radius.is_infinite() {
            return Err(FovError::InvalidConfig(format!(
                "line-of-sight radius must be finite, got {los_radius}"
            )));
        }

        let mut fov = Grid::new(opacity.width(), opacity.height(), 0.0f32);
        fov[viewer] = 1.0;
        if !(los_radius > 0.0) {
            return Ok(fov);
        }

        let radius_sq = los_radius * los_radius;
        let decay_per_unit = self.decay_factor / los_radius;
        // No in-bounds cell is farther than the larger grid side along an axis
        let extent = los_radius.ceil().min(opacity.width().max(opacity.height()) as f32);
        let rmax = extent as i32 + 1;

        let reachable = |p: IntPoint| {
            opacity.in_bounds(p) && ((p - viewer).squared_length() as f32) <= radius_sq
        };
        let decay = |p: IntPoint| (p - viewer).length() * decay_per_unit;

        // Straight and diagonal rays, decay deferred
        let mut rays = Vec::new();
        for dir in RAYS {
            for i in 1..rmax {
                let p = viewer + dir * i;
                if reachable(p) {
                    rays.push(p);
                    let prev = p - dir;
                    fov[p] = opacity[prev] * fov[prev];
                }
            }
        }

        let mut cache = Grid::new(rmax as usize, rmax as usize, [0.0f32; 2]);
        for (fwd, up) in OCTANTS {
            let diag = fwd + up;
            cache.fill([0.0; 2]);

            for row in 0..rmax {
                for col in row..rmax {
                    if col == 0 {
                        continue;
                    }
                    let p = viewer + fwd * col + up * row;
                    if !reachable(p) {
                        continue;
                    }

                    let mesh = IntPoint::new(col, row);
                    let inner = row != 0 && row != col;
                    let (slots, amt) = if inner {
                        let slots = cache[mesh];
                        (slots, self.combine.merge(slots))
                    } else {
                        ([fov[p]; 2], fov[p])
                    };
                    let vis = opacity[p];
                    let mult = col as f32 / (col as f32 + 1.0);

                    // Neighbours are in bounds and inside the radius here,
                    // so col + 1 < rmax and the cache index stays in range.
                    if col != row && reachable(p + diag) {
                        let weight = 1.0 - ((row + 1) as f32 * mult - row as f32);
                        let idx = incoming_slot(true, col + 1, row + 1);
                        let amount = slots[idx] * weight * vis;
                        let target = IntPoint::new(col + 1, row + 1);
                        self.combine.accumulate(&mut cache[target][DIAGONAL], amount);
                    }

                    if row > 0 && reachable(p + fwd) {
                        let weight = 1.0 - (row as f32 - row as f32 * mult);
                        let idx = incoming_slot(false, col + 1, row);
                        let amount = slots[idx] * weight * vis;
                        let target = IntPoint::new(col + 1, row);
                        self.combine.accumulate(&mut cache[target][STRAIGHT], amount);
                    }

                    // Rays are shared between octants; they get decay at the end
                    if inner {
                        fov[p] = (amt - decay(p)).max(0.0);
                    }
                }
            }
        }

        for p in rays {
            fov[p] = (fov[p] - decay(p)).max(0.0);
        }

        Ok(fov)
    }
}

/// Which incoming slot of the cell at mesh position (col, row) feeds the
/// neighbour being updated: the one whose source direction lines up better
/// with the neighbour's direction from the viewer.
fn incoming_slot(from_diagonal: bool, col: i32, row: i32) -> usize {
    // Mesh column to square-grid column
    let col = col - row;
    let n = direction(IntPoint::new(col, row));
    let (a, b) = if from_diagonal {
        (IntPoint::new(col - 2, row - 2), IntPoint::new(col - 2, row - 1))
    } else {
        (IntPoint::new(col - 2, row - 1), IntPoint::new(col - 2, row))
    };
    if dot(direction(a), n) > dot(direction(b), n) {
        DIAGONAL
    } else {
        STRAIGHT
    }
}

/// Unit vector, or zero for the zero vector.
fn direction(p: IntPoint) -> [f32; 2] {
    if p == IntPoint::ZERO {
        [0.0; 2]
    } else {
        p.normalized()
    }
}

#[inline]
fn dot(a: [f32; 2], b: [f32; 2]) -> f32 {
    a[0] * b[0] + a[1] * b[1]
}
