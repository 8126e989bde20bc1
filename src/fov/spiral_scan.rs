//! Spiral-scan visibility propagation.
//!
//! Cells are visited in non-decreasing distance from the viewer using a shared
//! `OffsetSpiral`. Each cell derives its visibility from one or two neighbours
//! one step closer to the viewer:
//!
//! - Axis-aligned and exact-diagonal cells read the single cell at `p - sign(o)`.
//! - Other cells blend the axis neighbour (one step back along the dominant
//!   axis) and the diagonal neighbour, weighted by the minor component of the
//!   normalized offset.
//!
//! A neighbour contributes `opacity * visibility`; the distance decay between
//! the neighbour and the cell is then subtracted and the result clamped at 0.

use std::collections::VecDeque;
use std::sync::Arc;

use super::{FovAlgorithm, FovConfig, check_viewer, lerp, validate_decay};
use crate::error::{FovError, Result};
use crate::grid::Grid;
use crate::point::IntPoint;
use crate::spiral::OffsetSpiral;

/// Once the scan is this far past the last visible ring, nothing farther can
/// become visible.
const EARLY_EXIT_MARGIN: f32 = 2.0;

/// Neighbours a cell's visibility was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predecessors {
    /// The viewer cell itself
    None,
    /// Axis-aligned or exact-diagonal cell
    Single(IntPoint),
    /// General octant cell: `lerp(axis, diagonal, t)`
    Pair {
        axis: IntPoint,
        diagonal: IntPoint,
        t: f32,
    },
}

/// One written cell of a field-of-view scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovStep {
    pub position: IntPoint,
    pub predecessors: Predecessors,
    pub value: f32,
}

/// Spiral-scan field-of-view propagator.
#[derive(Debug, Clone)]
pub struct SpiralFov {
    spiral: Arc<OffsetSpiral>,
    /// Fraction of visibility lost over a full radius (0.0 = no falloff)
    decay_factor: f32,
}

impl Default for SpiralFov {
    fn default() -> Self {
        SpiralFov {
            spiral: Arc::new(OffsetSpiral::default()),
            decay_factor: FovConfig::default().decay_factor,
        }
    }
}

impl SpiralFov {
    /// Build a propagator with its own offset spiral.
    pub fn new(config: &FovConfig) -> Result<Self> {
        config.validate()?;
        Ok(SpiralFov {
            spiral: Arc::new(OffsetSpiral::new(config.max_radius)?),
            decay_factor: config.decay_factor,
        })
    }

    /// Build a propagator sharing an existing offset spiral.
    pub fn with_spiral(spiral: Arc<OffsetSpiral>, decay_factor: f32) -> Result<Self> {
        validate_decay(decay_factor)?;
        Ok(SpiralFov {
            spiral,
            decay_factor,
        })
    }

    pub fn spiral(&self) -> &OffsetSpiral {
        &self.spiral
    }

    pub fn decay_factor(&self) -> f32 {
        self.decay_factor
    }

    /// Start a scan that yields one `FovStep` per written cell, viewer first.
    ///
    /// Dropping the iterator early leaves the rest of the grid unscanned;
    /// `FovSteps::into_grid` drains it and returns the visibility grid.
    pub fn steps<'a>(
        &'a self,
        viewer: IntPoint,
        los_radius: f32,
        opacity: &'a Grid<f32>,
    ) -> Result<FovSteps<'a>> {
        check_viewer(opacity, viewer)?;
        if los_radius > self.spiral.max_radius() as f32 {
            return Err(FovError::RadiusTooLarge {
                requested: los_radius,
                max: self.spiral.max_radius(),
            });
        }

        // Non-positive (or NaN) radius: only the viewer is visible
        let degenerate = !(los_radius > 0.0);
        let (offsets, decay_per_unit) = if degenerate {
            (&[][..], 0.0)
        } else {
            (self.spiral.range(1.0, los_radius), self.decay_factor / los_radius)
        };

        log::debug!(
            "FOV scan from {} radius {} ({} offsets)",
            viewer,
            los_radius,
            offsets.len()
        );

        let mut memo = Grid::new(opacity.width(), opacity.height(), None);
        memo[viewer] = Some(1.0);

        let mut pending = VecDeque::new();
        pending.push_back(FovStep {
            position: viewer,
            predecessors: Predecessors::None,
            value: 1.0,
        });

        Ok(FovSteps {
            scan: Scan {
                opacity,
                viewer,
                decay_per_unit,
                memo,
                max_radius_used: 0.0,
            },
            offsets: offsets.iter(),
            pending,
            finished: false,
        })
    }

    /// Compute a visibility grid, reporting every written cell to `on_set`.
    pub fn compute_observed(
        &self,
        viewer: IntPoint,
        los_radius: f32,
        opacity: &Grid<f32>,
        mut on_set: impl FnMut(IntPoint, f32),
    ) -> Result<Grid<f32>> {
        let mut steps = self.steps(viewer, los_radius, opacity)?;
        for step in steps.by_ref() {
            on_set(step.position, step.value);
        }
        Ok(steps.into_grid())
    }
}

impl FovAlgorithm for SpiralFov {
    fn compute(&self, viewer: IntPoint, los_radius: f32, opacity: &Grid<f32>) -> Result<Grid<f32>> {
        Ok(self.steps(viewer, los_radius, opacity)?.into_grid())
    }
}

/// Lazily produced sequence of written cells for a single query.
///
/// Not restartable: each cell is yielded exactly once.
pub struct FovSteps<'a> {
    scan: Scan<'a>,
    offsets: std::slice::Iter<'a, IntPoint>,
    pending: VecDeque<FovStep>,
    finished: bool,
}

impl FovSteps<'_> {
    /// Finish the scan and return the visibility grid (unvisited cells are 0).
    pub fn into_grid(mut self) -> Grid<f32> {
        while self.next().is_some() {}
        self.scan.memo.map(|v| v.unwrap_or(0.0))
    }

    /// Largest distance at which a non-zero visibility has been written so far.
    pub fn max_radius_used(&self) -> f32 {
        self.scan.max_radius_used
    }
}

impl Iterator for FovSteps<'_> {
    type Item = FovStep;

    fn next(&mut self) -> Option<FovStep> {
        loop {
            if let Some(step) = self.pending.pop_front() {
                return Some(step);
            }
            if self.finished {
                return None;
            }
            let Some(&offset) = self.offsets.next() else {
                self.finished = true;
                continue;
            };

            let p = self.scan.viewer + offset;
            if !self.scan.memo.in_bounds(p) {
                continue;
            }

            let distance = offset.length();
            if distance - self.scan.max_radius_used >= EARLY_EXIT_MARGIN {
                log::trace!(
                    "Early exit at distance {:.2}, last visible ring {:.2}",
                    distance,
                    self.scan.max_radius_used
                );
                self.finished = true;
                continue;
            }

            // Already resolved on demand by a farther cell
            if self.scan.memo[p].is_some() {
                continue;
            }
            self.scan.resolve(p, &mut self.pending);
        }
    }
}

/// Per-query propagation state. The memo doubles as the output grid.
struct Scan<'a> {
    opacity: &'a Grid<f32>,
    viewer: IntPoint,
    decay_per_unit: f32,
    memo: Grid<Option<f32>>,
    max_radius_used: f32,
}

impl Scan<'_> {
    #[inline]
    fn decay(&self, p: IntPoint) -> f32 {
        (p - self.viewer).length() * self.decay_per_unit
    }

    /// Visibility propagated out of `p`: its opacity times its visibility.
    fn contribution(&mut self, p: IntPoint, out: &mut VecDeque<FovStep>) -> f32 {
        let opacity = self.opacity[p];
        opacity * self.resolve(p, out)
    }

    /// Visibility at `p`, computing it (and any missing predecessors) on
    /// demand. Every newly computed cell is appended to `out`.
    ///
    /// Predecessors lie inside the box spanned by the viewer and `p`, so they
    /// are in bounds whenever `p` is. Each recursive step shortens the
    /// Chebyshev distance to the viewer, bounding the depth by the radius.
    fn resolve(&mut self, p: IntPoint, out: &mut VecDeque<FovStep>) -> f32 {
        if let Some(value) = self.memo[p] {
            return value;
        }

        let o = p - self.viewer;
        let sign = o.signum();
        let (ax, ay) = (o.x.abs(), o.y.abs());
        let cur_decay = self.decay(p);

        let (value, predecessors) = if ax == ay || ax == 0 || ay == 0 {
            let prev = p - sign;
            let amt = self.contribution(prev, out);
            let prev_decay = self.decay(prev);
            ((amt + prev_decay - cur_decay).max(0.0), Predecessors::Single(prev))
        } else {
            let diagonal = p - sign;
            // Step back along the dominant axis; weight by the minor one
            let (axis, minor) = if ax > ay {
                (IntPoint::new(p.x - sign.x, p.y), 1)
            } else {
                (IntPoint::new(p.x, p.y - sign.y), 0)
            };

            let amt_axis = self.contribution(axis, out);
            let amt_diag = self.contribution(diagonal, out);
            let t = o.abs().normalized()[minor];

            let amt = lerp(amt_axis, amt_diag, t);
            let prev_decay = lerp(self.decay(axis), self.decay(diagonal), t);
            (
                (amt + prev_decay - cur_decay).max(0.0),
                Predecessors::Pair { axis, diagonal, t },
            )
        };

        self.memo[p] = Some(value);
        if value > 0.0 {
            self.max_radius_used = self.max_radius_used.max(o.length());
        }
        out.push_back(FovStep {
            position: p,
            predecessors,
            value,
        });
        value
    }
}
