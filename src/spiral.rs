//! Distance-ordered ("spiral") traversal of integer offsets.
//!
//! Built once for a maximum radius and shared read-only by every query that
//! stays within it.

use crate::error::{FovError, Result};
use crate::fov::DEFAULT_MAX_RADIUS;
use crate::point::IntPoint;

/// Largest radius a spiral can be built for. Squared lengths stay well inside
/// `i32` and the offset table stays a few tens of megabytes.
pub const MAX_SPIRAL_RADIUS: usize = 1024;

/// Every offset in the square `[-R, R]²`, sorted by squared length.
///
/// Ties keep their enumeration order (rows top to bottom, then columns left to
/// right), so the traversal is identical on every build.
#[derive(Debug, Clone)]
pub struct OffsetSpiral {
    max_radius: usize,
    points: Vec<IntPoint>,
    keys: Vec<i32>,
}

impl OffsetSpiral {
    /// Enumerate and sort every offset within `max_radius`.
    ///
    /// Fails with `InvalidConfig` above `MAX_SPIRAL_RADIUS`.
    pub fn new(max_radius: usize) -> Result<Self> {
        if max_radius > MAX_SPIRAL_RADIUS {
            return Err(FovError::InvalidConfig(format!(
                "spiral radius must be at most {MAX_SPIRAL_RADIUS}, got {max_radius}"
            )));
        }
        Ok(Self::build(max_radius))
    }

    /// `max_radius` is at most `MAX_SPIRAL_RADIUS`, so it fits an `i32`.
    fn build(max_radius: usize) -> Self {
        let r = max_radius as i32;
        let mut points = Vec::with_capacity((2 * max_radius + 1).pow(2));
        for y in -r..=r {
            for x in -r..=r {
                points.push(IntPoint::new(x, y));
            }
        }
        // sort_by_key is stable
        points.sort_by_key(|p| p.squared_length());
        let keys = points.iter().map(|p| p.squared_length()).collect();

        log::debug!("Built offset spiral: radius {}, {} offsets", max_radius, points.len());

        OffsetSpiral {
            max_radius,
            points,
            keys,
        }
    }

    pub fn max_radius(&self) -> usize {
        self.max_radius
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[IntPoint] {
        &self.points
    }

    /// Squared lengths parallel to `points()`, non-decreasing.
    pub fn keys(&self) -> &[i32] {
        &self.keys
    }

    /// Offsets whose squared length lies in `[r_inner², r_outer²]`, nearest
    /// first. Empty when nothing falls in range, including `r_inner > r_outer`.
    pub fn range(&self, r_inner: f32, r_outer: f32) -> &[IntPoint] {
        let inner_sq = f64::from(r_inner) * f64::from(r_inner);
        let outer_sq = f64::from(r_outer) * f64::from(r_outer);

        let start = self.keys.partition_point(|&k| f64::from(k) < inner_sq);
        let end = self.keys.partition_point(|&k| f64::from(k) <= outer_sq);

        if start >= end {
            &[]
        } else {
            &self.points[start..end]
        }
    }
}

/// Spiral for `DEFAULT_MAX_RADIUS`.
impl Default for OffsetSpiral {
    fn default() -> Self {
        Self::build(DEFAULT_MAX_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_square_sorted() {
        let spiral = OffsetSpiral::new(4).unwrap();
        assert_eq!(spiral.len(), 81);
        assert_eq!(spiral.points()[0], IntPoint::ZERO);
        assert!(spiral.keys().windows(2).all(|w| w[0] <= w[1]));
        for (p, &k) in spiral.points().iter().zip(spiral.keys()) {
            assert_eq!(p.squared_length(), k);
        }
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let spiral = OffsetSpiral::new(3).unwrap();
        assert_eq!(
            spiral.range(1.0, 1.0),
            &[
                IntPoint::new(0, -1),
                IntPoint::new(-1, 0),
                IntPoint::new(1, 0),
                IntPoint::new(0, 1),
            ]
        );
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let spiral = OffsetSpiral::new(5).unwrap();

        assert_eq!(spiral.range(0.0, 0.0), &[IntPoint::ZERO]);

        // Radius 2 includes the distance-2 axis cells but not (2,1)
        let ring = spiral.range(1.0, 2.0);
        assert_eq!(ring.len(), 12);
        assert!(ring.contains(&IntPoint::new(0, 2)));
        assert!(!ring.contains(&IntPoint::new(2, 1)));
        assert!(!ring.contains(&IntPoint::ZERO));

        // Fractional outer radius
        let with_knight = spiral.range(1.0, 2.3);
        assert!(with_knight.contains(&IntPoint::new(2, 1)));
    }

    #[test]
    fn test_empty_ranges() {
        let spiral = OffsetSpiral::new(5).unwrap();
        assert!(spiral.range(3.0, 2.0).is_empty());
        assert!(spiral.range(1.0, 0.5).is_empty());
        assert!(spiral.range(1.1, 1.3).is_empty());
    }

    #[test]
    fn test_range_is_repeatable() {
        let a = OffsetSpiral::new(6).unwrap();
        let b = OffsetSpiral::new(6).unwrap();
        assert_eq!(a.range(1.0, 6.0), b.range(1.0, 6.0));
        assert_eq!(a.range(2.0, 4.5), a.range(2.0, 4.5));
    }

    #[test]
    fn test_rejects_oversized_radius() {
        assert!(OffsetSpiral::new(MAX_SPIRAL_RADIUS + 1).is_err());
        assert!(matches!(
            OffsetSpiral::new(usize::MAX),
            Err(FovError::InvalidConfig(_))
        ));
        assert_eq!(OffsetSpiral::new(0).unwrap().points(), &[IntPoint::ZERO]);
    }
}
