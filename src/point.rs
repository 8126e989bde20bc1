//! Integer grid coordinates and offsets

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Immutable 2D integer coordinate, used both for cell positions and for
/// offsets relative to a viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    pub const ZERO: IntPoint = IntPoint::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        IntPoint { x, y }
    }

    /// Component-wise sign: -1, 0 or 1 per axis.
    pub fn signum(self) -> Self {
        IntPoint::new(self.x.signum(), self.y.signum())
    }

    pub fn abs(self) -> Self {
        IntPoint::new(self.x.abs(), self.y.abs())
    }

    pub fn dot(self, other: IntPoint) -> i32 {
        self.x * other.x + self.y * other.y
    }

    pub fn squared_length(self) -> i32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        (self.squared_length() as f32).sqrt()
    }

    /// Unit vector in floating point.
    ///
    /// The zero vector has no direction; it maps to the (1,1) diagonal so the
    /// result is always finite. Callers that care about the zero case must
    /// handle it themselves.
    pub fn normalized(self) -> [f32; 2] {
        let len = self.length();
        if len > 0.0 {
            [self.x as f32 / len, self.y as f32 / len]
        } else {
            [std::f32::consts::FRAC_1_SQRT_2; 2]
        }
    }

    /// Component by axis index (0 = x, 1 = y).
    pub fn get(self, axis: usize) -> i32 {
        if axis == 0 { self.x } else { self.y }
    }

    /// Chebyshev (chessboard) length.
    pub fn chebyshev_length(self) -> i32 {
        self.x.abs().max(self.y.abs())
    }
}

impl fmt::Display for IntPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for IntPoint {
    type Output = IntPoint;

    fn add(self, rhs: IntPoint) -> IntPoint {
        IntPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for IntPoint {
    type Output = IntPoint;

    fn sub(self, rhs: IntPoint) -> IntPoint {
        IntPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<i32> for IntPoint {
    type Output = IntPoint;

    fn mul(self, rhs: i32) -> IntPoint {
        IntPoint::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for IntPoint {
    type Output = IntPoint;

    fn neg(self) -> IntPoint {
        IntPoint::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = IntPoint::new(3, -2);
        let b = IntPoint::new(-1, 5);
        assert_eq!(a + b, IntPoint::new(2, 3));
        assert_eq!(a - b, IntPoint::new(4, -7));
        assert_eq!(a * 3, IntPoint::new(9, -6));
        assert_eq!(-a, IntPoint::new(-3, 2));
    }

    #[test]
    fn test_sign_and_abs() {
        assert_eq!(IntPoint::new(-7, 0).signum(), IntPoint::new(-1, 0));
        assert_eq!(IntPoint::new(4, -9).signum(), IntPoint::new(1, -1));
        assert_eq!(IntPoint::new(-4, -9).abs(), IntPoint::new(4, 9));
    }

    #[test]
    fn test_lengths() {
        let p = IntPoint::new(3, 4);
        assert_eq!(p.squared_length(), 25);
        assert!((p.length() - 5.0).abs() < 1e-6);
        assert_eq!(p.chebyshev_length(), 4);

        let [nx, ny] = p.normalized();
        assert!((nx - 0.6).abs() < 1e-6);
        assert!((ny - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_normalizes_to_finite_diagonal() {
        let [nx, ny] = IntPoint::ZERO.normalized();
        assert!(nx.is_finite() && ny.is_finite());
        assert!((nx * nx + ny * ny - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hash_key() {
        use std::collections::HashSet;
        let set: HashSet<IntPoint> = [IntPoint::new(1, 2), IntPoint::new(1, 2), IntPoint::new(2, 1)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }
}
