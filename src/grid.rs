//! Dense row-major 2D container for opacity inputs and visibility outputs

use crate::error::{FovError, Result};
use crate::point::IntPoint;
use std::ops::{AddAssign, Index, IndexMut};

/// Dense 2D array addressed by `IntPoint`, stored row-major
/// (index = y * width + x).
///
/// `get`/`set`/`add` report out-of-bounds access as an error. Indexing with
/// `grid[p]` panics instead and is meant for hot loops that have already
/// checked `in_bounds`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid with every cell set to `fill`.
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Grid {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Grid<T> {
    /// Wrap existing row-major data.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(FovError::DimensionMismatch {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Grid { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn in_bounds(&self, p: IntPoint) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width && (p.y as usize) < self.height
    }

    #[inline]
    fn index_of(&self, p: IntPoint) -> Result<usize> {
        if self.in_bounds(p) {
            Ok(p.y as usize * self.width + p.x as usize)
        } else {
            Err(FovError::OutOfBounds {
                pos: p,
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn set(&mut self, p: IntPoint, value: T) -> Result<()> {
        let idx = self.index_of(p)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Position of the cell at a row-major index.
    pub fn position_of(&self, index: usize) -> IntPoint {
        IntPoint::new((index % self.width) as i32, (index / self.width) as i32)
    }

    /// All cell positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = IntPoint> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..height).flat_map(move |y| (0..width).map(move |x| IntPoint::new(x, y)))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn same_size<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Copy> Grid<T> {
    pub fn get(&self, p: IntPoint) -> Result<T> {
        let idx = self.index_of(p)?;
        Ok(self.data[idx])
    }
}

impl<T: AddAssign> Grid<T> {
    /// Read-modify-write: `cell += delta`.
    pub fn add(&mut self, p: IntPoint, delta: T) -> Result<()> {
        let idx = self.index_of(p)?;
        self.data[idx] += delta;
        Ok(())
    }
}

impl<T> Index<IntPoint> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, p: IntPoint) -> &T {
        match self.index_of(p) {
            Ok(idx) => &self.data[idx],
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T> IndexMut<IntPoint> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, p: IntPoint) -> &mut T {
        match self.index_of(p) {
            Ok(idx) => &mut self.data[idx],
            Err(e) => panic!("{e}"),
        }
    }
}

impl Grid<f32> {
    /// Formats a scalar grid for debugging, y going down.
    pub fn to_display_string(&self) -> String {
        let mut result = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                result.push_str(&format!("{:5.2} ", self.data[y * self.width + x]));
            }
            result.push('\n');
        }
        result
    }
}
