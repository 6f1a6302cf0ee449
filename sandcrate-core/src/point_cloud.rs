//! Point cloud output container
//!
//! The point cloud output mode rewrites one of these every cycle, so the
//! container is kept to what that needs: clearing without freeing, bulk
//! extension from the scene grid, and indexed reads for the host.

use crate::point::ColoredPoint3f;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Points in grid order, one per scene cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// Output of the point cloud mode
pub type ColoredPointCloud3f = PointCloud<ColoredPoint3f>;

impl<T> PointCloud<T> {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Cloud sized for a grid of `capacity` cells
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }

    /// Drop every point but keep the allocation for the next cycle
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> Extend<T> for PointCloud<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point3f, Rgba};

    fn cell(x: f32, color: Rgba) -> ColoredPoint3f {
        ColoredPoint3f::new(Point3f::new(x, 0.0, 0.0), color)
    }

    #[test]
    fn test_rewrite_keeps_allocation() {
        let mut cloud = ColoredPointCloud3f::with_capacity(16);
        cloud.extend((0..16).map(|i| cell(i as f32, Rgba::WHITE)));
        let capacity = cloud.points.capacity();

        cloud.clear();
        assert!(cloud.is_empty());
        cloud.extend((0..16).map(|i| cell(-(i as f32), Rgba::BLACK)));

        assert_eq!(cloud.len(), 16);
        assert_eq!(cloud.points.capacity(), capacity);
        assert_eq!(cloud[3].position.x, -3.0);
        assert!(cloud.iter().all(|p| p.color == Rgba::BLACK));
    }
}
