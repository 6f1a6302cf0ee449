//! Core traits for sandcrate

use crate::{mesh::*, point::*, point_cloud::*};

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }
}

fn bounds_of<I: IntoIterator<Item = Point3f>>(points: I) -> (Point3f, Point3f) {
    let mut iter = points.into_iter();
    let Some(first) = iter.next() else {
        return (Point3f::origin(), Point3f::origin());
    };

    iter.fold((first, first), |(mut min, mut max), p| {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);

        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
        (min, max)
    })
}

impl<T> Drawable for PointCloud<T>
where
    T: Clone + Copy,
    Point3f: From<T>,
{
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(self.points.iter().map(|p| Point3f::from(*p)))
    }
}

impl Drawable for GridMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(self.vertices.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    #[test]
    fn test_point_cloud_bounds() {
        let cloud = PointCloud::from_points(vec![
            ColoredPoint3f::new(Point3f::new(-1.0, 2.0, 0.5), Rgba::WHITE),
            ColoredPoint3f::new(Point3f::new(3.0, -2.0, 1.5), Rgba::BLACK),
        ]);
        let (min, max) = cloud.bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -2.0, 0.5));
        assert_eq!(max, Point3f::new(3.0, 2.0, 1.5));
        assert_eq!(cloud.center(), Point3f::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_empty_bounds_are_origin() {
        let mesh = GridMesh::new();
        assert_eq!(mesh.bounding_box(), (Point3f::origin(), Point3f::origin()));
    }
}
