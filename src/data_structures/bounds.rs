//! Axis-aligned bounding volume reduced to a center and a scalar size.

use cgmath::{EuclideanSpace, InnerSpace, Point3};

/// Center and diagonal length of the axis-aligned box around a point set.
///
/// Computed once per asset and never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingVolume {
    center: Point3<f32>,
    extent_size: f32,
}

impl BoundingVolume {
    /// Bounding volume of `points`, `None` if there are none.
    ///
    /// Coincident points yield an `extent_size` of zero; rejecting that is up
    /// to the caller.
    pub fn from_points(points: &[Point3<f32>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (min, max) = rest.iter().fold((*first, *first), |(min, max), p| {
            (
                Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        });
        Some(Self {
            center: min.midpoint(max),
            extent_size: (max - min).magnitude(),
        })
    }

    pub fn new(center: Point3<f32>, extent_size: f32) -> Self {
        Self {
            center,
            extent_size,
        }
    }

    pub fn center(&self) -> Point3<f32> {
        self.center
    }

    pub fn extent_size(&self) -> f32 {
        self.extent_size
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.extent_size > 0.0) || !self.extent_size.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> Vec<Point3<f32>> {
        let mut corners = Vec::new();
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    corners.push(Point3::new(x, y, z));
                }
            }
        }
        corners
    }

    #[test]
    fn should_bound_unit_cube() {
        let bounds = BoundingVolume::from_points(&cube()).unwrap();
        assert_eq!(bounds.center(), Point3::new(0.0, 0.0, 0.0));
        assert!((bounds.extent_size() - 12f32.sqrt()).abs() < 1e-6);
        assert!(!bounds.is_degenerate());
    }

    #[test]
    fn should_center_offset_geometry() {
        let points = [Point3::new(2.0, 0.0, 1.0), Point3::new(4.0, 3.0, 1.0)];
        let bounds = BoundingVolume::from_points(&points).unwrap();
        assert_eq!(bounds.center(), Point3::new(3.0, 1.5, 1.0));
        assert!((bounds.extent_size() - 13f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn coincident_points_should_have_zero_extent() {
        let points = vec![Point3::new(1.0, 2.0, 3.0); 5];
        let bounds = BoundingVolume::from_points(&points).unwrap();
        assert_eq!(bounds.extent_size(), 0.0);
        assert!(bounds.is_degenerate());
    }

    #[test]
    fn empty_input_has_no_bounds() {
        assert!(BoundingVolume::from_points(&[]).is_none());
    }
}
