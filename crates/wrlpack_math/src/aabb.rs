use crate::{Interval, Vec3};

/// Axis-aligned bounding box, stored as one interval per axis.
///
/// Unlike a BVH box this is never padded: a flat mesh keeps a zero-width
/// extent on its flat axis so the written bounds match the data exactly.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Bounding box of a point cloud. Empty input gives an empty box.
    pub fn from_point_cloud(points: &[Vec3]) -> Self {
        points
            .iter()
            .fold(Self::EMPTY, |aabb, &point| aabb.include(point))
    }

    /// Grow the box so it contains `point`.
    pub fn include(&self, point: Vec3) -> Aabb {
        Self {
            x: self.x.include(point.x),
            y: self.y.include(point.y),
            z: self.z.include(point.z),
        }
    }

    /// True if no point has been added to the box.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}
