//! Axis-aligned bounding boxes

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Point3, Transform, Vec3};

/// Axis-aligned bounding box stored as a center and half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Center of the box
    pub center: Vec3,
    /// Half size along each axis
    pub radii: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            center: Vec3::zeros(),
            radii: Vec3::zeros(),
        }
    }
}

impl Aabb {
    /// Create a box from its center and half extents
    pub const fn new(center: Vec3, radii: Vec3) -> Self {
        Self { center, radii }
    }

    /// Create a box spanning two corners
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            radii: (max - min) * 0.5,
        }
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.center - self.radii
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.center + self.radii
    }

    /// Check if this box contains a point
    pub fn contains_point(&self, point: &Vec3) -> bool {
        let offset = point - self.center;
        offset.x.abs() <= self.radii.x
            && offset.y.abs() <= self.radii.y
            && offset.z.abs() <= self.radii.z
    }

    /// Check if this box intersects another
    pub fn intersects(&self, other: &Self) -> bool {
        let offset = other.center - self.center;
        let reach = self.radii + other.radii;
        offset.x.abs() <= reach.x && offset.y.abs() <= reach.y && offset.z.abs() <= reach.z
    }

    /// Smallest axis-aligned box containing this box moved by `transform`
    pub fn transformed(&self, transform: &Transform) -> Self {
        let center = transform.transform_point(&Point3::from(self.center)).coords;
        let rotation = transform.rotation.to_rotation_matrix().into_inner().abs();
        let radii = rotation * transform.scale.abs().component_mul(&self.radii);
        Self { center, radii }
    }
}
