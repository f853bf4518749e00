//! Camera component

use std::any::Any;

use approx::relative_eq;
use nalgebra::Perspective3;

use super::{Component, Property};
use crate::foundation::math::{constants::DEG_TO_RAD, Mat4};
use crate::foundation::string_id::StringId;

/// Perspective camera parameters attached to the node it views from.
///
/// The node's global transform is the camera pose; the scene's view matrix is
/// its inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    near_plane: f32,
    far_plane: f32,
    /// Vertical field of view in degrees
    field_of_view: f32,
}

impl Camera {
    /// Component type id
    pub const ID: StringId = StringId::new("Camera");

    /// "Near Plane" property
    pub const NEAR_PLANE: StringId = StringId::new("Near Plane");

    /// "Far Plane" property
    pub const FAR_PLANE: StringId = StringId::new("Far Plane");

    /// "Field of Vision" property, in degrees
    pub const FIELD_OF_VIEW: StringId = StringId::new("Field of Vision");

    const PROPERTIES: [StringId; 3] = [Self::NEAR_PLANE, Self::FAR_PLANE, Self::FIELD_OF_VIEW];

    /// Create a camera with explicit parameters
    pub const fn new(field_of_view: f32, near_plane: f32, far_plane: f32) -> Self {
        Self {
            near_plane,
            far_plane,
            field_of_view,
        }
    }

    /// Distance to the near clipping plane
    pub const fn near_plane(&self) -> f32 {
        self.near_plane
    }

    /// Distance to the far clipping plane
    pub const fn far_plane(&self) -> f32 {
        self.far_plane
    }

    /// Vertical field of view in degrees
    pub const fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    /// Set the near clipping plane
    pub fn set_near_plane(&mut self, near_plane: f32) {
        self.near_plane = near_plane;
    }

    /// Set the far clipping plane
    pub fn set_far_plane(&mut self, far_plane: f32) {
        self.far_plane = far_plane;
    }

    /// Set the vertical field of view in degrees
    pub fn set_field_of_view(&mut self, field_of_view: f32) {
        self.field_of_view = field_of_view;
    }

    /// Right-handed perspective projection for a viewport of `aspect`
    /// (width / height).
    ///
    /// `None` when the aspect is zero, the clipping planes coincide or any
    /// parameter is not finite.
    pub fn projection_matrix(&self, aspect: f32) -> Option<Mat4> {
        let finite = [aspect, self.field_of_view, self.near_plane, self.far_plane]
            .iter()
            .all(|value| value.is_finite());
        if !finite
            || relative_eq!(aspect, 0.0)
            || relative_eq!(self.far_plane - self.near_plane, 0.0)
        {
            log::warn!(
                "Degenerate projection: aspect {aspect}, planes {}..{}",
                self.near_plane,
                self.far_plane
            );
            return None;
        }
        let projection = Perspective3::new(
            aspect,
            self.field_of_view * DEG_TO_RAD,
            self.near_plane,
            self.far_plane,
        );
        Some(projection.to_homogeneous())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(60.0, 1.0, 16000.0)
    }
}

impl Component for Camera {
    fn id(&self) -> StringId {
        Self::ID
    }

    fn property_info(&self) -> &'static [StringId] {
        &Self::PROPERTIES
    }

    fn property(&self, id: u32) -> Option<Property> {
        match id {
            id if id == Self::NEAR_PLANE.id() => Some(Property::Float(self.near_plane)),
            id if id == Self::FAR_PLANE.id() => Some(Property::Float(self.far_plane)),
            id if id == Self::FIELD_OF_VIEW.id() => Some(Property::Float(self.field_of_view)),
            _ => None,
        }
    }

    fn set_property(&mut self, id: u32, value: &Property) {
        let Some(value) = value.as_float() else {
            return;
        };
        match id {
            id if id == Self::NEAR_PLANE.id() => self.set_near_plane(value),
            id if id == Self::FAR_PLANE.id() => self.set_far_plane(value),
            id if id == Self::FIELD_OF_VIEW.id() => self.set_field_of_view(value),
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
