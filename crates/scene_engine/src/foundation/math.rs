//! Math utilities and types
//!
//! Provides the vector, matrix and quaternion aliases used by the scene graph
//! together with the scale/rotation/translation [`Transform`] value type.

use std::ops::{Mul, MulAssign};

use approx::{AbsDiffEq, RelativeEq};

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Scale, rotation and translation of a node.
///
/// Transforms compose by multiplication: `a * b` is the transform that applies
/// `b` first and `a` second, so a child's global transform is
/// `parent_global * child_local`.
///
/// Scale is carried separately from the rigid part: composing multiplies the
/// scales per axis but does not stretch the right-hand translation, so a
/// parent's scale sizes its children without pushing them apart. This keeps
/// composition associative and every transform exactly invertible, whatever
/// the scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Scale factors
    pub scale: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Translation in parent space
    pub translation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: Quat::identity(),
            translation: Vec3::zeros(),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from all three parts
    pub const fn new(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self {
            scale,
            rotation,
            translation,
        }
    }

    /// Create a transform with only a translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Builder: replace the scale
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder: replace the scale with a uniform factor
    #[must_use]
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Builder: replace the rotation
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder: rotation from an axis and an angle in radians
    #[must_use]
    pub fn with_axis_angle(mut self, axis: Vec3, angle: f32) -> Self {
        self.rotation = Quat::from_axis_angle(&Unit::new_normalize(axis), angle);
        self
    }

    /// Builder: replace the translation
    #[must_use]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Get the inverse transform
    ///
    /// `t * t.inverse()` and `t.inverse() * t` are the identity and
    /// `t.inverse().inverse() == t` within floating-point tolerance.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_scale = Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_rotation = self.rotation.inverse();
        let inv_translation = inv_rotation * -self.translation;

        Self {
            scale: inv_scale,
            rotation: inv_rotation,
            translation: inv_translation,
        }
    }

    /// Convert to a transformation matrix (T * R * S)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        Point3::from(self.translation + self.rotation * self.scale.component_mul(&point.coords))
    }

    /// Apply the rotation and scale of this transform to a vector
    pub fn transform_vector(&self, vector: &Vec3) -> Vec3 {
        self.rotation * self.scale.component_mul(vector)
    }
}

impl Mul for Transform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            scale: self.scale.component_mul(&rhs.scale),
            rotation: self.rotation * rhs.rotation,
            translation: self.translation + self.rotation * rhs.translation,
        }
    }
}

impl Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: &Transform) -> Transform {
        *self * *rhs
    }
}

impl MulAssign for Transform {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl AbsDiffEq for Transform {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.scale.abs_diff_eq(&other.scale, epsilon)
            && self.rotation.abs_diff_eq(&other.rotation, epsilon)
            && self.translation.abs_diff_eq(&other.translation, epsilon)
    }
}

impl RelativeEq for Transform {
    fn default_max_relative() -> f32 {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        self.scale.relative_eq(&other.scale, epsilon, max_relative)
            && self.rotation.relative_eq(&other.rotation, epsilon, max_relative)
            && self.translation.relative_eq(&other.translation, epsilon, max_relative)
    }
}

/// Math constants
pub mod constants {
    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;
}
