//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene graph, the camera,
//! the gizmo picking code and the render passes. Everything is a thin alias
//! over nalgebra so the rest of the crate can stay readable.
//!
//! Conventions: right-handed, Y-up. Cameras look down their local -Z axis and
//! clip space depth is in [-1, 1].

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

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
pub type Quat = nalgebra::UnitQuaternion<f32>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position, rotation and scale
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Create a transform from a transformation matrix
    ///
    /// Assumes the matrix has no shear. Zero scale axes collapse to an
    /// identity rotation rather than producing NaNs.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);
        let scale = mat4_scale(matrix);

        let safe = |s: f32| if s.abs() > f32::EPSILON { s } else { 1.0 };
        let rotation_matrix = Mat3::new(
            matrix.m11 / safe(scale.x), matrix.m12 / safe(scale.y), matrix.m13 / safe(scale.z),
            matrix.m21 / safe(scale.x), matrix.m22 / safe(scale.y), matrix.m23 / safe(scale.z),
            matrix.m31 / safe(scale.x), matrix.m32 / safe(scale.y), matrix.m33 / safe(scale.z),
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Extract per-axis scale from the basis columns of an affine matrix
pub fn mat4_scale(matrix: &Mat4) -> Vec3 {
    Vec3::new(
        Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude(),
        Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude(),
        Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude(),
    )
}

/// Transform a point by a full 4x4 matrix, including the perspective divide
pub fn project_point(matrix: &Mat4, point: &Vec3) -> Vec3 {
    let v = matrix * Vec4::new(point.x, point.y, point.z, 1.0);
    if v.w.abs() > f32::EPSILON {
        Vec3::new(v.x / v.w, v.y / v.w, v.z / v.w)
    } else {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Transform a direction by the upper 3x3 part of a matrix (no translation)
pub fn transform_vector(matrix: &Mat4, vector: &Vec3) -> Vec3 {
    let v = matrix * Vec4::new(vector.x, vector.y, vector.z, 0.0);
    Vec3::new(v.x, v.y, v.z)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Quat, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Quantize a value to the nearest multiple of `increment`
    pub fn snap(value: f32, increment: f32) -> f32 {
        if increment <= 0.0 {
            return value;
        }
        (value / increment).round() * increment
    }

    /// Quantize every component of a vector to the nearest multiple of `increment`
    pub fn snap_vec3(value: &Vec3, increment: f32) -> Vec3 {
        value.map(|c| snap(c, increment))
    }

    /// Rotation of `degrees` around `axis` (which does not need to be normalized)
    ///
    /// A zero-length axis yields the identity rotation.
    pub fn quat_from_axis_angle_deg(axis: &Vec3, degrees: f32) -> Quat {
        match nalgebra::Unit::try_new(*axis, 1.0e-8) {
            Some(axis) => Quat::from_axis_angle(&axis, deg_to_rad(degrees)),
            None => Quat::identity(),
        }
    }

    /// Rotation from Euler angles in degrees (applied X, then Y, then Z)
    pub fn quat_from_euler_deg(x: f32, y: f32, z: f32) -> Quat {
        Quat::from_euler_angles(deg_to_rad(x), deg_to_rad(y), deg_to_rad(z))
    }
}

/// Extension trait for Mat4 with projection helpers
pub trait Mat4Ext {
    /// Right-handed perspective projection, clip depth in [-1, 1]
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed orthographic projection; `height` is the half-height of the view volume
    fn orthographic(height: f32, aspect: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn orthographic(height: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let width = height * aspect;
        Mat4::new_orthographic(-width, width, -height, height, near, far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_matrix_roundtrip() {
        let transform = Transform::new(
            Vec3::new(1.0, -2.0, 3.0),
            utils::quat_from_euler_deg(10.0, 45.0, -30.0),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let back = Transform::from_matrix(&transform.to_matrix());

        assert_relative_eq!(back.position, transform.position, epsilon = 1e-5);
        assert_relative_eq!(back.scale, transform.scale, epsilon = 1e-5);
        assert!(back.rotation.angle_to(&transform.rotation) < 1e-4);
    }

    #[test]
    fn test_snap() {
        assert_relative_eq!(utils::snap(2.37, 1.0), 2.0);
        assert_relative_eq!(utils::snap(-0.74, 0.5), -0.5);
        assert_relative_eq!(utils::snap(7.0, 0.0), 7.0);
    }

    #[test]
    fn test_project_point_divides_by_w() {
        let proj = Mat4::perspective(utils::deg_to_rad(90.0), 1.0, 0.1, 100.0);
        let ndc = project_point(&proj, &Vec3::new(0.0, 0.0, -100.0));
        assert_relative_eq!(ndc.z, 1.0, epsilon = 1e-4);
    }
}
