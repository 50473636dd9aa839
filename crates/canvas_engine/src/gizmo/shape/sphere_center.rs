//! Sphere at the gizmo origin, for free translation

use super::box_center::CENTER_PRIORITY;
use super::{unit_sphere, ShapePart};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::gizmo::{GizmoResult, MeshTriData};

/// Center sphere dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct SphereCenterGeometry {
    /// Sphere radius
    pub radius: f32,
    /// Extra pick radius
    pub tolerance: f32,
}

impl Default for SphereCenterGeometry {
    fn default() -> Self {
        Self {
            radius: 0.1,
            tolerance: 0.05,
        }
    }
}

impl SphereCenterGeometry {
    fn scaled(radius: f32) -> Transform {
        Transform::new(Vec3::zeros(), Quat::identity(), Vec3::repeat(radius * 2.0))
    }

    pub(super) fn parts(&self) -> Vec<ShapePart> {
        vec![ShapePart::new(unit_sphere(), Self::scaled(self.radius))]
    }

    pub(super) fn collision(&self) -> GizmoResult<Vec<MeshTriData>> {
        let ptm = Self::scaled(self.radius + self.tolerance).to_matrix();
        Ok(vec![MeshTriData::new(&unit_sphere(), ptm, CENTER_PRIORITY)?])
    }
}
