//! Box at the gizmo origin, for uniform scaling

use super::{unit_box, ShapePart};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::gizmo::{GizmoResult, MeshTriData};

/// Pick priority of center handles, above the axis handles they overlap
pub const CENTER_PRIORITY: u32 = 2;

/// Center box dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct BoxCenterGeometry {
    /// Edge length
    pub size: f32,
    /// Extra pick size
    pub tolerance: f32,
}

impl Default for BoxCenterGeometry {
    fn default() -> Self {
        Self {
            size: 0.12,
            tolerance: 0.05,
        }
    }
}

impl BoxCenterGeometry {
    fn scaled(size: f32) -> Transform {
        Transform::new(Vec3::zeros(), Quat::identity(), Vec3::repeat(size))
    }

    pub(super) fn parts(&self) -> Vec<ShapePart> {
        vec![ShapePart::new(unit_box(), Self::scaled(self.size))]
    }

    pub(super) fn collision(&self) -> GizmoResult<Vec<MeshTriData>> {
        let ptm = Self::scaled(self.size + self.tolerance).to_matrix();
        Ok(vec![MeshTriData::new(&unit_box(), ptm, CENTER_PRIORITY)?])
    }
}
