//! Quad between two axes, for planar translation and scaling

use super::{unit_quad, ShapePart};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::gizmo::{GizmoResult, MeshTriData};

/// Quad dimensions
///
/// The quad lies in the shape's XZ plane, offset from the origin into the
/// positive quadrant so it does not cover the axis lines.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneGeometry {
    /// Edge length
    pub size: f32,
    /// Distance from the axis lines
    pub gap: f32,
}

impl Default for PlaneGeometry {
    fn default() -> Self {
        Self { size: 0.2, gap: 0.1 }
    }
}

impl PlaneGeometry {
    fn transform(&self) -> Transform {
        let offset = self.gap + self.size * 0.5;
        Transform::new(
            Vec3::new(offset, 0.0, offset),
            Quat::identity(),
            Vec3::new(self.size, 1.0, self.size),
        )
    }

    pub(super) fn parts(&self) -> Vec<ShapePart> {
        vec![ShapePart::new(unit_quad(), self.transform())]
    }

    pub(super) fn collision(&self) -> GizmoResult<Vec<MeshTriData>> {
        Ok(vec![MeshTriData::new(&unit_quad(), self.transform().to_matrix(), 0)?])
    }
}
