//! Line with a cone tip, for single-axis translation

use super::{line_part, unit_cone, ShapePart};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::gizmo::{GizmoResult, MeshTriData};

/// Arrow dimensions, in gizmo units along the shape's +Y
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowGeometry {
    /// Distance from the gizmo origin to the start of the line
    pub gap: f32,
    /// Line diameter
    pub line_thickness: f32,
    /// Line length
    pub line_length: f32,
    /// Cone base diameter
    pub arrow_thickness: f32,
    /// Cone height
    pub arrow_length: f32,
    /// Extra pick thickness around the line
    pub tolerance: f32,
}

impl Default for ArrowGeometry {
    fn default() -> Self {
        Self {
            gap: 0.0,
            line_thickness: 0.02,
            line_length: 0.5,
            arrow_thickness: 0.12,
            arrow_length: 0.18,
            tolerance: 0.1,
        }
    }
}

impl ArrowGeometry {
    fn tip(&self) -> Transform {
        Transform::new(
            Vec3::new(0.0, self.gap + self.line_length + self.arrow_length * 0.5, 0.0),
            Quat::identity(),
            Vec3::new(self.arrow_thickness, self.arrow_length, self.arrow_thickness),
        )
    }

    pub(super) fn parts(&self) -> Vec<ShapePart> {
        vec![
            line_part(self.gap, self.line_length, self.line_thickness),
            ShapePart::new(unit_cone(), self.tip()),
        ]
    }

    pub(super) fn collision(&self) -> GizmoResult<Vec<MeshTriData>> {
        let line = line_part(self.gap, self.line_length, self.line_thickness + self.tolerance);
        Ok(vec![
            MeshTriData::new(&unit_cone(), self.tip().to_matrix(), 0)?,
            line.tri_data(0)?,
        ])
    }
}
