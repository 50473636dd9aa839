//! Line with a box tip, for single-axis scaling

use super::{line_part, unit_box, ShapePart};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::gizmo::{GizmoResult, MeshTriData};

/// Box-tipped line dimensions along the shape's +Y
#[derive(Debug, Clone, PartialEq)]
pub struct BoxLineGeometry {
    /// Distance from the gizmo origin to the start of the line
    pub gap: f32,
    /// Line diameter
    pub line_thickness: f32,
    /// Line length
    pub line_length: f32,
    /// Edge length of the tip box
    pub box_size: f32,
    /// Extra pick thickness around the line
    pub tolerance: f32,
}

impl Default for BoxLineGeometry {
    fn default() -> Self {
        Self {
            gap: 0.0,
            line_thickness: 0.02,
            line_length: 0.5,
            box_size: 0.12,
            tolerance: 0.1,
        }
    }
}

impl BoxLineGeometry {
    fn tip(&self) -> Transform {
        Transform::new(
            Vec3::new(0.0, self.gap + self.line_length + self.box_size * 0.5, 0.0),
            Quat::identity(),
            Vec3::repeat(self.box_size),
        )
    }

    pub(super) fn parts(&self) -> Vec<ShapePart> {
        vec![
            line_part(self.gap, self.line_length, self.line_thickness),
            ShapePart::new(unit_box(), self.tip()),
        ]
    }

    pub(super) fn collision(&self) -> GizmoResult<Vec<MeshTriData>> {
        let line = line_part(self.gap, self.line_length, self.line_thickness + self.tolerance);
        Ok(vec![
            MeshTriData::new(&unit_box(), self.tip().to_matrix(), 0)?,
            line.tri_data(0)?,
        ])
    }
}
