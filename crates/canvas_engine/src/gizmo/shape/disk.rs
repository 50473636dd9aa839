//! Ring around the shape's +Y, for rotation

use super::ShapePart;
use crate::foundation::math::Transform;
use crate::gizmo::{GizmoResult, MeshTriData};
use crate::scene::Mesh;

const RING_SEGMENTS: u32 = 64;
const RING_SIDES: u32 = 8;
const PICK_SEGMENTS: u32 = 32;
const PICK_SIDES: u32 = 6;

/// Ring dimensions
///
/// Unlike the other shapes the torus proportions cannot be expressed as a
/// part scale, so every change regenerates the meshes and collision data.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskGeometry {
    /// Tube radius
    pub tube_radius: f32,
    /// Ring radius
    pub ring_radius: f32,
    /// Swept angle in degrees
    pub sector_angle: f32,
    /// Extra pick radius around the tube
    pub tolerance: f32,
}

impl Default for DiskGeometry {
    fn default() -> Self {
        Self {
            tube_radius: 0.01,
            ring_radius: 0.5,
            sector_angle: 360.0,
            tolerance: 0.05,
        }
    }
}

impl DiskGeometry {
    /// Ring of the given radius
    pub fn with_ring_radius(ring_radius: f32) -> Self {
        Self {
            ring_radius,
            ..Self::default()
        }
    }

    pub(super) fn parts(&self) -> Vec<ShapePart> {
        let mesh = Mesh::torus(self.tube_radius, self.ring_radius, self.sector_angle, RING_SEGMENTS, RING_SIDES);
        vec![ShapePart::new(mesh, Transform::identity())]
    }

    pub(super) fn collision(&self) -> GizmoResult<Vec<MeshTriData>> {
        let mesh = Mesh::torus(
            self.tube_radius + self.tolerance,
            self.ring_radius,
            self.sector_angle,
            PICK_SEGMENTS,
            PICK_SIDES,
        );
        Ok(vec![MeshTriData::new(&mesh, Transform::identity().to_matrix(), 0)?])
    }
}
