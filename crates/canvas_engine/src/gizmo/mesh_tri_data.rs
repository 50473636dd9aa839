//! Collision triangle soup of one handle part

use super::tri::Tri;
use super::{GizmoError, GizmoResult};
use crate::foundation::math::Mat4;
use crate::scene::{Mesh, PrimitiveTopology};

/// Triangles of a unit collision mesh plus the part transform placing them
///
/// Triangles stay in the mesh's own space; picking combines the owning
/// node's world transform with `ptm` and moves the ray into that space.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTriData {
    tris: Vec<Tri>,
    /// Part transform relative to the owning shape node
    pub ptm: Mat4,
    /// Pick priority; higher wins over nearer hits
    pub priority: u32,
}

impl MeshTriData {
    /// Build from a triangle mesh
    pub fn new(mesh: &Mesh, ptm: Mat4, priority: u32) -> GizmoResult<Self> {
        let mut data = Self {
            tris: Vec::new(),
            ptm,
            priority,
        };
        data.set_tris(mesh)?;
        Ok(data)
    }

    /// Replace every triangle from `mesh`
    ///
    /// The previous triangles are kept if the mesh is rejected.
    pub fn set_tris(&mut self, mesh: &Mesh) -> GizmoResult<()> {
        if mesh.is_empty() {
            return Err(GizmoError::MissingMesh);
        }
        if mesh.topology != PrimitiveTopology::Triangles {
            return Err(GizmoError::InvalidPrimitive);
        }
        self.tris = mesh.triangles().map(|[a, b, c]| Tri::new(a, b, c)).collect();
        Ok(())
    }

    /// Collision triangles
    pub fn tris(&self) -> &[Tri] {
        &self.tris
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_builds_from_triangles() {
        let data = MeshTriData::new(&Mesh::cube(Vec3::new(0.5, 0.5, 0.5)), Mat4::identity(), 2).unwrap();
        assert_eq!(data.tris().len(), 12);
        assert_eq!(data.priority, 2);
    }

    #[test]
    fn test_rejects_bad_meshes() {
        assert_eq!(
            MeshTriData::new(&Mesh::default(), Mat4::identity(), 0),
            Err(GizmoError::MissingMesh)
        );

        let mut lines = Mesh::plane(1.0, 1.0);
        lines.topology = PrimitiveTopology::Lines;
        let err = MeshTriData::new(&lines, Mat4::identity(), 0).unwrap_err();
        assert_eq!(err.to_string(), "Invalid primitive type.");
    }

    #[test]
    fn test_rebuild_replaces_wholesale() {
        let mut data = MeshTriData::new(&Mesh::plane(1.0, 1.0), Mat4::identity(), 0).unwrap();
        assert_eq!(data.tris().len(), 2);
        data.set_tris(&Mesh::cube(Vec3::new(1.0, 1.0, 1.0))).unwrap();
        assert_eq!(data.tris().len(), 12);
        assert!(data.set_tris(&Mesh::default()).is_err());
        assert_eq!(data.tris().len(), 12);
    }
}
