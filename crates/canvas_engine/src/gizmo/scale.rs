//! Scale handles: uniform center box, plane quads and box-tipped lines
//!
//! Scaling always happens in each node's local frame, so the kind is locked
//! to local space.

use super::apply::{apply_delta, NodeDelta, NodeSnapshot};
use super::base::Gizmo;
use super::shape::{BoxCenterGeometry, BoxLineGeometry, PlaneGeometry};
use super::transform::{handle, DragContext, TransformGizmo, TransformKind};
use super::{CoordSpace, GizmoAxis, GizmoResult, HandleTag, ShapeKind};
use crate::config::GizmoColors;
use crate::foundation::math::{utils, Vec3};
use crate::scene::{LayerComposition, SceneGraph};

const AXES: [GizmoAxis; 3] = [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z];

/// Scale kind
#[derive(Debug, Default)]
pub struct Scale {
    snapshots: Vec<NodeSnapshot>,
    /// Plane handles scale all three axes together
    pub uniform_scaling: bool,
}

/// Scale gizmo
pub type ScaleGizmo = TransformGizmo<Scale>;

impl TransformKind for Scale {
    const NAME: &'static str = "gizmo:scale";

    fn create_shapes(
        &mut self,
        gizmo: &mut Gizmo,
        graph: &mut SceneGraph,
        layers: &mut LayerComposition,
        colors: &GizmoColors,
    ) -> GizmoResult<()> {
        let center = HandleTag::new(ShapeKind::BoxCenter, GizmoAxis::Xyz);
        gizmo.add_shape(graph, layers, handle(center, BoxCenterGeometry::default(), colors))?;
        for axis in AXES {
            let tag = HandleTag::new(ShapeKind::Plane, axis);
            gizmo.add_shape(graph, layers, handle(tag, PlaneGeometry::default(), colors))?;
        }
        for axis in AXES {
            let tag = HandleTag::new(ShapeKind::BoxLine, axis);
            gizmo.add_shape(graph, layers, handle(tag, BoxLineGeometry::default(), colors))?;
        }
        Ok(())
    }

    fn locked_coord_space(&self) -> Option<CoordSpace> {
        Some(CoordSpace::Local)
    }

    fn collapses_to_scalar(&self, tag: HandleTag) -> bool {
        tag.axis == GizmoAxis::Xyz || (self.uniform_scaling && tag.is_plane())
    }

    fn start_point(&self, point: Vec3) -> Vec3 {
        point - Vec3::repeat(1.0)
    }

    fn on_start(&mut self, ctx: &DragContext<'_>, graph: &SceneGraph) {
        self.snapshots = NodeSnapshot::capture_all(graph, ctx.nodes, ctx.pivot);
    }

    fn on_move(&mut self, ctx: &DragContext<'_>, graph: &mut SceneGraph, point_delta: Vec3, _angle_delta: f32) {
        let factor = match ctx.snap {
            Some(increment) => utils::snap_vec3(&point_delta, increment),
            None => point_delta,
        };
        let delta = NodeDelta::Scale(factor);
        for snapshot in &self.snapshots {
            if graph.contains(snapshot.node) {
                apply_delta(graph, snapshot, &delta, CoordSpace::Local, ctx.pivot);
            }
        }
    }

    fn on_end(&mut self) {
        self.snapshots.clear();
    }
}

impl TransformGizmo<Scale> {
    /// Whether plane handles scale uniformly
    pub fn uniform_scaling(&self) -> bool {
        self.kind().uniform_scaling
    }

    /// Make plane handles scale uniformly or along their two axes
    pub fn set_uniform_scaling(&mut self, uniform: bool) {
        let (_, kind) = self.parts_mut();
        kind.uniform_scaling = uniform;
    }
}
