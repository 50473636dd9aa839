//! Translation handles: free-move sphere, plane quads and axis arrows

use super::apply::{apply_delta, NodeDelta, NodeSnapshot};
use super::base::Gizmo;
use super::shape::{ArrowGeometry, PlaneGeometry, SphereCenterGeometry};
use super::transform::{handle, DragContext, TransformGizmo, TransformKind};
use super::{GizmoAxis, GizmoResult, HandleTag, ShapeKind};
use crate::config::GizmoColors;
use crate::foundation::math::{utils, Vec3};
use crate::scene::{LayerComposition, SceneGraph};

const AXES: [GizmoAxis; 3] = [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z];

/// Translation kind
#[derive(Debug, Default)]
pub struct Translate {
    snapshots: Vec<NodeSnapshot>,
}

/// Translation gizmo
pub type TranslateGizmo = TransformGizmo<Translate>;

impl TransformKind for Translate {
    const NAME: &'static str = "gizmo:translate";

    fn create_shapes(
        &mut self,
        gizmo: &mut Gizmo,
        graph: &mut SceneGraph,
        layers: &mut LayerComposition,
        colors: &GizmoColors,
    ) -> GizmoResult<()> {
        let center = HandleTag::new(ShapeKind::SphereCenter, GizmoAxis::Xyz);
        gizmo.add_shape(graph, layers, handle(center, SphereCenterGeometry::default(), colors))?;
        for axis in AXES {
            let tag = HandleTag::new(ShapeKind::Plane, axis);
            gizmo.add_shape(graph, layers, handle(tag, PlaneGeometry::default(), colors))?;
        }
        for axis in AXES {
            let tag = HandleTag::new(ShapeKind::Arrow, axis);
            gizmo.add_shape(graph, layers, handle(tag, ArrowGeometry::default(), colors))?;
        }
        Ok(())
    }

    fn collapses_to_scalar(&self, tag: HandleTag) -> bool {
        tag.axis == GizmoAxis::Xyz
    }

    fn on_start(&mut self, ctx: &DragContext<'_>, graph: &SceneGraph) {
        self.snapshots = NodeSnapshot::capture_all(graph, ctx.nodes, ctx.pivot);
    }

    fn on_move(&mut self, ctx: &DragContext<'_>, graph: &mut SceneGraph, point_delta: Vec3, _angle_delta: f32) {
        let offset = match ctx.snap {
            Some(increment) => utils::snap_vec3(&point_delta, increment),
            None => point_delta,
        };
        let delta = NodeDelta::Translate(offset);
        for snapshot in &self.snapshots {
            if graph.contains(snapshot.node) {
                apply_delta(graph, snapshot, &delta, ctx.coord_space, ctx.pivot);
            }
        }
    }

    fn on_end(&mut self) {
        self.snapshots.clear();
    }
}
