//! Rotation handles: one ring per axis plus a camera-facing ring

use super::apply::{apply_delta, NodeDelta, NodeSnapshot};
use super::base::Gizmo;
use super::shape::DiskGeometry;
use super::transform::{handle, DragContext, TransformGizmo, TransformKind};
use super::{CoordSpace, GizmoAxis, GizmoResult, HandleTag, ShapeKind};
use crate::config::GizmoColors;
use crate::foundation::math::{utils, Quat, Vec3};
use crate::render::{Camera, Projection};
use crate::scene::{LayerComposition, SceneGraph};

/// Rotation kind
#[derive(Debug)]
pub struct Rotate {
    snapshots: Vec<NodeSnapshot>,
    xyz_ring_radius: f32,
    face_ring_radius: f32,
    xyz_tube_radius: f32,
    face_tube_radius: f32,
    guide_angle_start: Vec3,
    guide_angle_end: Vec3,
    angle: f32,
}

/// Rotation gizmo
pub type RotateGizmo = TransformGizmo<Rotate>;

impl Default for Rotate {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
            xyz_ring_radius: 0.5,
            face_ring_radius: 0.63,
            xyz_tube_radius: 0.01,
            face_tube_radius: 0.01,
            guide_angle_start: Vec3::zeros(),
            guide_angle_end: Vec3::zeros(),
            angle: 0.0,
        }
    }
}

impl Rotate {
    fn disk(&self, axis: GizmoAxis) -> DiskGeometry {
        let (tube_radius, ring_radius) = if axis == GizmoAxis::Face {
            (self.face_tube_radius, self.face_ring_radius)
        } else {
            (self.xyz_tube_radius, self.xyz_ring_radius)
        };
        DiskGeometry {
            tube_radius,
            ring_radius,
            ..DiskGeometry::default()
        }
    }
}

/// World direction from `pivot` towards the viewer
fn towards_camera(camera: &Camera, pivot: Vec3) -> Vec3 {
    match camera.projection {
        Projection::Perspective => (camera.position - pivot)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -camera.forward()),
        Projection::Orthographic => -camera.forward(),
    }
}

impl TransformKind for Rotate {
    const NAME: &'static str = "gizmo:rotate";

    fn create_shapes(
        &mut self,
        gizmo: &mut Gizmo,
        graph: &mut SceneGraph,
        layers: &mut LayerComposition,
        colors: &GizmoColors,
    ) -> GizmoResult<()> {
        for axis in [GizmoAxis::Z, GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Face] {
            let tag = HandleTag::new(ShapeKind::Disk, axis);
            gizmo.add_shape(graph, layers, handle(tag, self.disk(axis), colors))?;
        }
        Ok(())
    }

    fn is_rotation(&self) -> bool {
        true
    }

    fn on_start(&mut self, ctx: &DragContext<'_>, graph: &SceneGraph) {
        self.snapshots = NodeSnapshot::capture_all(graph, ctx.nodes, ctx.pivot);

        let axis = ctx.drag.tag.axis;
        let radius = if axis == GizmoAxis::Face {
            self.face_ring_radius
        } else {
            self.xyz_ring_radius
        };
        let start = ctx.drag.start_point.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros) * radius;
        self.guide_angle_start = if axis == GizmoAxis::Face {
            start
        } else {
            ctx.drag.gizmo_rotation_start * start
        };
        self.guide_angle_end = self.guide_angle_start;
        self.angle = 0.0;
    }

    fn on_move(&mut self, ctx: &DragContext<'_>, graph: &mut SceneGraph, _point_delta: Vec3, angle_delta: f32) {
        let degrees = match ctx.snap {
            Some(increment) => utils::snap(angle_delta, increment),
            None => angle_delta,
        };
        let tag_axis = ctx.drag.tag.axis;
        let (axis, coord_space, guide_axis) = if tag_axis == GizmoAxis::Face {
            let axis = towards_camera(ctx.camera, ctx.pivot);
            (axis, CoordSpace::World, axis)
        } else {
            let axis = tag_axis.unit();
            (axis, ctx.coord_space, ctx.drag.gizmo_rotation_start * axis)
        };

        let delta = NodeDelta::Rotate { axis, degrees };
        for snapshot in &self.snapshots {
            if graph.contains(snapshot.node) {
                apply_delta(graph, snapshot, &delta, coord_space, ctx.pivot);
            }
        }

        self.guide_angle_end = utils::quat_from_axis_angle_deg(&guide_axis, degrees) * self.guide_angle_start;
        self.angle = degrees;
    }

    fn on_end(&mut self) {
        self.snapshots.clear();
    }

    fn update_shapes(&mut self, gizmo: &mut Gizmo, graph: &mut SceneGraph, camera: &Camera) {
        let facing = gizmo.rotation().inverse() * towards_camera(camera, gizmo.position());
        let rotation = Quat::rotation_between(&Vec3::y(), &facing)
            .unwrap_or_else(|| Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI));
        for shape in gizmo.shapes().iter().filter(|s| s.tag().axis == GizmoAxis::Face) {
            graph.set_local_rotation(shape.root(), rotation);
        }
    }
}

impl TransformGizmo<Rotate> {
    /// Ring radius of the axis rings
    pub fn xyz_ring_radius(&self) -> f32 {
        self.kind().xyz_ring_radius
    }

    /// Change the axis ring radius
    pub fn set_xyz_ring_radius(&mut self, graph: &mut SceneGraph, radius: f32) -> GizmoResult<()> {
        let (_, kind) = self.parts_mut();
        kind.xyz_ring_radius = radius;
        self.rebuild_disks(graph)
    }

    /// Ring radius of the camera-facing ring
    pub fn face_ring_radius(&self) -> f32 {
        self.kind().face_ring_radius
    }

    /// Change the camera-facing ring radius
    pub fn set_face_ring_radius(&mut self, graph: &mut SceneGraph, radius: f32) -> GizmoResult<()> {
        let (_, kind) = self.parts_mut();
        kind.face_ring_radius = radius;
        self.rebuild_disks(graph)
    }

    /// Change the tube radius of the axis rings
    pub fn set_xyz_tube_radius(&mut self, graph: &mut SceneGraph, radius: f32) -> GizmoResult<()> {
        let (_, kind) = self.parts_mut();
        kind.xyz_tube_radius = radius;
        self.rebuild_disks(graph)
    }

    /// Change the tube radius of the camera-facing ring
    pub fn set_face_tube_radius(&mut self, graph: &mut SceneGraph, radius: f32) -> GizmoResult<()> {
        let (_, kind) = self.parts_mut();
        kind.face_tube_radius = radius;
        self.rebuild_disks(graph)
    }

    /// Point on the ring where the current drag started, relative to the gizmo
    pub fn guide_angle_start(&self) -> Vec3 {
        self.kind().guide_angle_start
    }

    /// Start point turned by the current drag angle
    pub fn guide_angle_end(&self) -> Vec3 {
        self.kind().guide_angle_end
    }

    /// Applied angle of the current drag, degrees
    pub fn angle(&self) -> f32 {
        self.kind().angle
    }

    fn rebuild_disks(&mut self, graph: &mut SceneGraph) -> GizmoResult<()> {
        let (gizmo, kind) = self.parts_mut();
        for index in 0..gizmo.shapes().len() {
            let Some(shape) = gizmo.shape_mut(index) else {
                continue;
            };
            if shape.tag().kind == ShapeKind::Disk {
                shape.set_geometry(graph, kind.disk(shape.tag().axis))?;
            }
        }
        Ok(())
    }
}
