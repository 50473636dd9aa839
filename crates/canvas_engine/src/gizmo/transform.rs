//! Hover and drag interaction shared by the transform gizmos
//!
//! States: idle, hovering a handle, dragging. A drag starts on pointer down
//! over an enabled handle and ends only on pointer up or detach; the picked
//! handle stays selected for the whole drag and hover highlighting is frozen
//! meanwhile.
//!
//! Every pointer position is turned into a point (and, for rotation, an
//! angle) by [`TransformGizmo::calc_point`]; moves report the difference to
//! the values captured at drag start.

use super::base::Gizmo;
use super::shape::{ShapeBuilder, ShapeColors, ShapeGeometry};
use super::{CoordSpace, GizmoAxis, GizmoEvent, GizmoResult, HandleTag, FACING_EPSILON, ROTATE_SCALE};
use crate::config::{GizmoColors, GizmoSettings};
use crate::foundation::math::{Quat, Vec3};
use crate::render::{Camera, Projection};
use crate::scene::{LayerComposition, NodeId, SceneGraph};

/// Below this the pointer ray counts as parallel to the drag plane
const PLANE_EPSILON: f32 = 1e-6;

/// Selection captured when a drag starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// Dragged handle
    pub tag: HandleTag,
    /// Point at drag start
    pub start_point: Vec3,
    /// Angle at drag start, degrees
    pub start_angle: f32,
    /// Gizmo rotation at drag start
    pub gizmo_rotation_start: Quat,
    /// Gizmo position at drag start; the drag plane stays anchored here
    pub gizmo_position_start: Vec3,
}

/// What a drag operates on, handed to the [`TransformKind`] callbacks
pub struct DragContext<'a> {
    /// Attached nodes
    pub nodes: &'a [NodeId],
    /// Current drag
    pub drag: &'a DragState,
    /// Interaction frame
    pub coord_space: CoordSpace,
    /// Snap increment, when snapping
    pub snap: Option<f32>,
    /// Gizmo position at drag start
    pub pivot: Vec3,
    /// Viewing camera
    pub camera: &'a Camera,
}

/// Handle set and node math of one transform type
pub trait TransformKind {
    /// Name of the gizmo root node
    const NAME: &'static str;

    /// Build the handles under the gizmo root
    fn create_shapes(
        &mut self,
        gizmo: &mut Gizmo,
        graph: &mut SceneGraph,
        layers: &mut LayerComposition,
        colors: &GizmoColors,
    ) -> GizmoResult<()>;

    /// Whether drags produce angles rather than points
    fn is_rotation(&self) -> bool {
        false
    }

    /// Interaction frame this kind is restricted to
    fn locked_coord_space(&self) -> Option<CoordSpace> {
        None
    }

    /// Whether dragging `tag` reduces the point to one value on all axes
    fn collapses_to_scalar(&self, _tag: HandleTag) -> bool {
        false
    }

    /// Adjust the point captured at drag start
    fn start_point(&self, point: Vec3) -> Vec3 {
        point
    }

    /// Drag started
    fn on_start(&mut self, ctx: &DragContext<'_>, graph: &SceneGraph);

    /// Drag moved; deltas are totals since the start
    fn on_move(&mut self, ctx: &DragContext<'_>, graph: &mut SceneGraph, point_delta: Vec3, angle_delta: f32);

    /// Drag ended
    fn on_end(&mut self) {}

    /// Per-frame handle adjustments, e.g. turning towards the camera
    fn update_shapes(&mut self, _gizmo: &mut Gizmo, _graph: &mut SceneGraph, _camera: &Camera) {}
}

/// Colors of a handle driving `axis`
pub(crate) fn shape_colors(colors: &GizmoColors, axis: GizmoAxis) -> ShapeColors {
    let default = match axis {
        GizmoAxis::X => colors.x,
        GizmoAxis::Y => colors.y,
        GizmoAxis::Z => colors.z,
        GizmoAxis::Xyz | GizmoAxis::Face => colors.face,
    };
    ShapeColors {
        default,
        hover: colors.hover,
        disabled: colors.disabled,
    }
}

/// Builder for a handle colored by its axis
pub(crate) fn handle(tag: HandleTag, geometry: impl Into<ShapeGeometry>, colors: &GizmoColors) -> ShapeBuilder {
    let c = shape_colors(colors, tag.axis);
    ShapeBuilder::new(tag, geometry)
        .default_color(c.default)
        .hover_color(c.hover)
        .disabled_color(c.disabled)
}

/// Rotation angle, in degrees, for a ring seen edge-on
///
/// Pointer travel across the ring's screen line maps linearly to degrees;
/// orthographic views divide by the ortho height so the rate is independent
/// of zoom.
fn edge_on_angle(camera: &Camera, mouse_wpos: &Vec3, perpendicular: &Vec3) -> f32 {
    let angle = mouse_wpos.dot(&perpendicular.normalize()) * ROTATE_SCALE;
    if camera.projection == Projection::Orthographic && camera.ortho_height != 0.0 {
        angle / camera.ortho_height
    } else {
        angle
    }
}

/// A gizmo with hover/drag handling for one [`TransformKind`]
pub struct TransformGizmo<K: TransformKind> {
    gizmo: Gizmo,
    kind: K,
    hover_shape: Option<usize>,
    hover_tag: Option<HandleTag>,
    drag: Option<DragState>,
    last_point: Vec3,
    last_angle: f32,
    snap: bool,
    snap_increment: f32,
}

impl<K: TransformKind + Default> TransformGizmo<K> {
    /// Create a hidden gizmo with the default kind state
    pub fn new(
        graph: &mut SceneGraph,
        layers: &mut LayerComposition,
        camera: &mut Camera,
        settings: &GizmoSettings,
    ) -> GizmoResult<Self> {
        Self::with_kind(graph, layers, camera, settings, K::default())
    }
}

impl<K: TransformKind> TransformGizmo<K> {
    /// Create a hidden gizmo
    ///
    /// Nothing is left in the scene if a handle fails to build.
    pub fn with_kind(
        graph: &mut SceneGraph,
        layers: &mut LayerComposition,
        camera: &mut Camera,
        settings: &GizmoSettings,
        mut kind: K,
    ) -> GizmoResult<Self> {
        let mut gizmo = Gizmo::new(graph, layers, camera, K::NAME);
        if let Err(err) = kind.create_shapes(&mut gizmo, graph, layers, &settings.colors) {
            log::warn!("{} gizmo setup failed: {}", K::NAME, err);
            gizmo.destroy(graph, layers);
            return Err(err);
        }
        log::debug!("{} gizmo created with {} handles", K::NAME, gizmo.shapes().len());

        let mut this = Self {
            gizmo,
            kind,
            hover_shape: None,
            hover_tag: None,
            drag: None,
            last_point: Vec3::zeros(),
            last_angle: 0.0,
            snap: false,
            snap_increment: 1.0,
        };
        this.apply_settings(graph, camera, settings);
        Ok(this)
    }

    /// The underlying gizmo
    pub fn gizmo(&self) -> &Gizmo {
        &self.gizmo
    }

    /// The underlying gizmo, mutably
    pub fn gizmo_mut(&mut self) -> &mut Gizmo {
        &mut self.gizmo
    }

    /// Kind state
    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub(super) fn parts_mut(&mut self) -> (&mut Gizmo, &mut K) {
        (&mut self.gizmo, &mut self.kind)
    }

    /// Push settings into the live gizmo
    pub fn apply_settings(&mut self, graph: &mut SceneGraph, camera: &Camera, settings: &GizmoSettings) {
        self.snap = settings.snap;
        self.snap_increment = settings.snap_increment;
        self.set_coord_space(graph, settings.coord_space);
        self.gizmo.set_size(graph, camera, settings.size);
        for index in 0..self.gizmo.shapes().len() {
            if let Some(shape) = self.gizmo.shape_mut(index) {
                let colors = shape_colors(&settings.colors, shape.tag().axis);
                shape.set_colors(graph, colors);
            }
        }
    }

    /// Whether deltas are quantized
    pub fn snap(&self) -> bool {
        self.snap
    }

    /// Enable or disable snapping
    pub fn set_snap(&mut self, snap: bool) {
        self.snap = snap;
    }

    /// Quantization step
    pub fn snap_increment(&self) -> f32 {
        self.snap_increment
    }

    /// Change the quantization step
    pub fn set_snap_increment(&mut self, increment: f32) {
        self.snap_increment = increment;
    }

    /// Interaction frame
    pub fn coord_space(&self) -> CoordSpace {
        self.gizmo.coord_space()
    }

    /// Change the interaction frame; ignored by kinds locked to one frame
    pub fn set_coord_space(&mut self, graph: &mut SceneGraph, coord_space: CoordSpace) {
        let coord_space = match self.kind.locked_coord_space() {
            Some(locked) => {
                if locked != coord_space {
                    log::trace!("{} gizmo stays in {:?} space", K::NAME, locked);
                }
                locked
            }
            None => coord_space,
        };
        self.gizmo.set_coord_space(graph, coord_space);
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Current drag, if any
    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Handle being dragged
    pub fn selected(&self) -> Option<HandleTag> {
        self.drag.map(|d| d.tag)
    }

    /// Highlighted shape index
    pub fn hover_shape(&self) -> Option<usize> {
        self.hover_shape
    }

    /// Handle under the pointer at the last hover update
    pub fn hover_tag(&self) -> Option<HandleTag> {
        self.hover_tag
    }

    /// Enable or disable one handle
    pub fn set_handle_disabled(&mut self, graph: &mut SceneGraph, tag: HandleTag, disabled: bool) {
        for index in 0..self.gizmo.shapes().len() {
            if let Some(shape) = self.gizmo.shape_mut(index).filter(|s| s.tag() == tag) {
                shape.set_disabled(graph, disabled);
            }
        }
    }

    /// Attach to nodes
    pub fn attach(&mut self, graph: &mut SceneGraph, camera: &Camera, nodes: &[NodeId]) {
        self.gizmo.attach(graph, camera, nodes);
        self.kind.update_shapes(&mut self.gizmo, graph, camera);
    }

    /// Detach, ending any drag
    pub fn detach(&mut self, graph: &mut SceneGraph) {
        self.gizmo.detach(graph);
        self.snap = false;
        self.gizmo.events.emit(GizmoEvent::PointerUp);
        self.end_drag();
        self.hover(graph, None);
        self.hover_tag = None;
    }

    /// Per-frame update: follow the nodes, keep the screen size
    pub fn update(&mut self, graph: &mut SceneGraph, camera: &Camera) {
        if self.gizmo.nodes().is_empty() {
            return;
        }
        self.gizmo.update(graph, camera);
        self.kind.update_shapes(&mut self.gizmo, graph, camera);
    }

    /// Pointer pressed at pixel `(x, y)`
    pub fn on_pointer_down(&mut self, graph: &mut SceneGraph, camera: &Camera, x: f32, y: f32) {
        if self.drag.is_some() {
            return;
        }
        let Some(mesh_instance) = self.gizmo.pointer_down(graph, camera, x, y) else {
            return;
        };
        let Some(shape) = self.gizmo.shape_for(mesh_instance).map(|i| &self.gizmo.shapes()[i]) else {
            return;
        };
        if shape.disabled() {
            return;
        }

        let mut drag = DragState {
            tag: shape.tag(),
            start_point: Vec3::zeros(),
            start_angle: 0.0,
            gizmo_rotation_start: self.gizmo.rotation(),
            gizmo_position_start: self.gizmo.position(),
        };
        let (point, angle) = self.calc_point(camera, &drag, x, y);
        drag.start_point = self.kind.start_point(point);
        drag.start_angle = angle;
        self.drag = Some(drag);

        let ctx = DragContext {
            nodes: self.gizmo.nodes(),
            drag: &drag,
            coord_space: self.gizmo.coord_space(),
            snap: self.snap.then_some(self.snap_increment),
            pivot: drag.gizmo_position_start,
            camera,
        };
        self.kind.on_start(&ctx, graph);
        log::trace!("{} drag start on {:?}", K::NAME, drag.tag);
        self.gizmo.events.emit(GizmoEvent::TransformStart);
    }

    /// Pointer moved to pixel `(x, y)`
    pub fn on_pointer_move(&mut self, graph: &mut SceneGraph, camera: &Camera, x: f32, y: f32) {
        if !self.gizmo.accepts_pointer(graph) {
            return;
        }
        let hovered = self
            .gizmo
            .pointer_move(graph, camera, x, y)
            .and_then(|mi| self.gizmo.shape_for(mi))
            .filter(|&i| !self.gizmo.shapes()[i].disabled());
        self.hover(graph, hovered);

        let Some(drag) = self.drag else {
            return;
        };
        let (point, angle) = self.calc_point(camera, &drag, x, y);
        let point_delta = point - drag.start_point;
        let angle_delta = angle - drag.start_angle;

        let ctx = DragContext {
            nodes: self.gizmo.nodes(),
            drag: &drag,
            coord_space: self.gizmo.coord_space(),
            snap: self.snap.then_some(self.snap_increment),
            pivot: drag.gizmo_position_start,
            camera,
        };
        self.kind.on_move(&ctx, graph, point_delta, angle_delta);

        self.gizmo.update_position(graph);
        if self.gizmo.coord_space() == CoordSpace::Local {
            self.gizmo.update_rotation(graph);
        }
        self.gizmo.events.emit(GizmoEvent::TransformMove { point_delta, angle_delta });
    }

    /// Pointer released
    ///
    /// Always ends a drag, even while pointer handling is otherwise suppressed.
    pub fn on_pointer_up(&mut self, graph: &SceneGraph) {
        if !self.gizmo.accepts_pointer(graph) && self.drag.is_none() {
            return;
        }
        self.gizmo.events.emit(GizmoEvent::PointerUp);
        self.end_drag();
    }

    fn end_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.kind.on_end();
            log::trace!("{} drag end on {:?}", K::NAME, drag.tag);
            self.gizmo.events.emit(GizmoEvent::TransformEnd);
        }
    }

    fn hover(&mut self, graph: &mut SceneGraph, shape: Option<usize>) {
        if self.drag.is_some() {
            return;
        }
        self.hover_tag = shape.map(|i| self.gizmo.shapes()[i].tag());
        if shape == self.hover_shape {
            return;
        }
        if let Some(previous) = self.hover_shape.take() {
            if let Some(s) = self.gizmo.shape_mut(previous) {
                s.hover(graph, false);
            }
        }
        if let Some(index) = shape {
            if let Some(s) = self.gizmo.shape_mut(index) {
                s.hover(graph, true);
                self.hover_shape = Some(index);
            }
        }
        self.gizmo.events.emit(GizmoEvent::RenderUpdate);
    }

    /// Project the pointer for the handle being dragged
    ///
    /// Returns the point and the angle in degrees. Single-axis handles
    /// (other than rotation) intersect a plane containing the axis and facing
    /// the camera as much as possible, then keep only the component along the
    /// axis, expressed in the gizmo frame of the drag start. Plane handles
    /// keep the full intersection in that frame. All-axes and camera-facing
    /// handles use a plane facing the camera.
    ///
    /// The drag plane is anchored at the gizmo position captured at drag
    /// start, so the same pixel always maps to the same point while the gizmo
    /// follows the nodes. When the ray is parallel to the drag plane the
    /// previous point is returned unchanged; a ring seen edge-on still
    /// reports its linear angle.
    pub fn calc_point(&mut self, camera: &Camera, drag: &DragState, x: f32, y: f32) -> (Vec3, f32) {
        let gizmo_pos = drag.gizmo_position_start;
        let mouse_wpos = camera.screen_to_world(x, y, camera.near);
        let (ray_origin, ray_dir) = match camera.projection {
            Projection::Perspective => (
                camera.position,
                (mouse_wpos - camera.position)
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(|| camera.forward()),
            ),
            Projection::Orthographic => (mouse_wpos, camera.forward()),
        };

        let axis = drag.tag.axis;
        let is_plane = drag.tag.is_plane();
        let is_rotation = self.kind.is_rotation();
        let is_facing = axis == GizmoAxis::Face;
        let is_line = !is_plane && !is_rotation;
        let rotation = drag.gizmo_rotation_start;
        let to_camera = match camera.projection {
            Projection::Perspective => (ray_origin - gizmo_pos)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(|| -camera.forward()),
            Projection::Orthographic => -camera.forward(),
        };
        let axis_dir = rotation * axis.unit();

        let plane_normal = match axis.index() {
            None => to_camera,
            Some(_) if is_line => (to_camera - axis_dir * axis_dir.dot(&to_camera))
                .try_normalize(f32::EPSILON)
                .unwrap_or(axis_dir),
            Some(_) => axis_dir,
        };

        let perpendicular = plane_normal.cross(&to_camera);
        let edge_on = is_rotation && !is_facing && perpendicular.norm() >= FACING_EPSILON;

        let denominator = plane_normal.dot(&ray_dir);
        if denominator.abs() < PLANE_EPSILON {
            log::trace!("pointer ray parallel to the {:?} drag plane", drag.tag);
            if edge_on {
                // the linear angle does not need the intersection
                self.last_angle = edge_on_angle(camera, &mouse_wpos, &perpendicular);
            }
            return (self.last_point, self.last_angle);
        }
        let distance = (plane_normal.dot(&gizmo_pos) - plane_normal.dot(&ray_origin)) / denominator;
        let mut point = ray_origin + ray_dir * distance;

        if is_rotation {
            point -= gizmo_pos;
        }

        if self.kind.collapses_to_scalar(drag.tag) {
            let (a, b) = match axis {
                GizmoAxis::X => (camera.up(), -camera.forward()),
                GizmoAxis::Y => (camera.right(), -camera.forward()),
                _ => (camera.up(), camera.right()),
            };
            let diagonal = (a + b).normalize();
            let v = (point - gizmo_pos).dot(&diagonal);
            point = Vec3::repeat(v);
            if let Some(i) = axis.index() {
                point[i] = 1.0;
            }
        } else if !is_facing {
            if is_line {
                point = axis_dir * axis_dir.dot(&point);
            }
            point = rotation.inverse() * point;
            if is_line {
                if let Some(i) = axis.index() {
                    let v = point[i];
                    point = Vec3::zeros();
                    point[i] = v;
                }
            }
        }

        let mut angle = 0.0;
        if edge_on {
            angle = edge_on_angle(camera, &mouse_wpos, &perpendicular);
        } else if is_rotation {
            angle = match axis {
                GizmoAxis::X => point.z.atan2(point.y),
                GizmoAxis::Y => point.x.atan2(point.z),
                GizmoAxis::Z => point.y.atan2(point.x),
                GizmoAxis::Face => {
                    let view = camera.rotation.inverse() * point;
                    view.y.atan2(view.x)
                }
                GizmoAxis::Xyz => 0.0,
            }
            .to_degrees();
        }

        self.last_point = point;
        self.last_angle = angle;
        (point, angle)
    }

    /// Remove the gizmo from the scene
    pub fn destroy(self, graph: &mut SceneGraph, layers: &mut LayerComposition) {
        self.gizmo.destroy(graph, layers);
    }
}
