//! Gizmo base: node attachment, screen-relative scaling and picking

use std::cmp::Ordering;
use std::collections::HashMap;

use super::shape::{AxisShape, ShapeBuilder};
use super::{CoordSpace, GizmoEvent, GizmoResult, LAYERID_GIZMO, ORTHO_SCALE_RATIO, PERS_SCALE_RATIO};
use crate::events::EventBus;
use crate::foundation::math::{project_point, transform_vector, Quat, Vec3};
use crate::render::{Camera, Projection};
use crate::scene::{Layer, LayerComposition, LayerId, MeshInstanceId, NodeId, SceneGraph};

/// Smallest root scale, keeps the root transform invertible
const MIN_SCALE: f32 = 1e-4;

/// A ray hit on a gizmo shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoHit {
    /// Index of the shape in [`Gizmo::shapes`]
    pub shape: usize,
    /// World distance from the ray start
    pub distance: f32,
    /// Priority of the hit collision part
    pub priority: u32,
}

impl GizmoHit {
    /// Pick order: higher priority first, then nearer
    ///
    /// Priority decides whenever either hit has one, so a center handle wins
    /// over the axis handles around it regardless of depth. This departs on
    /// purpose from a rule that lets priority override distance only when
    /// both hits carry a nonzero priority: under that rule a nearer priority 0
    /// handle would beat a farther center handle, and the ordering would not
    /// be transitive.
    fn rank(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.distance.total_cmp(&other.distance))
    }
}

/// Handles attached to a set of scene nodes
pub struct Gizmo {
    root: NodeId,
    layer: LayerId,
    nodes: Vec<NodeId>,
    shapes: Vec<AxisShape>,
    shape_map: HashMap<MeshInstanceId, usize>,
    coord_space: CoordSpace,
    size: f32,
    scale: f32,
    position: Vec3,
    rotation: Quat,
    pointer_locked: bool,
    /// Notifications, delivered synchronously and queued for polling
    pub events: EventBus<GizmoEvent>,
}

impl Gizmo {
    /// Create an empty, hidden gizmo
    ///
    /// Registers the gizmo layer with the composition (drawn last, both
    /// transparency classes) and makes `camera` render it.
    pub fn new(graph: &mut SceneGraph, layers: &mut LayerComposition, camera: &mut Camera, name: &str) -> Self {
        if layers.layer(LAYERID_GIZMO).is_none() {
            layers.add_layer(Layer::new(LAYERID_GIZMO, "Gizmo"));
            layers.push_sublayer(LAYERID_GIZMO, false);
            layers.push_sublayer(LAYERID_GIZMO, true);
        }
        if !camera.renders_layer(LAYERID_GIZMO) {
            camera.layers.push(LAYERID_GIZMO);
        }

        let root = graph.create_node(name);
        graph.set_enabled(root, false);

        Self {
            root,
            layer: LAYERID_GIZMO,
            nodes: Vec::new(),
            shapes: Vec::new(),
            shape_map: HashMap::new(),
            coord_space: CoordSpace::World,
            size: 1.0,
            scale: 1.0,
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            pointer_locked: false,
            events: EventBus::new(),
        }
    }

    /// Root node; shapes hang below it
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Layer holding the shapes
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Attached nodes
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Handle shapes, in registration order
    pub fn shapes(&self) -> &[AxisShape] {
        &self.shapes
    }

    /// Mutable shape by index
    pub fn shape_mut(&mut self, index: usize) -> Option<&mut AxisShape> {
        self.shapes.get_mut(index)
    }

    /// Build a shape under the root and register it for picking
    pub fn add_shape(
        &mut self,
        graph: &mut SceneGraph,
        layers: &mut LayerComposition,
        builder: ShapeBuilder,
    ) -> GizmoResult<usize> {
        let shape = builder.build(graph, layers, self.layer, self.root)?;
        let index = self.shapes.len();
        for &mi in shape.mesh_instances() {
            self.shape_map.insert(mi, index);
        }
        self.shapes.push(shape);
        Ok(index)
    }

    /// Shape drawn by a mesh instance
    pub fn shape_for(&self, mesh_instance: MeshInstanceId) -> Option<usize> {
        self.shape_map.get(&mesh_instance).copied()
    }

    /// Interaction frame
    pub fn coord_space(&self) -> CoordSpace {
        self.coord_space
    }

    /// Change the interaction frame and reorient the handles
    pub fn set_coord_space(&mut self, graph: &mut SceneGraph, coord_space: CoordSpace) {
        self.coord_space = coord_space;
        self.update_rotation(graph);
    }

    /// Screen-relative size multiplier
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Change the size multiplier
    pub fn set_size(&mut self, graph: &mut SceneGraph, camera: &Camera, size: f32) {
        self.size = size;
        self.update_scale(graph, camera);
    }

    /// Current root scale
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Current root world position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current root world rotation
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Suppress pointer handling, e.g. while the camera is in fly mode
    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.pointer_locked = locked;
    }

    /// Whether pointer handling is suppressed by the lock
    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    /// Whether pointer events are handled: root enabled and no pointer lock
    pub fn accepts_pointer(&self, graph: &SceneGraph) -> bool {
        !self.pointer_locked && graph.node(self.root).is_some_and(|n| n.enabled)
    }

    /// Attach to `nodes`, showing the gizmo at their average position
    ///
    /// An empty slice is ignored.
    pub fn attach(&mut self, graph: &mut SceneGraph, camera: &Camera, nodes: &[NodeId]) {
        if nodes.is_empty() {
            return;
        }
        self.nodes = nodes.to_vec();
        self.update_position(graph);
        self.update_rotation(graph);
        self.events.emit(GizmoEvent::NodesAttach);
        graph.set_enabled(self.root, true);
        self.update_scale(graph, camera);
        self.events.emit(GizmoEvent::RenderUpdate);
    }

    /// Hide the gizmo and forget the attached nodes
    pub fn detach(&mut self, graph: &mut SceneGraph) {
        graph.set_enabled(self.root, false);
        self.events.emit(GizmoEvent::RenderUpdate);
        self.events.emit(GizmoEvent::NodesDetach);
        self.nodes.clear();
    }

    /// Follow the attached nodes and keep a constant on-screen size
    pub fn update(&mut self, graph: &mut SceneGraph, camera: &Camera) {
        if self.nodes.is_empty() {
            return;
        }
        self.update_position(graph);
        self.update_rotation(graph);
        self.update_scale(graph, camera);
    }

    pub(super) fn update_position(&mut self, graph: &mut SceneGraph) {
        let live: Vec<Vec3> = self
            .nodes
            .iter()
            .filter(|&&n| graph.contains(n))
            .map(|&n| graph.position(n))
            .collect();
        if live.is_empty() {
            return;
        }
        let position = live.iter().sum::<Vec3>() / live.len() as f32;
        graph.set_position(self.root, position);
        if position != self.position {
            self.position = position;
            self.events.emit(GizmoEvent::PositionUpdate(position));
        }
    }

    pub(super) fn update_rotation(&mut self, graph: &mut SceneGraph) {
        let rotation = match (self.coord_space, self.nodes.first()) {
            (CoordSpace::Local, Some(&first)) => graph.rotation(first),
            _ => Quat::identity(),
        };
        graph.set_rotation(self.root, rotation);
        if rotation != self.rotation {
            self.rotation = rotation;
            let (x, y, z) = rotation.euler_angles();
            self.events
                .emit(GizmoEvent::RotationUpdate(Vec3::new(x, y, z).map(f32::to_degrees)));
        }
    }

    pub(super) fn update_scale(&mut self, graph: &mut SceneGraph, camera: &Camera) {
        let scale = match camera.projection {
            Projection::Perspective => {
                let distance = (self.position - camera.position).norm();
                (camera.fov * 0.5).tan() * distance * PERS_SCALE_RATIO
            }
            Projection::Orthographic => camera.ortho_height * ORTHO_SCALE_RATIO,
        };
        let scale = (scale * self.size).max(MIN_SCALE);
        graph.set_local_scale(self.root, Vec3::repeat(scale));
        if scale != self.scale {
            self.scale = scale;
            self.events.emit(GizmoEvent::ScaleUpdate(scale));
        }
    }

    /// Best shape hit under the screen point
    ///
    /// The ray runs from camera depth 1 to the far plane. Each collision part
    /// is tested in its own space (shape world transform combined with the
    /// part transform), with the direction renormalized after the transform.
    pub fn pick(&self, graph: &SceneGraph, camera: &Camera, x: f32, y: f32) -> Option<GizmoHit> {
        let start = camera.screen_to_world(x, y, 1.0);
        let end = camera.screen_to_world(x, y, camera.far);
        let dir = (end - start).try_normalize(f32::EPSILON)?;

        let mut best: Option<GizmoHit> = None;
        for (index, shape) in self.shapes.iter().enumerate() {
            if !graph.is_enabled_in_hierarchy(shape.root()) {
                continue;
            }
            let wtm = graph.world_transform(shape.root());
            for data in shape.tri_data() {
                let matrix = wtm * data.ptm;
                let Some(inverse) = matrix.try_inverse() else {
                    continue;
                };
                let origin = project_point(&inverse, &start);
                let Some(local_dir) = transform_vector(&inverse, &dir).try_normalize(f32::EPSILON) else {
                    continue;
                };
                for tri in data.tris() {
                    let Some(point) = tri.intersect_ray(&origin, &local_dir) else {
                        continue;
                    };
                    let hit = GizmoHit {
                        shape: index,
                        distance: (project_point(&matrix, &point) - start).norm(),
                        priority: data.priority,
                    };
                    if best.map_or(true, |b| hit.rank(&b) == Ordering::Less) {
                        best = Some(hit);
                    }
                }
            }
        }
        best
    }

    /// Mesh instances of the best shape under the screen point, empty on a miss
    pub fn get_selection(&self, graph: &SceneGraph, camera: &Camera, x: f32, y: f32) -> Vec<MeshInstanceId> {
        self.pick(graph, camera, x, y)
            .map(|hit| self.shapes[hit.shape].mesh_instances().to_vec())
            .unwrap_or_default()
    }

    /// Pointer pressed: pick and fire `PointerDown`
    pub fn pointer_down(&mut self, graph: &SceneGraph, camera: &Camera, x: f32, y: f32) -> Option<MeshInstanceId> {
        if !self.accepts_pointer(graph) {
            return None;
        }
        let mesh_instance = self.get_selection(graph, camera, x, y).first().copied();
        self.events.emit(GizmoEvent::PointerDown { x, y, mesh_instance });
        mesh_instance
    }

    /// Pointer moved: pick and fire `PointerMove`
    pub fn pointer_move(&mut self, graph: &SceneGraph, camera: &Camera, x: f32, y: f32) -> Option<MeshInstanceId> {
        if !self.accepts_pointer(graph) {
            return None;
        }
        let mesh_instance = self.get_selection(graph, camera, x, y).first().copied();
        log::trace!("gizmo pointer move ({}, {}) over {:?}", x, y, mesh_instance);
        self.events.emit(GizmoEvent::PointerMove { x, y, mesh_instance });
        mesh_instance
    }

    /// Remove every shape and the root node
    pub fn destroy(self, graph: &mut SceneGraph, layers: &mut LayerComposition) {
        for shape in self.shapes {
            shape.destroy(graph, layers, self.layer);
        }
        graph.remove_node(self.root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::Color;
    use crate::gizmo::shape::{BoxCenterGeometry, PlaneGeometry};
    use crate::gizmo::{GizmoAxis, HandleTag, ShapeKind};
    use approx::assert_relative_eq;

    fn fixture() -> (SceneGraph, LayerComposition, Camera, Gizmo) {
        let mut graph = SceneGraph::new();
        let mut layers = LayerComposition::with_default_layers();
        let mut camera = Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 45.0, 800, 600, 0.1, 100.0);
        let gizmo = Gizmo::new(&mut graph, &mut layers, &mut camera, "gizmo");
        (graph, layers, camera, gizmo)
    }

    #[test]
    fn test_new_registers_layer_once() {
        let (mut graph, mut layers, mut camera, _) = fixture();
        let count = layers.sublayers().len();
        let _second = Gizmo::new(&mut graph, &mut layers, &mut camera, "second");
        assert_eq!(layers.sublayers().len(), count);
        assert_eq!(camera.layers.iter().filter(|&&l| l == LAYERID_GIZMO).count(), 1);
    }

    #[test]
    fn test_attach_averages_positions_and_scales() {
        let (mut graph, _, camera, mut gizmo) = fixture();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        graph.set_local_position(a, Vec3::new(-1.0, 0.0, 0.0));
        graph.set_local_position(b, Vec3::new(3.0, 2.0, 0.0));

        gizmo.attach(&mut graph, &camera, &[a, b]);
        assert!(gizmo.accepts_pointer(&graph));
        assert_relative_eq!(graph.position(gizmo.root()), Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-5);

        let distance = (Vec3::new(1.0, 1.0, 0.0) - camera.position).norm();
        let expected = (camera.fov * 0.5).tan() * distance * PERS_SCALE_RATIO;
        assert_relative_eq!(gizmo.scale(), expected, epsilon = 1e-5);

        gizmo.detach(&mut graph);
        assert!(!gizmo.accepts_pointer(&graph));
        assert!(gizmo.nodes().is_empty());
    }

    #[test]
    fn test_local_space_follows_first_node() {
        let (mut graph, _, camera, mut gizmo) = fixture();
        let a = graph.create_node("a");
        graph.set_local_euler_angles(a, 0.0, 90.0, 0.0);
        gizmo.attach(&mut graph, &camera, &[a]);
        assert_relative_eq!(gizmo.rotation().angle(), 0.0);

        gizmo.set_coord_space(&mut graph, CoordSpace::Local);
        assert!(gizmo.rotation().angle_to(&graph.rotation(a)) < 1e-5);
    }

    #[test]
    fn test_pointer_lock_suppresses_events() {
        let (mut graph, _, camera, mut gizmo) = fixture();
        let a = graph.create_node("a");
        gizmo.attach(&mut graph, &camera, &[a]);
        gizmo.events.clear();

        gizmo.set_pointer_locked(true);
        assert_eq!(gizmo.pointer_down(&graph, &camera, 400.0, 300.0), None);
        assert_eq!(gizmo.events.pending(), 0);

        gizmo.set_pointer_locked(false);
        gizmo.pointer_move(&graph, &camera, 0.0, 0.0);
        assert_eq!(gizmo.events.pending(), 1);
    }

    #[test]
    fn test_priority_beats_distance() {
        let (mut graph, mut layers, camera, mut gizmo) = fixture();
        // a plane handle in front of a center box; the box is farther but has priority
        let near = gizmo
            .add_shape(
                &mut graph,
                &mut layers,
                ShapeBuilder::new(HandleTag::new(ShapeKind::Plane, GizmoAxis::Z), PlaneGeometry { size: 2.0, gap: 0.0 })
                    .position(Vec3::new(-1.0, -1.0, 1.0))
                    .default_color(Color::WHITE),
            )
            .unwrap();
        let far = gizmo
            .add_shape(
                &mut graph,
                &mut layers,
                ShapeBuilder::new(HandleTag::new(ShapeKind::BoxCenter, GizmoAxis::Xyz), BoxCenterGeometry::default())
                    .default_color(Color::WHITE),
            )
            .unwrap();
        let a = graph.create_node("a");
        gizmo.attach(&mut graph, &camera, &[a]);

        let hit = gizmo.pick(&graph, &camera, 400.0, 300.0).unwrap();
        assert_eq!(hit.shape, far);
        assert_eq!(
            gizmo.get_selection(&graph, &camera, 400.0, 300.0),
            gizmo.shapes()[far].mesh_instances().to_vec()
        );
        assert_ne!(hit.shape, near);
    }

    #[test]
    fn test_nearest_wins_without_priority() {
        let (mut graph, mut layers, camera, mut gizmo) = fixture();
        let plane = |z: f32| {
            ShapeBuilder::new(HandleTag::new(ShapeKind::Plane, GizmoAxis::Z), PlaneGeometry { size: 2.0, gap: 0.0 })
                .position(Vec3::new(-1.0, -1.0, z))
                .default_color(Color::WHITE)
        };
        let back = gizmo.add_shape(&mut graph, &mut layers, plane(-1.0)).unwrap();
        let front = gizmo.add_shape(&mut graph, &mut layers, plane(1.0)).unwrap();
        let a = graph.create_node("a");
        gizmo.attach(&mut graph, &camera, &[a]);

        let hit = gizmo.pick(&graph, &camera, 400.0, 300.0).unwrap();
        assert_eq!(hit.shape, front);
        assert_ne!(hit.shape, back);
        assert!(gizmo.pick(&graph, &camera, 5.0, 5.0).is_none());
    }

    #[test]
    fn test_rank_prefers_priority_over_distance() {
        let hit = |shape, distance, priority| GizmoHit {
            shape,
            distance,
            priority,
        };
        let near_axis = hit(0, 1.0, 0);
        let far_center = hit(1, 5.0, 2);
        let far_axis = hit(2, 5.0, 0);

        assert_eq!(far_center.rank(&near_axis), Ordering::Less);
        assert_eq!(near_axis.rank(&far_center), Ordering::Greater);
        assert_eq!(near_axis.rank(&far_axis), Ordering::Less);

        let mut hits = vec![far_axis, near_axis, far_center];
        hits.sort_by(GizmoHit::rank);
        assert_eq!(hits.iter().map(|h| h.shape).collect::<Vec<_>>(), vec![1, 0, 2]);
    }
}
