//! Drag scenarios driving the transform gizmos through screen coordinates

use std::f32::consts::{FRAC_PI_2, SQRT_2};

use approx::assert_relative_eq;

use super::*;
use crate::config::GizmoSettings;
use crate::foundation::logging;
use crate::foundation::math::Quat;
use crate::render::Camera;
use crate::scene::{LayerComposition, NodeId, SceneGraph};

struct Scene {
    graph: SceneGraph,
    layers: LayerComposition,
    camera: Camera,
    node: NodeId,
}

fn scene() -> Scene {
    logging::init_for_tests();
    let mut graph = SceneGraph::new();
    let node = graph.create_node("box");
    Scene {
        graph,
        layers: LayerComposition::with_default_layers(),
        camera: Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 45.0, 800, 600, 0.1, 100.0),
        node,
    }
}

fn settings(size: f32) -> GizmoSettings {
    GizmoSettings {
        size,
        ..GizmoSettings::default()
    }
}

fn screen(camera: &Camera, point: Vec3) -> (f32, f32) {
    let s = camera.world_to_screen(&point);
    (s.x, s.y)
}

fn kinds(events: &[GizmoEvent]) -> Vec<GizmoEventKind> {
    events.iter().map(|e| e.kind()).collect()
}

fn ortho_scene() -> Scene {
    let mut s = scene();
    s.camera = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), 5.0, 800, 600, 0.1, 100.0);
    s
}

fn translate_gizmo(s: &mut Scene, size: f32) -> TranslateGizmo {
    let mut gizmo = TranslateGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &settings(size)).unwrap();
    gizmo.attach(&mut s.graph, &s.camera, &[s.node]);
    gizmo.gizmo_mut().events.clear();
    gizmo
}

// slightly off the axis so the ray is not coplanar with the XZ plane handle
const ON_AXIS_Y: f32 = 0.02;

#[test]
fn test_translate_drag_end_to_end() {
    let mut s = scene();
    let mut gizmo = translate_gizmo(&mut s, 2.0);

    let (x0, y0) = screen(&s.camera, Vec3::new(1.0, ON_AXIS_Y, 0.0));
    let (x1, y1) = screen(&s.camera, Vec3::new(3.0, ON_AXIS_Y, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::Arrow, GizmoAxis::X)));

    gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
    gizmo.on_pointer_up(&s.graph);
    assert!(!gizmo.is_dragging());
    assert_relative_eq!(s.graph.position(s.node), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-3);
    assert_relative_eq!(gizmo.gizmo().position(), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-3);

    let fired: Vec<_> = kinds(&gizmo.gizmo_mut().events.drain())
        .into_iter()
        .filter(|k| {
            matches!(
                k,
                GizmoEventKind::TransformStart | GizmoEventKind::TransformMove | GizmoEventKind::TransformEnd
            )
        })
        .collect();
    assert_eq!(
        fired,
        vec![
            GizmoEventKind::TransformStart,
            GizmoEventKind::TransformMove,
            GizmoEventKind::TransformEnd
        ]
    );
}

#[test]
fn test_repeated_move_is_idempotent() {
    let mut s = scene();
    let mut gizmo = translate_gizmo(&mut s, 2.0);

    let (x0, y0) = screen(&s.camera, Vec3::new(1.0, ON_AXIS_Y, 0.0));
    let (x1, y1) = screen(&s.camera, Vec3::new(2.5, ON_AXIS_Y, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
    let first = s.graph.position(s.node);
    gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
    gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
    assert_relative_eq!(s.graph.position(s.node), first, epsilon = 1e-4);
    assert_relative_eq!(first, Vec3::new(1.5, 0.0, 0.0), epsilon = 1e-3);
}

#[test]
fn test_translate_snaps_to_increment() {
    let mut s = scene();
    let mut gizmo = translate_gizmo(&mut s, 2.0);
    gizmo.set_snap(true);
    gizmo.set_snap_increment(1.0);

    let (x0, y0) = screen(&s.camera, Vec3::new(1.0, ON_AXIS_Y, 0.0));
    let (x1, y1) = screen(&s.camera, Vec3::new(3.37, ON_AXIS_Y, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
    assert_relative_eq!(s.graph.position(s.node), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
}

#[test]
fn test_rotate_world_z_with_snapping() {
    let mut s = scene();
    let mut gizmo = RotateGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &GizmoSettings::default()).unwrap();
    gizmo.attach(&mut s.graph, &s.camera, &[s.node]);
    gizmo.set_snap(true);
    gizmo.set_snap_increment(15.0);

    let radius = gizmo.xyz_ring_radius() * gizmo.gizmo().scale();
    let on_ring = |degrees: f32| {
        let a = degrees.to_radians();
        Vec3::new(radius * a.cos(), radius * a.sin(), 0.0)
    };
    let (x0, y0) = screen(&s.camera, on_ring(45.0));
    let (x1, y1) = screen(&s.camera, on_ring(132.4));

    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::Disk, GizmoAxis::Z)));
    gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);

    assert_relative_eq!(gizmo.angle(), 90.0, epsilon = 1e-3);
    assert_relative_eq!(s.graph.right(s.node), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-4);
    assert_relative_eq!(s.graph.position(s.node), Vec3::zeros(), epsilon = 1e-5);
    assert_relative_eq!(gizmo.guide_angle_start().norm(), gizmo.xyz_ring_radius(), epsilon = 1e-4);

    // same pointer again: same orientation
    gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
    assert_relative_eq!(s.graph.right(s.node), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-4);
    gizmo.on_pointer_up(&s.graph);
}

#[test]
fn test_scale_line_handle() {
    let mut s = scene();
    let mut gizmo = ScaleGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &settings(2.0)).unwrap();
    gizmo.attach(&mut s.graph, &s.camera, &[s.node]);

    let (x0, y0) = screen(&s.camera, Vec3::new(1.0, ON_AXIS_Y, 0.0));
    let (x1, y1) = screen(&s.camera, Vec3::new(1.5, ON_AXIS_Y, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::BoxLine, GizmoAxis::X)));

    gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
    gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
    assert_relative_eq!(s.graph.local_scale(s.node), Vec3::new(1.5, 1.0, 1.0), epsilon = 1e-3);
}

#[test]
fn test_scale_coord_space_is_locked() {
    let mut s = scene();
    let mut gizmo = ScaleGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &GizmoSettings::default()).unwrap();
    assert_eq!(gizmo.coord_space(), CoordSpace::Local);
    gizmo.set_coord_space(&mut s.graph, CoordSpace::World);
    assert_eq!(gizmo.coord_space(), CoordSpace::Local);
}

#[test]
fn test_hover_changes_once_per_handle() {
    let mut s = scene();
    let mut gizmo = translate_gizmo(&mut s, 2.0);
    let (x, y) = screen(&s.camera, Vec3::new(1.0, ON_AXIS_Y, 0.0));

    gizmo.on_pointer_move(&mut s.graph, &s.camera, x, y);
    gizmo.on_pointer_move(&mut s.graph, &s.camera, x + 1.0, y);
    let hovered = gizmo.hover_shape().unwrap();
    assert!(gizmo.gizmo().shapes()[hovered].hovered());
    let renders = |events: &[GizmoEvent]| events.iter().filter(|e| **e == GizmoEvent::RenderUpdate).count();
    assert_eq!(renders(&gizmo.gizmo_mut().events.drain()), 1);

    gizmo.on_pointer_move(&mut s.graph, &s.camera, 5.0, 5.0);
    assert_eq!(gizmo.hover_shape(), None);
    assert!(!gizmo.gizmo().shapes()[hovered].hovered());
    assert_eq!(renders(&gizmo.gizmo_mut().events.drain()), 1);
}

#[test]
fn test_detach_ends_drag() {
    let mut s = scene();
    let mut gizmo = translate_gizmo(&mut s, 2.0);
    let (x, y) = screen(&s.camera, Vec3::new(1.0, ON_AXIS_Y, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x, y);
    assert!(gizmo.is_dragging());

    gizmo.detach(&mut s.graph);
    assert!(!gizmo.is_dragging());
    let fired = kinds(&gizmo.gizmo_mut().events.drain());
    let position = |kind| fired.iter().position(|k| *k == kind);
    assert!(position(GizmoEventKind::NodesDetach) < position(GizmoEventKind::PointerUp));
    assert!(position(GizmoEventKind::PointerUp) < position(GizmoEventKind::TransformEnd));
    assert!(position(GizmoEventKind::NodesDetach).is_some());
}

#[test]
fn test_disabled_handle_is_ignored() {
    let mut s = scene();
    let mut gizmo = translate_gizmo(&mut s, 2.0);
    gizmo.set_handle_disabled(&mut s.graph, HandleTag::new(ShapeKind::Arrow, GizmoAxis::X), true);
    let (x, y) = screen(&s.camera, Vec3::new(1.0, ON_AXIS_Y, 0.0));

    gizmo.on_pointer_move(&mut s.graph, &s.camera, x, y);
    assert_eq!(gizmo.hover_shape(), None);
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x, y);
    assert!(!gizmo.is_dragging());
    assert_relative_eq!(s.graph.position(s.node), Vec3::zeros());
}

#[test]
fn test_destroy_removes_nodes() {
    let mut s = scene();
    let before = s.graph.node_count();
    let gizmo = TranslateGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &GizmoSettings::default()).unwrap();
    assert!(s.graph.node_count() > before);
    gizmo.destroy(&mut s.graph, &mut s.layers);
    assert_eq!(s.graph.node_count(), before);
}

#[test]
fn test_zero_net_movement_leaves_nodes_unchanged() {
    let mut s = scene();
    s.graph.set_local_position(s.node, Vec3::new(0.0, 0.0, 0.0));
    s.graph.set_local_scale(s.node, Vec3::new(1.0, 2.0, 3.0));
    let start_rotation = s.graph.rotation(s.node);
    let (x, y) = screen(&s.camera, Vec3::new(1.0, ON_AXIS_Y, 0.0));

    let mut translate = translate_gizmo(&mut s, 2.0);
    translate.on_pointer_down(&mut s.graph, &s.camera, x, y);
    for _ in 0..3 {
        translate.on_pointer_move(&mut s.graph, &s.camera, x, y);
    }
    translate.on_pointer_up(&s.graph);
    translate.destroy(&mut s.graph, &mut s.layers);

    let mut scale = ScaleGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &settings(2.0)).unwrap();
    scale.attach(&mut s.graph, &s.camera, &[s.node]);
    scale.on_pointer_down(&mut s.graph, &s.camera, x, y);
    assert!(scale.is_dragging());
    for _ in 0..3 {
        scale.on_pointer_move(&mut s.graph, &s.camera, x, y);
    }
    scale.on_pointer_up(&s.graph);
    scale.destroy(&mut s.graph, &mut s.layers);

    let mut rotate = RotateGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &GizmoSettings::default()).unwrap();
    rotate.attach(&mut s.graph, &s.camera, &[s.node]);
    let r = rotate.xyz_ring_radius() * rotate.gizmo().scale() * std::f32::consts::FRAC_1_SQRT_2;
    let (rx, ry) = screen(&s.camera, Vec3::new(r, r, 0.0));
    rotate.on_pointer_down(&mut s.graph, &s.camera, rx, ry);
    assert!(rotate.is_dragging());
    for _ in 0..3 {
        rotate.on_pointer_move(&mut s.graph, &s.camera, rx, ry);
    }
    rotate.on_pointer_up(&s.graph);

    assert_relative_eq!(s.graph.position(s.node), Vec3::zeros(), epsilon = 1e-5);
    assert_relative_eq!(s.graph.local_scale(s.node), Vec3::new(1.0, 2.0, 3.0), epsilon = 1e-5);
    assert!(s.graph.rotation(s.node).angle_to(&start_rotation) < 1e-4);
}

#[test]
fn test_translate_all_axes_holds_position() {
    let mut s = scene();
    let mut gizmo = translate_gizmo(&mut s, 2.0);

    let (x0, y0) = screen(&s.camera, Vec3::zeros());
    let (x1, y1) = screen(&s.camera, Vec3::new(1.0, 1.0, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::SphereCenter, GizmoAxis::Xyz)));

    // (1, 1, 0) lies sqrt(2) along the screen diagonal, applied on every axis
    for _ in 0..4 {
        gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
        assert_relative_eq!(s.graph.position(s.node), Vec3::repeat(SQRT_2), epsilon = 1e-3);
    }
    assert_relative_eq!(gizmo.gizmo().position(), Vec3::repeat(SQRT_2), epsilon = 1e-3);
    assert_relative_eq!(gizmo.drag().unwrap().gizmo_position_start, Vec3::zeros());
}

#[test]
fn test_translate_local_space_follows_node_axes() {
    let mut s = scene();
    s.graph
        .set_local_rotation(s.node, Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_2));
    let mut gizmo = translate_gizmo(&mut s, 2.0);
    gizmo.set_coord_space(&mut s.graph, CoordSpace::Local);

    // local X points along world Y
    let (x0, y0) = screen(&s.camera, Vec3::new(0.02, 1.0, 0.0));
    let (x1, y1) = screen(&s.camera, Vec3::new(0.02, 3.0, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::Arrow, GizmoAxis::X)));

    for _ in 0..3 {
        gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
        assert_relative_eq!(s.graph.position(s.node), Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-3);
    }
    assert_relative_eq!(s.graph.right(s.node), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
    gizmo.on_pointer_up(&s.graph);
}

#[test]
fn test_translate_orthographic_arrow() {
    let mut s = ortho_scene();
    let mut gizmo = translate_gizmo(&mut s, 1.0);
    assert_relative_eq!(gizmo.gizmo().scale(), 5.0 * ORTHO_SCALE_RATIO, epsilon = 1e-6);

    let (x0, y0) = screen(&s.camera, Vec3::new(0.5, ON_AXIS_Y, 0.0));
    let (x1, y1) = screen(&s.camera, Vec3::new(2.0, ON_AXIS_Y, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::Arrow, GizmoAxis::X)));

    for _ in 0..3 {
        gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
        assert_relative_eq!(s.graph.position(s.node), Vec3::new(1.5, 0.0, 0.0), epsilon = 1e-3);
    }
}

#[test]
fn test_scale_center_box_is_uniform() {
    let mut s = scene();
    let mut gizmo = ScaleGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &settings(2.0)).unwrap();
    gizmo.attach(&mut s.graph, &s.camera, &[s.node]);

    let (x0, y0) = screen(&s.camera, Vec3::zeros());
    // half a unit along the screen diagonal
    let (x1, y1) = screen(&s.camera, Vec3::new(0.25 * SQRT_2, 0.25 * SQRT_2, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::BoxCenter, GizmoAxis::Xyz)));

    for _ in 0..3 {
        gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
        assert_relative_eq!(s.graph.local_scale(s.node), Vec3::repeat(1.5), epsilon = 1e-3);
    }
    assert_relative_eq!(s.graph.position(s.node), Vec3::zeros(), epsilon = 1e-6);
}

#[test]
fn test_scale_plane_uniform_scaling() {
    let mut s = scene();
    let mut gizmo = ScaleGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &settings(2.0)).unwrap();
    gizmo.attach(&mut s.graph, &s.camera, &[s.node]);
    gizmo.set_uniform_scaling(true);
    assert!(gizmo.uniform_scaling());

    let start = 0.5;
    let end = start + 0.5 * std::f32::consts::FRAC_1_SQRT_2;
    let (x0, y0) = screen(&s.camera, Vec3::new(start, start, 0.0));
    let (x1, y1) = screen(&s.camera, Vec3::new(end, end, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::Plane, GizmoAxis::Z)));

    // both in-plane axes share one factor, the normal axis is untouched
    for _ in 0..3 {
        gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
        assert_relative_eq!(s.graph.local_scale(s.node), Vec3::new(1.5, 1.5, 1.0), epsilon = 1e-3);
    }
}

#[test]
fn test_rotate_face_ring() {
    let mut s = scene();
    let mut gizmo = RotateGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &GizmoSettings::default()).unwrap();
    gizmo.attach(&mut s.graph, &s.camera, &[s.node]);

    let radius = gizmo.face_ring_radius() * gizmo.gizmo().scale();
    let on_ring = |degrees: f32| {
        let a = degrees.to_radians();
        Vec3::new(radius * a.cos(), radius * a.sin(), 0.0)
    };
    let (x0, y0) = screen(&s.camera, on_ring(45.0));
    let (x1, y1) = screen(&s.camera, on_ring(120.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::Disk, GizmoAxis::Face)));

    let expected_right = Vec3::new(75f32.to_radians().cos(), 75f32.to_radians().sin(), 0.0);
    for _ in 0..3 {
        gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
        assert_relative_eq!(gizmo.angle(), 75.0, epsilon = 1e-2);
        assert_relative_eq!(s.graph.right(s.node), expected_right, epsilon = 1e-4);
    }
    assert_relative_eq!(s.graph.position(s.node), Vec3::zeros(), epsilon = 1e-5);
}

#[test]
fn test_rotate_edge_on_ring_uses_pointer_travel() {
    let mut s = scene();
    let mut gizmo = RotateGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &GizmoSettings::default()).unwrap();
    gizmo.attach(&mut s.graph, &s.camera, &[s.node]);

    // the X ring is seen edge-on as a vertical line through the center
    let (x0, y0) = screen(&s.camera, Vec3::new(0.02, 0.3, 0.0));
    let (x1, y1) = screen(&s.camera, Vec3::new(0.02, -0.3, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::Disk, GizmoAxis::X)));

    // the pointer ray at the near plane drops 0.006, rotating by 0.006 * ROTATE_SCALE
    let near0 = s.camera.screen_to_world(x0, y0, s.camera.near);
    let near1 = s.camera.screen_to_world(x1, y1, s.camera.near);
    let expected = (near0.y - near1.y) * ROTATE_SCALE;
    assert_relative_eq!(expected, 5.4, epsilon = 1e-2);

    let a = expected.to_radians();
    for _ in 0..3 {
        gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
        assert_relative_eq!(gizmo.angle(), expected, epsilon = 1e-3);
        assert_relative_eq!(s.graph.up(s.node), Vec3::new(0.0, a.cos(), a.sin()), epsilon = 1e-4);
    }
}

#[test]
fn test_rotate_edge_on_orthographic_divides_by_height() {
    let mut s = ortho_scene();
    let mut gizmo = RotateGizmo::new(&mut s.graph, &mut s.layers, &mut s.camera, &GizmoSettings::default()).unwrap();
    gizmo.attach(&mut s.graph, &s.camera, &[s.node]);

    // orthographic rays run parallel to the X ring's plane
    let (x0, y0) = screen(&s.camera, Vec3::new(0.02, 0.4, 0.0));
    let (x1, y1) = screen(&s.camera, Vec3::new(0.02, 0.3, 0.0));
    gizmo.on_pointer_down(&mut s.graph, &s.camera, x0, y0);
    assert_eq!(gizmo.selected(), Some(HandleTag::new(ShapeKind::Disk, GizmoAxis::X)));

    // 0.1 world units of travel at ortho height 5
    let expected = 0.1 * ROTATE_SCALE / 5.0;
    let a = expected.to_radians();
    for _ in 0..3 {
        gizmo.on_pointer_move(&mut s.graph, &s.camera, x1, y1);
        assert_relative_eq!(gizmo.angle(), expected, epsilon = 1e-2);
        assert_relative_eq!(s.graph.up(s.node), Vec3::new(0.0, a.cos(), a.sin()), epsilon = 1e-3);
    }
}
