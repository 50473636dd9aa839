//! Gizmo Demo
//!
//! Builds a small scene, renders it through a camera frame on the headless
//! device and drives a translate gizmo with simulated pointer input:
//! - Optional settings file (`.toml` or `.ron`) as the first argument
//! - Pointer down on the X arrow, a few moves along the axis, pointer up
//! - Every gizmo event and the final node position are logged

use std::rc::Rc;

use canvas_engine::config::ConfigError;
use canvas_engine::foundation::logging;
use canvas_engine::prelude::*;
use canvas_engine::scene::LAYERID_WORLD;
use log::{info, warn};

const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 720;

// Drag along +X in world units, sampled in equal steps
const DRAG_START: f32 = 1.0;
const DRAG_END: f32 = 4.0;
const DRAG_STEPS: u32 = 6;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("settings: {0}")]
    Config(#[from] ConfigError),

    #[error("gizmo: {0}")]
    Gizmo(#[from] GizmoError),

    #[error("render: {0}")]
    Render(#[from] RenderError),
}

struct GizmoDemoApp {
    device: HeadlessDevice,
    graph: SceneGraph,
    layers: LayerComposition,
    camera: Camera,
    frame: CameraFrame,
    gizmo: TranslateGizmo,
    target: NodeId,
}

impl GizmoDemoApp {
    fn new(gizmo_settings: &GizmoSettings) -> Result<Self, DemoError> {
        let mut graph = SceneGraph::new();
        let mut layers = LayerComposition::with_default_layers();
        let mut camera = Camera::perspective(
            Vec3::new(0.0, 0.0, 10.0),
            45.0,
            VIEWPORT_WIDTH,
            VIEWPORT_HEIGHT,
            0.1,
            1000.0,
        );

        let target = graph.create_node("crate");
        let mesh = Rc::new(Mesh::cube(Vec3::new(0.5, 0.5, 0.5)));
        let instance = graph.add_mesh_instance(MeshInstance::new(
            target,
            mesh,
            Material::opaque("crate", Color::new(0.8, 0.6, 0.3, 1.0)),
        ));
        layers.add_mesh_instance(LAYERID_WORLD, instance);

        let mut gizmo = TranslateGizmo::new(&mut graph, &mut layers, &mut camera, gizmo_settings)?;
        gizmo.attach(&mut graph, &camera, &[target]);

        let mut device = HeadlessDevice::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT);
        let options = CameraFrameOptions {
            taa_enabled: true,
            ..CameraFrameOptions::default()
        };
        let frame = CameraFrame::new(&mut device, &layers, &camera, None, options)?;

        Ok(Self {
            device,
            graph,
            layers,
            camera,
            frame,
            gizmo,
            target,
        })
    }

    fn render(&mut self) -> Result<(), DemoError> {
        self.gizmo.update(&mut self.graph, &self.camera);
        self.camera.update_view_projection();
        self.device.clear_commands();
        self.frame
            .render(&mut self.device, &self.graph, &self.layers, &self.camera)?;
        info!("Frame rendered with {} device commands", self.device.commands().len());
        Ok(())
    }

    fn screen_point(&self, x: f32) -> (f32, f32) {
        // a hair above the axis keeps the ray off the XZ plane handle
        let p = self.camera.world_to_screen(&Vec3::new(x, 0.02, 0.0));
        (p.x, p.y)
    }

    fn drag(&mut self) -> Result<(), DemoError> {
        let (x, y) = self.screen_point(DRAG_START);
        self.gizmo.on_pointer_move(&mut self.graph, &self.camera, x, y);
        self.gizmo.on_pointer_down(&mut self.graph, &self.camera, x, y);
        match self.gizmo.selected() {
            Some(tag) => info!("Dragging {:?}", tag),
            None => warn!("Pointer down at ({:.1}, {:.1}) missed every handle", x, y),
        }

        for step in 1..=DRAG_STEPS {
            let t = step as f32 / DRAG_STEPS as f32;
            let (x, y) = self.screen_point(DRAG_START + (DRAG_END - DRAG_START) * t);
            self.gizmo.on_pointer_move(&mut self.graph, &self.camera, x, y);
            self.render()?;
        }
        self.gizmo.on_pointer_up(&self.graph);
        Ok(())
    }

    fn report(&mut self) {
        for event in self.gizmo.gizmo_mut().events.drain() {
            match event {
                GizmoEvent::TransformMove { point_delta, .. } => {
                    info!("transform:move ({:.3}, {:.3}, {:.3})", point_delta.x, point_delta.y, point_delta.z);
                }
                GizmoEvent::PointerMove { .. } => {}
                other => info!("{:?}", other),
            }
        }
        let position = self.graph.position(self.target);
        info!("Node ended at ({:.3}, {:.3}, {:.3})", position.x, position.y, position.z);
    }
}

fn load_settings() -> Result<GizmoSettings, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading gizmo settings from {}", path);
            Ok(GizmoSettings::load_from_file(&path)?)
        }
        None => Ok(GizmoSettings {
            size: 2.0,
            ..GizmoSettings::default()
        }),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let settings = load_settings()?;
    let mut app = GizmoDemoApp::new(&settings)?;
    app.render()?;
    app.drag()?;
    app.report();

    let gizmo = app.gizmo;
    gizmo.destroy(&mut app.graph, &mut app.layers);
    info!("Gizmo destroyed, {} nodes left", app.graph.node_count());
    Ok(())
}
