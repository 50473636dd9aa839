//! # Canvas Engine
//!
//! Camera post-processing pipeline and interactive transform gizmos for a
//! real-time 3D engine.
//!
//! ## Features
//!
//! - **Camera frame**: prepass, forward layers, scene color grab, TAA, bloom
//!   and a compose pass with tone mapping, grading, vignette and fringing,
//!   rebuilt automatically when options change
//! - **Device abstraction**: passes talk to a [`render::GraphicsDevice`]; the
//!   [`render::HeadlessDevice`] records every command for tests and tools
//! - **Transform gizmos**: translate, rotate and scale handles with ray
//!   picking, hover states, snapping and world/local coordinate spaces
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use canvas_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut graph = SceneGraph::new();
//!     let mut layers = LayerComposition::with_default_layers();
//!     let mut camera = Camera::default();
//!
//!     let node = graph.create_node("box");
//!     let mut gizmo = TranslateGizmo::new(&mut graph, &mut layers, &mut camera, &GizmoSettings::default())?;
//!     gizmo.attach(&mut graph, &camera, &[node]);
//!
//!     let mut device = HeadlessDevice::new(camera.width, camera.height);
//!     let mut frame = CameraFrame::new(&mut device, &layers, &camera, None, CameraFrameOptions::default())?;
//!     camera.update_view_projection();
//!     frame.render(&mut device, &graph, &layers, &camera)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod events;
pub mod scene;
pub mod render;
pub mod gizmo;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, GizmoSettings, PostEffectsSettings},
        events::{Event, EventBus, EventHandler},
        foundation::{
            color::Color,
            math::{Mat4, Quat, Transform, Vec3},
        },
        gizmo::{
            CoordSpace, GizmoError, GizmoEvent, GizmoEventKind, RotateGizmo, ScaleGizmo, TransformGizmo,
            TranslateGizmo,
        },
        render::{
            Camera, CameraFrame, CameraFrameOptions, GraphicsDevice, HeadlessDevice, Projection, RenderError,
        },
        scene::{LayerComposition, Material, Mesh, MeshInstance, NodeId, SceneGraph},
    };
}
