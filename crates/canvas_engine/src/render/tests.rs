//! Camera frame pipeline tests against the headless device

use std::rc::Rc;

use super::*;
use crate::config::PostEffectsSettings;
use crate::foundation::color::Color;
use crate::foundation::math::Vec3;
use crate::render::passes::ToneMapping;
use crate::scene::{LayerComposition, Material, Mesh, MeshInstance, SceneGraph, LAYERID_UI, LAYERID_WORLD};

struct Fixture {
    device: HeadlessDevice,
    graph: SceneGraph,
    layers: LayerComposition,
    camera: Camera,
}

impl Fixture {
    fn new() -> Self {
        let mut graph = SceneGraph::new();
        let mut layers = LayerComposition::with_default_layers();
        let node = graph.create_node("box");
        let mesh = Rc::new(Mesh::cube(Vec3::new(0.5, 0.5, 0.5)));
        let solid = graph.add_mesh_instance(MeshInstance::new(
            node,
            Rc::clone(&mesh),
            Material::opaque("solid", Color::WHITE),
        ));
        let label = graph.add_mesh_instance(MeshInstance::new(
            node,
            mesh,
            Material::overlay("label", Color::WHITE.with_alpha(0.5)),
        ));
        layers.add_mesh_instance(LAYERID_WORLD, solid);
        layers.add_mesh_instance(LAYERID_UI, label);

        Self {
            device: HeadlessDevice::new(256, 128),
            graph,
            layers,
            camera: Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 45.0, 256, 128, 0.1, 100.0),
        }
    }

    fn frame(&mut self, options: CameraFrameOptions) -> CameraFrame {
        CameraFrame::new(&mut self.device, &self.layers, &self.camera, None, options).unwrap()
    }

    fn render(&mut self, frame: &mut CameraFrame) {
        self.camera.update_view_projection();
        self.device.clear_commands();
        frame
            .render(&mut self.device, &self.graph, &self.layers, &self.camera)
            .unwrap();
    }

    fn compose_textures(&self) -> Vec<(String, TextureHandle)> {
        self.device
            .commands()
            .iter()
            .find_map(|c| match c {
                DeviceCommand::DrawQuad { shader, textures, .. } if shader.starts_with("ComposeShader") => {
                    Some(textures.clone())
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    fn bound(&self, name: &str) -> Option<TextureHandle> {
        self.compose_textures()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }
}

#[test]
fn test_default_pipeline_order() {
    let mut fx = Fixture::new();
    let mut frame = fx.frame(CameraFrameOptions::default());
    fx.render(&mut frame);

    assert_eq!(
        frame.executed_passes(),
        ["SceneOpaquePass", "BloomPass", "ComposePass", "AfterPass"]
    );
}

#[test]
fn test_full_pipeline_order() {
    let mut fx = Fixture::new();
    let options = CameraFrameOptions {
        taa_enabled: true,
        scene_color_map: true,
        ..CameraFrameOptions::default()
    };
    let mut frame = fx.frame(options);
    assert!(frame.options().prepass_enabled);

    fx.render(&mut frame);
    assert_eq!(
        frame.executed_passes(),
        [
            "PrePass",
            "SceneOpaquePass",
            "ColorGrabPass",
            "SceneTransparentPass",
            "TaaPass",
            "BloomPass",
            "ComposePass",
            "AfterPass",
        ]
    );
}

#[test]
fn test_compose_source_follows_taa_toggle() {
    let mut fx = Fixture::new();
    let options = CameraFrameOptions {
        taa_enabled: true,
        ..CameraFrameOptions::default()
    };
    let mut frame = fx.frame(options);

    fx.render(&mut frame);
    let resolved = frame.taa().map(|t| t.accumulation_texture());
    assert_eq!(fx.bound("sceneTexture"), resolved);

    fx.render(&mut frame);
    let resolved_next = frame.taa().map(|t| t.accumulation_texture());
    assert_ne!(resolved, resolved_next);
    assert_eq!(fx.bound("sceneTexture"), resolved_next);

    frame.set_taa_enabled(&mut fx.device, false);
    fx.render(&mut frame);
    assert_eq!(fx.bound("sceneTexture"), Some(frame.scene_texture()));
    assert!(!frame.executed_passes().iter().any(|p| p == "TaaPass"));
}

#[test]
fn test_taa_reads_prepass_depth() {
    let mut fx = Fixture::new();
    let options = CameraFrameOptions {
        taa_enabled: true,
        ..CameraFrameOptions::default()
    };
    let mut frame = fx.frame(options);
    fx.render(&mut frame);

    let taa_depth = fx.device.commands().iter().find_map(|c| match c {
        DeviceCommand::DrawQuad { shader, textures, .. } if shader == "TaaResolveShader" => textures
            .iter()
            .find(|(n, _)| n == "uSceneDepthMap")
            .map(|(_, t)| *t),
        _ => None,
    });
    assert_eq!(taa_depth, Some(frame.scene_depth()));
}

#[test]
fn test_bloom_toggle_is_live() {
    let mut fx = Fixture::new();
    let mut frame = fx.frame(CameraFrameOptions::default());
    fx.render(&mut frame);
    assert!(frame.compose().key().unwrap().bloom);
    assert!(frame.bloom().render_target_count() > 1);

    frame.set_bloom_enabled(&mut fx.device, false);
    fx.render(&mut frame);
    assert!(!frame.compose().key().unwrap().bloom);
    assert_eq!(frame.bloom().render_target_count(), 1);
    assert!(!fx
        .device
        .quad_shader_names()
        .iter()
        .any(|name| name.starts_with("DownSample")));
}

#[test]
fn test_render_target_scale() {
    let mut fx = Fixture::new();
    let mut frame = fx.frame(CameraFrameOptions::default());
    frame.set_render_target_scale(0.5);
    fx.render(&mut frame);

    assert_eq!(fx.device.texture_size(frame.scene_texture()), Some((128, 64)));
    assert_eq!(fx.device.texture_size(frame.scene_depth()), Some((128, 64)));
}

#[test]
fn test_apply_settings() {
    let mut fx = Fixture::new();
    let mut frame = fx.frame(CameraFrameOptions::default());

    let mut settings = PostEffectsSettings::default();
    settings.tone_mapping = ToneMapping::Aces;
    settings.vignette.enabled = true;
    settings.bloom.intensity = 0.5;
    frame.apply_settings(&mut fx.device, &settings);
    fx.render(&mut frame);

    let key = frame.compose().key().unwrap();
    assert_eq!(key.tone_mapping, ToneMapping::Aces);
    assert!(key.vignette);
    assert_eq!(fx.device.uniform("bloomIntensity"), Some(UniformValue::Float(0.5)));
}

#[test]
fn test_destroy_releases_everything() {
    let mut fx = Fixture::new();
    let options = CameraFrameOptions {
        taa_enabled: true,
        scene_color_map: true,
        ..CameraFrameOptions::default()
    };
    let mut frame = fx.frame(options);
    fx.render(&mut frame);
    frame.destroy(&mut fx.device);

    assert_eq!(fx.device.texture_count(), 0);
    assert_eq!(fx.device.render_target_count(), 0);
    assert_eq!(fx.device.shader_count(), 0);
}
