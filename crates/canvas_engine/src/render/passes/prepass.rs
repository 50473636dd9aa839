//! Depth and velocity prepass
//!
//! Renders depth-writing geometry of the layers before [`LAYERID_DEPTH`] into
//! the shared scene depth buffer and a velocity texture, then publishes both
//! on the frame's [`FrameResources`](crate::render::FrameResources).

use crate::foundation::color::Color;
use crate::render::device::{
    ForwardDraw, GraphicsDevice, RenderTargetDescriptor, RenderTargetHandle, ShaderPass, TextureDescriptor,
    TextureFormat, TextureHandle,
};
use crate::render::frame_graph::{PassBase, RenderContext, RenderPass};
use crate::render::RenderResult;
use crate::scene::{MeshInstanceId, LAYERID_DEPTH};

/// Depth plus screen-space velocity prepass
pub struct PrePass {
    base: PassBase,
    depth_texture: TextureHandle,
    velocity_texture: TextureHandle,
    render_target: RenderTargetHandle,
    instances: Vec<MeshInstanceId>,
}

impl PrePass {
    /// Create the pass writing into `depth_texture`
    ///
    /// The depth texture is shared with the scene target and stays owned by
    /// the caller; the velocity texture is owned by the pass.
    pub fn new(device: &mut dyn GraphicsDevice, depth_texture: TextureHandle) -> RenderResult<Self> {
        let format = if device.caps().hdr_render_targets {
            TextureFormat::Rg16F
        } else {
            TextureFormat::Rgba8
        };
        let velocity_texture = device.create_texture(&TextureDescriptor::new("VelocityTexture", format, 1, 1).nearest())?;
        let render_target = device.create_render_target(&RenderTargetDescriptor {
            name: "PrepassTarget".into(),
            color: Some(velocity_texture),
            depth: Some(depth_texture),
            depth_buffer: true,
            samples: 1,
        })?;

        let mut base = PassBase::new("PrePass");
        base.render_target = Some(render_target);
        base.clear_color = Some(Color::new(0.0, 0.0, 0.0, 0.0));

        Ok(Self {
            base,
            depth_texture,
            velocity_texture,
            render_target,
            instances: Vec::new(),
        })
    }

    /// Depth texture written by the pass
    pub fn depth_texture(&self) -> TextureHandle {
        self.depth_texture
    }

    /// Velocity texture written by the pass
    pub fn velocity_texture(&self) -> TextureHandle {
        self.velocity_texture
    }
}

impl RenderPass for PrePass {
    fn base(&self) -> &PassBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PassBase {
        &mut self.base
    }

    fn frame_update(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        self.base.update_size(ctx.device)?;
        self.base.clear_depth = ctx.camera.clear_depth_buffer.then_some(1.0);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let (graph, camera, layers) = (ctx.graph, ctx.camera, ctx.layers);
        let mut clear_color = self.base.clear_color;
        let mut clear_depth = self.base.clear_depth;

        for sublayer in layers.sublayers() {
            if sublayer.layer == LAYERID_DEPTH {
                break;
            }
            if !sublayer.enabled || !camera.renders_layer(sublayer.layer) {
                continue;
            }
            let Some(layer) = layers.layer(sublayer.layer).filter(|l| l.enabled) else {
                continue;
            };

            self.instances.extend(layer.culled_instances(graph, sublayer.transparent).filter(|&id| {
                graph
                    .mesh_instance(id)
                    .is_some_and(|mi| mi.material.depth_write)
            }));

            if !self.instances.is_empty() {
                ctx.device.render_forward(&ForwardDraw {
                    target: Some(self.render_target),
                    camera,
                    graph,
                    instances: &self.instances,
                    shader_pass: ShaderPass::PrepassVelocity,
                    clear_color: clear_color.take(),
                    clear_depth: clear_depth.take(),
                })?;
            }
            self.instances.clear();
        }

        // nothing was drawn, still honor the clears
        if clear_color.is_some() || clear_depth.is_some() {
            ctx.device.render_forward(&ForwardDraw {
                target: Some(self.render_target),
                camera,
                graph,
                instances: &[],
                shader_pass: ShaderPass::PrepassVelocity,
                clear_color,
                clear_depth,
            })?;
        }
        Ok(())
    }

    fn after(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        ctx.resources.scene_depth = Some(self.depth_texture);
        ctx.resources.scene_velocity = Some(self.velocity_texture);
        Ok(())
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        device.destroy_render_target(self.render_target, false);
        device.destroy_texture(self.velocity_texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::{Camera, DeviceCommand, HeadlessDevice};
    use crate::scene::{LayerComposition, Material, Mesh, MeshInstance, SceneGraph, LAYERID_SKYBOX, LAYERID_WORLD};
    use std::rc::Rc;

    #[test]
    fn test_prepass_filters_depth_writers_and_stops_at_depth_layer() {
        let mut graph = SceneGraph::new();
        let node = graph.create_node("n");
        let mesh = Rc::new(Mesh::cube(Vec3::new(0.5, 0.5, 0.5)));
        let solid = graph.add_mesh_instance(MeshInstance::new(node, Rc::clone(&mesh), Material::opaque("s", Color::WHITE)));
        let mut no_depth = Material::opaque("nd", Color::WHITE);
        no_depth.depth_write = false;
        let skipped = graph.add_mesh_instance(MeshInstance::new(node, Rc::clone(&mesh), no_depth));
        let sky = graph.add_mesh_instance(MeshInstance::new(node, mesh, Material::opaque("sky", Color::GRAY)));

        let mut layers = LayerComposition::with_default_layers();
        layers.add_mesh_instance(LAYERID_WORLD, solid);
        layers.add_mesh_instance(LAYERID_WORLD, skipped);
        layers.add_mesh_instance(LAYERID_SKYBOX, sky);

        let mut device = HeadlessDevice::new(64, 64);
        let depth = device
            .create_texture(&TextureDescriptor::new("depth", TextureFormat::Depth32F, 64, 64))
            .unwrap();
        let mut prepass = PrePass::new(&mut device, depth).unwrap();

        let mut camera = Camera::default();
        camera.clear_depth_buffer = false;
        let mut ctx = crate::render::RenderContext::new(&mut device, &graph, &layers, &camera);
        prepass.frame_update(&mut ctx).unwrap();
        prepass.execute(&mut ctx).unwrap();
        prepass.after(&mut ctx).unwrap();

        assert_eq!(ctx.resources.scene_depth, Some(depth));
        assert_eq!(ctx.resources.scene_velocity, Some(prepass.velocity_texture()));

        match device.commands() {
            [DeviceCommand::RenderForward {
                items,
                shader_pass,
                clear_depth,
                ..
            }] => {
                assert_eq!(items, &vec![solid]);
                assert_eq!(*shader_pass, ShaderPass::PrepassVelocity);
                assert_eq!(*clear_depth, None);
            }
            other => panic!("unexpected commands {:?}", other),
        }
    }
}
