//! Temporal anti-aliasing resolve with ping-pong accumulation buffers

use super::draw_fullscreen;
use crate::render::device::{
    GraphicsDevice, RenderTargetDescriptor, RenderTargetHandle, ShaderHandle, TextureDescriptor, TextureFormat,
    TextureHandle, UniformValue,
};
use crate::render::frame_graph::{PassBase, RenderContext, RenderPass, ResizeSource, SizeSource};
use crate::render::shaders;
use crate::render::RenderResult;
use crate::foundation::math::Vec2;

/// Blends the current frame into a reprojected history buffer
pub struct TaaPass {
    base: PassBase,
    shader: ShaderHandle,
    source_texture: TextureHandle,
    accumulation_index: usize,
    accumulation_textures: [TextureHandle; 2],
    accumulation_render_targets: [RenderTargetHandle; 2],
}

impl TaaPass {
    /// Create the pass resolving `source_texture`
    ///
    /// The accumulation buffers follow the size of the source.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        source_texture: TextureHandle,
        format: TextureFormat,
    ) -> RenderResult<Self> {
        let mut descriptor = shaders::quad_shader("TaaResolveShader", shaders::TAA_FRAGMENT);
        if device.caps().flip_uv_y {
            descriptor = descriptor.define("WEBGPU", "");
        }
        let shader = device.create_shader(&descriptor)?;

        let mut textures = [TextureHandle::default(); 2];
        let mut targets = [RenderTargetHandle::default(); 2];
        for i in 0..2 {
            textures[i] = device.create_texture(&TextureDescriptor::new(format!("TAA{}", i), format, 1, 1))?;
            targets[i] = device.create_render_target(&RenderTargetDescriptor::color(format!("TAA{}", i), textures[i]))?;
        }

        let mut base = PassBase::new("TaaPass");
        base.init(Some(targets[0]), Some(ResizeSource::new(SizeSource::Texture(source_texture))));

        Ok(Self {
            base,
            shader,
            source_texture,
            accumulation_index: 0,
            accumulation_textures: textures,
            accumulation_render_targets: targets,
        })
    }

    /// Flip to the other accumulation buffer and return it
    ///
    /// Called once per frame before the graph runs; the returned texture holds
    /// this frame's resolved image once the pass has executed.
    pub fn update(&mut self) -> TextureHandle {
        self.accumulation_index ^= 1;
        self.base.render_target = Some(self.accumulation_render_targets[self.accumulation_index]);
        self.accumulation_texture()
    }

    /// Index of the buffer written this frame
    pub fn accumulation_index(&self) -> usize {
        self.accumulation_index
    }

    /// Buffer written this frame
    pub fn accumulation_texture(&self) -> TextureHandle {
        self.accumulation_textures[self.accumulation_index]
    }

    /// Both accumulation buffers
    pub fn accumulation_textures(&self) -> [TextureHandle; 2] {
        self.accumulation_textures
    }

    /// Texture being resolved
    pub fn source_texture(&self) -> TextureHandle {
        self.source_texture
    }

    /// Change the texture being resolved
    pub fn set_source_texture(&mut self, texture: TextureHandle) {
        self.source_texture = texture;
        self.base.resize_source = Some(ResizeSource::new(SizeSource::Texture(texture)));
    }
}

impl RenderPass for TaaPass {
    fn base(&self) -> &PassBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PassBase {
        &mut self.base
    }

    fn before(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let device = &mut *ctx.device;
        let history = self.accumulation_textures[self.accumulation_index ^ 1];
        device.set_uniform("sourceTexture", UniformValue::Texture(self.source_texture));
        device.set_uniform("accumulationTexture", UniformValue::Texture(history));

        match ctx.resources.scene_depth {
            Some(depth) => device.set_uniform("uSceneDepthMap", UniformValue::Texture(depth)),
            None => log::warn!("{}: no scene depth published, reprojection is invalid", self.base.name),
        }

        let camera = ctx.camera;
        device.set_uniform("matrix_viewProjectionPrevious", camera.view_projection_previous().into());
        device.set_uniform("matrix_viewProjectionInverse", camera.view_projection_inverse().into());
        device.set_uniform("jitters", camera.jitters().into());

        let (width, height) = device.texture_size(self.source_texture).unwrap_or((1, 1));
        device.set_uniform("textureSize", Vec2::new(width as f32, height as f32).into());
        Ok(())
    }

    fn execute(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        draw_fullscreen(&self.base, ctx.device, self.shader)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        device.destroy_shader(self.shader);
        for target in self.accumulation_render_targets {
            device.destroy_render_target(target, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::DeviceCaps;
    use crate::render::HeadlessDevice;

    fn scene_texture(device: &mut HeadlessDevice) -> TextureHandle {
        device
            .create_texture(&TextureDescriptor::new("scene", TextureFormat::Rgba16F, 320, 200))
            .unwrap()
    }

    #[test]
    fn test_update_ping_pongs() {
        let mut device = HeadlessDevice::new(320, 200);
        let source = scene_texture(&mut device);
        let mut taa = TaaPass::new(&mut device, source, TextureFormat::Rgba16F).unwrap();
        let textures = taa.accumulation_textures();

        for n in 1..=6 {
            let current = taa.update();
            assert_eq!(taa.accumulation_index(), n % 2);
            assert_eq!(current, textures[n % 2]);
            assert_eq!(taa.accumulation_texture(), textures[n % 2]);
        }
    }

    #[test]
    fn test_webgpu_define_follows_caps() {
        let caps = DeviceCaps {
            flip_uv_y: true,
            ..DeviceCaps::default()
        };
        let mut device = HeadlessDevice::with_caps(64, 64, caps);
        let source = scene_texture(&mut device);
        let taa = TaaPass::new(&mut device, source, TextureFormat::Rgba16F).unwrap();

        assert!(device.shader(taa.shader).unwrap().has_define("WEBGPU"));
    }
}
