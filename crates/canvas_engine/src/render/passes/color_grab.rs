//! Snapshot of the scene color for refraction-style materials

use crate::render::device::{
    GraphicsDevice, RenderTargetDescriptor, RenderTargetHandle, TextureDescriptor, TextureFormat, TextureHandle,
    UniformValue,
};
use crate::render::frame_graph::{PassBase, RenderContext, RenderPass, ResizeSource};
use crate::render::RenderResult;

/// Copies a render target's color into a texture sampled by later passes
pub struct ColorGrabPass {
    base: PassBase,
    source: Option<RenderTargetHandle>,
    texture: TextureHandle,
    target: RenderTargetHandle,
}

impl ColorGrabPass {
    /// Create a grab of `source` (`None` is the backbuffer)
    pub fn new(
        device: &mut dyn GraphicsDevice,
        source: Option<RenderTargetHandle>,
        format: TextureFormat,
    ) -> RenderResult<Self> {
        let texture = device.create_texture(&TextureDescriptor::new("SceneColorMap", format, 1, 1))?;
        let target = device.create_render_target(&RenderTargetDescriptor::color("SceneColorGrab", texture))?;
        let mut base = PassBase::new("ColorGrabPass");
        base.init(Some(target), Some(ResizeSource::new(source)));
        Ok(Self {
            base,
            source,
            texture,
            target,
        })
    }

    /// Grabbed texture
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }
}

impl RenderPass for ColorGrabPass {
    fn base(&self) -> &PassBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PassBase {
        &mut self.base
    }

    fn execute(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        ctx.device.copy_color(self.source, self.texture)
    }

    fn after(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        ctx.resources.scene_color = Some(self.texture);
        ctx.device.set_uniform("uSceneColorMap", UniformValue::Texture(self.texture));
        Ok(())
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        device.destroy_render_target(self.target, true);
    }
}
