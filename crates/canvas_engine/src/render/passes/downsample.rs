//! 13-tap downsample into a smaller target

use super::{bind_source, draw_fullscreen};
use crate::render::device::{GraphicsDevice, ShaderHandle, TextureHandle};
use crate::render::frame_graph::{PassBase, RenderContext, RenderPass};
use crate::render::shaders;
use crate::render::RenderResult;

/// Downsamples `source_texture` into the pass's render target
pub struct DownsamplePass {
    base: PassBase,
    shader: ShaderHandle,
    /// Texture sampled by the pass; nothing is drawn while unset
    pub source_texture: Option<TextureHandle>,
}

impl DownsamplePass {
    /// Create the pass and compile its shader
    pub fn new(device: &mut dyn GraphicsDevice, source_texture: Option<TextureHandle>) -> RenderResult<Self> {
        let shader = device.create_shader(&shaders::quad_shader("DownSampleShader", shaders::DOWNSAMPLE_FRAGMENT))?;
        Ok(Self {
            base: PassBase::new("DownsamplePass"),
            shader,
            source_texture,
        })
    }
}

impl RenderPass for DownsamplePass {
    fn base(&self) -> &PassBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PassBase {
        &mut self.base
    }

    fn execute(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let Some(source) = self.source_texture else {
            log::warn!("{}: no source texture", self.base.name);
            return Ok(());
        };
        bind_source(ctx.device, source)?;
        draw_fullscreen(&self.base, ctx.device, self.shader)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        device.destroy_shader(self.shader);
    }
}
