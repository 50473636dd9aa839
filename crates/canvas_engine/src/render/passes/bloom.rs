//! Bloom: a downsample/upsample blur pyramid over an HDR source
//!
//! The chain depth follows the source resolution. Every frame the number of
//! levels is recomputed; when it changes the whole chain is torn down and
//! rebuilt, keeping only render target 0, which holds the final blurred
//! result and is referenced by the compose pass.

use super::{DownsamplePass, UpsamplePass};
use crate::foundation::color::Color;
use crate::render::device::{
    BlendState, GraphicsDevice, RenderTargetDescriptor, RenderTargetHandle, TextureDescriptor, TextureFormat,
    TextureHandle,
};
use crate::render::frame_graph::{PassBase, RenderContext, RenderPass, ResizeSource, SizeSource};
use crate::render::{RenderError, RenderResult};

/// Number of halving steps before the smaller dimension falls under `min_size`
///
/// `floor(log2(min(w, h)) - log2(min_size))`, clamped at zero.
pub fn calc_mip_levels(width: u32, height: u32, min_size: u32) -> u32 {
    let smallest = width.min(height).max(1) as f32;
    let levels = (smallest.log2() - (min_size.max(1) as f32).log2()).floor();
    levels.max(0.0) as u32
}

/// Blur pyramid producing [`BloomPass::bloom_texture`]
pub struct BloomPass {
    base: PassBase,
    format: TextureFormat,
    /// Texture being bloomed; the chain is idle while unset
    pub source_texture: Option<TextureHandle>,
    /// Smallest level of the pyramid, as a power of two in texels
    pub last_mip_level: u32,
    render_targets: Vec<RenderTargetHandle>,
    bloom_texture: TextureHandle,
    downsample_passes: Vec<DownsamplePass>,
    upsample_passes: Vec<UpsamplePass>,
}

impl BloomPass {
    /// Create the pass with its output target
    pub fn new(
        device: &mut dyn GraphicsDevice,
        source_texture: Option<TextureHandle>,
        format: TextureFormat,
    ) -> RenderResult<Self> {
        let mut pass = Self {
            base: PassBase::new("BloomPass"),
            format,
            source_texture,
            last_mip_level: 1,
            render_targets: Vec::new(),
            bloom_texture: TextureHandle::default(),
            downsample_passes: Vec::new(),
            upsample_passes: Vec::new(),
        };
        pass.create_render_targets(device, 1)?;
        pass.bloom_texture = device
            .render_target_color(pass.render_targets[0])
            .ok_or_else(|| RenderError::ResourceCreationFailed("bloom output texture".into()))?;
        Ok(pass)
    }

    /// The blurred result; always a live texture, 1x1 while the pass is disabled
    pub fn bloom_texture(&self) -> TextureHandle {
        self.bloom_texture
    }

    /// Number of render targets in the chain
    pub fn render_target_count(&self) -> usize {
        self.render_targets.len()
    }

    /// Number of downsample passes in the chain
    pub fn downsample_pass_count(&self) -> usize {
        self.downsample_passes.len()
    }

    /// Number of upsample passes in the chain
    pub fn upsample_pass_count(&self) -> usize {
        self.upsample_passes.len()
    }

    fn create_render_targets(&mut self, device: &mut dyn GraphicsDevice, count: usize) -> RenderResult<()> {
        for i in self.render_targets.len()..count {
            let color = device.create_texture(&TextureDescriptor::new(format!("BloomTexture{}", i), self.format, 1, 1))?;
            let target = device.create_render_target(&RenderTargetDescriptor::color(format!("BloomRenderTarget{}", i), color))?;
            self.render_targets.push(target);
        }
        Ok(())
    }

    fn destroy_render_targets(&mut self, device: &mut dyn GraphicsDevice, start_index: usize) {
        for target in self.render_targets.drain(start_index.min(self.render_targets.len())..) {
            device.destroy_render_target(target, true);
        }
    }

    fn destroy_passes(&mut self, device: &mut dyn GraphicsDevice) {
        for pass in &mut self.downsample_passes {
            pass.destroy(device);
        }
        for pass in &mut self.upsample_passes {
            pass.destroy(device);
        }
        self.downsample_passes.clear();
        self.upsample_passes.clear();
    }

    fn create_passes(&mut self, device: &mut dyn GraphicsDevice, source: TextureHandle) -> RenderResult<()> {
        let num_passes = self.render_targets.len();

        for i in 0..num_passes {
            let (pass_source, size_source) = if i == 0 {
                (Some(source), SizeSource::Texture(source))
            } else {
                let previous = self.render_targets[i - 1];
                (device.render_target_color(previous), SizeSource::Target(previous))
            };
            let mut pass = DownsamplePass::new(device, pass_source)?;
            let base = pass.base_mut();
            base.name = format!("DownsamplePass{}", i);
            base.init(Some(self.render_targets[i]), Some(ResizeSource::scaled(size_source, 0.5)));
            base.clear_color = Some(Color::BLACK);
            self.downsample_passes.push(pass);
        }

        for i in (0..num_passes.saturating_sub(1)).rev() {
            let pass_source = device.render_target_color(self.render_targets[i + 1]);
            let mut pass = UpsamplePass::new(device, pass_source)?;
            let base = pass.base_mut();
            base.name = format!("UpsamplePass{}", i);
            base.init(Some(self.render_targets[i]), None);
            base.blend = BlendState::Additive;
            self.upsample_passes.push(pass);
        }

        log::debug!(
            "bloom chain rebuilt: {} downsample, {} upsample passes",
            self.downsample_passes.len(),
            self.upsample_passes.len()
        );
        Ok(())
    }
}

impl RenderPass for BloomPass {
    fn base(&self) -> &PassBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PassBase {
        &mut self.base
    }

    fn frame_update(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        if !self.base.enabled {
            return Ok(());
        }
        let Some(source) = self.source_texture else {
            return Ok(());
        };
        let (width, height) = ctx
            .device
            .texture_size(source)
            .ok_or_else(|| RenderError::InvalidHandle(format!("bloom source {:?}", source)))?;

        let max_num_passes = calc_mip_levels(width, height, 1 << self.last_mip_level);
        let num_passes = max_num_passes.max(1) as usize;

        if self.render_targets.len() != num_passes || self.downsample_passes.is_empty() {
            self.destroy_passes(ctx.device);
            self.destroy_render_targets(ctx.device, 1);
            self.create_render_targets(ctx.device, num_passes)?;
            self.create_passes(ctx.device, source)?;
        }

        // the source may be swapped between frames, e.g. when TAA is toggled
        if let Some(first) = self.downsample_passes.first_mut() {
            first.source_texture = Some(source);
            if let Some(resize) = first.base_mut().resize_source.as_mut() {
                resize.source = SizeSource::Texture(source);
            }
        }

        for pass in &mut self.downsample_passes {
            pass.frame_update(ctx)?;
        }
        for pass in &mut self.upsample_passes {
            pass.frame_update(ctx)?;
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let chain = self
            .downsample_passes
            .iter_mut()
            .map(|p| p as &mut dyn RenderPass)
            .chain(self.upsample_passes.iter_mut().map(|p| p as &mut dyn RenderPass));
        for pass in chain {
            if !pass.enabled() {
                continue;
            }
            pass.before(ctx)?;
            pass.execute(ctx)?;
            pass.after(ctx)?;
        }
        Ok(())
    }

    fn on_disable(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(&first) = self.render_targets.first() {
            if let Err(e) = device.resize_render_target(first, 1, 1) {
                log::warn!("failed to shrink bloom target: {}", e);
            }
        }
        self.destroy_passes(device);
        self.destroy_render_targets(device, 1);
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        self.destroy_passes(device);
        self.destroy_render_targets(device, 0);
    }
}
