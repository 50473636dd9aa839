//! Render pass contract and frame executor
//!
//! A render pass draws into one render target. Every frame the executor first
//! lets each pass update its state ([`RenderPass::frame_update`], e.g. resizing
//! its target to follow a source), then runs the enabled passes: nested
//! "before" passes first, then the pass's own `before`, `execute` and `after`
//! hooks.
//!
//! Data one pass produces for later passes (scene depth, velocity, grabbed
//! color) is published on [`FrameResources`] rather than through global state.

use super::camera::Camera;
use super::device::{BlendState, GraphicsDevice, RenderTargetHandle, TextureHandle};
use super::RenderResult;
use crate::foundation::color::Color;
use crate::scene::{LayerComposition, SceneGraph};

/// Textures published by passes for the remainder of the frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameResources {
    /// Linear scene depth written by the prepass
    pub scene_depth: Option<TextureHandle>,
    /// Screen-space velocity written by the prepass
    pub scene_velocity: Option<TextureHandle>,
    /// Copy of the opaque scene color made by the color grab pass
    pub scene_color: Option<TextureHandle>,
}

/// Everything a pass may touch while rendering one camera frame
pub struct RenderContext<'a> {
    /// GPU device
    pub device: &'a mut dyn GraphicsDevice,
    /// Scene being rendered
    pub graph: &'a SceneGraph,
    /// Layer order
    pub layers: &'a LayerComposition,
    /// Viewpoint
    pub camera: &'a Camera,
    /// Per-frame published textures
    pub resources: FrameResources,
}

impl<'a> RenderContext<'a> {
    /// Context with no published resources yet
    pub fn new(
        device: &'a mut dyn GraphicsDevice,
        graph: &'a SceneGraph,
        layers: &'a LayerComposition,
        camera: &'a Camera,
    ) -> Self {
        Self {
            device,
            graph,
            layers,
            camera,
            resources: FrameResources::default(),
        }
    }
}

/// Something with a size a render target can follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSource {
    /// The default framebuffer
    Backbuffer,
    /// A render target
    Target(RenderTargetHandle),
    /// A texture
    Texture(TextureHandle),
}

impl From<Option<RenderTargetHandle>> for SizeSource {
    fn from(target: Option<RenderTargetHandle>) -> Self {
        target.map_or(SizeSource::Backbuffer, SizeSource::Target)
    }
}

impl SizeSource {
    /// Current size in pixels
    pub fn size(self, device: &dyn GraphicsDevice) -> Option<(u32, u32)> {
        match self {
            SizeSource::Backbuffer => device.render_target_size(None),
            SizeSource::Target(target) => device.render_target_size(Some(target)),
            SizeSource::Texture(texture) => device.texture_size(texture),
        }
    }
}

/// Source a pass's render target follows in size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSource {
    /// What to follow
    pub source: SizeSource,
    /// Horizontal scale relative to the source
    pub scale_x: f32,
    /// Vertical scale relative to the source
    pub scale_y: f32,
}

impl ResizeSource {
    /// Follow `source` at the same size
    pub fn new(source: impl Into<SizeSource>) -> Self {
        Self::scaled(source, 1.0)
    }

    /// Follow `source` with the same scale on both axes
    pub fn scaled(source: impl Into<SizeSource>, scale: f32) -> Self {
        Self {
            source: source.into(),
            scale_x: scale,
            scale_y: scale,
        }
    }
}

/// State shared by every render pass
pub struct PassBase {
    /// Debug name
    pub name: String,
    /// Disabled passes (and their before passes) are skipped
    pub enabled: bool,
    /// Destination; `None` is the backbuffer
    pub render_target: Option<RenderTargetHandle>,
    /// Source the target is resized to follow every frame
    pub resize_source: Option<ResizeSource>,
    /// Clear color applied when the pass starts
    pub clear_color: Option<Color>,
    /// Clear depth applied when the pass starts
    pub clear_depth: Option<f32>,
    /// Output blending
    pub blend: BlendState,
    /// Passes run right before this one, in order
    pub before_passes: Vec<Box<dyn RenderPass>>,
}

impl PassBase {
    /// Enabled pass rendering to the backbuffer
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            render_target: None,
            resize_source: None,
            clear_color: None,
            clear_depth: None,
            blend: BlendState::Opaque,
            before_passes: Vec::new(),
        }
    }

    /// Set the destination and optional resize source
    pub fn init(&mut self, render_target: Option<RenderTargetHandle>, resize_source: Option<ResizeSource>) {
        self.render_target = render_target;
        self.resize_source = resize_source;
    }

    /// Resize the render target to follow its source
    pub fn update_size(&self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        let (Some(target), Some(resize)) = (self.render_target, self.resize_source) else {
            return Ok(());
        };
        let Some((width, height)) = resize.source.size(device) else {
            log::warn!("{}: resize source is gone", self.name);
            return Ok(());
        };
        let width = ((width as f32 * resize.scale_x).floor() as u32).max(1);
        let height = ((height as f32 * resize.scale_y).floor() as u32).max(1);
        if device.render_target_size(Some(target)) != Some((width, height)) {
            log::trace!("{}: resizing target to {}x{}", self.name, width, height);
            device.resize_render_target(target, width, height)?;
        }
        Ok(())
    }

    /// Destination size in pixels
    pub fn target_size(&self, device: &dyn GraphicsDevice) -> (u32, u32) {
        device.render_target_size(self.render_target).unwrap_or((1, 1))
    }
}

impl std::fmt::Debug for PassBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassBase")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("render_target", &self.render_target)
            .field("before_passes", &self.before_passes.len())
            .finish()
    }
}

/// A unit of GPU work in the frame
pub trait RenderPass {
    /// Shared pass state
    fn base(&self) -> &PassBase;

    /// Mutable shared pass state
    fn base_mut(&mut self) -> &mut PassBase;

    /// Per-frame state update, run for enabled and disabled passes alike
    fn frame_update(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        self.base().update_size(ctx.device)
    }

    /// Hook run right before [`RenderPass::execute`]
    fn before(&mut self, _ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        Ok(())
    }

    /// Record the pass's GPU work
    fn execute(&mut self, _ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        Ok(())
    }

    /// Hook run right after [`RenderPass::execute`]
    fn after(&mut self, _ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        Ok(())
    }

    /// Called when the pass becomes enabled
    fn on_enable(&mut self, _device: &mut dyn GraphicsDevice) {}

    /// Called when the pass becomes disabled
    fn on_disable(&mut self, _device: &mut dyn GraphicsDevice) {}

    /// Release GPU resources owned by the pass
    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        for pass in &mut self.base_mut().before_passes {
            pass.destroy(device);
        }
        self.base_mut().before_passes.clear();
    }

    /// Debug name
    fn name(&self) -> &str {
        &self.base().name
    }

    /// Whether the pass runs
    fn enabled(&self) -> bool {
        self.base().enabled
    }

    /// Toggle the pass, invoking the enable/disable hooks on change
    fn set_enabled(&mut self, device: &mut dyn GraphicsDevice, enabled: bool) {
        if self.base().enabled == enabled {
            return;
        }
        self.base_mut().enabled = enabled;
        if enabled {
            self.on_enable(device);
        } else {
            self.on_disable(device);
        }
    }
}

/// Runs render passes for a frame and remembers what ran
#[derive(Debug, Default)]
pub struct FrameGraph {
    executed: Vec<String>,
}

impl FrameGraph {
    /// Create an executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Update then render `passes` in order
    pub fn execute(&mut self, passes: &mut [&mut dyn RenderPass], ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        self.executed.clear();
        for pass in passes.iter_mut() {
            Self::update(&mut **pass, ctx)?;
        }
        for pass in passes.iter_mut() {
            self.render(&mut **pass, ctx)?;
        }
        log::trace!("frame executed {} passes", self.executed.len());
        Ok(())
    }

    /// Names of the passes rendered by the last [`FrameGraph::execute`], in order
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    fn update(pass: &mut dyn RenderPass, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        pass.frame_update(ctx)?;
        for before in &mut pass.base_mut().before_passes {
            Self::update(before.as_mut(), ctx)?;
        }
        Ok(())
    }

    fn render(&mut self, pass: &mut dyn RenderPass, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        if !pass.enabled() {
            return Ok(());
        }
        let mut befores = std::mem::take(&mut pass.base_mut().before_passes);
        let result = befores.iter_mut().try_for_each(|before| self.render(before.as_mut(), ctx));
        pass.base_mut().before_passes = befores;
        result?;

        pass.before(ctx)?;
        pass.execute(ctx)?;
        pass.after(ctx)?;
        self.executed.push(pass.name().to_owned());
        Ok(())
    }
}
