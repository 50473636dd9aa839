//! Headless graphics device
//!
//! Keeps resource bookkeeping in slotmaps and records every draw as a
//! [`DeviceCommand`] instead of touching a GPU. Used for tests, tooling and
//! running the pipeline on machines without a display.

use std::collections::HashMap;

use slotmap::SlotMap;

use super::device::{
    BlendState, DeviceCaps, ForwardDraw, GraphicsDevice, QuadDraw, RenderTargetDescriptor, RenderTargetHandle,
    ShaderDescriptor, ShaderHandle, ShaderPass, TextureDescriptor, TextureFormat, TextureHandle, UniformValue,
};
use super::{RenderError, RenderResult};
use crate::foundation::color::Color;
use crate::scene::MeshInstanceId;

#[derive(Debug, Clone)]
struct TextureRecord {
    desc: TextureDescriptor,
}

#[derive(Debug, Clone)]
struct RenderTargetRecord {
    desc: RenderTargetDescriptor,
    width: u32,
    height: u32,
}

/// A recorded device operation
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Fullscreen quad
    DrawQuad {
        /// Destination (`None` is the backbuffer)
        target: Option<RenderTargetHandle>,
        /// Shader name
        shader: String,
        /// Blending
        blend: BlendState,
        /// Clear color
        clear_color: Option<Color>,
        /// Texture uniforms bound at draw time, sorted by name
        textures: Vec<(String, TextureHandle)>,
    },
    /// Forward rendering
    RenderForward {
        /// Destination (`None` is the backbuffer)
        target: Option<RenderTargetHandle>,
        /// Shader pass
        shader_pass: ShaderPass,
        /// Submitted instances, in order
        items: Vec<MeshInstanceId>,
        /// Clear color
        clear_color: Option<Color>,
        /// Clear depth
        clear_depth: Option<f32>,
    },
    /// Color copy
    CopyColor {
        /// Source (`None` is the backbuffer)
        source: Option<RenderTargetHandle>,
        /// Destination texture
        destination: TextureHandle,
    },
}

/// Recording [`GraphicsDevice`] without a GPU
#[derive(Debug)]
pub struct HeadlessDevice {
    caps: DeviceCaps,
    backbuffer: (u32, u32),
    textures: SlotMap<TextureHandle, TextureRecord>,
    render_targets: SlotMap<RenderTargetHandle, RenderTargetRecord>,
    shaders: SlotMap<ShaderHandle, ShaderDescriptor>,
    uniforms: HashMap<String, UniformValue>,
    commands: Vec<DeviceCommand>,
    shaders_compiled: usize,
}

impl HeadlessDevice {
    /// Create a device with a backbuffer of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_caps(width, height, DeviceCaps::default())
    }

    /// Create a device reporting specific capabilities
    pub fn with_caps(width: u32, height: u32, caps: DeviceCaps) -> Self {
        log::debug!("Creating headless device {}x{} ({:?})", width, height, caps);
        Self {
            caps,
            backbuffer: (width.max(1), height.max(1)),
            textures: SlotMap::with_key(),
            render_targets: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            uniforms: HashMap::new(),
            commands: Vec::new(),
            shaders_compiled: 0,
        }
    }

    /// Commands recorded since the last [`HeadlessDevice::clear_commands`]
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Forget recorded commands
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Names of the shaders used by recorded quad draws, in order
    pub fn quad_shader_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::DrawQuad { shader, .. } => Some(shader.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Current value of a uniform
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    /// Number of live textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of live render targets
    pub fn render_target_count(&self) -> usize {
        self.render_targets.len()
    }

    /// Number of live shaders
    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    /// Total number of shader compilations
    pub fn shaders_compiled(&self) -> usize {
        self.shaders_compiled
    }

    /// Descriptor of a live shader
    pub fn shader(&self, shader: ShaderHandle) -> Option<&ShaderDescriptor> {
        self.shaders.get(shader)
    }

    /// Texture name, for diagnostics
    pub fn texture_name(&self, texture: TextureHandle) -> Option<&str> {
        self.textures.get(texture).map(|t| t.desc.name.as_str())
    }

    fn check_target(&self, target: Option<RenderTargetHandle>) -> RenderResult<()> {
        match target {
            Some(t) if !self.render_targets.contains_key(t) => {
                Err(RenderError::InvalidHandle(format!("render target {:?}", t)))
            }
            _ => Ok(()),
        }
    }

    fn bound_textures(&self) -> Vec<(String, TextureHandle)> {
        let mut bound: Vec<_> = self
            .uniforms
            .iter()
            .filter_map(|(name, value)| match value {
                UniformValue::Texture(t) => Some((name.clone(), *t)),
                _ => None,
            })
            .collect();
        bound.sort_by(|a, b| a.0.cmp(&b.0));
        bound
    }

    fn resize_texture(&mut self, texture: Option<TextureHandle>, width: u32, height: u32) {
        if let Some(record) = texture.and_then(|t| self.textures.get_mut(t)) {
            record.desc.width = width;
            record.desc.height = height;
        }
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    fn backbuffer_size(&self) -> (u32, u32) {
        self.backbuffer
    }

    fn resize_backbuffer(&mut self, width: u32, height: u32) {
        self.backbuffer = (width.max(1), height.max(1));
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> RenderResult<TextureHandle> {
        let half_float = matches!(desc.format, TextureFormat::Rgba16F | TextureFormat::Rg16F);
        if half_float && !self.caps.hdr_render_targets {
            return Err(RenderError::ResourceCreationFailed(format!(
                "{}: {:?} is not supported by this device",
                desc.name, desc.format
            )));
        }
        log::trace!("create texture '{}' {}x{} {:?}", desc.name, desc.width, desc.height, desc.format);
        Ok(self.textures.insert(TextureRecord { desc: desc.clone() }))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(texture);
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture).map(|t| (t.desc.width, t.desc.height))
    }

    fn texture_format(&self, texture: TextureHandle) -> Option<TextureFormat> {
        self.textures.get(texture).map(|t| t.desc.format)
    }

    fn create_render_target(&mut self, desc: &RenderTargetDescriptor) -> RenderResult<RenderTargetHandle> {
        let attachment = desc.color.or(desc.depth).ok_or_else(|| {
            RenderError::InvalidConfiguration(format!("render target '{}' has no attachments", desc.name))
        })?;
        let (width, height) = self
            .texture_size(attachment)
            .ok_or_else(|| RenderError::InvalidHandle(format!("attachment of '{}'", desc.name)))?;
        if desc.samples > self.caps.max_samples {
            return Err(RenderError::InvalidConfiguration(format!(
                "render target '{}' requests {} samples, device supports {}",
                desc.name, desc.samples, self.caps.max_samples
            )));
        }
        Ok(self.render_targets.insert(RenderTargetRecord {
            desc: desc.clone(),
            width,
            height,
        }))
    }

    fn destroy_render_target(&mut self, target: RenderTargetHandle, destroy_textures: bool) {
        if let Some(record) = self.render_targets.remove(target) {
            if destroy_textures {
                for texture in [record.desc.color, record.desc.depth].into_iter().flatten() {
                    self.textures.remove(texture);
                }
            }
        }
    }

    fn resize_render_target(&mut self, target: RenderTargetHandle, width: u32, height: u32) -> RenderResult<()> {
        let (width, height) = (width.max(1), height.max(1));
        let record = self
            .render_targets
            .get_mut(target)
            .ok_or_else(|| RenderError::InvalidHandle(format!("render target {:?}", target)))?;
        record.width = width;
        record.height = height;
        let (color, depth) = (record.desc.color, record.desc.depth);
        self.resize_texture(color, width, height);
        self.resize_texture(depth, width, height);
        Ok(())
    }

    fn render_target_size(&self, target: Option<RenderTargetHandle>) -> Option<(u32, u32)> {
        match target {
            Some(t) => self.render_targets.get(t).map(|r| (r.width, r.height)),
            None => Some(self.backbuffer),
        }
    }

    fn render_target_color(&self, target: RenderTargetHandle) -> Option<TextureHandle> {
        self.render_targets.get(target).and_then(|r| r.desc.color)
    }

    fn render_target_depth(&self, target: RenderTargetHandle) -> Option<TextureHandle> {
        self.render_targets
            .get(target)
            .filter(|r| r.desc.depth_buffer)
            .and_then(|r| r.desc.depth)
    }

    fn create_shader(&mut self, desc: &ShaderDescriptor) -> RenderResult<ShaderHandle> {
        if desc.vertex.is_empty() || desc.fragment.is_empty() {
            return Err(RenderError::ResourceCreationFailed(format!("shader '{}' has an empty stage", desc.name)));
        }
        self.shaders_compiled += 1;
        log::debug!("compiled shader '{}' ({} defines)", desc.name, desc.defines.len());
        Ok(self.shaders.insert(desc.clone()))
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(shader);
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_owned(), value);
    }

    fn draw_quad(&mut self, draw: &QuadDraw) -> RenderResult<()> {
        self.check_target(draw.target)?;
        let shader = self
            .shaders
            .get(draw.shader)
            .ok_or_else(|| RenderError::InvalidHandle(format!("shader {:?}", draw.shader)))?
            .name
            .clone();
        let textures = self.bound_textures();
        self.commands.push(DeviceCommand::DrawQuad {
            target: draw.target,
            shader,
            blend: draw.blend,
            clear_color: draw.clear_color,
            textures,
        });
        Ok(())
    }

    fn render_forward(&mut self, draw: &ForwardDraw<'_>) -> RenderResult<()> {
        self.check_target(draw.target)?;
        self.commands.push(DeviceCommand::RenderForward {
            target: draw.target,
            shader_pass: draw.shader_pass,
            items: draw.instances.to_vec(),
            clear_color: draw.clear_color,
            clear_depth: draw.clear_depth,
        });
        Ok(())
    }

    fn copy_color(&mut self, source: Option<RenderTargetHandle>, destination: TextureHandle) -> RenderResult<()> {
        self.check_target(source)?;
        if !self.textures.contains_key(destination) {
            return Err(RenderError::InvalidHandle(format!("texture {:?}", destination)));
        }
        self.commands.push(DeviceCommand::CopyColor { source, destination });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_target_resize_follows_attachments() {
        let mut device = HeadlessDevice::new(640, 480);
        let color = device
            .create_texture(&TextureDescriptor::new("c", TextureFormat::Rgba8, 64, 32))
            .unwrap();
        let target = device
            .create_render_target(&RenderTargetDescriptor::color("rt", color))
            .unwrap();

        assert_eq!(device.render_target_size(Some(target)), Some((64, 32)));
        device.resize_render_target(target, 10, 0).unwrap();
        assert_eq!(device.texture_size(color), Some((10, 1)));
        assert_eq!(device.render_target_size(None), Some((640, 480)));
    }

    #[test]
    fn test_destroy_render_target_with_textures() {
        let mut device = HeadlessDevice::new(16, 16);
        let color = device
            .create_texture(&TextureDescriptor::new("c", TextureFormat::Rgba8, 4, 4))
            .unwrap();
        let target = device
            .create_render_target(&RenderTargetDescriptor::color("rt", color))
            .unwrap();

        device.destroy_render_target(target, true);
        assert_eq!(device.texture_count(), 0);
        assert_eq!(device.render_target_count(), 0);
    }

    #[test]
    fn test_half_float_requires_caps() {
        let caps = DeviceCaps {
            hdr_render_targets: false,
            ..DeviceCaps::default()
        };
        let mut device = HeadlessDevice::with_caps(16, 16, caps);
        let result = device.create_texture(&TextureDescriptor::new("v", TextureFormat::Rg16F, 4, 4));
        assert!(matches!(result, Err(RenderError::ResourceCreationFailed(_))));
    }

    #[test]
    fn test_stale_target_is_rejected() {
        let mut device = HeadlessDevice::new(16, 16);
        let color = device
            .create_texture(&TextureDescriptor::new("c", TextureFormat::Rgba8, 4, 4))
            .unwrap();
        let target = device
            .create_render_target(&RenderTargetDescriptor::color("rt", color))
            .unwrap();
        device.destroy_render_target(target, false);

        let result = device.copy_color(Some(target), color);
        assert!(matches!(result, Err(RenderError::InvalidHandle(_))));
    }
}
