//! Final compose: bloom, grading, tone mapping, vignette and fringing
//!
//! Feature toggles mark the pass dirty. On the next frame update the effective
//! [`ComposeKey`] is recomputed and, only if it differs from the key of the
//! shader in use, a variant is looked up in (or compiled into) the cache.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::draw_fullscreen;
use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::render::device::{GraphicsDevice, ShaderHandle, TextureHandle, UniformValue};
use crate::render::frame_graph::{PassBase, RenderContext, RenderPass};
use crate::render::shaders;
use crate::render::{RenderError, RenderResult};

/// Tone-mapping operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToneMapping {
    /// Exposure scale only
    #[default]
    Linear,
    /// Hable filmic curve
    Filmic,
    /// Hejl-Burgess-Dawson curve
    Hejl,
    /// Narkowicz ACES fit
    Aces,
    /// Hill ACES fit with input/output matrices
    Aces2,
    /// Pass-through
    None,
}

impl ToneMapping {
    fn define(self) -> Option<&'static str> {
        match self {
            ToneMapping::Linear => Some("TONEMAP_LINEAR"),
            ToneMapping::Filmic => Some("TONEMAP_FILMIC"),
            ToneMapping::Hejl => Some("TONEMAP_HEJL"),
            ToneMapping::Aces => Some("TONEMAP_ACES"),
            ToneMapping::Aces2 => Some("TONEMAP_ACES2"),
            ToneMapping::None => None,
        }
    }
}

/// Effective configuration a compose shader variant is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComposeKey {
    /// Tone-mapping operator
    pub tone_mapping: ToneMapping,
    /// Bloom texture is added
    pub bloom: bool,
    /// Grading is applied
    pub grading: bool,
    /// Vignette is applied
    pub vignette: bool,
    /// Fringing is applied
    pub fringing: bool,
    /// Texture V is flipped
    pub flip_uv: bool,
}

impl ComposeKey {
    fn shader_name(&self) -> String {
        let mut name = format!("ComposeShader-{:?}", self.tone_mapping);
        for (flag, label) in [
            (self.bloom, "bloom"),
            (self.grading, "grading"),
            (self.vignette, "vignette"),
            (self.fringing, "fringing"),
            (self.flip_uv, "flip"),
        ] {
            if flag {
                name.push('-');
                name.push_str(label);
            }
        }
        name
    }
}

/// Scalar and vector parameters of the compose shader, laid out for a uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ComposeUniforms {
    /// Brightness, contrast, saturation; w unused
    pub brightness_contrast_saturation: [f32; 4],
    /// Inner, outer, curvature, intensity
    pub vignetter_params: [f32; 4],
    /// Bloom contribution
    pub bloom_intensity: f32,
    /// Chromatic fringing strength
    pub fringing_intensity: f32,
    /// Exposure multiplier
    pub exposure: f32,
    _pad: f32,
}

impl ComposeUniforms {
    /// Raw bytes for a uniform buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Composites the scene into the camera's output target
pub struct ComposePass {
    base: PassBase,
    /// Scene color to compose
    pub scene_texture: Option<TextureHandle>,
    /// Strength of the bloom contribution
    pub bloom_intensity: f32,
    /// Grading brightness multiplier
    pub grading_brightness: f32,
    /// Grading contrast
    pub grading_contrast: f32,
    /// Grading saturation
    pub grading_saturation: f32,
    /// Vignette inner radius
    pub vignette_inner: f32,
    /// Vignette outer radius
    pub vignette_outer: f32,
    /// Vignette falloff curvature
    pub vignette_curvature: f32,
    /// Vignette darkening
    pub vignette_intensity: f32,
    /// Fringing offset strength
    pub fringing_intensity: f32,
    bloom_texture: Option<TextureHandle>,
    grading_enabled: bool,
    vignette_enabled: bool,
    fringing_enabled: bool,
    tone_mapping: ToneMapping,
    dirty: bool,
    key: Option<ComposeKey>,
    shader: Option<ShaderHandle>,
    variants: HashMap<ComposeKey, ShaderHandle>,
    rebuild_count: usize,
}

impl Default for ComposePass {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposePass {
    /// Create the pass; the shader is built on the first frame update
    pub fn new() -> Self {
        Self {
            base: PassBase::new("ComposePass"),
            scene_texture: None,
            bloom_intensity: 0.01,
            grading_brightness: 1.0,
            grading_contrast: 1.0,
            grading_saturation: 1.0,
            vignette_inner: 0.5,
            vignette_outer: 1.0,
            vignette_curvature: 0.5,
            vignette_intensity: 0.3,
            fringing_intensity: 10.0,
            bloom_texture: None,
            grading_enabled: false,
            vignette_enabled: false,
            fringing_enabled: false,
            tone_mapping: ToneMapping::Linear,
            dirty: true,
            key: None,
            shader: None,
            variants: HashMap::new(),
            rebuild_count: 0,
        }
    }

    /// Bloom texture to add; `None` disables bloom
    pub fn set_bloom_texture(&mut self, texture: Option<TextureHandle>) {
        if self.bloom_texture != texture {
            self.bloom_texture = texture;
            self.dirty = true;
        }
    }

    /// Bloom texture in use
    pub fn bloom_texture(&self) -> Option<TextureHandle> {
        self.bloom_texture
    }

    /// Toggle color grading
    pub fn set_grading_enabled(&mut self, enabled: bool) {
        if self.grading_enabled != enabled {
            self.grading_enabled = enabled;
            self.dirty = true;
        }
    }

    /// Toggle vignetting
    pub fn set_vignette_enabled(&mut self, enabled: bool) {
        if self.vignette_enabled != enabled {
            self.vignette_enabled = enabled;
            self.dirty = true;
        }
    }

    /// Toggle chromatic fringing
    pub fn set_fringing_enabled(&mut self, enabled: bool) {
        if self.fringing_enabled != enabled {
            self.fringing_enabled = enabled;
            self.dirty = true;
        }
    }

    /// Select the tone-mapping operator
    pub fn set_tone_mapping(&mut self, tone_mapping: ToneMapping) {
        if self.tone_mapping != tone_mapping {
            self.tone_mapping = tone_mapping;
            self.dirty = true;
        }
    }

    /// Tone-mapping operator in use
    pub fn tone_mapping(&self) -> ToneMapping {
        self.tone_mapping
    }

    /// Number of times the active shader variant changed
    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count
    }

    /// Key of the active shader variant
    pub fn key(&self) -> Option<ComposeKey> {
        self.key
    }

    fn current_key(&self, flip_uv: bool) -> ComposeKey {
        ComposeKey {
            tone_mapping: self.tone_mapping,
            bloom: self.bloom_texture.is_some(),
            grading: self.grading_enabled,
            vignette: self.vignette_enabled,
            fringing: self.fringing_enabled,
            flip_uv,
        }
    }

    fn build_variant(device: &mut dyn GraphicsDevice, key: &ComposeKey) -> RenderResult<ShaderHandle> {
        let mut descriptor = shaders::quad_shader(&key.shader_name(), shaders::COMPOSE_FRAGMENT);
        if let Some(define) = key.tone_mapping.define() {
            descriptor = descriptor.define(define, "");
        }
        for (flag, define) in [
            (key.bloom, "BLOOM"),
            (key.grading, "GRADING"),
            (key.vignette, "VIGNETTE"),
            (key.fringing, "FRINGING"),
            (key.flip_uv, "WEBGPU"),
        ] {
            if flag {
                descriptor = descriptor.define(define, "");
            }
        }
        device.create_shader(&descriptor)
    }

    /// Current parameter values as a uniform block
    pub fn uniforms(&self) -> ComposeUniforms {
        ComposeUniforms {
            brightness_contrast_saturation: [
                self.grading_brightness,
                self.grading_contrast,
                self.grading_saturation,
                0.0,
            ],
            vignetter_params: [
                self.vignette_inner,
                self.vignette_outer,
                self.vignette_curvature,
                self.vignette_intensity,
            ],
            bloom_intensity: self.bloom_intensity,
            fringing_intensity: self.fringing_intensity,
            exposure: 1.0,
            _pad: 0.0,
        }
    }
}

impl RenderPass for ComposePass {
    fn base(&self) -> &PassBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PassBase {
        &mut self.base
    }

    fn frame_update(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        self.base.update_size(ctx.device)?;
        if !self.dirty {
            return Ok(());
        }
        self.dirty = false;

        let key = self.current_key(ctx.device.caps().flip_uv_y);
        if self.key == Some(key) {
            return Ok(());
        }
        let shader = match self.variants.get(&key) {
            Some(&shader) => shader,
            None => {
                let shader = Self::build_variant(ctx.device, &key)?;
                self.variants.insert(key, shader);
                shader
            }
        };
        log::debug!("compose shader variant: {}", key.shader_name());
        self.shader = Some(shader);
        self.key = Some(key);
        self.rebuild_count += 1;
        Ok(())
    }

    fn execute(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let shader = self
            .shader
            .ok_or_else(|| RenderError::InvalidConfiguration("compose pass executed before its frame update".into()))?;
        let Some(scene) = self.scene_texture else {
            log::warn!("{}: no scene texture", self.base.name);
            return Ok(());
        };

        let device = &mut *ctx.device;
        let (width, height) = device.texture_size(scene).unwrap_or((1, 1));
        device.set_uniform("sceneTexture", UniformValue::Texture(scene));
        device.set_uniform("sceneTextureInvRes", Vec2::new(1.0 / width as f32, 1.0 / height as f32).into());
        let params = self.uniforms();
        device.set_uniform("exposure", params.exposure.into());

        if let Some(bloom) = self.bloom_texture {
            device.set_uniform("bloomTexture", UniformValue::Texture(bloom));
            device.set_uniform("bloomIntensity", params.bloom_intensity.into());
        }
        if self.grading_enabled {
            let [b, c, s, _] = params.brightness_contrast_saturation;
            device.set_uniform("brightnessContrastSaturation", Vec3::new(b, c, s).into());
        }
        if self.vignette_enabled {
            device.set_uniform("vignetterParams", Vec4::from(params.vignetter_params).into());
        }
        if self.fringing_enabled {
            device.set_uniform("fringingIntensity", params.fringing_intensity.into());
        }

        draw_fullscreen(&self.base, device, shader)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        for (_, shader) in self.variants.drain() {
            device.destroy_shader(shader);
        }
        self.shader = None;
        self.key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Camera, HeadlessDevice};
    use crate::scene::{LayerComposition, SceneGraph};

    fn frame_update(compose: &mut ComposePass, device: &mut HeadlessDevice) {
        let graph = SceneGraph::new();
        let layers = LayerComposition::new();
        let camera = Camera::default();
        let mut ctx = RenderContext::new(device, &graph, &layers, &camera);
        compose.frame_update(&mut ctx).unwrap();
    }

    #[test]
    fn test_uniform_block_layout() {
        let mut compose = ComposePass::new();
        compose.vignette_outer = 0.75;
        let params = compose.uniforms();
        assert_eq!(params.as_bytes().len(), 48);
        assert_eq!(params.vignetter_params[1], 0.75);
        assert_eq!(params.exposure, 1.0);
    }

    #[test]
    fn test_rebuild_only_on_key_change() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut compose = ComposePass::new();

        frame_update(&mut compose, &mut device);
        assert_eq!(compose.rebuild_count(), 1);

        frame_update(&mut compose, &mut device);
        assert_eq!(compose.rebuild_count(), 1);

        compose.set_vignette_enabled(true);
        compose.set_vignette_enabled(false);
        frame_update(&mut compose, &mut device);
        assert_eq!(compose.rebuild_count(), 1);

        compose.set_tone_mapping(ToneMapping::Aces);
        frame_update(&mut compose, &mut device);
        assert_eq!(compose.rebuild_count(), 2);
        assert_eq!(device.shaders_compiled(), 2);
    }

    #[test]
    fn test_cached_variant_is_reused() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut compose = ComposePass::new();
        frame_update(&mut compose, &mut device);

        compose.set_grading_enabled(true);
        frame_update(&mut compose, &mut device);
        compose.set_grading_enabled(false);
        frame_update(&mut compose, &mut device);

        assert_eq!(compose.rebuild_count(), 3);
        assert_eq!(device.shaders_compiled(), 2);
    }

    #[test]
    fn test_variant_defines() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut compose = ComposePass::new();
        compose.set_tone_mapping(ToneMapping::Filmic);
        compose.set_fringing_enabled(true);
        frame_update(&mut compose, &mut device);

        let descriptor = device.shader(compose.shader.unwrap()).unwrap();
        assert!(descriptor.has_define("TONEMAP_FILMIC"));
        assert!(descriptor.has_define("FRINGING"));
        assert!(!descriptor.has_define("BLOOM"));
    }
}
