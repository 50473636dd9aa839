//! Per-camera render pipeline
//!
//! [`CameraFrame`] builds the pass graph for one camera once, in a fixed order:
//!
//! 1. prepass (depth + velocity), optional
//! 2. opaque scene pass into an offscreen HDR target
//! 3. color grab, optional
//! 4. transparent scene pass, when the scene was split by the grab
//! 5. TAA resolve, optional
//! 6. bloom
//! 7. compose into the camera's output target
//! 8. after pass for the remaining layers (UI), onto the output target
//!
//! Quality settings (render scale, bloom, tone mapping...) are pushed into the
//! built passes and take effect on the next frame without a rebuild.

use serde::{Deserialize, Serialize};

use super::{BloomPass, ColorGrabPass, ComposePass, ForwardPass, PrePass, TaaPass};
use crate::config::PostEffectsSettings;
use crate::render::camera::Camera;
use crate::render::device::{
    GraphicsDevice, RenderTargetDescriptor, RenderTargetHandle, TextureDescriptor, TextureFormat, TextureHandle,
};
use crate::render::frame_graph::{FrameGraph, RenderContext, RenderPass, ResizeSource};
use crate::render::RenderResult;
use crate::scene::{LayerComposition, LayerId, SceneGraph, LAYERID_IMMEDIATE, LAYERID_SKYBOX};

/// Construction-time configuration of a [`CameraFrame`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraFrameOptions {
    /// MSAA sample count of the scene target
    pub samples: u32,
    /// Whether a copy of the opaque scene color is made for later layers
    pub scene_color_map: bool,
    /// Last layer rendered before the color grab
    pub last_grab_layer_id: LayerId,
    /// Transparency of the last grabbed sublayer
    pub last_grab_layer_is_transparent: bool,
    /// Last layer rendered into the scene target; later layers go to the after pass
    pub last_scene_layer_id: LayerId,
    /// Transparency of the last scene sublayer
    pub last_scene_layer_is_transparent: bool,
    /// Temporal anti-aliasing
    pub taa_enabled: bool,
    /// Depth/velocity prepass; forced on by TAA
    pub prepass_enabled: bool,
}

impl Default for CameraFrameOptions {
    fn default() -> Self {
        Self {
            samples: 1,
            scene_color_map: false,
            last_grab_layer_id: LAYERID_SKYBOX,
            last_grab_layer_is_transparent: false,
            last_scene_layer_id: LAYERID_IMMEDIATE,
            last_scene_layer_is_transparent: true,
            taa_enabled: false,
            prepass_enabled: false,
        }
    }
}

impl CameraFrameOptions {
    /// Resolve conflicting or unsupported settings
    pub fn sanitize(mut self, device: &dyn GraphicsDevice) -> Self {
        let max_samples = device.caps().max_samples.max(1);
        if self.samples > max_samples {
            log::warn!("{} samples requested, clamping to {}", self.samples, max_samples);
        }
        self.samples = self.samples.clamp(1, max_samples);
        if self.taa_enabled && !self.prepass_enabled {
            log::debug!("TAA needs scene depth, enabling the prepass");
            self.prepass_enabled = true;
        }
        self
    }
}

/// The full pass graph of one camera
pub struct CameraFrame {
    options: CameraFrameOptions,
    output: Option<RenderTargetHandle>,
    render_target_scale: f32,
    scene_texture: TextureHandle,
    scene_depth: TextureHandle,
    scene_target: RenderTargetHandle,
    prepass: Option<PrePass>,
    scene_pass_opaque: ForwardPass,
    color_grab: Option<ColorGrabPass>,
    scene_pass_transparent: Option<ForwardPass>,
    taa: Option<TaaPass>,
    bloom: BloomPass,
    compose: ComposePass,
    after_pass: Option<ForwardPass>,
    frame_graph: FrameGraph,
}

impl CameraFrame {
    /// Build the pipeline for `camera` rendering into `output` (`None` is the backbuffer)
    pub fn new(
        device: &mut dyn GraphicsDevice,
        composition: &LayerComposition,
        camera: &Camera,
        output: Option<RenderTargetHandle>,
        options: CameraFrameOptions,
    ) -> RenderResult<Self> {
        let options = options.sanitize(device);
        let format = if device.caps().hdr_render_targets {
            TextureFormat::Rgba16F
        } else {
            TextureFormat::Rgba8
        };
        let resize = ResizeSource::new(output);

        // scene target shared by the scene passes; its depth is shared with the prepass
        let scene_texture = device.create_texture(&TextureDescriptor::new("SceneColor", format, 1, 1))?;
        let scene_depth = device.create_texture(&TextureDescriptor::new("SceneDepth", TextureFormat::Depth32F, 1, 1).nearest())?;
        let scene_target = device.create_render_target(&RenderTargetDescriptor {
            name: "SceneTarget".into(),
            color: Some(scene_texture),
            depth: Some(scene_depth),
            depth_buffer: true,
            samples: options.samples,
        })?;

        let prepass = if options.prepass_enabled {
            let mut prepass = PrePass::new(device, scene_depth)?;
            prepass.base_mut().resize_source = Some(resize);
            Some(prepass)
        } else {
            None
        };

        let mut scene_pass_opaque = ForwardPass::new("SceneOpaquePass");
        scene_pass_opaque.base_mut().init(Some(scene_target), Some(resize));

        let mut color_grab = None;
        let mut scene_pass_transparent = None;
        let last_scene_layer = Some((options.last_scene_layer_id, options.last_scene_layer_is_transparent));
        let last_index = if options.scene_color_map {
            let last_grab_layer = Some((options.last_grab_layer_id, options.last_grab_layer_is_transparent));
            let index = scene_pass_opaque.add_layers(composition, camera, 0, true, last_grab_layer);
            color_grab = Some(ColorGrabPass::new(device, Some(scene_target), format)?);

            let mut transparent = ForwardPass::new("SceneTransparentPass");
            transparent.base_mut().init(Some(scene_target), None);
            let index = transparent.add_layers(composition, camera, index, false, last_scene_layer);
            scene_pass_transparent = Some(transparent);
            index
        } else {
            scene_pass_opaque.add_layers(composition, camera, 0, true, last_scene_layer)
        };

        let taa = if options.taa_enabled {
            Some(TaaPass::new(device, scene_texture, format)?)
        } else {
            None
        };

        let bloom = BloomPass::new(device, Some(scene_texture), format)?;

        let mut compose = ComposePass::new();
        compose.base_mut().init(output, None);
        compose.scene_texture = Some(scene_texture);
        compose.set_bloom_texture(Some(bloom.bloom_texture()));

        let mut after = ForwardPass::new("AfterPass");
        after.base_mut().init(output, None);
        after.add_layers(composition, camera, last_index, false, None);
        let after_pass = after.renders_anything().then_some(after);

        log::info!(
            "camera frame built: prepass={} grab={} taa={} after={}",
            prepass.is_some(),
            color_grab.is_some(),
            taa.is_some(),
            after_pass.is_some()
        );

        Ok(Self {
            options,
            output,
            render_target_scale: 1.0,
            scene_texture,
            scene_depth,
            scene_target,
            prepass,
            scene_pass_opaque,
            color_grab,
            scene_pass_transparent,
            taa,
            bloom,
            compose,
            after_pass,
            frame_graph: FrameGraph::new(),
        })
    }

    /// Sanitized options the frame was built with
    pub fn options(&self) -> &CameraFrameOptions {
        &self.options
    }

    /// Raw scene color texture
    pub fn scene_texture(&self) -> TextureHandle {
        self.scene_texture
    }

    /// Scene depth texture
    pub fn scene_depth(&self) -> TextureHandle {
        self.scene_depth
    }

    /// Output target (`None` is the backbuffer)
    pub fn output(&self) -> Option<RenderTargetHandle> {
        self.output
    }

    /// Bloom pass
    pub fn bloom(&self) -> &BloomPass {
        &self.bloom
    }

    /// Compose pass
    pub fn compose(&self) -> &ComposePass {
        &self.compose
    }

    /// Mutable compose pass, for effect parameters
    pub fn compose_mut(&mut self) -> &mut ComposePass {
        &mut self.compose
    }

    /// TAA pass, if built
    pub fn taa(&self) -> Option<&TaaPass> {
        self.taa.as_ref()
    }

    /// Names of the passes rendered by the last frame, in order
    pub fn executed_passes(&self) -> &[String] {
        self.frame_graph.executed()
    }

    /// Scene resolution relative to the output
    pub fn render_target_scale(&self) -> f32 {
        self.render_target_scale
    }

    /// Change the scene resolution relative to the output
    pub fn set_render_target_scale(&mut self, scale: f32) {
        let scale = scale.max(0.01);
        self.render_target_scale = scale;
        let resize = ResizeSource::scaled(self.output, scale);
        self.scene_pass_opaque.base_mut().resize_source = Some(resize);
        if let Some(prepass) = self.prepass.as_mut() {
            prepass.base_mut().resize_source = Some(resize);
        }
    }

    /// Whether bloom runs
    pub fn bloom_enabled(&self) -> bool {
        self.bloom.enabled()
    }

    /// Toggle bloom
    pub fn set_bloom_enabled(&mut self, device: &mut dyn GraphicsDevice, enabled: bool) {
        self.bloom.set_enabled(device, enabled);
        let bloom_texture = self.bloom.bloom_texture();
        self.compose.set_bloom_texture(enabled.then_some(bloom_texture));
    }

    /// Smallest bloom level, as a power of two in texels
    pub fn set_last_mip_level(&mut self, level: u32) {
        self.bloom.last_mip_level = level;
    }

    /// Toggle TAA at runtime; ignored if the frame was built without TAA
    pub fn set_taa_enabled(&mut self, device: &mut dyn GraphicsDevice, enabled: bool) {
        match self.taa.as_mut() {
            Some(taa) => taa.set_enabled(device, enabled),
            None if enabled => log::warn!("camera frame was built without TAA"),
            None => {}
        }
    }

    /// Apply a full settings block
    pub fn apply_settings(&mut self, device: &mut dyn GraphicsDevice, settings: &PostEffectsSettings) {
        self.set_render_target_scale(settings.render_target_scale);
        self.set_bloom_enabled(device, settings.bloom.enabled);
        self.set_last_mip_level(settings.bloom.last_mip_level);
        self.set_taa_enabled(device, settings.taa_enabled);

        let compose = &mut self.compose;
        compose.set_tone_mapping(settings.tone_mapping);
        compose.bloom_intensity = settings.bloom.intensity;

        compose.set_grading_enabled(settings.grading.enabled);
        compose.grading_brightness = settings.grading.brightness;
        compose.grading_contrast = settings.grading.contrast;
        compose.grading_saturation = settings.grading.saturation;

        compose.set_vignette_enabled(settings.vignette.enabled);
        compose.vignette_inner = settings.vignette.inner;
        compose.vignette_outer = settings.vignette.outer;
        compose.vignette_curvature = settings.vignette.curvature;
        compose.vignette_intensity = settings.vignette.intensity;

        compose.set_fringing_enabled(settings.fringing.enabled);
        compose.fringing_intensity = settings.fringing.intensity;
    }

    /// Render one frame
    ///
    /// `camera` should have had [`Camera::update_view_projection`] called for
    /// this frame.
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        graph: &SceneGraph,
        layers: &LayerComposition,
        camera: &Camera,
    ) -> RenderResult<()> {
        // route the TAA-resolved image (or the raw scene) into the post chain
        let scene_texture = match self.taa.as_mut() {
            Some(taa) if taa.enabled() => taa.update(),
            _ => self.scene_texture,
        };
        self.compose.scene_texture = Some(scene_texture);
        if self.bloom.enabled() {
            self.bloom.source_texture = Some(scene_texture);
        }

        // with a prepass the depth buffer already holds this frame's depth
        let opaque = self.scene_pass_opaque.base_mut();
        opaque.clear_color = camera.clear_color_buffer.then_some(camera.clear_color);
        opaque.clear_depth = if self.prepass.is_some() {
            None
        } else {
            camera.clear_depth_buffer.then_some(1.0)
        };

        let mut passes: Vec<&mut dyn RenderPass> = Vec::with_capacity(8);
        if let Some(prepass) = self.prepass.as_mut() {
            passes.push(prepass);
        }
        passes.push(&mut self.scene_pass_opaque);
        if let Some(grab) = self.color_grab.as_mut() {
            passes.push(grab);
        }
        if let Some(transparent) = self.scene_pass_transparent.as_mut() {
            passes.push(transparent);
        }
        if let Some(taa) = self.taa.as_mut() {
            passes.push(taa);
        }
        passes.push(&mut self.bloom);
        passes.push(&mut self.compose);
        if let Some(after) = self.after_pass.as_mut() {
            passes.push(after);
        }

        let mut ctx = RenderContext::new(device, graph, layers, camera);
        self.frame_graph.execute(&mut passes, &mut ctx)
    }

    /// Release every GPU resource of the pipeline
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(prepass) = self.prepass.as_mut() {
            prepass.destroy(device);
        }
        self.scene_pass_opaque.destroy(device);
        if let Some(grab) = self.color_grab.as_mut() {
            grab.destroy(device);
        }
        if let Some(transparent) = self.scene_pass_transparent.as_mut() {
            transparent.destroy(device);
        }
        if let Some(taa) = self.taa.as_mut() {
            taa.destroy(device);
        }
        self.bloom.destroy(device);
        self.compose.destroy(device);
        if let Some(after) = self.after_pass.as_mut() {
            after.destroy(device);
        }
        device.destroy_render_target(self.scene_target, true);
        log::debug!("camera frame destroyed");
    }
}
