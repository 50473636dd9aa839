//! Render passes making up the camera frame

pub mod bloom;
pub mod camera_frame;
pub mod color_grab;
pub mod compose;
pub mod downsample;
pub mod forward;
pub mod prepass;
pub mod taa;
pub mod upsample;

pub use bloom::BloomPass;
pub use camera_frame::{CameraFrame, CameraFrameOptions};
pub use color_grab::ColorGrabPass;
pub use compose::{ComposePass, ToneMapping};
pub use downsample::DownsamplePass;
pub use forward::ForwardPass;
pub use prepass::PrePass;
pub use taa::TaaPass;
pub use upsample::UpsamplePass;

use super::device::{GraphicsDevice, QuadDraw, ShaderHandle, TextureHandle, UniformValue};
use super::frame_graph::PassBase;
use super::{RenderError, RenderResult};
use crate::foundation::math::Vec2;

/// Draw a fullscreen quad into the pass's target with its clear and blend state
pub(crate) fn draw_fullscreen(base: &PassBase, device: &mut dyn GraphicsDevice, shader: ShaderHandle) -> RenderResult<()> {
    device.draw_quad(&QuadDraw {
        target: base.render_target,
        shader,
        blend: base.blend,
        clear_color: base.clear_color,
    })
}

/// Bind `texture` as `sourceTexture` along with its inverse resolution
pub(crate) fn bind_source(device: &mut dyn GraphicsDevice, texture: TextureHandle) -> RenderResult<()> {
    let (width, height) = device
        .texture_size(texture)
        .ok_or_else(|| RenderError::InvalidHandle(format!("source texture {:?}", texture)))?;
    device.set_uniform("sourceTexture", UniformValue::Texture(texture));
    device.set_uniform(
        "sourceInvResolution",
        Vec2::new(1.0 / width as f32, 1.0 / height as f32).into(),
    );
    Ok(())
}
