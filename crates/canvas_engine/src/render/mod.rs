//! # Rendering System
//!
//! Backend-agnostic camera render pipeline built from ordered render passes.
//!
//! ## Architecture
//!
//! - **Camera**: perspective/orthographic camera with screen-space helpers
//! - **Device**: [`GraphicsDevice`] trait over the GPU, with a recording
//!   [`HeadlessDevice`] implementation used by tests and tools
//! - **Frame graph**: the [`RenderPass`] contract and its executor
//! - **Passes**: scene prepass, forward scene rendering, color grab, temporal
//!   anti-aliasing, bloom and the final compose pass, all assembled by
//!   [`CameraFrame`]
//!
//! Passes never share state through global uniform slots: everything one pass
//! publishes for later passes (scene depth, velocity, grabbed color) travels
//! through [`FrameResources`] on the [`RenderContext`].

pub mod camera;
pub mod device;
pub mod frame_graph;
pub mod headless;
pub mod passes;
pub mod shaders;

pub use camera::{Camera, Projection};
pub use device::{
    BlendState, DeviceCaps, ForwardDraw, GraphicsDevice, QuadDraw, RenderTargetDescriptor,
    RenderTargetHandle, ShaderDescriptor, ShaderHandle, ShaderPass, TextureDescriptor, TextureFormat,
    TextureHandle, UniformValue,
};
pub use frame_graph::{FrameGraph, FrameResources, PassBase, RenderContext, RenderPass, ResizeSource, SizeSource};
pub use headless::{DeviceCommand, HeadlessDevice};
pub use passes::camera_frame::{CameraFrame, CameraFrameOptions};

use thiserror::Error;

/// Rendering system errors
///
/// Backend failures are logged where they happen; callers receive these
/// backend-neutral variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// GPU resource (texture, render target, shader) could not be created
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A handle did not refer to a live resource
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Pass or pipeline configuration cannot be honored
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests;
