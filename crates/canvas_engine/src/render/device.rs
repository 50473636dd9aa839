//! Graphics device abstraction
//!
//! The render passes talk to the GPU exclusively through [`GraphicsDevice`].
//! Resources are referred to by slotmap handles; a handle outliving its
//! resource is reported as [`RenderError::InvalidHandle`] rather than
//! touching freed memory.

use slotmap::new_key_type;

use super::camera::Camera;
use super::RenderResult;
use crate::foundation::color::Color;
use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::scene::{MeshInstanceId, SceneGraph};

new_key_type! {
    /// Handle to a texture owned by a [`GraphicsDevice`]
    pub struct TextureHandle;
    /// Handle to a render target owned by a [`GraphicsDevice`]
    pub struct RenderTargetHandle;
    /// Handle to a compiled shader owned by a [`GraphicsDevice`]
    pub struct ShaderHandle;
}

/// Texel formats used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit normalized RGBA
    Rgba8,
    /// Half-float RGBA
    Rgba16F,
    /// Float RGBA
    Rgba32F,
    /// Half-float RG, used for screen-space velocity
    Rg16F,
    /// 24-bit depth with 8-bit stencil
    Depth24Stencil8,
    /// Float depth
    Depth32F,
}

impl TextureFormat {
    /// Whether this is a depth format
    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth24Stencil8 | TextureFormat::Depth32F)
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Point sampling
    Nearest,
    /// Bilinear sampling
    #[default]
    Linear,
}

/// Texture creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// Debug name
    pub name: String,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Texel format
    pub format: TextureFormat,
    /// Whether a mip chain is allocated
    pub mipmaps: bool,
    /// Minification and magnification filter
    pub filter: FilterMode,
}

impl TextureDescriptor {
    /// Clamped, linearly filtered texture without mipmaps
    pub fn new(name: impl Into<String>, format: TextureFormat, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width: width.max(1),
            height: height.max(1),
            format,
            mipmaps: false,
            filter: FilterMode::Linear,
        }
    }

    /// Same descriptor with point sampling
    pub fn nearest(mut self) -> Self {
        self.filter = FilterMode::Nearest;
        self
    }
}

/// Render target creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDescriptor {
    /// Debug name
    pub name: String,
    /// Color attachment
    pub color: Option<TextureHandle>,
    /// Depth attachment texture; ignored when `depth_buffer` is false
    pub depth: Option<TextureHandle>,
    /// Whether the target has a depth buffer; allocated internally when `depth` is `None`
    pub depth_buffer: bool,
    /// MSAA sample count
    pub samples: u32,
}

impl RenderTargetDescriptor {
    /// Color-only target
    pub fn color(name: impl Into<String>, color: TextureHandle) -> Self {
        Self {
            name: name.into(),
            color: Some(color),
            depth: None,
            depth_buffer: false,
            samples: 1,
        }
    }
}

/// Shader source plus compile-time defines
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderDescriptor {
    /// Name, unique per variant
    pub name: String,
    /// Vertex stage source
    pub vertex: String,
    /// Fragment stage source
    pub fragment: String,
    /// Preprocessor defines as (name, value) pairs
    pub defines: Vec<(String, String)>,
}

impl ShaderDescriptor {
    /// Shader without defines
    pub fn new(name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
            defines: Vec::new(),
        }
    }

    /// Add a define
    pub fn define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((name.into(), value.into()));
        self
    }

    /// Whether a define is present
    pub fn has_define(&self, name: &str) -> bool {
        self.defines.iter().any(|(n, _)| n == name)
    }
}

/// Value bound to a named shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Scalar
    Float(f32),
    /// 2-component vector
    Vec2([f32; 2]),
    /// 3-component vector
    Vec3([f32; 3]),
    /// 4-component vector
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix
    Mat4([f32; 16]),
    /// Sampled texture
    Texture(TextureHandle),
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2([v.x, v.y])
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3([v.x, v.y, v.z])
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4([v.x, v.y, v.z, v.w])
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<&Mat4> for UniformValue {
    fn from(m: &Mat4) -> Self {
        let mut data = [0.0; 16];
        data.copy_from_slice(m.as_slice());
        UniformValue::Mat4(data)
    }
}

impl From<TextureHandle> for UniformValue {
    fn from(t: TextureHandle) -> Self {
        UniformValue::Texture(t)
    }
}

/// Output blending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendState {
    /// Overwrite the destination
    #[default]
    Opaque,
    /// `dst + src`
    Additive,
    /// `src * a + dst * (1 - a)`
    Alpha,
}

/// Shader pass selected for forward rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderPass {
    /// Regular lit/unlit shading
    Forward,
    /// Depth plus screen-space velocity
    PrepassVelocity,
}

/// Capabilities reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCaps {
    /// Half-float color targets are renderable
    pub hdr_render_targets: bool,
    /// Texture V runs opposite to framebuffer Y (WebGPU-style)
    pub flip_uv_y: bool,
    /// Highest supported MSAA sample count
    pub max_samples: u32,
}

impl Default for DeviceCaps {
    fn default() -> Self {
        Self {
            hdr_render_targets: true,
            flip_uv_y: false,
            max_samples: 4,
        }
    }
}

/// Fullscreen-quad draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadDraw {
    /// Destination; `None` is the backbuffer
    pub target: Option<RenderTargetHandle>,
    /// Shader to run
    pub shader: ShaderHandle,
    /// Output blending
    pub blend: BlendState,
    /// Clear color applied before drawing
    pub clear_color: Option<Color>,
}

/// Forward rendering of a list of mesh instances
#[derive(Debug, Clone, Copy)]
pub struct ForwardDraw<'a> {
    /// Destination; `None` is the backbuffer
    pub target: Option<RenderTargetHandle>,
    /// Viewpoint
    pub camera: &'a Camera,
    /// Scene providing transforms, meshes and materials
    pub graph: &'a SceneGraph,
    /// Instances in submission order
    pub instances: &'a [MeshInstanceId],
    /// Shader pass used for every instance
    pub shader_pass: ShaderPass,
    /// Clear color applied before drawing
    pub clear_color: Option<Color>,
    /// Clear depth applied before drawing
    pub clear_depth: Option<f32>,
}

/// GPU device interface
///
/// Object safe so passes can hold `&mut dyn GraphicsDevice`.
pub trait GraphicsDevice {
    /// Device capabilities
    fn caps(&self) -> DeviceCaps;

    /// Size of the default framebuffer
    fn backbuffer_size(&self) -> (u32, u32);

    /// Resize the default framebuffer
    fn resize_backbuffer(&mut self, width: u32, height: u32);

    /// Allocate a texture
    fn create_texture(&mut self, desc: &TextureDescriptor) -> RenderResult<TextureHandle>;

    /// Free a texture; unknown handles are ignored
    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Texture size in texels
    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)>;

    /// Texture format
    fn texture_format(&self, texture: TextureHandle) -> Option<TextureFormat>;

    /// Create a render target over existing textures
    fn create_render_target(&mut self, desc: &RenderTargetDescriptor) -> RenderResult<RenderTargetHandle>;

    /// Free a render target, optionally freeing its attachments too
    fn destroy_render_target(&mut self, target: RenderTargetHandle, destroy_textures: bool);

    /// Resize a render target and every attachment
    fn resize_render_target(&mut self, target: RenderTargetHandle, width: u32, height: u32) -> RenderResult<()>;

    /// Render target size; `None` resolves to the backbuffer
    fn render_target_size(&self, target: Option<RenderTargetHandle>) -> Option<(u32, u32)>;

    /// Color attachment
    fn render_target_color(&self, target: RenderTargetHandle) -> Option<TextureHandle>;

    /// Depth attachment, if it is a sampleable texture
    fn render_target_depth(&self, target: RenderTargetHandle) -> Option<TextureHandle>;

    /// Compile a shader
    fn create_shader(&mut self, desc: &ShaderDescriptor) -> RenderResult<ShaderHandle>;

    /// Free a shader; unknown handles are ignored
    fn destroy_shader(&mut self, shader: ShaderHandle);

    /// Bind a named uniform for subsequent draws
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    /// Draw a fullscreen quad
    fn draw_quad(&mut self, draw: &QuadDraw) -> RenderResult<()>;

    /// Render mesh instances with the forward renderer
    fn render_forward(&mut self, draw: &ForwardDraw<'_>) -> RenderResult<()>;

    /// Copy the color of a render target (`None` is the backbuffer) into a texture
    fn copy_color(&mut self, source: Option<RenderTargetHandle>, destination: TextureHandle) -> RenderResult<()>;
}
