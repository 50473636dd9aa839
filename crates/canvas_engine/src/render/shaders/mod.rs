//! Built-in GLSL sources for the fullscreen post-processing passes

use super::device::ShaderDescriptor;

/// Fullscreen quad vertex stage; outputs `uv0`
pub const QUAD_VERTEX: &str = include_str!("quad.vert");

/// 13-tap bloom downsample
pub const DOWNSAMPLE_FRAGMENT: &str = include_str!("downsample.frag");

/// 3x3 tent bloom upsample
pub const UPSAMPLE_FRAGMENT: &str = include_str!("upsample.frag");

/// Temporal anti-aliasing resolve
pub const TAA_FRAGMENT: &str = include_str!("taa.frag");

/// Final compose with tone mapping
pub const COMPOSE_FRAGMENT: &str = include_str!("compose.frag");

/// Descriptor for a fullscreen pass running `fragment`
pub fn quad_shader(name: &str, fragment: &str) -> ShaderDescriptor {
    ShaderDescriptor::new(name, QUAD_VERTEX, fragment)
}
