//! Mesh instances: a mesh placed at a node with a material

use std::rc::Rc;

use slotmap::new_key_type;

use super::mesh::Mesh;
use super::scene_graph::NodeId;
use crate::foundation::color::Color;

new_key_type! {
    /// Handle to a mesh instance in a [`SceneGraph`](super::SceneGraph)
    pub struct MeshInstanceId;
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// Draw both faces
    None,
    /// Cull back faces
    #[default]
    Back,
    /// Cull front faces
    Front,
}

/// Surface description used by the forward renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Debug name
    pub name: String,
    /// Base color (linear)
    pub color: Color,
    /// Whether the surface writes depth; only depth-writing surfaces are pre-passed
    pub depth_write: bool,
    /// Whether the surface is depth tested
    pub depth_test: bool,
    /// Alpha blended surfaces are drawn in the transparent sublayer
    pub transparent: bool,
    /// Face culling
    pub cull: CullMode,
}

impl Material {
    /// Opaque, depth-tested material of the given color
    pub fn opaque(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            depth_write: true,
            depth_test: true,
            transparent: false,
            cull: CullMode::Back,
        }
    }

    /// Blended overlay material that ignores the depth buffer
    pub fn overlay(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            depth_write: false,
            depth_test: false,
            transparent: color.a < 1.0,
            cull: CullMode::None,
        }
    }
}

/// A mesh drawn at a node
#[derive(Debug, Clone)]
pub struct MeshInstance {
    /// Node providing the world transform
    pub node: NodeId,
    /// Shared geometry
    pub mesh: Rc<Mesh>,
    /// Surface
    pub material: Material,
    /// Visibility toggle independent of the node's enabled state
    pub visible: bool,
}

impl MeshInstance {
    /// Create a visible mesh instance
    pub fn new(node: NodeId, mesh: Rc<Mesh>, material: Material) -> Self {
        Self {
            node,
            mesh,
            material,
            visible: true,
        }
    }
}
