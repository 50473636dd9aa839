//! Scene data model
//!
//! The pieces of the scene the render passes and gizmos consume: the node
//! hierarchy, procedural meshes, mesh instances with materials, and the
//! layer composition that defines render order.

pub mod scene_graph;
pub mod mesh;
pub mod mesh_instance;
pub mod layer;

pub use layer::{
    Layer, LayerComposition, LayerId, SubLayer, LAYERID_DEPTH, LAYERID_IMMEDIATE, LAYERID_SKYBOX,
    LAYERID_UI, LAYERID_WORLD,
};
pub use mesh::{Mesh, PrimitiveTopology, Vertex};
pub use mesh_instance::{CullMode, Material, MeshInstance, MeshInstanceId};
pub use scene_graph::{Node, NodeId, SceneGraph};
