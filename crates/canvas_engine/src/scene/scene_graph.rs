//! Scene graph: a hierarchy of named transform nodes
//!
//! Nodes live in a slotmap and are addressed by [`NodeId`]. Handles are weak:
//! tools such as gizmos keep `NodeId`s of the nodes they manipulate but never
//! own them, and a removed node simply makes its id stale. Every accessor
//! degrades gracefully on a stale id (identity/zero values, setters become
//! no-ops) so an interactive tool cannot bring down a session.
//!
//! World transforms are derived on demand by composing local TRS matrices up
//! the parent chain.

use slotmap::{new_key_type, SlotMap};

use super::mesh_instance::{MeshInstance, MeshInstanceId};
use crate::foundation::math::{mat4_scale, project_point, utils, Mat4, Quat, Transform, Vec3};

new_key_type! {
    /// Handle to a node in a [`SceneGraph`]
    pub struct NodeId;
}

/// A node in the scene hierarchy
#[derive(Debug, Clone)]
pub struct Node {
    /// Display name
    pub name: String,
    /// Local enabled flag; a node is active only if all ancestors are enabled too
    pub enabled: bool,
    /// Transform relative to the parent
    pub local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            local: Transform::identity(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Parent node, if any
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct children
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Owner of all nodes and mesh instances of a scene
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    mesh_instances: SlotMap<MeshInstanceId, MeshInstance>,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root-level node
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(name))
    }

    /// Create a node parented to `parent`
    pub fn create_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let id = self.create_node(name);
        self.add_child(parent, id);
        id
    }

    /// Reparent `child` under `parent`, keeping its local transform
    ///
    /// Refuses to create cycles.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        if self.is_descendant_of(parent, child) {
            log::warn!("refusing to parent {:?} under its own descendant {:?}", child, parent);
            return;
        }
        self.detach_from_parent(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    fn detach_from_parent(&mut self, child: NodeId) {
        let Some(old_parent) = self.nodes.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(old_parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
    }

    /// Whether `node` is `ancestor` or below it
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Remove a node, its whole subtree and every mesh instance attached to it
    pub fn remove_node(&mut self, id: NodeId) {
        if !self.nodes.contains_key(id) {
            return;
        }
        self.detach_from_parent(id);

        let mut stack = vec![id];
        let mut removed = Vec::new();
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
                removed.push(current);
            }
        }
        self.mesh_instances.retain(|_, mi| !removed.contains(&mi.node));
    }

    /// Whether the id refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node data
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable node data
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Set the local enabled flag
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.enabled = enabled;
        }
    }

    /// Whether the node and all of its ancestors are enabled
    pub fn is_enabled_in_hierarchy(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.nodes.get(node_id) {
                Some(node) if node.enabled => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    // --- local transform ---

    /// Local transform
    pub fn local_transform(&self, id: NodeId) -> Transform {
        self.nodes.get(id).map(|n| n.local).unwrap_or_default()
    }

    /// Local position
    pub fn local_position(&self, id: NodeId) -> Vec3 {
        self.local_transform(id).position
    }

    /// Set local position
    pub fn set_local_position(&mut self, id: NodeId, position: Vec3) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local.position = position;
        }
    }

    /// Local rotation
    pub fn local_rotation(&self, id: NodeId) -> Quat {
        self.local_transform(id).rotation
    }

    /// Set local rotation
    pub fn set_local_rotation(&mut self, id: NodeId, rotation: Quat) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local.rotation = rotation;
        }
    }

    /// Set local rotation from Euler angles in degrees
    pub fn set_local_euler_angles(&mut self, id: NodeId, x: f32, y: f32, z: f32) {
        self.set_local_rotation(id, utils::quat_from_euler_deg(x, y, z));
    }

    /// Local scale
    pub fn local_scale(&self, id: NodeId) -> Vec3 {
        self.local_transform(id).scale
    }

    /// Set local scale
    pub fn set_local_scale(&mut self, id: NodeId, scale: Vec3) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local.scale = scale;
        }
    }

    // --- world transform ---

    /// World transform matrix (parent chain composed with the local TRS)
    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::identity();
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.nodes.get(node_id) {
                Some(node) => {
                    matrix = node.local.to_matrix() * matrix;
                    current = node.parent;
                }
                None => break,
            }
        }
        matrix
    }

    /// Parent world transform, identity for root nodes
    pub fn parent_world_transform(&self, id: NodeId) -> Mat4 {
        self.parent(id)
            .map_or_else(Mat4::identity, |p| self.world_transform(p))
    }

    /// World position
    pub fn position(&self, id: NodeId) -> Vec3 {
        let m = self.world_transform(id);
        Vec3::new(m.m14, m.m24, m.m34)
    }

    /// Set world position
    pub fn set_position(&mut self, id: NodeId, position: Vec3) {
        let local = match self.parent_world_transform(id).try_inverse() {
            Some(inverse) => project_point(&inverse, &position),
            None => position,
        };
        self.set_local_position(id, local);
    }

    /// World rotation
    pub fn rotation(&self, id: NodeId) -> Quat {
        let mut rotation = Quat::identity();
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.nodes.get(node_id) {
                Some(node) => {
                    rotation = node.local.rotation * rotation;
                    current = node.parent;
                }
                None => break,
            }
        }
        rotation
    }

    /// Set world rotation
    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) {
        let parent_rotation = self
            .parent(id)
            .map_or_else(Quat::identity, |p| self.rotation(p));
        self.set_local_rotation(id, parent_rotation.inverse() * rotation);
    }

    /// World scale (per-axis lengths of the world basis)
    pub fn world_scale(&self, id: NodeId) -> Vec3 {
        mat4_scale(&self.world_transform(id))
    }

    /// World-space -Z axis
    pub fn forward(&self, id: NodeId) -> Vec3 {
        self.rotation(id) * Vec3::new(0.0, 0.0, -1.0)
    }

    /// World-space +X axis
    pub fn right(&self, id: NodeId) -> Vec3 {
        self.rotation(id) * Vec3::x()
    }

    /// World-space +Y axis
    pub fn up(&self, id: NodeId) -> Vec3 {
        self.rotation(id) * Vec3::y()
    }

    // --- mesh instances ---

    /// Register a mesh instance
    pub fn add_mesh_instance(&mut self, mesh_instance: MeshInstance) -> MeshInstanceId {
        self.mesh_instances.insert(mesh_instance)
    }

    /// Mesh instance data
    pub fn mesh_instance(&self, id: MeshInstanceId) -> Option<&MeshInstance> {
        self.mesh_instances.get(id)
    }

    /// Mutable mesh instance data
    pub fn mesh_instance_mut(&mut self, id: MeshInstanceId) -> Option<&mut MeshInstance> {
        self.mesh_instances.get_mut(id)
    }

    /// Remove a mesh instance
    pub fn remove_mesh_instance(&mut self, id: MeshInstanceId) -> Option<MeshInstance> {
        self.mesh_instances.remove(id)
    }

    /// Whether a mesh instance should be drawn: visible and its node active
    pub fn is_mesh_instance_active(&self, id: MeshInstanceId) -> bool {
        self.mesh_instances
            .get(id)
            .is_some_and(|mi| mi.visible && self.is_enabled_in_hierarchy(mi.node))
    }
}
