//! Applying a drag delta to one node
//!
//! Translate, rotate and scale share the same policy: the node's transform is
//! captured when the drag starts and every move applies the total delta to
//! that snapshot, either in the node's own frame (local) or around the
//! gizmo pivot (world).

use super::CoordSpace;
use crate::foundation::math::{utils, Quat, Vec3};
use crate::scene::{NodeId, SceneGraph};

/// Transform of a node at drag start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSnapshot {
    /// The node
    pub node: NodeId,
    /// Local position
    pub local_position: Vec3,
    /// World position
    pub position: Vec3,
    /// Local rotation
    pub local_rotation: Quat,
    /// World rotation
    pub rotation: Quat,
    /// Local scale
    pub local_scale: Vec3,
    /// World offset from the gizmo pivot
    pub offset: Vec3,
}

impl NodeSnapshot {
    /// Capture a node, `None` if the id is stale
    pub fn capture(graph: &SceneGraph, node: NodeId, pivot: Vec3) -> Option<Self> {
        if !graph.contains(node) {
            return None;
        }
        let position = graph.position(node);
        Some(Self {
            node,
            local_position: graph.local_position(node),
            position,
            local_rotation: graph.local_rotation(node),
            rotation: graph.rotation(node),
            local_scale: graph.local_scale(node),
            offset: position - pivot,
        })
    }

    /// Capture every live node
    pub fn capture_all(graph: &SceneGraph, nodes: &[NodeId], pivot: Vec3) -> Vec<Self> {
        nodes
            .iter()
            .filter_map(|&node| Self::capture(graph, node, pivot))
            .collect()
    }
}

/// Total change since the drag started
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeDelta {
    /// Offset, in the gizmo frame
    Translate(Vec3),
    /// Rotation of `degrees` around `axis`
    Rotate {
        /// Rotation axis; node-local in local space, world otherwise
        axis: Vec3,
        /// Angle in degrees
        degrees: f32,
    },
    /// Per-axis scale multiplier
    Scale(Vec3),
}

/// Set a node's transform to its snapshot plus `delta`
///
/// Local translation is expressed in the node's own axes and compensates for
/// the parent's scale. World rotation turns the node around `pivot`. Scale is
/// always applied to the local scale.
pub fn apply_delta(
    graph: &mut SceneGraph,
    snapshot: &NodeSnapshot,
    delta: &NodeDelta,
    coord_space: CoordSpace,
    pivot: Vec3,
) {
    let node = snapshot.node;
    match (*delta, coord_space) {
        (NodeDelta::Translate(offset), CoordSpace::Local) => {
            let parent_scale = graph
                .parent(node)
                .map_or_else(|| Vec3::repeat(1.0), |p| graph.world_scale(p))
                .map(|s| if s.abs() > f32::EPSILON { s } else { 1.0 });
            let offset = (snapshot.local_rotation * offset).component_div(&parent_scale);
            graph.set_local_position(node, snapshot.local_position + offset);
        }
        (NodeDelta::Translate(offset), CoordSpace::World) => {
            graph.set_position(node, snapshot.position + offset);
        }
        (NodeDelta::Rotate { axis, degrees }, CoordSpace::Local) => {
            let rotation = utils::quat_from_axis_angle_deg(&axis, degrees);
            graph.set_local_rotation(node, snapshot.local_rotation * rotation);
        }
        (NodeDelta::Rotate { axis, degrees }, CoordSpace::World) => {
            let rotation = utils::quat_from_axis_angle_deg(&axis, degrees);
            graph.set_rotation(node, rotation * snapshot.rotation);
            graph.set_position(node, pivot + rotation * snapshot.offset);
        }
        (NodeDelta::Scale(factor), _) => {
            graph.set_local_scale(node, snapshot.local_scale.component_mul(&factor));
        }
    }
}
