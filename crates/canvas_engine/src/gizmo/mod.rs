//! Transform gizmos
//!
//! Interactive translate/rotate/scale handles drawn over the scene. A gizmo is
//! a small node subtree of procedural [`AxisShape`]s; picking casts a ray
//! against each shape's collision triangles ([`MeshTriData`]), and dragging a
//! handle projects the pointer onto a plane or axis to derive a point/angle
//! delta that is applied to every attached node.
//!
//! Layout:
//! - [`Tri`] and [`MeshTriData`]: ray picking primitives
//! - [`shape`]: the handle shapes
//! - [`Gizmo`]: attach/detach, auto-scaling and picking
//! - [`TransformGizmo`]: the hover/drag state machine, generic over a
//!   [`TransformKind`] ([`Translate`], [`Rotate`], [`Scale`])
//!
//! Gizmos never own the nodes they manipulate; they keep [`NodeId`]s and
//! every operation tolerates stale ids.
//!
//! [`NodeId`]: crate::scene::NodeId

pub mod tri;
pub mod mesh_tri_data;
pub mod shape;
pub mod base;
pub mod transform;
pub mod apply;
pub mod translate;
pub mod rotate;
pub mod scale;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::foundation::math::Vec3;
use crate::scene::{LayerId, MeshInstanceId};

pub use apply::{apply_delta, NodeDelta, NodeSnapshot};
pub use base::{Gizmo, GizmoHit};
pub use mesh_tri_data::MeshTriData;
pub use rotate::{Rotate, RotateGizmo};
pub use scale::{Scale, ScaleGizmo};
pub use shape::{AxisShape, ShapeGeometry};
pub use transform::{DragState, TransformGizmo, TransformKind};
pub use translate::{Translate, TranslateGizmo};
pub use tri::Tri;

/// Gizmo size on screen relative to the camera distance (perspective)
pub const PERS_SCALE_RATIO: f32 = 0.3;

/// Gizmo size on screen relative to the ortho height (orthographic)
pub const ORTHO_SCALE_RATIO: f32 = 0.32;

/// Below this, the view direction counts as parallel to a rotation axis
pub const FACING_EPSILON: f32 = 0.2;

/// Degrees per world unit of pointer travel when a ring is seen edge-on
pub const ROTATE_SCALE: f32 = 900.0;

/// Layer holding the gizmo handles
pub const LAYERID_GIZMO: LayerId = 16;

/// Handle axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoAxis {
    /// World or local X
    X,
    /// World or local Y
    Y,
    /// World or local Z
    Z,
    /// All three axes at once
    Xyz,
    /// The camera view direction
    Face,
}

impl GizmoAxis {
    /// Component index for the single axes
    pub fn index(self) -> Option<usize> {
        match self {
            Self::X => Some(0),
            Self::Y => Some(1),
            Self::Z => Some(2),
            Self::Xyz | Self::Face => None,
        }
    }

    /// Unit vector for the single axes, zero otherwise
    pub fn unit(self) -> Vec3 {
        self.index().map_or_else(Vec3::zeros, |i| {
            let mut v = Vec3::zeros();
            v[i] = 1.0;
            v
        })
    }
}

/// Shape family of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Line with a cone tip
    Arrow,
    /// Line with a box tip
    BoxLine,
    /// Box at the gizmo origin
    BoxCenter,
    /// Sphere at the gizmo origin
    SphereCenter,
    /// Ring
    Disk,
    /// Quad between two axes
    Plane,
}

/// What a pickable handle means
///
/// Plane handles are tagged with their normal axis: the YZ plane is
/// `Plane` + `X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleTag {
    /// Shape family
    pub kind: ShapeKind,
    /// Axis the handle drives
    pub axis: GizmoAxis,
}

impl HandleTag {
    /// Create a tag
    pub const fn new(kind: ShapeKind, axis: GizmoAxis) -> Self {
        Self { kind, axis }
    }

    /// Whether dragging moves within a plane rather than along a line
    pub fn is_plane(&self) -> bool {
        self.kind == ShapeKind::Plane
    }
}

/// Frame in which handles are oriented and deltas are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordSpace {
    /// Global axes, shared pivot
    #[default]
    World,
    /// The first attached node's orientation
    Local,
}

/// Notifications fired by gizmos
#[derive(Debug, Clone, PartialEq)]
pub enum GizmoEvent {
    /// Pointer pressed, with the picked handle if any
    PointerDown {
        /// Pixel x
        x: f32,
        /// Pixel y
        y: f32,
        /// Picked mesh instance
        mesh_instance: Option<MeshInstanceId>,
    },
    /// Pointer moved, with the handle under it if any
    PointerMove {
        /// Pixel x
        x: f32,
        /// Pixel y
        y: f32,
        /// Mesh instance under the pointer
        mesh_instance: Option<MeshInstanceId>,
    },
    /// Pointer released
    PointerUp,
    /// Gizmo moved
    PositionUpdate(Vec3),
    /// Gizmo rotated, as Euler angles in degrees
    RotationUpdate(Vec3),
    /// Gizmo rescaled
    ScaleUpdate(f32),
    /// Nodes attached
    NodesAttach,
    /// Nodes detached
    NodesDetach,
    /// Visual state changed and should be redrawn
    RenderUpdate,
    /// Drag began
    TransformStart,
    /// Drag progressed
    TransformMove {
        /// Point delta since the drag began
        point_delta: Vec3,
        /// Angle delta in degrees since the drag began
        angle_delta: f32,
    },
    /// Drag ended
    TransformEnd,
}

/// Discriminant of [`GizmoEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoEventKind {
    /// [`GizmoEvent::PointerDown`]
    PointerDown,
    /// [`GizmoEvent::PointerMove`]
    PointerMove,
    /// [`GizmoEvent::PointerUp`]
    PointerUp,
    /// [`GizmoEvent::PositionUpdate`]
    PositionUpdate,
    /// [`GizmoEvent::RotationUpdate`]
    RotationUpdate,
    /// [`GizmoEvent::ScaleUpdate`]
    ScaleUpdate,
    /// [`GizmoEvent::NodesAttach`]
    NodesAttach,
    /// [`GizmoEvent::NodesDetach`]
    NodesDetach,
    /// [`GizmoEvent::RenderUpdate`]
    RenderUpdate,
    /// [`GizmoEvent::TransformStart`]
    TransformStart,
    /// [`GizmoEvent::TransformMove`]
    TransformMove,
    /// [`GizmoEvent::TransformEnd`]
    TransformEnd,
}

impl Event for GizmoEvent {
    type Kind = GizmoEventKind;

    fn kind(&self) -> GizmoEventKind {
        match self {
            Self::PointerDown { .. } => GizmoEventKind::PointerDown,
            Self::PointerMove { .. } => GizmoEventKind::PointerMove,
            Self::PointerUp => GizmoEventKind::PointerUp,
            Self::PositionUpdate(_) => GizmoEventKind::PositionUpdate,
            Self::RotationUpdate(_) => GizmoEventKind::RotationUpdate,
            Self::ScaleUpdate(_) => GizmoEventKind::ScaleUpdate,
            Self::NodesAttach => GizmoEventKind::NodesAttach,
            Self::NodesDetach => GizmoEventKind::NodesDetach,
            Self::RenderUpdate => GizmoEventKind::RenderUpdate,
            Self::TransformStart => GizmoEventKind::TransformStart,
            Self::TransformMove { .. } => GizmoEventKind::TransformMove,
            Self::TransformEnd => GizmoEventKind::TransformEnd,
        }
    }
}

/// Gizmo construction errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GizmoError {
    /// A shape was built without a material
    #[error("No default material provided.")]
    MissingMaterial,

    /// Collision data was built from an empty mesh
    #[error("No mesh provided.")]
    MissingMesh,

    /// Collision data was built from a non-triangle mesh
    #[error("Invalid primitive type.")]
    InvalidPrimitive,
}

/// Result type for gizmo construction
pub type GizmoResult<T> = Result<T, GizmoError>;
