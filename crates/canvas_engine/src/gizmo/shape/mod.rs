//! Gizmo handle shapes
//!
//! Every shape is authored along its local +Y and rotated onto its axis with
//! [`axis_rotation`]. A shape owns a small node subtree in the scene graph
//! (one root plus one child per visible part), the mesh instances drawing
//! it, and the collision triangles used for picking.

mod arrow;
mod box_center;
mod box_line;
mod disk;
mod plane;
mod sphere_center;

use std::rc::Rc;

use nalgebra::Rotation3;

pub use arrow::ArrowGeometry;
pub use box_center::{BoxCenterGeometry, CENTER_PRIORITY};
pub use box_line::BoxLineGeometry;
pub use disk::DiskGeometry;
pub use plane::PlaneGeometry;
pub use sphere_center::SphereCenterGeometry;

use super::{GizmoAxis, GizmoError, GizmoResult, HandleTag, MeshTriData};
use crate::foundation::color::Color;
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::scene::{LayerComposition, LayerId, Material, Mesh, MeshInstance, MeshInstanceId, NodeId, SceneGraph};

const ROUND_SEGMENTS: u32 = 16;

/// A visible part: unit mesh plus its transform relative to the shape root
#[derive(Debug, Clone)]
pub struct ShapePart {
    /// Geometry
    pub mesh: Mesh,
    /// Placement relative to the shape root
    pub transform: Transform,
}

impl ShapePart {
    fn new(mesh: Mesh, transform: Transform) -> Self {
        Self { mesh, transform }
    }

    fn tri_data(&self, priority: u32) -> GizmoResult<MeshTriData> {
        MeshTriData::new(&self.mesh, self.transform.to_matrix(), priority)
    }
}

fn unit_cylinder() -> Mesh {
    Mesh::cylinder(0.5, 1.0, ROUND_SEGMENTS)
}

fn unit_cone() -> Mesh {
    Mesh::cone(0.5, 1.0, ROUND_SEGMENTS)
}

fn unit_box() -> Mesh {
    Mesh::cube(Vec3::repeat(0.5))
}

fn unit_sphere() -> Mesh {
    Mesh::sphere(0.5, 8, ROUND_SEGMENTS)
}

fn unit_quad() -> Mesh {
    Mesh::plane(0.5, 0.5)
}

/// Cylinder from `gap` to `gap + length` along +Y
fn line_part(gap: f32, length: f32, thickness: f32) -> ShapePart {
    ShapePart::new(
        unit_cylinder(),
        Transform::new(
            Vec3::new(0.0, gap + length * 0.5, 0.0),
            Quat::identity(),
            Vec3::new(thickness, length, thickness),
        ),
    )
}

/// Rotation taking a shape's +Y onto `axis`
///
/// The shape's Z and X follow cyclically, so plane handles offset into the
/// shape's positive XZ quadrant land in the positive quadrant of their plane.
pub fn axis_rotation(axis: GizmoAxis) -> Quat {
    let Some(i) = axis.index() else {
        return Quat::identity();
    };
    let e = |k: usize| {
        let mut v = Vec3::zeros();
        v[k % 3] = 1.0;
        v
    };
    let basis = Rotation3::from_basis_unchecked(&[e(i + 2), e(i), e(i + 1)]);
    Quat::from_rotation_matrix(&basis)
}

/// Geometry of one handle
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    /// Line with a cone tip
    Arrow(ArrowGeometry),
    /// Line with a box tip
    BoxLine(BoxLineGeometry),
    /// Center box
    BoxCenter(BoxCenterGeometry),
    /// Center sphere
    SphereCenter(SphereCenterGeometry),
    /// Ring
    Disk(DiskGeometry),
    /// Quad
    Plane(PlaneGeometry),
}

impl ShapeGeometry {
    /// Visible parts
    pub fn parts(&self) -> Vec<ShapePart> {
        match self {
            Self::Arrow(g) => g.parts(),
            Self::BoxLine(g) => g.parts(),
            Self::BoxCenter(g) => g.parts(),
            Self::SphereCenter(g) => g.parts(),
            Self::Disk(g) => g.parts(),
            Self::Plane(g) => g.parts(),
        }
    }

    /// Collision triangles
    pub fn collision(&self) -> GizmoResult<Vec<MeshTriData>> {
        match self {
            Self::Arrow(g) => g.collision(),
            Self::BoxLine(g) => g.collision(),
            Self::BoxCenter(g) => g.collision(),
            Self::SphereCenter(g) => g.collision(),
            Self::Disk(g) => g.collision(),
            Self::Plane(g) => g.collision(),
        }
    }
}

macro_rules! impl_from_geometry {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(impl From<$ty> for ShapeGeometry {
            fn from(g: $ty) -> Self {
                Self::$variant(g)
            }
        })*
    };
}

impl_from_geometry! {
    Arrow => ArrowGeometry,
    BoxLine => BoxLineGeometry,
    BoxCenter => BoxCenterGeometry,
    SphereCenter => SphereCenterGeometry,
    Disk => DiskGeometry,
    Plane => PlaneGeometry,
}

/// Colors of a handle's three visual states
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeColors {
    /// Idle
    pub default: Color,
    /// Under the pointer
    pub hover: Color,
    /// Not pickable
    pub disabled: Color,
}

/// Builder for [`AxisShape`]
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    tag: HandleTag,
    geometry: ShapeGeometry,
    position: Vec3,
    rotation: Quat,
    default_color: Option<Color>,
    hover_color: Option<Color>,
    disabled_color: Option<Color>,
}

impl ShapeBuilder {
    /// Start a shape aligned with its tag's axis
    pub fn new(tag: HandleTag, geometry: impl Into<ShapeGeometry>) -> Self {
        Self {
            tag,
            geometry: geometry.into(),
            position: Vec3::zeros(),
            rotation: axis_rotation(tag.axis),
            default_color: None,
            hover_color: None,
            disabled_color: None,
        }
    }

    /// Local position under the gizmo root
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Local rotation under the gizmo root
    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Idle color (required)
    pub fn default_color(mut self, color: Color) -> Self {
        self.default_color = Some(color);
        self
    }

    /// Hover color, defaults to the idle color
    pub fn hover_color(mut self, color: Color) -> Self {
        self.hover_color = Some(color);
        self
    }

    /// Disabled color, defaults to translucent gray
    pub fn disabled_color(mut self, color: Color) -> Self {
        self.disabled_color = Some(color);
        self
    }

    /// Create the shape's nodes and mesh instances under `parent`
    pub fn build(
        self,
        graph: &mut SceneGraph,
        layers: &mut LayerComposition,
        layer: LayerId,
        parent: NodeId,
    ) -> GizmoResult<AxisShape> {
        let default = self.default_color.ok_or(GizmoError::MissingMaterial)?;
        let colors = ShapeColors {
            default,
            hover: self.hover_color.unwrap_or(default),
            disabled: self.disabled_color.unwrap_or(Color::GRAY.with_alpha(0.5)),
        };
        let tri_data = self.geometry.collision()?;

        let name = format!("{:?}:{:?}", self.tag.kind, self.tag.axis).to_lowercase();
        let root = graph.create_child(parent, name.clone());
        graph.set_local_position(root, self.position);
        graph.set_local_rotation(root, self.rotation);

        let mut part_nodes = Vec::new();
        let mut mesh_instances = Vec::new();
        for part in self.geometry.parts() {
            let node = graph.create_child(root, format!("{name}:part"));
            if let Some(n) = graph.node_mut(node) {
                n.local = part.transform;
            }
            let mi = graph.add_mesh_instance(MeshInstance::new(
                node,
                Rc::new(part.mesh),
                Material::overlay(name.clone(), colors.default),
            ));
            if !layers.add_mesh_instance(layer, mi) {
                log::warn!("gizmo layer {} is not registered, {} will not be drawn", layer, name);
            }
            part_nodes.push(node);
            mesh_instances.push(mi);
        }
        log::debug!("built gizmo shape {} ({} tris)", name, tri_data.iter().map(|d| d.tris().len()).sum::<usize>());

        Ok(AxisShape {
            tag: self.tag,
            geometry: self.geometry,
            root,
            part_nodes,
            mesh_instances,
            tri_data,
            colors,
            disabled: false,
            hovered: false,
        })
    }
}

/// One pickable gizmo handle
#[derive(Debug)]
pub struct AxisShape {
    tag: HandleTag,
    geometry: ShapeGeometry,
    root: NodeId,
    part_nodes: Vec<NodeId>,
    mesh_instances: Vec<MeshInstanceId>,
    tri_data: Vec<MeshTriData>,
    colors: ShapeColors,
    disabled: bool,
    hovered: bool,
}

impl AxisShape {
    /// What the handle drives
    pub fn tag(&self) -> HandleTag {
        self.tag
    }

    /// Root node of the shape
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Current geometry
    pub fn geometry(&self) -> &ShapeGeometry {
        &self.geometry
    }

    /// Mesh instances drawing the shape
    pub fn mesh_instances(&self) -> &[MeshInstanceId] {
        &self.mesh_instances
    }

    /// Collision data relative to the shape root
    pub fn tri_data(&self) -> &[MeshTriData] {
        &self.tri_data
    }

    /// Whether the shape ignores the pointer
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Whether the shape shows its hover color
    pub fn hovered(&self) -> bool {
        self.hovered
    }

    /// Enable or disable picking of this shape
    pub fn set_disabled(&mut self, graph: &mut SceneGraph, disabled: bool) {
        if self.disabled == disabled {
            return;
        }
        self.disabled = disabled;
        self.apply_color(graph);
    }

    /// Show or clear the hover state
    pub fn hover(&mut self, graph: &mut SceneGraph, state: bool) {
        self.hovered = state;
        self.apply_color(graph);
    }

    /// Replace the state colors
    pub fn set_colors(&mut self, graph: &mut SceneGraph, colors: ShapeColors) {
        self.colors = colors;
        self.apply_color(graph);
    }

    /// Color currently shown
    pub fn current_color(&self) -> Color {
        if self.disabled {
            self.colors.disabled
        } else if self.hovered {
            self.colors.hover
        } else {
            self.colors.default
        }
    }

    fn apply_color(&self, graph: &mut SceneGraph) {
        let color = self.current_color();
        for &id in &self.mesh_instances {
            if let Some(mi) = graph.mesh_instance_mut(id) {
                mi.material.color = color;
                mi.material.transparent = color.a < 1.0;
            }
        }
    }

    /// Swap the geometry, regenerating meshes and collision data wholesale
    ///
    /// The new geometry must be of the same family; parts are matched in order.
    pub fn set_geometry(&mut self, graph: &mut SceneGraph, geometry: impl Into<ShapeGeometry>) -> GizmoResult<()> {
        let geometry = geometry.into();
        self.tri_data = geometry.collision()?;

        let parts = geometry.parts();
        if parts.len() != self.part_nodes.len() {
            log::warn!(
                "shape {:?} rebuilt with {} parts, expected {}",
                self.tag,
                parts.len(),
                self.part_nodes.len()
            );
        }
        for ((&node, &mi), part) in self.part_nodes.iter().zip(&self.mesh_instances).zip(parts) {
            if let Some(n) = graph.node_mut(node) {
                n.local = part.transform;
            }
            if let Some(mi) = graph.mesh_instance_mut(mi) {
                mi.mesh = Rc::new(part.mesh);
            }
        }
        self.geometry = geometry;
        Ok(())
    }

    /// Remove the shape's nodes and mesh instances
    pub fn destroy(self, graph: &mut SceneGraph, layers: &mut LayerComposition, layer: LayerId) {
        if let Some(l) = layers.layer_mut(layer) {
            for &mi in &self.mesh_instances {
                l.remove_mesh_instance(mi);
            }
        }
        graph.remove_node(self.root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gizmo::ShapeKind;
    use approx::assert_relative_eq;

    fn setup() -> (SceneGraph, LayerComposition, NodeId) {
        let mut graph = SceneGraph::new();
        let mut layers = LayerComposition::new();
        layers.add_layer(crate::scene::Layer::new(7, "Gizmo"));
        let root = graph.create_node("gizmo");
        (graph, layers, root)
    }

    #[test]
    fn test_axis_rotation_maps_up_onto_axis() {
        for axis in [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z] {
            assert_relative_eq!(axis_rotation(axis) * Vec3::y(), axis.unit(), epsilon = 1e-6);
        }
        // plane quadrant lands positive
        let yz = axis_rotation(GizmoAxis::X) * Vec3::new(1.0, 0.0, 1.0);
        assert_relative_eq!(yz, Vec3::new(0.0, 1.0, 1.0), epsilon = 1e-6);
        let xy = axis_rotation(GizmoAxis::Z) * Vec3::new(1.0, 0.0, 1.0);
        assert_relative_eq!(xy, Vec3::new(1.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_missing_color_is_rejected() {
        let (mut graph, mut layers, root) = setup();
        let tag = HandleTag::new(ShapeKind::Arrow, GizmoAxis::X);
        let err = ShapeBuilder::new(tag, ArrowGeometry::default())
            .build(&mut graph, &mut layers, 7, root)
            .unwrap_err();
        assert_eq!(err.to_string(), "No default material provided.");
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_hover_and_disabled_colors() {
        let (mut graph, mut layers, root) = setup();
        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        let yellow = Color::new(1.0, 1.0, 0.0, 1.0);
        let mut shape = ShapeBuilder::new(HandleTag::new(ShapeKind::BoxLine, GizmoAxis::Y), BoxLineGeometry::default())
            .default_color(red)
            .hover_color(yellow)
            .build(&mut graph, &mut layers, 7, root)
            .unwrap();
        assert_eq!(shape.mesh_instances().len(), 2);
        assert_eq!(layers.layer(7).unwrap().mesh_instances().len(), 2);

        shape.hover(&mut graph, true);
        let mi = graph.mesh_instance(shape.mesh_instances()[0]).unwrap();
        assert_eq!(mi.material.color, yellow);

        shape.set_disabled(&mut graph, true);
        let mi = graph.mesh_instance(shape.mesh_instances()[0]).unwrap();
        assert!(mi.material.transparent);

        shape.destroy(&mut graph, &mut layers, 7);
        assert_eq!(graph.node_count(), 1);
        assert!(layers.layer(7).unwrap().mesh_instances().is_empty());
    }

    #[test]
    fn test_disk_rebuild_replaces_triangles() {
        let (mut graph, mut layers, root) = setup();
        let mut shape = ShapeBuilder::new(HandleTag::new(ShapeKind::Disk, GizmoAxis::Z), DiskGeometry::default())
            .default_color(Color::WHITE)
            .build(&mut graph, &mut layers, 7, root)
            .unwrap();
        let before = shape.tri_data()[0].tris().to_vec();

        let bigger = DiskGeometry {
            tube_radius: 0.05,
            ..DiskGeometry::default()
        };
        shape.set_geometry(&mut graph, bigger.clone()).unwrap();
        assert_eq!(shape.geometry(), &ShapeGeometry::Disk(bigger));
        assert_ne!(shape.tri_data()[0].tris(), &before[..]);
    }
}
