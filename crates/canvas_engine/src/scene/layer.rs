//! Layers and the layer composition
//!
//! A layer is a named bucket of mesh instances. The composition orders each
//! layer twice at most, once as an opaque sublayer and once as a transparent
//! one; forward passes render contiguous ranges of that sublayer list.

use super::mesh_instance::MeshInstanceId;
use super::scene_graph::SceneGraph;

/// Layer identifier
pub type LayerId = u32;

/// Regular scene geometry
pub const LAYERID_WORLD: LayerId = 0;
/// Marker layer where the scene depth becomes available; prepass stops here
pub const LAYERID_DEPTH: LayerId = 1;
/// Skybox
pub const LAYERID_SKYBOX: LayerId = 2;
/// Immediate-mode geometry (debug lines, gizmos)
pub const LAYERID_IMMEDIATE: LayerId = 3;
/// Screen-space UI
pub const LAYERID_UI: LayerId = 4;

/// A named bucket of mesh instances
#[derive(Debug, Clone)]
pub struct Layer {
    /// Unique id within a composition
    pub id: LayerId,
    /// Display name
    pub name: String,
    /// Disabled layers are skipped by every pass
    pub enabled: bool,
    mesh_instances: Vec<MeshInstanceId>,
}

impl Layer {
    /// Create an empty, enabled layer
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: true,
            mesh_instances: Vec::new(),
        }
    }

    /// Add a mesh instance (ignored if already present)
    pub fn add_mesh_instance(&mut self, id: MeshInstanceId) {
        if !self.mesh_instances.contains(&id) {
            self.mesh_instances.push(id);
        }
    }

    /// Remove a mesh instance
    pub fn remove_mesh_instance(&mut self, id: MeshInstanceId) {
        self.mesh_instances.retain(|&m| m != id);
    }

    /// All mesh instances, in insertion order
    pub fn mesh_instances(&self) -> &[MeshInstanceId] {
        &self.mesh_instances
    }

    /// Active mesh instances of one transparency class
    ///
    /// No frustum culling is performed; inactive and stale instances are dropped.
    pub fn culled_instances<'a>(
        &'a self,
        graph: &'a SceneGraph,
        transparent: bool,
    ) -> impl Iterator<Item = MeshInstanceId> + 'a {
        self.mesh_instances.iter().copied().filter(move |&id| {
            graph.is_mesh_instance_active(id)
                && graph
                    .mesh_instance(id)
                    .is_some_and(|mi| mi.material.transparent == transparent)
        })
    }
}

/// One entry in the render order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubLayer {
    /// Layer rendered by this entry
    pub layer: LayerId,
    /// Whether this entry renders the transparent half of the layer
    pub transparent: bool,
    /// Disabled entries are skipped
    pub enabled: bool,
}

/// Ordered set of layers
#[derive(Debug, Clone, Default)]
pub struct LayerComposition {
    layers: Vec<Layer>,
    sublayers: Vec<SubLayer>,
}

impl LayerComposition {
    /// Create an empty composition
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine's default layer order
    ///
    /// World (opaque), Depth, Skybox, World (transparent), Immediate (opaque and
    /// transparent), UI.
    pub fn with_default_layers() -> Self {
        let mut composition = Self::new();
        composition.add_layer(Layer::new(LAYERID_WORLD, "World"));
        composition.add_layer(Layer::new(LAYERID_DEPTH, "Depth"));
        composition.add_layer(Layer::new(LAYERID_SKYBOX, "Skybox"));
        composition.add_layer(Layer::new(LAYERID_IMMEDIATE, "Immediate"));
        composition.add_layer(Layer::new(LAYERID_UI, "UI"));

        composition.push_sublayer(LAYERID_WORLD, false);
        composition.push_sublayer(LAYERID_DEPTH, false);
        composition.push_sublayer(LAYERID_SKYBOX, false);
        composition.push_sublayer(LAYERID_WORLD, true);
        composition.push_sublayer(LAYERID_IMMEDIATE, false);
        composition.push_sublayer(LAYERID_IMMEDIATE, true);
        composition.push_sublayer(LAYERID_UI, true);
        composition
    }

    /// Register a layer without placing it in the render order
    pub fn add_layer(&mut self, layer: Layer) {
        if self.layer(layer.id).is_some() {
            log::warn!("layer {} already registered", layer.id);
            return;
        }
        self.layers.push(layer);
    }

    /// Append a sublayer to the render order
    pub fn push_sublayer(&mut self, layer: LayerId, transparent: bool) {
        self.sublayers.push(SubLayer {
            layer,
            transparent,
            enabled: true,
        });
    }

    /// Layer by id
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Mutable layer by id
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Render order
    pub fn sublayers(&self) -> &[SubLayer] {
        &self.sublayers
    }

    /// Index of a sublayer in the render order
    pub fn sublayer_index(&self, layer: LayerId, transparent: bool) -> Option<usize> {
        self.sublayers
            .iter()
            .position(|s| s.layer == layer && s.transparent == transparent)
    }

    /// Enable or disable a sublayer
    pub fn set_sublayer_enabled(&mut self, layer: LayerId, transparent: bool, enabled: bool) {
        if let Some(index) = self.sublayer_index(layer, transparent) {
            self.sublayers[index].enabled = enabled;
        }
    }

    /// Convenience: add a mesh instance to a layer, returning false if the layer is unknown
    pub fn add_mesh_instance(&mut self, layer: LayerId, id: MeshInstanceId) -> bool {
        match self.layer_mut(layer) {
            Some(l) => {
                l.add_mesh_instance(id);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::Color;
    use crate::scene::{Material, Mesh, MeshInstance};
    use std::rc::Rc;

    #[test]
    fn test_default_order() {
        let composition = LayerComposition::with_default_layers();
        assert_eq!(composition.sublayer_index(LAYERID_SKYBOX, false), Some(2));
        assert_eq!(composition.sublayer_index(LAYERID_WORLD, true), Some(3));
        assert_eq!(composition.sublayer_index(LAYERID_UI, true), Some(6));
        assert_eq!(composition.sublayer_index(LAYERID_UI, false), None);
    }

    #[test]
    fn test_culled_instances_split_by_transparency() {
        let mut graph = SceneGraph::new();
        let node = graph.create_node("n");
        let mesh = Rc::new(Mesh::cube(crate::foundation::math::Vec3::new(0.5, 0.5, 0.5)));
        let opaque = graph.add_mesh_instance(MeshInstance::new(
            node,
            Rc::clone(&mesh),
            Material::opaque("o", Color::WHITE),
        ));
        let mut glass = Material::opaque("t", Color::WHITE.with_alpha(0.5));
        glass.transparent = true;
        let transparent = graph.add_mesh_instance(MeshInstance::new(node, mesh, glass));

        let mut layer = Layer::new(LAYERID_WORLD, "World");
        layer.add_mesh_instance(opaque);
        layer.add_mesh_instance(transparent);

        assert_eq!(layer.culled_instances(&graph, false).collect::<Vec<_>>(), vec![opaque]);
        assert_eq!(layer.culled_instances(&graph, true).collect::<Vec<_>>(), vec![transparent]);

        graph.set_enabled(node, false);
        assert_eq!(layer.culled_instances(&graph, false).count(), 0);
    }
}
