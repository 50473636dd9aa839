//! Forward rendering of a contiguous range of sublayers

use crate::render::camera::Camera;
use crate::render::device::{ForwardDraw, ShaderPass};
use crate::render::frame_graph::{PassBase, RenderContext, RenderPass};
use crate::render::RenderResult;
use crate::scene::{LayerComposition, LayerId, MeshInstanceId};

/// One sublayer rendered by a [`ForwardPass`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderAction {
    sublayer_index: usize,
    clears: bool,
}

/// Renders sublayers of the composition with the forward renderer
pub struct ForwardPass {
    base: PassBase,
    actions: Vec<RenderAction>,
    instances: Vec<MeshInstanceId>,
}

impl ForwardPass {
    /// Create an empty pass
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: PassBase::new(name),
            actions: Vec::new(),
            instances: Vec::new(),
        }
    }

    /// Add a single sublayer by index
    pub fn add_sublayer(&mut self, sublayer_index: usize, clears: bool) {
        self.actions.push(RenderAction { sublayer_index, clears });
    }

    /// Add sublayers from `start_index` onwards that `camera` renders
    ///
    /// Stops after the sublayer matching `last_layer` (layer id and
    /// transparency), or at the end of the composition when `None`. Only the
    /// first added sublayer clears, and only if `first_layer_clears`. Returns
    /// the index following the last sublayer visited.
    pub fn add_layers(
        &mut self,
        composition: &LayerComposition,
        camera: &Camera,
        start_index: usize,
        first_layer_clears: bool,
        last_layer: Option<(LayerId, bool)>,
    ) -> usize {
        let sublayers = composition.sublayers();
        let mut clears = first_layer_clears;
        let mut index = start_index;

        while index < sublayers.len() {
            let sublayer = sublayers[index];
            if camera.renders_layer(sublayer.layer) {
                self.add_sublayer(index, clears);
                clears = false;
            }
            index += 1;
            if last_layer == Some((sublayer.layer, sublayer.transparent)) {
                break;
            }
        }
        index
    }

    /// Whether any sublayer was added
    pub fn renders_anything(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Indices of the sublayers rendered, in order
    pub fn sublayer_indices(&self) -> Vec<usize> {
        self.actions.iter().map(|a| a.sublayer_index).collect()
    }
}

impl RenderPass for ForwardPass {
    fn base(&self) -> &PassBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PassBase {
        &mut self.base
    }

    fn execute(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let (graph, camera, layers) = (ctx.graph, ctx.camera, ctx.layers);

        for action in &self.actions {
            let Some(sublayer) = layers.sublayers().get(action.sublayer_index) else {
                log::warn!("{}: sublayer {} no longer exists", self.base.name, action.sublayer_index);
                continue;
            };
            let clear_color = if action.clears { self.base.clear_color } else { None };
            let clear_depth = if action.clears { self.base.clear_depth } else { None };

            let layer = layers.layer(sublayer.layer).filter(|l| l.enabled && sublayer.enabled);
            if let Some(layer) = layer {
                self.instances.extend(layer.culled_instances(graph, sublayer.transparent));
            }
            if layer.is_none() && clear_color.is_none() && clear_depth.is_none() {
                continue;
            }

            ctx.device.render_forward(&ForwardDraw {
                target: self.base.render_target,
                camera,
                graph,
                instances: &self.instances,
                shader_pass: ShaderPass::Forward,
                clear_color,
                clear_depth,
            })?;
            self.instances.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{LAYERID_IMMEDIATE, LAYERID_SKYBOX, LAYERID_UI, LAYERID_WORLD};

    #[test]
    fn test_add_layers_splits_at_grab_layer() {
        let composition = LayerComposition::with_default_layers();
        let camera = Camera::default();

        let mut opaque = ForwardPass::new("opaque");
        let next = opaque.add_layers(&composition, &camera, 0, true, Some((LAYERID_SKYBOX, false)));
        assert_eq!(next, 3);
        assert_eq!(opaque.sublayer_indices(), vec![0, 1, 2]);
        assert!(opaque.actions[0].clears && !opaque.actions[1].clears);

        let mut transparent = ForwardPass::new("transparent");
        let next = transparent.add_layers(&composition, &camera, next, false, Some((LAYERID_IMMEDIATE, true)));
        assert_eq!(next, 6);
        assert_eq!(transparent.sublayer_indices(), vec![3, 4, 5]);

        let mut after = ForwardPass::new("after");
        assert_eq!(after.add_layers(&composition, &camera, next, false, None), 7);
        assert_eq!(after.sublayer_indices(), vec![6]);
    }

    #[test]
    fn test_layers_not_rendered_by_camera_are_skipped() {
        let composition = LayerComposition::with_default_layers();
        let mut camera = Camera::default();
        camera.layers = vec![LAYERID_WORLD, LAYERID_UI];

        let mut pass = ForwardPass::new("p");
        pass.add_layers(&composition, &camera, 0, true, None);
        assert_eq!(pass.sublayer_indices(), vec![0, 3, 6]);
        assert!(pass.actions[0].clears);
    }
}
