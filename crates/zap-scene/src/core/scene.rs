use glam::Vec2;
use slotmap::SlotMap;

use crate::api::types::{LayerId, NodeId};
use crate::assets::cache::Cache;
use crate::components::node::Node;
use crate::core::container::Container;
use crate::core::graph::NodeGraph;
use crate::core::layer::Layer;
use crate::renderer::traits::Renderer;

/// Node arena plus the ordered layers that draw it.
#[derive(Debug, Default)]
pub struct Scene {
    graph: NodeGraph,
    layers: SlotMap<LayerId, Layer>,
    layer_list: Container<LayerId>,
    reorder: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut NodeGraph {
        &mut self.graph
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.graph.node_mut(id)
    }

    // ========================================================================
    // Layers
    // ========================================================================

    /// New camera-less layer. Layers are sorted by descending `order` before the next draw.
    pub fn add_layer(&mut self, order: i32) -> LayerId {
        let id = self.layers.insert_with_key(|id| Layer::new(id, order));
        self.layer_list.add(id);
        self.reorder = true;
        id
    }

    /// Remove a layer; its roots become parentless standalone nodes.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        let Some(layer) = self.layers.remove(id) else {
            return false;
        };
        self.layer_list.remove(id);
        for root in layer.roots().resolved() {
            self.graph.remove_from_parent(root);
        }
        true
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(id)
    }

    /// Layer ids in draw order as of the last sort.
    pub fn layers(&self) -> &[LayerId] {
        self.layer_list.as_slice()
    }

    /// Request a re-sort after a layer's order changed.
    pub fn reorder_layers(&mut self) {
        self.reorder = true;
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Insert `node` into the arena and attach it as a root of `layer`.
    pub fn spawn(&mut self, layer: LayerId, node: Node) -> Option<NodeId> {
        let id = self.graph.insert(node);
        if self.add_node(layer, id) {
            Some(id)
        } else {
            self.graph.destroy_node(id);
            None
        }
    }

    /// Attach an existing parentless node as a root of `layer`.
    pub fn add_node(&mut self, layer: LayerId, node: NodeId) -> bool {
        match self.layers.get_mut(layer) {
            Some(layer) => layer.add_node(&mut self.graph, node),
            None => false,
        }
    }

    /// Detach `node` from its layer or parent node.
    pub fn remove_node(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.graph.node(node).and_then(|n| n.parent()) else {
            return false;
        };
        match parent.layer().and_then(|id| self.layers.get_mut(id)) {
            Some(layer) => layer.remove_node(&mut self.graph, node),
            None => self.graph.remove_from_parent(node),
        }
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.graph.add_child(parent, child)
    }

    /// Detach and free `node` with its subtree.
    pub fn destroy_node(&mut self, node: NodeId) -> bool {
        self.remove_node(node);
        self.graph.destroy_node(node)
    }

    // ========================================================================
    // Frame
    // ========================================================================

    pub fn update(&mut self, delta: f32) {
        self.layer_list.lock();
        for &id in self.layer_list.as_slice() {
            if let Some(layer) = self.layers.get_mut(id) {
                layer.update(&mut self.graph, delta);
            }
        }
        self.layer_list.unlock();
    }

    pub fn draw(&mut self, renderer: &mut dyn Renderer, cache: Option<&Cache>) {
        if self.reorder {
            let mut order = self.layer_list.as_slice().to_vec();
            order.sort_by_key(|id| std::cmp::Reverse(self.layers.get(*id).map_or(0, Layer::order)));
            if self.layer_list.set_order(order) {
                self.reorder = false;
            }
        }

        self.layer_list.lock();
        for &id in self.layer_list.as_slice() {
            if let Some(layer) = self.layers.get_mut(id) {
                layer.draw(&mut self.graph, renderer, cache);
            }
        }
        self.layer_list.unlock();
    }

    // ========================================================================
    // Picking (normalized window coordinates, front layer first)
    // ========================================================================

    pub fn pick_node(&self, normalized: Vec2) -> Option<NodeId> {
        self.layer_list.as_slice().iter().rev().find_map(|&id| {
            let layer = self.layers.get(id)?;
            let world = layer.camera.as_ref()?.convert_normalized_to_world(normalized);
            layer.pick_node(&self.graph, world)
        })
    }

    pub fn pick_nodes(&self, normalized: Vec2) -> Vec<NodeId> {
        let mut hits = Vec::new();
        for &id in self.layer_list.as_slice().iter().rev() {
            let Some(layer) = self.layers.get(id) else { continue };
            let Some(camera) = &layer.camera else { continue };
            hits.extend(layer.pick_nodes(&self.graph, camera.convert_normalized_to_world(normalized)));
        }
        hits
    }

    /// Nodes overlapping the convex polygon `edges`, given in normalized coordinates.
    pub fn pick_nodes_in_shape(&self, edges: &[Vec2]) -> Vec<NodeId> {
        let mut hits = Vec::new();
        for &id in self.layer_list.as_slice().iter().rev() {
            let Some(layer) = self.layers.get(id) else { continue };
            let Some(camera) = &layer.camera else { continue };
            let world: Vec<Vec2> = edges.iter().map(|&p| camera.convert_normalized_to_world(p)).collect();
            hits.extend(layer.pick_nodes_in_shape(&self.graph, &world));
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::drawable::tests::Probe;
    use crate::renderer::camera::Camera;
    use crate::renderer::headless::HeadlessRenderer;
    use crate::renderer::traits::RenderTargetHandle;

    fn camera() -> Option<Camera> {
        Some(Camera::new(Vec2::new(100.0, 100.0)))
    }

    fn probe() -> Node {
        Node::new().with_drawable(Probe::with_bounds(Vec2::splat(-10.0), Vec2::splat(10.0)))
    }

    #[test]
    fn layers_draw_by_descending_order() {
        let mut scene = Scene::new();
        let low = scene.add_layer(0);
        let high = scene.add_layer(5);
        scene.layer_mut(low).unwrap().camera = camera();
        scene.layer_mut(high).unwrap().camera = camera();
        scene.layer_mut(low).unwrap().render_target = Some(RenderTargetHandle(1));
        scene.layer_mut(high).unwrap().render_target = Some(RenderTargetHandle(2));

        let mut renderer = HeadlessRenderer::new();
        scene.draw(&mut renderer, None);
        assert_eq!(scene.layers(), &[high, low]);
        assert_eq!(
            renderer.render_target_switches,
            vec![Some(RenderTargetHandle(2)), Some(RenderTargetHandle(1))]
        );

        scene.layer_mut(low).unwrap().set_order(10);
        scene.reorder_layers();
        scene.draw(&mut renderer, None);
        assert_eq!(scene.layers(), &[low, high]);
    }

    #[test]
    fn spawn_and_destroy() {
        let mut scene = Scene::new();
        let layer = scene.add_layer(0);
        let root = scene.spawn(layer, probe()).unwrap();
        let child = scene.graph_mut().insert(probe());
        assert!(scene.add_child(root, child));
        assert_eq!(scene.node(child).unwrap().layer(), Some(layer));

        assert!(scene.destroy_node(root));
        assert!(scene.node(child).is_none());
        assert!(scene.layer(layer).unwrap().roots().is_empty());
    }

    #[test]
    fn spawn_into_missing_layer_fails() {
        let mut scene = Scene::new();
        let layer = scene.add_layer(0);
        scene.remove_layer(layer);
        assert!(scene.spawn(layer, probe()).is_none());
        assert!(scene.graph().is_empty());
    }

    #[test]
    fn removing_layer_frees_roots() {
        let mut scene = Scene::new();
        let layer = scene.add_layer(0);
        let root = scene.spawn(layer, probe()).unwrap();
        assert!(scene.remove_layer(layer));
        let node = scene.node(root).unwrap();
        assert!(node.parent().is_none());
        assert!(node.layer().is_none());
    }

    #[test]
    fn pick_converts_through_camera() {
        let mut scene = Scene::new();
        let back = scene.add_layer(1);
        let front = scene.add_layer(0);
        scene.layer_mut(back).unwrap().camera = camera();
        scene.layer_mut(front).unwrap().camera = camera();
        let below = scene.spawn(back, probe()).unwrap();
        let above = scene.spawn(front, probe()).unwrap();

        let mut renderer = HeadlessRenderer::new();
        scene.draw(&mut renderer, None);

        let center = Vec2::new(0.5, 0.5);
        assert_eq!(scene.pick_node(center), Some(above));
        assert_eq!(scene.pick_nodes(center), vec![above, below]);
        assert_eq!(scene.pick_node(Vec2::new(0.0, 0.0)), None);

        let box_edges = [Vec2::new(0.4, 0.4), Vec2::new(0.6, 0.4), Vec2::new(0.6, 0.6), Vec2::new(0.4, 0.6)];
        assert_eq!(scene.pick_nodes_in_shape(&box_edges).len(), 2);
    }

    #[test]
    fn update_reaches_every_layer() {
        crate::test_log();
        let mut scene = Scene::new();
        let a = scene.add_layer(0);
        let b = scene.add_layer(1);
        let na = scene.spawn(a, probe()).unwrap();
        let nb = scene.spawn(b, probe()).unwrap();
        scene.update(0.5);
        for id in [na, nb] {
            let elapsed = scene.node(id).unwrap().drawable::<Probe>(0).unwrap().elapsed;
            assert!((elapsed - 0.5).abs() < 1e-6);
        }
    }
}
