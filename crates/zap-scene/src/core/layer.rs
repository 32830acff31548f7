use glam::{Mat4, Vec2};

use crate::api::types::{LayerId, NodeId, ParentRef};
use crate::assets::cache::Cache;
use crate::components::drawable::DrawContext;
use crate::components::node::Node;
use crate::core::container::NodeContainer;
use crate::core::geometry::transform_point2;
use crate::core::graph::{NodeGraph, Visit};
use crate::renderer::camera::Camera;
use crate::renderer::traits::{RenderTargetHandle, Renderer};

/// A group of root nodes drawn through one camera into one target.
#[derive(Debug)]
pub struct Layer {
    id: LayerId,
    /// Without a camera the layer draws nothing.
    pub camera: Option<Camera>,
    order: i32,
    /// `None` draws to the backbuffer.
    pub render_target: Option<RenderTargetHandle>,
    roots: NodeContainer,
    draw_queue: Vec<NodeId>,
}

impl Layer {
    pub(crate) fn new(id: LayerId, order: i32) -> Self {
        Self {
            id,
            camera: None,
            order,
            render_target: None,
            roots: NodeContainer::new(),
            draw_queue: Vec::new(),
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Sort key; higher orders draw first. Call `Scene::reorder_layers`
    /// after changing it.
    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn set_order(&mut self, order: i32) {
        self.order = order;
    }

    pub fn roots(&self) -> &NodeContainer {
        &self.roots
    }

    /// Nodes queued by the last draw, in dispatch order.
    pub fn draw_queue(&self) -> &[NodeId] {
        &self.draw_queue
    }

    /// Attach `node` as a root. Fails if it already has a parent.
    pub fn add_node(&mut self, graph: &mut NodeGraph, node: NodeId) -> bool {
        if !graph.attach_to_layer(node, self.id) {
            return false;
        }
        // a root detached through the graph stays listed until the next
        // traversal; reuse that entry
        if !self.roots.will_contain(node) {
            self.roots.add(node);
        }
        true
    }

    /// Detach a root of this layer.
    pub fn remove_node(&mut self, graph: &mut NodeGraph, node: NodeId) -> bool {
        if graph.node(node).and_then(|n| n.parent()) != Some(ParentRef::Layer(self.id)) {
            return false;
        }
        graph.remove_from_parent(node);
        self.roots.remove(node)
    }

    /// Roots still owned by this layer; detached or destroyed ones are
    /// staged for removal.
    fn live_roots(id: LayerId, roots: &mut NodeContainer, graph: &NodeGraph) -> Vec<NodeId> {
        let mut live = Vec::with_capacity(roots.len());
        for &root in roots.as_slice() {
            if graph.node(root).and_then(|n| n.parent()) == Some(ParentRef::Layer(id)) {
                live.push(root);
            }
        }
        if live.len() != roots.len() {
            let stale: Vec<NodeId> = roots.iter().copied().filter(|r| !live.contains(r)).collect();
            for root in stale {
                roots.remove(root);
            }
        }
        live
    }

    pub fn update(&mut self, graph: &mut NodeGraph, delta: f32) {
        self.roots.lock();
        for root in Self::live_roots(self.id, &mut self.roots, graph) {
            graph.update_node(root, delta);
        }
        self.roots.unlock();
    }

    /// Rebuild the draw queue and dispatch it.
    pub fn draw(&mut self, graph: &mut NodeGraph, renderer: &mut dyn Renderer, cache: Option<&Cache>) {
        self.draw_queue.clear();
        let Some(camera) = &self.camera else {
            return;
        };
        renderer.activate_render_target(self.render_target);

        self.roots.lock();
        let roots = Self::live_roots(self.id, &mut self.roots, graph);
        {
            let mut visit = Visit {
                queue: &mut self.draw_queue,
                camera,
                renderer: &*renderer,
            };
            for root in roots {
                graph.visit(root, &mut visit, Mat4::IDENTITY, false, 1.0, true);
            }
        }
        self.roots.unlock();

        let z = |id: &NodeId| graph.node(*id).map_or(0.0, |n| n.z);
        self.draw_queue.sort_by(|a, b| z(b).total_cmp(&z(a)));
        log::debug!("layer {:?}: {} queued", self.id, self.draw_queue.len());

        let mut ctx = DrawContext::new(renderer, cache, camera.view_projection());
        for &id in &self.draw_queue {
            graph.draw_node(id, &mut ctx);
        }
    }

    // ========================================================================
    // Picking (world space, topmost first)
    // ========================================================================

    fn picks(&self, graph: &NodeGraph, test: &dyn Fn(&Node) -> bool, first: bool) -> Vec<NodeId> {
        let mut hits = Vec::new();
        for &id in self.draw_queue.iter().rev() {
            graph.collect_picks(id, test, &mut hits);
            if first && !hits.is_empty() {
                hits.truncate(1);
                break;
            }
        }
        hits
    }

    /// Topmost node under `world`, based on the last draw.
    pub fn pick_node(&self, graph: &NodeGraph, world: Vec2) -> Option<NodeId> {
        self.picks(graph, &|node| point_hits(node, world), true).into_iter().next()
    }

    pub fn pick_nodes(&self, graph: &NodeGraph, world: Vec2) -> Vec<NodeId> {
        self.picks(graph, &|node| point_hits(node, world), false)
    }

    /// Nodes overlapping the convex polygon `edges`.
    pub fn pick_nodes_in_shape(&self, graph: &NodeGraph, edges: &[Vec2]) -> Vec<NodeId> {
        self.picks(
            graph,
            &|node| {
                let inverse = node.inverse_transform();
                let local: Vec<Vec2> = edges.iter().map(|&p| transform_point2(&inverse, p)).collect();
                node.drawables()
                    .iter()
                    .any(|s| s.visible && s.drawable.shape_overlaps(&local))
            },
            false,
        )
    }
}

fn point_hits(node: &Node, world: Vec2) -> bool {
    let local = transform_point2(&node.inverse_transform(), world);
    node.drawables().iter().any(|s| s.visible && s.drawable.point_on(local))
}
