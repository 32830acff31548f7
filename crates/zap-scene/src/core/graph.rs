//! Node arena and the walks over it: attach/detach, update, traversal
//! into a draw queue, dispatch and picking.

use glam::{Mat4, Vec2};
use slotmap::SlotMap;

use crate::api::types::{LayerId, NodeId, ParentRef};
use crate::components::drawable::DrawContext;
use crate::components::node::Node;
use crate::core::geometry::transform_point2;
use crate::renderer::camera::Camera;
use crate::renderer::traits::Renderer;

/// Shared state of one traversal.
pub(crate) struct Visit<'a> {
    pub queue: &'a mut Vec<NodeId>,
    pub camera: &'a Camera,
    pub renderer: &'a dyn Renderer,
}

/// Owns every node; parents and children refer to each other by id.
#[derive(Debug, Default)]
pub struct NodeGraph {
    nodes: SlotMap<NodeId, Node>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standalone node with default state.
    pub fn create_node(&mut self) -> NodeId {
        self.insert(Node::new())
    }

    pub fn insert(&mut self, node: Node) -> NodeId {
        self.nodes.insert(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn z(&self, id: NodeId) -> f32 {
        self.nodes.get(id).map_or(0.0, |n| n.z)
    }

    fn parent_node(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent?.node()
    }

    /// Whether `ancestor` is above `id` in the tree.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent_node(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent_node(parent);
        }
        false
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Attach `child` under `parent`. Fails when the child already has a
    /// parent or the link would form a cycle. While `parent` is being
    /// traversed the child is staged and shows up on unlock.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent == child || self.is_ancestor(child, parent) {
            return false;
        }
        match self.nodes.get(child) {
            Some(node) if node.parent.is_none() => {}
            _ => return false,
        }
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return false;
        };
        if !parent_node.children.add(child) {
            return false;
        }
        let parent_transform = parent_node.transform();
        let layer = parent_node.layer;

        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(ParentRef::Node(parent));
            node.update_transform(parent_transform);
        }
        self.set_layer(child, layer);
        true
    }

    /// Detach `child` if `parent` is its parent.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent_node(child) != Some(parent) {
            return false;
        }
        self.remove_from_parent(child)
    }

    /// Detach `id` from whatever holds it. Layer references are cleared
    /// through the whole subtree first. A layer drops a detached root from
    /// its list on its next traversal.
    pub fn remove_from_parent(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) else {
            return false;
        };
        self.set_layer(id, None);
        if let ParentRef::Node(parent) = parent {
            if let Some(parent) = self.nodes.get_mut(parent) {
                parent.children.remove(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
            node.update_transform(Mat4::IDENTITY);
        }
        true
    }

    /// Detach `id` and free it together with all of its descendants.
    pub fn destroy_node(&mut self, id: NodeId) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        self.remove_from_parent(id);
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(id) {
                stack.extend(node.children.resolved());
            }
        }
        true
    }

    /// Set the layer of `id` and everything below it, staged children included.
    pub(crate) fn set_layer(&mut self, id: NodeId, layer: Option<LayerId>) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(id) {
                node.layer = layer;
                stack.extend(node.children.resolved());
            }
        }
    }

    /// Attach `id` as a root of `layer`. The layer's own list is managed by the scene.
    pub(crate) fn attach_to_layer(&mut self, id: NodeId, layer: LayerId) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) if node.parent.is_none() => {
                node.parent = Some(ParentRef::Layer(layer));
                node.update_transform(Mat4::IDENTITY);
            }
            _ => return false,
        }
        self.set_layer(id, Some(layer));
        true
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Tick the animator and drawables of `id`, then its children, depth
    /// first. The children are locked for the duration, so structural
    /// changes made by animators appear once this node is done.
    pub(crate) fn update_node(&mut self, id: NodeId, delta: f32) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.children.lock();
        for slot in node.drawables_mut() {
            slot.drawable.update(delta);
        }

        if let Some(mut animator) = node.take_animator() {
            animator.update(id, self, delta);
            if !animator.is_done() {
                if let Some(node) = self.nodes.get_mut(id) {
                    // a replacement installed during the update wins
                    if node.animator.is_none() {
                        node.animator = Some(animator);
                    }
                }
            }
        }

        let children = self
            .nodes
            .get(id)
            .map(|n| n.children.as_slice().to_vec())
            .unwrap_or_default();
        for child in children {
            self.update_node(child, delta);
        }

        if let Some(node) = self.nodes.get_mut(id) {
            node.children.unlock();
        }
    }

    // ========================================================================
    // Traversal and dispatch
    // ========================================================================

    /// Drawn by its parent instead of being queued.
    fn is_embedded(&self, id: NodeId) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| n.visible && n.has_children() && !n.global_order)
    }

    fn passes_visibility(node: &Node, transform: &Mat4, visit: &Visit<'_>) -> bool {
        node.drawables().iter().filter(|s| s.visible).any(|slot| {
            let bounds = slot.drawable.bounding_box();
            bounds.is_empty() || visit.renderer.check_visibility(transform, &bounds, visit.camera)
        })
    }

    /// Walk the subtree under `id`, queueing the nodes that dispatch draws.
    pub(crate) fn visit(
        &mut self,
        id: NodeId,
        visit: &mut Visit<'_>,
        parent_transform: Mat4,
        parent_transform_dirty: bool,
        parent_opacity: f32,
        root: bool,
    ) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if parent_transform_dirty {
            node.update_transform(parent_transform);
        }
        node.set_world_opacity(parent_opacity);
        if !node.visible {
            return;
        }

        let transform = node.transform();
        let children_dirty = parent_transform_dirty || node.children_transform_dirty();
        let opacity = node.world_opacity();

        let mut children = node.children.as_slice().to_vec();
        children.sort_by(|a, b| self.z(*b).total_cmp(&self.z(*a)));
        if let Some(node) = self.nodes.get_mut(id) {
            node.children.set_order(children.clone());
            node.children.lock();
        }

        let (behind, front): (Vec<NodeId>, Vec<NodeId>) = children.iter().partition(|&&c| self.z(c) < 0.0);
        let has_embedded = children.iter().any(|&c| self.is_embedded(c));

        for child in behind {
            self.visit(child, visit, transform, children_dirty, opacity, false);
        }

        if let Some(node) = self.nodes.get(id) {
            let eligible = !node.has_children() || node.global_order || root;
            if eligible && (has_embedded || Self::passes_visibility(node, &transform, visit)) {
                visit.queue.push(id);
            }
        }

        for child in front {
            self.visit(child, visit, transform, children_dirty, opacity, false);
        }

        if let Some(node) = self.nodes.get_mut(id) {
            node.clear_children_transform_dirty();
            node.children.unlock();
        }
    }

    fn embedded_children(&self, id: NodeId) -> (Vec<NodeId>, Vec<NodeId>) {
        self.nodes
            .get(id)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|&c| self.is_embedded(c))
                    .partition(|&c| self.z(c) < 0.0)
            })
            .unwrap_or_default()
    }

    /// Draw a queued node: embedded children behind it, its own visible
    /// drawables in attachment order, then embedded children in front.
    pub fn draw_node(&mut self, id: NodeId, ctx: &mut DrawContext<'_>) {
        let (behind, front) = self.embedded_children(id);
        for child in behind {
            self.draw_node(child, ctx);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            let transform = node.transform();
            let tint = node.tint();
            for slot in node.drawables_mut().iter_mut().filter(|s| s.visible) {
                slot.drawable.draw(ctx, &transform, tint);
            }
        }
        for child in front {
            self.draw_node(child, ctx);
        }
    }

    // ========================================================================
    // Picking
    // ========================================================================

    /// Collect hits under a queued node, topmost first. Embedded children
    /// take part since they are drawn with it.
    pub(crate) fn collect_picks(&self, id: NodeId, test: &dyn Fn(&Node) -> bool, hits: &mut Vec<NodeId>) {
        let (behind, front) = self.embedded_children(id);
        for &child in front.iter().rev() {
            self.collect_picks(child, test, hits);
        }
        if let Some(node) = self.nodes.get(id) {
            if node.pickable && node.visible && test(node) {
                hits.push(id);
            }
        }
        for &child in behind.iter().rev() {
            self.collect_picks(child, test, hits);
        }
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// World transform of `id`, pulling in ancestor changes made since the
    /// last traversal.
    pub fn world_transform(&self, id: NodeId) -> Option<Mat4> {
        let node = self.nodes.get(id)?;
        if let Some(parent) = node.parent.and_then(ParentRef::node) {
            if let Some(parent_transform) = self.world_transform(parent) {
                if node.parent_transform() != parent_transform {
                    node.update_transform(parent_transform);
                }
            }
        }
        Some(node.transform())
    }

    pub fn convert_world_to_local(&self, id: NodeId, world: Vec2) -> Option<Vec2> {
        self.world_transform(id)?;
        let node = self.nodes.get(id)?;
        Some(transform_point2(&node.inverse_transform(), world))
    }

    pub fn convert_local_to_world(&self, id: NodeId, local: Vec2) -> Option<Vec2> {
        Some(transform_point2(&self.world_transform(id)?, local))
    }

    /// Origin of `id` in world space.
    pub fn world_position(&self, id: NodeId) -> Option<Vec2> {
        self.convert_local_to_world(id, Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::animator::Animator;
    use crate::components::drawable::tests::Probe;
    use crate::renderer::headless::HeadlessRenderer;

    fn probe() -> Probe {
        Probe::with_bounds(Vec2::splat(-1.0), Vec2::splat(1.0))
    }

    fn draws(graph: &NodeGraph, id: NodeId) -> usize {
        graph.node(id).unwrap().drawable::<Probe>(0).unwrap().draws.len()
    }

    fn traverse(graph: &mut NodeGraph, root: NodeId) -> Vec<NodeId> {
        let camera = Camera::new(Vec2::new(100.0, 100.0));
        let renderer = HeadlessRenderer::new();
        let mut queue = Vec::new();
        let mut visit = Visit {
            queue: &mut queue,
            camera: &camera,
            renderer: &renderer,
        };
        graph.visit(root, &mut visit, Mat4::IDENTITY, false, 1.0, true);
        queue
    }

    #[test]
    fn single_parent() {
        let mut graph = NodeGraph::new();
        let a = graph.create_node();
        let b = graph.create_node();
        let child = graph.create_node();
        assert!(graph.add_child(a, child));
        assert!(!graph.add_child(b, child));
        assert_eq!(graph.node(child).unwrap().parent(), Some(ParentRef::Node(a)));
        assert!(graph.node(b).unwrap().children().is_empty());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut graph = NodeGraph::new();
        let a = graph.create_node();
        let b = graph.create_node();
        assert!(graph.add_child(a, b));
        assert!(!graph.add_child(b, a));
        assert!(!graph.add_child(a, a));
        assert!(graph.is_ancestor(a, b));
    }

    #[test]
    fn remove_child_checks_parent() {
        let mut graph = NodeGraph::new();
        let a = graph.create_node();
        let b = graph.create_node();
        let c = graph.create_node();
        graph.add_child(a, c);
        assert!(!graph.remove_child(b, c));
        assert!(graph.remove_child(a, c));
        assert!(graph.node(c).unwrap().parent().is_none());
        assert!(!graph.remove_from_parent(c));
        // free to join another parent now
        assert!(graph.add_child(b, c));
    }

    #[test]
    fn destroy_frees_subtree() {
        let mut graph = NodeGraph::new();
        let root = graph.create_node();
        let a = graph.create_node();
        let b = graph.create_node();
        graph.add_child(root, a);
        graph.add_child(a, b);
        assert!(graph.destroy_node(a));
        assert!(!graph.contains(a));
        assert!(!graph.contains(b));
        assert!(graph.node(root).unwrap().children().is_empty());
        assert!(!graph.destroy_node(a));
    }

    #[test]
    fn world_conversions_follow_ancestors() {
        let mut graph = NodeGraph::new();
        let parent = graph.insert(Node::new().with_position(Vec2::new(10.0, 0.0)));
        let child = graph.insert(Node::new().with_position(Vec2::new(5.0, 0.0)));
        graph.add_child(parent, child);
        assert_eq!(graph.world_position(child), Some(Vec2::new(15.0, 0.0)));

        graph.node_mut(parent).unwrap().set_position(Vec2::new(0.0, 3.0));
        assert_eq!(graph.world_position(child), Some(Vec2::new(5.0, 3.0)));
        let local = graph.convert_world_to_local(child, Vec2::new(6.0, 4.0)).unwrap();
        assert!((local - Vec2::new(1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn visit_queues_leaves_and_root() {
        let mut graph = NodeGraph::new();
        let root = graph.insert(Node::new().with_drawable(probe()));
        let a = graph.insert(Node::new().with_drawable(probe()));
        let b = graph.insert(Node::new().with_drawable(probe()).with_z(-1.0));
        graph.add_child(root, a);
        graph.add_child(root, b);

        let queue = traverse(&mut graph, root);
        assert_eq!(queue.len(), 3);
        assert!(queue.contains(&root));
    }

    #[test]
    fn hidden_subtree_is_skipped() {
        let mut graph = NodeGraph::new();
        let root = graph.insert(Node::new().with_drawable(probe()));
        let hidden = graph.insert(Node::new().with_drawable(probe()));
        let below = graph.insert(Node::new().with_drawable(probe()));
        graph.add_child(root, hidden);
        graph.add_child(hidden, below);
        graph.node_mut(hidden).unwrap().visible = false;

        assert_eq!(traverse(&mut graph, root), vec![root]);
    }

    #[test]
    fn culled_leaf_is_not_queued() {
        let mut graph = NodeGraph::new();
        let root = graph.create_node();
        let far = graph.insert(Node::new().with_drawable(probe()).with_position(Vec2::new(1000.0, 0.0)));
        graph.add_child(root, far);
        assert!(traverse(&mut graph, root).is_empty());
    }

    #[test]
    fn children_inherit_transform_and_opacity() {
        let mut graph = NodeGraph::new();
        let root = graph.insert(Node::new().with_position(Vec2::new(4.0, 0.0)));
        let child = graph.insert(Node::new().with_drawable(probe()));
        graph.add_child(root, child);
        graph.node_mut(root).unwrap().set_opacity(0.5);
        graph.node_mut(root).unwrap().set_position(Vec2::new(8.0, 0.0));

        traverse(&mut graph, root);
        let node = graph.node(child).unwrap();
        assert!((node.world_opacity() - 0.5).abs() < 1e-6);
        assert_eq!(node.parent_transform().w_axis.x, 8.0);
    }

    #[test]
    fn embedded_children_draw_once() {
        let mut graph = NodeGraph::new();
        let root = graph.create_node();
        let middle = graph.insert(Node::new().with_drawable(probe()));
        let leaf = graph.insert(Node::new().with_drawable(probe()));
        graph.add_child(root, middle);
        graph.add_child(middle, leaf);

        let queue = traverse(&mut graph, root);
        assert!(!queue.contains(&middle));
        assert!(queue.contains(&root));
        assert!(queue.contains(&leaf));

        let mut renderer = HeadlessRenderer::new();
        let mut ctx = DrawContext::new(&mut renderer, None, Mat4::IDENTITY);
        for id in queue {
            graph.draw_node(id, &mut ctx);
        }
        assert_eq!(draws(&graph, middle), 1);
        assert_eq!(draws(&graph, leaf), 1);
    }

    #[derive(Debug)]
    struct Adopt(NodeId);

    impl Animator for Adopt {
        fn update(&mut self, node: NodeId, graph: &mut NodeGraph, _delta: f32) {
            assert!(graph.add_child(node, self.0));
            // staged while the node's children are locked
            assert!(!graph.node(node).unwrap().children().contains(self.0));
            assert_eq!(graph.node(self.0).unwrap().parent(), Some(ParentRef::Node(node)));
        }

        fn is_done(&self) -> bool {
            true
        }
    }

    #[test]
    fn add_during_update_lands_on_unlock() {
        let mut graph = NodeGraph::new();
        let parent = graph.create_node();
        let child = graph.create_node();
        graph.node_mut(parent).unwrap().set_animator(Adopt(child));

        graph.update_node(parent, 0.1);
        let node = graph.node(parent).unwrap();
        assert!(node.children().contains(child));
        assert!(!node.has_animator());
    }

    #[test]
    fn update_ticks_drawables_in_subtree() {
        let mut graph = NodeGraph::new();
        let root = graph.create_node();
        let child = graph.insert(Node::new().with_drawable(probe()));
        graph.add_child(root, child);
        graph.update_node(root, 0.25);
        let elapsed = graph.node(child).unwrap().drawable::<Probe>(0).unwrap().elapsed;
        assert!((elapsed - 0.25).abs() < 1e-6);
    }
}
