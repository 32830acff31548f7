//! Scene node: local transform, cached world transform, drawables.
//!
//! Nodes live in a [`NodeGraph`](crate::core::graph::NodeGraph) arena and
//! refer to each other by id. Derived matrices are recomputed lazily on
//! read; setters only flip dirty flags.

use std::cell::Cell;

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::animator::Animator;
use super::drawable::Drawable;
use crate::api::types::{LayerId, ParentRef};
use crate::core::color::Color;
use crate::core::container::NodeContainer;
use crate::core::geometry::{inverse_or_identity, Aabb};

/// A drawable attached to a node, with its own visibility switch.
#[derive(Debug)]
pub struct DrawableSlot {
    pub drawable: Box<dyn Drawable>,
    pub visible: bool,
}

#[derive(Debug)]
pub struct Node {
    position: Vec2,
    /// Radians, counter-clockwise.
    rotation: f32,
    scale: Vec2,
    flip_x: bool,
    flip_y: bool,

    /// Draw-order key; higher z is drawn first.
    pub z: f32,
    /// Queue this node on its own even when it has children.
    pub global_order: bool,
    pub color: Color,
    opacity: f32,
    pub visible: bool,
    pub pickable: bool,

    parent_transform: Cell<Mat4>,
    local_transform: Cell<Mat4>,
    transform: Cell<Mat4>,
    inverse_transform: Cell<Mat4>,
    local_transform_dirty: Cell<bool>,
    transform_dirty: Cell<bool>,
    inverse_transform_dirty: Cell<bool>,
    children_transform_dirty: Cell<bool>,
    world_opacity: f32,

    drawables: Vec<DrawableSlot>,
    pub(crate) animator: Option<Box<dyn Animator>>,

    pub(crate) children: NodeContainer,
    pub(crate) parent: Option<ParentRef>,
    pub(crate) layer: Option<LayerId>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            flip_x: false,
            flip_y: false,
            z: 0.0,
            global_order: false,
            color: Color::WHITE,
            opacity: 1.0,
            visible: true,
            pickable: true,
            parent_transform: Cell::new(Mat4::IDENTITY),
            local_transform: Cell::new(Mat4::IDENTITY),
            transform: Cell::new(Mat4::IDENTITY),
            inverse_transform: Cell::new(Mat4::IDENTITY),
            local_transform_dirty: Cell::new(true),
            transform_dirty: Cell::new(true),
            inverse_transform_dirty: Cell::new(true),
            children_transform_dirty: Cell::new(true),
            world_opacity: 1.0,
            drawables: Vec::new(),
            animator: None,
            children: NodeContainer::new(),
            parent: None,
            layer: None,
        }
    }

    // -- Builders --

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.set_position(position);
        self
    }

    pub fn with_z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    pub fn with_drawable(mut self, drawable: impl Drawable + 'static) -> Self {
        self.add_drawable(Box::new(drawable));
        self
    }

    pub fn with_global_order(mut self, global_order: bool) -> Self {
        self.global_order = global_order;
        self
    }

    // -- Local transform --

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.mark_local_dirty();
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.mark_local_dirty();
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.mark_local_dirty();
    }

    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    pub fn set_flip_x(&mut self, flip: bool) {
        self.flip_x = flip;
        self.mark_local_dirty();
    }

    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    pub fn set_flip_y(&mut self, flip: bool) {
        self.flip_y = flip;
        self.mark_local_dirty();
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    /// Opacity multiplied down from the root during the last traversal.
    pub fn world_opacity(&self) -> f32 {
        self.world_opacity
    }

    pub(crate) fn set_world_opacity(&mut self, parent_opacity: f32) {
        self.world_opacity = parent_opacity * self.opacity;
    }

    /// Node color with the world opacity folded into alpha.
    pub fn tint(&self) -> Vec4 {
        let c = self.color.normalized();
        Vec4::new(c.x, c.y, c.z, c.w * self.world_opacity)
    }

    fn mark_local_dirty(&self) {
        self.local_transform_dirty.set(true);
        self.transform_dirty.set(true);
        self.inverse_transform_dirty.set(true);
    }

    // -- Derived transforms --

    /// Store a new parent transform; the local transform is untouched.
    pub fn update_transform(&self, parent: Mat4) {
        self.parent_transform.set(parent);
        self.transform_dirty.set(true);
        self.inverse_transform_dirty.set(true);
    }

    pub fn parent_transform(&self) -> Mat4 {
        self.parent_transform.get()
    }

    pub fn local_transform(&self) -> Mat4 {
        if self.local_transform_dirty.get() {
            let mut scale = self.scale;
            if self.flip_x {
                scale.x = -scale.x;
            }
            if self.flip_y {
                scale.y = -scale.y;
            }
            let local = Mat4::from_translation(self.position.extend(0.0))
                * Mat4::from_rotation_z(-self.rotation)
                * Mat4::from_scale(Vec3::new(scale.x, scale.y, 1.0));
            self.local_transform.set(local);
            self.local_transform_dirty.set(false);
        }
        self.local_transform.get()
    }

    /// World transform (parent times local).
    pub fn transform(&self) -> Mat4 {
        if self.transform_dirty.get() {
            let transform = self.parent_transform.get() * self.local_transform();
            self.transform.set(transform);
            self.transform_dirty.set(false);
            self.children_transform_dirty.set(true);
        }
        self.transform.get()
    }

    pub fn inverse_transform(&self) -> Mat4 {
        if self.inverse_transform_dirty.get() {
            self.inverse_transform.set(inverse_or_identity(&self.transform()));
            self.inverse_transform_dirty.set(false);
        }
        self.inverse_transform.get()
    }

    /// Whether children still have to be told about a changed transform.
    pub fn children_transform_dirty(&self) -> bool {
        self.children_transform_dirty.get()
    }

    pub(crate) fn clear_children_transform_dirty(&self) {
        self.children_transform_dirty.set(false);
    }

    // -- Drawables --

    /// Attach a drawable; returns its index.
    pub fn add_drawable(&mut self, drawable: Box<dyn Drawable>) -> usize {
        self.drawables.push(DrawableSlot {
            drawable,
            visible: true,
        });
        self.drawables.len() - 1
    }

    pub fn remove_drawable(&mut self, index: usize) -> Option<Box<dyn Drawable>> {
        (index < self.drawables.len()).then(|| self.drawables.remove(index).drawable)
    }

    pub fn drawables(&self) -> &[DrawableSlot] {
        &self.drawables
    }

    pub fn drawables_mut(&mut self) -> &mut [DrawableSlot] {
        &mut self.drawables
    }

    /// Drawable at `index` if it is a `T`.
    pub fn drawable<T: Drawable + 'static>(&self, index: usize) -> Option<&T> {
        self.drawables.get(index)?.drawable.as_any().downcast_ref()
    }

    pub fn drawable_mut<T: Drawable + 'static>(&mut self, index: usize) -> Option<&mut T> {
        self.drawables.get_mut(index)?.drawable.as_any_mut().downcast_mut()
    }

    pub fn set_drawable_visible(&mut self, index: usize, visible: bool) {
        if let Some(slot) = self.drawables.get_mut(index) {
            slot.visible = visible;
        }
    }

    /// Union of the visible drawables' bounds.
    pub fn bounding_box(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for slot in self.drawables.iter().filter(|s| s.visible) {
            bounds.merge(&slot.drawable.bounding_box());
        }
        bounds
    }

    // -- Animator --

    /// Replace the animator; the previous one is returned.
    pub fn set_animator(&mut self, animator: impl Animator + 'static) -> Option<Box<dyn Animator>> {
        self.animator.replace(Box::new(animator))
    }

    pub fn take_animator(&mut self) -> Option<Box<dyn Animator>> {
        self.animator.take()
    }

    pub fn has_animator(&self) -> bool {
        self.animator.is_some()
    }

    // -- Relationships --

    pub fn parent(&self) -> Option<ParentRef> {
        self.parent
    }

    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    pub fn children(&self) -> &NodeContainer {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
