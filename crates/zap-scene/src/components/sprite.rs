//! Animated sprite drawable.
//!
//! Playback walks a queue of animations. A repeating entry loops in place;
//! a non-repeating one hands the leftover time to the next entry, and the
//! last one holds its final frame.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::drawable::{upload_mesh, DrawContext, Drawable};
use crate::assets::cache::Cache;
use crate::core::color::Color;
use crate::core::geometry::Aabb;
use crate::renderer::traits::{BlendMode, DrawMode, MeshBufferHandle};
use crate::resources::{SpriteAnimation, SpriteData, SpriteFrame, Texture, SHADER_TEXTURE};

/// Playback notifications, drained with [`Sprite::take_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteEvent {
    Start(String),
    Finish(String),
    Reset(String),
}

#[derive(Debug, Clone)]
struct QueuedAnimation {
    name: String,
    repeat: bool,
}

#[derive(Debug)]
pub struct Sprite {
    texture: Option<Arc<Texture>>,
    pub blend_mode: BlendMode,
    pub shader: String,
    animations: HashMap<String, SpriteAnimation>,
    queue: Vec<QueuedAnimation>,
    /// Index into `queue`; equal to its length once playback ran off the end.
    current: usize,
    current_time: f32,
    playing: bool,
    running: bool,
    offset: Vec2,
    pub color: Color,
    pub opacity: f32,
    events: Vec<SpriteEvent>,
    meshes: HashMap<(String, usize), MeshBufferHandle>,
}

impl Sprite {
    /// Sprite showing the unnamed animation of `data`, paused at its start.
    pub fn new(data: SpriteData) -> Self {
        Self {
            texture: data.texture,
            blend_mode: data.blend_mode,
            shader: data.shader.unwrap_or_else(|| SHADER_TEXTURE.to_string()),
            animations: data.animations,
            queue: vec![QueuedAnimation {
                name: String::new(),
                repeat: false,
            }],
            current: 0,
            current_time: 0.0,
            playing: false,
            running: false,
            offset: Vec2::ZERO,
            color: Color::WHITE,
            opacity: 1.0,
            events: Vec::new(),
            meshes: HashMap::new(),
        }
    }

    /// Cut `texture` into a grid of frames.
    pub fn from_texture(texture: Arc<Texture>, sprites_x: u32, sprites_y: u32, pivot: Vec2) -> Self {
        Self::new(SpriteData::from_grid(texture, sprites_x, sprites_y, pivot))
    }

    /// Sprite data named `name`, or else a whole texture of that name
    /// centered on its pivot.
    pub fn from_cache(cache: &Cache, name: &str) -> Option<Self> {
        if let Some(data) = cache.sprite_data(name) {
            return Some(Self::new(data));
        }
        let texture = cache.texture(name)?;
        Some(Self::from_texture(texture, 1, 1, Vec2::splat(0.5)))
    }

    pub fn texture(&self) -> Option<&Arc<Texture>> {
        self.texture.as_ref()
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// False once a non-repeating queue has finished.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.running = true;
        }
    }

    pub fn stop(&mut self, reset: bool) {
        self.playing = false;
        self.running = false;
        if reset {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.current_time = 0.0;
        self.running = true;
    }

    /// Replace the queue with `name`. Returns false for unknown animations.
    pub fn set_animation(&mut self, name: &str, repeat: bool) -> bool {
        if !self.has_animation(name) {
            return false;
        }
        self.queue.clear();
        self.queue.push(QueuedAnimation {
            name: name.to_string(),
            repeat,
        });
        self.current = 0;
        self.running = true;
        true
    }

    /// Append `name` to the queue.
    pub fn add_animation(&mut self, name: &str, repeat: bool) -> bool {
        if !self.has_animation(name) {
            return false;
        }
        self.queue.push(QueuedAnimation {
            name: name.to_string(),
            repeat,
        });
        self.running = true;
        true
    }

    /// Name of the animation being shown.
    pub fn current_animation(&self) -> Option<&str> {
        self.queue.get(self.current).map(|q| q.name.as_str())
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    fn queued_length(&self, index: usize) -> f32 {
        self.queue
            .get(index)
            .and_then(|q| self.animations.get(&q.name))
            .map_or(0.0, SpriteAnimation::length)
    }

    /// Seek to `progress` of the queue up to and including the first
    /// repeating entry.
    pub fn set_animation_progress(&mut self, progress: f32) {
        let mut total = 0.0;
        for (i, queued) in self.queue.iter().enumerate() {
            total += self.queued_length(i);
            if queued.repeat {
                break;
            }
        }
        self.set_animation_time(total * progress);
    }

    pub fn set_animation_time(&mut self, time: f32) {
        self.current_time = time;
        self.current = 0;
        while self.current < self.queue.len() {
            let length = self.queued_length(self.current);
            if length > 0.0 {
                if length > self.current_time {
                    break;
                }
                if self.queue[self.current].repeat {
                    self.current_time %= length;
                    break;
                }
                if self.current + 1 == self.queue.len() {
                    self.current_time = length;
                    break;
                }
                self.current_time -= length;
            }
            self.current += 1;
        }
        self.running = true;
    }

    /// Shift every frame by `offset` in node space.
    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Index of the frame shown at the current time.
    pub fn current_frame(&self) -> Option<usize> {
        let animation = self.current_animation().and_then(|name| self.animations.get(name))?;
        frame_index(animation, self.current_time)
    }

    fn frame(&self) -> Option<&SpriteFrame> {
        let animation = self.current_animation().and_then(|name| self.animations.get(name))?;
        animation.frames.get(frame_index(animation, self.current_time)?)
    }

    /// Events raised since the last call.
    pub fn take_events(&mut self) -> Vec<SpriteEvent> {
        std::mem::take(&mut self.events)
    }
}

fn frame_index(animation: &SpriteAnimation, time: f32) -> Option<usize> {
    if animation.frames.is_empty() {
        return None;
    }
    let index = if animation.frame_interval > 0.0 {
        (time / animation.frame_interval) as usize
    } else {
        0
    };
    Some(index.min(animation.frames.len() - 1))
}

impl Drawable for Sprite {
    fn bounding_box(&self) -> Aabb {
        match self.frame() {
            Some(frame) if !frame.bounding_box.is_empty() => {
                let shift = self.offset.extend(0.0);
                Aabb::new(frame.bounding_box.min + shift, frame.bounding_box.max + shift)
            }
            _ => Aabb::EMPTY,
        }
    }

    fn update(&mut self, delta: f32) {
        if !self.playing {
            return;
        }
        self.current_time += delta;

        while self.current < self.queue.len() {
            let length = self.queued_length(self.current);
            if length > 0.0 {
                if length > self.current_time {
                    break;
                }
                let queued = &self.queue[self.current];
                if queued.repeat {
                    self.current_time %= length;
                    self.events.push(SpriteEvent::Reset(queued.name.clone()));
                    break;
                }
                if self.running {
                    self.events.push(SpriteEvent::Finish(queued.name.clone()));
                }
                match self.queue.get(self.current + 1) {
                    None => {
                        self.current_time = length;
                        self.running = false;
                        break;
                    }
                    Some(next) => {
                        self.current_time -= length;
                        self.events.push(SpriteEvent::Start(next.name.clone()));
                    }
                }
            }
            self.current += 1;
        }
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>, transform: &Mat4, tint: Vec4) {
        let Some(queued) = self.queue.get(self.current) else {
            return;
        };
        let Some(animation) = self.animations.get(&queued.name) else {
            return;
        };
        if animation.frame_interval <= 0.0 {
            return;
        }
        let Some(index) = frame_index(animation, self.current_time) else {
            return;
        };
        let frame = &animation.frames[index];

        let buffer = *self
            .meshes
            .entry((queued.name.clone(), index))
            .or_insert_with(|| upload_mesh(&mut *ctx.renderer, &frame.indices, &frame.vertices));

        ctx.activate_shader(&self.shader);
        ctx.renderer.activate_blend_mode(self.blend_mode);
        ctx.renderer
            .activate_texture(self.texture.as_ref().map(|t| t.handle()), 0);

        let offset = Mat4::from_translation(Vec3::new(self.offset.x, self.offset.y, 0.0));
        let mvp = ctx.model_view_projection(transform) * offset;
        let mut color = tint * self.color.normalized();
        color.w *= self.opacity;
        ctx.renderer.set_uniforms(&mvp, color);
        ctx.renderer
            .draw_mesh_buffer(buffer, frame.index_count(), DrawMode::TriangleList);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
