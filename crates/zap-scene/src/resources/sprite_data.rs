//! Sprite frames and animations, either cut from a grid or read from an atlas.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Vec2, Vec3};

use super::texture::Texture;
use crate::core::geometry::{Aabb, Rect};
use crate::renderer::traits::BlendMode;
use crate::renderer::vertex::Vertex;

/// Quad index order shared by every rectangular frame.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 1, 3, 2];

/// Default seconds per frame.
pub const DEFAULT_FRAME_INTERVAL: f32 = 0.1;

/// One frame of a sprite: a mesh in pixel units around the pivot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteFrame {
    pub name: String,
    pub bounding_box: Aabb,
    pub indices: Vec<u16>,
    pub vertices: Vec<Vertex>,
}

impl SpriteFrame {
    /// Quad for `frame` (texels, Y down) inside a texture of `texture_size`.
    ///
    /// A `rotated` frame is stored 90 degrees clockwise in the atlas, so its
    /// texel extent is `frame.size` swapped.
    pub fn from_rect(
        name: impl Into<String>,
        texture_size: Vec2,
        frame: Rect,
        rotated: bool,
        source_size: Vec2,
        source_offset: Vec2,
        pivot: Vec2,
    ) -> Self {
        let offset = final_offset(frame.size, source_size, source_offset, pivot);
        let left_top = frame.position / texture_size;

        let tex_coords = if rotated {
            let right_bottom = Vec2::new(
                (frame.position.x + frame.size.y) / texture_size.x,
                (frame.position.y + frame.size.x) / texture_size.y,
            );
            [
                left_top,
                Vec2::new(left_top.x, right_bottom.y),
                Vec2::new(right_bottom.x, left_top.y),
                right_bottom,
            ]
        } else {
            let right_bottom = (frame.position + frame.size) / texture_size;
            [
                Vec2::new(left_top.x, right_bottom.y),
                right_bottom,
                left_top,
                Vec2::new(right_bottom.x, left_top.y),
            ]
        };

        let corners = [
            offset,
            offset + Vec2::new(frame.size.x, 0.0),
            offset + Vec2::new(0.0, frame.size.y),
            offset + frame.size,
        ];
        let vertices = corners
            .iter()
            .zip(tex_coords)
            .map(|(corner, uv)| Vertex::sprite(corner.extend(0.0), uv))
            .collect();

        Self {
            name: name.into(),
            bounding_box: Aabb::from_rect(offset, offset + frame.size),
            indices: QUAD_INDICES.to_vec(),
            vertices,
        }
    }

    /// Frame from an explicit polygon; the box is fitted to the vertices.
    pub fn from_mesh(name: impl Into<String>, indices: Vec<u16>, vertices: Vec<Vertex>) -> Self {
        let bounding_box = Aabb::from_points(vertices.iter().map(|v| {
            let p = v.position();
            Vec3::new(p.x, p.y, 0.0)
        }));
        Self {
            name: name.into(),
            bounding_box,
            indices,
            vertices,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Offset of the frame's bottom-left corner from the pivot, in pixels.
/// `source_offset` is measured from the top-left of the untrimmed image.
pub fn final_offset(frame_size: Vec2, source_size: Vec2, source_offset: Vec2, pivot: Vec2) -> Vec2 {
    Vec2::new(
        -source_size.x * pivot.x + source_offset.x,
        -source_size.y * pivot.y + (source_size.y - frame_size.y - source_offset.y),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteAnimation {
    pub name: String,
    pub frames: Vec<SpriteFrame>,
    pub frame_interval: f32,
}

impl Default for SpriteAnimation {
    fn default() -> Self {
        Self {
            name: String::new(),
            frames: Vec::new(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

impl SpriteAnimation {
    /// Playback length in seconds.
    pub fn length(&self) -> f32 {
        self.frames.len() as f32 * self.frame_interval
    }
}

/// Frames and texture for a sprite. The unnamed animation `""` is the
/// one loaders produce.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteData {
    pub texture: Option<Arc<Texture>>,
    pub animations: HashMap<String, SpriteAnimation>,
    pub blend_mode: BlendMode,
    /// Shader override by name; `None` uses the textured default.
    pub shader: Option<String>,
}

impl SpriteData {
    /// Cut `texture` into a `sprites_x` by `sprites_y` grid, column-major.
    /// Zero counts are treated as one.
    pub fn from_grid(texture: Arc<Texture>, sprites_x: u32, sprites_y: u32, pivot: Vec2) -> Self {
        let sprites_x = sprites_x.max(1);
        let sprites_y = sprites_y.max(1);
        let size = texture.size().as_vec2();
        let sprite_size = Vec2::new(size.x / sprites_x as f32, size.y / sprites_y as f32);

        let mut animation = SpriteAnimation::default();
        animation.frames.reserve((sprites_x * sprites_y) as usize);
        for x in 0..sprites_x {
            for y in 0..sprites_y {
                let rect = Rect::new(
                    sprite_size.x * x as f32,
                    sprite_size.y * y as f32,
                    sprite_size.x,
                    sprite_size.y,
                );
                animation
                    .frames
                    .push(SpriteFrame::from_rect("", size, rect, false, sprite_size, Vec2::ZERO, pivot));
            }
        }

        let mut animations = HashMap::new();
        animations.insert(String::new(), animation);
        Self {
            texture: Some(texture),
            animations,
            blend_mode: BlendMode::Alpha,
            shader: None,
        }
    }

    pub fn animation(&self, name: &str) -> Option<&SpriteAnimation> {
        self.animations.get(name)
    }

    /// Frames in the default animation.
    pub fn frame_count(&self) -> usize {
        self.animations.get("").map_or(0, |a| a.frames.len())
    }
}
