use std::any::Any;

use glam::{Mat4, Vec2, Vec4};

use super::drawable::{upload_mesh, DrawContext, Drawable};
use crate::assets::cache::Cache;
use crate::core::color::Color;
use crate::core::geometry::Aabb;
use crate::renderer::traits::{BlendMode, DrawMode, MeshBufferHandle};
use crate::resources::{Font, TextMesh, SHADER_TEXTURE};

/// Bitmap-font label. The mesh is rebuilt whenever text, size, anchor or
/// color change, and uploaded on the next draw.
#[derive(Debug)]
pub struct TextRenderer {
    font: Font,
    text: String,
    font_size: f32,
    anchor: Vec2,
    color: Color,
    pub blend_mode: BlendMode,
    mesh: TextMesh,
    bounding_box: Aabb,
    buffer: Option<MeshBufferHandle>,
}

impl TextRenderer {
    /// Label centered on the node origin.
    pub fn new(font: Font, text: impl Into<String>) -> Self {
        let mut renderer = Self {
            font,
            text: text.into(),
            font_size: 1.0,
            anchor: Vec2::splat(0.5),
            color: Color::WHITE,
            blend_mode: BlendMode::Alpha,
            mesh: TextMesh::default(),
            bounding_box: Aabb::EMPTY,
            buffer: None,
        };
        renderer.rebuild();
        renderer
    }

    pub fn from_cache(cache: &Cache, font: &str, text: impl Into<String>) -> Option<Self> {
        let font = cache.with_font(font, Font::clone)?;
        Some(Self::new(font, text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.rebuild();
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn set_font_size(&mut self, font_size: f32) {
        self.font_size = font_size;
        self.rebuild();
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// `(0, 0)` puts the bottom-left corner of the text block on the origin.
    pub fn set_anchor(&mut self, anchor: Vec2) {
        self.anchor = anchor;
        self.rebuild();
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.mesh = self
            .font
            .render_data(&self.text, self.color, self.font_size, self.anchor);
        self.bounding_box = Aabb::from_points(self.mesh.vertices.iter().map(|v| v.position()));
        self.buffer = None;
    }
}

impl Drawable for TextRenderer {
    fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>, transform: &Mat4, tint: Vec4) {
        if self.mesh.indices.is_empty() {
            return;
        }
        let buffer = *self
            .buffer
            .get_or_insert_with(|| upload_mesh(&mut *ctx.renderer, &self.mesh.indices, &self.mesh.vertices));

        ctx.activate_shader(SHADER_TEXTURE);
        ctx.renderer.activate_blend_mode(self.blend_mode);
        ctx.renderer
            .activate_texture(self.mesh.texture.as_ref().map(|t| t.handle()), 0);
        let mvp = ctx.model_view_projection(transform);
        ctx.renderer.set_uniforms(&mvp, tint);
        ctx.renderer
            .draw_mesh_buffer(buffer, self.mesh.indices.len() as u32, DrawMode::TriangleList);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
