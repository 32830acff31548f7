//! Bitmap font metrics and text mesh generation.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Vec2, Vec3};

use super::texture::Texture;
use crate::core::color::Color;
use crate::renderer::vertex::Vertex;

/// Placement of one glyph in the font page, in texels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Glyph {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub x_advance: f32,
    pub page: u32,
}

/// Geometry for a run of text, ready to upload as one mesh.
#[derive(Debug, Clone, Default)]
pub struct TextMesh {
    pub indices: Vec<u16>,
    pub vertices: Vec<Vertex>,
    pub texture: Option<Arc<Texture>>,
}

/// BMFont-style bitmap font.
#[derive(Debug, Clone, Default)]
pub struct Font {
    pub line_height: u16,
    pub base: u16,
    /// Page size in texels.
    pub width: u16,
    pub height: u16,
    pub pages: u16,
    pub outline: u16,
    pub glyphs: HashMap<u32, Glyph>,
    pub kerning: HashMap<(u32, u32), i16>,
    pub texture: Option<Arc<Texture>>,
}

impl Font {
    pub fn kerning_pair(&self, first: u32, second: u32) -> i16 {
        self.kerning.get(&(first, second)).copied().unwrap_or(0)
    }

    /// Build quads for `text`.
    ///
    /// Lines are shifted left by `line_width * anchor.x`; the block is moved
    /// up by `text_height * (1 - anchor.y)`, then everything is scaled by
    /// `font_size`. Four vertices and six indices per known glyph.
    pub fn render_data(&self, text: &str, color: Color, font_size: f32, anchor: Vec2) -> TextMesh {
        let chars: Vec<u32> = text.chars().map(u32::from).collect();
        let mut indices = Vec::with_capacity(chars.len() * 6);
        let mut vertices: Vec<Vertex> = Vec::with_capacity(chars.len() * 4);

        let page_size = Vec2::new(f32::from(self.width.max(1)), f32::from(self.height.max(1)));
        let normal = Vec3::new(0.0, 0.0, -1.0);
        let mut position = Vec2::ZERO;
        let mut first_vertex = 0;

        for (i, &c) in chars.iter().enumerate() {
            if let Some(g) = self.glyphs.get(&c) {
                let start = vertices.len() as u16;
                indices.extend_from_slice(&[start, start + 1, start + 2, start + 1, start + 3, start + 2]);

                let left_top = Vec2::new(g.x, g.y) / page_size;
                let right_bottom = Vec2::new(g.x + g.width, g.y + g.height) / page_size;

                let left = position.x + g.x_offset;
                let right = left + g.width;
                let top = -position.y - g.y_offset;
                let bottom = top - g.height;

                vertices.push(Vertex::new(Vec3::new(left, bottom, 0.0), color, Vec2::new(left_top.x, right_bottom.y), normal));
                vertices.push(Vertex::new(Vec3::new(right, bottom, 0.0), color, right_bottom, normal));
                vertices.push(Vertex::new(Vec3::new(left, top, 0.0), color, left_top, normal));
                vertices.push(Vertex::new(Vec3::new(right, top, 0.0), color, Vec2::new(right_bottom.x, left_top.y), normal));

                if let Some(&next) = chars.get(i + 1) {
                    position.x += f32::from(self.kerning_pair(c, next));
                }
                position.x += g.x_advance;
            }

            if c == u32::from('\n') || i + 1 == chars.len() {
                let line_width = position.x;
                position.x = 0.0;
                position.y += f32::from(self.line_height);

                for vertex in &mut vertices[first_vertex..] {
                    vertex.position[0] -= line_width * anchor.x;
                }
                first_vertex = vertices.len();
            }
        }

        let text_height = position.y;
        for vertex in &mut vertices {
            vertex.position[1] += text_height * (1.0 - anchor.y);
            vertex.position[0] *= font_size;
            vertex.position[1] *= font_size;
        }

        TextMesh {
            indices,
            vertices,
            texture: self.texture.clone(),
        }
    }

    /// Unscaled advance width of the widest line.
    pub fn string_width(&self, text: &str) -> f32 {
        text.split('\n')
            .map(|line| {
                let chars: Vec<u32> = line.chars().map(u32::from).collect();
                chars
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &c)| {
                        let g = self.glyphs.get(&c)?;
                        let kern = chars.get(i + 1).map_or(0, |&n| self.kerning_pair(c, n));
                        Some(g.x_advance + f32::from(kern))
                    })
                    .sum::<f32>()
            })
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> Font {
        let mut font = Font {
            line_height: 10,
            width: 100,
            height: 100,
            ..Default::default()
        };
        for (c, x) in [('A', 0.0), ('B', 10.0)] {
            font.glyphs.insert(
                u32::from(c),
                Glyph {
                    x,
                    y: 0.0,
                    width: 8.0,
                    height: 10.0,
                    x_advance: 9.0,
                    ..Default::default()
                },
            );
        }
        font.kerning.insert((u32::from('A'), u32::from('B')), -1);
        font
    }

    #[test]
    fn four_vertices_six_indices_per_glyph() {
        let mesh = font().render_data("AB", Color::WHITE, 1.0, Vec2::ZERO);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.indices, vec![0, 1, 2, 1, 3, 2, 4, 5, 6, 5, 7, 6]);
    }

    #[test]
    fn kerning_shifts_next_glyph() {
        let mesh = font().render_data("AB", Color::WHITE, 1.0, Vec2::ZERO);
        // second glyph starts at advance 9 minus kerning 1
        assert!((mesh.vertices[4].position[0] - 8.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_glyphs_are_skipped() {
        let mesh = font().render_data("A?", Color::WHITE, 1.0, Vec2::ZERO);
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn center_anchor_centers_line() {
        let mesh = font().render_data("A", Color::WHITE, 2.0, Vec2::new(0.5, 0.5));
        // line width 9, shifted by 4.5, scaled by 2
        assert!((mesh.vertices[0].position[0] + 9.0).abs() < 1e-6);
        // text height 10, moved up by 5: bottom -10 + 5 = -5, scaled by 2
        assert!((mesh.vertices[0].position[1] + 10.0).abs() < 1e-6);
        assert!((mesh.vertices[2].position[1] - 10.0).abs() < 1e-6);
    }

    #[test]
    fn line_feed_moves_down() {
        let mesh = font().render_data("A\nA", Color::WHITE, 1.0, Vec2::ZERO);
        assert_eq!(mesh.vertices.len(), 8);
        let first_top = mesh.vertices[2].position[1];
        let second_top = mesh.vertices[6].position[1];
        assert!((first_top - second_top - 10.0).abs() < 1e-6);
    }

    #[test]
    fn string_width_applies_kerning() {
        assert!((font().string_width("AB") - 17.0).abs() < 1e-6);
        assert!((font().string_width("A\nAB") - 17.0).abs() < 1e-6);
    }
}
