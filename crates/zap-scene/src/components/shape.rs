//! Immediate-style debug geometry: lines, rectangles, polygons and circles.

use std::any::Any;
use std::f32::consts::TAU;

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::drawable::{upload_mesh, DrawContext, Drawable};
use crate::core::color::Color;
use crate::core::geometry::{Aabb, Rect};
use crate::renderer::traits::{BlendMode, DrawMode, MeshBufferHandle};
use crate::renderer::vertex::Vertex;
use crate::resources::SHADER_COLOR;

#[derive(Debug)]
struct ShapeCommand {
    mode: DrawMode,
    indices: Vec<u16>,
    vertices: Vec<Vertex>,
    buffer: Option<MeshBufferHandle>,
}

impl ShapeCommand {
    fn new(mode: DrawMode) -> Self {
        Self {
            mode,
            indices: Vec::new(),
            vertices: Vec::new(),
            buffer: None,
        }
    }

    fn push(&mut self, position: Vec2, color: Color) {
        self.vertices
            .push(Vertex::new(position.extend(0.0), color, Vec2::ZERO, Vec3::new(0.0, 0.0, -1.0)));
    }
}

/// Colored geometry built from draw commands; vertex colors carry the
/// per-shape color and the node tint is applied on top.
#[derive(Debug)]
pub struct ShapeRenderer {
    commands: Vec<ShapeCommand>,
    bounding_box: Aabb,
    pub blend_mode: BlendMode,
}

impl Default for ShapeRenderer {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            bounding_box: Aabb::EMPTY,
            blend_mode: BlendMode::Alpha,
        }
    }
}

impl ShapeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.bounding_box.reset();
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    fn commit(&mut self, command: ShapeCommand) {
        for v in &command.vertices {
            self.bounding_box.insert_point(v.position());
        }
        self.commands.push(command);
    }

    /// Hairline when `thickness` is zero, otherwise a quad along the segment.
    pub fn line(&mut self, start: Vec2, finish: Vec2, color: Color, thickness: f32) {
        let thickness = thickness.max(0.0);
        if thickness == 0.0 {
            let mut command = ShapeCommand::new(DrawMode::LineList);
            command.push(start, color);
            command.push(finish, color);
            command.indices.extend_from_slice(&[0, 1]);
            self.commit(command);
            return;
        }

        let tangent = (finish - start).normalize_or_zero();
        let normal = tangent.perp();
        let half = thickness / 2.0;
        let mut command = ShapeCommand::new(DrawMode::TriangleList);
        command.push(start - tangent * half - normal * half, color);
        command.push(finish + tangent * half - normal * half, color);
        command.push(start - tangent * half + normal * half, color);
        command.push(finish + tangent * half + normal * half, color);
        command.indices.extend_from_slice(&[0, 1, 2, 1, 3, 2]);
        self.commit(command);
    }

    pub fn rectangle(&mut self, rect: Rect, color: Color, fill: bool, thickness: f32) {
        let corners = [
            Vec2::new(rect.left(), rect.bottom()),
            Vec2::new(rect.right(), rect.bottom()),
            Vec2::new(rect.right(), rect.top()),
            Vec2::new(rect.left(), rect.top()),
        ];
        if fill {
            let mut command = ShapeCommand::new(DrawMode::TriangleList);
            for corner in corners {
                command.push(corner, color);
            }
            command.indices.extend_from_slice(&[0, 1, 3, 1, 2, 3]);
            self.commit(command);
            return;
        }

        let thickness = thickness.max(0.0);
        if thickness == 0.0 {
            let mut command = ShapeCommand::new(DrawMode::LineStrip);
            for corner in corners {
                command.push(corner, color);
            }
            command.indices.extend_from_slice(&[0, 1, 2, 3, 0]);
            self.commit(command);
            return;
        }

        // outer/inner vertex pair per corner, then two triangles per side
        let half = thickness / 2.0;
        let outward = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];
        let mut command = ShapeCommand::new(DrawMode::TriangleList);
        for (corner, out) in corners.iter().zip(outward) {
            command.push(*corner + out * half, color);
            command.push(*corner - out * half, color);
        }
        for side in 0..4u16 {
            let a = side * 2;
            let b = (side * 2 + 2) % 8;
            command
                .indices
                .extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
        }
        self.commit(command);
    }

    /// Convex polygon; filled as a fan or outlined as a closed strip.
    pub fn polygon(&mut self, edges: &[Vec2], color: Color, fill: bool) {
        if edges.len() < 3 {
            log::warn!("polygon needs at least 3 points, got {}", edges.len());
            return;
        }
        let mode = if fill { DrawMode::TriangleList } else { DrawMode::LineStrip };
        let mut command = ShapeCommand::new(mode);
        for &edge in edges {
            command.push(edge, color);
        }
        let count = edges.len() as u16;
        if fill {
            for i in 1..count - 1 {
                command.indices.extend_from_slice(&[0, i, i + 1]);
            }
        } else {
            command.indices.extend(0..count);
            command.indices.push(0);
        }
        self.commit(command);
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: Color, fill: bool, segments: u16, thickness: f32) {
        let segments = segments.max(3);
        let point = |i: u16, r: f32| {
            let angle = f32::from(i) * TAU / f32::from(segments);
            center + Vec2::new(angle.cos(), angle.sin()) * r
        };

        if fill {
            let mut command = ShapeCommand::new(DrawMode::TriangleList);
            command.push(center, color);
            for i in 0..segments {
                command.push(point(i, radius), color);
            }
            for i in 0..segments {
                command.indices.extend_from_slice(&[0, i + 1, (i + 1) % segments + 1]);
            }
            self.commit(command);
            return;
        }

        let thickness = thickness.max(0.0);
        if thickness == 0.0 {
            let mut command = ShapeCommand::new(DrawMode::LineStrip);
            for i in 0..segments {
                command.push(point(i, radius), color);
            }
            command.indices.extend(0..segments);
            command.indices.push(0);
            self.commit(command);
            return;
        }

        let half = thickness / 2.0;
        let mut command = ShapeCommand::new(DrawMode::TriangleList);
        for i in 0..segments {
            command.push(point(i, radius - half), color);
            command.push(point(i, radius + half), color);
        }
        for i in 0..segments {
            let a = i * 2;
            let b = (i + 1) % segments * 2;
            command
                .indices
                .extend_from_slice(&[a, a + 1, b + 1, b + 1, b, a]);
        }
        self.commit(command);
    }
}

impl Drawable for ShapeRenderer {
    fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>, transform: &Mat4, tint: Vec4) {
        if self.commands.is_empty() {
            return;
        }
        ctx.activate_shader(SHADER_COLOR);
        ctx.renderer.activate_blend_mode(self.blend_mode);
        ctx.renderer.activate_texture(None, 0);
        let mvp = ctx.model_view_projection(transform);
        ctx.renderer.set_uniforms(&mvp, tint);

        for command in &mut self.commands {
            let buffer = *command
                .buffer
                .get_or_insert_with(|| upload_mesh(&mut *ctx.renderer, &command.indices, &command.vertices));
            ctx.renderer
                .draw_mesh_buffer(buffer, command.indices.len() as u32, command.mode);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::HeadlessRenderer;

    fn draw(shape: &mut ShapeRenderer) -> HeadlessRenderer {
        let mut renderer = HeadlessRenderer::new();
        {
            let mut ctx = DrawContext::new(&mut renderer, None, Mat4::IDENTITY);
            shape.draw(&mut ctx, &Mat4::IDENTITY, Vec4::ONE);
        }
        renderer
    }

    #[test]
    fn hairline_is_line_list() {
        let mut shape = ShapeRenderer::new();
        shape.line(Vec2::ZERO, Vec2::new(10.0, 0.0), Color::RED, 0.0);
        let renderer = draw(&mut shape);
        assert_eq!(renderer.draw_calls.len(), 1);
        assert_eq!(renderer.draw_calls[0].mode, DrawMode::LineList);
        assert_eq!(renderer.draw_calls[0].index_count, 2);
    }

    #[test]
    fn thick_line_bounds_include_caps() {
        let mut shape = ShapeRenderer::new();
        shape.line(Vec2::ZERO, Vec2::new(10.0, 0.0), Color::WHITE, 2.0);
        let bounds = shape.bounding_box();
        assert!((bounds.min.x + 1.0).abs() < 1e-6);
        assert!((bounds.max.x - 11.0).abs() < 1e-6);
        assert!((bounds.max.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rectangle_variants() {
        let mut shape = ShapeRenderer::new();
        let rect = Rect::new(0.0, 0.0, 4.0, 2.0);
        shape.rectangle(rect, Color::WHITE, true, 0.0);
        shape.rectangle(rect, Color::WHITE, false, 0.0);
        shape.rectangle(rect, Color::WHITE, false, 1.0);
        let renderer = draw(&mut shape);
        let counts: Vec<u32> = renderer.draw_calls.iter().map(|c| c.index_count).collect();
        assert_eq!(counts, vec![6, 5, 24]);
        assert_eq!(renderer.rejected_draws, 0);
    }

    #[test]
    fn polygon_fan_and_outline() {
        let mut shape = ShapeRenderer::new();
        let square = [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
        shape.polygon(&square, Color::WHITE, true);
        shape.polygon(&square, Color::WHITE, false);
        shape.polygon(&square[..2], Color::WHITE, true);
        assert_eq!(shape.command_count(), 2);
        let renderer = draw(&mut shape);
        assert_eq!(renderer.draw_calls[0].index_count, 6);
        assert_eq!(renderer.draw_calls[1].index_count, 5);
    }

    #[test]
    fn circle_bounds_and_clear() {
        let mut shape = ShapeRenderer::new();
        shape.circle(Vec2::new(5.0, 5.0), 2.0, Color::WHITE, true, 16, 0.0);
        let bounds = shape.bounding_box();
        assert!((bounds.max.x - 7.0).abs() < 1e-5);
        assert!((bounds.min.y - 3.0).abs() < 1e-5);

        shape.clear();
        assert!(shape.bounding_box().is_empty());
        assert!(draw(&mut shape).draw_calls.is_empty());
    }

    #[test]
    fn buffers_upload_once() {
        let mut shape = ShapeRenderer::new();
        shape.circle(Vec2::ZERO, 1.0, Color::WHITE, false, 8, 0.5);
        let mut renderer = HeadlessRenderer::new();
        let mut ctx = DrawContext::new(&mut renderer, None, Mat4::IDENTITY);
        shape.draw(&mut ctx, &Mat4::IDENTITY, Vec4::ONE);
        let first = shape.commands[0].buffer;
        shape.draw(&mut ctx, &Mat4::IDENTITY, Vec4::ONE);
        assert_eq!(shape.commands[0].buffer, first);
    }
}
