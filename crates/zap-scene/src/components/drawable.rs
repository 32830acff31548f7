//! Things a node can draw.
//!
//! A [`Drawable`] owns its geometry and any GPU buffers it uploaded. The
//! node supplies the world transform and tint at dispatch time.

use std::any::Any;
use std::fmt::Debug;

use glam::{Mat4, Vec2, Vec4};

use crate::assets::cache::Cache;
use crate::core::geometry::{polygon_overlaps_box, Aabb};
use crate::renderer::traits::{MeshBufferHandle, Renderer, ShaderHandle};
use crate::renderer::vertex::Vertex;
use crate::resources::Shader;

/// Per-layer state handed to every drawable during dispatch.
pub struct DrawContext<'a> {
    pub renderer: &'a mut dyn Renderer,
    /// Used to resolve shaders by name; `None` falls back to backend defaults.
    pub cache: Option<&'a Cache>,
    pub view_projection: Mat4,
}

impl<'a> DrawContext<'a> {
    pub fn new(renderer: &'a mut dyn Renderer, cache: Option<&'a Cache>, view_projection: Mat4) -> Self {
        Self {
            renderer,
            cache,
            view_projection,
        }
    }

    /// Handle of the named shader, if some bundle has it.
    pub fn shader(&self, name: &str) -> Option<ShaderHandle> {
        self.cache.and_then(|cache| cache.with_shader(name, Shader::handle))
    }

    /// Bind `name` (or the backend default when unresolved).
    pub fn activate_shader(&mut self, name: &str) {
        let shader = self.shader(name);
        self.renderer.activate_shader(shader);
    }

    pub fn model_view_projection(&self, transform: &Mat4) -> Mat4 {
        self.view_projection * *transform
    }
}

/// Visual attached to a node.
pub trait Drawable: Debug {
    /// Local-space bounds; an empty box is never culled.
    fn bounding_box(&self) -> Aabb;

    /// Advance time-dependent state.
    fn update(&mut self, _delta: f32) {}

    /// Issue draw calls. `tint` already carries the node's color and
    /// accumulated opacity.
    fn draw(&mut self, ctx: &mut DrawContext<'_>, transform: &Mat4, tint: Vec4);

    /// Whether `local` (node space) hits this drawable.
    fn point_on(&self, local: Vec2) -> bool {
        let bounds = self.bounding_box();
        !bounds.is_empty() && bounds.contains_point(local)
    }

    /// Whether a convex polygon (node space) overlaps this drawable.
    fn shape_overlaps(&self, local_edges: &[Vec2]) -> bool {
        polygon_overlaps_box(local_edges, &self.bounding_box())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Create a mesh buffer and fill it with 16-bit indices.
pub(crate) fn upload_mesh(renderer: &mut dyn Renderer, indices: &[u16], vertices: &[Vertex]) -> MeshBufferHandle {
    let buffer = renderer.create_mesh_buffer();
    renderer.upload_indices(buffer, bytemuck::cast_slice(indices), 2);
    renderer.upload_vertices(buffer, bytemuck::cast_slice(vertices), Vertex::STRIDE_BYTES as u32);
    buffer
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::renderer::traits::DrawMode;

    /// Minimal drawable with fixed bounds that records how it was drawn.
    #[derive(Debug, Default)]
    pub(crate) struct Probe {
        pub bounds: Aabb,
        pub draws: Vec<(Mat4, Vec4)>,
        pub elapsed: f32,
        pub buffer: Option<MeshBufferHandle>,
    }

    impl Probe {
        pub fn with_bounds(min: Vec2, max: Vec2) -> Self {
            Self {
                bounds: Aabb::from_rect(min, max),
                ..Self::default()
            }
        }
    }

    impl Drawable for Probe {
        fn bounding_box(&self) -> Aabb {
            self.bounds
        }

        fn update(&mut self, delta: f32) {
            self.elapsed += delta;
        }

        fn draw(&mut self, ctx: &mut DrawContext<'_>, transform: &Mat4, tint: Vec4) {
            let buffer = *self
                .buffer
                .get_or_insert_with(|| upload_mesh(&mut *ctx.renderer, &[0, 1, 2], &[Vertex::default(); 3]));
            let mvp = ctx.model_view_projection(transform);
            ctx.renderer.set_uniforms(&mvp, tint);
            ctx.renderer.draw_mesh_buffer(buffer, 3, DrawMode::TriangleList);
            self.draws.push((*transform, tint));
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn default_hit_test_uses_bounds() {
        let probe = Probe::with_bounds(Vec2::splat(-1.0), Vec2::splat(1.0));
        assert!(probe.point_on(Vec2::new(0.5, -0.5)));
        assert!(!probe.point_on(Vec2::new(1.5, 0.0)));
        assert!(probe.shape_overlaps(&[Vec2::ZERO, Vec2::new(3.0, 0.0), Vec2::new(0.0, 3.0)]));

        let empty = Probe::default();
        assert!(!empty.point_on(Vec2::ZERO));
    }

    #[test]
    fn unresolved_shader_is_none() {
        let mut renderer = crate::renderer::headless::HeadlessRenderer::new();
        let ctx = DrawContext::new(&mut renderer, None, Mat4::IDENTITY);
        assert!(ctx.shader("shaderTexture").is_none());
    }
}
