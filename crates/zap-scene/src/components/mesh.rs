use std::any::Any;

use glam::{Mat4, Vec4};

use super::drawable::{upload_mesh, DrawContext, Drawable};
use crate::assets::cache::Cache;
use crate::core::geometry::Aabb;
use crate::renderer::traits::{DrawMode, MeshBufferHandle, Renderer};
use crate::renderer::vertex::Vertex;
use crate::resources::{Material, StaticMeshData};

/// Draws a decoded model with its material.
#[derive(Debug)]
pub struct StaticMeshRenderer {
    data: StaticMeshData,
    pub material: Material,
    buffer: Option<MeshBufferHandle>,
}

impl StaticMeshRenderer {
    /// Without a material the mesh is drawn untextured in white.
    pub fn new(data: StaticMeshData, material: Option<Material>) -> Self {
        Self {
            data,
            material: material.unwrap_or_else(|| Material::default().with_default_shader()),
            buffer: None,
        }
    }

    /// Mesh `name` with the material it references, both from the cache.
    pub fn from_cache(cache: &Cache, name: &str) -> Option<Self> {
        let data = cache.static_mesh_data(name)?;
        let material = data
            .material
            .as_deref()
            .and_then(|m| cache.with_material(m, Material::clone));
        if material.is_none() {
            if let Some(missing) = &data.material {
                log::warn!("mesh {}: material {} not in cache", name, missing);
            }
        }
        Some(Self::new(data, material))
    }

    pub fn data(&self) -> &StaticMeshData {
        &self.data
    }

    fn upload(&self, renderer: &mut dyn Renderer) -> MeshBufferHandle {
        if self.data.vertices.len() <= usize::from(u16::MAX) + 1 {
            let indices: Vec<u16> = self.data.indices.iter().map(|&i| i as u16).collect();
            return upload_mesh(renderer, &indices, &self.data.vertices);
        }
        let buffer = renderer.create_mesh_buffer();
        renderer.upload_indices(buffer, bytemuck::cast_slice(&self.data.indices), 4);
        renderer.upload_vertices(buffer, bytemuck::cast_slice(&self.data.vertices), Vertex::STRIDE_BYTES as u32);
        buffer
    }
}

impl Drawable for StaticMeshRenderer {
    fn bounding_box(&self) -> Aabb {
        self.data.bounding_box
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>, transform: &Mat4, tint: Vec4) {
        if self.data.indices.is_empty() {
            return;
        }
        let buffer = match self.buffer {
            Some(buffer) => buffer,
            None => {
                let buffer = self.upload(&mut *ctx.renderer);
                self.buffer = Some(buffer);
                buffer
            }
        };

        let shader = self.material.shader.as_deref().and_then(|name| ctx.shader(name));
        ctx.renderer.activate_shader(shader);
        ctx.renderer.activate_blend_mode(self.material.blend_mode);
        ctx.renderer
            .activate_texture(self.material.diffuse_texture.as_ref().map(|t| t.handle()), 0);
        ctx.renderer
            .activate_texture(self.material.ambient_texture.as_ref().map(|t| t.handle()), 1);

        let mut color = tint * self.material.diffuse_color.normalized();
        color.w *= self.material.opacity;
        let mvp = ctx.model_view_projection(transform);
        ctx.renderer.set_uniforms(&mvp, color);
        ctx.renderer
            .draw_mesh_buffer(buffer, self.data.indices.len() as u32, DrawMode::TriangleList);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
