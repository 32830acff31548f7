//! GPU-less renderer that records every call.
//!
//! Used by tests, asset tools and server-side simulation. It keeps the
//! uploaded bytes so the `draw_mesh_buffer` contract can be enforced the
//! same way a real backend would.

use std::collections::HashMap;

use glam::{Mat4, Vec4};

use super::traits::{
    BlendMode, DrawMode, MeshBufferHandle, Renderer, RenderTargetHandle, ShaderDescriptor,
    ShaderHandle, TextureDescriptor, TextureHandle,
};
use super::vertex::Vertex;

#[derive(Debug, Clone)]
pub struct TextureRecord {
    pub descriptor: TextureDescriptor,
    /// Uploaded bytes per mip level.
    pub levels: HashMap<u32, Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct MeshBufferRecord {
    pub index_data: Vec<u8>,
    pub index_size: u32,
    pub vertex_data: Vec<u8>,
    pub vertex_size: u32,
}

impl MeshBufferRecord {
    pub fn index_count(&self) -> u32 {
        if self.index_size == 0 {
            0
        } else {
            (self.index_data.len() / self.index_size as usize) as u32
        }
    }
}

/// One successful draw as the backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub buffer: MeshBufferHandle,
    pub index_count: u32,
    pub mode: DrawMode,
    pub model_view_projection: Mat4,
    pub color: Vec4,
    pub texture: Option<TextureHandle>,
    pub shader: Option<ShaderHandle>,
    pub blend_mode: BlendMode,
    pub render_target: Option<RenderTargetHandle>,
}

#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next_handle: u32,
    textures: HashMap<TextureHandle, TextureRecord>,
    shaders: HashMap<ShaderHandle, ShaderDescriptor>,
    buffers: HashMap<MeshBufferHandle, MeshBufferRecord>,
    active_textures: HashMap<u32, TextureHandle>,
    active_shader: Option<ShaderHandle>,
    active_blend_mode: BlendMode,
    active_render_target: Option<RenderTargetHandle>,
    mvp: Mat4,
    color: Vec4,
    pub draw_calls: Vec<DrawCall>,
    pub rejected_draws: u32,
    pub render_target_switches: Vec<Option<RenderTargetHandle>>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureRecord> {
        self.textures.get(&handle)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn mesh_buffer(&self, handle: MeshBufferHandle) -> Option<&MeshBufferRecord> {
        self.buffers.get(&handle)
    }

    /// Vertex stride expected by `shader`; the backend default consumes [`Vertex`].
    fn shader_vertex_size(&self, shader: Option<ShaderHandle>) -> u32 {
        shader
            .and_then(|s| self.shaders.get(&s))
            .map(|d| d.vertex_size)
            .unwrap_or(Vertex::STRIDE_BYTES as u32)
    }

    /// Forget recorded draws, keeping resources.
    pub fn clear_frame(&mut self) {
        self.draw_calls.clear();
        self.rejected_draws = 0;
        self.render_target_switches.clear();
    }
}

impl Renderer for HeadlessRenderer {
    fn backend(&self) -> &'static str {
        "headless"
    }

    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> TextureHandle {
        let handle = TextureHandle(self.next());
        self.textures.insert(
            handle,
            TextureRecord {
                descriptor: *descriptor,
                levels: HashMap::new(),
            },
        );
        handle
    }

    fn upload_texture(&mut self, texture: TextureHandle, level: u32, data: &[u8]) {
        match self.textures.get_mut(&texture) {
            Some(record) => {
                record.levels.insert(level, data.to_vec());
            }
            None => log::warn!("upload to unknown texture {:?}", texture),
        }
    }

    fn create_shader(&mut self, descriptor: &ShaderDescriptor) -> ShaderHandle {
        let handle = ShaderHandle(self.next());
        self.shaders.insert(handle, descriptor.clone());
        handle
    }

    fn create_mesh_buffer(&mut self) -> MeshBufferHandle {
        let handle = MeshBufferHandle(self.next());
        self.buffers.insert(handle, MeshBufferRecord::default());
        handle
    }

    fn upload_indices(&mut self, buffer: MeshBufferHandle, data: &[u8], index_size: u32) {
        if let Some(record) = self.buffers.get_mut(&buffer) {
            record.index_data = data.to_vec();
            record.index_size = index_size;
        }
    }

    fn upload_vertices(&mut self, buffer: MeshBufferHandle, data: &[u8], vertex_size: u32) {
        if let Some(record) = self.buffers.get_mut(&buffer) {
            record.vertex_data = data.to_vec();
            record.vertex_size = vertex_size;
        }
    }

    fn activate_texture(&mut self, texture: Option<TextureHandle>, slot: u32) {
        match texture {
            Some(handle) => {
                self.active_textures.insert(slot, handle);
            }
            None => {
                self.active_textures.remove(&slot);
            }
        }
    }

    fn activate_shader(&mut self, shader: Option<ShaderHandle>) {
        self.active_shader = shader;
    }

    fn activate_blend_mode(&mut self, mode: BlendMode) {
        self.active_blend_mode = mode;
    }

    fn activate_render_target(&mut self, target: Option<RenderTargetHandle>) {
        self.active_render_target = target;
        self.render_target_switches.push(target);
    }

    fn set_uniforms(&mut self, model_view_projection: &Mat4, color: Vec4) {
        self.mvp = *model_view_projection;
        self.color = color;
    }

    fn draw_mesh_buffer(&mut self, buffer: MeshBufferHandle, index_count: u32, mode: DrawMode) -> bool {
        let Some(record) = self.buffers.get(&buffer) else {
            self.rejected_draws += 1;
            return false;
        };
        if index_count > record.index_count()
            || record.vertex_size != self.shader_vertex_size(self.active_shader)
        {
            self.rejected_draws += 1;
            return false;
        }

        self.draw_calls.push(DrawCall {
            buffer,
            index_count,
            mode,
            model_view_projection: self.mvp,
            color: self.color,
            texture: self.active_textures.get(&0).copied(),
            shader: self.active_shader,
            blend_mode: self.active_blend_mode,
            render_target: self.active_render_target,
        });
        true
    }
}
