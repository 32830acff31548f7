//! Renderer trait for GPU backends.
//!
//! The scene graph and the asset loaders only ever talk to the GPU through
//! this contract. Backends (OpenGL, Metal, WebGPU, ...) live outside this
//! crate; [`HeadlessRenderer`](super::headless::HeadlessRenderer) is the
//! in-crate implementation used by tests and tools.

use glam::{Mat4, UVec2, Vec4};

use super::camera::Camera;
use crate::core::geometry::Aabb;

/// Opaque texture handle issued by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Opaque shader handle issued by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// Opaque mesh buffer (index + vertex storage) handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshBufferHandle(pub u32);

/// Opaque render target handle. `None` where one is expected means the backbuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle(pub u32);

/// Texel layout of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    R8UNorm,
    Rg8UNorm,
    #[default]
    Rgba8UNorm,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::R8UNorm => 1,
            PixelFormat::Rg8UNorm => 2,
            PixelFormat::Rgba8UNorm => 4,
        }
    }
}

/// Primitive topology for a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// How fragments are combined with the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Blending disabled.
    Opaque,
    /// Standard alpha blending (src-alpha, one-minus-src-alpha).
    #[default]
    Alpha,
    /// Additive blending (src-alpha, one).
    Additive,
}

/// Parameters for [`Renderer::create_shader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescriptor {
    pub vertex_source: Vec<u8>,
    pub fragment_source: Vec<u8>,
    /// Stride of the vertex layout this shader consumes.
    pub vertex_size: u32,
}

/// Parameters for [`Renderer::create_texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub size: UVec2,
    /// Contents are expected to change after creation.
    pub dynamic: bool,
    /// Number of mip levels; 0 requests a full chain.
    pub mip_levels: u32,
    pub pixel_format: PixelFormat,
}

/// GPU backend contract.
///
/// # Example Implementation
///
/// ```ignore
/// struct GlRenderer { /* ... */ }
///
/// impl Renderer for GlRenderer {
///     fn backend(&self) -> &'static str { "opengl" }
///     fn draw_mesh_buffer(&mut self, buffer: MeshBufferHandle, index_count: u32, mode: DrawMode) -> bool {
///         // glDrawElements(...)
///     }
///     // ...
/// }
/// ```
pub trait Renderer {
    /// Backend identifier (e.g., "opengl", "metal", "headless").
    fn backend(&self) -> &'static str;

    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> TextureHandle;

    /// Replace the texels of one mip level.
    fn upload_texture(&mut self, texture: TextureHandle, level: u32, data: &[u8]);

    fn create_shader(&mut self, descriptor: &ShaderDescriptor) -> ShaderHandle;

    fn create_mesh_buffer(&mut self) -> MeshBufferHandle;

    /// Upload index data; `index_size` is 2 or 4 bytes.
    fn upload_indices(&mut self, buffer: MeshBufferHandle, data: &[u8], index_size: u32);

    /// Upload vertex data; `vertex_size` is the stride in bytes.
    fn upload_vertices(&mut self, buffer: MeshBufferHandle, data: &[u8], vertex_size: u32);

    /// Bind a texture to a sampler slot. `None` unbinds the slot.
    fn activate_texture(&mut self, texture: Option<TextureHandle>, slot: u32);

    /// Bind a shader. `None` selects the backend's default.
    fn activate_shader(&mut self, shader: Option<ShaderHandle>);

    fn activate_blend_mode(&mut self, mode: BlendMode);

    /// Bind a render target. `None` selects the backbuffer.
    fn activate_render_target(&mut self, target: Option<RenderTargetHandle>);

    /// Set per-draw constants: model-view-projection and tint.
    fn set_uniforms(&mut self, model_view_projection: &Mat4, color: Vec4);

    /// Issue a draw. Returns false when the active shader's vertex layout
    /// does not match the buffer, or `index_count` exceeds the stored indices.
    fn draw_mesh_buffer(&mut self, buffer: MeshBufferHandle, index_count: u32, mode: DrawMode) -> bool;

    /// Whether a box under `transform` can be seen through `camera`.
    fn check_visibility(&self, transform: &Mat4, aabb: &Aabb, camera: &Camera) -> bool {
        camera.check_visibility(transform, aabb)
    }
}
