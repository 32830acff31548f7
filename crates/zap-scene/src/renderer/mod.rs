pub mod camera;
pub mod headless;
pub mod traits;
pub mod vertex;

// Re-export key types for convenient access
pub use camera::{Camera, ScaleMode};
pub use headless::{DrawCall, HeadlessRenderer};
pub use traits::{
    BlendMode, DrawMode, MeshBufferHandle, PixelFormat, RenderTargetHandle, Renderer,
    ShaderDescriptor, ShaderHandle, TextureDescriptor, TextureHandle,
};
pub use vertex::Vertex;
