use crate::renderer::traits::{Renderer, ShaderDescriptor, ShaderHandle};

/// Name of the textured shader materials and sprites select by default.
pub const SHADER_TEXTURE: &str = "shaderTexture";
/// Name of the untextured vertex-color shader.
pub const SHADER_COLOR: &str = "shaderColor";

/// Compiled shader program, exclusively owned by the bundle that created it.
#[derive(Debug, PartialEq, Eq)]
pub struct Shader {
    handle: ShaderHandle,
    vertex_size: u32,
}

impl Shader {
    pub fn create(renderer: &mut dyn Renderer, descriptor: &ShaderDescriptor) -> Self {
        Self {
            handle: renderer.create_shader(descriptor),
            vertex_size: descriptor.vertex_size,
        }
    }

    pub fn handle(&self) -> ShaderHandle {
        self.handle
    }

    pub fn vertex_size(&self) -> u32 {
        self.vertex_size
    }
}
