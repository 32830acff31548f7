use std::sync::Arc;

use super::shader::{SHADER_COLOR, SHADER_TEXTURE};
use super::texture::Texture;
use crate::core::color::Color;
use crate::renderer::traits::BlendMode;

/// Surface description for meshes and sprites.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Shader looked up by name in the cache; `None` uses the backend default.
    pub shader: Option<String>,
    pub blend_mode: BlendMode,
    pub diffuse_texture: Option<Arc<Texture>>,
    pub ambient_texture: Option<Arc<Texture>>,
    pub diffuse_color: Color,
    pub opacity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            shader: None,
            blend_mode: BlendMode::Alpha,
            diffuse_texture: None,
            ambient_texture: None,
            diffuse_color: Color::WHITE,
            opacity: 1.0,
        }
    }
}

impl Material {
    /// Material sampling `texture` through the default textured shader.
    pub fn textured(texture: Arc<Texture>) -> Self {
        Self {
            shader: Some(SHADER_TEXTURE.to_string()),
            diffuse_texture: Some(texture),
            ..Self::default()
        }
    }

    /// Pick the textured or the color shader depending on whether a
    /// diffuse texture is present.
    pub fn with_default_shader(mut self) -> Self {
        let name = if self.diffuse_texture.is_some() {
            SHADER_TEXTURE
        } else {
            SHADER_COLOR
        };
        self.shader = Some(name.to_string());
        self
    }
}
