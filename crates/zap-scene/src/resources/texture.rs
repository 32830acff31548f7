use glam::UVec2;

use crate::renderer::traits::{PixelFormat, Renderer, TextureDescriptor, TextureHandle};

/// GPU texture owned through `Arc` by bundles and drawables alike.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    handle: TextureHandle,
    size: UVec2,
    mip_levels: u32,
    pixel_format: PixelFormat,
    dynamic: bool,
}

impl Texture {
    /// Create a texture and upload `data` as its base level.
    /// `mip_levels` of 0 asks the backend for a full chain.
    pub fn create(
        renderer: &mut dyn Renderer,
        size: UVec2,
        data: &[u8],
        mip_levels: u32,
        pixel_format: PixelFormat,
    ) -> Self {
        let descriptor = TextureDescriptor {
            size,
            dynamic: false,
            mip_levels,
            pixel_format,
        };
        let handle = renderer.create_texture(&descriptor);
        if !data.is_empty() {
            renderer.upload_texture(handle, 0, data);
        }
        Self {
            handle,
            size,
            mip_levels,
            pixel_format,
            dynamic: false,
        }
    }

    /// Create an empty texture whose contents are updated later.
    pub fn create_dynamic(renderer: &mut dyn Renderer, size: UVec2, pixel_format: PixelFormat) -> Self {
        let handle = renderer.create_texture(&TextureDescriptor {
            size,
            dynamic: true,
            mip_levels: 1,
            pixel_format,
        });
        Self {
            handle,
            size,
            mip_levels: 1,
            pixel_format,
            dynamic: true,
        }
    }

    /// Replace the base level. Every drawable sharing this texture sees the change.
    pub fn update(&self, renderer: &mut dyn Renderer, data: &[u8]) {
        renderer.upload_texture(self.handle, 0, data);
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::HeadlessRenderer;

    #[test]
    fn create_uploads_base_level() {
        let mut renderer = HeadlessRenderer::new();
        let texture = Texture::create(
            &mut renderer,
            UVec2::new(2, 1),
            &[0; 8],
            0,
            PixelFormat::Rgba8UNorm,
        );
        let record = renderer.texture(texture.handle()).unwrap();
        assert_eq!(record.descriptor.mip_levels, 0);
        assert_eq!(record.levels[&0].len(), 8);
        assert!(!texture.is_dynamic());
    }

    #[test]
    fn dynamic_texture_starts_empty() {
        let mut renderer = HeadlessRenderer::new();
        let texture = Texture::create_dynamic(&mut renderer, UVec2::new(4, 4), PixelFormat::R8UNorm);
        assert!(renderer.texture(texture.handle()).unwrap().levels.is_empty());
        texture.update(&mut renderer, &[255; 16]);
        assert_eq!(renderer.texture(texture.handle()).unwrap().levels[&0].len(), 16);
    }
}
