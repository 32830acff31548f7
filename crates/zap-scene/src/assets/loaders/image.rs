use std::io::Cursor;
use std::sync::Arc;

use glam::UVec2;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::assets::asset::{AssetKind, LoadOptions};
use crate::assets::loader::{LoadContext, Loader};
use crate::error::Result;
use crate::renderer::traits::PixelFormat;
use crate::resources::Texture;

/// Decodes PNG, JPEG, BMP and TGA data into an RGBA8 texture.
#[derive(Debug, Default)]
pub struct ImageLoader;

/// Sniff the format from the data, falling back to the file extension for
/// formats without a signature (TGA).
fn decode(data: &[u8], filename: &str) -> Result<DynamicImage> {
    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    if reader.format().is_none() {
        if let Ok(format) = ImageFormat::from_path(filename) {
            reader.set_format(format);
        }
    }
    Ok(reader.decode()?)
}

impl Loader for ImageLoader {
    fn kind(&self) -> AssetKind {
        AssetKind::Image
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], options: LoadOptions) -> Result<()> {
        let image = decode(data, ctx.filename)?.to_rgba8();
        let (width, height) = image.dimensions();
        // 0 asks the backend for a full chain
        let mip_levels = if options.mipmaps { 0 } else { 1 };

        let texture = Texture::create(
            &mut *ctx.renderer,
            UVec2::new(width, height),
            image.as_raw(),
            mip_levels,
            PixelFormat::Rgba8UNorm,
        );
        ctx.bundle.set_texture(name, Arc::new(texture));
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::assets::bundle::Bundle;
    use crate::assets::cache::Cache;
    use crate::assets::fs::MemoryFileSystem;
    use crate::error::LoadError;
    use crate::renderer::headless::HeadlessRenderer;

    /// Encode a solid-colour PNG.
    pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Encode a solid-colour RGB image in `format`.
    fn rgb_bytes(width: u32, height: u32, rgb: [u8; 3], format: ImageFormat) -> Vec<u8> {
        let image = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn setup(files: MemoryFileSystem) -> (Cache, Bundle) {
        let cache = Cache::default();
        cache.add_loader(Rc::new(ImageLoader));
        let bundle = Bundle::new(&cache, Rc::new(files));
        (cache, bundle)
    }

    #[test]
    fn png_becomes_rgba_texture() {
        let (cache, bundle) = setup(MemoryFileSystem::new().with_file("red.png", png_bytes(4, 2, [255, 0, 0, 255])));
        let mut renderer = HeadlessRenderer::new();
        bundle
            .load_asset(&mut renderer, AssetKind::Image, "red.png", "red.png", LoadOptions::default())
            .unwrap();

        let texture = cache.texture("red.png").unwrap();
        assert_eq!(texture.size(), UVec2::new(4, 2));
        assert_eq!(texture.mip_levels(), 0);
        let record = renderer.texture(texture.handle()).unwrap();
        assert_eq!(record.levels[&0].len(), 4 * 2 * 4);
        assert_eq!(&record.levels[&0][0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn mipmaps_off_requests_one_level() {
        let (_cache, bundle) = setup(MemoryFileSystem::new().with_file("a.png", png_bytes(1, 1, [0; 4])));
        let mut renderer = HeadlessRenderer::new();
        bundle
            .load_asset(&mut renderer, AssetKind::Image, "a", "a.png", LoadOptions { mipmaps: false })
            .unwrap();
        assert_eq!(bundle.texture("a").unwrap().mip_levels(), 1);
    }

    #[test]
    fn garbage_is_rejected() {
        let (_cache, bundle) = setup(MemoryFileSystem::new().with_file("bad.png", vec![1u8, 2, 3]));
        let mut renderer = HeadlessRenderer::new();
        let err = bundle
            .load_asset(&mut renderer, AssetKind::Image, "bad", "bad.png", LoadOptions::default())
            .unwrap_err();
        match err {
            LoadError::Asset { source, .. } => assert!(matches!(*source, LoadError::Image(_))),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(renderer.texture_count(), 0);
    }

    #[test]
    fn every_image_extension_preloads() {
        crate::test_log();
        let files = MemoryFileSystem::new()
            .with_file("tile.png", png_bytes(2, 2, [0, 255, 0, 255]))
            .with_file("tile.jpg", rgb_bytes(2, 2, [0, 255, 0], ImageFormat::Jpeg))
            .with_file("tile.jpeg", rgb_bytes(2, 2, [0, 255, 0], ImageFormat::Jpeg))
            .with_file("tile.bmp", rgb_bytes(2, 2, [0, 255, 0], ImageFormat::Bmp))
            .with_file("tile.tga", rgb_bytes(2, 2, [0, 255, 0], ImageFormat::Tga));
        let (cache, bundle) = setup(files);
        let mut renderer = HeadlessRenderer::new();

        for filename in ["tile.png", "tile.jpg", "tile.jpeg", "tile.bmp", "tile.tga"] {
            bundle
                .preload_sprite_data(&mut renderer, filename, false, 1, 1, glam::Vec2::splat(0.5))
                .unwrap_or_else(|err| panic!("{filename}: {err}"));
            assert_eq!(cache.texture(filename).unwrap().size(), UVec2::new(2, 2), "{filename}");
            assert_eq!(cache.sprite_data(filename).unwrap().frame_count(), 1, "{filename}");
        }
        assert_eq!(renderer.texture_count(), 5);
    }

    #[test]
    fn tga_format_comes_from_the_filename() {
        let files = MemoryFileSystem::new().with_file("art/tile.tga", rgb_bytes(3, 1, [255, 0, 0], ImageFormat::Tga));
        let (_cache, bundle) = setup(files);
        let mut renderer = HeadlessRenderer::new();
        bundle
            .load_asset(&mut renderer, AssetKind::Image, "tile", "art/tile.tga", LoadOptions::default())
            .unwrap();
        let texture = bundle.texture("tile").unwrap();
        assert_eq!(texture.size(), UVec2::new(3, 1));
        let record = renderer.texture(texture.handle()).unwrap();
        assert_eq!(&record.levels[&0][0..4], &[255, 0, 0, 255]);
    }
}
