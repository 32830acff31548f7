//! Wavefront material library loader.

use std::sync::Arc;

use super::tokenizer::{is_newline, Tokenizer};
use crate::assets::asset::{AssetKind, LoadOptions};
use crate::assets::loader::{LoadContext, Loader};
use crate::core::color::Color;
use crate::error::Result;
use crate::resources::{Material, Texture};

/// Material being assembled from consecutive records.
struct Pending {
    name: String,
    diffuse_texture: Option<Arc<Texture>>,
    ambient_texture: Option<Arc<Texture>>,
    diffuse_color: Color,
    opacity: f32,
}

impl Pending {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            diffuse_texture: None,
            ambient_texture: None,
            diffuse_color: Color::WHITE,
            opacity: 1.0,
        }
    }

    fn finish(self) -> (String, Material) {
        let material = Material {
            diffuse_texture: self.diffuse_texture,
            ambient_texture: self.ambient_texture,
            diffuse_color: self.diffuse_color,
            opacity: self.opacity,
            ..Material::default()
        }
        .with_default_shader();
        (self.name, material)
    }
}

#[derive(Debug, Default)]
pub struct MtlLoader;

impl Loader for MtlLoader {
    fn kind(&self) -> AssetKind {
        AssetKind::Material
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], options: LoadOptions) -> Result<()> {
        let mut t = Tokenizer::new(data);
        let mut materials = Vec::new();
        let mut current = Pending::new(name);
        // set by the first record of any kind
        let mut started = false;

        while let Some(c) = t.peek() {
            if is_newline(c) {
                t.advance();
                continue;
            }
            if c == b'#' {
                t.skip_line();
                continue;
            }

            t.skip_whitespace();
            if t.at_line_end() {
                continue;
            }
            let keyword = t.parse_word()?;
            match keyword {
                "newmtl" => {
                    t.skip_whitespace();
                    let next = t.parse_word()?;
                    t.skip_line();
                    let previous = std::mem::replace(&mut current, Pending::new(next));
                    if started {
                        materials.push(previous.finish());
                    }
                }
                "map_Ka" => {
                    t.skip_whitespace();
                    let file = t.parse_word()?;
                    t.skip_line();
                    current.ambient_texture = ctx.cache.texture(file);
                }
                "map_Kd" => {
                    t.skip_whitespace();
                    let file = t.parse_word()?;
                    t.skip_line();
                    current.diffuse_texture = match ctx.cache.texture(file) {
                        Some(texture) => Some(texture),
                        None => {
                            ctx.load_dependency(AssetKind::Image, file, file, options)?;
                            ctx.cache.texture(file)
                        }
                    };
                }
                "Kd" => {
                    let mut rgb = [0.0; 3];
                    for channel in &mut rgb {
                        t.skip_whitespace();
                        *channel = t.parse_f32()?;
                    }
                    t.skip_line();
                    current.diffuse_color = Color::from_normalized([rgb[0], rgb[1], rgb[2], 1.0]);
                }
                "d" => {
                    t.skip_whitespace();
                    current.opacity = t.parse_f32()?;
                    t.skip_line();
                }
                "Tr" => {
                    t.skip_whitespace();
                    current.opacity = 1.0 - t.parse_f32()?;
                    t.skip_line();
                }
                // Ka, Ks, Ke and the rest
                _ => t.skip_line(),
            }
            started = true;
        }

        if started {
            materials.push(current.finish());
        }

        log::debug!("{}: {} materials", name, materials.len());
        for (material_name, material) in materials {
            ctx.bundle.set_material(material_name, material);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use glam::UVec2;

    use crate::assets::bundle::Bundle;
    use crate::assets::cache::Cache;
    use crate::assets::fs::MemoryFileSystem;
    use crate::error::LoadError;
    use crate::renderer::headless::HeadlessRenderer;
    use crate::renderer::traits::PixelFormat;
    use crate::resources::{SHADER_COLOR, SHADER_TEXTURE};

    const LIBRARY: &str = "# two materials\n\
newmtl red\n\
Ka 0.1 0.1 0.1\n\
Kd 1.0 0.0 0.0\n\
d 0.5\n\
\n\
newmtl crate\n\
  map_Kd crate.png\n\
Tr 0.25\n\
illum 2\n";

    fn setup(fs: MemoryFileSystem) -> (Cache, Bundle, HeadlessRenderer) {
        let cache = Cache::default();
        cache.add_loader(Rc::new(MtlLoader));
        let bundle = Bundle::new(&cache, Rc::new(fs));
        (cache, bundle, HeadlessRenderer::new())
    }

    #[test]
    fn reads_colors_opacity_and_textures() {
        let (cache, bundle, mut renderer) = setup(MemoryFileSystem::new().with_file("lib.mtl", LIBRARY));
        let texture = Arc::new(Texture::create(&mut renderer, UVec2::new(2, 2), &[], 1, PixelFormat::Rgba8UNorm));
        bundle.set_texture("crate.png", texture.clone());

        bundle
            .load_asset(&mut renderer, AssetKind::Material, "lib.mtl", "lib.mtl", LoadOptions::default())
            .unwrap();

        let red = cache.with_material("red", Material::clone).unwrap();
        assert_eq!(red.diffuse_color, Color::rgba(255, 0, 0, 255));
        assert!((red.opacity - 0.5).abs() < 1e-6);
        assert_eq!(red.shader.as_deref(), Some(SHADER_COLOR));

        let boxed = cache.with_material("crate", Material::clone).unwrap();
        assert!(Arc::ptr_eq(boxed.diffuse_texture.as_ref().unwrap(), &texture));
        assert!((boxed.opacity - 0.75).abs() < 1e-6);
        assert_eq!(boxed.diffuse_color, Color::WHITE);
        assert_eq!(boxed.shader.as_deref(), Some(SHADER_TEXTURE));
        assert!(!cache.has_material("lib.mtl"));
    }

    #[test]
    fn records_before_newmtl_use_asset_name() {
        let (_cache, bundle, mut renderer) = setup(MemoryFileSystem::new().with_file("solo.mtl", "Kd 0 0 1\n"));
        bundle
            .load_asset(&mut renderer, AssetKind::Material, "solo", "solo.mtl", LoadOptions::default())
            .unwrap();
        assert_eq!(bundle.material("solo").unwrap().diffuse_color, Color::rgba(0, 0, 255, 255));
    }

    #[test]
    fn failure_registers_nothing() {
        let (cache, bundle, mut renderer) =
            setup(MemoryFileSystem::new().with_file("bad.mtl", "newmtl a\nKd 1 0 0\nnewmtl b\nd x\n"));
        let err = bundle
            .load_asset(&mut renderer, AssetKind::Material, "bad", "bad.mtl", LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Asset { .. }));
        assert!(!cache.has_material("a"));
    }

    #[test]
    fn missing_diffuse_map_fails() {
        let (_cache, bundle, mut renderer) =
            setup(MemoryFileSystem::new().with_file("m.mtl", "newmtl m\nmap_Kd nowhere.png\n"));
        assert!(bundle
            .load_asset(&mut renderer, AssetKind::Material, "m", "m.mtl", LoadOptions::default())
            .is_err());
        assert!(bundle.material("m").is_none());
    }
}
