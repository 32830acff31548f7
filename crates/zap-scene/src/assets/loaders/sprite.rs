//! TexturePacker JSON (array export) sprite sheet loader.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::assets::asset::{AssetKind, LoadOptions};
use crate::assets::loader::{LoadContext, Loader};
use crate::core::geometry::Rect;
use crate::error::{LoadError, Result};
use crate::renderer::traits::BlendMode;
use crate::renderer::vertex::Vertex;
use crate::resources::sprite_data::final_offset;
use crate::resources::{SpriteAnimation, SpriteData, SpriteFrame};

#[derive(Debug, Deserialize)]
struct RawSheet {
    meta: Option<RawMeta>,
    frames: Option<Vec<RawFrame>>,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    image: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawRect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawSize {
    w: f32,
    h: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawPoint {
    x: f32,
    y: f32,
}

impl Default for RawPoint {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

impl From<RawPoint> for Vec2 {
    fn from(p: RawPoint) -> Self {
        Vec2::new(p.x, p.y)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrame {
    filename: String,
    frame: RawRect,
    source_size: RawSize,
    sprite_source_size: RawPoint,
    #[serde(default)]
    pivot: RawPoint,
    #[serde(default)]
    rotated: bool,
    vertices: Option<Vec<[f32; 2]>>,
    #[serde(rename = "verticesUV")]
    vertices_uv: Option<Vec<[f32; 2]>>,
    triangles: Option<Vec<Vec<u16>>>,
}

impl RawFrame {
    fn into_frame(self, texture_size: Vec2) -> Result<SpriteFrame> {
        let frame = Rect::new(self.frame.x, self.frame.y, self.frame.w, self.frame.h);
        let source_size = Vec2::new(self.source_size.w, self.source_size.h);
        let source_offset = Vec2::from(self.sprite_source_size);
        let pivot = Vec2::from(self.pivot);

        match (self.vertices, self.vertices_uv, self.triangles) {
            (Some(positions), Some(uvs), Some(triangles)) => {
                if positions.len() != uvs.len() {
                    return Err(LoadError::InvalidValue {
                        field: "verticesUV",
                        value: format!("{} entries for {} vertices", uvs.len(), positions.len()),
                    });
                }
                // exported clockwise; flip to counter-clockwise
                let mut indices: Vec<u16> = triangles.into_iter().flatten().collect();
                indices.reverse();
                if let Some(&bad) = indices.iter().find(|&&i| usize::from(i) >= positions.len()) {
                    return Err(LoadError::InvalidValue {
                        field: "triangles",
                        value: bad.to_string(),
                    });
                }

                let offset = final_offset(frame.size, source_size, source_offset, pivot);
                let vertices = positions
                    .iter()
                    .zip(&uvs)
                    .map(|(p, uv)| {
                        Vertex::sprite(
                            Vec3::new(p[0] + offset.x, -p[1] - offset.y, 0.0),
                            Vec2::from_array(*uv) / texture_size,
                        )
                    })
                    .collect();
                Ok(SpriteFrame::from_mesh(self.filename, indices, vertices))
            }
            _ => Ok(SpriteFrame::from_rect(
                self.filename,
                texture_size,
                frame,
                self.rotated,
                source_size,
                source_offset,
                pivot,
            )),
        }
    }
}

#[derive(Debug, Default)]
pub struct SpriteLoader;

impl Loader for SpriteLoader {
    fn kind(&self) -> AssetKind {
        AssetKind::Sprite
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], options: LoadOptions) -> Result<()> {
        let sheet: RawSheet = serde_json::from_slice(data)?;
        let image = sheet
            .meta
            .and_then(|m| m.image)
            .ok_or(LoadError::MissingField("meta.image"))?;
        let raw_frames = sheet.frames.ok_or(LoadError::MissingField("frames"))?;

        let texture = match ctx.cache.texture(&image) {
            Some(texture) => texture,
            None => {
                ctx.load_dependency(AssetKind::Image, &image, &image, options)?;
                ctx.cache
                    .texture(&image)
                    .ok_or_else(|| LoadError::MissingTexture(image.clone()))?
            }
        };
        let texture_size = texture.size().as_vec2();

        let frames = raw_frames
            .into_iter()
            .map(|f| f.into_frame(texture_size))
            .collect::<Result<Vec<_>>>()?;

        let mut animations = HashMap::new();
        animations.insert(
            String::new(),
            SpriteAnimation {
                frames,
                ..SpriteAnimation::default()
            },
        );
        ctx.bundle.set_sprite_data(
            name,
            SpriteData {
                texture: Some(texture),
                animations,
                blend_mode: BlendMode::Alpha,
                shader: None,
            },
        );
        Ok(())
    }
}
