//! TrueType/OpenType fonts, rasterized once into a single-page atlas.
//!
//! The result is an ordinary [`Font`], so text drawn with it goes through
//! the same mesh path as bitmap fonts. Glyph metrics are in texels at
//! [`PIXEL_HEIGHT`]; a `font_size` of 1 draws text at that height.

use std::collections::HashMap;
use std::sync::Arc;

use fontdue::FontSettings;
use glam::UVec2;

use crate::assets::asset::{AssetKind, LoadOptions};
use crate::assets::loader::{LoadContext, Loader};
use crate::error::{LoadError, Result};
use crate::renderer::traits::PixelFormat;
use crate::resources::{Font, Glyph, Texture};

/// Height glyphs are rasterized at.
pub const PIXEL_HEIGHT: f32 = 32.0;

/// Printable ASCII.
const CHARS: std::ops::RangeInclusive<char> = ' '..='~';
/// Empty texels around each atlas cell.
const SPACING: u32 = 2;
const COLUMNS: u32 = 16;

/// sfnt version tags: TrueType, Apple TrueType, CFF OpenType, collection.
const MAGICS: [&[u8]; 4] = [b"\x00\x01\x00\x00", b"true", b"OTTO", b"ttcf"];

/// One rasterized glyph before packing.
#[derive(Debug, Clone, Default)]
struct RasterGlyph {
    code: u32,
    width: u32,
    height: u32,
    /// Left bearing.
    x_offset: f32,
    /// Distance from the line top down to the bitmap top.
    y_offset: f32,
    advance: f32,
    /// Row-major coverage, `width * height` bytes.
    coverage: Vec<u8>,
}

/// Lay glyphs out on a grid. Returns the atlas size, its RGBA pixels
/// (white, coverage in alpha) and the glyph table.
fn pack(glyphs: &[RasterGlyph]) -> (UVec2, Vec<u8>, HashMap<u32, Glyph>) {
    let cell = UVec2::new(
        glyphs.iter().map(|g| g.width).max().unwrap_or(0) + SPACING,
        glyphs.iter().map(|g| g.height).max().unwrap_or(0) + SPACING,
    );
    let columns = COLUMNS.min(glyphs.len() as u32).max(1);
    let rows = (glyphs.len() as u32).div_ceil(columns).max(1);
    let size = UVec2::new(cell.x * columns, cell.y * rows);

    let mut pixels = [255u8, 255, 255, 0].repeat((size.x * size.y) as usize);
    let mut table = HashMap::with_capacity(glyphs.len());

    for (i, g) in glyphs.iter().enumerate() {
        let i = i as u32;
        let origin = UVec2::new(i % columns * cell.x, i / columns * cell.y);
        for y in 0..g.height {
            for x in 0..g.width {
                let src = (y * g.width + x) as usize;
                let dst = ((origin.y + y) * size.x + origin.x + x) as usize;
                pixels[dst * 4 + 3] = g.coverage[src];
            }
        }
        table.insert(
            g.code,
            Glyph {
                x: origin.x as f32,
                y: origin.y as f32,
                width: g.width as f32,
                height: g.height as f32,
                x_offset: g.x_offset,
                y_offset: g.y_offset,
                x_advance: g.advance,
                page: 0,
            },
        );
    }
    (size, pixels, table)
}

fn texels(value: u32, field: &'static str) -> Result<u16> {
    u16::try_from(value).map_err(|_| LoadError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

#[derive(Debug, Default)]
pub struct TtfLoader;

impl Loader for TtfLoader {
    fn kind(&self) -> AssetKind {
        AssetKind::Font
    }

    fn accepts(&self, data: &[u8]) -> bool {
        MAGICS.iter().any(|magic| data.starts_with(magic))
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], options: LoadOptions) -> Result<()> {
        let face = fontdue::Font::from_bytes(data, FontSettings::default()).map_err(LoadError::TrueType)?;
        let line = face
            .horizontal_line_metrics(PIXEL_HEIGHT)
            .ok_or(LoadError::MissingField("horizontal line metrics"))?;

        let mut rasterized = Vec::new();
        for c in CHARS {
            if face.lookup_glyph_index(c) == 0 {
                continue;
            }
            let (metrics, coverage) = face.rasterize(c, PIXEL_HEIGHT);
            rasterized.push(RasterGlyph {
                code: u32::from(c),
                width: metrics.width as u32,
                height: metrics.height as u32,
                x_offset: metrics.xmin as f32,
                y_offset: line.ascent - (metrics.ymin + metrics.height as i32) as f32,
                advance: metrics.advance_width,
                coverage,
            });
        }

        let mut kerning = HashMap::new();
        for left in CHARS.filter(|&c| face.lookup_glyph_index(c) != 0) {
            for right in CHARS.filter(|&c| face.lookup_glyph_index(c) != 0) {
                let kern = face.horizontal_kern(left, right, PIXEL_HEIGHT).unwrap_or(0.0).round();
                if kern != 0.0 {
                    kerning.insert((u32::from(left), u32::from(right)), kern as i16);
                }
            }
        }

        let (size, pixels, glyphs) = pack(&rasterized);
        let mip_levels = if options.mipmaps { 0 } else { 1 };
        let texture = Texture::create(&mut *ctx.renderer, size, &pixels, mip_levels, PixelFormat::Rgba8UNorm);

        let font = Font {
            line_height: line.new_line_size.ceil() as u16,
            base: line.ascent.round() as u16,
            width: texels(size.x, "atlas width")?,
            height: texels(size.y, "atlas height")?,
            pages: 1,
            outline: 0,
            glyphs,
            kerning,
            texture: Some(Arc::new(texture)),
        };
        log::debug!("{}: {} glyphs in a {}x{} atlas", name, font.glyphs.len(), size.x, size.y);
        ctx.bundle.set_font(name, font);
        Ok(())
    }
}
