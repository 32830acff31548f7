//! AngelCode BMFont text descriptor loader.
//!
//! Each line is `keyword key=value key=value ...`. Recognized keywords are
//! `page`, `common`, `char`, `kernings` and `kerning`; anything else is
//! skipped, as are unknown keys.

use super::tokenizer::{is_newline, Tokenizer};
use crate::assets::asset::{AssetKind, LoadOptions};
use crate::assets::loader::{LoadContext, Loader};
use crate::error::{Result, TextError};
use crate::resources::{Font, Glyph};

/// Parse an integer value and narrow it to the field's type.
fn int<T: TryFrom<i64>>(t: &mut Tokenizer<'_>) -> std::result::Result<T, TextError> {
    T::try_from(t.parse_i64()?).map_err(|_| TextError::InvalidInteger)
}

/// Run `f` for every `key=value` pair up to the end of the line.
/// `f` must consume the value.
fn for_each_pair<'a>(
    t: &mut Tokenizer<'a>,
    mut f: impl FnMut(&'a str, &mut Tokenizer<'a>) -> std::result::Result<(), TextError>,
) -> std::result::Result<(), TextError> {
    loop {
        t.skip_whitespace();
        if t.at_line_end() {
            return Ok(());
        }
        let key = t.parse_key_or_quoted()?;
        t.expect_token(b'=')?;
        f(key, t)?;
    }
}

fn skip_value(t: &mut Tokenizer<'_>) -> std::result::Result<(), TextError> {
    t.parse_key_or_quoted().map(|_| ())
}

/// Font metrics plus the page file names, before textures are resolved.
#[derive(Debug, Default)]
struct ParsedFont {
    font: Font,
    page_file: Option<String>,
    kerning_count: u32,
}

fn parse_font(data: &[u8]) -> std::result::Result<ParsedFont, TextError> {
    let mut t = Tokenizer::new(data);
    let mut parsed = ParsedFont::default();

    while !t.is_at_end() {
        if t.peek().is_some_and(is_newline) {
            t.advance();
            continue;
        }
        t.skip_whitespace();
        if t.at_line_end() {
            continue;
        }

        let keyword = t.parse_word()?;
        match keyword {
            "page" => for_each_pair(&mut t, |key, t| {
                let value = t.parse_key_or_quoted()?;
                if key == "file" {
                    parsed.page_file = Some(value.to_string());
                }
                Ok(())
            })?,
            "common" => {
                let font = &mut parsed.font;
                for_each_pair(&mut t, |key, t| {
                    match key {
                        "lineHeight" => font.line_height = int(t)?,
                        "base" => font.base = int(t)?,
                        "scaleW" => font.width = int(t)?,
                        "scaleH" => font.height = int(t)?,
                        "pages" => font.pages = int(t)?,
                        "outline" => font.outline = int(t)?,
                        _ => skip_value(t)?,
                    }
                    Ok(())
                })?
            }
            "char" => {
                let mut id = 0u32;
                let mut glyph = Glyph::default();
                for_each_pair(&mut t, |key, t| {
                    match key {
                        "id" => id = int(t)?,
                        "x" => glyph.x = t.parse_i32()? as f32,
                        "y" => glyph.y = t.parse_i32()? as f32,
                        "width" => glyph.width = t.parse_i32()? as f32,
                        "height" => glyph.height = t.parse_i32()? as f32,
                        "xoffset" => glyph.x_offset = t.parse_i32()? as f32,
                        "yoffset" => glyph.y_offset = t.parse_i32()? as f32,
                        "xadvance" => glyph.x_advance = t.parse_i32()? as f32,
                        "page" => glyph.page = int(t)?,
                        _ => skip_value(t)?,
                    }
                    Ok(())
                })?;
                parsed.font.glyphs.insert(id, glyph);
            }
            "kernings" => {
                let count = &mut parsed.kerning_count;
                for_each_pair(&mut t, |key, t| {
                    match key {
                        "count" => *count = int(t)?,
                        _ => skip_value(t)?,
                    }
                    Ok(())
                })?
            }
            "kerning" => {
                let (mut first, mut second, mut amount) = (0u32, 0u32, 0i16);
                for_each_pair(&mut t, |key, t| {
                    match key {
                        "first" => first = int(t)?,
                        "second" => second = int(t)?,
                        "amount" => amount = int(t)?,
                        _ => skip_value(t)?,
                    }
                    Ok(())
                })?;
                parsed.font.kerning.insert((first, second), amount);
            }
            _ => t.skip_line(),
        }
    }

    Ok(parsed)
}

#[derive(Debug, Default)]
pub struct BmFontLoader;

impl Loader for BmFontLoader {
    fn kind(&self) -> AssetKind {
        AssetKind::Font
    }

    fn load(&self, ctx: &mut LoadContext<'_>, name: &str, data: &[u8], options: LoadOptions) -> Result<()> {
        let ParsedFont {
            mut font,
            page_file,
            kerning_count,
        } = parse_font(data)?;

        if kerning_count as usize != font.kerning.len() {
            log::debug!(
                "{}: kernings count {} but {} pairs listed",
                name,
                kerning_count,
                font.kerning.len()
            );
        }

        if let Some(file) = page_file {
            if ctx.cache.texture(&file).is_none() {
                if let Err(err) = ctx.load_dependency(AssetKind::Image, &file, &file, options) {
                    log::warn!("{}: failed to load page {}: {}", name, file, err);
                }
            }
            font.texture = ctx.cache.texture(&file);
            if font.texture.is_none() {
                log::warn!("{}: page texture {} is not available", name, file);
            }
        }

        ctx.bundle.set_font(name, font);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::sync::Arc;

    use glam::UVec2;

    use crate::assets::bundle::Bundle;
    use crate::assets::cache::Cache;
    use crate::assets::fs::MemoryFileSystem;
    use crate::renderer::headless::HeadlessRenderer;
    use crate::renderer::traits::PixelFormat;
    use crate::resources::Texture;

    const ARIAL: &str = "info face=\"Arial Bold\" size=32 bold=1\n\
common lineHeight=36 base=29 scaleW=256 scaleH=128 pages=1 packed=0 outline=2\n\
page id=0 file=\"arial.png\"\n\
chars count=2\n\
char id=65 x=10 y=20 width=18 height=22 xoffset=-1 yoffset=7 xadvance=17 page=0 chnl=15   \n\
\n\
char id=86 x=30   y=20 width=19 height=22 xoffset=0 yoffset=7 xadvance=18 page=0 chnl=15\r\n\
kernings count=1\n\
kerning first=65 second=86 amount=-2";

    #[test]
    fn parses_metrics_glyphs_and_kerning() {
        let parsed = parse_font(ARIAL.as_bytes()).unwrap();
        let font = parsed.font;
        assert_eq!(font.line_height, 36);
        assert_eq!(font.base, 29);
        assert_eq!((font.width, font.height), (256, 128));
        assert_eq!(font.pages, 1);
        assert_eq!(font.outline, 2);
        assert_eq!(parsed.page_file.as_deref(), Some("arial.png"));
        assert_eq!(parsed.kerning_count, 1);

        let a = font.glyphs[&65];
        assert_eq!(a.x, 10.0);
        assert_eq!(a.x_offset, -1.0);
        assert_eq!(a.x_advance, 17.0);
        assert_eq!(font.glyphs[&86].width, 19.0);
        assert_eq!(font.kerning_pair(65, 86), -2);
        assert_eq!(font.kerning_pair(86, 65), 0);
    }

    #[test]
    fn missing_equals_is_an_error() {
        let err = parse_font(b"common lineHeight 36\n").unwrap_err();
        assert_eq!(err, TextError::UnexpectedToken('='));
    }

    #[test]
    fn bad_number_is_an_error() {
        assert_eq!(parse_font(b"char id=x\n").unwrap_err(), TextError::InvalidInteger);
        assert_eq!(parse_font(b"common base=70000\n").unwrap_err(), TextError::InvalidInteger);
    }

    #[test]
    fn loader_resolves_cached_page_texture() {
        let cache = Cache::default();
        cache.add_loader(Rc::new(BmFontLoader));
        let fs = MemoryFileSystem::new().with_file("arial.fnt", ARIAL);
        let bundle = Bundle::new(&cache, Rc::new(fs));
        let mut renderer = HeadlessRenderer::new();

        let page = Arc::new(Texture::create(
            &mut renderer,
            UVec2::new(256, 128),
            &[],
            1,
            PixelFormat::Rgba8UNorm,
        ));
        bundle.set_texture("arial.png", page.clone());

        bundle
            .load_asset(&mut renderer, AssetKind::Font, "arial", "arial.fnt", LoadOptions::default())
            .unwrap();
        let texture = cache.with_font("arial", |f| f.texture.clone()).flatten().unwrap();
        assert!(Arc::ptr_eq(&texture, &page));
    }

    #[test]
    fn unresolved_page_keeps_font() {
        let cache = Cache::default();
        cache.add_loader(Rc::new(BmFontLoader));
        let fs = MemoryFileSystem::new().with_file("arial.fnt", ARIAL);
        let bundle = Bundle::new(&cache, Rc::new(fs));
        let mut renderer = HeadlessRenderer::new();

        bundle
            .load_asset(&mut renderer, AssetKind::Font, "arial", "arial.fnt", LoadOptions::default())
            .unwrap();
        let font = bundle.font("arial").unwrap();
        assert!(font.texture.is_none());
        assert_eq!(font.glyphs.len(), 2);
    }
}
