//! # SpriteFont — Building Glyph Atlases
//!
//! The build pipeline, per recipe:
//!
//! ```text
//!  FontFace ──► (code point, glyph index) walk
//!                  │  GlyphStyle::rasterize, one RenderedGlyph each
//!                  ▼
//!             AtlasPacker ──► pages + placed glyphs
//!                  │
//!                  ▼
//!     colorize pages ──► Texture ──► TextureCache registration
//!                  │
//!                  ▼
//!        code point → Glyph index map, line height, build timing
//! ```
//!
//! A build never returns an error: global failures (missing file, no Unicode
//! charmap) are logged and leave the font empty but usable, and per-glyph
//! rasterization failures are logged and skipped so one broken outline does
//! not sink the whole atlas.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::face::FontFace;
use crate::math::{IVec2, IntRect, round_26_6};
use crate::packer::AtlasPacker;
use crate::raster::GlyphStyle;
use crate::settings::{
    ContourFontSettings, FontSettings, OutlinedFontSettings, SimpleFontSettings,
};
use crate::texture::{Texture, TextureCache};

/// One entry of the atlas index: where a code point's pixels live and how to
/// advance the pen after drawing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    /// Pixel rectangle inside the page texture.
    pub rect: IntRect,
    /// Pen-to-top-left displacement at render time.
    pub offset: IVec2,
    /// Horizontal pen advance in pixels.
    pub advance_x: i32,
    /// Index of the page texture holding `rect`.
    pub page: i32,
}

/// A bitmap font: atlas page textures plus a code-point index into them.
///
/// Not `Clone` — the page textures are shared with the [`TextureCache`]
/// through `Arc`, but the font itself owns its glyph map exclusively.
#[derive(Debug, Default)]
pub struct SpriteFont {
    pub(crate) face_name: String,
    pub(crate) font_size: i32,
    pub(crate) line_height: i32,
    pub(crate) textures: Vec<Arc<Texture>>,
    pub(crate) glyphs: HashMap<u32, Glyph>,
    pub(crate) build_millis: Option<u64>,
}

impl SpriteFont {
    /// Rasterize every glyph of a font as-is (optionally blurred) and pack
    /// the result into atlas pages.
    pub fn build_simple(settings: &SimpleFontSettings, cache: &mut TextureCache) -> SpriteFont {
        Self::build(
            &settings.base,
            GlyphStyle::Simple {
                blur_radius: settings.blur_radius,
                color: settings.color,
            },
            cache,
        )
    }

    /// Build an atlas of stroked glyph outlines (no fill).
    pub fn build_contour(settings: &ContourFontSettings, cache: &mut TextureCache) -> SpriteFont {
        Self::build(
            &settings.base,
            GlyphStyle::Contour {
                thickness: settings.thickness,
                blur_radius: settings.blur_radius,
                color: settings.color,
            },
            cache,
        )
    }

    /// Build an atlas of solid glyphs with a colored border.
    pub fn build_outlined(
        settings: &OutlinedFontSettings,
        cache: &mut TextureCache,
    ) -> SpriteFont {
        Self::build(
            &settings.base,
            GlyphStyle::Outlined {
                main_color: settings.main_color,
                outline_color: settings.outline_color,
                outline_thickness: settings.outline_thickness,
                outline_blur_radius: settings.outline_blur_radius,
            },
            cache,
        )
    }

    fn build(base: &FontSettings, style: GlyphStyle, cache: &mut TextureCache) -> SpriteFont {
        let start = Instant::now();
        let mut font = SpriteFont::default();

        let mut face = match FontFace::open(&base.src_path, base.height) {
            Ok(face) => face,
            Err(e) => {
                log::error!(
                    "cannot build sprite font from '{}': {e:#}",
                    base.src_path.display()
                );
                return font;
            }
        };
        font.face_name = face.family_name().to_owned();
        font.font_size = base.height as i32;

        let mut packer = AtlasPacker::with_capacity(face.num_glyphs());
        for (code_point, glyph_index) in face.char_codes() {
            match style.rasterize(&face, code_point, glyph_index, base.anti_aliasing) {
                Ok(glyph) => packer.push(glyph),
                Err(e) => log::warn!("skipping glyph U+{code_point:04X}: {e:#}"),
            }
        }

        let (pages, packed) = packer.pack(base.texture_size, style.components());

        font.line_height =
            (round_26_6(face.line_height_26_6()) + style.line_height_adjustment()).max(1);

        for glyph in &packed {
            font.glyphs.insert(
                glyph.code_point,
                Glyph {
                    rect: glyph.rect,
                    offset: glyph.offset,
                    advance_x: glyph.advance_x,
                    page: glyph.page,
                },
            );
        }

        for (index, page) in pages.into_iter().enumerate() {
            // Outlined pages come out of the packer already RGBA.
            let rgba = match style.page_color() {
                Some(color) => page.to_rgba(color),
                None => page,
            };
            let key = format!("{}_{}px_{}", font.face_name, font.font_size, index);
            let texture = Arc::new(Texture::from_image(key.clone(), rgba));
            cache.insert(key, texture.clone());
            font.textures.push(texture);
        }

        font.build_millis = Some(start.elapsed().as_millis() as u64);
        log::info!(
            "built sprite font '{}' at {}px: {} glyphs on {} pages in {} ms",
            font.face_name,
            font.font_size,
            font.glyphs.len(),
            font.textures.len(),
            font.build_millis.unwrap_or(0)
        );
        font
    }

    /// The typeface name this font was built from.
    pub fn face_name(&self) -> &str {
        &self.face_name
    }

    /// The source pixel size the face was opened at.
    pub fn font_size(&self) -> i32 {
        self.font_size
    }

    /// Baseline-to-baseline distance in pixels (stroke-adjusted).
    pub fn line_height(&self) -> i32 {
        self.line_height
    }

    /// The atlas page textures, in page-index order.
    pub fn textures(&self) -> &[Arc<Texture>] {
        &self.textures
    }

    /// The full code-point index.
    pub fn glyphs(&self) -> &HashMap<u32, Glyph> {
        &self.glyphs
    }

    /// Look up a single code point.
    pub fn glyph(&self, code_point: u32) -> Option<&Glyph> {
        self.glyphs.get(&code_point)
    }

    /// Wall-clock milliseconds the build took, if this font was built (as
    /// opposed to loaded).
    pub fn build_millis(&self) -> Option<u64> {
        self.build_millis
    }
}
