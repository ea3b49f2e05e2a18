//! # Raster — Glyph Rendering Recipes
//!
//! One font can be baked three ways:
//!
//! - **Simple** — the glyph as the font designed it, optionally blurred.
//! - **Contour** — only the stroked outline of the glyph shape, drawn with a
//!   round-cap/round-join stroker. The fill is discarded.
//! - **Outlined** — the solid glyph composited over an inflated copy of
//!   itself, each in its own color, producing a bordered letter in a single
//!   RGBA image.
//!
//! All three share the same metric convention: `offset` is the pen-to-top-left
//! displacement (`x` from the horizontal bearing, `y` from ascender minus
//! bearing), `advance_x` the pen advance, all rounded from FreeType's 26.6
//! fixed-point. Stroked recipes widen the advance by the stroke so neighboring
//! letters do not collide.
//!
//! ## The Outlined Composite
//!
//! The inner glyph is laid over the colorized outline with a mask-weighted
//! overwrite, **not** alpha blending: for coverage `m`, every destination
//! channel becomes `(m·main + (255−m)·dst) / 255`. Alpha blending would
//! re-multiply the outline's soft edge under the body and visibly thin it;
//! the mask weighting keeps the border's antialiased ramp intact while the
//! body takes over wherever the inner mask is solid.

use anyhow::{Context, Result, bail};
use freetype::bitmap::PixelMode;
use freetype::face::LoadFlag;
use freetype::{Bitmap, RenderMode, StrokerLineCap, StrokerLineJoin, ffi};

use crate::face::FontFace;
use crate::image::Image;
use crate::math::{IVec2, IntRect, round_26_6, unpack_abgr};

/// One rasterized glyph on its way into an atlas.
///
/// `page` and `rect` are placeholders until the packer fills them in. Owns
/// its image; moved into the packer and out again, never copied.
#[derive(Debug)]
pub struct RenderedGlyph {
    pub image: Image,
    pub code_point: u32,
    pub offset: IVec2,
    pub advance_x: i32,
    pub page: i32,
    pub rect: IntRect,
}

impl RenderedGlyph {
    /// Apply a triangular blur of `radius`, growing the image by `2·radius`
    /// per axis and shifting the offset by `−radius` to keep the glyph
    /// anchored at the same pen position.
    pub fn blur(&mut self, radius: i32) {
        if radius <= 0 {
            return;
        }
        let image = std::mem::take(&mut self.image);
        self.image = image.blur_expanded(radius);
        self.offset -= IVec2::splat(radius);
    }
}

/// The per-glyph rasterization strategy; one variant per build recipe.
#[derive(Debug, Clone, Copy)]
pub enum GlyphStyle {
    Simple {
        blur_radius: i32,
        color: u32,
    },
    Contour {
        thickness: f32,
        blur_radius: i32,
        color: u32,
    },
    Outlined {
        main_color: u32,
        outline_color: u32,
        outline_thickness: f32,
        outline_blur_radius: i32,
    },
}

impl GlyphStyle {
    /// Component count of the images this style produces (and of the atlas
    /// pages that hold them).
    pub fn components(&self) -> i32 {
        match self {
            GlyphStyle::Outlined { .. } => 4,
            _ => 1,
        }
    }

    /// The color grayscale pages are expanded with; `None` when pages are
    /// already RGBA.
    pub fn page_color(&self) -> Option<u32> {
        match *self {
            GlyphStyle::Simple { color, .. } | GlyphStyle::Contour { color, .. } => Some(color),
            GlyphStyle::Outlined { .. } => None,
        }
    }

    /// How much this style adds to the font's baseline-to-baseline distance.
    pub fn line_height_adjustment(&self) -> i32 {
        match *self {
            GlyphStyle::Simple { .. } => 0,
            GlyphStyle::Contour { thickness, .. } => thickness.round() as i32,
            GlyphStyle::Outlined {
                outline_thickness, ..
            } => (2.0 * outline_thickness).round() as i32,
        }
    }

    /// Render one glyph according to this style.
    pub fn rasterize(
        &self,
        face: &FontFace,
        code_point: u32,
        glyph_index: u32,
        anti_aliasing: bool,
    ) -> Result<RenderedGlyph> {
        // Monochrome targets hint for 1-bit output and render a packed
        // bitmap that bitmap_to_gray expands back to 0/255 bytes.
        let (load_flags, render_mode) = if anti_aliasing {
            (LoadFlag::DEFAULT, RenderMode::Normal)
        } else {
            (LoadFlag::TARGET_MONO, RenderMode::Mono)
        };

        match *self {
            GlyphStyle::Simple { blur_radius, .. } => {
                face.face()
                    .load_glyph(glyph_index, load_flags)
                    .context("loading glyph")?;
                let slot = face.face().glyph();
                slot.render_glyph(render_mode).context("rendering glyph")?;
                let metrics = slot.metrics();
                let image = bitmap_to_gray(&slot.bitmap())?;

                let mut glyph = placed(face, image, code_point, &metrics, 0);
                glyph.blur(blur_radius);
                Ok(glyph)
            }

            GlyphStyle::Contour {
                thickness,
                blur_radius,
                ..
            } => {
                face.face()
                    .load_glyph(glyph_index, load_flags | LoadFlag::NO_BITMAP)
                    .context("loading glyph outline")?;
                let slot = face.face().glyph();
                let metrics = slot.metrics();

                // The stroker radius is the half-width of the stroke, in the
                // outline's 26.6 units: thickness/2 pixels = thickness * 32.
                let stroker = face.library().new_stroker().context("creating stroker")?;
                stroker.set(
                    (thickness * 32.0) as ffi::FT_Fixed,
                    StrokerLineCap::Round,
                    StrokerLineJoin::Round,
                    0,
                );
                let stroked = slot
                    .get_glyph()
                    .context("taking glyph outline")?
                    .stroke(&stroker)
                    .context("stroking outline")?;
                let rendered = stroked
                    .to_bitmap(render_mode, None)
                    .context("rendering stroked outline")?;
                let image = bitmap_to_gray(&rendered.bitmap())?;

                let mut glyph =
                    placed(face, image, code_point, &metrics, thickness.round() as i32);
                glyph.blur(blur_radius);
                Ok(glyph)
            }

            GlyphStyle::Outlined {
                main_color,
                outline_color,
                outline_thickness,
                outline_blur_radius,
            } => {
                face.face()
                    .load_glyph(glyph_index, load_flags | LoadFlag::NO_BITMAP)
                    .context("loading glyph outline")?;
                let slot = face.face().glyph();
                let metrics = slot.metrics();
                let source = slot.get_glyph().context("taking glyph outline")?;

                // Inner pass: the body, rendered as-is.
                let inner = source
                    .to_bitmap(render_mode, None)
                    .context("rendering glyph body")?;
                let inner_image = bitmap_to_gray(&inner.bitmap())?;
                let inner_origin = IVec2::new(inner.left(), inner.top());

                // Outer pass: the outside border of the same outline,
                // inflated by the full outline thickness (26.6 units).
                let stroker = face.library().new_stroker().context("creating stroker")?;
                stroker.set(
                    (outline_thickness * 64.0) as ffi::FT_Fixed,
                    StrokerLineCap::Round,
                    StrokerLineJoin::Round,
                    0,
                );
                let bordered = source
                    .stroke_border(&stroker, false)
                    .context("stroking glyph border")?;
                let outer = bordered
                    .to_bitmap(render_mode, None)
                    .context("rendering glyph border")?;
                let mut outer_image = bitmap_to_gray(&outer.bitmap())?;
                let outer_origin = IVec2::new(outer.left(), outer.top());

                let mut glyph = placed(
                    face,
                    Image::default(),
                    code_point,
                    &metrics,
                    (2.0 * outline_thickness).round() as i32,
                );

                if outline_blur_radius > 0 {
                    outer_image = outer_image.blur_expanded(outline_blur_radius);
                    glyph.offset -= IVec2::splat(outline_blur_radius);
                }

                let mut rgba = outer_image.to_rgba(outline_color);

                let mut delta = IVec2::new(
                    inner_origin.x - outer_origin.x,
                    outer_origin.y - inner_origin.y,
                );
                if outline_blur_radius > 0 {
                    delta += IVec2::splat(outline_blur_radius);
                }

                if main_color != outline_color {
                    composite_masked(&mut rgba, &inner_image, delta, unpack_abgr(main_color));
                }

                glyph.image = rgba;
                Ok(glyph)
            }
        }
    }
}

/// Assemble a [`RenderedGlyph`] with the shared metric rules: bearings and
/// advance rounded from 26.6, plus a per-style widening of the advance.
fn placed(
    face: &FontFace,
    image: Image,
    code_point: u32,
    metrics: &ffi::FT_Glyph_Metrics,
    advance_adjustment: i32,
) -> RenderedGlyph {
    RenderedGlyph {
        image,
        code_point,
        offset: IVec2::new(
            round_26_6(metrics.horiBearingX as i64),
            round_26_6(face.ascender_26_6() - metrics.horiBearingY as i64),
        ),
        advance_x: round_26_6(metrics.horiAdvance as i64) + advance_adjustment,
        page: 0,
        rect: IntRect::default(),
    }
}

/// Mask-weighted overwrite of `inner` over `dst` at `delta`:
/// `dst = (m·main + (255−m)·dst) / 255` per channel. Pixels that land
/// outside `dst` are dropped.
fn composite_masked(dst: &mut Image, inner: &Image, delta: IVec2, main: [u8; 4]) {
    for y in 0..inner.height() {
        for x in 0..inner.width() {
            let tx = x + delta.x;
            let ty = y + delta.y;
            if tx < 0 || ty < 0 || tx >= dst.width() || ty >= dst.height() {
                continue;
            }
            let m = inner.pixel(x, y)[0] as u32;
            let pixel = dst.pixel_mut(tx, ty);
            for c in 0..4 {
                pixel[c] = ((m * main[c] as u32 + (255 - m) * pixel[c] as u32) / 255) as u8;
            }
        }
    }
}

/// Copy a FreeType bitmap into an owned grayscale image.
///
/// Handles the two pixel modes the pipeline produces: 8-bit coverage and
/// 1-bit monochrome (expanded to 0/255). Pitch may exceed the row width and
/// may be negative for bottom-up bitmaps.
fn bitmap_to_gray(bitmap: &Bitmap) -> Result<Image> {
    let width = bitmap.width();
    let rows = bitmap.rows();
    if width <= 0 || rows <= 0 {
        return Ok(Image::new(0, 0, 1));
    }

    let pitch = bitmap.pitch();
    let abs_pitch = pitch.unsigned_abs() as usize;
    let buffer = bitmap.buffer();
    let mode = bitmap.pixel_mode().context("querying pixel mode")?;
    let mut image = Image::new(width, rows, 1);

    for y in 0..rows {
        let src_row = if pitch >= 0 {
            y as usize
        } else {
            (rows - 1 - y) as usize
        };
        let start = src_row * abs_pitch;
        match mode {
            PixelMode::Gray => {
                for x in 0..width {
                    image.pixel_mut(x, y)[0] = buffer[start + x as usize];
                }
            }
            PixelMode::Mono => {
                for x in 0..width {
                    let byte = buffer[start + (x / 8) as usize];
                    let on = (byte >> (7 - (x % 8) as u8)) & 1;
                    image.pixel_mut(x, y)[0] = if on != 0 { 255 } else { 0 };
                }
            }
            other => bail!("unsupported glyph pixel mode {other:?}"),
        }
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_shifts_offset_and_grows_image() {
        let mut glyph = RenderedGlyph {
            image: Image::new(4, 4, 1),
            code_point: 'A' as u32,
            offset: IVec2::new(1, 2),
            advance_x: 7,
            page: 0,
            rect: IntRect::default(),
        };
        glyph.blur(3);
        assert_eq!(glyph.image.size(), IVec2::new(10, 10));
        assert_eq!(glyph.offset, IVec2::new(-2, -1));
        assert_eq!(glyph.advance_x, 7);
    }

    #[test]
    fn blur_zero_is_a_no_op() {
        let mut glyph = RenderedGlyph {
            image: Image::new(4, 4, 1),
            code_point: 'A' as u32,
            offset: IVec2::new(1, 2),
            advance_x: 7,
            page: 0,
            rect: IntRect::default(),
        };
        glyph.blur(0);
        assert_eq!(glyph.image.size(), IVec2::new(4, 4));
        assert_eq!(glyph.offset, IVec2::new(1, 2));
    }

    #[test]
    fn masked_composite_is_not_alpha_blending() {
        // Destination: solid "outline" color everywhere.
        let gray = Image::from_raw(2, 1, 1, vec![255, 128]);
        let mut dst = gray.to_rgba(0xFF0000FF); // opaque red, 0xAABBGGRR

        // Inner mask: fully solid at (0,0), half at (1,0).
        let inner = Image::from_raw(2, 1, 1, vec![255, 128]);
        composite_masked(&mut dst, &inner, IVec2::ZERO, unpack_abgr(0xFFFFFFFF));

        // m = 255: destination fully replaced by the main color.
        assert_eq!(dst.pixel(0, 0), &[255, 255, 255, 255]);
        // m = 128: per-channel lerp between main and what was underneath.
        let p = dst.pixel(1, 0);
        assert_eq!(p[0] as u32, (128 * 255 + 127 * 255) / 255); // red stays full
        assert_eq!(p[1] as u32, (128 * 255) / 255); // green lifted by the mask only
        assert_eq!(p[3] as u32, (128 * 255 + 127 * 128) / 255);
    }

    #[test]
    fn masked_composite_clips_to_destination() {
        let mut dst = Image::new(2, 2, 4);
        let inner = Image::from_raw(2, 2, 1, vec![255; 4]);
        // Shift so only (1,1) of the destination is touched.
        composite_masked(&mut dst, &inner, IVec2::new(1, 1), [9, 9, 9, 9]);
        assert_eq!(dst.pixel(0, 0), &[0, 0, 0, 0]);
        assert_eq!(dst.pixel(1, 1), &[9, 9, 9, 9]);
    }

    #[test]
    fn outlined_style_reports_rgba_pages() {
        let style = GlyphStyle::Outlined {
            main_color: 0xFFFFFFFF,
            outline_color: 0xFF000000,
            outline_thickness: 2.0,
            outline_blur_radius: 0,
        };
        assert_eq!(style.components(), 4);
        assert_eq!(style.page_color(), None);
        assert_eq!(style.line_height_adjustment(), 4);

        let contour = GlyphStyle::Contour {
            thickness: 2.0,
            blur_radius: 0,
            color: 0xFFFFFFFF,
        };
        assert_eq!(contour.components(), 1);
        assert_eq!(contour.line_height_adjustment(), 2);
    }
}
