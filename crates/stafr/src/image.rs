//! # Image — CPU-Side Pixel Buffers
//!
//! Every stage of the atlas pipeline works on plain byte buffers: the
//! rasterizer produces little grayscale images, the packer pastes them into
//! page-sized ones, and the colorize step expands grayscale coverage into
//! RGBA just before the page is handed to a texture. Keeping this a dumb
//! owned buffer (no GPU types, no `image` crate types) means glyphs can be
//! moved around freely and the disk codecs only appear at the save/load
//! boundary.
//!
//! Addressing is row-major, top-down: pixel `(x, y)` starts at byte
//! `(y * width + x) * components`. Component counts are 1 (grayscale
//! coverage) or 4 (RGBA).
//!
//! ## The Triangular Blur
//!
//! [`Image::blur_triangle`] is a separable tent filter: a 1-D kernel
//! `(1, 2, …, r+1, …, 2, 1) / (r+1)²` run once along each axis. Two tent
//! passes approximate a Gaussian closely enough for glyph glow/shadow
//! effects at a fraction of the cost, and the integer weights keep the whole
//! thing in fixed-point. Edges clamp to the border pixel. The filter never
//! grows the buffer — callers that want the halo to survive use
//! [`Image::blur_expanded`], which pads by the radius first.

use crate::math::{IVec2, unpack_abgr};

/// An owned, heap-allocated pixel rectangle.
///
/// The buffer is exclusively owned: an `Image` can be moved into a glyph or
/// a page, but never aliased. There is deliberately no `Clone`.
#[derive(Debug, Default)]
pub struct Image {
    width: i32,
    height: i32,
    components: i32,
    data: Vec<u8>,
}

impl Image {
    /// Create a zero-initialized image. `components` must be 1 or 4.
    pub fn new(width: i32, height: i32, components: i32) -> Self {
        debug_assert!(width >= 0 && height >= 0);
        debug_assert!(components == 1 || components == 4);
        Self {
            width,
            height,
            components,
            data: vec![0; (width * height * components) as usize],
        }
    }

    /// Wrap an existing buffer. `data.len()` must equal
    /// `width * height * components`.
    pub fn from_raw(width: i32, height: i32, components: i32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * components) as usize);
        Self {
            width,
            height,
            components,
            data,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    pub fn components(&self) -> i32 {
        self.components
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The components of the pixel at `(x, y)`.
    pub fn pixel(&self, x: i32, y: i32) -> &[u8] {
        let i = ((y * self.width + x) * self.components) as usize;
        &self.data[i..i + self.components as usize]
    }

    /// Mutable access to the pixel at `(x, y)`.
    pub fn pixel_mut(&mut self, x: i32, y: i32) -> &mut [u8] {
        let i = ((y * self.width + x) * self.components) as usize;
        &mut self.data[i..i + self.components as usize]
    }

    /// Copy `source` into this image with its top-left corner at `position`.
    ///
    /// Component counts must match and the source must fit entirely inside
    /// this image; otherwise nothing is copied and `false` is returned.
    pub fn paste(&mut self, source: &Image, position: IVec2) -> bool {
        if source.components != self.components {
            log::error!(
                "paste: component mismatch ({} into {})",
                source.components,
                self.components
            );
            return false;
        }
        if position.x < 0
            || position.y < 0
            || position.x + source.width > self.width
            || position.y + source.height > self.height
        {
            log::error!(
                "paste: {}x{} at ({}, {}) does not fit in {}x{}",
                source.width,
                source.height,
                position.x,
                position.y,
                self.width,
                self.height
            );
            return false;
        }

        let row_bytes = (source.width * source.components) as usize;
        for y in 0..source.height {
            let src = (y * source.width * source.components) as usize;
            let dst =
                (((position.y + y) * self.width + position.x) * self.components) as usize;
            self.data[dst..dst + row_bytes].copy_from_slice(&source.data[src..src + row_bytes]);
        }
        true
    }

    /// In-place separable triangular blur on a grayscale image.
    ///
    /// A radius of zero (or less) is the identity. The kernel is
    /// `(1, 2, …, r+1, …, 2, 1)` normalized by `(r+1)²` per axis, with
    /// out-of-range taps clamped to the border pixel.
    pub fn blur_triangle(&mut self, radius: i32) {
        if radius <= 0 {
            return;
        }
        debug_assert_eq!(self.components, 1, "blur_triangle is grayscale-only");
        if self.width == 0 || self.height == 0 {
            return;
        }

        let w = self.width as usize;
        let h = self.height as usize;
        let denom = ((radius + 1) * (radius + 1)) as u32;
        let half = denom / 2;
        let mut tmp = vec![0u8; w * h];

        // Horizontal pass: self -> tmp.
        for y in 0..h {
            let row = &self.data[y * w..(y + 1) * w];
            for x in 0..w {
                let mut acc = 0u32;
                for d in -radius..=radius {
                    let sx = (x as i32 + d).clamp(0, self.width - 1) as usize;
                    let weight = (radius + 1 - d.abs()) as u32;
                    acc += row[sx] as u32 * weight;
                }
                tmp[y * w + x] = ((acc + half) / denom) as u8;
            }
        }

        // Vertical pass: tmp -> self.
        for x in 0..w {
            for y in 0..h {
                let mut acc = 0u32;
                for d in -radius..=radius {
                    let sy = (y as i32 + d).clamp(0, self.height - 1) as usize;
                    let weight = (radius + 1 - d.abs()) as u32;
                    acc += tmp[sy * w + x] as u32 * weight;
                }
                self.data[y * w + x] = ((acc + half) / denom) as u8;
            }
        }
    }

    /// Consume this image and return a blurred copy grown by `radius` pixels
    /// on every side.
    ///
    /// The original content sits at `(radius, radius)` in the result, so the
    /// caller's anchor point shifts by `-radius` on both axes.
    pub fn blur_expanded(self, radius: i32) -> Image {
        if radius <= 0 {
            return self;
        }
        let mut out = Image::new(
            self.width + 2 * radius,
            self.height + 2 * radius,
            self.components,
        );
        out.paste(&self, IVec2::splat(radius));
        out.blur_triangle(radius);
        out
    }

    /// Expand a grayscale image into RGBA using `color` (`0xAABBGGRR`).
    ///
    /// RGB are copied from the color; the alpha channel is the grayscale
    /// coverage scaled by the color's alpha.
    pub fn to_rgba(&self, color: u32) -> Image {
        debug_assert_eq!(self.components, 1, "to_rgba expects a grayscale source");
        let [r, g, b, a] = unpack_abgr(color);
        let mut out = Image::new(self.width, self.height, 4);
        for (i, &coverage) in self.data.iter().enumerate() {
            let p = &mut out.data[i * 4..i * 4 + 4];
            p[0] = r;
            p[1] = g;
            p[2] = b;
            p[3] = ((coverage as u32 * a as u32) / 255) as u8;
        }
        out
    }
}
