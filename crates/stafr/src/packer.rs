//! # Packer — Skyline Atlas Packing
//!
//! Glyph bitmaps get packed into fixed-size pages with a skyline packer: the
//! occupied region of a page is tracked as a left-to-right sequence of
//! horizontal segments (the "skyline"), and each rectangle is placed at the
//! lowest position where it fits, leftmost on ties.
//!
//! ```text
//!  ┌────────────────────────────┐
//!  │                            │
//!  │            ┌────┐          │
//!  │  ┌──┐      │    │          │   skyline after three placements:
//!  │  │  │ ┌────┤    ├──────────│   ▁▁██▁▁████▁▁▁▁▁▁
//!  │  │  │ │    │    │          │
//!  └──┴──┴─┴────┴────┴──────────┘
//! ```
//!
//! ## Design Decisions
//!
//! **Greedy multi-page rounds.** [`AtlasPacker::pack`] runs the skyline until
//! no remaining rectangle fits, closes the page, and opens a fresh one. Walk
//! order is input order and a placed rectangle is removed by swap-and-pop, so
//! packing is fully deterministic for a given input sequence and page size.
//!
//! **Padding stays outside the reported rect.** Every rectangle is inflated
//! by [`GLYPH_PADDING`] on each side before packing, and the glyph's image is
//! pasted (and its `rect` reported) at the inner position. Neighboring glyphs
//! therefore never bleed into each other under bilinear sampling, and callers
//! can use `rect` as exact texel coordinates.
//!
//! **Oversized rectangles are dropped, not spun on.** A rectangle larger
//! than a page can never be placed; letting it ride through the rounds would
//! open empty pages forever. Such glyphs are reported with `log::error!` and
//! skipped before the first round.
//!
//! **One-shot by ownership.** `pack` consumes the packer, so packing the same
//! collection twice is a compile error rather than a runtime assert.

use crate::image::Image;
use crate::math::{IVec2, IntRect};
use crate::raster::RenderedGlyph;

/// Pixels of empty space kept on every side of every packed glyph.
pub const GLYPH_PADDING: i32 = 2;

#[derive(Debug, Clone, Copy)]
struct SkylineNode {
    x: i32,
    y: i32,
    width: i32,
}

/// Single-page skyline packer over a `width × height` area.
///
/// The node list always tiles `[0, width]` left to right; placing a
/// rectangle raises the segment under it and merges equal-height neighbors.
pub struct SkylinePacker {
    width: i32,
    height: i32,
    nodes: Vec<SkylineNode>,
}

impl SkylinePacker {
    pub fn new(width: i32, height: i32) -> Self {
        let mut nodes = Vec::with_capacity(width.max(1) as usize);
        nodes.push(SkylineNode { x: 0, y: 0, width });
        Self {
            width,
            height,
            nodes,
        }
    }

    /// The top edge a `w × h` rectangle would rest on if its left edge were
    /// at `nodes[index].x`, or `None` if it would poke out of the page.
    fn fit(&self, index: usize, w: i32, h: i32) -> Option<i32> {
        let x = self.nodes[index].x;
        if x + w > self.width {
            return None;
        }

        let mut y = 0;
        let mut remaining = w;
        let mut i = index;
        while remaining > 0 {
            y = y.max(self.nodes[i].y);
            if y + h > self.height {
                return None;
            }
            remaining -= self.nodes[i].width;
            i += 1;
        }
        Some(y)
    }

    /// Place a `w × h` rectangle at the lowest fitting position (leftmost on
    /// ties) and return its top-left corner.
    pub fn insert(&mut self, w: i32, h: i32) -> Option<IVec2> {
        if w <= 0 || h <= 0 {
            // Degenerate rectangles park at the current best corner without
            // raising the skyline.
            return Some(IVec2::ZERO);
        }

        let mut best: Option<(i32, i32, usize)> = None;
        for index in 0..self.nodes.len() {
            if let Some(y) = self.fit(index, w, h) {
                let x = self.nodes[index].x;
                let better = match best {
                    None => true,
                    Some((best_y, best_x, _)) => y < best_y || (y == best_y && x < best_x),
                };
                if better {
                    best = Some((y, x, index));
                }
            }
        }

        let (y, x, index) = best?;
        self.raise(
            index,
            SkylineNode {
                x,
                y: y + h,
                width: w,
            },
        );
        Some(IVec2::new(x, y))
    }

    /// Splice the new segment in at `index`, shrink the segments it shadows
    /// and merge equal-height neighbors.
    fn raise(&mut self, index: usize, node: SkylineNode) {
        self.nodes.insert(index, node);

        let i = index + 1;
        while i < self.nodes.len() {
            let covered_to = self.nodes[i - 1].x + self.nodes[i - 1].width;
            if self.nodes[i].x >= covered_to {
                break;
            }
            let shrink = covered_to - self.nodes[i].x;
            if self.nodes[i].width <= shrink {
                self.nodes.remove(i);
            } else {
                self.nodes[i].x += shrink;
                self.nodes[i].width -= shrink;
                break;
            }
        }

        let mut i = 0;
        while i + 1 < self.nodes.len() {
            if self.nodes[i].y == self.nodes[i + 1].y {
                self.nodes[i].width += self.nodes[i + 1].width;
                self.nodes.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}

/// Packs a collection of rendered glyphs into as many pages as they need.
pub struct AtlasPacker {
    glyphs: Vec<RenderedGlyph>,
}

impl AtlasPacker {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            glyphs: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, glyph: RenderedGlyph) {
        self.glyphs.push(glyph);
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Pack every glyph into `page_size` pages of the given component count.
    ///
    /// Consumes the packer. Returns the finished page images and the glyphs
    /// with their `page` and `rect` fields filled in; `rect` is the image's
    /// area, padding excluded. Glyphs too large for a single page are logged
    /// and dropped.
    pub fn pack(mut self, page_size: IVec2, components: i32) -> (Vec<Image>, Vec<RenderedGlyph>) {
        self.glyphs.retain(|glyph| {
            let padded = glyph.image.size() + IVec2::splat(2 * GLYPH_PADDING);
            if padded.x > page_size.x || padded.y > page_size.y {
                log::error!(
                    "glyph U+{:04X} is {}x{} and cannot fit a {}x{} page; dropping it",
                    glyph.code_point,
                    glyph.image.width(),
                    glyph.image.height(),
                    page_size.x,
                    page_size.y
                );
                return false;
            }
            true
        });

        let mut pages = Vec::new();
        let mut packed = Vec::with_capacity(self.glyphs.len());

        while !self.glyphs.is_empty() {
            let page_index = pages.len() as i32;
            let mut page = Image::new(page_size.x, page_size.y, components);
            let mut skyline = SkylinePacker::new(page_size.x, page_size.y);

            let mut i = 0;
            while i < self.glyphs.len() {
                let padded = self.glyphs[i].image.size() + IVec2::splat(2 * GLYPH_PADDING);
                match skyline.insert(padded.x, padded.y) {
                    Some(corner) => {
                        let mut glyph = self.glyphs.swap_remove(i);
                        let inner = corner + IVec2::splat(GLYPH_PADDING);
                        page.paste(&glyph.image, inner);
                        glyph.page = page_index;
                        glyph.rect = IntRect::from_min_size(inner, glyph.image.size());
                        packed.push(glyph);
                    }
                    None => i += 1,
                }
            }

            pages.push(page);
        }

        (pages, packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::IntRect;

    fn glyph(code_point: u32, width: i32, height: i32, fill: u8) -> RenderedGlyph {
        RenderedGlyph {
            image: Image::from_raw(width, height, 1, vec![fill; (width * height) as usize]),
            code_point,
            offset: IVec2::ZERO,
            advance_x: width,
            page: -1,
            rect: IntRect::default(),
        }
    }

    fn padded(rect: &IntRect) -> IntRect {
        IntRect {
            min: rect.min - IVec2::splat(GLYPH_PADDING),
            max: rect.max + IVec2::splat(GLYPH_PADDING),
        }
    }

    #[test]
    fn single_page_placements_are_disjoint_and_padded() {
        let mut packer = AtlasPacker::with_capacity(8);
        for i in 0..8 {
            packer.push(glyph('a' as u32 + i, 10 + (i as i32 % 3) * 4, 12, 200));
        }
        let (pages, packed) = packer.pack(IVec2::new(128, 128), 1);

        assert_eq!(pages.len(), 1);
        assert_eq!(packed.len(), 8);

        let page_rect = IntRect::from_min_size(IVec2::ZERO, IVec2::new(128, 128));
        for g in &packed {
            assert_eq!(g.page, 0);
            assert_eq!(g.rect.size(), g.image.size());
            assert!(page_rect.contains_rect(&g.rect));
        }
        for a in &packed {
            for b in &packed {
                if a.code_point != b.code_point {
                    // Two pixels of clearance on every side of every glyph.
                    assert!(!padded(&a.rect).intersects(&b.rect));
                }
            }
        }
    }

    #[test]
    fn pages_contain_the_pasted_pixels() {
        let mut packer = AtlasPacker::with_capacity(1);
        packer.push(glyph('X' as u32, 6, 6, 230));
        let (pages, packed) = packer.pack(IVec2::new(64, 64), 1);

        let rect = packed[0].rect;
        let page = &pages[0];
        assert_eq!(page.pixel(rect.min.x, rect.min.y)[0], 230);
        assert_eq!(page.pixel(rect.max.x - 1, rect.max.y - 1)[0], 230);
        // The padding ring around the glyph stays empty.
        assert_eq!(page.pixel(rect.min.x - 1, rect.min.y - 1)[0], 0);
        assert_eq!(page.pixel(rect.max.x, rect.max.y)[0], 0);
    }

    #[test]
    fn overflow_opens_additional_pages() {
        // 30x30 padded to 34x34: only one fits a 64x64 page, so five glyphs
        // must spill across pages.
        let mut packer = AtlasPacker::with_capacity(5);
        for i in 0..5 {
            packer.push(glyph('0' as u32 + i, 30, 30, 10));
        }
        let (pages, packed) = packer.pack(IVec2::new(64, 64), 1);

        assert!(pages.len() > 1);
        assert_eq!(packed.len(), 5);
        for g in &packed {
            assert!((g.page as usize) < pages.len());
            let page_rect = IntRect::from_min_size(IVec2::ZERO, IVec2::new(64, 64));
            assert!(page_rect.contains_rect(&g.rect));
        }
    }

    #[test]
    fn oversized_glyphs_are_dropped_not_looped() {
        let mut packer = AtlasPacker::with_capacity(2);
        packer.push(glyph('a' as u32, 100, 100, 1));
        packer.push(glyph('b' as u32, 8, 8, 1));
        let (pages, packed) = packer.pack(IVec2::new(32, 32), 1);

        assert_eq!(pages.len(), 1);
        assert_eq!(packed.len(), 1);
        assert_eq!(packed[0].code_point, 'b' as u32);
    }

    #[test]
    fn zero_size_glyphs_keep_their_metrics() {
        // A space has no pixels but still owns an advance and a slot.
        let mut packer = AtlasPacker::with_capacity(1);
        packer.push(glyph(' ' as u32, 0, 0, 0));
        let (pages, packed) = packer.pack(IVec2::new(32, 32), 1);

        assert_eq!(pages.len(), 1);
        assert_eq!(packed[0].rect.size(), IVec2::ZERO);
        assert_eq!(packed[0].advance_x, 0);
    }

    #[test]
    fn packing_is_deterministic_for_identical_input() {
        let build = || {
            let mut packer = AtlasPacker::with_capacity(6);
            for i in 0..6 {
                packer.push(glyph('a' as u32 + i, 9 + (i as i32 * 3) % 7, 11, 50));
            }
            let (_, packed) = packer.pack(IVec2::new(64, 64), 1);
            packed
                .into_iter()
                .map(|g| (g.code_point, g.page, g.rect))
                .collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }
}
