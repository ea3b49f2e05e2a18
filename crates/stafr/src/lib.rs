//! # Stafr — Bitmap Sprite-Font Baking
//!
//! Rasterizes every glyph of a TTF/OTF font with FreeType, packs the bitmaps
//! into fixed-size atlas pages, and maps each Unicode code point to its
//! rectangle and layout metrics. The result saves to a `.fnt` XML index plus
//! PNG pages and loads back losslessly.
//!
//! Start with `use stafr::prelude::*`, then build a
//! [`SpriteFont`](font::SpriteFont) with one of the three recipes.

pub mod face;
pub mod fnt;
pub mod font;
pub mod image;
pub mod math;
pub mod packer;
pub mod prelude;
pub mod raster;
pub mod settings;
pub mod texture;
