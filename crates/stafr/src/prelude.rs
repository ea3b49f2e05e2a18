//! Convenience re-exports of the user-facing surface.

pub use crate::font::{Glyph, SpriteFont};
pub use crate::image::Image;
pub use crate::math::{IVec2, IntRect};
pub use crate::settings::{
    ContourFontSettings, FontSettings, OutlinedFontSettings, SimpleFontSettings, load_settings,
};
pub use crate::texture::{Texture, TextureCache, TextureFilter};
