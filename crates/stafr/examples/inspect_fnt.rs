//! Inspect Fnt — load a saved atlas and print its inventory.
//!
//! Usage: `cargo run --example inspect_fnt -- <atlas.fnt>`

use std::path::PathBuf;

use stafr::prelude::*;

fn main() {
    env_logger::init();

    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: inspect_fnt <atlas.fnt>");
        std::process::exit(1);
    };

    let mut cache = TextureCache::new();
    let font = SpriteFont::load(&path, &mut cache);

    println!(
        "'{}' at {}px — line height {}, {} pages, {} glyphs",
        font.face_name(),
        font.font_size(),
        font.line_height(),
        font.textures().len(),
        font.glyphs().len(),
    );

    for texture in font.textures() {
        println!("  page '{}': {}x{}", texture.name(), texture.width(), texture.height());
    }

    let mut codes: Vec<u32> = font.glyphs().keys().copied().collect();
    codes.sort_unstable();
    for code in codes.iter().take(16) {
        let glyph = &font.glyphs()[code];
        println!(
            "  U+{code:04X} page {} rect {},{} {}x{} offset {},{} advance {}",
            glyph.page,
            glyph.rect.min.x,
            glyph.rect.min.y,
            glyph.rect.width(),
            glyph.rect.height(),
            glyph.offset.x,
            glyph.offset.y,
            glyph.advance_x,
        );
    }
    if codes.len() > 16 {
        println!("  … and {} more", codes.len() - 16);
    }
}
