//! Build Atlas — bake one font through all three recipes and save the results.
//!
//! Usage: `cargo run --example build_atlas -- <font.ttf> [height]`

use std::path::PathBuf;

use stafr::prelude::*;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(src_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: build_atlas <font.ttf> [height]");
        std::process::exit(1);
    };
    let height: u32 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);

    let mut cache = TextureCache::new();

    // ── Simple: white glyphs, no blur ────────────────────────────────────
    let simple = SimpleFontSettings::new(&src_path, height);
    let font = SpriteFont::build_simple(&simple, &mut cache);
    report("simple", &font);
    font.save(&PathBuf::from("simple.fnt"));

    // ── Contour: 2px stroked outlines ────────────────────────────────────
    let contour = ContourFontSettings {
        base: FontSettings::new(&src_path, height),
        thickness: 2.0,
        blur_radius: 0,
        color: 0xFFFF_FFFF,
    };
    let font = SpriteFont::build_contour(&contour, &mut cache);
    report("contour", &font);
    font.save(&PathBuf::from("contour.fnt"));

    // ── Outlined: white body, black 2px border ───────────────────────────
    let outlined = OutlinedFontSettings {
        base: FontSettings::new(&src_path, height),
        main_color: 0xFFFF_FFFF,
        outline_color: 0xFF00_0000,
        outline_thickness: 2.0,
        outline_blur_radius: 0,
    };
    let font = SpriteFont::build_outlined(&outlined, &mut cache);
    report("outlined", &font);
    font.save(&PathBuf::from("outlined.fnt"));
}

fn report(recipe: &str, font: &SpriteFont) {
    println!(
        "{recipe}: '{}' — {} glyphs, {} pages, line height {}, built in {} ms",
        font.face_name(),
        font.glyphs().len(),
        font.textures().len(),
        font.line_height(),
        font.build_millis().unwrap_or(0),
    );
}
