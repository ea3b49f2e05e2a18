//! # Fnt — The On-Disk Atlas Format
//!
//! A sprite font saves as one `.fnt` XML index plus one PNG per atlas page,
//! named `<stem>_<i>.png` in the same directory:
//!
//! ```text
//! <font>
//!     <info face="Liberation Sans" size="20"/>
//!     <common lineHeight="24" pages="1"/>
//!     <pages>
//!         <page id="0" file="hud_0.png"/>
//!     </pages>
//!     <chars count="95">
//!         <char id="33" x="2" y="2" width="4" height="14" xoffset="2"
//!               yoffset="4" advance_x="7" page="0"/>
//!         ...
//!     </chars>
//! </font>
//! ```
//!
//! `char` entries are written in ascending code-point order, so identical
//! fonts serialize to identical bytes. The loader only cares that the
//! attributes are present, not how they are ordered; duplicate `char` ids
//! overwrite earlier ones. Kerning sections some BMFont tools emit are
//! recognized and ignored — pair kerning is not part of this format's
//! contract here.
//!
//! Saving is not atomic: page PNGs land before the index, so a failure in
//! between leaves pages without an index.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::font::{Glyph, SpriteFont};
use crate::image::Image;
use crate::math::{IVec2, IntRect};
use crate::texture::TextureCache;

impl SpriteFont {
    /// Write the atlas pages and the XML index for this font.
    ///
    /// `path` names the index; its extension, if any, must be `fnt`. Every
    /// page texture must still carry its CPU-side image. Failures are logged
    /// and reported as `false`.
    pub fn save(&self, path: &Path) -> bool {
        match save_fnt(self, path) {
            Ok(()) => true,
            Err(e) => {
                log::error!(
                    "failed to save sprite font to '{}': {e:#}",
                    path.display()
                );
                false
            }
        }
    }

    /// Load a sprite font from a `.fnt` index, resolving page textures
    /// through `cache`.
    ///
    /// Failures are logged and yield an empty font (no glyphs, no textures,
    /// zero line height).
    pub fn load(path: &Path, cache: &mut TextureCache) -> SpriteFont {
        match load_fnt(path, cache) {
            Ok(font) => font,
            Err(e) => {
                log::error!(
                    "failed to load sprite font from '{}': {e:#}",
                    path.display()
                );
                SpriteFont::default()
            }
        }
    }
}

fn save_fnt(font: &SpriteFont, path: &Path) -> Result<()> {
    if let Some(ext) = path.extension() {
        if ext != "fnt" {
            bail!(
                "index extension must be 'fnt', got '{}'",
                ext.to_string_lossy()
            );
        }
    }

    let mut images: Vec<&Image> = Vec::with_capacity(font.textures.len());
    for (index, texture) in font.textures.iter().enumerate() {
        match texture.image() {
            Some(image) => images.push(image),
            None => bail!("page {index} has no CPU-side image to encode"),
        }
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "font".to_owned());
    let dir = path.parent().unwrap_or(Path::new(""));

    let mut page_files = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let file_name = format!("{stem}_{index}.png");
        let color = match image.components() {
            1 => image::ExtendedColorType::L8,
            _ => image::ExtendedColorType::Rgba8,
        };
        image::save_buffer(
            dir.join(&file_name),
            image.data(),
            image.width() as u32,
            image.height() as u32,
            color,
        )
        .with_context(|| format!("encoding page '{file_name}'"))?;
        page_files.push(file_name);
    }

    let xml = index_document(font, &page_files)?;
    fs::write(path, xml).with_context(|| format!("writing index '{}'", path.display()))?;
    Ok(())
}

/// Serialize the index XML with 4-space indentation, `char` entries sorted
/// by code point.
fn index_document(font: &SpriteFont, page_files: &[String]) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("font")))?;

    let mut info = BytesStart::new("info");
    info.push_attribute(("face", font.face_name.as_str()));
    info.push_attribute(("size", font.font_size.to_string().as_str()));
    writer.write_event(Event::Empty(info))?;

    let mut common = BytesStart::new("common");
    common.push_attribute(("lineHeight", font.line_height.to_string().as_str()));
    common.push_attribute(("pages", page_files.len().to_string().as_str()));
    writer.write_event(Event::Empty(common))?;

    writer.write_event(Event::Start(BytesStart::new("pages")))?;
    for (index, file) in page_files.iter().enumerate() {
        let mut page = BytesStart::new("page");
        page.push_attribute(("id", index.to_string().as_str()));
        page.push_attribute(("file", file.as_str()));
        writer.write_event(Event::Empty(page))?;
    }
    writer.write_event(Event::End(BytesEnd::new("pages")))?;

    let mut codes: Vec<u32> = font.glyphs.keys().copied().collect();
    codes.sort_unstable();

    let mut chars = BytesStart::new("chars");
    chars.push_attribute(("count", codes.len().to_string().as_str()));
    writer.write_event(Event::Start(chars))?;
    for code in codes {
        let glyph = &font.glyphs[&code];
        let mut entry = BytesStart::new("char");
        entry.push_attribute(("id", code.to_string().as_str()));
        entry.push_attribute(("x", glyph.rect.min.x.to_string().as_str()));
        entry.push_attribute(("y", glyph.rect.min.y.to_string().as_str()));
        entry.push_attribute(("width", glyph.rect.width().to_string().as_str()));
        entry.push_attribute(("height", glyph.rect.height().to_string().as_str()));
        entry.push_attribute(("xoffset", glyph.offset.x.to_string().as_str()));
        entry.push_attribute(("yoffset", glyph.offset.y.to_string().as_str()));
        entry.push_attribute(("advance_x", glyph.advance_x.to_string().as_str()));
        entry.push_attribute(("page", glyph.page.to_string().as_str()));
        writer.write_event(Event::Empty(entry))?;
    }
    writer.write_event(Event::End(BytesEnd::new("chars")))?;
    writer.write_event(Event::End(BytesEnd::new("font")))?;

    Ok(writer.into_inner())
}

fn load_fnt(path: &Path, cache: &mut TextureCache) -> Result<SpriteFont> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading index '{}'", path.display()))?;
    let mut reader = Reader::from_str(&text);

    let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
    let mut font = SpriteFont::default();
    let mut saw_root = false;
    let mut saw_pages = false;
    let mut in_pages = false;
    let mut in_chars = false;
    let mut kerning_noted = false;

    loop {
        match reader.read_event().context("parsing index XML")? {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.name();
                let name = name.as_ref();

                if !saw_root {
                    if name != b"font" {
                        bail!(
                            "root element is '{}', expected 'font'",
                            String::from_utf8_lossy(name)
                        );
                    }
                    saw_root = true;
                    continue;
                }

                match name {
                    b"info" => {
                        let attrs = attr_map(&e)?;
                        if let Some(face) = attrs.get("face") {
                            font.face_name = face.clone();
                        }
                        if let Some(size) = attrs.get("size") {
                            font.font_size = size
                                .parse()
                                .context("'size' attribute is not an integer")?;
                        }
                    }
                    b"common" => {
                        let attrs = attr_map(&e)?;
                        font.line_height = int_attr(&attrs, "lineHeight")?;
                        let pages = int_attr(&attrs, "pages")?.max(0) as usize;
                        font.textures.reserve(pages);
                    }
                    b"pages" => {
                        saw_pages = true;
                        in_pages = true;
                    }
                    b"page" if in_pages => {
                        let attrs = attr_map(&e)?;
                        let file = attrs
                            .get("file")
                            .context("'page' element without a 'file' attribute")?;
                        let page_path = dir.join(file);
                        let texture = cache
                            .get_or_load(&page_path)
                            .with_context(|| format!("loading page '{}'", page_path.display()))?;
                        font.textures.push(texture);
                    }
                    b"chars" => in_chars = true,
                    b"char" if in_chars => {
                        let attrs = attr_map(&e)?;
                        let code: u32 = attrs
                            .get("id")
                            .context("'char' element without an 'id' attribute")?
                            .parse()
                            .context("'id' attribute is not a code point")?;
                        let glyph = Glyph {
                            rect: IntRect::from_min_size(
                                IVec2::new(int_attr(&attrs, "x")?, int_attr(&attrs, "y")?),
                                IVec2::new(
                                    int_attr(&attrs, "width")?,
                                    int_attr(&attrs, "height")?,
                                ),
                            ),
                            offset: IVec2::new(
                                int_attr(&attrs, "xoffset")?,
                                int_attr(&attrs, "yoffset")?,
                            ),
                            advance_x: int_attr(&attrs, "advance_x")?,
                            page: int_attr(&attrs, "page")?,
                        };
                        // Last entry wins on duplicate code points.
                        font.glyphs.insert(code, glyph);
                    }
                    b"kernings" | b"kerning" => {
                        if !kerning_noted {
                            log::debug!(
                                "'{}' contains kerning pairs; they are ignored",
                                path.display()
                            );
                            kerning_noted = true;
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"pages" => in_pages = false,
                b"chars" => in_chars = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        bail!("document has no 'font' root element");
    }
    if !saw_pages {
        bail!("index has no 'pages' element");
    }
    Ok(font)
}

fn attr_map(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.context("malformed attribute")?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .context("undecodable attribute value")?
            .into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn int_attr(attrs: &HashMap<String, String>, key: &str) -> Result<i32> {
    attrs
        .get(key)
        .with_context(|| format!("missing '{key}' attribute"))?
        .parse()
        .with_context(|| format!("attribute '{key}' is not an integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;
    use std::sync::Arc;

    fn white_page_png(path: &Path, size: u32) {
        image::save_buffer(
            path,
            &vec![255u8; (size * size * 4) as usize],
            size,
            size,
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    }

    fn sample_font() -> SpriteFont {
        let mut font = SpriteFont::default();
        font.face_name = "Demo Sans".to_owned();
        font.font_size = 20;
        font.line_height = 24;
        // Insert out of code-point order to exercise the sort on save.
        font.glyphs.insert(
            0x042F, // Я
            Glyph {
                rect: IntRect::from_min_size(IVec2::new(2, 14), IVec2::new(7, 10)),
                offset: IVec2::new(0, 3),
                advance_x: 8,
                page: 1,
            },
        );
        font.glyphs.insert(
            0x41,
            Glyph {
                rect: IntRect::from_min_size(IVec2::new(2, 2), IVec2::new(8, 10)),
                offset: IVec2::new(1, 3),
                advance_x: 9,
                page: 0,
            },
        );
        font.glyphs.insert(
            0x42,
            Glyph {
                rect: IntRect::from_min_size(IVec2::new(14, 2), IVec2::new(8, 10)),
                offset: IVec2::new(1, 3),
                advance_x: 9,
                page: 0,
            },
        );
        for index in 0..2 {
            font.textures.push(Arc::new(Texture::from_image(
                format!("page_{index}"),
                Image::new(32, 32, 4),
            )));
        }
        font
    }

    #[test]
    fn save_then_load_round_trips_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("atlas.fnt");

        let font = sample_font();
        assert!(font.save(&index));
        assert!(dir.path().join("atlas_0.png").exists());
        assert!(dir.path().join("atlas_1.png").exists());

        let mut cache = TextureCache::new();
        let loaded = SpriteFont::load(&index, &mut cache);

        assert_eq!(loaded.face_name(), font.face_name());
        assert_eq!(loaded.font_size(), font.font_size());
        assert_eq!(loaded.line_height(), font.line_height());
        assert_eq!(loaded.textures().len(), font.textures().len());
        assert_eq!(loaded.glyphs(), font.glyphs());
    }

    #[test]
    fn reserialized_index_is_byte_identical() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let index_a = dir_a.path().join("atlas.fnt");
        let index_b = dir_b.path().join("atlas.fnt");

        let font = sample_font();
        assert!(font.save(&index_a));

        let mut cache = TextureCache::new();
        let loaded = SpriteFont::load(&index_a, &mut cache);
        assert!(loaded.save(&index_b));

        assert_eq!(fs::read(&index_a).unwrap(), fs::read(&index_b).unwrap());
    }

    #[test]
    fn chars_are_written_in_ascending_code_point_order() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("atlas.fnt");
        assert!(sample_font().save(&index));

        let text = fs::read_to_string(&index).unwrap();
        let a = text.find(r#"id="65""#).unwrap();
        let b = text.find(r#"id="66""#).unwrap();
        let ya = text.find(r#"id="1071""#).unwrap();
        assert!(a < b && b < ya);
    }

    #[test]
    fn loads_a_hand_written_index_with_shuffled_attributes() {
        let dir = tempfile::tempdir().unwrap();
        white_page_png(&dir.path().join("white.png"), 16);

        let index = dir.path().join("tiny.fnt");
        fs::write(
            &index,
            r#"<?xml version="1.0"?>
<font>
    <info face="Tiny" size="18"/>
    <common pages="1" lineHeight="24"/>
    <pages>
        <page file="white.png" id="0"/>
    </pages>
    <chars count="3">
        <char x="0" id="65" y="0" height="10" width="8" xoffset="1" yoffset="2" advance_x="9" page="0"/>
        <char id="66" x="8" y="0" width="8" height="10" xoffset="1" yoffset="2" advance_x="9" page="0"/>
        <char id="1071" x="0" y="10" width="6" height="10" xoffset="0" yoffset="2" advance_x="7" page="0"/>
    </chars>
</font>
"#,
        )
        .unwrap();

        let mut cache = TextureCache::new();
        let font = SpriteFont::load(&index, &mut cache);

        assert_eq!(font.line_height(), 24);
        assert_eq!(font.textures().len(), 1);
        assert_eq!(font.glyphs().len(), 3);

        let a = font.glyph(0x41).unwrap();
        assert_eq!(a.rect, IntRect::from_min_size(IVec2::ZERO, IVec2::new(8, 10)));
        assert_eq!(a.page, 0);
        let ya = font.glyph(0x042F).unwrap();
        assert_eq!(ya.advance_x, 7);
        assert!(font.glyph(0x43).is_none());
    }

    #[test]
    fn duplicate_char_ids_last_wins() {
        let dir = tempfile::tempdir().unwrap();
        white_page_png(&dir.path().join("white.png"), 4);
        let index = dir.path().join("dup.fnt");
        fs::write(
            &index,
            r#"<font>
    <common lineHeight="10" pages="1"/>
    <pages><page id="0" file="white.png"/></pages>
    <chars count="2">
        <char id="65" x="0" y="0" width="1" height="1" xoffset="0" yoffset="0" advance_x="1" page="0"/>
        <char id="65" x="2" y="2" width="2" height="2" xoffset="0" yoffset="0" advance_x="3" page="0"/>
    </chars>
</font>"#,
        )
        .unwrap();

        let mut cache = TextureCache::new();
        let font = SpriteFont::load(&index, &mut cache);
        assert_eq!(font.glyphs().len(), 1);
        assert_eq!(font.glyph(65).unwrap().advance_x, 3);
    }

    #[test]
    fn load_rejects_missing_pages_and_wrong_root() {
        let dir = tempfile::tempdir().unwrap();

        let no_pages = dir.path().join("no_pages.fnt");
        fs::write(&no_pages, "<font><common lineHeight=\"10\" pages=\"0\"/></font>").unwrap();
        let mut cache = TextureCache::new();
        let font = SpriteFont::load(&no_pages, &mut cache);
        assert!(font.glyphs().is_empty());
        assert_eq!(font.line_height(), 0);

        let wrong_root = dir.path().join("wrong.fnt");
        fs::write(&wrong_root, "<atlas></atlas>").unwrap();
        let font = SpriteFont::load(&wrong_root, &mut cache);
        assert!(font.textures().is_empty());
    }

    #[test]
    fn save_rejects_foreign_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let font = sample_font();
        assert!(!font.save(&dir.path().join("atlas.png")));
        // Nothing was written.
        assert!(!dir.path().join("atlas_0.png").exists());
    }

    #[test]
    fn save_requires_cpu_side_page_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut font = sample_font();
        font.textures[1] = Arc::new(Texture::without_image("gpu_only", 32, 32));
        assert!(!font.save(&dir.path().join("atlas.fnt")));
    }

    #[test]
    fn kerning_sections_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        white_page_png(&dir.path().join("white.png"), 4);
        let index = dir.path().join("kern.fnt");
        fs::write(
            &index,
            r#"<font>
    <common lineHeight="12" pages="1"/>
    <pages><page id="0" file="white.png"/></pages>
    <chars count="1">
        <char id="65" x="0" y="0" width="1" height="1" xoffset="0" yoffset="0" advance_x="1" page="0"/>
    </chars>
    <kernings count="1">
        <kerning first="65" second="86" amount="-1"/>
    </kernings>
</font>"#,
        )
        .unwrap();

        let mut cache = TextureCache::new();
        let font = SpriteFont::load(&index, &mut cache);
        assert_eq!(font.glyphs().len(), 1);
    }
}
