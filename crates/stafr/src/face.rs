//! # Face — Scoped FreeType Handles
//!
//! [`FontFace`] owns the whole chain a rasterizer needs: the file bytes, the
//! FreeType library instance, and the face object bound over those bytes.
//! FreeType keeps raw pointers into the memory buffer for the lifetime of the
//! face, so the buffer is handed to the face at creation and everything is
//! released together — face first, then library — when the handle drops.
//! Because the native face holds addresses into the buffer, `FontFace` is
//! neither `Clone` nor `Copy`.
//!
//! The safe freetype-rs surface covers most of what we need; the handful of
//! calls it does not wrap (charmap selection, first/next character walking)
//! go through `freetype::ffi` directly.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use freetype::{Library, face::Face, ffi};

/// `FT_ENCODING_UNICODE`, the four-byte tag `'unic'`.
const UNICODE_ENCODING: u32 =
    (b'u' as u32) << 24 | (b'n' as u32) << 16 | (b'i' as u32) << 8 | (b'c' as u32);

/// An open vector-font face fixed at one pixel size.
///
/// Field order matters: the face must drop before the library that created it.
pub struct FontFace {
    face: Face,
    library: Library,
    family: String,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .finish()
    }
}

impl FontFace {
    /// Open a font file, select its Unicode character map and fix the pixel
    /// height.
    ///
    /// The file is read into a buffer owned by the returned handle. Absent,
    /// empty or unparseable files are errors, as is a face without a Unicode
    /// charmap; every path out of this function releases whatever was
    /// acquired before it.
    pub fn open(path: &Path, pixel_height: u32) -> Result<FontFace> {
        let data = fs::read(path)
            .with_context(|| format!("reading font file '{}'", path.display()))?;
        if data.is_empty() {
            bail!("font file '{}' is empty", path.display());
        }

        let library = Library::init().context("initializing FreeType")?;
        let mut face = library
            .new_memory_face(data, 0)
            .with_context(|| format!("opening font face '{}'", path.display()))?;

        let err = unsafe {
            ffi::FT_Select_Charmap(
                face.raw_mut() as *mut ffi::FT_FaceRec,
                UNICODE_ENCODING as ffi::FT_Encoding,
            )
        };
        if err != 0 {
            bail!("font '{}' has no Unicode character map", path.display());
        }

        face.set_pixel_sizes(0, pixel_height)
            .with_context(|| format!("setting pixel size {pixel_height}"))?;

        let family = face
            .family_name()
            .unwrap_or_else(|| file_stem(path));

        Ok(FontFace {
            face,
            library,
            family,
        })
    }

    pub fn face(&self) -> &Face {
        &self.face
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// The typeface family name, falling back to the file stem.
    pub fn family_name(&self) -> &str {
        &self.family
    }

    pub fn num_glyphs(&self) -> usize {
        self.face.raw().num_glyphs as usize
    }

    /// Scaled ascender in 26.6 fixed-point.
    pub fn ascender_26_6(&self) -> i64 {
        self.face
            .size_metrics()
            .map(|m| m.ascender as i64)
            .unwrap_or(0)
    }

    /// Scaled baseline-to-baseline distance in 26.6 fixed-point.
    pub fn line_height_26_6(&self) -> i64 {
        self.face
            .size_metrics()
            .map(|m| m.height as i64)
            .unwrap_or(0)
    }

    /// Every `(code point, glyph index)` pair the face exposes, in the order
    /// the font enumerates them (Unicode-ascending for Unicode charmaps).
    ///
    /// Uses FreeType's first/next character primitives; the walk ends when
    /// the returned glyph index is zero.
    pub fn char_codes(&mut self) -> Vec<(u32, u32)> {
        let face_ptr = self.face.raw_mut() as *mut ffi::FT_FaceRec;
        let mut codes = Vec::new();
        let mut glyph_index: ffi::FT_UInt = 0;
        let mut code = unsafe { ffi::FT_Get_First_Char(face_ptr, &mut glyph_index) };
        while glyph_index != 0 {
            codes.push((code as u32, glyph_index));
            code = unsafe { ffi::FT_Get_Next_Char(face_ptr, code, &mut glyph_index) };
        }
        codes
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
