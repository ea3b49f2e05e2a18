//! # Texture — CPU-Side Textures and the Shared Cache
//!
//! The atlas builder ends at the GPU's doorstep: a [`Texture`] is a named
//! image plus the sampler configuration a renderer should use for it, and the
//! [`TextureCache`] is the process-wide, path-keyed store the builder
//! registers pages into and the `.fnt` loader resolves pages from. Actual
//! upload belongs to whatever rendering backend consumes these — the CPU
//! image is kept around so a sprite font can always be re-saved.
//!
//! Textures are shared with `Arc`: the cache and every sprite font holding a
//! page co-own it, and the pixels live as long as the longest holder. The
//! cache does no locking; it is meant to be driven from the one thread that
//! builds and loads fonts.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::image::Image;

/// Sampler filtering for a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
    /// Linear within and between mip levels.
    Trilinear,
}

/// A named image with sampler settings, ready for upload by a renderer.
#[derive(Debug)]
pub struct Texture {
    name: String,
    width: i32,
    height: i32,
    image: Option<Image>,
    min_filter: TextureFilter,
    mag_filter: TextureFilter,
}

impl Texture {
    /// Wrap an image as a texture. Atlas pages minify with trilinear
    /// filtering and magnify linearly.
    pub fn from_image(name: impl Into<String>, image: Image) -> Self {
        Self {
            name: name.into(),
            width: image.width(),
            height: image.height(),
            image: Some(image),
            min_filter: TextureFilter::Trilinear,
            mag_filter: TextureFilter::Linear,
        }
    }

    /// A texture whose pixels live only on the GPU (or nowhere yet). Such a
    /// texture can back rendering but cannot be re-encoded to disk.
    pub fn without_image(name: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            image: None,
            min_filter: TextureFilter::Trilinear,
            mag_filter: TextureFilter::Linear,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The CPU-side pixels, if this texture still carries them.
    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn min_filter(&self) -> TextureFilter {
        self.min_filter
    }

    pub fn mag_filter(&self) -> TextureFilter {
        self.mag_filter
    }
}

/// Process-wide cache of textures keyed by path (or registered name).
///
/// Loading the same path twice returns the same `Arc` without touching the
/// disk again.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<String, Arc<Texture>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture under an explicit key, replacing any previous
    /// holder of that key.
    pub fn insert(&mut self, key: impl Into<String>, texture: Arc<Texture>) {
        self.entries.insert(key.into(), texture);
    }

    /// Look up a texture by key without loading.
    pub fn get(&self, key: &str) -> Option<Arc<Texture>> {
        self.entries.get(key).cloned()
    }

    /// Fetch the texture for `path`, decoding it from disk on first use.
    ///
    /// Decoded files are normalized to RGBA. Returns `None` (with a log) if
    /// the file cannot be read or decoded.
    pub fn get_or_load(&mut self, path: &Path) -> Option<Arc<Texture>> {
        let key = path.to_string_lossy().into_owned();
        if let Some(texture) = self.entries.get(&key) {
            return Some(texture.clone());
        }

        let decoded = match image::open(path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                log::error!("failed to load texture '{}': {e}", path.display());
                return None;
            }
        };
        let (width, height) = decoded.dimensions();
        let image = Image::from_raw(width as i32, height as i32, 4, decoded.into_raw());

        let texture = Arc::new(Texture::from_image(key.clone(), image));
        self.entries.insert(key, texture.clone());
        Some(texture)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
