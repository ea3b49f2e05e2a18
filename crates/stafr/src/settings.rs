//! Build-settings structs for the three recipes, serde-ready so recipes can
//! live in JSON config files next to the assets they describe.
//!
//! Colors are `u32` in `0xAABBGGRR` (low byte red, high byte alpha).

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::math::IVec2;

/// Options shared by every recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSettings {
    /// Path of the TTF/OTF source file.
    pub src_path: PathBuf,
    /// Requested glyph height in pixels.
    pub height: u32,
    /// Antialiased coverage when true; 1-bit monochrome hinting when false.
    #[serde(default = "default_true")]
    pub anti_aliasing: bool,
    /// Width and height of each atlas page.
    #[serde(default = "default_texture_size")]
    pub texture_size: IVec2,
}

impl FontSettings {
    pub fn new(src_path: impl Into<PathBuf>, height: u32) -> Self {
        Self {
            src_path: src_path.into(),
            height,
            anti_aliasing: true,
            texture_size: default_texture_size(),
        }
    }
}

/// Settings for the plain recipe: the glyph as designed, optionally blurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleFontSettings {
    #[serde(flatten)]
    pub base: FontSettings,
    #[serde(default)]
    pub blur_radius: i32,
    #[serde(default = "default_white")]
    pub color: u32,
}

impl SimpleFontSettings {
    pub fn new(src_path: impl Into<PathBuf>, height: u32) -> Self {
        Self {
            base: FontSettings::new(src_path, height),
            blur_radius: 0,
            color: default_white(),
        }
    }
}

/// Settings for the stroked-outline-only recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourFontSettings {
    #[serde(flatten)]
    pub base: FontSettings,
    /// Stroke thickness in pixels.
    pub thickness: f32,
    #[serde(default)]
    pub blur_radius: i32,
    #[serde(default = "default_white")]
    pub color: u32,
}

/// Settings for the solid-body-plus-colored-border recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlinedFontSettings {
    #[serde(flatten)]
    pub base: FontSettings,
    #[serde(default = "default_white")]
    pub main_color: u32,
    pub outline_color: u32,
    /// Border thickness in pixels.
    pub outline_thickness: f32,
    #[serde(default)]
    pub outline_blur_radius: i32,
}

/// Deserialize any settings struct from a JSON file.
pub fn load_settings<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("opening settings file '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing settings file '{}'", path.display()))
}

fn default_true() -> bool {
    true
}

fn default_white() -> u32 {
    0xFFFF_FFFF
}

fn default_texture_size() -> IVec2 {
    IVec2::new(512, 512)
}
