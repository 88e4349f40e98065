//! Configuration options for the preview.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options controlling how the preview clears, samples, and orients frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    /// Clear color set on the context when the rendering surface is created.
    /// Nothing is cleared with it; the first frame clears with
    /// `frame_clear_color`.
    pub surface_clear_color: ClearColor,

    /// Clear color applied at the start of every frame.
    pub frame_clear_color: ClearColor,

    /// Whether the per-frame coordinate transform reaches the quad.
    pub transform_mode: TransformMode,

    /// Minification filter of the external texture.
    pub min_filter: TextureFilter,

    /// Magnification filter of the external texture.
    pub mag_filter: TextureFilter,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            surface_clear_color: ClearColor::TRANSPARENT,
            frame_clear_color: ClearColor::WHITE,
            transform_mode: TransformMode::Ignore,
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Linear,
        }
    }
}

impl PreviewOptions {
    /// Parses options from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let options = Self::from_json_str(&text)?;
        log::debug!("loaded preview options from {}", path.as_ref().display());
        Ok(options)
    }

    /// Serializes options to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// RGBA clear color, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for ClearColor {
    /// The GL initial clear color.
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// How the compositor treats the coordinate transform handed to `draw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    /// Draw the static texture coordinates; rotation and mirroring reported
    /// by the producer are not applied.
    #[default]
    Ignore,
    /// Multiply the texture coordinates by the transform every frame.
    Apply,
}

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter {
    Nearest,
    Linear,
}
