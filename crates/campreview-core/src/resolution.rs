//! Frame and viewport dimensions.

use serde::{Deserialize, Serialize};

/// Pixel dimensions negotiated between a frame producer and the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Creates a new resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. Returns 0 for a zero-height resolution.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Returns true if either dimension is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Drawable region of the rendering surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    /// A viewport anchored at the origin covering `width` x `height` pixels.
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio() {
        let r = Resolution::new(1280, 720);
        assert!((r.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(Resolution::new(640, 0).aspect_ratio(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Resolution::new(1920, 1080).to_string(), "1920x1080");
    }

    #[test]
    fn test_is_empty() {
        assert!(Resolution::new(0, 720).is_empty());
        assert!(!Resolution::new(1, 1).is_empty());
    }
}
