//! Error types for campreview.

use thiserror::Error;

/// The main error type for campreview operations.
#[derive(Error, Debug)]
pub enum PreviewError {
    /// A frame producer was attached before the preview surface existed.
    #[error("camera attached before the preview surface was created - wait for on_render_surface_ready()")]
    SurfaceNotReady,

    /// A producer wrote to a surface that has already been released.
    #[error("frame surface has already been released")]
    SurfaceReleased,

    /// Rendering error.
    #[error("render error: {0}")]
    RenderError(String),

    /// The surface platform failed to create or update a surface.
    #[error("surface platform error: {0}")]
    PlatformError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for campreview operations.
pub type Result<T> = std::result::Result<T, PreviewError>;
