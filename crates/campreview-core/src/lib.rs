//! Core abstractions for campreview.
//!
//! This crate provides the types shared by the renderer and the surface bridge:
//! - [`PreviewError`] and the crate-wide [`Result`]
//! - [`PreviewOptions`] configuration
//! - GPU handles, [`Resolution`], and the per-frame [`CoordinateTransform`]
//! - The static quad [`geometry`]
//! - Cross-thread primitives: [`ReadyNotification`] and [`RenderRequest`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel sizes are far below f32 precision limits
#![allow(clippy::cast_precision_loss)]

pub mod error;
pub mod geometry;
pub mod handle;
pub mod notify;
pub mod options;
pub mod request;
pub mod resolution;
pub mod transform;

pub use error::{PreviewError, Result};
pub use handle::{BufferHandle, ProgramHandle, TextureHandle, UniformLocation};
pub use notify::ReadyNotification;
pub use options::{ClearColor, PreviewOptions, TextureFilter, TransformMode};
pub use request::RenderRequest;
pub use resolution::{Resolution, Viewport};
pub use transform::CoordinateTransform;

// Re-export glam types for convenience
pub use glam::Mat4;
