//! Rendering backend for campreview.
//!
//! This crate provides the GPU side of the preview:
//! - [`GraphicsBackend`], the graphics-context seam
//! - [`GlBackend`] for OpenGL ES contexts via `glow`
//! - [`RecordingBackend`] for headless runs and tests
//! - Shader sources and the [`FrameCompositor`] that draws external textures

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// GL takes GLint/GLsizei for small counts and units
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

pub mod backend;
pub mod buffer;
pub mod compositor;
pub mod error;
pub mod gl_backend;
pub mod recording;
pub mod shader;

pub use backend::{BufferKind, BufferUsage, GraphicsBackend, ShaderStage};
pub use compositor::FrameCompositor;
pub use error::{RenderError, RenderResult};
pub use gl_backend::{GlBackend, TEXTURE_EXTERNAL_OES};
pub use recording::{DrawCall, GlCall, RecordingBackend};
pub use shader::{
    ShaderBuilder, ShaderProgram, FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE,
};
