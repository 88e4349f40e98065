//! Rendering error types.

use thiserror::Error;

use crate::backend::ShaderStage;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Texture creation failed.
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// Buffer creation failed.
    #[error("buffer creation failed: {0}")]
    BufferCreationFailed(String),

    /// Shader object creation or compilation failed.
    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompilationFailed { stage: ShaderStage, log: String },

    /// Program creation or linking failed.
    #[error("program link failed: {0}")]
    ProgramLinkFailed(String),

    /// A vertex attribute the compositor needs is missing from the program.
    #[error("attribute '{0}' not found in program")]
    MissingAttribute(&'static str),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
