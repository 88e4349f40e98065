//! Shader sources and program management.

use campreview_core::{ProgramHandle, UniformLocation};

use crate::backend::{GraphicsBackend, ShaderStage};
use crate::error::{RenderError, RenderResult};

/// Pass-through vertex stage: clip-space position and texture coordinate.
pub const VERTEX_SHADER_SOURCE: &str = "\
attribute vec4 vPosition;
attribute vec2 inputTextureCoordinate;
varying vec2 textureCoordinate;

void main(){
    gl_Position = vPosition;
    textureCoordinate = inputTextureCoordinate;
}";

/// Samples the external texture at the interpolated coordinate.
pub const FRAGMENT_SHADER_SOURCE: &str = "\
#extension GL_OES_EGL_image_external : require
precision mediump float;
varying vec2 textureCoordinate;
uniform samplerExternalOES s_texture;

void main(){
    gl_FragColor = texture2D(s_texture, textureCoordinate);
}";

pub const POSITION_ATTRIBUTE: &str = "vPosition";
pub const TEX_COORD_ATTRIBUTE: &str = "inputTextureCoordinate";
pub const SAMPLER_UNIFORM: &str = "s_texture";

/// The linked external-texture program and its resolved bindings.
#[derive(Debug, Clone, Copy)]
pub struct ShaderProgram {
    pub program: ProgramHandle,
    pub position_attribute: u32,
    pub tex_coord_attribute: u32,
    /// `None` if the driver reports no location; the sampler then stays on unit 0.
    pub sampler_uniform: Option<UniformLocation>,
}

/// Builder for creating shader programs.
pub struct ShaderBuilder {
    vertex_source: Option<String>,
    fragment_source: Option<String>,
    label: Option<String>,
}

impl ShaderBuilder {
    /// Creates a new shader builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertex_source: None,
            fragment_source: None,
            label: None,
        }
    }

    /// Builder preloaded with the external-texture sources.
    #[must_use]
    pub fn external_texture() -> Self {
        Self::new()
            .with_vertex(VERTEX_SHADER_SOURCE)
            .with_fragment(FRAGMENT_SHADER_SOURCE)
            .with_label("external texture")
    }

    /// Sets the vertex shader source (GLSL ES).
    pub fn with_vertex(mut self, source: impl Into<String>) -> Self {
        self.vertex_source = Some(source.into());
        self
    }

    /// Sets the fragment shader source (GLSL ES).
    pub fn with_fragment(mut self, source: impl Into<String>) -> Self {
        self.fragment_source = Some(source.into());
        self
    }

    /// Sets the label used in log messages.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Compiles and links the program.
    pub fn build<B: GraphicsBackend + ?Sized>(self, backend: &mut B) -> RenderResult<ProgramHandle> {
        let vertex = self
            .vertex_source
            .as_deref()
            .ok_or_else(|| RenderError::ShaderCompilationFailed {
                stage: ShaderStage::Vertex,
                log: "missing vertex shader".into(),
            })?;
        let fragment = self.fragment_source.as_deref().ok_or_else(|| {
            RenderError::ShaderCompilationFailed {
                stage: ShaderStage::Fragment,
                log: "missing fragment shader".into(),
            }
        })?;

        let program = backend.create_program(vertex, fragment)?;
        log::debug!(
            "linked shader program '{}' ({})",
            self.label.as_deref().unwrap_or("unnamed"),
            program.get()
        );
        Ok(program)
    }
}

impl Default for ShaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderProgram {
    /// Builds the external-texture program and resolves its bindings.
    pub fn external_texture<B: GraphicsBackend + ?Sized>(backend: &mut B) -> RenderResult<Self> {
        let program = ShaderBuilder::external_texture().build(backend)?;

        let position = backend.attrib_location(program, POSITION_ATTRIBUTE);
        let tex_coord = backend.attrib_location(program, TEX_COORD_ATTRIBUTE);
        let (position_attribute, tex_coord_attribute) = match (position, tex_coord) {
            (Some(position), Some(tex_coord)) => (position, tex_coord),
            (position, _) => {
                backend.delete_program(program);
                let missing = if position.is_none() {
                    POSITION_ATTRIBUTE
                } else {
                    TEX_COORD_ATTRIBUTE
                };
                return Err(RenderError::MissingAttribute(missing));
            }
        };

        Ok(Self {
            program,
            position_attribute,
            tex_coord_attribute,
            sampler_uniform: backend.uniform_location(program, SAMPLER_UNIFORM),
        })
    }
}
