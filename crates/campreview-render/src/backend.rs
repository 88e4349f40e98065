//! Graphics API seam.
//!
//! [`GraphicsBackend`] is the subset of an OpenGL ES 2 style context the
//! compositor needs. Every method must be called on the thread that owns the
//! context, inside a host render callback.

use campreview_core::{
    BufferHandle, ClearColor, ProgramHandle, TextureFilter, TextureHandle, UniformLocation,
    Viewport,
};

use crate::error::RenderResult;

/// Programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Binding point a buffer is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Per-vertex attribute data.
    Vertex,
    /// u16 triangle indices.
    Index,
}

/// Expected update frequency of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once.
    Static,
    /// Re-uploaded every frame.
    Dynamic,
}

/// Minimal GPU context used by the frame compositor.
pub trait GraphicsBackend {
    /// Creates a texture on the external-image target with clamp-to-edge wrapping.
    fn create_external_texture(
        &mut self,
        min_filter: TextureFilter,
        mag_filter: TextureFilter,
    ) -> RenderResult<TextureHandle>;

    fn delete_texture(&mut self, texture: TextureHandle);

    /// Compiles both stages and links them into a program.
    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> RenderResult<ProgramHandle>;

    fn delete_program(&mut self, program: ProgramHandle);

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        data: &[u8],
        usage: BufferUsage,
    ) -> RenderResult<BufferHandle>;

    /// Replaces the contents of an existing buffer.
    fn update_buffer(&mut self, buffer: BufferHandle, kind: BufferKind, data: &[u8]);

    fn delete_buffer(&mut self, buffer: BufferHandle);

    fn use_program(&mut self, program: Option<ProgramHandle>);

    /// Activates texture `unit` and binds `texture` to its external-image target.
    fn bind_external_texture(&mut self, unit: u32, texture: Option<TextureHandle>);

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32);

    fn enable_vertex_attrib(&mut self, index: u32);

    fn disable_vertex_attrib(&mut self, index: u32);

    /// Points attribute `index` at tightly packed f32 data in `buffer`.
    fn vertex_attrib_pointer(&mut self, index: u32, buffer: BufferHandle, components: i32, stride: i32);

    /// Draws a triangle list from `count` u16 indices in `indices`.
    fn draw_indexed_triangles(&mut self, indices: BufferHandle, count: i32);

    /// Sets the clear color without clearing.
    fn set_clear_color(&mut self, color: ClearColor);

    /// Sets the clear color, then clears the color and depth buffers.
    fn clear(&mut self, color: ClearColor);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Queries whether attribute array `index` is enabled.
    fn is_vertex_attrib_enabled(&self, index: u32) -> bool;
}
