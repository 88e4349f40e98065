//! GPU buffer helpers.

use campreview_core::BufferHandle;

use crate::backend::{BufferKind, BufferUsage, GraphicsBackend};
use crate::error::RenderResult;

/// Creates a vertex buffer from data.
pub fn create_vertex_buffer<B: GraphicsBackend + ?Sized, T: bytemuck::Pod>(
    backend: &mut B,
    data: &[T],
    usage: BufferUsage,
) -> RenderResult<BufferHandle> {
    backend.create_buffer(BufferKind::Vertex, bytemuck::cast_slice(data), usage)
}

/// Creates a static u16 index buffer.
pub fn create_index_buffer<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    data: &[u16],
) -> RenderResult<BufferHandle> {
    backend.create_buffer(
        BufferKind::Index,
        bytemuck::cast_slice(data),
        BufferUsage::Static,
    )
}

/// Updates a vertex buffer with new data.
pub fn update_vertex_buffer<B: GraphicsBackend + ?Sized, T: bytemuck::Pod>(
    backend: &mut B,
    buffer: BufferHandle,
    data: &[T],
) {
    backend.update_buffer(buffer, BufferKind::Vertex, bytemuck::cast_slice(data));
}
