//! Frame compositor: draws the external video texture as a full-screen quad.

use campreview_core::geometry::{
    COORDS_PER_VERTEX, DRAW_ORDER, QUAD_POSITIONS, QUAD_TEX_COORDS, VERTEX_STRIDE,
};
use campreview_core::{BufferHandle, CoordinateTransform, Resolution, TextureHandle, TransformMode};

use crate::backend::{BufferUsage, GraphicsBackend};
use crate::buffer::{create_index_buffer, create_vertex_buffer, update_vertex_buffer};
use crate::error::RenderResult;
use crate::shader::ShaderProgram;

/// Texture unit the external sampler reads from.
const TEXTURE_UNIT: u32 = 0;

/// GPU resources for drawing one external texture.
///
/// Created once per texture. Holds a compiled program, the static quad
/// buffers, and in [`TransformMode::Apply`] a dynamic buffer for the
/// transformed texture coordinates.
#[derive(Debug)]
pub struct FrameCompositor {
    texture: TextureHandle,
    shader: ShaderProgram,
    position_buffer: BufferHandle,
    tex_coord_buffer: BufferHandle,
    index_buffer: BufferHandle,
    transformed_tex_coord_buffer: Option<BufferHandle>,
    transform_mode: TransformMode,
}

impl FrameCompositor {
    /// Compiles the program and uploads the quad for `texture`.
    ///
    /// Fails if the shaders do not compile or link. There is no fallback.
    pub fn new<B: GraphicsBackend + ?Sized>(
        backend: &mut B,
        texture: TextureHandle,
        transform_mode: TransformMode,
    ) -> RenderResult<Self> {
        let shader = ShaderProgram::external_texture(backend)?;

        let mut created = Vec::with_capacity(4);
        let (position_buffer, tex_coord_buffer, index_buffer, transformed_tex_coord_buffer) =
            match upload_quad(backend, transform_mode, &mut created) {
                Ok(buffers) => buffers,
                Err(e) => {
                    for buffer in created {
                        backend.delete_buffer(buffer);
                    }
                    backend.delete_program(shader.program);
                    return Err(e);
                }
            };

        log::info!(
            "frame compositor ready for texture {} (transform {:?})",
            texture.get(),
            transform_mode
        );

        Ok(Self {
            texture,
            shader,
            position_buffer,
            tex_coord_buffer,
            index_buffer,
            transformed_tex_coord_buffer,
            transform_mode,
        })
    }

    /// Draws the texture over the current viewport.
    ///
    /// `transform` only reaches the quad in [`TransformMode::Apply`].
    /// `target_resolution` is accepted for interface compatibility and unused.
    /// Both attribute arrays are disabled again before returning.
    pub fn draw<B: GraphicsBackend + ?Sized>(
        &self,
        backend: &mut B,
        transform: &CoordinateTransform,
        _target_resolution: Option<Resolution>,
    ) {
        let shader = &self.shader;
        backend.use_program(Some(shader.program));
        backend.bind_external_texture(TEXTURE_UNIT, Some(self.texture));
        if let Some(sampler) = shader.sampler_uniform {
            backend.set_uniform_i32(sampler, TEXTURE_UNIT as i32);
        }

        backend.enable_vertex_attrib(shader.position_attribute);
        backend.vertex_attrib_pointer(
            shader.position_attribute,
            self.position_buffer,
            COORDS_PER_VERTEX,
            VERTEX_STRIDE,
        );

        let tex_coords = self.tex_coord_source(backend, transform);
        backend.enable_vertex_attrib(shader.tex_coord_attribute);
        backend.vertex_attrib_pointer(
            shader.tex_coord_attribute,
            tex_coords,
            COORDS_PER_VERTEX,
            VERTEX_STRIDE,
        );

        backend.draw_indexed_triangles(self.index_buffer, DRAW_ORDER.len() as i32);

        backend.disable_vertex_attrib(shader.position_attribute);
        backend.disable_vertex_attrib(shader.tex_coord_attribute);
    }

    /// Buffer the texture-coordinate stream reads from this frame.
    fn tex_coord_source<B: GraphicsBackend + ?Sized>(
        &self,
        backend: &mut B,
        transform: &CoordinateTransform,
    ) -> BufferHandle {
        match (self.transform_mode, self.transformed_tex_coord_buffer) {
            (TransformMode::Apply, Some(buffer)) => {
                let coords = transform.transform_tex_coords(&QUAD_TEX_COORDS);
                update_vertex_buffer(backend, buffer, &coords);
                buffer
            }
            _ => self.tex_coord_buffer,
        }
    }

    /// Releases the program and buffers. The texture is not owned here.
    pub fn destroy<B: GraphicsBackend + ?Sized>(self, backend: &mut B) {
        backend.delete_program(self.shader.program);
        backend.delete_buffer(self.position_buffer);
        backend.delete_buffer(self.tex_coord_buffer);
        backend.delete_buffer(self.index_buffer);
        if let Some(buffer) = self.transformed_tex_coord_buffer {
            backend.delete_buffer(buffer);
        }
    }

    /// The external texture this compositor samples.
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn transform_mode(&self) -> TransformMode {
        self.transform_mode
    }

    pub fn shader(&self) -> &ShaderProgram {
        &self.shader
    }

    pub fn position_buffer(&self) -> BufferHandle {
        self.position_buffer
    }

    pub fn tex_coord_buffer(&self) -> BufferHandle {
        self.tex_coord_buffer
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer
    }
}

type QuadBuffers = (BufferHandle, BufferHandle, BufferHandle, Option<BufferHandle>);

/// Uploads positions, texture coordinates, indices and, in apply mode, the
/// dynamic coordinate buffer. Every buffer created is pushed to `created`.
fn upload_quad<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    transform_mode: TransformMode,
    created: &mut Vec<BufferHandle>,
) -> RenderResult<QuadBuffers> {
    let position = create_vertex_buffer(backend, &QUAD_POSITIONS, BufferUsage::Static)?;
    created.push(position);
    let tex_coords = create_vertex_buffer(backend, &QUAD_TEX_COORDS, BufferUsage::Static)?;
    created.push(tex_coords);
    let indices = create_index_buffer(backend, &DRAW_ORDER)?;
    created.push(indices);
    let transformed = match transform_mode {
        TransformMode::Ignore => None,
        TransformMode::Apply => {
            let buffer = create_vertex_buffer(backend, &QUAD_TEX_COORDS, BufferUsage::Dynamic)?;
            created.push(buffer);
            Some(buffer)
        }
    };
    Ok((position, tex_coords, indices, transformed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ShaderStage;
    use crate::recording::{GlCall, RecordingBackend};
    use crate::RenderError;
    use campreview_core::{Mat4, TextureFilter};
    use proptest::prelude::*;

    fn setup(mode: TransformMode) -> (RecordingBackend, FrameCompositor) {
        let mut backend = RecordingBackend::new();
        let texture = backend
            .create_external_texture(TextureFilter::Nearest, TextureFilter::Linear)
            .unwrap();
        let compositor = FrameCompositor::new(&mut backend, texture, mode).unwrap();
        backend.clear_calls();
        (backend, compositor)
    }

    fn mirror() -> CoordinateTransform {
        // u' = 1 - u
        CoordinateTransform::from(
            Mat4::from_translation(glam::Vec3::new(1.0, 0.0, 0.0))
                * Mat4::from_scale(glam::Vec3::new(-1.0, 1.0, 1.0)),
        )
    }

    #[test]
    fn test_uploads_static_geometry() {
        let (backend, compositor) = setup(TransformMode::Ignore);
        assert_eq!(compositor.transform_mode(), TransformMode::Ignore);
        assert_eq!(
            backend.buffer_f32s(compositor.position_buffer()),
            Some(QUAD_POSITIONS.to_vec())
        );
        assert_eq!(
            backend.buffer_f32s(compositor.tex_coord_buffer()),
            Some(QUAD_TEX_COORDS.to_vec())
        );
        assert_eq!(
            backend.buffer_u16s(compositor.index_buffer()),
            Some(DRAW_ORDER.to_vec())
        );
        assert_eq!(backend.live_buffer_count(), 3);
    }

    #[test]
    fn test_draw_issues_one_indexed_draw_with_texture_bound() {
        let (mut backend, compositor) = setup(TransformMode::Ignore);
        compositor.draw(&mut backend, &CoordinateTransform::IDENTITY, None);

        let draws = backend.draw_calls();
        assert_eq!(draws.len(), 1);
        let draw = draws[0];
        assert_eq!(draw.count, 6);
        assert_eq!(draw.texture, Some(compositor.texture()));
        assert_eq!(draw.program, Some(compositor.shader().program));
        assert_eq!(draw.index_buffer, compositor.index_buffer());
        assert_eq!(
            draw.attributes,
            vec![
                (0, Some(compositor.position_buffer())),
                (1, Some(compositor.tex_coord_buffer())),
            ]
        );
    }

    #[test]
    fn test_draw_binds_sampler_to_unit_zero() {
        let (mut backend, compositor) = setup(TransformMode::Ignore);
        compositor.draw(&mut backend, &CoordinateTransform::IDENTITY, None);
        let sampler = compositor.shader().sampler_uniform.unwrap();
        assert_eq!(
            backend.uniform_value(compositor.shader().program, sampler),
            Some(0)
        );
    }

    #[test]
    fn test_attributes_disabled_after_draw() {
        let (mut backend, compositor) = setup(TransformMode::Apply);
        compositor.draw(&mut backend, &mirror(), Some(Resolution::new(1280, 720)));

        let shader = compositor.shader();
        assert!(!backend.is_vertex_attrib_enabled(shader.position_attribute));
        assert!(!backend.is_vertex_attrib_enabled(shader.tex_coord_attribute));
        assert!(backend.enabled_attributes().is_empty());
        assert_eq!(
            backend.calls().last(),
            Some(&GlCall::DisableVertexAttrib(shader.tex_coord_attribute))
        );
    }

    #[test]
    fn test_ignore_mode_draws_static_coords_for_any_transform() {
        // Rotation and mirroring from the producer are not applied in this mode.
        let (mut backend, compositor) = setup(TransformMode::Ignore);
        compositor.draw(&mut backend, &mirror(), None);

        let draw = backend.draw_calls()[0].clone();
        assert_eq!(draw.attributes[1].1, Some(compositor.tex_coord_buffer()));
        assert!(!backend
            .calls()
            .iter()
            .any(|c| matches!(c, GlCall::UpdateBuffer { .. })));
    }

    #[test]
    fn test_apply_mode_draws_transformed_coords() {
        let (mut backend, compositor) = setup(TransformMode::Apply);
        compositor.draw(&mut backend, &mirror(), None);

        let draw = backend.draw_calls()[0].clone();
        let stream = draw.attributes[1].1.unwrap();
        assert_ne!(stream, compositor.tex_coord_buffer());
        assert_eq!(
            backend.buffer_f32s(stream),
            Some(vec![1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0])
        );
        // Static geometry is never rewritten.
        assert_eq!(
            backend.buffer_f32s(compositor.tex_coord_buffer()),
            Some(QUAD_TEX_COORDS.to_vec())
        );
    }

    #[test]
    fn test_compile_failure_is_returned() {
        let mut backend = RecordingBackend::new().with_failing_stage(ShaderStage::Vertex);
        let texture = backend
            .create_external_texture(TextureFilter::Nearest, TextureFilter::Linear)
            .unwrap();
        let err = FrameCompositor::new(&mut backend, texture, TransformMode::Ignore).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ShaderCompilationFailed {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
        assert_eq!(backend.live_buffer_count(), 0);
    }

    #[test]
    fn test_link_failure_is_returned() {
        let mut backend = RecordingBackend::new().with_link_failure();
        let texture = backend
            .create_external_texture(TextureFilter::Nearest, TextureFilter::Linear)
            .unwrap();
        let err = FrameCompositor::new(&mut backend, texture, TransformMode::Ignore).unwrap_err();
        assert!(matches!(err, RenderError::ProgramLinkFailed(_)));
    }

    #[test]
    fn test_destroy_releases_everything_but_texture() {
        let (mut backend, compositor) = setup(TransformMode::Apply);
        let texture = compositor.texture();
        compositor.destroy(&mut backend);
        assert_eq!(backend.live_buffer_count(), 0);
        assert_eq!(backend.live_program_count(), 0);
        assert!(backend.is_live_texture(texture));
    }

    fn any_mode() -> impl Strategy<Value = TransformMode> {
        prop_oneof![Just(TransformMode::Ignore), Just(TransformMode::Apply)]
    }

    proptest! {
        #[test]
        fn draw_leaves_no_attribute_enabled(
            mode in any_mode(),
            values in prop::array::uniform16(-4.0f32..4.0),
            frames in 1usize..4,
        ) {
            let (mut backend, compositor) = setup(mode);
            let transform = CoordinateTransform::from_cols_array(&values);
            for _ in 0..frames {
                compositor.draw(&mut backend, &transform, None);
                prop_assert!(backend.enabled_attributes().is_empty());
            }
            prop_assert_eq!(backend.draw_count(), frames);
            prop_assert_eq!(
                backend.buffer_f32s(compositor.tex_coord_buffer()),
                Some(QUAD_TEX_COORDS.to_vec())
            );

            let stream = backend.draw_calls()[0].attributes[1].1;
            match mode {
                TransformMode::Ignore => {
                    prop_assert_eq!(stream, Some(compositor.tex_coord_buffer()));
                }
                TransformMode::Apply => {
                    let stream = stream.unwrap();
                    prop_assert_eq!(
                        backend.buffer_f32s(stream),
                        Some(transform.transform_tex_coords(&QUAD_TEX_COORDS))
                    );
                }
            }
        }
    }
}
