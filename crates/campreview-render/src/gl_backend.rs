//! OpenGL ES backend built on `glow`.
//!
//! The host owns the EGL/GL context and makes it current on its render
//! thread. [`GlBackend`] only issues calls into that context.

// glow exposes the GL API as unsafe functions
#![allow(unsafe_code)]
// GL enums are u32 but glTexParameteri takes GLint
#![allow(clippy::cast_possible_wrap)]

use std::sync::Arc;

use campreview_core::{
    BufferHandle, ClearColor, ProgramHandle, TextureFilter, TextureHandle, UniformLocation,
    Viewport,
};
use glow::HasContext;

use crate::backend::{BufferKind, BufferUsage, GraphicsBackend, ShaderStage};
use crate::error::{RenderError, RenderResult};

/// `GL_TEXTURE_EXTERNAL_OES` from `OES_EGL_image_external`.
pub const TEXTURE_EXTERNAL_OES: u32 = 0x8D65;

/// [`GraphicsBackend`] over a live GL ES 2+ context.
pub struct GlBackend {
    gl: Arc<glow::Context>,
}

impl GlBackend {
    /// Wraps a context the host has already made current.
    pub fn new(gl: Arc<glow::Context>) -> Self {
        Self { gl }
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> RenderResult<glow::NativeShader> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(|log| RenderError::ShaderCompilationFailed { stage, log })?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(RenderError::ShaderCompilationFailed { stage, log });
            }
            Ok(shader)
        }
    }
}

fn filter_enum(filter: TextureFilter) -> i32 {
    match filter {
        TextureFilter::Nearest => glow::NEAREST as i32,
        TextureFilter::Linear => glow::LINEAR as i32,
    }
}

fn buffer_target(kind: BufferKind) -> u32 {
    match kind {
        BufferKind::Vertex => glow::ARRAY_BUFFER,
        BufferKind::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn buffer_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
    }
}

impl GraphicsBackend for GlBackend {
    fn create_external_texture(
        &mut self,
        min_filter: TextureFilter,
        mag_filter: TextureFilter,
    ) -> RenderResult<TextureHandle> {
        unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(RenderError::TextureCreationFailed)?;
            self.gl.bind_texture(TEXTURE_EXTERNAL_OES, Some(texture));
            self.gl.tex_parameter_i32(
                TEXTURE_EXTERNAL_OES,
                glow::TEXTURE_MIN_FILTER,
                filter_enum(min_filter),
            );
            self.gl.tex_parameter_i32(
                TEXTURE_EXTERNAL_OES,
                glow::TEXTURE_MAG_FILTER,
                filter_enum(mag_filter),
            );
            self.gl.tex_parameter_i32(
                TEXTURE_EXTERNAL_OES,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.tex_parameter_i32(
                TEXTURE_EXTERNAL_OES,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
            self.gl.bind_texture(TEXTURE_EXTERNAL_OES, None);
            Ok(TextureHandle(texture.0))
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
    }

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> RenderResult<ProgramHandle> {
        let vs = self.compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fs = match self.compile_stage(ShaderStage::Fragment, fragment_source) {
            Ok(fs) => fs,
            Err(e) => {
                unsafe { self.gl.delete_shader(vs) };
                return Err(e);
            }
        };

        unsafe {
            let program = match self.gl.create_program() {
                Ok(program) => program,
                Err(log) => {
                    self.gl.delete_shader(vs);
                    self.gl.delete_shader(fs);
                    return Err(RenderError::ProgramLinkFailed(log));
                }
            };
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);

            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);
            self.gl.delete_shader(vs);
            self.gl.delete_shader(fs);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(RenderError::ProgramLinkFailed(log));
            }
            Ok(ProgramHandle(program.0))
        }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        unsafe {
            self.gl
                .get_attrib_location(glow::NativeProgram(program.0), name)
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
                .map(|location| UniformLocation(location.0))
        }
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        data: &[u8],
        usage: BufferUsage,
    ) -> RenderResult<BufferHandle> {
        let target = buffer_target(kind);
        let usage = buffer_usage(usage);
        unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(RenderError::BufferCreationFailed)?;
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, data, usage);
            self.gl.bind_buffer(target, None);
            Ok(BufferHandle(buffer.0))
        }
    }

    fn update_buffer(&mut self, buffer: BufferHandle, kind: BufferKind, data: &[u8]) {
        let target = buffer_target(kind);
        unsafe {
            self.gl.bind_buffer(target, Some(glow::NativeBuffer(buffer.0)));
            self.gl.buffer_sub_data_u8_slice(target, 0, data);
            self.gl.bind_buffer(target, None);
        }
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) }
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        unsafe {
            self.gl
                .use_program(program.map(|p| glow::NativeProgram(p.0)));
        }
    }

    fn bind_external_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(
                TEXTURE_EXTERNAL_OES,
                texture.map(|t| glow::NativeTexture(t.0)),
            );
        }
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32) {
        unsafe {
            self.gl
                .uniform_1_i32(Some(&glow::NativeUniformLocation(location.0)), value);
        }
    }

    fn enable_vertex_attrib(&mut self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn disable_vertex_attrib(&mut self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer(&mut self, index: u32, buffer: BufferHandle, components: i32, stride: i32) {
        unsafe {
            self.gl
                .bind_buffer(glow::ARRAY_BUFFER, Some(glow::NativeBuffer(buffer.0)));
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, 0);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn draw_indexed_triangles(&mut self, indices: BufferHandle, count: i32) {
        unsafe {
            self.gl.bind_buffer(
                glow::ELEMENT_ARRAY_BUFFER,
                Some(glow::NativeBuffer(indices.0)),
            );
            self.gl
                .draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_SHORT, 0);
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        }
    }

    fn set_clear_color(&mut self, color: ClearColor) {
        unsafe { self.gl.clear_color(color.r, color.g, color.b, color.a) }
    }

    fn clear(&mut self, color: ClearColor) {
        unsafe {
            self.gl.clear_color(color.r, color.g, color.b, color.a);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        unsafe {
            self.gl
                .viewport(viewport.x, viewport.y, viewport.width, viewport.height);
        }
    }

    fn is_vertex_attrib_enabled(&self, index: u32) -> bool {
        let mut enabled = [0.0f32; 4];
        unsafe {
            self.gl.get_vertex_attrib_parameter_f32_slice(
                index,
                glow::VERTEX_ATTRIB_ARRAY_ENABLED,
                &mut enabled,
            );
        }
        enabled[0] > 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_target_value() {
        assert_eq!(TEXTURE_EXTERNAL_OES, 0x8D65);
    }

    #[test]
    fn test_filter_enums() {
        assert_eq!(filter_enum(TextureFilter::Nearest), 0x2600);
        assert_eq!(filter_enum(TextureFilter::Linear), 0x2601);
    }

    #[test]
    fn test_buffer_targets_and_usage() {
        assert_eq!(buffer_target(BufferKind::Vertex), glow::ARRAY_BUFFER);
        assert_eq!(buffer_target(BufferKind::Index), glow::ELEMENT_ARRAY_BUFFER);
        assert_eq!(buffer_usage(BufferUsage::Static), glow::STATIC_DRAW);
        assert_eq!(buffer_usage(BufferUsage::Dynamic), glow::DYNAMIC_DRAW);
    }
}
