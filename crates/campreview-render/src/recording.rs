//! Headless backend that records every call.
//!
//! [`RecordingBackend`] runs without a GPU. It hands out object names the
//! way a GL driver does, tracks the bits of context state the compositor
//! touches, and answers the same queries a real context would. Used for
//! integration tests and the loopback demo.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::num::NonZeroU32;

use campreview_core::{
    BufferHandle, ClearColor, ProgramHandle, TextureFilter, TextureHandle, UniformLocation,
    Viewport,
};

use crate::backend::{BufferKind, BufferUsage, GraphicsBackend, ShaderStage};
use crate::error::{RenderError, RenderResult};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateExternalTexture {
        texture: TextureHandle,
        min_filter: TextureFilter,
        mag_filter: TextureFilter,
    },
    DeleteTexture(TextureHandle),
    CreateProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    CreateBuffer {
        buffer: BufferHandle,
        kind: BufferKind,
        usage: BufferUsage,
        len: usize,
    },
    UpdateBuffer {
        buffer: BufferHandle,
        len: usize,
    },
    DeleteBuffer(BufferHandle),
    UseProgram(Option<ProgramHandle>),
    BindExternalTexture {
        unit: u32,
        texture: Option<TextureHandle>,
    },
    SetUniformI32 {
        location: UniformLocation,
        value: i32,
    },
    EnableVertexAttrib(u32),
    DisableVertexAttrib(u32),
    VertexAttribPointer {
        index: u32,
        buffer: BufferHandle,
        components: i32,
        stride: i32,
    },
    Draw(DrawCall),
    SetClearColor(ClearColor),
    Clear(ClearColor),
    SetViewport(Viewport),
}

/// Context state captured at the moment of an indexed draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: Option<ProgramHandle>,
    /// Texture bound to the external target of unit 0.
    pub texture: Option<TextureHandle>,
    pub index_buffer: BufferHandle,
    pub count: i32,
    /// Enabled attribute arrays and the buffer each one reads from.
    pub attributes: Vec<(u32, Option<BufferHandle>)>,
}

#[derive(Debug, Clone)]
struct ProgramInfo {
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

/// Parses `<qualifier> <type> <name>;` declarations.
fn declarations<'a>(source: &'a str, qualifier: &'a str) -> impl Iterator<Item = String> + 'a {
    source.lines().filter_map(move |line| {
        let mut words = line.trim().trim_end_matches(';').split_whitespace();
        if words.next()? != qualifier {
            return None;
        }
        let _ty = words.next()?;
        words.next().map(str::to_string)
    })
}

/// GPU-less [`GraphicsBackend`] that records calls and tracks state.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<GlCall>,
    last_name: u32,
    textures: HashSet<TextureHandle>,
    programs: HashMap<ProgramHandle, ProgramInfo>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    current_program: Option<ProgramHandle>,
    external_bindings: HashMap<u32, TextureHandle>,
    uniforms: HashMap<(ProgramHandle, UniformLocation), i32>,
    enabled_attributes: BTreeSet<u32>,
    attribute_buffers: HashMap<u32, BufferHandle>,
    viewport: Viewport,
    clear_color: ClearColor,
    failing_stage: Option<ShaderStage>,
    fail_link: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every compile of `stage` fail, as a driver rejecting the source would.
    #[must_use]
    pub fn with_failing_stage(mut self, stage: ShaderStage) -> Self {
        self.failing_stage = Some(stage);
        self
    }

    /// Makes every program link fail.
    #[must_use]
    pub fn with_link_failure(mut self) -> Self {
        self.fail_link = true;
        self
    }

    fn next_name(&mut self) -> NonZeroU32 {
        self.last_name += 1;
        NonZeroU32::new(self.last_name).unwrap_or(NonZeroU32::MIN)
    }

    /// All calls recorded since construction or the last [`clear_calls`](Self::clear_calls).
    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    /// Forgets recorded calls. Context state is kept.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn draw_calls(&self) -> Vec<&DrawCall> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GlCall::Draw(draw) => Some(draw),
                _ => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.draw_calls().len()
    }

    pub fn clear_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, GlCall::Clear(_)))
            .count()
    }

    pub fn is_live_texture(&self, texture: TextureHandle) -> bool {
        self.textures.contains(&texture)
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Raw contents of a live buffer.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Contents of a live buffer read back as f32 values.
    pub fn buffer_f32s(&self, buffer: BufferHandle) -> Option<Vec<f32>> {
        self.buffer_contents(buffer)
            .map(|bytes| bytes.chunks_exact(4).map(bytemuck::pod_read_unaligned).collect())
    }

    /// Contents of a live buffer read back as u16 values.
    pub fn buffer_u16s(&self, buffer: BufferHandle) -> Option<Vec<u16>> {
        self.buffer_contents(buffer)
            .map(|bytes| bytes.chunks_exact(2).map(bytemuck::pod_read_unaligned).collect())
    }

    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.current_program
    }

    pub fn bound_external_texture(&self, unit: u32) -> Option<TextureHandle> {
        self.external_bindings.get(&unit).copied()
    }

    pub fn uniform_value(&self, program: ProgramHandle, location: UniformLocation) -> Option<i32> {
        self.uniforms.get(&(program, location)).copied()
    }

    pub fn enabled_attributes(&self) -> Vec<u32> {
        self.enabled_attributes.iter().copied().collect()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Clear color currently set on the context.
    pub fn clear_color(&self) -> ClearColor {
        self.clear_color
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_external_texture(
        &mut self,
        min_filter: TextureFilter,
        mag_filter: TextureFilter,
    ) -> RenderResult<TextureHandle> {
        let texture = TextureHandle(self.next_name());
        self.textures.insert(texture);
        self.calls.push(GlCall::CreateExternalTexture {
            texture,
            min_filter,
            mag_filter,
        });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
        self.external_bindings.retain(|_, bound| *bound != texture);
        self.calls.push(GlCall::DeleteTexture(texture));
    }

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> RenderResult<ProgramHandle> {
        for (stage, source) in [
            (ShaderStage::Vertex, vertex_source),
            (ShaderStage::Fragment, fragment_source),
        ] {
            if self.failing_stage == Some(stage) {
                return Err(RenderError::ShaderCompilationFailed {
                    stage,
                    log: "rejected by recording backend".into(),
                });
            }
            if !source.contains("void main") {
                return Err(RenderError::ShaderCompilationFailed {
                    stage,
                    log: "no main function".into(),
                });
            }
        }
        if self.fail_link {
            return Err(RenderError::ProgramLinkFailed(
                "rejected by recording backend".into(),
            ));
        }

        let program = ProgramHandle(self.next_name());
        let mut uniforms: Vec<String> = declarations(vertex_source, "uniform").collect();
        uniforms.extend(declarations(fragment_source, "uniform"));
        self.programs.insert(
            program,
            ProgramInfo {
                attributes: declarations(vertex_source, "attribute").collect(),
                uniforms,
            },
        );
        self.calls.push(GlCall::CreateProgram(program));
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.calls.push(GlCall::DeleteProgram(program));
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let info = self.programs.get(&program)?;
        let index = info.attributes.iter().position(|a| a == name)?;
        u32::try_from(index).ok()
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let info = self.programs.get(&program)?;
        let index = info.uniforms.iter().position(|u| u == name)?;
        u32::try_from(index).ok().map(UniformLocation)
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        data: &[u8],
        usage: BufferUsage,
    ) -> RenderResult<BufferHandle> {
        let buffer = BufferHandle(self.next_name());
        self.buffers.insert(buffer, data.to_vec());
        self.calls.push(GlCall::CreateBuffer {
            buffer,
            kind,
            usage,
            len: data.len(),
        });
        Ok(buffer)
    }

    fn update_buffer(&mut self, buffer: BufferHandle, _kind: BufferKind, data: &[u8]) {
        if let Some(contents) = self.buffers.get_mut(&buffer) {
            let len = data.len().min(contents.len());
            contents[..len].copy_from_slice(&data[..len]);
        }
        self.calls.push(GlCall::UpdateBuffer {
            buffer,
            len: data.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
        self.attribute_buffers.retain(|_, bound| *bound != buffer);
        self.calls.push(GlCall::DeleteBuffer(buffer));
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.current_program = program;
        self.calls.push(GlCall::UseProgram(program));
    }

    fn bind_external_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        match texture {
            Some(texture) => {
                self.external_bindings.insert(unit, texture);
            }
            None => {
                self.external_bindings.remove(&unit);
            }
        }
        self.calls.push(GlCall::BindExternalTexture { unit, texture });
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32) {
        if let Some(program) = self.current_program {
            self.uniforms.insert((program, location), value);
        }
        self.calls.push(GlCall::SetUniformI32 { location, value });
    }

    fn enable_vertex_attrib(&mut self, index: u32) {
        self.enabled_attributes.insert(index);
        self.calls.push(GlCall::EnableVertexAttrib(index));
    }

    fn disable_vertex_attrib(&mut self, index: u32) {
        self.enabled_attributes.remove(&index);
        self.calls.push(GlCall::DisableVertexAttrib(index));
    }

    fn vertex_attrib_pointer(&mut self, index: u32, buffer: BufferHandle, components: i32, stride: i32) {
        self.attribute_buffers.insert(index, buffer);
        self.calls.push(GlCall::VertexAttribPointer {
            index,
            buffer,
            components,
            stride,
        });
    }

    fn draw_indexed_triangles(&mut self, indices: BufferHandle, count: i32) {
        let attributes = self
            .enabled_attributes
            .iter()
            .map(|&index| (index, self.attribute_buffers.get(&index).copied()))
            .collect();
        let texture = self.bound_external_texture(0);
        self.calls.push(GlCall::Draw(DrawCall {
            program: self.current_program,
            texture,
            index_buffer: indices,
            count,
            attributes,
        }));
    }

    fn set_clear_color(&mut self, color: ClearColor) {
        self.clear_color = color;
        self.calls.push(GlCall::SetClearColor(color));
    }

    fn clear(&mut self, color: ClearColor) {
        self.clear_color = color;
        self.calls.push(GlCall::Clear(color));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.calls.push(GlCall::SetViewport(viewport));
    }

    fn is_vertex_attrib_enabled(&self, index: u32) -> bool {
        self.enabled_attributes.contains(&index)
    }
}
