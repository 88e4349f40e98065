//! Opaque GPU object handles.
//!
//! Handles mirror the integer names a GL context hands out: texture, program
//! and buffer names are never zero, uniform locations may be.

use std::num::NonZeroU32;

/// Name of a texture bound to the external-image target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub NonZeroU32);

/// Name of a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub NonZeroU32);

/// Name of a GPU buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub NonZeroU32);

/// Location of a uniform inside a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

impl TextureHandle {
    /// Returns the raw texture name.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl ProgramHandle {
    /// Returns the raw program name.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl BufferHandle {
    /// Returns the raw buffer name.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}
