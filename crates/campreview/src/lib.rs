//! campreview: a GPU camera-preview core.
//!
//! A windowing host drives a [`SurfaceBridge`] through three render hooks
//! (surface ready, surface changed, render frame). A camera framework
//! attaches frame producers to it. Each new frame requests a render; the
//! next tick latches the frame into an external texture and draws it with
//! the [`FrameCompositor`].
//!
//! # Quick Start
//!
//! ```
//! use campreview::*;
//!
//! fn main() -> Result<()> {
//!     let mut preview = HeadlessPreview::new(RecordingBackend::new(), LoopbackPlatform::new());
//!     preview.on_render_surface_ready()?;
//!     preview.on_render_surface_changed(1280, 720);
//!
//!     let provided = preview.attach_frame_producer(SurfaceRequest::new(1280, 720))?;
//!     provided.endpoint.publish_frame(CoordinateTransform::IDENTITY)?;
//!
//!     if preview.take_render_request() {
//!         assert_eq!(preview.on_render_frame()?, FrameOutcome::Drawn);
//!     }
//!     Ok(())
//! }
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod bridge;
pub mod loopback;
pub mod surface;

pub use campreview_core::{
    geometry, BufferHandle, ClearColor, CoordinateTransform, Mat4, PreviewError, PreviewOptions,
    ProgramHandle, ReadyNotification, RenderRequest, Resolution, Result, TextureFilter,
    TextureHandle, TransformMode, UniformLocation, Viewport,
};
pub use campreview_render::{
    DrawCall, FrameCompositor, GlBackend, GlCall, GraphicsBackend, RecordingBackend, RenderError,
    ShaderStage,
};

pub use bridge::{BridgeState, FrameOutcome, SurfaceBridge};
pub use loopback::{LoopbackFrame, LoopbackPlatform, LoopbackProducer, LoopbackStats};
pub use surface::{
    FrameSurface, ProvidedSurface, SurfaceCompletion, SurfacePlatform, SurfaceRequest,
    SurfaceResult,
};

/// Bridge over a live OpenGL ES context.
pub type GlPreview<P> = SurfaceBridge<GlBackend, P>;

/// Bridge that runs without a GPU or camera.
pub type HeadlessPreview = SurfaceBridge<RecordingBackend, LoopbackPlatform>;

/// Initializes `env_logger` from `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::debug!("campreview logging initialized");
    }
}
