//! Surface platform seam between the camera framework and the bridge.
//!
//! A [`SurfacePlatform`] turns the external texture into a consumer surface
//! the frame producer can write into, e.g. an Android `SurfaceTexture`.

use std::sync::mpsc::Sender;

use campreview_core::{CoordinateTransform, RenderRequest, Resolution, Result, TextureHandle};

/// A frame producer's request for a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceRequest {
    /// Resolution the producer will write at.
    pub resolution: Resolution,
}

impl SurfaceRequest {
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: Resolution::new(width, height),
        }
    }
}

/// How a frame producer finished with a provided surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceResult {
    /// The producer used the surface and no longer writes to it.
    UsedSuccessfully,
    /// The request was cancelled before the surface was used.
    RequestCancelled,
    /// The surface was rejected by the producer.
    InvalidSurface,
    /// A surface had already been provided for this request.
    SurfaceAlreadyProvided,
    /// The request was completed without a surface.
    WillNotProvideSurface,
}

impl SurfaceResult {
    /// Whether this result ends the attachment and frees the surface.
    pub fn releases_surface(self) -> bool {
        matches!(self, Self::UsedSuccessfully)
    }
}

/// Consumer side of a frame surface, backed by the external texture.
///
/// All methods run on the render thread.
pub trait FrameSurface {
    /// Latches the most recent frame into the external texture.
    fn update_tex_image(&mut self) -> Result<()>;

    /// Transform for the frame latched by the last [`update_tex_image`](Self::update_tex_image).
    fn transform_matrix(&self) -> CoordinateTransform;

    /// Releases the surface. The instance is never reused.
    fn release(self);
}

/// Creates frame surfaces on top of external textures.
pub trait SurfacePlatform {
    type Surface: FrameSurface;

    /// Producer-facing handle the producer writes frames into.
    type Endpoint;

    /// Creates a surface sized to `resolution` over `texture`.
    ///
    /// The platform calls `frame_available.request()` whenever the producer
    /// finishes writing a frame, from whatever thread it writes on.
    fn create_surface(
        &mut self,
        texture: TextureHandle,
        resolution: Resolution,
        frame_available: RenderRequest,
    ) -> Result<(Self::Surface, Self::Endpoint)>;
}

/// A completion posted by a producer, drained on the render thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CompletionNotice {
    pub generation: u64,
    pub result: SurfaceResult,
}

/// Single-use completion signal handed to the producer with its surface.
///
/// Consumed by [`complete`](Self::complete), so a surface is completed at
/// most once. May be sent to and completed on any thread.
#[derive(Debug)]
pub struct SurfaceCompletion {
    generation: u64,
    sender: Sender<CompletionNotice>,
    render_request: RenderRequest,
}

impl SurfaceCompletion {
    pub(crate) fn new(
        generation: u64,
        sender: Sender<CompletionNotice>,
        render_request: RenderRequest,
    ) -> Self {
        Self {
            generation,
            sender,
            render_request,
        }
    }

    /// Reports that the producer is done with the surface.
    ///
    /// The bridge applies the result on its next render tick, so a render is
    /// requested as well.
    pub fn complete(self, result: SurfaceResult) {
        let notice = CompletionNotice {
            generation: self.generation,
            result,
        };
        if self.sender.send(notice).is_err() {
            log::debug!("surface {} completed after the bridge was dropped", self.generation);
            return;
        }
        self.render_request.request();
    }

    /// Attachment generation this completion belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What `attach_frame_producer` hands back to the producer.
#[derive(Debug)]
pub struct ProvidedSurface<E> {
    /// Where the producer writes frames.
    pub endpoint: E,
    /// Signal to send once the producer stops using the surface.
    pub completion: SurfaceCompletion,
    /// Resolution the surface was sized to.
    pub resolution: Resolution,
}
