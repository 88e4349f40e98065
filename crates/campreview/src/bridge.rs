//! Surface bridge: the preview's lifecycle state machine.
//!
//! The windowing host drives the bridge through its render-surface hooks and
//! the camera framework attaches frame producers to it. The bridge owns the
//! external texture, the compositor and the current frame surface.
//!
//! ```text
//! NoSurface -> SurfaceReady -> ProducerAttached -> ProducerDetached
//!                                     ^                   |
//!                                     +-------------------+
//! ```
//!
//! All `&mut self` methods must run on the host's render thread.

use std::sync::mpsc::{self, Receiver, Sender};

use campreview_core::{
    PreviewError, PreviewOptions, ReadyNotification, RenderRequest, Resolution, Result,
    TextureHandle, Viewport,
};
use campreview_render::{FrameCompositor, GraphicsBackend};

use crate::surface::{
    CompletionNotice, FrameSurface, ProvidedSurface, SurfaceCompletion, SurfacePlatform,
    SurfaceRequest,
};

/// Lifecycle state of a [`SurfaceBridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No rendering surface; no texture exists.
    NoSurface,
    /// Texture and compositor exist, no producer has attached yet.
    SurfaceReady,
    /// A producer is writing into a frame surface.
    ProducerAttached,
    /// The last producer finished with its surface.
    ProducerDetached,
}

/// Result of one render tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The target was cleared; nothing was drawn.
    Cleared,
    /// The latest frame was drawn.
    Drawn,
}

struct Attachment<S> {
    surface: S,
    resolution: Resolution,
    generation: u64,
}

/// Mediates between host render callbacks, the frame producer and the
/// [`FrameCompositor`].
///
/// The ready listener registered with
/// [`on_preview_ready`](Self::on_preview_ready) is consumed when it fires.
/// After [`on_render_surface_destroyed`](Self::on_render_surface_destroyed)
/// the host must register a new one to hear about the next surface.
pub struct SurfaceBridge<B: GraphicsBackend, P: SurfacePlatform> {
    backend: B,
    platform: P,
    options: PreviewOptions,
    texture: Option<TextureHandle>,
    compositor: Option<FrameCompositor>,
    attachment: Option<Attachment<P::Surface>>,
    detached: bool,
    viewport: Option<Viewport>,
    ready: ReadyNotification,
    render_request: RenderRequest,
    completion_tx: Sender<CompletionNotice>,
    completion_rx: Receiver<CompletionNotice>,
    next_generation: u64,
    frames_drawn: u64,
}

impl<B: GraphicsBackend, P: SurfacePlatform> SurfaceBridge<B, P> {
    /// Creates a bridge in [`BridgeState::NoSurface`] with default options.
    pub fn new(backend: B, platform: P) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            backend,
            platform,
            options: PreviewOptions::default(),
            texture: None,
            compositor: None,
            attachment: None,
            detached: false,
            viewport: None,
            ready: ReadyNotification::new(),
            render_request: RenderRequest::new(),
            completion_tx,
            completion_rx,
            next_generation: 0,
            frames_drawn: 0,
        }
    }

    /// Sets the options applied from the next surface creation on.
    #[must_use]
    pub fn with_options(mut self, options: PreviewOptions) -> Self {
        self.options = options;
        self
    }

    /// Uses `request` as the render-request mailbox, typically one created
    /// with a wake hook that asks the host for a redraw.
    #[must_use]
    pub fn with_render_request(mut self, request: RenderRequest) -> Self {
        self.render_request = request;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        match (self.texture, &self.attachment) {
            (None, _) => BridgeState::NoSurface,
            (Some(_), Some(_)) => BridgeState::ProducerAttached,
            (Some(_), None) if self.detached => BridgeState::ProducerDetached,
            (Some(_), None) => BridgeState::SurfaceReady,
        }
    }

    /// Registers the host's "preview ready" listener.
    ///
    /// Runs once, after the texture is established. If the surface is already
    /// ready it runs immediately. A listener only ever hears about one
    /// surface; re-register after the surface is destroyed.
    pub fn on_preview_ready(&self, listener: impl FnOnce() + Send + 'static) {
        self.ready.subscribe(listener);
    }

    /// Surface-created hook: allocates the external texture and the compositor.
    ///
    /// Only sets the surface clear color on the context. The first
    /// [`on_render_frame`](Self::on_render_frame) does the clearing.
    pub fn on_render_surface_ready(&mut self) -> Result<()> {
        if let Some(stale) = self.texture.take() {
            // The previous context is gone along with every object in it.
            log::warn!(
                "render surface recreated, dropping texture {} from the lost context",
                stale.get()
            );
            self.compositor = None;
            if let Some(attachment) = self.attachment.take() {
                attachment.surface.release();
            }
            self.detached = false;
        }

        self.backend.set_clear_color(self.options.surface_clear_color);

        let texture = self
            .backend
            .create_external_texture(self.options.min_filter, self.options.mag_filter)
            .map_err(|e| PreviewError::RenderError(e.to_string()))?;
        let compositor = match FrameCompositor::new(
            &mut self.backend,
            texture,
            self.options.transform_mode,
        ) {
            Ok(compositor) => compositor,
            Err(e) => {
                self.backend.delete_texture(texture);
                return Err(PreviewError::RenderError(e.to_string()));
            }
        };

        self.texture = Some(texture);
        self.compositor = Some(compositor);
        log::info!("preview surface ready (texture {})", texture.get());

        self.ready.fire();
        Ok(())
    }

    /// Surface-resized hook: sets the viewport to the new pixel size.
    pub fn on_render_surface_changed(&mut self, width: u32, height: u32) {
        let viewport = Viewport::from_size(
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(height).unwrap_or(i32::MAX),
        );
        self.backend.set_viewport(viewport);
        self.viewport = Some(viewport);
        log::debug!("preview viewport {width}x{height}");
    }

    /// Attaches a frame producer and returns the surface it should write to.
    ///
    /// Fails with [`PreviewError::SurfaceNotReady`] whenever it is called
    /// before [`on_render_surface_ready`](Self::on_render_surface_ready).
    pub fn attach_frame_producer(
        &mut self,
        request: SurfaceRequest,
    ) -> Result<ProvidedSurface<P::Endpoint>> {
        let Some(texture) = self.texture else {
            let err = PreviewError::SurfaceNotReady;
            log::error!("{err}");
            return Err(err);
        };

        if let Some(previous) = self.attachment.take() {
            log::warn!(
                "replacing attached frame surface (generation {})",
                previous.generation
            );
            previous.surface.release();
        }

        let (surface, endpoint) = self.platform.create_surface(
            texture,
            request.resolution,
            self.render_request.clone(),
        )?;

        self.next_generation += 1;
        let generation = self.next_generation;
        self.attachment = Some(Attachment {
            surface,
            resolution: request.resolution,
            generation,
        });
        self.detached = false;
        log::info!(
            "frame producer attached at {} (generation {generation})",
            request.resolution
        );

        Ok(ProvidedSurface {
            endpoint,
            completion: SurfaceCompletion::new(
                generation,
                self.completion_tx.clone(),
                self.render_request.clone(),
            ),
            resolution: request.resolution,
        })
    }

    /// Applies completions posted by producers. Returns how many were handled.
    ///
    /// Called at the start of every [`on_render_frame`](Self::on_render_frame).
    pub fn process_completions(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(notice) = self.completion_rx.try_recv() {
            handled += 1;
            self.apply_completion(notice);
        }
        handled
    }

    fn apply_completion(&mut self, notice: CompletionNotice) {
        let current = self.attachment.as_ref().map(|a| a.generation);
        if current != Some(notice.generation) {
            log::debug!(
                "ignoring completion for stale surface generation {}",
                notice.generation
            );
            return;
        }
        if !notice.result.releases_surface() {
            log::warn!(
                "frame producer completed generation {} with {:?}; surface kept",
                notice.generation,
                notice.result
            );
            return;
        }

        if let Some(attachment) = self.attachment.take() {
            attachment.surface.release();
        }
        if let Some(compositor) = self.compositor.take() {
            compositor.destroy(&mut self.backend);
        }
        self.detached = true;
        log::info!("frame producer detached (generation {})", notice.generation);
    }

    /// Per-tick render hook.
    ///
    /// Clears the target, then draws the latest frame if a producer is
    /// attached. Without one only the clear is issued.
    pub fn on_render_frame(&mut self) -> Result<FrameOutcome> {
        self.process_completions();
        self.render_request.take();
        self.backend.clear(self.options.frame_clear_color);

        let Some(attachment) = self.attachment.as_mut() else {
            return Ok(FrameOutcome::Cleared);
        };
        attachment.surface.update_tex_image()?;
        let transform = attachment.surface.transform_matrix();
        let resolution = attachment.resolution;

        if self.compositor.is_none() {
            if let Some(texture) = self.texture {
                let compositor =
                    FrameCompositor::new(&mut self.backend, texture, self.options.transform_mode)
                        .map_err(|e| PreviewError::RenderError(e.to_string()))?;
                self.compositor = Some(compositor);
            }
        }
        let Some(compositor) = &self.compositor else {
            return Ok(FrameOutcome::Cleared);
        };

        compositor.draw(&mut self.backend, &transform, Some(resolution));
        self.frames_drawn += 1;
        log::trace!("drew frame {}", self.frames_drawn);
        Ok(FrameOutcome::Drawn)
    }

    /// Surface-destroyed hook: releases the surface, compositor and texture.
    pub fn on_render_surface_destroyed(&mut self) {
        self.process_completions();
        if let Some(attachment) = self.attachment.take() {
            attachment.surface.release();
        }
        if let Some(compositor) = self.compositor.take() {
            compositor.destroy(&mut self.backend);
        }
        if let Some(texture) = self.texture.take() {
            self.backend.delete_texture(texture);
            log::info!("preview surface destroyed (texture {})", texture.get());
        }
        self.detached = false;
        self.viewport = None;
        self.ready.reset();
    }

    /// Consumes a pending render request. The host ticks when this is true.
    pub fn take_render_request(&self) -> bool {
        self.render_request.take()
    }

    /// Handle to the render-request mailbox.
    pub fn render_request(&self) -> RenderRequest {
        self.render_request.clone()
    }

    /// The external texture, present while a rendering surface is live.
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Resolution of the current attachment.
    pub fn resolution(&self) -> Option<Resolution> {
        self.attachment.as_ref().map(|a| a.resolution)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn has_compositor(&self) -> bool {
        self.compositor.is_some()
    }

    /// Number of frames drawn since construction.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn options(&self) -> &PreviewOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}

impl<B: GraphicsBackend, P: SurfacePlatform> std::fmt::Debug for SurfaceBridge<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceBridge")
            .field("state", &self.state())
            .field("texture", &self.texture)
            .field("resolution", &self.resolution())
            .field("frames_drawn", &self.frames_drawn)
            .finish_non_exhaustive()
    }
}
