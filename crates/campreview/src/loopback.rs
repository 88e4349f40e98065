//! In-process surface platform.
//!
//! Frames never touch a real image queue: the producer publishes a
//! transform and the surface latches it. Used for headless runs, demos and
//! tests of the bridge.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use campreview_core::{
    CoordinateTransform, PreviewError, RenderRequest, Resolution, Result, TextureHandle,
};

use crate::surface::{FrameSurface, SurfacePlatform};

/// A frame as seen by the loopback surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopbackFrame {
    /// 1-based publish order within one surface.
    pub sequence: u64,
    pub transform: CoordinateTransform,
}

/// Counters for one loopback surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopbackStats {
    pub published: u64,
    pub latched: u64,
    /// Frames overwritten before the render thread latched them.
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<LoopbackFrame>,
    latched: Option<LoopbackFrame>,
    released: bool,
    stats: LoopbackStats,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Producer endpoint of a loopback surface.
#[derive(Debug, Clone)]
pub struct LoopbackProducer {
    slot: Arc<Mutex<Slot>>,
    frame_available: RenderRequest,
    texture: TextureHandle,
    resolution: Resolution,
}

impl LoopbackProducer {
    /// Publishes a frame and signals frame-available.
    ///
    /// Only the newest unlatched frame is kept. Returns the frame's sequence
    /// number, or [`PreviewError::SurfaceReleased`] once the surface is gone.
    pub fn publish_frame(&self, transform: CoordinateTransform) -> Result<u64> {
        let sequence = {
            let mut slot = lock(&self.slot);
            if slot.released {
                return Err(PreviewError::SurfaceReleased);
            }
            slot.stats.published += 1;
            let sequence = slot.stats.published;
            if slot
                .pending
                .replace(LoopbackFrame {
                    sequence,
                    transform,
                })
                .is_some()
            {
                slot.stats.dropped += 1;
            }
            sequence
        };
        self.frame_available.request();
        Ok(sequence)
    }

    pub fn is_released(&self) -> bool {
        lock(&self.slot).released
    }

    pub fn stats(&self) -> LoopbackStats {
        lock(&self.slot).stats
    }

    /// Texture backing the surface.
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
}

/// Consumer side of a loopback surface.
#[derive(Debug)]
pub struct LoopbackSurface {
    slot: Arc<Mutex<Slot>>,
}

impl LoopbackSurface {
    /// The frame latched by the last `update_tex_image`.
    pub fn latched_frame(&self) -> Option<LoopbackFrame> {
        lock(&self.slot).latched
    }
}

impl FrameSurface for LoopbackSurface {
    fn update_tex_image(&mut self) -> Result<()> {
        let mut slot = lock(&self.slot);
        if let Some(frame) = slot.pending.take() {
            slot.latched = Some(frame);
            slot.stats.latched += 1;
        }
        Ok(())
    }

    fn transform_matrix(&self) -> CoordinateTransform {
        lock(&self.slot)
            .latched
            .map(|frame| frame.transform)
            .unwrap_or_default()
    }

    fn release(self) {
        let mut slot = lock(&self.slot);
        slot.released = true;
        slot.pending = None;
    }
}

/// [`SurfacePlatform`] whose surfaces live entirely in memory.
#[derive(Debug, Default)]
pub struct LoopbackPlatform {
    surfaces_created: u64,
}

impl LoopbackPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surfaces_created(&self) -> u64 {
        self.surfaces_created
    }
}

impl SurfacePlatform for LoopbackPlatform {
    type Surface = LoopbackSurface;
    type Endpoint = LoopbackProducer;

    fn create_surface(
        &mut self,
        texture: TextureHandle,
        resolution: Resolution,
        frame_available: RenderRequest,
    ) -> Result<(Self::Surface, Self::Endpoint)> {
        if resolution.is_empty() {
            return Err(PreviewError::PlatformError(format!(
                "cannot size a surface to {resolution}"
            )));
        }
        let slot = Arc::new(Mutex::new(Slot::default()));
        self.surfaces_created += 1;
        Ok((
            LoopbackSurface {
                slot: Arc::clone(&slot),
            },
            LoopbackProducer {
                slot,
                frame_available,
                texture,
                resolution,
            },
        ))
    }
}
