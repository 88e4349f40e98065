//! Render-request handoff between the frame producer and the render thread.
//!
//! A single coalescing flag: any number of requests made before the render
//! thread takes the flag collapse into one tick.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

type WakeHook = Box<dyn Fn() + Send + Sync>;

struct Shared {
    pending: AtomicBool,
    requests: AtomicU64,
    wake: Option<WakeHook>,
}

/// Cloneable handle to the one-slot render-request mailbox.
///
/// Producer side calls [`request`](Self::request); the render thread calls
/// [`take`](Self::take) once per tick.
#[derive(Clone)]
pub struct RenderRequest {
    shared: Arc<Shared>,
}

impl RenderRequest {
    /// Creates a mailbox without a wake hook. The host polls [`take`](Self::take).
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a mailbox that calls `wake` whenever a request transitions the
    /// flag from clear to set, e.g. to ask the windowing host for a redraw.
    pub fn with_wake_hook(wake: impl Fn() + Send + Sync + 'static) -> Self {
        Self::build(Some(Box::new(wake)))
    }

    fn build(wake: Option<WakeHook>) -> Self {
        Self {
            shared: Arc::new(Shared {
                pending: AtomicBool::new(false),
                requests: AtomicU64::new(0),
                wake,
            }),
        }
    }

    /// Requests a render. Safe to call from any thread.
    pub fn request(&self) {
        self.shared.requests.fetch_add(1, Ordering::Relaxed);
        let was_pending = self.shared.pending.swap(true, Ordering::AcqRel);
        if !was_pending {
            if let Some(wake) = &self.shared.wake {
                wake();
            }
        }
    }

    /// Consumes a pending request. Returns true if one was pending.
    pub fn take(&self) -> bool {
        self.shared.pending.swap(false, Ordering::AcqRel)
    }

    /// Returns whether a request is pending without consuming it.
    pub fn is_pending(&self) -> bool {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Total number of requests made, including coalesced ones.
    pub fn request_count(&self) -> u64 {
        self.shared.requests.load(Ordering::Relaxed)
    }
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RenderRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderRequest")
            .field("pending", &self.is_pending())
            .field("requests", &self.request_count())
            .field("has_wake_hook", &self.shared.wake.is_some())
            .finish()
    }
}
