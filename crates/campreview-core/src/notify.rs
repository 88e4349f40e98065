//! One-shot "preview ready" notification.

use std::sync::Mutex;

type Listener = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Inner {
    listener: Option<Listener>,
    fired: bool,
}

/// Single-fire notification with at-most-once delivery.
///
/// The listener runs exactly once: when [`fire`](Self::fire) is called after
/// it was registered, or immediately on registration if the notification
/// already fired. Later fires and registrations after delivery are no-ops
/// for the consumed listener.
#[derive(Default)]
pub struct ReadyNotification {
    inner: Mutex<Inner>,
}

impl ReadyNotification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the listener, replacing one that has not fired yet.
    pub fn subscribe(&self, listener: impl FnOnce() + Send + 'static) {
        let mut inner = self.lock();
        if !inner.fired {
            inner.listener = Some(Box::new(listener));
            return;
        }
        drop(inner);
        listener();
    }

    /// Marks the notification as fired and delivers to a pending listener.
    ///
    /// Returns true if a listener was invoked by this call.
    pub fn fire(&self) -> bool {
        let listener = {
            let mut inner = self.lock();
            inner.fired = true;
            inner.listener.take()
        };
        match listener {
            Some(listener) => {
                listener();
                true
            }
            None => false,
        }
    }

    /// Clears the fired state so the next registration waits for a new fire.
    pub fn reset(&self) {
        self.lock().fired = false;
    }

    /// Returns whether the notification has fired since the last reset.
    pub fn has_fired(&self) -> bool {
        self.lock().fired
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A listener never runs under the lock, so poisoning cannot leave
        // the state half-updated.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ReadyNotification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ReadyNotification")
            .field("fired", &inner.fired)
            .field("pending_listener", &inner.listener.is_some())
            .finish()
    }
}
