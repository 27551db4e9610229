//! Frame handler registration and ordered fan-out
//!
//! Handlers subscribe to the gateway's lifetime, not the socket's, so the
//! registry lives outside the session loop and survives reconnects.

use super::Result;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

/// Callback invoked for every inbound channel frame
///
/// Handlers run sequentially in registration order; one frame finishes its
/// full fan-out before the next begins.
pub trait FrameHandler: Send {
    fn on_frame(&mut self, frame: &Value) -> Result<()>;
}

impl<F> FrameHandler for F
where
    F: FnMut(&Value) -> Result<()> + Send,
{
    fn on_frame(&mut self, frame: &Value) -> Result<()> {
        self(frame)
    }
}

/// Opaque token identifying a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Ordered handler list shared between the client and the feed task
pub(crate) struct HandlerRegistry {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(HandlerId, Box<dyn FrameHandler>)>>,
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn register(&self, handler: Box<dyn FrameHandler>) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().push((id, handler));
        id
    }

    /// Remove a handler, returning whether it was present
    pub(crate) fn unregister(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    /// Deliver one frame to every handler in registration order
    ///
    /// A failing handler is logged and skipped; it never blocks the rest of
    /// the chain or the read loop.
    pub(crate) fn dispatch(&self, frame: &Value) {
        let mut handlers = self.handlers.lock();
        for (id, handler) in handlers.iter_mut() {
            if let Err(e) = handler.on_frame(frame) {
                error!("Handler {:?} failed: {}", id, e);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.handlers.lock().len()
    }
}
