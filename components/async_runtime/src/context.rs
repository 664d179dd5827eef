//! Per-run cancellation.
//!
//! A [`Context`] is handed to everything that does background work on behalf
//! of one script run. Cancelling it closes the `done` channel, so waiters can
//! include it in a `select!` next to their own channels.

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct ContextInner {
    cancelled: AtomicBool,
    // Never sent on; dropping it disconnects `done`.
    done_tx: Mutex<Option<Sender<()>>>,
    done_rx: Receiver<()>,
}

/// Cancellation handle shared between the host and background waiters.
///
/// Clones observe the same state.
///
/// ```
/// use async_runtime::Context;
///
/// let ctx = Context::new();
/// let observer = ctx.clone();
/// assert!(!observer.is_cancelled());
/// ctx.cancel();
/// assert!(observer.is_cancelled());
/// assert!(observer.done().recv().is_err());
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Creates a live context.
    pub fn new() -> Self {
        let (done_tx, done_rx) = channel::bounded(0);
        Self {
            inner: Arc::new(ContextInner {
                cancelled: AtomicBool::new(false),
                done_tx: Mutex::new(Some(done_tx)),
                done_rx,
            }),
        }
    }

    /// Cancels the context. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.done_tx.lock().take();
            tracing::debug!("context cancelled");
        }
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// A channel that becomes disconnected when the context is cancelled.
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done_rx
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
