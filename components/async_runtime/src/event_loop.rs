//! Event loop implementation.
//!
//! The loop runs every script-visible callback on one thread, one at a time.
//! Background threads never touch script state: they obtain a [`Callback`]
//! from [`EventLoop::register_callback`] while still on the loop thread, and
//! later fulfill it with a [`Task`] that the loop runs on their behalf.
//!
//! Each iteration (drain cycle) of [`EventLoop::start`]:
//! 1. Takes everything currently queued
//! 2. Returns if nothing is queued and no registration is outstanding
//! 3. Waits for a delivery if nothing is queued but registrations are outstanding
//! 4. Runs the taken tasks in order, stopping at the first failure
//! 5. Reports the oldest unhandled promise rejection, if any

use crate::callback_queue::CallbackQueue;
use crate::error::{RuntimeError, DOUBLE_FULFILLMENT};
use crate::promise::Promise;
use crate::rejection::{PendingRejections, RejectionOperation};
use crate::task_queue::Task;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Registration {
    queue: Arc<CallbackQueue>,
    fulfilled: AtomicBool,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if !*self.fulfilled.get_mut() {
            tracing::trace!("registration dropped without a task");
            self.queue.release();
        }
    }
}

/// Single-use token returned by [`EventLoop::register_callback`].
///
/// While the token is outstanding the loop will not finish. Fulfilling it hands
/// a task to the loop; dropping it unfulfilled gives the registration up.
pub struct Callback {
    registration: Registration,
}

impl Callback {
    /// Queues `task` on the loop. Safe to call from any thread.
    ///
    /// # Panics
    ///
    /// Panics if the callback was already fulfilled.
    pub fn fulfill(&self, task: Task) {
        if self.registration.fulfilled.swap(true, Ordering::SeqCst) {
            panic!("{}", DOUBLE_FULFILLMENT);
        }
        self.registration.queue.deliver(task);
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("fulfilled", &self.registration.fulfilled.load(Ordering::SeqCst))
            .finish()
    }
}

struct LoopInner {
    queue: Arc<CallbackQueue>,
    rejections: Mutex<PendingRejections>,
}

/// The event loop of one script runtime.
///
/// `EventLoop` is a cheap handle; clones share the same queue, so tasks can
/// capture a clone to register further callbacks.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Task};
/// use std::thread;
///
/// let event_loop = EventLoop::new();
/// let el = event_loop.clone();
///
/// event_loop
///     .start(Task::new(move || {
///         let callback = el.register_callback();
///         thread::spawn(move || callback.fulfill(Task::new(|| Ok(()))));
///         Ok(())
///     }))
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct EventLoop {
    inner: Arc<LoopInner>,
}

impl EventLoop {
    /// Creates a new EventLoop with an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LoopInner {
                queue: Arc::new(CallbackQueue::new()),
                rejections: Mutex::new(PendingRejections::default()),
            }),
        }
    }

    /// Registers interest in delivering one task later.
    ///
    /// Call this on the loop thread, from inside a running task (or before the
    /// loop starts). The returned callback may be fulfilled from any thread.
    pub fn register_callback(&self) -> Callback {
        self.inner.queue.register();
        Callback {
            registration: Registration {
                queue: Arc::clone(&self.inner.queue),
                fulfilled: AtomicBool::new(false),
            },
        }
    }

    /// Queues a task from the loop thread, behind everything already queued.
    pub fn enqueue_task(&self, task: Task) {
        self.register_callback().fulfill(task);
    }

    /// Runs `first` and everything it causes until the loop is quiescent.
    ///
    /// Returns the first task error, or an uncaught rejection left at the end
    /// of a drain cycle. On a task error, the tasks that were due after it stay
    /// queued and run first on the next call. Call
    /// [`wait_on_registered`](Self::wait_on_registered) before starting again.
    pub fn start(&self, first: Task) -> Result<(), RuntimeError> {
        self.inner.rejections.lock().clear();
        self.inner.queue.push(first);
        tracing::debug!("event loop started");

        loop {
            let (mut tasks, awaiting) = self.inner.queue.take();
            if tasks.is_empty() {
                if awaiting == 0 {
                    tracing::debug!("event loop finished");
                    return Ok(());
                }
                self.inner.queue.wait();
                continue;
            }

            tracing::trace!(tasks = tasks.len(), awaiting, "draining queue");
            while let Some(task) = tasks.pop_front() {
                if let Err(err) = task.run() {
                    tracing::debug!(remaining = tasks.len(), error = %err, "task failed");
                    self.inner.queue.requeue_front(tasks);
                    return Err(err);
                }
            }

            if let Some(err) = self.inner.rejections.lock().uncaught() {
                tracing::debug!(error = %err, "unhandled promise rejection");
                return Err(err);
            }
        }
    }

    /// Waits for every outstanding registration to deliver or be released.
    ///
    /// Tasks delivered meanwhile are run and their errors are logged and
    /// dropped. Tasks left queued by a failed [`start`](Self::start) are kept
    /// for the next run.
    pub fn wait_on_registered(&self) {
        let (preserved, _) = self.inner.queue.take();

        loop {
            let (tasks, awaiting) = self.inner.queue.take();
            if tasks.is_empty() {
                if awaiting == 0 {
                    break;
                }
                self.inner.queue.wait();
                continue;
            }
            for task in tasks {
                if let Err(err) = task.run() {
                    tracing::warn!(error = %err, "ignoring error from a callback delivered after the run ended");
                }
            }
        }

        self.inner.queue.requeue_front(preserved);
    }

    /// Promise rejection tracking hook for the script engine.
    ///
    /// The engine reports `Reject` when a promise is rejected with no handler
    /// attached and `Handle` when a handler is attached to such a promise.
    pub fn track_promise_rejection(&self, promise: &Promise, operation: RejectionOperation) {
        let mut rejections = self.inner.rejections.lock();
        match operation {
            RejectionOperation::Reject => {
                rejections.on_rejected(promise.id(), promise.reason());
            }
            RejectionOperation::Handle => rejections.on_handled(promise.id()),
        }
    }

    /// Number of registrations not yet fulfilled or released.
    pub fn pending_registrations(&self) -> usize {
        self.inner.queue.awaiting()
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("pending_registrations", &self.pending_registrations())
            .finish()
    }
}
