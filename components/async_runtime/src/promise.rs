//! Promise implementation following Promise/A+ semantics.
//!
//! Reactions run as loop tasks, and the promise reports to the loop's
//! rejection tracker exactly when an engine would: when it is rejected with no
//! handler attached, and when the first handler is attached to such a promise.
//! Promises are created, settled and chained on the loop thread.

use crate::event_loop::EventLoop;
use crate::rejection::RejectionOperation;
use crate::task_queue::Task;
use core_types::{Function, Value};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_PROMISE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a promise, stable for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromiseId(pub u64);

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Promise#{}", self.0)
    }
}

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been resolved with a value.
    Fulfilled,
    /// The promise has been rejected with a reason.
    Rejected,
}

/// A reaction to be triggered when a Promise settles.
///
/// This represents the handlers registered via `.then()`.
struct PromiseReaction {
    derived: Promise,
    on_fulfilled: Option<Function>,
    on_rejected: Option<Function>,
}

impl PromiseReaction {
    fn run(self, state: PromiseState, value: Value) {
        let handler = match state {
            PromiseState::Fulfilled => self.on_fulfilled,
            PromiseState::Rejected => self.on_rejected,
            PromiseState::Pending => return,
        };
        match handler {
            Some(handler) => match handler.call(vec![value]) {
                Ok(result) => self.derived.resolve(result),
                Err(error) => self.derived.reject(Value::from(error)),
            },
            None if state == PromiseState::Fulfilled => self.derived.resolve(value),
            None => self.derived.reject(value),
        }
    }
}

struct PromiseInner {
    state: PromiseState,
    result: Option<Value>,
    reactions: Vec<PromiseReaction>,
    handled: bool,
}

/// A JavaScript Promise.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Promise, PromiseState, Task};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// let el = event_loop.clone();
/// event_loop
///     .start(Task::new(move || {
///         let promise = Promise::new(&el);
///         promise.resolve(Value::Smi(42));
///         assert_eq!(promise.state(), PromiseState::Fulfilled);
///         Ok(())
///     }))
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct Promise {
    id: PromiseId,
    inner: Arc<Mutex<PromiseInner>>,
    event_loop: EventLoop,
}

impl Promise {
    /// Creates a new pending Promise whose reactions run on `event_loop`.
    pub fn new(event_loop: &EventLoop) -> Self {
        Self {
            id: PromiseId(NEXT_PROMISE_ID.fetch_add(1, Ordering::Relaxed)),
            inner: Arc::new(Mutex::new(PromiseInner {
                state: PromiseState::Pending,
                result: None,
                reactions: Vec::new(),
                handled: false,
            })),
            event_loop: event_loop.clone(),
        }
    }

    /// The promise's identity.
    pub fn id(&self) -> PromiseId {
        self.id
    }

    /// The current state.
    pub fn state(&self) -> PromiseState {
        self.inner.lock().state
    }

    /// The fulfillment value or rejection reason, once settled.
    pub fn result(&self) -> Option<Value> {
        self.inner.lock().result.clone()
    }

    /// The rejection reason, or `undefined` if the promise is not rejected.
    pub fn reason(&self) -> Value {
        let inner = self.inner.lock();
        match (inner.state, &inner.result) {
            (PromiseState::Rejected, Some(reason)) => reason.clone(),
            _ => Value::Undefined,
        }
    }

    /// Resolves the Promise with a value. No-op once settled.
    pub fn resolve(&self, value: Value) {
        self.settle(PromiseState::Fulfilled, value);
    }

    /// Rejects the Promise with a reason. No-op once settled.
    pub fn reject(&self, reason: Value) {
        self.settle(PromiseState::Rejected, reason);
    }

    /// Adds handlers for fulfillment and/or rejection.
    ///
    /// Returns a new Promise that will be resolved based on the handlers' results.
    pub fn then(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Promise {
        let derived = Promise::new(&self.event_loop);
        let reaction = PromiseReaction {
            derived: derived.clone(),
            on_fulfilled,
            on_rejected,
        };

        let (settled, newly_handled) = {
            let mut inner = self.inner.lock();
            let newly_handled = inner.state == PromiseState::Rejected && !inner.handled;
            inner.handled = true;
            match inner.state {
                PromiseState::Pending => {
                    inner.reactions.push(reaction);
                    (None, newly_handled)
                }
                state => {
                    let value = inner.result.clone().unwrap_or(Value::Undefined);
                    (Some((reaction, state, value)), newly_handled)
                }
            }
        };

        if newly_handled {
            self.event_loop
                .track_promise_rejection(self, RejectionOperation::Handle);
        }
        if let Some((reaction, state, value)) = settled {
            self.schedule(reaction, state, value);
        }
        derived
    }

    /// Shorthand for `then(None, Some(on_rejected))`.
    pub fn catch(&self, on_rejected: Function) -> Promise {
        self.then(None, Some(on_rejected))
    }

    fn settle(&self, state: PromiseState, value: Value) {
        let (reactions, unhandled) = {
            let mut inner = self.inner.lock();
            if inner.state != PromiseState::Pending {
                return;
            }
            inner.state = state;
            inner.result = Some(value.clone());
            (
                std::mem::take(&mut inner.reactions),
                state == PromiseState::Rejected && !inner.handled,
            )
        };

        if unhandled {
            self.event_loop
                .track_promise_rejection(self, RejectionOperation::Reject);
        }
        for reaction in reactions {
            self.schedule(reaction, state, value.clone());
        }
    }

    fn schedule(&self, reaction: PromiseReaction, state: PromiseState, value: Value) {
        self.event_loop.enqueue_task(Task::new(move || {
            reaction.run(state, value);
            Ok(())
        }));
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
