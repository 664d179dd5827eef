//! `setTimeout`, `setInterval` and their `clear*` counterparts.
//!
//! Timers are built only on the loop's registration protocol. Each scheduled
//! firing holds one [`Callback`] so the loop stays alive while a timer is
//! pending. A single coordinator thread owns a min-heap ordered by
//! `(due, sequence)`, sleeps until the earliest due time, and on waking
//! fulfills the callbacks of every due entry in heap order. Timers with equal
//! due times therefore reach the loop in the order they were scheduled, no
//! matter how the OS wakes threads.
//!
//! A pending firing keeps its registry alive, so timers fire even after the
//! script dropped every [`Timers`] handle. The coordinator stops when the run's
//! [`Context`] is cancelled, or once the registry is unreachable.

use crate::context::Context;
use crate::error::RuntimeError;
use crate::event_loop::{Callback, EventLoop};
use crate::task_queue::Task;
use core_types::{Function, Value};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::atomic::{self, AtomicU64};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest delay honoured, in milliseconds (the largest positive 32-bit integer).
pub const MAX_DELAY_MS: f64 = 2_147_483_647.0;

/// Shortest spacing between two firings of one interval.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Identifier returned by `setTimeout`/`setInterval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl TimerId {
    /// Reads an id passed back from script. Anything that is not a positive
    /// integer cannot name a timer.
    pub fn from_value(value: &Value) -> Option<TimerId> {
        let n = value.to_number();
        if n.is_finite() && n >= 1.0 && n.fract() == 0.0 {
            Some(TimerId(n as u64))
        } else {
            None
        }
    }

    /// The id as a script number.
    pub fn to_value(self) -> Value {
        Value::from_number(self.0 as f64)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn delay_from_ms(delay_ms: f64) -> Duration {
    if delay_ms.is_nan() || delay_ms <= 0.0 {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(delay_ms.min(MAX_DELAY_MS) / 1000.0)
    }
}

struct TimerEntry {
    callback: Function,
    args: Vec<Value>,
    period: Option<Duration>,
    due: Instant,
}

/// One pending firing, as seen by the coordinator.
struct Scheduled {
    id: TimerId,
    due: Instant,
    sequence: u64,
    callback: Callback,
    timers: Timers,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.sequence == other.sequence
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the earliest due time, then the lowest sequence
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

enum Command {
    Schedule(Scheduled),
    Cancel(TimerId),
}

struct Coordinator {
    commands: Sender<Command>,
    thread: Option<JoinHandle<()>>,
}

struct TimersInner {
    event_loop: EventLoop,
    ctx: Context,
    next_id: AtomicU64,
    next_sequence: AtomicU64,
    active: Mutex<HashMap<TimerId, TimerEntry>>,
    coordinator: Mutex<Option<Coordinator>>,
}

/// Timer registry for one script run.
///
/// Create it on the loop thread with the run's [`Context`]; cancelling the
/// context stops all further firings.
///
/// # Examples
///
/// ```
/// use async_runtime::{Context, EventLoop, Task, Timers};
/// use core_types::{Function, Value};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let event_loop = EventLoop::new();
/// let timers = Timers::new(&event_loop, &Context::new());
/// let fired = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&fired);
/// event_loop
///     .start(Task::new(move || {
///         let callback = Function::new(move |_| {
///             flag.store(true, Ordering::SeqCst);
///             Ok(Value::Undefined)
///         });
///         timers.set_timeout(Value::Function(callback), 5.0, vec![])?;
///         Ok(())
///     }))
///     .unwrap();
/// assert!(fired.load(Ordering::SeqCst));
/// ```
#[derive(Clone)]
pub struct Timers {
    inner: Arc<TimersInner>,
}

impl Timers {
    /// Creates a registry whose callbacks run on `event_loop`.
    pub fn new(event_loop: &EventLoop, ctx: &Context) -> Self {
        Self {
            inner: Arc::new(TimersInner {
                event_loop: event_loop.clone(),
                ctx: ctx.clone(),
                next_id: AtomicU64::new(1),
                next_sequence: AtomicU64::new(0),
                active: Mutex::new(HashMap::new()),
                coordinator: Mutex::new(None),
            }),
        }
    }

    /// Runs `callback(args...)` once, no earlier than `delay_ms` from now.
    ///
    /// The callback never runs before the current task returns, even for a
    /// zero delay. Fails if `callback` is not a function.
    pub fn set_timeout(
        &self,
        callback: Value,
        delay_ms: f64,
        args: Vec<Value>,
    ) -> Result<TimerId, RuntimeError> {
        self.add("setTimeout", callback, delay_ms, args, false)
    }

    /// Runs `callback(args...)` every `delay_ms` until cleared.
    ///
    /// Firings are spaced from the previous due time, not from when the
    /// previous callback finished, and never less than a millisecond apart.
    /// The first firing honours `delay_ms` as given, zero included.
    pub fn set_interval(
        &self,
        callback: Value,
        delay_ms: f64,
        args: Vec<Value>,
    ) -> Result<TimerId, RuntimeError> {
        self.add("setInterval", callback, delay_ms, args, true)
    }

    /// Cancels a timeout. Unknown or already fired ids are ignored.
    pub fn clear_timeout(&self, id: TimerId) {
        self.clear(id);
    }

    /// Cancels an interval. Unknown or already cleared ids are ignored.
    pub fn clear_interval(&self, id: TimerId) {
        self.clear(id);
    }

    /// Number of timers that may still fire.
    pub fn active_count(&self) -> usize {
        self.inner.active.lock().len()
    }

    /// The four timer functions as script values, keyed by global name.
    pub fn globals(&self) -> Vec<(&'static str, Function)> {
        vec![
            ("setTimeout", self.set_binding("setTimeout", false)),
            ("clearTimeout", self.clear_binding("clearTimeout")),
            ("setInterval", self.set_binding("setInterval", true)),
            ("clearInterval", self.clear_binding("clearInterval")),
        ]
    }

    fn set_binding(&self, name: &'static str, repeat: bool) -> Function {
        let timers = self.clone();
        Function::named(name, move |args| {
            let mut args = args.into_iter();
            let callback = args.next().unwrap_or(Value::Undefined);
            let delay_ms = args.next().map_or(0.0, |delay| delay.to_number());
            timers
                .add(name, callback, delay_ms, args.collect(), repeat)
                .map(TimerId::to_value)
                .map_err(RuntimeError::into_js_error)
        })
    }

    fn clear_binding(&self, name: &'static str) -> Function {
        let timers = self.clone();
        Function::named(name, move |args| {
            if let Some(id) = args.first().and_then(TimerId::from_value) {
                timers.clear(id);
            }
            Ok(Value::Undefined)
        })
    }

    fn add(
        &self,
        function: &'static str,
        callback: Value,
        delay_ms: f64,
        args: Vec<Value>,
        repeat: bool,
    ) -> Result<TimerId, RuntimeError> {
        let callback = match callback {
            Value::Function(callback) => callback,
            other => {
                return Err(RuntimeError::InvalidCallback {
                    function,
                    type_of: other.type_of(),
                })
            }
        };

        let delay = delay_from_ms(delay_ms);
        let id = TimerId(self.inner.next_id.fetch_add(1, atomic::Ordering::Relaxed));
        let due = Instant::now() + delay;
        self.inner.active.lock().insert(
            id,
            TimerEntry {
                callback,
                args,
                period: repeat.then_some(delay.max(MIN_INTERVAL)),
                due,
            },
        );
        self.schedule(id, due);
        Ok(id)
    }

    fn schedule(&self, id: TimerId, due: Instant) {
        if self.inner.ctx.is_cancelled() {
            self.inner.active.lock().remove(&id);
            return;
        }

        let sequence = self.inner.next_sequence.fetch_add(1, atomic::Ordering::Relaxed);
        tracing::trace!(id = id.0, sequence, "timer scheduled");
        let scheduled = Scheduled {
            id,
            due,
            sequence,
            callback: self.inner.event_loop.register_callback(),
            timers: self.clone(),
        };
        if self.commands().send(Command::Schedule(scheduled)).is_err() {
            // The coordinator has stopped; the dropped command released its callback.
            self.inner.active.lock().remove(&id);
        }
    }

    fn clear(&self, id: TimerId) {
        if self.inner.active.lock().remove(&id).is_none() {
            return;
        }
        tracing::trace!(id = id.0, "timer cleared");
        if let Some(coordinator) = self.inner.coordinator.lock().as_ref() {
            let _ = coordinator.commands.send(Command::Cancel(id));
        }
    }

    /// Runs on the loop thread when the coordinator found `id` due.
    fn fire(&self, id: TimerId) -> Result<(), RuntimeError> {
        let (callback, args, repeating) = {
            let mut active = self.inner.active.lock();
            if self.inner.ctx.is_cancelled() {
                active.remove(&id);
                return Err(RuntimeError::Interrupted);
            }
            let (callback, args, repeating) = match active.get(&id) {
                Some(entry) => (entry.callback.clone(), entry.args.clone(), entry.period.is_some()),
                None => return Ok(()),
            };
            if !repeating {
                active.remove(&id);
            }
            (callback, args, repeating)
        };

        if let Err(err) = callback.call(args) {
            self.inner.active.lock().remove(&id);
            return Err(err.into());
        }

        if repeating {
            let next_due = self.inner.active.lock().get_mut(&id).and_then(|entry| {
                let period = entry.period?;
                entry.due += period;
                Some(entry.due)
            });
            if let Some(due) = next_due {
                self.schedule(id, due);
            }
        }
        Ok(())
    }

    fn commands(&self) -> Sender<Command> {
        let mut slot = self.inner.coordinator.lock();
        if let Some(coordinator) = slot.as_ref() {
            return coordinator.commands.clone();
        }

        let (commands, receiver) = channel::unbounded();
        let ctx = self.inner.ctx.clone();
        let registry = Arc::downgrade(&self.inner);
        let thread = thread::Builder::new()
            .name("timer-coordinator".into())
            .spawn(move || coordinate(receiver, ctx, registry))
            .map_err(|err| tracing::warn!(error = %err, "failed to spawn timer coordinator"))
            .ok();
        *slot = Some(Coordinator {
            commands: commands.clone(),
            thread,
        });
        commands
    }
}

impl fmt::Debug for Timers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timers")
            .field("active", &self.active_count())
            .finish()
    }
}

/// Coordinator thread body.
///
/// Pending firings in the heap hold the registry, and the registry holds the
/// command sender, so the channel disconnects only once nothing can schedule
/// or fire a timer any more.
fn coordinate(commands: Receiver<Command>, ctx: Context, registry: Weak<TimersInner>) {
    let mut heap: BinaryHeap<Scheduled> = BinaryHeap::new();
    loop {
        let alarm = match heap.peek() {
            Some(next) => channel::at(next.due),
            None => channel::never(),
        };
        crossbeam::select! {
            recv(commands) -> command => match command {
                Ok(Command::Schedule(scheduled)) => heap.push(scheduled),
                Ok(Command::Cancel(id)) => heap.retain(|scheduled| scheduled.id != id),
                Err(_) => break,
            },
            recv(ctx.done()) -> _ => break,
            recv(alarm) -> _ => dispatch_due(&mut heap),
        }
    }

    // Dropping the heap releases every outstanding callback.
    let pending = heap.len();
    drop(heap);
    // Entries that will never fire can hold callbacks that capture the registry.
    let mut stale = HashMap::new();
    if let Some(inner) = registry.upgrade() {
        std::mem::swap(&mut stale, &mut *inner.active.lock());
    }
    tracing::debug!(pending, stale = stale.len(), "timer coordinator stopped");
}

fn dispatch_due(heap: &mut BinaryHeap<Scheduled>) {
    let now = Instant::now();
    while heap.peek().is_some_and(|next| next.due <= now) {
        let Some(Scheduled {
            id,
            sequence,
            callback,
            timers,
            ..
        }) = heap.pop()
        else {
            break;
        };
        tracing::trace!(id = id.0, sequence, "timer due");
        callback.fulfill(Task::new(move || timers.fire(id)));
    }
}
