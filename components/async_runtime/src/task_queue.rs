//! Tasks and the serial task queue.
//!
//! A [`Task`] is the unit of work the event loop runs on its thread. A
//! [`TaskQueue`] lets a background producer (a socket reader, a stream) hand
//! over any number of tasks through a single long-lived registration, keeping
//! them in the order they were queued.

use crate::error::RuntimeError;
use crate::event_loop::{Callback, EventLoop};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A task to be executed by the event loop.
///
/// Tasks represent work to be done on the loop thread: timer callbacks, I/O
/// completions, promise reactions. A task runs exactly once.
pub struct Task {
    callback: Box<dyn FnOnce() -> Result<(), RuntimeError> + Send>,
}

impl Task {
    /// Creates a new Task from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), RuntimeError> + Send + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task.
    pub fn run(self) -> Result<(), RuntimeError> {
        (self.callback)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

#[derive(Default)]
struct SerialState {
    tasks: VecDeque<Task>,
    // Present while no drain is scheduled on the loop.
    callback: Option<Callback>,
    closed: bool,
}

/// Ordered hand-off from background threads to the event loop.
///
/// Creating the queue registers with the loop, which keeps the loop alive
/// until [`close`](Self::close) is called. Tasks queued from any thread run on
/// the loop thread in queue order.
///
/// ```
/// use async_runtime::{EventLoop, Task, TaskQueue};
/// use std::thread;
///
/// let event_loop = EventLoop::new();
/// let el = event_loop.clone();
/// event_loop
///     .start(Task::new(move || {
///         let tq = TaskQueue::new(&el);
///         thread::spawn(move || {
///             tq.queue(Task::new(|| Ok(())));
///             tq.close();
///         });
///         Ok(())
///     }))
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct TaskQueue {
    state: Arc<Mutex<SerialState>>,
    event_loop: EventLoop,
}

impl TaskQueue {
    /// Creates a queue bound to `event_loop`.
    ///
    /// Must be called from the loop thread, like any registration.
    pub fn new(event_loop: &EventLoop) -> Self {
        let state = SerialState {
            callback: Some(event_loop.register_callback()),
            ..SerialState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            event_loop: event_loop.clone(),
        }
    }

    /// Queues a task. Safe to call from any thread.
    ///
    /// Tasks queued after [`close`](Self::close) are dropped.
    pub fn queue(&self, task: Task) {
        let mut state = self.state.lock();
        if state.closed {
            tracing::trace!("task queued after close; dropping");
            return;
        }
        state.tasks.push_back(task);
        if let Some(callback) = state.callback.take() {
            callback.fulfill(drain(Arc::clone(&self.state), self.event_loop.clone()));
        }
    }

    /// Stops accepting tasks and releases the registration.
    ///
    /// Tasks already handed to the loop still run.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.callback.take();
    }
}

fn drain(state: Arc<Mutex<SerialState>>, event_loop: EventLoop) -> Task {
    Task::new(move || {
        let mut tasks = {
            let mut guard = state.lock();
            if !guard.closed {
                guard.callback = Some(event_loop.register_callback());
            }
            std::mem::take(&mut guard.tasks)
        };
        while let Some(task) = tasks.pop_front() {
            if let Err(err) = task.run() {
                let mut guard = state.lock();
                tasks.append(&mut guard.tasks);
                guard.tasks = tasks;
                // Tasks accepted before a close still run on a later drain.
                if !guard.tasks.is_empty() {
                    let next = drain(Arc::clone(&state), event_loop.clone());
                    match guard.callback.take() {
                        Some(callback) => callback.fulfill(next),
                        None => event_loop.enqueue_task(next),
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    })
}
