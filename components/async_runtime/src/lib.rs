//! Async runtime for JavaScript execution.
//!
//! This crate provides the pieces that let a single-threaded script runtime
//! live inside a multi-threaded host:
//! - Event loop that runs every script-visible task on one thread
//! - Registration protocol for handing work back from background threads
//! - Timers (`setTimeout`/`setInterval`) with deterministic firing order
//! - Unhandled promise rejection tracking
//!
//! # Overview
//!
//! - [`EventLoop`] - Main event loop coordinating task execution
//! - [`Callback`] - Single-use token for delivering a task from any thread
//! - [`Timers`] - Timer registry bound to a run's [`Context`]
//! - [`Promise`] - Promise/A+ promise wired to the rejection tracker
//! - [`TaskQueue`] - Ordered hand-off for background producers
//! - [`Runner`] - Runs one unit of script execution to quiescence
//!
//! # Examples
//!
//! ## Event Loop Usage
//!
//! ```
//! use async_runtime::{EventLoop, Task};
//!
//! let event_loop = EventLoop::new();
//! event_loop.start(Task::new(|| Ok(()))).unwrap();
//! ```
//!
//! ## Timer Usage
//!
//! ```
//! use async_runtime::{Context, Runner, RunnerConfig};
//! use core_types::{Function, Value};
//! use std::sync::{Arc, Mutex};
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let seen = Arc::clone(&log);
//! let runner = Runner::new(RunnerConfig::new());
//! runner
//!     .run(&Context::new(), move |scope| {
//!         let seen2 = Arc::clone(&seen);
//!         let callback = Function::new(move |_| {
//!             seen2.lock().unwrap().push("timer");
//!             Ok(Value::Undefined)
//!         });
//!         scope.timers.set_timeout(Value::Function(callback), 0.0, vec![])?;
//!         seen.lock().unwrap().push("sync");
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(*log.lock().unwrap(), vec!["sync", "timer"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod callback_queue;
pub mod context;
pub mod error;
pub mod event_loop;
pub mod promise;
pub mod rejection;
pub mod runner;
pub mod task_queue;
pub mod timers;

// Re-export main types at crate root
pub use context::Context;
pub use error::{RuntimeError, DOUBLE_FULFILLMENT};
pub use event_loop::{Callback, EventLoop};
pub use promise::{Promise, PromiseId, PromiseState};
pub use rejection::RejectionOperation;
pub use runner::{Runner, RunnerConfig, Scope};
pub use task_queue::{Task, TaskQueue};
pub use timers::{TimerId, Timers, MAX_DELAY_MS};
