//! Runs one logical unit of script execution to quiescence.
//!
//! The sequence is the one every host needs: start the loop with the first
//! task, cancel the run's context once `start` returns, then drain whatever
//! background work is still registered so nothing is left delivering into a
//! loop that has moved on.

use crate::context::Context;
use crate::error::RuntimeError;
use crate::event_loop::EventLoop;
use crate::task_queue::Task;
use crate::timers::Timers;

/// Runner configuration.
///
/// # Examples
///
/// ```
/// use async_runtime::RunnerConfig;
///
/// let config = RunnerConfig::new().with_name("vu-7");
/// assert_eq!(config.name(), "vu-7");
/// assert!(config.waits_on_registered());
/// ```
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    name: String,
    wait_on_registered: bool,
}

impl RunnerConfig {
    /// Default configuration: named `main`, drains stragglers after each run.
    pub fn new() -> Self {
        Self {
            name: "main".to_string(),
            wait_on_registered: true,
        }
    }

    /// Sets the name recorded on the run's tracing span.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether the runner cancels the context and waits on outstanding
    /// registrations after each run. When disabled the caller must do both
    /// before running again.
    pub fn with_wait_on_registered(mut self, enabled: bool) -> Self {
        self.wait_on_registered = enabled;
        self
    }

    /// The configured name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether stragglers are drained after each run.
    pub fn waits_on_registered(&self) -> bool {
        self.wait_on_registered
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What the first task of a run gets to work with.
#[derive(Debug, Clone)]
pub struct Scope {
    /// The loop the run executes on
    pub event_loop: EventLoop,
    /// Timers bound to this run's context
    pub timers: Timers,
    /// The run's context
    pub context: Context,
}

/// Drives runs on a single, reused event loop.
#[derive(Debug)]
pub struct Runner {
    event_loop: EventLoop,
    config: RunnerConfig,
}

impl Runner {
    /// Creates a runner with its own event loop.
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            event_loop: EventLoop::new(),
            config,
        }
    }

    /// The loop shared by every run.
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// Runs `setup` as the first task and everything it schedules until the
    /// loop is quiescent or a task fails.
    ///
    /// `ctx` is the run's context. Unless disabled in the config it is
    /// cancelled when the loop stops, and the runner then waits for every
    /// outstanding registration before returning.
    pub fn run<F>(&self, ctx: &Context, setup: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(&Scope) -> Result<(), RuntimeError> + Send + 'static,
    {
        let span = tracing::debug_span!("run", name = %self.config.name);
        let _entered = span.enter();

        let scope = Scope {
            event_loop: self.event_loop.clone(),
            timers: Timers::new(&self.event_loop, ctx),
            context: ctx.clone(),
        };
        let first = scope.clone();
        let result = self.event_loop.start(Task::new(move || setup(&first)));

        if self.config.wait_on_registered {
            ctx.cancel();
            self.event_loop.wait_on_registered();
        }
        drop(scope);
        if let Err(err) = &result {
            tracing::debug!(error = %err, "run ended with error");
        }
        result
    }
}
