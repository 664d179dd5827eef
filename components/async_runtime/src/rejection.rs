//! Unhandled promise rejection bookkeeping.
//!
//! The script engine reports rejections without a handler, and handlers
//! attached afterwards. Whatever is still pending when a drain cycle finishes
//! is reported by the loop as an uncaught rejection.

use crate::error::RuntimeError;
use crate::promise::PromiseId;
use core_types::Value;

/// What the engine is reporting about a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionOperation {
    /// The promise was rejected and has no handler.
    Reject,
    /// A handler was attached to a previously unhandled rejected promise.
    Handle,
}

/// Pending rejections in the order they were reported.
#[derive(Debug, Default)]
pub(crate) struct PendingRejections {
    entries: Vec<(PromiseId, Value)>,
}

impl PendingRejections {
    pub(crate) fn on_rejected(&mut self, promise: PromiseId, reason: Value) {
        if let Some(entry) = self.entries.iter_mut().find(|(id, _)| *id == promise) {
            entry.1 = reason;
        } else {
            self.entries.push((promise, reason));
        }
    }

    pub(crate) fn on_handled(&mut self, promise: PromiseId) {
        self.entries.retain(|(id, _)| *id != promise);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// The oldest pending rejection as an error. The entry stays pending.
    pub(crate) fn uncaught(&self) -> Option<RuntimeError> {
        self.entries
            .first()
            .map(|(promise, reason)| RuntimeError::UncaughtRejection {
                promise: *promise,
                reason: reason.stack().unwrap_or_else(|| reason.to_string()),
            })
    }
}
