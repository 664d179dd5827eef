//! Errors surfaced by the event loop and the timer registry.

use crate::promise::PromiseId;
use core_types::JsError;
use thiserror::Error;

/// Message carried by the panic raised when a registration is fulfilled twice.
pub const DOUBLE_FULFILLMENT: &str = "registration callback fulfilled more than once";

/// Errors that end a drain of the event loop or reject a timer call.
///
/// A double fulfillment of a [`Callback`](crate::Callback) is not represented
/// here: it is a caller bug and panics with [`DOUBLE_FULFILLMENT`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A script callback threw.
    #[error("{0}")]
    Script(#[from] JsError),

    /// A promise was still rejected without a handler when a drain finished.
    #[error("Uncaught (in promise) {reason}")]
    UncaughtRejection {
        /// Identity of the rejected promise
        promise: PromiseId,
        /// The rejection's `stack` if present, otherwise its value
        reason: String,
    },

    /// `setTimeout`/`setInterval` was called with a non-callable first argument.
    #[error("{function}'s callback isn't a callable function")]
    InvalidCallback {
        /// Name of the scheduling function that was called
        function: &'static str,
        /// `typeof` of the value that was passed instead
        type_of: String,
    },

    /// The run's context was cancelled before the task could do its work.
    #[error("context canceled")]
    Interrupted,
}

impl RuntimeError {
    /// Converts the error into the exception a script binding throws.
    pub fn into_js_error(self) -> JsError {
        match self {
            RuntimeError::Script(e) => e,
            RuntimeError::InvalidCallback { .. } => JsError::type_error(self.to_string()),
            other => JsError::error(other.to_string()),
        }
    }
}
