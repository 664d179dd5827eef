//! Core JavaScript value types and error handling.
//!
//! This crate provides the value model shared by the runtime components:
//! script values, callable functions, and JavaScript errors with their stack
//! frames.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`Function`] - Thread-safe callable value
//! - [`JsError`] - JavaScript errors with stack traces
//! - [`ErrorKind`] - Types of JavaScript errors
//! - [`StackFrame`] - Call stack frame information
//!
//! # Examples
//!
//! ```
//! use core_types::{Value, JsError, ErrorKind};
//!
//! let num = Value::Smi(42);
//! assert_eq!(num.type_of(), "number");
//!
//! let error = JsError::new(ErrorKind::TypeError, "undefined is not a function");
//! assert_eq!(Value::from(error).to_string(), "TypeError: undefined is not a function");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod function;
mod value;

pub use error::{ErrorKind, JsError, StackFrame};
pub use function::Function;
pub use value::Value;
