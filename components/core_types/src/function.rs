//! Callable values.
//!
//! A [`Function`] is the script-visible callable used for timer callbacks,
//! promise reactions and native bindings. It is reference counted and
//! thread-safe so it can travel inside tasks handed between threads, although
//! it is only ever invoked on the thread running the event loop.

use crate::{JsError, Value};
use std::fmt;
use std::sync::Arc;

type Callback = dyn Fn(Vec<Value>) -> Result<Value, JsError> + Send + Sync;

/// A callable JavaScript function.
///
/// # Examples
///
/// ```
/// use core_types::{Function, Value};
///
/// let add = Function::named("add", |args| match (&args[0], &args[1]) {
///     (Value::Smi(a), Value::Smi(b)) => Ok(Value::Smi(a + b)),
///     _ => Ok(Value::Undefined),
/// });
/// assert_eq!(add.call(vec![Value::Smi(1), Value::Smi(2)]).unwrap(), Value::Smi(3));
/// assert_eq!(add.name(), "add");
/// ```
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    callback: Arc<Callback>,
}

impl Function {
    /// Creates an anonymous function from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, JsError> + Send + Sync + 'static,
    {
        Self::named("", f)
    }

    /// Creates a named function from a closure.
    pub fn named<F>(name: &str, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, JsError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            callback: Arc::new(f),
        }
    }

    /// Calls the function with the given arguments.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, JsError> {
        (self.callback)(args)
    }

    /// The function's `name` property; empty for anonymous functions.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity comparison, matching `===` on function objects.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{ name: {:?} }}", self.name())
    }
}
