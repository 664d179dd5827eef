//! JavaScript error types and error handling.
//!
//! This module provides error types that correspond to JavaScript's built-in
//! error types, along with the frames that make up their `stack`.

use std::fmt;

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Plain `Error`, as thrown by `throw new Error(...)`
    Error,
    /// Syntax error in JavaScript code
    SyntaxError,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an undefined variable
    ReferenceError,
    /// Value out of allowed range
    RangeError,
    /// Error in eval() function
    EvalError,
    /// Error in URI handling functions
    URIError,
    /// Internal engine error
    InternalError,
}

impl ErrorKind {
    /// Returns the constructor name of this error kind.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::URIError => "URIError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One frame of a script call stack, innermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Function name; `None` renders as `<anonymous>`
    pub function_name: Option<String>,
    /// Script URL; `None` renders as `<unknown>`
    pub source_url: Option<String>,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.function_name.as_deref().unwrap_or("<anonymous>");
        let url = self.source_url.as_deref().unwrap_or("<unknown>");
        write!(f, "{} ({}:{}:{})", name, url, self.line, self.column)
    }
}

/// A JavaScript error with message and stack trace.
///
/// This struct represents a JavaScript exception that can be thrown and caught.
/// It includes the error type, message and stack trace.
///
/// # Examples
///
/// ```
/// use core_types::{JsError, ErrorKind};
///
/// let error = JsError {
///     kind: ErrorKind::TypeError,
///     message: "undefined is not a function".to_string(),
///     stack: vec![],
/// };
///
/// assert_eq!(error.to_string(), "TypeError: undefined is not a function");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Stack trace (call stack at the time of the error)
    pub stack: Vec<StackFrame>,
}

impl JsError {
    /// Creates an error of the given kind with no stack information.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
        }
    }

    /// Shorthand for a plain `Error`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Error, message)
    }

    /// Shorthand for a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Appends a frame to the stack trace.
    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        self.stack.push(frame);
        self
    }

    /// Renders the `stack` property the way engines expose it to scripts.
    ///
    /// Returns `None` when no frames were captured.
    ///
    /// ```
    /// use core_types::{JsError, StackFrame};
    ///
    /// let err = JsError::error("boom").with_frame(StackFrame {
    ///     function_name: Some("run".to_string()),
    ///     source_url: Some("file:///main.js".to_string()),
    ///     line: 3,
    ///     column: 7,
    /// });
    /// assert_eq!(
    ///     err.stack_trace().unwrap(),
    ///     "Error: boom\n\tat run (file:///main.js:3:7)"
    /// );
    /// ```
    pub fn stack_trace(&self) -> Option<String> {
        if self.stack.is_empty() {
            return None;
        }
        let mut out = self.to_string();
        for frame in &self.stack {
            out.push_str("\n\tat ");
            out.push_str(&frame.to_string());
        }
        Some(out)
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for JsError {}
