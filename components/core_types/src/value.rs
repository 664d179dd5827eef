//! JavaScript value representation.
//!
//! This module provides the core `Value` enum that represents the JavaScript
//! values crossing the event loop boundary: callback arguments, timer ids,
//! promise results and rejection reasons.

use crate::{Function, JsError};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::fmt;

/// Represents any JavaScript value.
///
/// Primitive values are stored inline, while plain objects are referenced by
/// heap ID. Every variant is `Send + Sync` so values can be captured by tasks
/// that are built on background threads.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
///
/// assert_eq!(undefined.type_of(), "undefined");
/// assert_eq!(number.to_number(), 42.0);
/// assert_eq!(number.type_of(), "number");
/// ```
#[derive(Clone)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer (fits in 32 bits)
    Smi(i32),
    /// Heap-allocated object (referenced by ID)
    HeapObject(usize),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// JavaScript string value
    String(std::string::String),
    /// Callable function object
    Function(Function),
    /// Error object, as produced by `throw new TypeError(...)`
    Error(Box<JsError>),
    /// JavaScript BigInt (arbitrary precision integer)
    BigInt(BigInt),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::HeapObject(id) => f.debug_tuple("HeapObject").field(id).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Function(func) => f.debug_tuple("Function").field(&func.name()).finish(),
            Value::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Value::BigInt(n) => f.debug_tuple("BigInt").field(n).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::HeapObject(a), Value::HeapObject(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            _ => false,
        }
    }
}

impl From<JsError> for Value {
    fn from(error: JsError) -> Self {
        Value::Error(Box::new(error))
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl Value {
    /// Returns the JavaScript typeof result for this value.
    ///
    /// ```
    /// use core_types::{Function, Value};
    ///
    /// assert_eq!(Value::Undefined.type_of(), "undefined");
    /// assert_eq!(Value::Null.type_of(), "object");
    /// assert_eq!(Value::Function(Function::new(|_| Ok(Value::Undefined))).type_of(), "function");
    /// ```
    pub fn type_of(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "object".to_string(), // JavaScript quirk
            Value::Boolean(_) => "boolean".to_string(),
            Value::Smi(_) => "number".to_string(),
            Value::Double(_) => "number".to_string(),
            Value::HeapObject(_) => "object".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Error(_) => "object".to_string(),
            Value::BigInt(_) => "bigint".to_string(),
        }
    }

    /// Numeric conversion following `ToNumber` for the variants this crate
    /// models. Objects and functions convert to `NaN`.
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert_eq!(Value::Smi(10).to_number(), 10.0);
    /// assert_eq!(Value::String(" 2.5 ".into()).to_number(), 2.5);
    /// assert_eq!(Value::Null.to_number(), 0.0);
    /// assert!(Value::Undefined.to_number().is_nan());
    /// ```
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Smi(n) => f64::from(*n),
            Value::Double(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::BigInt(n) => n.to_f64().unwrap_or(f64::NAN),
            Value::HeapObject(_) | Value::Function(_) | Value::Error(_) => f64::NAN,
        }
    }

    /// Converts a numeric value into the smallest variant that holds it.
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert_eq!(Value::from_number(7.0), Value::Smi(7));
    /// assert_eq!(Value::from_number(1e12), Value::Double(1e12));
    /// ```
    pub fn from_number(n: f64) -> Value {
        if n.fract() == 0.0 && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX) {
            if n == 0.0 && n.is_sign_negative() {
                return Value::Double(n);
            }
            Value::Smi(n as i32)
        } else {
            Value::Double(n)
        }
    }

    /// The `stack` property of an error value, if one was captured.
    pub fn stack(&self) -> Option<String> {
        match self {
            Value::Error(e) => e.stack_trace(),
            _ => None,
        }
    }
}


/// Implementation of Display trait for JavaScript string conversion.
///
/// This follows JavaScript's `String()` conversion rules:
/// - undefined → "undefined"
/// - null → "null"
/// - boolean → "true" or "false"
/// - number → decimal representation
/// - error → "Name: message"
/// - object → "[object Object]" (simplified)
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Boolean(true).to_string(), "true");
/// assert_eq!(Value::Double(2.0).to_string(), "2");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Integer-valued doubles display without decimal point
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::HeapObject(_) => write!(f, "[object Object]"),
            Value::String(s) => write!(f, "{}", s),
            Value::Function(func) => {
                write!(f, "function {}() {{ [native code] }}", func.name())
            }
            Value::Error(e) => write!(f, "{}", e),
            Value::BigInt(n) => write!(f, "{}n", n),
        }
    }
}
