//! Unit tests for Value

use core_types::{Function, JsError, Value};
use num_bigint::BigInt;

#[cfg(test)]
mod conversion_tests {
    use super::*;

    #[test]
    fn test_to_number_primitives() {
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::Boolean(true).to_number(), 1.0);
        assert_eq!(Value::Smi(-4).to_number(), -4.0);
        assert_eq!(Value::Double(0.5).to_number(), 0.5);
        assert!(Value::Undefined.to_number().is_nan());
    }

    #[test]
    fn test_to_number_strings() {
        assert_eq!(Value::String("".into()).to_number(), 0.0);
        assert_eq!(Value::String("  100 ".into()).to_number(), 100.0);
        assert!(Value::String("soon".into()).to_number().is_nan());
    }

    #[test]
    fn test_to_number_objects_are_nan() {
        assert!(Value::HeapObject(3).to_number().is_nan());
        assert!(Value::from(JsError::error("x")).to_number().is_nan());
        assert!(Value::Function(Function::new(|_| Ok(Value::Undefined)))
            .to_number()
            .is_nan());
    }

    #[test]
    fn test_bigint_to_number() {
        assert_eq!(Value::BigInt(BigInt::from(12)).to_number(), 12.0);
    }

    #[test]
    fn test_from_number_picks_smallest_variant() {
        assert_eq!(Value::from_number(0.0), Value::Smi(0));
        assert_eq!(Value::from_number(2.5), Value::Double(2.5));
        assert_eq!(Value::from_number(i32::MAX as f64), Value::Smi(i32::MAX));
        assert_eq!(
            Value::from_number(i32::MAX as f64 + 1.0),
            Value::Double(i32::MAX as f64 + 1.0)
        );
        assert!(matches!(Value::from_number(-0.0), Value::Double(n) if n.is_sign_negative()));
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Boolean(false).type_of(), "boolean");
        assert_eq!(Value::Double(1.0).type_of(), "number");
        assert_eq!(Value::String("s".into()).type_of(), "string");
        assert_eq!(Value::HeapObject(0).type_of(), "object");
        assert_eq!(Value::from(JsError::error("e")).type_of(), "object");
        assert_eq!(Value::BigInt(BigInt::from(1)).type_of(), "bigint");
    }
}

#[cfg(test)]
mod identity_tests {
    use super::*;

    #[test]
    fn test_functions_compare_by_identity() {
        let f = Function::new(|_| Ok(Value::Undefined));
        let g = Function::new(|_| Ok(Value::Undefined));
        assert_eq!(Value::Function(f.clone()), Value::Function(f.clone()));
        assert_ne!(Value::Function(f), Value::Function(g));
    }

    #[test]
    fn test_values_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Value>();
    }
}

#[cfg(test)]
mod display_tests {
    use super::*;

    #[test]
    fn test_display_numbers() {
        assert_eq!(Value::Smi(7).to_string(), "7");
        assert_eq!(Value::Double(3.0).to_string(), "3");
        assert_eq!(Value::Double(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_display_errors_and_objects() {
        assert_eq!(
            Value::from(JsError::type_error("not callable")).to_string(),
            "TypeError: not callable"
        );
        assert_eq!(Value::HeapObject(2).to_string(), "[object Object]");
        assert_eq!(Value::Undefined.to_string(), "undefined");
    }

    #[test]
    fn test_stack_only_on_errors_with_frames() {
        assert!(Value::String("boom".into()).stack().is_none());
        assert!(Value::from(JsError::error("boom")).stack().is_none());
    }
}
