//! Unit tests for JsError, ErrorKind and StackFrame

use core_types::{ErrorKind, JsError, StackFrame};

fn frame(name: Option<&str>, url: Option<&str>, line: u32, column: u32) -> StackFrame {
    StackFrame {
        function_name: name.map(String::from),
        source_url: url.map(String::from),
        line,
        column,
    }
}

#[cfg(test)]
mod kind_tests {
    use super::*;

    #[test]
    fn test_every_kind_displays_its_constructor_name() {
        let kinds = [
            (ErrorKind::Error, "Error"),
            (ErrorKind::SyntaxError, "SyntaxError"),
            (ErrorKind::TypeError, "TypeError"),
            (ErrorKind::ReferenceError, "ReferenceError"),
            (ErrorKind::RangeError, "RangeError"),
            (ErrorKind::EvalError, "EvalError"),
            (ErrorKind::URIError, "URIError"),
            (ErrorKind::InternalError, "InternalError"),
        ];
        for (kind, name) in kinds {
            assert_eq!(kind.name(), name);
            assert_eq!(kind.to_string(), name);
        }
    }
}

#[cfg(test)]
mod construction_tests {
    use super::*;

    #[test]
    fn test_shorthands() {
        assert_eq!(JsError::error("a"), JsError::new(ErrorKind::Error, "a"));
        assert_eq!(JsError::type_error("b").kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_new_has_no_frames() {
        let error = JsError::new(ErrorKind::RangeError, "out of range");
        assert!(error.stack.is_empty());
        assert!(error.stack_trace().is_none());
    }
}

#[cfg(test)]
mod rendering_tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(JsError::error("boom").to_string(), "Error: boom");
        assert_eq!(JsError::new(ErrorKind::TypeError, "").to_string(), "TypeError");
    }

    #[test]
    fn test_stack_trace_lists_frames_in_order() {
        let error = JsError::error("boom")
            .with_frame(frame(Some("inner"), Some("a.js"), 1, 2))
            .with_frame(frame(None, None, 3, 4));
        assert_eq!(
            error.stack_trace().as_deref(),
            Some("Error: boom\n\tat inner (a.js:1:2)\n\tat <anonymous> (<unknown>:3:4)")
        );
    }

    #[test]
    fn test_frame_display() {
        assert_eq!(
            frame(Some("tick"), Some("file:///timers.js"), 12, 3).to_string(),
            "tick (file:///timers.js:12:3)"
        );
        assert_eq!(
            frame(None, Some("main.js"), 1, 1).to_string(),
            "<anonymous> (main.js:1:1)"
        );
        assert_eq!(frame(Some("f"), None, 0, 0).to_string(), "f (<unknown>:0:0)");
    }

    #[test]
    fn test_usable_as_std_error() {
        let boxed: Box<dyn std::error::Error> = Box::new(JsError::type_error("x"));
        assert_eq!(boxed.to_string(), "TypeError: x");
    }
}
