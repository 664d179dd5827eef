//! Unit tests for Promise and rejection tracking

use async_runtime::{
    EventLoop, Promise, PromiseState, RejectionOperation, RuntimeError, Task,
};
use core_types::{Function, JsError, StackFrame, Value};
use std::sync::{Arc, Mutex};

fn run<F>(event_loop: &EventLoop, f: F) -> Result<(), RuntimeError>
where
    F: FnOnce(&EventLoop) -> Result<(), RuntimeError> + Send + 'static,
{
    let el = event_loop.clone();
    event_loop.start(Task::new(move || f(&el)))
}

#[test]
fn rejection_reports_error_stack() {
    let event_loop = EventLoop::new();
    let err = run(&event_loop, |el| {
        let reason = JsError::error("boom").with_frame(StackFrame {
            function_name: Some("load".into()),
            source_url: Some("script.js".into()),
            line: 3,
            column: 9,
        });
        Promise::new(el).reject(Value::from(reason));
        Ok(())
    })
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Uncaught (in promise) Error: boom\n\tat load (script.js:3:9)"
    );
}

#[test]
fn oldest_unhandled_rejection_wins() {
    let event_loop = EventLoop::new();
    let (first, err) = {
        let slot = Arc::new(Mutex::new(None));
        let s = Arc::clone(&slot);
        let err = run(&event_loop, move |el| {
            let first = Promise::new(el);
            first.reject(Value::String("first".into()));
            Promise::new(el).reject(Value::String("second".into()));
            *s.lock().unwrap() = Some(first.id());
            Ok(())
        })
        .unwrap_err();
        let first = slot.lock().unwrap().take().unwrap();
        (first, err)
    };
    match err {
        RuntimeError::UncaughtRejection { promise, reason } => {
            assert_eq!(promise, first);
            assert_eq!(reason, "first");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tracker_hook_accepts_direct_reports() {
    let event_loop = EventLoop::new();
    run(&event_loop, |el| {
        let promise = Promise::new(el);
        el.track_promise_rejection(&promise, RejectionOperation::Reject);
        el.track_promise_rejection(&promise, RejectionOperation::Handle);
        // Handling an unknown promise is ignored.
        el.track_promise_rejection(&Promise::new(el), RejectionOperation::Handle);
        Ok(())
    })
    .unwrap();
}

#[test]
fn handler_attached_in_a_later_task_is_too_late() {
    let event_loop = EventLoop::new();
    let err = run(&event_loop, |el| {
        let promise = Promise::new(el);
        promise.reject(Value::Smi(7));
        let later = promise.clone();
        el.enqueue_task(Task::new(move || {
            later.catch(Function::new(|_| Ok(Value::Undefined)));
            Ok(())
        }));
        Ok(())
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "Uncaught (in promise) 7");
}

#[test]
fn rejection_set_resets_between_runs() {
    let event_loop = EventLoop::new();
    run(&event_loop, |el| {
        Promise::new(el).reject(Value::String("stale".into()));
        Ok(())
    })
    .unwrap_err();
    event_loop.wait_on_registered();

    assert!(run(&event_loop, |_| Ok(())).is_ok());
}

#[test]
fn rejection_propagates_through_chain_until_caught() {
    let event_loop = EventLoop::new();
    let caught = Arc::new(Mutex::new(None));
    let c = Arc::clone(&caught);
    run(&event_loop, move |el| {
        let source = Promise::new(el);
        let caught_by = source
            .then(Some(Function::new(|_| Ok(Value::Smi(1)))), None)
            .catch(Function::new(move |args| {
                *c.lock().unwrap() = args.into_iter().next();
                Ok(Value::Undefined)
            }));
        source.reject(Value::String("bad".into()));
        assert_eq!(caught_by.state(), PromiseState::Pending);
        Ok(())
    })
    .unwrap();
    assert_eq!(*caught.lock().unwrap(), Some(Value::String("bad".into())));
}
