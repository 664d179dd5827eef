//! Unit tests for EventLoop

use async_runtime::{EventLoop, RuntimeError, Task};
use core_types::JsError;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn push(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Task {
    let log = Arc::clone(log);
    Task::new(move || {
        log.lock().unwrap().push(label);
        Ok(())
    })
}

#[test]
fn start_returns_when_nothing_is_pending() {
    let event_loop = EventLoop::new();
    assert!(event_loop.start(Task::new(|| Ok(()))).is_ok());
    assert_eq!(event_loop.pending_registrations(), 0);
}

#[test]
fn tasks_enqueued_during_a_task_keep_submission_order() {
    let event_loop = EventLoop::new();
    let log = Arc::new(Mutex::new(vec![]));

    let el = event_loop.clone();
    let l = Arc::clone(&log);
    event_loop
        .start(Task::new(move || {
            el.enqueue_task(push(&l, "a"));
            let el2 = el.clone();
            let l2 = Arc::clone(&l);
            el.enqueue_task(Task::new(move || {
                el2.enqueue_task(push(&l2, "d"));
                l2.lock().unwrap().push("b");
                Ok(())
            }));
            el.enqueue_task(push(&l, "c"));
            Ok(())
        }))
        .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c", "d"]);
}

#[test]
fn loop_waits_for_every_background_producer() {
    let event_loop = EventLoop::new();
    let count = Arc::new(Mutex::new(0));

    let el = event_loop.clone();
    let c = Arc::clone(&count);
    event_loop
        .start(Task::new(move || {
            for i in 0..8 {
                let callback = el.register_callback();
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(i * 3));
                    callback.fulfill(Task::new(move || {
                        *c.lock().unwrap() += 1;
                        Ok(())
                    }));
                });
            }
            Ok(())
        }))
        .unwrap();

    assert_eq!(*count.lock().unwrap(), 8);
}

#[test]
fn failed_drain_resumes_with_remaining_tasks_first() {
    let event_loop = EventLoop::new();
    let log = Arc::new(Mutex::new(vec![]));

    let el = event_loop.clone();
    let l = Arc::clone(&log);
    let err = event_loop
        .start(Task::new(move || {
            el.enqueue_task(Task::new(|| Err(JsError::error("first fails").into())));
            el.enqueue_task(push(&l, "second"));
            el.enqueue_task(push(&l, "third"));
            Ok(())
        }))
        .unwrap_err();
    assert_eq!(err.to_string(), "Error: first fails");
    assert!(log.lock().unwrap().is_empty());

    event_loop.wait_on_registered();
    event_loop.start(push(&log, "new")).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["second", "third", "new"]);
}

#[test]
fn wait_on_registered_runs_stragglers_and_swallows_their_errors() {
    let event_loop = EventLoop::new();
    let ran = Arc::new(Mutex::new(false));

    let el = event_loop.clone();
    let r = Arc::clone(&ran);
    let err = event_loop
        .start(Task::new(move || {
            let callback = el.register_callback();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                callback.fulfill(Task::new(move || {
                    *r.lock().unwrap() = true;
                    Err(JsError::error("late").into())
                }));
            });
            Err(JsError::error("early").into())
        }))
        .unwrap_err();
    assert_eq!(err.to_string(), "Error: early");

    event_loop.wait_on_registered();
    assert!(*ran.lock().unwrap());
    assert_eq!(event_loop.pending_registrations(), 0);

    // The loop is reusable afterwards.
    event_loop.start(Task::new(|| Ok(()))).unwrap();
}

#[test]
fn wakeups_from_many_deliveries_do_not_lose_tasks() {
    let event_loop = EventLoop::new();
    let count = Arc::new(Mutex::new(0));

    let el = event_loop.clone();
    let c = Arc::clone(&count);
    event_loop
        .start(Task::new(move || {
            let callbacks: Vec<_> = (0..100).map(|_| el.register_callback()).collect();
            thread::spawn(move || {
                for callback in callbacks {
                    let c = Arc::clone(&c);
                    callback.fulfill(Task::new(move || {
                        *c.lock().unwrap() += 1;
                        Ok(())
                    }));
                }
            });
            Ok(())
        }))
        .unwrap();

    assert_eq!(*count.lock().unwrap(), 100);
}

#[test]
#[should_panic(expected = "registration callback fulfilled more than once")]
fn fulfilling_a_callback_twice_is_a_fault() {
    let event_loop = EventLoop::new();
    let el = event_loop.clone();
    let _ = event_loop.start(Task::new(move || {
        let callback = el.register_callback();
        callback.fulfill(Task::new(|| Ok(())));
        callback.fulfill(Task::new(|| Ok(())));
        Ok(())
    }));
}

#[test]
fn task_error_kinds_pass_through_unchanged() {
    let event_loop = EventLoop::new();
    let err = event_loop
        .start(Task::new(|| Err(RuntimeError::Interrupted)))
        .unwrap_err();
    assert_eq!(err, RuntimeError::Interrupted);
}
