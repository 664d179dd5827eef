//! The queue shared between the loop thread and background producers.
//!
//! One mutex guards both the pending tasks and the number of registrations
//! that have not been fulfilled yet, so the loop always reads a consistent
//! pair. Wakeups go through a channel of depth one and are sent with
//! `try_send`: any number of deliveries while the loop is busy collapse into
//! a single pending signal.

use crate::task_queue::Task;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug, Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    awaiting: usize,
}

/// Multi-producer, single-consumer task list with registration accounting.
#[derive(Debug)]
pub(crate) struct CallbackQueue {
    state: Mutex<QueueState>,
    wakeup_tx: Sender<()>,
    wakeup_rx: Receiver<()>,
}

impl CallbackQueue {
    pub(crate) fn new() -> Self {
        let (wakeup_tx, wakeup_rx) = channel::bounded(1);
        Self {
            state: Mutex::new(QueueState::default()),
            wakeup_tx,
            wakeup_rx,
        }
    }

    /// Records one more registration that will eventually deliver or release.
    pub(crate) fn register(&self) {
        self.state.lock().awaiting += 1;
    }

    /// Delivers the task for a registration.
    pub(crate) fn deliver(&self, task: Task) {
        let mut state = self.state.lock();
        state.tasks.push_back(task);
        state.awaiting -= 1;
        self.wake();
    }

    /// Gives up a registration without delivering anything.
    pub(crate) fn release(&self) {
        let mut state = self.state.lock();
        state.awaiting -= 1;
        self.wake();
    }

    /// Appends a task that was never registered, used for seeding a run.
    pub(crate) fn push(&self, task: Task) {
        self.state.lock().tasks.push_back(task);
    }

    /// Swaps out everything queued so far and reads the awaiting count.
    pub(crate) fn take(&self) -> (VecDeque<Task>, usize) {
        let mut state = self.state.lock();
        (std::mem::take(&mut state.tasks), state.awaiting)
    }

    /// Puts `front` back ahead of whatever was queued since it was taken.
    pub(crate) fn requeue_front(&self, mut front: VecDeque<Task>) {
        if front.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        front.append(&mut state.tasks);
        state.tasks = front;
    }

    /// Blocks until at least one delivery or release happened since the
    /// last wait.
    pub(crate) fn wait(&self) {
        // The sender lives in `self`, so the channel cannot disconnect here.
        let _ = self.wakeup_rx.recv();
    }

    pub(crate) fn awaiting(&self) -> usize {
        self.state.lock().awaiting
    }

    fn wake(&self) {
        // A full buffer already holds a pending wakeup.
        let _ = self.wakeup_tx.try_send(());
    }
}
