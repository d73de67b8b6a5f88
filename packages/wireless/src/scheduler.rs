//! Handing work from background threads back to the primary loop.
//!
//! Channel state is only ever touched on the primary thread. A worker (an
//! update check, say) computes its result off-thread and posts a task; the
//! primary loop runs posted tasks when it calls [`TaskQueue::run_pending`].

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

/// A unit of work for the primary thread.
pub type Task<S> = Box<dyn FnOnce(&mut S) + Send>;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("the primary task queue has been dropped")]
pub struct QueueClosed;

/// Single-consumer queue owned by the primary thread.
pub struct TaskQueue<S> {
    sender: Sender<Task<S>>,
    receiver: Receiver<Task<S>>,
}

/// Posting side of a [`TaskQueue`]; cheap to clone and send to workers.
pub struct TaskSender<S> {
    sender: Sender<Task<S>>,
}

impl<S> Clone for TaskSender<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S: 'static> TaskSender<S> {
    pub fn post(&self, task: impl FnOnce(&mut S) + Send + 'static) -> Result<(), QueueClosed> {
        self.sender.send(Box::new(task)).map_err(|_| QueueClosed)
    }
}

impl<S: 'static> Default for TaskQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> TaskQueue<S> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> TaskSender<S> {
        TaskSender {
            sender: self.sender.clone(),
        }
    }

    /// Run every task posted so far against `state`, in posting order.
    ///
    /// Never blocks. Returns how many tasks ran.
    pub fn run_pending(&self, state: &mut S) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(task) => {
                    task(state);
                    ran += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        ran
    }

    /// Run `work` on a new named thread and post `then` with its result.
    ///
    /// `then` runs on the primary thread during a later
    /// [`run_pending`](Self::run_pending). If the queue is gone by the time
    /// `work` finishes, the result is dropped.
    pub fn spawn<T, W, F>(&self, name: &str, work: W, then: F) -> io::Result<JoinHandle<()>>
    where
        T: Send + 'static,
        W: FnOnce() -> T + Send + 'static,
        F: FnOnce(T, &mut S) + Send + 'static,
    {
        let sender = self.sender();
        let thread_name = name.to_string();
        thread::Builder::new().name(name.to_string()).spawn(move || {
            let result = work();
            if sender.post(move |state| then(result, state)).is_err() {
                tracing::debug!(worker = %thread_name, "primary queue gone, dropping result");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Primary {
        notices: Vec<String>,
    }

    #[test]
    fn tasks_wait_for_the_primary_loop() {
        let queue = TaskQueue::<Primary>::new();
        let sender = queue.sender();
        sender.post(|p| p.notices.push("one".to_string())).unwrap();
        sender.post(|p| p.notices.push("two".to_string())).unwrap();

        let mut primary = Primary::default();
        assert_eq!(queue.run_pending(&mut primary), 2);
        assert_eq!(primary.notices, ["one", "two"]);
        assert_eq!(queue.run_pending(&mut primary), 0);
    }

    #[test]
    fn worker_result_lands_on_primary() {
        let queue = TaskQueue::<Primary>::new();
        let handle = queue
            .spawn(
                "update-check",
                || "1.2.0".to_string(),
                |latest, p: &mut Primary| p.notices.push(format!("update {latest} available")),
            )
            .unwrap();
        handle.join().unwrap();

        let mut primary = Primary::default();
        assert!(primary.notices.is_empty());
        queue.run_pending(&mut primary);
        assert_eq!(primary.notices, ["update 1.2.0 available"]);
    }

    #[test]
    fn post_after_drop_fails() {
        let queue = TaskQueue::<Primary>::new();
        let sender = queue.sender();
        drop(queue);
        assert_eq!(sender.post(|_| {}), Err(QueueClosed));
    }
}
