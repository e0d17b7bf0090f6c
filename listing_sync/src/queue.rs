//! A blocking work queue and a scoped worker pool over it.
//!
//! The queue tracks unfinished work separately from queued work: `join`
//! returns only once every item put on the queue has been acknowledged
//! with `task_done`, not merely dequeued. Sentinels (`None`) shut workers
//! down after the drain.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::thread;

use tracing::error;

struct QueueState<T> {
    items: VecDeque<Option<T>>,
    unfinished: usize,
}

/// A multi-producer multi-consumer queue with drain tracking.
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    item_ready: Condvar,
    all_done: Condvar,
}

impl<T> WorkQueue<T> {
    /// An empty queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                unfinished: 0,
            }),
            item_ready: Condvar::new(),
            all_done: Condvar::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState<T>> {
        self.state
            .lock()
            .expect("worker panicked while holding the queue lock")
    }

    /// Enqueues one work item.
    pub fn put(&self, item: T) {
        let mut state = self.lock();
        state.items.push_back(Some(item));
        state.unfinished += 1;
        self.item_ready.notify_one();
    }

    /// Enqueues a shutdown sentinel. Sentinels are not counted as work.
    pub fn put_sentinel(&self) {
        let mut state = self.lock();
        state.items.push_back(None);
        self.item_ready.notify_one();
    }

    /// Blocks until something is queued; `None` means shut down.
    pub fn get(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(entry) = state.items.pop_front() {
                return entry;
            }
            state = self
                .item_ready
                .wait(state)
                .expect("worker panicked while holding the queue lock");
        }
    }

    /// Acknowledges one previously fetched work item.
    pub fn task_done(&self) {
        let mut state = self.lock();
        state.unfinished = state
            .unfinished
            .checked_sub(1)
            .expect("task_done called more times than items were put");
        if state.unfinished == 0 {
            self.all_done.notify_all();
        }
    }

    /// Blocks until every item put on the queue has been acknowledged.
    pub fn join(&self) {
        let mut state = self.lock();
        while state.unfinished > 0 {
            state = self
                .all_done
                .wait(state)
                .expect("worker panicked while holding the queue lock");
        }
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drains `items` through `workers` threads.
///
/// Each worker builds its own context (cache connection plus API client)
/// via `make_ctx`; a context that fails to build acknowledges its items
/// unhandled so the drain still completes. Handler errors are logged and
/// the worker moves on to the next item.
pub fn run_pool<T, C>(
    items: Vec<T>,
    workers: usize,
    make_ctx: impl Fn() -> anyhow::Result<C> + Sync,
    handler: impl Fn(&mut C, T) -> anyhow::Result<()> + Sync,
) where
    T: Send + std::fmt::Debug,
{
    let queue = WorkQueue::new();
    for item in items {
        queue.put(item);
    }

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                let mut ctx = match make_ctx() {
                    Ok(ctx) => Some(ctx),
                    Err(e) => {
                        error!(error = %e, "worker context failed to build, draining unhandled");
                        None
                    }
                };
                while let Some(item) = queue.get() {
                    match ctx.as_mut() {
                        Some(ctx) => {
                            if let Err(e) = handler(ctx, item) {
                                error!(error = %e, "work item failed");
                            }
                        }
                        None => error!(?item, "dropping work item, worker has no context"),
                    }
                    queue.task_done();
                }
            });
        }

        queue.join();
        for _ in 0..workers {
            queue.put_sentinel();
        }
    });
}
