//! UI-thread continuation queue for asynchronous work.
//!
//! The UI thread never waits: slow work runs elsewhere and completes by
//! posting a continuation through a [`RemoteQueue`], which the UI thread
//! drains between frames. Posting also pokes the redraw scheduler when a
//! handle is attached, so a sleeping event loop wakes up.
//!
//! Cancellation drops the continuation's liveness token: a completion
//! that still arrives afterwards drains as a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::trace;

use crate::scheduler::InvalidationHandle;

type Continuation = Box<dyn FnOnce() + Send>;

struct QueuedTask {
    alive: Arc<AtomicBool>,
    run: Continuation,
}

struct TaskShared {
    pending: Mutex<Vec<QueuedTask>>,
    invalidation: Option<InvalidationHandle>,
}

/// The UI-thread side of the queue.
pub struct TaskQueue {
    shared: Arc<TaskShared>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A queue that invalidates the scheduler whenever work is posted.
    pub fn with_invalidation(handle: InvalidationHandle) -> Self {
        Self::build(Some(handle))
    }

    fn build(invalidation: Option<InvalidationHandle>) -> Self {
        Self {
            shared: Arc::new(TaskShared {
                pending: Mutex::new(Vec::new()),
                invalidation,
            }),
        }
    }

    /// The Send + Sync posting half, cloneable into worker threads.
    pub fn remote(&self) -> RemoteQueue {
        RemoteQueue {
            shared: self.shared.clone(),
        }
    }

    /// Run all pending live continuations on the calling (UI) thread.
    ///
    /// Returns how many continuations actually ran; cancelled ones are
    /// swallowed silently.
    pub fn drain(&self) -> usize {
        let pending = std::mem::take(&mut *self.shared.pending.lock().unwrap());

        let mut ran = 0;
        for task in pending {
            if task.alive.load(Ordering::Acquire) {
                (task.run)();
                ran += 1;
            } else {
                trace!("dropping completion of cancelled task");
            }
        }
        ran
    }

    /// Whether any continuations are waiting.
    pub fn has_pending(&self) -> bool {
        !self.shared.pending.lock().unwrap().is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Posting half of the queue; safe to move into any thread.
#[derive(Clone)]
pub struct RemoteQueue {
    shared: Arc<TaskShared>,
}

impl RemoteQueue {
    /// Post a completion continuation to the UI thread.
    ///
    /// Returns a handle whose [`TaskHandle::cancel`] makes the posted
    /// continuation a no-op if it has not run yet.
    pub fn post(&self, continuation: impl FnOnce() + Send + 'static) -> TaskHandle {
        let alive = Arc::new(AtomicBool::new(true));
        self.shared.pending.lock().unwrap().push(QueuedTask {
            alive: alive.clone(),
            run: Box::new(continuation),
        });

        if let Some(handle) = &self.shared.invalidation {
            handle.invalidate();
        }

        TaskHandle { alive }
    }
}

/// Liveness token for a posted continuation.
pub struct TaskHandle {
    alive: Arc<AtomicBool>,
}

impl TaskHandle {
    /// Cancel the continuation. Always legal, including after the work
    /// has started; a completion that still arrives is swallowed.
    pub fn cancel(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        !self.alive.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::scheduler::RedrawScheduler;

    #[test]
    fn test_post_and_drain() {
        let queue = TaskQueue::new();
        let remote = queue.remote();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        remote.post(move || {
            c.fetch_add(1, Ordering::Relaxed);
        });

        assert!(queue.has_pending());
        assert_eq!(queue.drain(), 1);
        assert_eq!(counter.load(Ordering::Relaxed), 1);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_cancelled_completion_is_noop() {
        let queue = TaskQueue::new();
        let remote = queue.remote();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        let handle = remote.post(move || {
            c.fetch_add(1, Ordering::Relaxed);
        });
        handle.cancel();
        assert!(handle.is_cancelled());

        assert_eq!(queue.drain(), 0);
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_post_from_worker_thread() {
        let queue = TaskQueue::new();
        let remote = queue.remote();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        std::thread::spawn(move || {
            remote.post(move || {
                c.fetch_add(1, Ordering::Relaxed);
            });
        })
        .join()
        .unwrap();

        assert_eq!(queue.drain(), 1);
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_posting_invalidates_scheduler() {
        let mut scheduler = RedrawScheduler::new();
        let queue = TaskQueue::with_invalidation(scheduler.handle());

        queue.remote().post(|| {});

        assert!(scheduler.tick(|| {}));
    }
}
