//! Redraw scheduling with invalidation coalescing.
//!
//! `invalidate()` may be called any number of times between frame ticks,
//! from any thread; exactly one build+render cycle runs per tick in which
//! at least one invalidation occurred, and none otherwise. The pending
//! flag is the sole cross-thread shared resource and is a plain atomic.
//!
//! An optional waker lets a host event loop sleep until work arrives; it
//! fires only on the first invalidation between ticks, so redundant
//! wakeups are never issued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use log::trace;

use crate::tree::WidgetId;

struct SchedulerShared {
    invalidated: AtomicBool,
    waker: OnceLock<Box<dyn Fn() + Send + Sync>>,
}

impl SchedulerShared {
    fn invalidate(&self) {
        // Only wake on the first request - avoids redundant wakeups when
        // many invalidations land between two ticks
        let was_invalidated = self.invalidated.swap(true, Ordering::Relaxed);
        if !was_invalidated {
            if let Some(waker) = self.waker.get() {
                waker();
            }
        }
    }
}

/// Coalesces invalidation requests into one redraw per frame tick.
pub struct RedrawScheduler {
    shared: Arc<SchedulerShared>,
    ticks: u64,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                invalidated: AtomicBool::new(false),
                waker: OnceLock::new(),
            }),
            ticks: 0,
        }
    }

    /// Install the host wakeup callback (once). Called when the first
    /// invalidation between ticks arrives, from whichever thread posts it.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        let _ = self.shared.waker.set(Box::new(waker));
    }

    /// Request a redraw on the next tick. Safe to call from any thread.
    pub fn invalidate(&self) {
        self.shared.invalidate();
    }

    /// Request a redraw because `widget` changed.
    ///
    /// Invalidates the whole frame: no partial/dirty-rect redraw is
    /// guaranteed by this design (the retained backend's node diff is the
    /// internal optimization hook).
    pub fn queue_draw(&self, widget: WidgetId) {
        trace!("queue_draw for widget {:?}", widget);
        self.invalidate();
    }

    /// A cloneable cross-thread invalidation entry point.
    pub fn handle(&self) -> InvalidationHandle {
        InvalidationHandle {
            shared: self.shared.clone(),
        }
    }

    /// Frame tick from the host clock.
    ///
    /// Runs `frame` exactly once if any invalidation arrived since the
    /// previous tick, and not at all otherwise. Ticks are monotonic and
    /// never reentrant (`&mut self` enforces it).
    pub fn tick<F: FnOnce()>(&mut self, frame: F) -> bool {
        self.ticks += 1;
        let pending = self.shared.invalidated.swap(false, Ordering::Relaxed);
        if pending {
            frame();
        }
        pending
    }

    /// Number of ticks processed so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}

impl Default for RedrawScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Send + Sync handle for posting invalidations from other threads.
#[derive(Clone)]
pub struct InvalidationHandle {
    shared: Arc<SchedulerShared>,
}

impl InvalidationHandle {
    pub fn invalidate(&self) {
        self.shared.invalidate();
    }
}
