// georepd - core/queue.rs
//
// FIFO multi-producer/multi-consumer work queue with integrated
// quiescence detection.
//
// The breadth-first walker's consumers are also its producers (expanding
// a directory pushes its children), so "producer closes the channel"
// termination does not apply. The only sound termination signal is:
// queue empty AND no consumer currently holding work. The caller keeps
// that count in an atomic passed to `pop`; every mutation of the counter
// happens with the queue mutex held, which is what makes the quiescence
// check race-free.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

/// Concurrent FIFO queue shared by the breadth-first walker threads.
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Enqueue an item and wake one waiting consumer.
    pub fn push(&self, item: T) {
        let mut items = self.items.lock().unwrap();
        items.push_back(item);
        self.available.notify_one();
    }

    /// Dequeue an item, blocking while the queue is empty but other
    /// consumers may still produce work.
    ///
    /// `active` counts consumers currently holding an item. The caller
    /// must have incremented it before its first `pop` (or seeded it to
    /// the consumer count); `pop` decrements it on entry and increments
    /// it again when it returns an item. Returns `None` once the crawl
    /// is quiescent: queue empty and `active` zero. On detecting
    /// quiescence every blocked consumer is released.
    pub fn pop(&self, active: &AtomicUsize) -> Option<T> {
        let mut items = self.items.lock().unwrap();
        active.fetch_sub(1, Ordering::SeqCst);
        loop {
            if let Some(item) = items.pop_front() {
                active.fetch_add(1, Ordering::SeqCst);
                return Some(item);
            }
            if active.load(Ordering::SeqCst) == 0 {
                self.available.notify_all();
                return None;
            }
            items = self.available.wait(items).unwrap();
        }
    }

    /// Observe the quiescence condition without blocking.
    pub fn done(&self, active: &AtomicUsize) -> bool {
        let items = self.items.lock().unwrap();
        items.is_empty() && active.load(Ordering::SeqCst) == 0
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
