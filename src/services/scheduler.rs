//! Countdown scheduler — a time-indexed event queue driven by the main
//! loop's own tick, not a timer thread (spec §4.6, §9).
//!
//! Mirrors the `pending_egress` pattern used for journey egress: entries
//! carry a deadline, and a `run_pending()` call drains whatever is due.
//! The difference here is the queue is ordered (a `BinaryHeap`) rather than
//! a flat map, since the watchdog schedules many beep events ahead of a
//! single re-lock deadline and needs them fired in order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Opaque handle to a scheduled entry, returned by [`Scheduler::enter`] so
/// the caller can [`Scheduler::cancel`] it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(u64);

struct Entry {
    at: Instant,
    handle: EventHandle,
    action: Box<dyn FnOnce() + Send>,
}

impl Entry {
    fn cmp_key(&self) -> Instant {
        self.at
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_key() == other.cmp_key()
    }
}
impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want the earliest deadline first.
        other.cmp_key().cmp(&self.cmp_key())
    }
}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A min-heap of pending actions, polled by the main loop. Single-threaded
/// by design: `run_pending` must be called from the same loop that owns
/// the watchdog state, never from a background thread (spec §9).
#[derive(Default)]
pub struct Scheduler {
    queue: BinaryHeap<Entry>,
    next_id: u64,
    /// Ids still sitting in `queue`, neither fired nor popped yet. `cancel`
    /// only marks an id cancelled while it's in here, so cancelling a handle
    /// whose entry already fired (and was popped) is a no-op instead of a
    /// permanent leak into `cancelled`.
    live: std::collections::HashSet<u64>,
    cancelled: std::collections::HashSet<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_id: 0,
            live: std::collections::HashSet::new(),
            cancelled: std::collections::HashSet::new(),
        }
    }

    /// Schedule `action` to run at `now + delay`. Returns a handle that can
    /// be used to [`cancel`](Self::cancel) it before it fires.
    pub fn enter(
        &mut self,
        now: Instant,
        delay: std::time::Duration,
        action: impl FnOnce() + Send + 'static,
    ) -> EventHandle {
        let id = self.next_id;
        self.next_id += 1;
        let handle = EventHandle(id);
        self.live.insert(id);
        self.queue.push(Entry { at: now + delay, handle, action: Box::new(action) });
        handle
    }

    /// Cancel a previously scheduled action. A no-op if it already fired or
    /// was already cancelled.
    pub fn cancel(&mut self, handle: EventHandle) {
        if self.live.remove(&handle.0) {
            self.cancelled.insert(handle.0);
        }
    }

    /// Run every action whose deadline is `<= now`, in deadline order.
    /// Returns the number of actions actually invoked (cancelled entries
    /// are dropped silently and not counted).
    pub fn run_pending(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        while let Some(entry) = self.queue.peek() {
            if entry.at > now {
                break;
            }
            let entry = self.queue.pop().expect("peeked entry must exist");
            self.live.remove(&entry.handle.0);
            if self.cancelled.remove(&entry.handle.0) {
                continue;
            }
            (entry.action)();
            fired += 1;
        }
        fired
    }

    /// True if nothing is queued (ignoring cancelled-but-not-yet-popped entries).
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn fires_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let base = Instant::now();

        let o1 = order.clone();
        scheduler.enter(base, Duration::from_millis(30), move || o1.lock().unwrap().push(3));
        let o2 = order.clone();
        scheduler.enter(base, Duration::from_millis(10), move || o2.lock().unwrap().push(1));
        let o3 = order.clone();
        scheduler.enter(base, Duration::from_millis(20), move || o3.lock().unwrap().push(2));

        let fired = scheduler.run_pending(base + Duration::from_millis(100));
        assert_eq!(fired, 3);
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn does_not_fire_before_deadline() {
        let mut scheduler = Scheduler::new();
        let called = Arc::new(AtomicUsize::new(0));
        let base = Instant::now();
        let c = called.clone();
        scheduler.enter(base, Duration::from_secs(10), move || {
            c.fetch_add(1, AtomicOrdering::SeqCst);
        });

        scheduler.run_pending(base + Duration::from_secs(5));
        assert_eq!(called.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(scheduler.len(), 1);

        scheduler.run_pending(base + Duration::from_secs(10));
        assert_eq!(called.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut scheduler = Scheduler::new();
        let called = Arc::new(AtomicUsize::new(0));
        let base = Instant::now();
        let c = called.clone();
        let handle =
            scheduler.enter(base, Duration::from_secs(1), move || {
                c.fetch_add(1, AtomicOrdering::SeqCst);
            });
        scheduler.cancel(handle);

        scheduler.run_pending(base + Duration::from_secs(2));
        assert_eq!(called.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn cancelling_an_already_fired_handle_does_not_leak() {
        let mut scheduler = Scheduler::new();
        let base = Instant::now();
        let handle = scheduler.enter(base, Duration::from_secs(1), || {});

        scheduler.run_pending(base + Duration::from_secs(2));
        assert!(scheduler.cancelled.is_empty());

        // Cancelling a handle whose entry already fired and was popped must
        // be a no-op, not a permanent entry in `cancelled` (spec §4.6: every
        // open/close cycle cancels a batch of beep handles, some of which
        // may have already fired).
        scheduler.cancel(handle);
        assert!(scheduler.cancelled.is_empty());
        assert!(scheduler.live.is_empty());
    }
}
