//! Fixed-capacity blocking FIFO shared by requester and resolver workers.
//!
//! The queue is a monitor: one mutex guards the buffer and the shutdown
//! flag, and three condition variables wake exactly the class of waiter
//! whose predicate just became true:
//!
//! - `not_full`: producers blocked in [`BoundedQueue::enqueue`]
//! - `not_empty`: consumers blocked in [`BoundedQueue::dequeue`]
//! - `drained`: the coordinator blocked in [`BoundedQueue::wait_until_drained`]

use crate::error::LookupError;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct State<T> {
    buf: VecDeque<T>,
    shutdown: bool,
    high_water: usize,
}

/// Bounded multi-producer multi-consumer queue with a one-shot shutdown flag.
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    drained: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `capacity` is zero, since no
    /// producer could ever make progress.
    pub fn new(capacity: usize) -> Result<Self, LookupError> {
        if capacity == 0 {
            return Err(LookupError::config("Queue capacity must be at least 1"));
        }

        Ok(Self {
            capacity,
            state: Mutex::new(State {
                buf: VecDeque::with_capacity(capacity),
                shutdown: false,
                high_water: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            drained: Condvar::new(),
        })
    }

    // Every mutation completes before the guard drops, so a poisoned lock
    // still protects a consistent buffer.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push `item` at the tail, blocking while the queue is full.
    ///
    /// Must not be called after [`signal_shutdown`](Self::signal_shutdown);
    /// the coordinator only signals once every producer has returned.
    pub fn enqueue(&self, item: T) {
        let mut state = self.lock();
        while state.buf.len() == self.capacity {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        debug_assert!(!state.shutdown, "enqueue after shutdown");

        state.buf.push_back(item);
        if state.buf.len() > state.high_water {
            state.high_water = state.buf.len();
        }
        drop(state);

        self.not_empty.notify_one();
    }

    /// Pop the head item, blocking while the queue is empty.
    ///
    /// Returns `None` without blocking once shutdown has been signaled and
    /// the queue is empty; no item will ever arrive after that.
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.lock();
        while state.buf.is_empty() && !state.shutdown {
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        let item = state.buf.pop_front()?;
        let now_empty = state.buf.is_empty();
        drop(state);

        self.not_full.notify_one();
        if now_empty {
            self.drained.notify_all();
        }
        Some(item)
    }

    /// Block until the queue holds no items.
    pub fn wait_until_drained(&self) {
        let mut state = self.lock();
        while !state.buf.is_empty() {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Mark that no more items will be enqueued and release every consumer
    /// blocked in [`dequeue`](Self::dequeue).
    ///
    /// Returns `false` if shutdown had already been signaled.
    pub fn signal_shutdown(&self) -> bool {
        let mut state = self.lock();
        if state.shutdown {
            return false;
        }
        state.shutdown = true;
        drop(state);

        self.not_empty.notify_all();
        true
    }

    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    pub fn len(&self) -> usize {
        self.lock().buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest length the queue has reached since construction.
    pub fn high_water(&self) -> usize {
        self.lock().high_water
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &state.buf.len())
            .field("shutdown", &state.shutdown)
            .finish()
    }
}
