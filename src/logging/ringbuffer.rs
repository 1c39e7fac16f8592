// SPDX-License-Identifier: Apache-2.0 OR MIT
// Per-level staging ring buffer (L1)
//
// Producers write, the logger's drain thread reads. All cursor updates
// happen under one mutex; the critical sections are a slot move plus
// index arithmetic, except for growth which copies every live slot once.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// What a write does when the buffer is full
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Double the capacity and keep everything
    #[default]
    Grow,
    /// Drop the oldest unread entry
    Overwrite,
}

struct Slots<T> {
    slots: Box<[Option<T>]>,
    read: usize,
    write: usize,
    used: usize,
    /// Entries ever pushed; the next entry's sequence number
    pushed: u64,
}

impl<T> Slots<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            read: 0,
            write: 0,
            used: 0,
            pushed: 0,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Double the capacity, moving live entries to the front oldest-first
    fn grow(&mut self) {
        let old_capacity = self.capacity();
        let mut grown = Self::with_capacity(old_capacity * 2);
        for i in 0..self.used {
            grown.slots[i] = self.slots[(self.read + i) % old_capacity].take();
        }
        grown.write = self.used;
        grown.used = self.used;
        grown.pushed = self.pushed;
        *self = grown;
    }

    fn push(&mut self, item: T) {
        self.slots[self.write] = Some(item);
        self.write = (self.write + 1) % self.capacity();
        self.used += 1;
        self.pushed += 1;
    }

    fn pop(&mut self) -> Option<T> {
        if self.used == 0 {
            return None;
        }
        let item = self.slots[self.read].take();
        self.read = (self.read + 1) % self.capacity();
        self.used -= 1;
        item
    }
}

/// Circular buffer with a fixed overflow policy.
///
/// Safe to share between any number of writers and one reader; the logger
/// keeps one per enabled level.
pub struct RingBuffer<T> {
    inner: Mutex<Slots<T>>,
    policy: OverflowPolicy,
    overruns: AtomicU64,
    growths: AtomicU64,
}

impl<T> RingBuffer<T> {
    /// Create a buffer with `capacity` slots (at least one)
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            inner: Mutex::new(Slots::with_capacity(capacity.max(1))),
            policy,
            overruns: AtomicU64::new(0),
            growths: AtomicU64::new(0),
        }
    }

    /// Insert an entry.
    ///
    /// Never blocks beyond the internal lock. Under `Overwrite` a full
    /// buffer evicts its oldest entry, which is returned to the caller.
    pub fn write(&self, item: T) -> Option<T> {
        self.write_with(|_| item)
    }

    /// Insert the entry built by `make` from its sequence number.
    ///
    /// Sequence numbers count every entry this buffer has accepted and are
    /// assigned under the buffer lock, so they increase in read order.
    pub fn write_with(&self, make: impl FnOnce(u64) -> T) -> Option<T> {
        let mut inner = self.inner.lock();
        let mut evicted = None;

        if inner.used == inner.capacity() {
            match self.policy {
                OverflowPolicy::Grow => {
                    inner.grow();
                    self.growths.fetch_add(1, Ordering::Relaxed);
                }
                OverflowPolicy::Overwrite => {
                    evicted = inner.pop();
                    self.overruns.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        let sequence = inner.pushed;
        inner.push(make(sequence));
        evicted
    }

    /// Remove the oldest entry, or `None` if the buffer is empty
    pub fn read(&self) -> Option<T> {
        self.inner.lock().pop()
    }

    /// Move up to `max` entries into `out`, oldest first. Returns how many moved.
    pub fn read_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        let mut inner = self.inner.lock();
        let mut moved = 0;
        while moved < max {
            match inner.pop() {
                Some(item) => {
                    out.push(item);
                    moved += 1;
                }
                None => break,
            }
        }
        moved
    }

    pub fn len(&self) -> usize {
        self.inner.lock().used
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Entries dropped by `Overwrite`
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Times the buffer doubled under `Grow`
    pub fn growths(&self) -> u64 {
        self.growths.load(Ordering::Relaxed)
    }
}
