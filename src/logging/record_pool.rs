// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Record Pool
//!
//! Free-list of record allocations shared by every producer and worker of a
//! logger. `acquire` pops a recycled record (or allocates one when the list is
//! empty) and wraps it in a [`PooledRecord`]. Dropping the handle clears the
//! record and pushes it back, so a record is released exactly once and cannot
//! be touched by its submitter after it has been handed to the pipeline.
//!
//! The free list is a bounded `crossbeam-queue` array queue; records released
//! while it is full are simply freed.

use crossbeam_queue::ArrayQueue;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::LogRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Records created because the free list was empty
    pub allocated: u64,
    /// Acquisitions served from the free list
    pub reused: u64,
    /// Records pushed back onto the free list
    pub released: u64,
    /// Records freed because the free list was full
    pub discarded: u64,
}

/// Lock-free record pool. Shared behind an `Arc`.
pub struct RecordPool {
    free: ArrayQueue<Box<LogRecord>>,
    allocated: AtomicU64,
    reused: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
}

impl RecordPool {
    /// Create a pool that keeps at most `max_idle` records and pre-allocates
    /// `prefill` of them.
    pub fn new(max_idle: usize, prefill: usize) -> Arc<Self> {
        let pool = Arc::new(Self {
            free: ArrayQueue::new(max_idle.max(1)),
            allocated: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            released: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        });

        for _ in 0..prefill.min(pool.free.capacity()) {
            let _ = pool.free.push(Box::new(LogRecord::empty()));
        }

        pool
    }

    /// Take a record from the free list, allocating if it is empty.
    pub fn acquire(self: &Arc<Self>) -> PooledRecord {
        let record = match self.free.pop() {
            Some(record) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                record
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Box::new(LogRecord::empty())
            }
        };

        PooledRecord {
            record: ManuallyDrop::new(record),
            pool: Arc::clone(self),
        }
    }

    /// Called by `PooledRecord::drop`.
    fn release(&self, mut record: Box<LogRecord>) {
        record.clear();
        match self.free.push(record) {
            Ok(()) => {
                self.released.fetch_add(1, Ordering::Relaxed);
            }
            Err(_record) => {
                self.discarded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of idle records ready to be handed out
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.free.capacity()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// A record on loan from a [`RecordPool`]; returns itself when dropped.
pub struct PooledRecord {
    record: ManuallyDrop<Box<LogRecord>>,
    pool: Arc<RecordPool>,
}

impl Drop for PooledRecord {
    fn drop(&mut self) {
        // SAFETY: `record` is never used again after this point.
        let record = unsafe { ManuallyDrop::take(&mut self.record) };
        self.pool.release(record);
    }
}

impl Deref for PooledRecord {
    type Target = LogRecord;

    fn deref(&self) -> &LogRecord {
        &self.record
    }
}

impl DerefMut for PooledRecord {
    fn deref_mut(&mut self) -> &mut LogRecord {
        &mut self.record
    }
}

impl std::fmt::Debug for PooledRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PooledRecord").field(&**self.record).finish()
    }
}
