// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Logger facade.
//!
//! A `Logger` owns the whole pipeline for one log directory:
//!
//! - `log` fills a pooled record and pushes it into its level's ring buffer.
//!   It never touches the filesystem.
//! - A drain thread moves records from the ring buffers into bounded
//!   per-level dispatch queues. It sleeps for the drain interval whenever
//!   every ring buffer is empty.
//! - One feeder thread per enabled level takes records off its dispatch
//!   queue and hands each one to the worker pool as a write job.
//! - Workers write through the [`FileRotationManager`], which rotates and
//!   fsyncs under a per-level lock.
//!
//! Every accepted record is tracked as in flight until it is written, fails,
//! or is evicted by an overwriting ring buffer. `flush`, `close` and
//! `close_all` wait on that count.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex, RwLock};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::{
    dispatch_queue, Clock, Diagnostic, DiagnosticKind, DiagnosticSink, DispatchReceiver,
    DispatchSender, Level, LevelMap, PooledRecord, RecordPool, RingBuffer, StderrSink,
    SystemClock,
};
use crate::config::Options;
use crate::error::{Error, Result};
use crate::rotation::FileRotationManager;
use crate::worker::{Job, WorkerPool};

/// Records moved per ring buffer per drain pass
const DRAIN_BATCH: usize = 256;

/// Snapshot of a logger's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoggerStats {
    /// Records admitted by `log`
    pub accepted: u64,
    /// Records durably written
    pub written: u64,
    /// Records whose write or rotation failed
    pub failed: u64,
    /// Records evicted by overwrite or discarded during shutdown
    pub dropped: u64,
    /// Accepted records not yet in a terminal state
    pub in_flight: u64,
    /// Idle records in the pool
    pub pooled: usize,
    pub date_rotations: u64,
    pub size_rotations: u64,
}

/// Count of in-flight records for one level, with a wakeup at zero.
#[derive(Default)]
struct InFlight {
    count: Mutex<u64>,
    drained: Condvar,
}

impl InFlight {
    fn add(&self) {
        *self.count.lock() += 1;
    }

    fn done(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.drained.wait(&mut count);
        }
    }

    fn get(&self) -> u64 {
        *self.count.lock()
    }
}

/// Admission state checked by `log` under a read lock
struct Gate {
    closed: bool,
    open: LevelMap<bool>,
}

enum DrainSignal {
    Wake,
    Shutdown,
}

/// State shared by the facade, the drain thread, the feeders and write jobs
struct Shared {
    options: Options,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticSink>,
    records: Arc<RecordPool>,
    rings: LevelMap<Option<RingBuffer<PooledRecord>>>,
    files: FileRotationManager,
    gate: RwLock<Gate>,
    in_flight: LevelMap<InFlight>,
    accepted: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl Shared {
    /// Account for a record that will never be written.
    fn discard(&self, level: Level, record: PooledRecord, reason: &str) {
        let sequence = record.sequence;
        drop(record);
        self.dropped.fetch_add(1, Ordering::Relaxed);
        self.diagnostics.report(Diagnostic::new(
            DiagnosticKind::RecordDropped,
            Some(level),
            format!("record {} dropped: {}", sequence, reason),
        ));
        self.in_flight[level].done();
    }

    /// Move everything currently buffered into the dispatch queues.
    fn sweep(
        &self,
        senders: &LevelMap<Option<DispatchSender<PooledRecord>>>,
        batch: &mut Vec<PooledRecord>,
    ) -> usize {
        let mut moved = 0;
        for (level, ring) in self.rings.iter() {
            let (Some(ring), Some(sender)) = (ring, senders.get(level)) else {
                continue;
            };
            ring.read_batch(batch, DRAIN_BATCH);
            for record in batch.drain(..) {
                moved += 1;
                // Blocks while the queue is full
                if let Err(record) = sender.send(record) {
                    self.discard(level, record, "dispatch queue closed");
                }
            }
        }
        moved
    }
}

/// One record on its way to disk.
///
/// Dropping the job without running it counts the record as dropped, so a
/// job refused by a stopped pool is still accounted for.
struct WriteJob {
    level: Level,
    record: Option<PooledRecord>,
    shared: Arc<Shared>,
}

impl Job for WriteJob {
    fn run(mut self: Box<Self>) {
        let Some(record) = self.record.take() else {
            return;
        };

        match self.shared.files.write_record(&record) {
            Ok(()) => {
                self.shared.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.shared.failed.fetch_add(1, Ordering::Relaxed);
                let kind = match e {
                    Error::Rotation { .. } => DiagnosticKind::RotationFailed,
                    _ => DiagnosticKind::WriteFailed,
                };
                self.shared.diagnostics.report(Diagnostic::new(
                    kind,
                    Some(self.level),
                    format!("record {}: {}", record.sequence, e),
                ));
            }
        }
    }
}

impl Drop for WriteJob {
    fn drop(&mut self) {
        match self.record.take() {
            Some(record) => self.shared.discard(self.level, record, "worker pool stopped"),
            None => self.shared.in_flight[self.level].done(),
        }
    }
}

/// Builder for a [`Logger`] with a custom clock or diagnostic sink
pub struct LoggerBuilder {
    options: Options,
    clock: Option<Arc<dyn Clock>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl LoggerBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn build(self) -> Result<Logger> {
        let options = self.options.normalize()?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let diagnostics = self.diagnostics.unwrap_or_else(|| Arc::new(StderrSink));

        let files = FileRotationManager::open(
            &options.directory,
            options.level,
            options.max_file_size,
            Arc::clone(&clock),
        )?;
        let rings = LevelMap::from_fn(|level| {
            options
                .level
                .enables(level)
                .then(|| RingBuffer::new(options.ring_buffer_size, options.overflow))
        });
        let records = RecordPool::new(options.pool_capacity, options.pool_capacity);
        let pool = Arc::new(WorkerPool::start(
            "rotalog-writer",
            options.worker_count(),
            Arc::clone(&diagnostics),
        )?);

        let shared = Arc::new(Shared {
            clock,
            diagnostics,
            records,
            rings,
            files,
            gate: RwLock::new(Gate {
                closed: false,
                open: LevelMap::from_fn(|level| options.level.enables(level)),
            }),
            in_flight: LevelMap::default(),
            accepted: AtomicU64::new(0),
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            options,
        });

        let mut senders = LevelMap::default();
        let mut feeders = Vec::new();
        for level in shared.files.enabled_levels() {
            let (tx, rx) = dispatch_queue(shared.options.dispatch_capacity);
            *senders.get_mut(level) = Some(tx);

            let name = format!("rotalog-feed-{}", level);
            let feeder_shared = Arc::clone(&shared);
            let feeder_pool = Arc::clone(&pool);
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || feed_loop(feeder_shared, feeder_pool, level, rx))
                .map_err(|e| Error::io("failed to spawn feeder thread", name, e))?;
            feeders.push(handle);
        }

        let (signal_tx, signal_rx) = bounded(1);
        let drain_shared = Arc::clone(&shared);
        let drain = thread::Builder::new()
            .name("rotalog-drain".to_string())
            .spawn(move || drain_loop(drain_shared, senders, signal_rx))
            .map_err(|e| Error::io("failed to spawn drain thread", "rotalog-drain", e))?;

        Ok(Logger {
            shared,
            pool,
            signals: signal_tx,
            drain: Mutex::new(Some(drain)),
            feeders: Mutex::new(feeders),
        })
    }
}

fn drain_loop(
    shared: Arc<Shared>,
    senders: LevelMap<Option<DispatchSender<PooledRecord>>>,
    signals: Receiver<DrainSignal>,
) {
    let interval = shared.options.drain_interval();
    let mut batch = Vec::with_capacity(DRAIN_BATCH);

    loop {
        if shared.sweep(&senders, &mut batch) > 0 {
            continue;
        }
        match signals.recv_timeout(interval) {
            Ok(DrainSignal::Wake) | Err(RecvTimeoutError::Timeout) => {}
            Ok(DrainSignal::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Admission is closed by now, so this terminates
    while shared.sweep(&senders, &mut batch) > 0 {}
    // Dropping `senders` here lets the feeders run dry and exit
}

fn feed_loop(shared: Arc<Shared>, pool: Arc<WorkerPool>, level: Level, queue: DispatchReceiver<PooledRecord>) {
    for record in queue {
        let job = WriteJob {
            level,
            record: Some(record),
            shared: Arc::clone(&shared),
        };
        // A refused job accounts for itself when dropped
        let _ = pool.submit(job);
    }
}

/// Leveled, rotating file logger.
///
/// `Logger` is `Send + Sync`; share it with `Arc` across producer threads.
pub struct Logger {
    shared: Arc<Shared>,
    pool: Arc<WorkerPool>,
    signals: Sender<DrainSignal>,
    drain: Mutex<Option<JoinHandle<()>>>,
    feeders: Mutex<Vec<JoinHandle<()>>>,
}

impl Logger {
    /// Build a logger with the system clock and a stderr diagnostic sink.
    pub fn new(options: Options) -> Result<Self> {
        Self::builder(options).build()
    }

    pub fn builder(options: Options) -> LoggerBuilder {
        LoggerBuilder {
            options,
            clock: None,
            diagnostics: None,
        }
    }

    /// Queue one record.
    ///
    /// Returns immediately; the write happens on a worker. Records below the
    /// configured level are ignored.
    pub fn log(&self, level: Level, message: &str, source: &str) -> Result<()> {
        let shared = &*self.shared;
        let gate = shared.gate.read();
        if gate.closed {
            return Err(Error::LoggerClosed);
        }
        if !shared.options.level.enables(level) {
            return Ok(());
        }
        if !gate.open[level] {
            return Err(Error::Closed(level));
        }
        let Some(ring) = shared.rings.get(level) else {
            return Ok(());
        };

        let mut record = shared.records.acquire();
        record.fill(level, shared.clock.now(), 0, message, source);

        shared.in_flight[level].add();
        shared.accepted.fetch_add(1, Ordering::Relaxed);
        let evicted = ring.write_with(|sequence| {
            record.sequence = sequence;
            record
        });
        if let Some(evicted) = evicted {
            shared.discard(level, evicted, "evicted by overwrite");
        }
        Ok(())
    }

    pub fn panic(&self, message: &str, source: &str) -> Result<()> {
        self.log(Level::Panic, message, source)
    }

    pub fn fatal(&self, message: &str, source: &str) -> Result<()> {
        self.log(Level::Fatal, message, source)
    }

    pub fn error(&self, message: &str, source: &str) -> Result<()> {
        self.log(Level::Error, message, source)
    }

    pub fn warning(&self, message: &str, source: &str) -> Result<()> {
        self.log(Level::Warning, message, source)
    }

    pub fn info(&self, message: &str, source: &str) -> Result<()> {
        self.log(Level::Info, message, source)
    }

    pub fn debug(&self, message: &str, source: &str) -> Result<()> {
        self.log(Level::Debug, message, source)
    }

    pub fn trace(&self, message: &str, source: &str) -> Result<()> {
        self.log(Level::Trace, message, source)
    }

    fn wake_drain(&self) {
        let _ = self.signals.try_send(DrainSignal::Wake);
    }

    /// Block until every record accepted so far has been written, has
    /// failed, or was evicted.
    pub fn flush(&self) {
        self.wake_drain();
        for (_, in_flight) in self.shared.in_flight.iter() {
            in_flight.wait();
        }
    }

    /// Stop accepting `level`, wait for its in-flight records, then sync and
    /// close its file.
    pub fn close(&self, level: Level) -> Result<()> {
        {
            let mut gate = self.shared.gate.write();
            if gate.closed {
                return Ok(());
            }
            if self.shared.rings.get(level).is_none() {
                return Err(Error::LevelDisabled(level));
            }
            *gate.open.get_mut(level) = false;
        }

        self.wake_drain();
        self.shared.in_flight[level].wait();
        self.shared.files.close(level)
    }

    /// Stop accepting records, write out everything already accepted, stop
    /// the workers and close every file.
    ///
    /// Safe to call more than once; only the first call does any work.
    pub fn close_all(&self) -> Result<()> {
        {
            let mut gate = self.shared.gate.write();
            if gate.closed {
                return Ok(());
            }
            gate.closed = true;
        }

        if let Some(drain) = self.drain.lock().take() {
            let _ = self.signals.send(DrainSignal::Shutdown);
            if drain.join().is_err() {
                self.report_close_failure("drain thread panicked");
            }
        }
        let feeders = std::mem::take(&mut *self.feeders.lock());
        for feeder in feeders {
            if feeder.join().is_err() {
                self.report_close_failure("feeder thread panicked");
            }
        }
        self.pool.stop();

        let result = self.shared.files.close_all();
        if let Err(e) = &result {
            self.report_close_failure(&e.to_string());
        }
        result
    }

    fn report_close_failure(&self, message: &str) {
        self.shared
            .diagnostics
            .report(Diagnostic::new(DiagnosticKind::CloseFailed, None, message));
    }

    pub fn is_closed(&self) -> bool {
        self.shared.gate.read().closed
    }

    /// Most verbose level this logger writes
    pub fn level(&self) -> Level {
        self.shared.options.level
    }

    /// Options after normalization
    pub fn options(&self) -> &Options {
        &self.shared.options
    }

    pub fn directory(&self) -> &Path {
        self.shared.files.root()
    }

    /// Path of `level`'s active file, if the level is enabled
    pub fn current_path(&self, level: Level) -> Option<PathBuf> {
        self.shared.files.current_path(level)
    }

    pub fn stats(&self) -> LoggerStats {
        let shared = &*self.shared;
        LoggerStats {
            accepted: shared.accepted.load(Ordering::Relaxed),
            written: shared.written.load(Ordering::Relaxed),
            failed: shared.failed.load(Ordering::Relaxed),
            dropped: shared.dropped.load(Ordering::Relaxed),
            in_flight: shared.in_flight.iter().map(|(_, f)| f.get()).sum(),
            pooled: shared.records.available(),
            date_rotations: shared.files.date_rotations(),
            size_rotations: shared.files.size_rotations(),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("directory", &self.directory())
            .field("level", &self.level())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let _ = self.close_all();
    }
}
