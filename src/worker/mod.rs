// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-size worker pool.
//!
//! Each worker owns a private rendezvous channel. While idle it registers
//! that channel in the pool's idle registry and blocks on it. `submit` pops
//! an idle worker from the registry and hands the job straight to it, so a
//! job never queues behind a busy worker while another one sits idle.
//!
//! `stop` pushes a shutdown token through the registry once per worker. A
//! busy worker only re-registers after its current job, so in-flight jobs
//! always run to completion before the pool winds down.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};
use crate::logging::{Diagnostic, DiagnosticKind, DiagnosticSink};

/// A unit of work run exactly once by one worker
pub trait Job: Send + 'static {
    fn run(self: Box<Self>);
}

impl<F> Job for F
where
    F: FnOnce() + Send + 'static,
{
    fn run(self: Box<Self>) {
        (*self)()
    }
}

enum WorkerMessage {
    Run(Box<dyn Job>),
    Shutdown,
}

type WorkerSlot = Sender<WorkerMessage>;

/// Number of workers used when none is configured
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub struct WorkerPool {
    name: String,
    size: usize,
    idle: Receiver<WorkerSlot>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    stopped: AtomicBool,
    completed: Arc<AtomicU64>,
    panicked: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one) named `<name>-<index>`.
    pub fn start(name: &str, size: usize, diagnostics: Arc<dyn DiagnosticSink>) -> Result<Self> {
        let size = size.max(1);
        // Every worker is registered at most once at a time
        let (idle_tx, idle_rx) = bounded::<WorkerSlot>(size);
        let completed = Arc::new(AtomicU64::new(0));
        let panicked = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::with_capacity(size);
        for id in 0..size {
            let worker = Worker {
                id,
                idle: idle_tx.clone(),
                diagnostics: Arc::clone(&diagnostics),
                completed: Arc::clone(&completed),
                panicked: Arc::clone(&panicked),
            };
            let handle = thread::Builder::new()
                .name(format!("{}-{}", name, id))
                .spawn(move || worker.run())
                .map_err(|e| Error::io("failed to spawn worker thread", name, e))?;
            handles.push(handle);
        }

        Ok(Self {
            name: name.to_string(),
            size,
            idle: idle_rx,
            handles: Mutex::new(handles),
            stopped: AtomicBool::new(false),
            completed,
            panicked,
        })
    }

    /// Hand `job` to the next idle worker, waiting for one if all are busy.
    pub fn submit<J: Job>(&self, job: J) -> Result<()> {
        self.submit_boxed(Box::new(job))
    }

    pub fn submit_boxed(&self, job: Box<dyn Job>) -> Result<()> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(Error::PoolStopped);
        }
        let mut message = WorkerMessage::Run(job);
        // A worker may exit between registering and receiving; try the next one
        loop {
            let slot = self.idle.recv().map_err(|_| Error::PoolStopped)?;
            match slot.send(message) {
                Ok(()) => return Ok(()),
                Err(returned) => message = returned.into_inner(),
            }
        }
    }

    /// Shut every worker down after its current job and wait for them.
    ///
    /// Calling `stop` more than once is harmless.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        for _ in 0..self.size {
            match self.idle.recv() {
                Ok(slot) => {
                    let _ = slot.send(WorkerMessage::Shutdown);
                }
                Err(_) => break,
            }
        }

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = handle.join();
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Jobs run to completion (including ones that panicked)
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    id: usize,
    idle: Sender<WorkerSlot>,
    diagnostics: Arc<dyn DiagnosticSink>,
    completed: Arc<AtomicU64>,
    panicked: Arc<AtomicU64>,
}

impl Worker {
    fn run(self) {
        let (slot_tx, slot_rx) = bounded::<WorkerMessage>(0);

        loop {
            if self.idle.send(slot_tx.clone()).is_err() {
                return;
            }

            match slot_rx.recv() {
                Ok(WorkerMessage::Run(job)) => {
                    if catch_unwind(AssertUnwindSafe(|| job.run())).is_err() {
                        self.panicked.fetch_add(1, Ordering::Relaxed);
                        self.diagnostics.report(Diagnostic::new(
                            DiagnosticKind::JobPanicked,
                            None,
                            format!("job panicked in worker {}", self.id),
                        ));
                    }
                    self.completed.fetch_add(1, Ordering::Relaxed);
                }
                Ok(WorkerMessage::Shutdown) | Err(_) => return,
            }
        }
    }
}
