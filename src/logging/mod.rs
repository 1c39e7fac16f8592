// SPDX-License-Identifier: Apache-2.0 OR MIT
// Leveled logging pipeline
//
// Producers -> per-level RingBuffer -> drain thread -> per-level dispatch
// queue -> feeder -> WorkerPool -> FileRotationManager

mod clock;
mod diagnostic;
mod dispatch;
mod level;
mod logger;
#[macro_use]
mod macros;
mod record;
mod record_pool;
mod ringbuffer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, MemorySink, StderrSink};
pub use dispatch::{dispatch_queue, DispatchReceiver, DispatchSender};
pub use level::{Level, LevelMap};
pub use logger::{Logger, LoggerBuilder, LoggerStats};
pub use record::{LogRecord, TIMESTAMP_FORMAT};
pub use record_pool::{PoolStats, PooledRecord, RecordPool};
pub use ringbuffer::{OverflowPolicy, RingBuffer};
