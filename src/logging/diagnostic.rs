// SPDX-License-Identifier: Apache-2.0 OR MIT
// Diagnostic sinks for faults inside the pipeline
//
// Once a record has been queued its submitter is gone, so write and
// rotation failures are reported here instead of being returned.

use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

use super::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Writing or syncing a record failed
    WriteFailed,
    /// Date or size rotation failed; the record was not written
    RotationFailed,
    /// A record never reached a worker
    RecordDropped,
    /// A job panicked inside a worker
    JobPanicked,
    /// Closing or syncing a file during shutdown failed
    CloseFailed,
}

/// One pipeline fault
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, level: Option<Level>, message: impl Into<String>) -> Self {
        Self {
            kind,
            level,
            message: message.into(),
        }
    }
}

/// Destination for pipeline diagnostics
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Writes each diagnostic to stderr as one JSON object per line
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn report(&self, diagnostic: Diagnostic) {
        let line = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "kind": diagnostic.kind,
            "level": diagnostic.level,
            "message": diagnostic.message,
        });
        let _ = writeln!(std::io::stderr(), "{}", line);
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.lock().clone()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events.lock().iter().filter(|d| d.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        self.events.lock().push(diagnostic);
    }
}
