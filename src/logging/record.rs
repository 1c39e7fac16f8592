// SPDX-License-Identifier: Apache-2.0 OR MIT
// Log record carried through the pipeline

use chrono::{DateTime, Local};
use std::io::Write;

use super::Level;

/// Timestamp layout used in every written line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One log record.
///
/// Records are recycled through a [`RecordPool`](super::RecordPool), so the
/// string fields keep their capacity between uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub timestamp: DateTime<Local>,
    /// Per-level acceptance order, starting at 0
    pub sequence: u64,
    pub message: String,
    pub source: String,
}

impl LogRecord {
    /// Blank record, as handed out by a fresh pool slot
    pub fn empty() -> Self {
        Self {
            level: Level::default(),
            timestamp: DateTime::<Local>::from(std::time::UNIX_EPOCH),
            sequence: 0,
            message: String::new(),
            source: String::new(),
        }
    }

    pub fn new(level: Level, timestamp: DateTime<Local>, message: &str, source: &str) -> Self {
        let mut record = Self::empty();
        record.fill(level, timestamp, 0, message, source);
        record
    }

    /// Overwrite every field, reusing the existing string buffers
    pub fn fill(
        &mut self,
        level: Level,
        timestamp: DateTime<Local>,
        sequence: u64,
        message: &str,
        source: &str,
    ) {
        self.level = level;
        self.timestamp = timestamp;
        self.sequence = sequence;
        self.message.clear();
        self.message.push_str(message);
        self.source.clear();
        self.source.push_str(source);
    }

    /// Reset to the blank state, keeping allocations
    pub fn clear(&mut self) {
        self.level = Level::default();
        self.sequence = 0;
        self.message.clear();
        self.source.clear();
    }

    /// Write the record as one line: `[<level>] <timestamp> <message>\n`
    pub fn write_line<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(
            out,
            "[{}] {} {}",
            self.level.as_str(),
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.message
        )
    }

    pub fn to_line(&self) -> String {
        let mut line = Vec::with_capacity(self.message.len() + 32);
        // Writing into a Vec cannot fail
        let _ = self.write_line(&mut line);
        String::from_utf8_lossy(&line).into_owned()
    }
}

impl Default for LogRecord {
    fn default() -> Self {
        Self::empty()
    }
}
