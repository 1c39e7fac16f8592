// SPDX-License-Identifier: Apache-2.0 OR MIT
// Severity levels, most severe first

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// Log severity levels (0-6, lower is more severe)
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Unrecoverable, the caller is about to abort
    Panic = 0,
    /// The process cannot continue
    Fatal = 1,
    /// Something failed and needs attention
    Error = 2,
    /// Unexpected but handled
    Warning = 3,
    /// Normal operational messages
    Info = 4,
    /// Verbose diagnostics
    #[default]
    Debug = 5,
    /// Finer grained than debug
    Trace = 6,
}

const NAMES: [&str; Level::COUNT] = ["panic", "fatal", "error", "warning", "info", "debug", "trace"];

impl Level {
    pub const COUNT: usize = 7;

    /// Every level, most severe first
    pub const ALL: [Level; Level::COUNT] = [
        Level::Panic,
        Level::Fatal,
        Level::Error,
        Level::Warning,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name, also used as the level's directory name
    pub const fn as_str(self) -> &'static str {
        NAMES[self as usize]
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::Panic),
            1 => Some(Level::Fatal),
            2 => Some(Level::Error),
            3 => Some(Level::Warning),
            4 => Some(Level::Info),
            5 => Some(Level::Debug),
            6 => Some(Level::Trace),
            _ => None,
        }
    }

    /// True if a record at `record` passes a threshold of `self`.
    ///
    /// `self` is the most verbose level enabled, so everything at least as
    /// severe as it is accepted.
    #[inline]
    pub const fn enables(self, record: Level) -> bool {
        record as u8 <= self as u8
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered == "warn" {
            return Ok(Level::Warning);
        }
        NAMES
            .iter()
            .position(|name| *name == lowered)
            .and_then(|idx| Level::from_u8(idx as u8))
            .ok_or_else(|| Error::InvalidLevel(s.to_string()))
    }
}

/// Fixed table with one slot per level, indexed by `Level`.
#[derive(Debug, Clone, Default)]
pub struct LevelMap<T> {
    slots: [T; Level::COUNT],
}

impl<T> LevelMap<T> {
    pub fn from_fn(mut f: impl FnMut(Level) -> T) -> Self {
        Self {
            slots: Level::ALL.map(&mut f),
        }
    }

    #[inline]
    pub fn get(&self, level: Level) -> &T {
        &self.slots[level.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, level: Level) -> &mut T {
        &mut self.slots[level.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Level, &T)> {
        Level::ALL.into_iter().zip(self.slots.iter())
    }
}

impl<T> std::ops::Index<Level> for LevelMap<T> {
    type Output = T;

    fn index(&self, level: Level) -> &T {
        self.get(level)
    }
}
