// SPDX-License-Identifier: Apache-2.0 OR MIT
// Time source used for record timestamps and date rollover

use chrono::{DateTime, Duration, Local};
use parking_lot::Mutex;

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Calendar date used to name log files (`YYYY-MM-DD`)
    fn today(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}
