// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Burst demo: several threads log at once into a temporary directory with
//! a small size limit, then the resulting layout is printed.
//!
//! ```text
//! cargo run --example burst -- [threads] [records-per-thread]
//! ```

use anyhow::{anyhow, Result};
use rotalog::{log_error, log_info, log_warning, Logger, Options};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Wait for every producer, failing on the first panic or logging error.
fn join_producers(handles: Vec<JoinHandle<rotalog::Result<()>>>) -> Result<()> {
    let mut first_err = None;
    for (t, handle) in handles.into_iter().enumerate() {
        let outcome = match handle.join() {
            Ok(result) => result.map_err(anyhow::Error::from),
            Err(_) => Err(anyhow!("producer thread-{} panicked", t)),
        };
        if let Err(e) = outcome {
            first_err.get_or_insert(e);
        }
    }
    first_err.map_or(Ok(()), Err)
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let threads: usize = args.next().map(|s| s.parse()).transpose()?.unwrap_or(4);
    let per_thread: usize = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1000);

    let root = std::env::temp_dir().join(format!("rotalog-burst-{}", std::process::id()));
    let logger = Arc::new(Logger::new(Options::new(&root).with_max_file_size(16 * 1024))?);

    let start = Instant::now();
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || -> rotalog::Result<()> {
                let source = format!("thread-{}", t);
                for i in 0..per_thread {
                    match i % 10 {
                        0 => log_error!(logger, &source, "request {} failed", i)?,
                        1 | 2 => log_warning!(logger, &source, "request {} slow", i)?,
                        _ => log_info!(logger, &source, "request {} ok", i)?,
                    }
                }
                Ok(())
            })
        })
        .collect();
    join_producers(handles)?;
    let queued = start.elapsed();
    logger.close_all()?;
    let total = start.elapsed();

    println!("root: {}", root.display());
    for entry in std::fs::read_dir(&root)? {
        let dir = entry?.path();
        let files = std::fs::read_dir(&dir)?.count();
        println!("  {}: {} file(s)", dir.display(), files);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "queued_ms": queued.as_millis() as u64,
            "total_ms": total.as_millis() as u64,
            "stats": logger.stats(),
        }))?
    );
    Ok(())
}
