// SPDX-License-Identifier: Apache-2.0 OR MIT
//! End-to-end tests through the public `Logger` API.

use rotalog::{DiagnosticKind, Error, Level, Logger, MemorySink, Options, OverflowPolicy};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::tests::{file_count, lines_in, message_of};

fn quick(dir: &std::path::Path) -> Options {
    Options::new(dir)
        .with_drain_interval(Duration::from_millis(5))
        .with_max_file_size(1 << 20)
}

#[test]
fn test_info_example_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("t");
    let logger = Logger::builder(Options::new(&root).with_level(Level::Debug))
        .diagnostics(MemorySink::new())
        .build()
        .unwrap();

    logger.info("hello", "main").unwrap();
    logger.close_all().unwrap();

    // Directories exist for every enabled level, and only those
    for level in Level::ALL {
        assert_eq!(root.join(level.as_str()).is_dir(), level <= Level::Debug);
    }

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let content = std::fs::read_to_string(root.join("info").join(format!("{}.log", today))).unwrap();
    assert!(content.starts_with("[info] "));
    assert!(content.ends_with(" hello\n"));
    assert_eq!(content.lines().count(), 1);

    for level in [Level::Panic, Level::Fatal, Level::Error, Level::Warning, Level::Debug] {
        assert!(lines_in(&root.join(level.as_str())).is_empty());
    }
}

#[test]
fn test_concurrent_producers_across_levels() {
    const PRODUCERS: usize = 6;
    const PER_PRODUCER: usize = 300;
    const LEVELS: [Level; 3] = [Level::Error, Level::Info, Level::Debug];

    let tmp = tempfile::tempdir().unwrap();
    let sink = MemorySink::new();
    let logger = Arc::new(
        Logger::builder(quick(tmp.path()).with_workers(3).with_ring_buffer_size(8))
            .diagnostics(sink.clone())
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    let level = LEVELS[i % LEVELS.len()];
                    logger.log(level, &format!("p{}-{}", p, i), "producer").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.close_all().unwrap();

    let mut total = 0;
    for level in LEVELS {
        let lines = lines_in(&tmp.path().join(level.as_str()));
        assert!(lines.iter().all(|l| l.starts_with(&format!("[{}] ", level))));
        total += lines.len();
    }
    assert_eq!(total, PRODUCERS * PER_PRODUCER);

    let stats = logger.stats();
    assert_eq!(stats.accepted, (PRODUCERS * PER_PRODUCER) as u64);
    assert_eq!(stats.written, stats.accepted);
    assert_eq!(stats.in_flight, 0);
    assert!(sink.is_empty());
}

#[test]
fn test_per_producer_order_with_one_worker() {
    let tmp = tempfile::tempdir().unwrap();
    let logger = Arc::new(
        Logger::builder(quick(tmp.path()).with_workers(1))
            .diagnostics(MemorySink::new())
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|p| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..100 {
                    logger.warning(&format!("{} {}", p, i), "producer").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.close_all().unwrap();

    let lines = lines_in(&tmp.path().join("warning"));
    assert_eq!(lines.len(), 400);
    let mut next = [0u32; 4];
    for line in &lines {
        let mut parts = message_of(line).split(' ');
        let p: usize = parts.next().unwrap().parse().unwrap();
        let i: u32 = parts.next().unwrap().parse().unwrap();
        assert_eq!(i, next[p], "producer {} out of order", p);
        next[p] += 1;
    }
}

#[test]
fn test_overwrite_keeps_newest() {
    let tmp = tempfile::tempdir().unwrap();
    let options = Options::new(tmp.path())
        .with_overflow(OverflowPolicy::Overwrite)
        .with_ring_buffer_size(16)
        .with_drain_interval(Duration::from_secs(60))
        .with_workers(1)
        .with_max_file_size(1 << 20);
    let logger = Logger::builder(options)
        .diagnostics(MemorySink::new())
        .build()
        .unwrap();

    for i in 0..1000 {
        logger.trace(&format!("t{}", i), "burst").unwrap();
        logger.info(&format!("i{}", i), "burst").unwrap();
    }
    logger.close_all().unwrap();

    // Trace is above the default level and never admitted
    assert!(!tmp.path().join("trace").exists());

    let stats = logger.stats();
    assert_eq!(stats.accepted, 1000);
    assert_eq!(stats.written + stats.dropped, 1000);

    let lines = lines_in(&tmp.path().join("info"));
    assert!(lines.len() >= 16);
    // The tail that survived is the newest records, still in order
    let tail: Vec<&str> = lines[lines.len() - 16..].iter().map(|l| message_of(l)).collect();
    let expected: Vec<String> = (984..1000).map(|i| format!("i{}", i)).collect();
    assert_eq!(tail, expected);
}

#[test]
fn test_close_level_while_others_continue() {
    let tmp = tempfile::tempdir().unwrap();
    let logger = Logger::builder(quick(tmp.path()))
        .diagnostics(MemorySink::new())
        .build()
        .unwrap();

    for i in 0..20 {
        logger.debug(&format!("d{}", i), "test").unwrap();
    }
    logger.close(Level::Debug).unwrap();
    assert_eq!(lines_in(&tmp.path().join("debug")).len(), 20);
    assert!(matches!(logger.debug("late", "test"), Err(Error::Closed(Level::Debug))));

    logger.error("still fine", "test").unwrap();
    logger.flush();
    assert_eq!(lines_in(&tmp.path().join("error")).len(), 1);

    logger.close_all().unwrap();
    assert!(matches!(logger.error("gone", "test"), Err(Error::LoggerClosed)));
}

#[test]
fn test_drop_closes_logger() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let logger = Logger::builder(Options::new(tmp.path()).with_drain_interval(Duration::from_secs(60)))
            .diagnostics(MemorySink::new())
            .build()
            .unwrap();
        for i in 0..10 {
            logger.fatal(&format!("f{}", i), "test").unwrap();
        }
    }
    assert_eq!(lines_in(&tmp.path().join("fatal")).len(), 10);
}

#[test]
fn test_size_rotation_through_logger() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = MemorySink::new();
    let logger = Logger::builder(
        Options::new(tmp.path())
            .with_max_file_size(200)
            .with_workers(1)
            .with_drain_interval(Duration::from_millis(5)),
    )
    .diagnostics(sink.clone())
    .build()
    .unwrap();

    for i in 0..100 {
        logger.error(&format!("message number {:04}", i), "test").unwrap();
    }
    logger.close_all().unwrap();

    let dir = tmp.path().join("error");
    assert!(file_count(&dir) > 1);
    assert_eq!(file_count(&dir) as u64, logger.stats().size_rotations + 1);

    let mut messages: Vec<String> = lines_in(&dir).iter().map(|l| message_of(l).to_string()).collect();
    messages.sort();
    let expected: Vec<String> = (0..100).map(|i| format!("message number {:04}", i)).collect();
    assert_eq!(messages, expected);
    assert_eq!(sink.count(DiagnosticKind::RotationFailed), 0);
}

#[test]
fn test_options_file_drives_logger() {
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");
    let config = tmp.path().join("rotalog.json5");
    std::fs::write(
        &config,
        format!(
            "{{\n  // only severe records\n  directory: {:?},\n  level: \"error\",\n  workers: 1,\n}}\n",
            logs.to_str().unwrap()
        ),
    )
    .unwrap();

    let options = Options::load_from_file(&config).unwrap();
    let logger = Logger::builder(options)
        .diagnostics(MemorySink::new())
        .build()
        .unwrap();
    assert_eq!(logger.level(), Level::Error);

    logger.warning("filtered", "test").unwrap();
    logger.panic("kept", "test").unwrap();
    logger.close_all().unwrap();

    assert!(!logs.join("warning").exists());
    assert_eq!(lines_in(&logs.join("panic")).len(), 1);
}
