// SPDX-License-Identifier: Apache-2.0 OR MIT
//! File rotation through the public `FileRotationManager` API.

use chrono::{Duration, Local, TimeZone};
use rotalog::{Clock, Error, FileRotationManager, Level, LogRecord, ManualClock, SystemClock};
use std::sync::Arc;
use std::thread;

use super::tests::{file_count, lines_in, message_of};

fn record(clock: &dyn Clock, level: Level, message: &str) -> LogRecord {
    LogRecord::new(level, clock.now(), message, "rotation-test")
}

#[test]
fn test_week_of_date_rotation() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(Local.with_ymd_and_hms(2024, 2, 26, 9, 30, 0).unwrap()));
    let manager = FileRotationManager::open(tmp.path(), Level::Warning, 1 << 20, clock.clone()).unwrap();

    for day in 0..7 {
        manager
            .write_record(&record(clock.as_ref(), Level::Warning, &format!("day {}", day)))
            .unwrap();
        clock.advance(Duration::days(1));
    }

    let dir = tmp.path().join("warning");
    assert_eq!(file_count(&dir), 7);
    assert_eq!(manager.date_rotations(), 6);

    // Leap day included
    let leap = std::fs::read_to_string(dir.join("2024-02-29.log")).unwrap();
    assert_eq!(message_of(leap.trim_end()), "day 3");
    assert!(dir.join("2024-03-03.log").is_file());
}

#[test]
fn test_date_then_size_rotation() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(Local.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()));
    let manager = FileRotationManager::open(tmp.path(), Level::Info, 50, clock.clone()).unwrap();

    for i in 0..3 {
        manager
            .write_record(&record(clock.as_ref(), Level::Info, &format!("june first {}", i)))
            .unwrap();
    }
    clock.set(Local.with_ymd_and_hms(2024, 6, 2, 10, 0, 0).unwrap());
    for i in 0..3 {
        manager
            .write_record(&record(clock.as_ref(), Level::Info, &format!("june second {}", i)))
            .unwrap();
    }

    let dir = tmp.path().join("info");
    let names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n == "2024-06-01.log"));
    assert!(names.iter().any(|n| n == "2024-06-02.log"));
    // Backups keep the name of the file they came from
    assert!(names
        .iter()
        .all(|n| n.starts_with("2024-06-01.log") || n.starts_with("2024-06-02.log")));
    assert_eq!(manager.date_rotations(), 1);
    assert!(manager.size_rotations() >= 2);
    assert_eq!(lines_in(&dir).len(), 6);
}

#[test]
fn test_simultaneous_triggers_rotate_once() {
    const THREADS: usize = 8;

    let tmp = tempfile::tempdir().unwrap();
    let manager = Arc::new(FileRotationManager::open(tmp.path(), Level::Error, 64, Arc::new(SystemClock)).unwrap());
    let active = manager.current_path(Level::Error).unwrap();

    // Fill the active file past the limit, then race the first writes
    std::fs::write(&active, "x".repeat(64)).unwrap();
    let barrier = Arc::new(std::sync::Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.write_record(&record(&SystemClock, Level::Error, &format!("t{}", t))).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // The stale content ends up in exactly one backup and no record is lost
    let dir = tmp.path().join("error");
    assert_eq!(file_count(&dir) as u64, manager.size_rotations() + 1);
    let backups_with_original = lines_in(&dir).iter().filter(|l| l.as_str() == "x".repeat(64)).count();
    assert_eq!(backups_with_original, 1);
    let written: Vec<String> = lines_in(&dir)
        .iter()
        .filter(|l| l.starts_with("[error] "))
        .map(|l| message_of(l).to_string())
        .collect();
    assert_eq!(written.len(), THREADS);
}

#[test]
fn test_close_all_and_disabled_levels() {
    let tmp = tempfile::tempdir().unwrap();
    let manager = FileRotationManager::open(tmp.path(), Level::Fatal, 1024, Arc::new(SystemClock)).unwrap();

    assert_eq!(manager.enabled_levels(), vec![Level::Panic, Level::Fatal]);
    assert!(manager.current_path(Level::Error).is_none());
    assert!(matches!(
        manager.close(Level::Error),
        Err(Error::LevelDisabled(Level::Error))
    ));

    manager.close_all().unwrap();
    manager.close_all().unwrap();
    for level in [Level::Panic, Level::Fatal] {
        assert!(!manager.is_open(level));
        assert!(matches!(
            manager.write_record(&record(&SystemClock, level, "late")),
            Err(Error::Closed(_))
        ));
    }
}
