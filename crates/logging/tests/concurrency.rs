//! Integration tests for concurrent use of one logger.
//!
//! Many threads logging, registering hooks, and changing the configuration
//! at once must never lose, duplicate, or interleave lines.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use logging::{Arg, Logger, RotationPolicy, Severity};
use test_support::{LogDir, SharedBuffer};

const THREADS: usize = 8;
const LINES: usize = 250;

fn shared_logger() -> (Arc<Logger>, SharedBuffer) {
    let buffer = SharedBuffer::new();
    let logger = Logger::builder()
        .writer(buffer.clone())
        .build()
        .expect("build logger");
    (Arc::new(logger), buffer)
}

fn run_threads<F>(body: F)
where
    F: Fn(usize) + Send + Sync + 'static,
{
    let body = Arc::new(body);
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|index| {
            let body = Arc::clone(&body);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                body(index);
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("logging thread panicked");
    }
}

// ============================================================================
// Line Integrity
// ============================================================================

/// Every line from every thread arrives exactly once and whole.
#[test]
fn all_lines_arrive_intact() {
    let (logger, buffer) = shared_logger();
    let worker = Arc::clone(&logger);
    run_threads(move |thread_index| {
        for line_index in 0..LINES {
            worker.infof(
                "thread=%02d line=%04d payload=%s",
                &[
                    Arg::from(thread_index),
                    Arg::from(line_index),
                    Arg::Str("0123456789abcdef"),
                ],
            );
        }
    });

    let messages = buffer.messages();
    assert_eq!(messages.len(), THREADS * LINES);
    let unique: HashSet<_> = messages.iter().collect();
    assert_eq!(unique.len(), THREADS * LINES);
    for message in &messages {
        assert!(message.starts_with("thread="));
        assert!(message.ends_with("payload=0123456789abcdef"));
    }
    assert!(buffer.lines().iter().all(|line| line.starts_with("INFO[")));
}

/// Lines from one thread keep their relative order.
#[test]
fn per_thread_order_is_preserved() {
    let (logger, buffer) = shared_logger();
    let worker = Arc::clone(&logger);
    run_threads(move |thread_index| {
        for line_index in 0..LINES {
            worker.infof("%d %d", &[Arg::from(thread_index), Arg::from(line_index)]);
        }
    });

    let mut last = vec![None::<usize>; THREADS];
    for message in buffer.messages() {
        let (thread, line) = message.split_once(' ').expect("two fields");
        let thread: usize = thread.parse().expect("thread index");
        let line: usize = line.parse().expect("line index");
        if let Some(previous) = last[thread] {
            assert!(line > previous);
        }
        last[thread] = Some(line);
    }
}

// ============================================================================
// Concurrent Configuration
// ============================================================================

/// Hooks see every qualifying call while other threads flip the threshold.
#[test]
fn hooks_and_level_changes_under_load() {
    let (logger, buffer) = shared_logger();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    logger.register_hook(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Severity::Error,
    );

    let worker = Arc::clone(&logger);
    run_threads(move |thread_index| {
        for line_index in 0..LINES {
            if thread_index == 0 && line_index % 10 == 0 {
                let level = if line_index % 20 == 0 {
                    Severity::Warning
                } else {
                    Severity::Info
                };
                worker.set_min_level(level);
            }
            worker.errorf("e%d", &[Arg::from(line_index)]);
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), THREADS * LINES);
    assert_eq!(buffer.lines().len(), THREADS * LINES);
}

/// Registering hooks while other threads log neither deadlocks nor drops lines.
#[test]
fn registration_during_logging() {
    let (logger, buffer) = shared_logger();
    let worker = Arc::clone(&logger);
    run_threads(move |thread_index| {
        for line_index in 0..LINES {
            if line_index % 50 == 0 {
                worker.register_hook(|_| Ok(()), Severity::Fatal);
            }
            worker.warningf("%d/%d", &[Arg::from(thread_index), Arg::from(line_index)]);
        }
    });

    assert_eq!(logger.hooks().len(), THREADS * (LINES / 50));
    assert_eq!(buffer.lines().len(), THREADS * LINES);
}

/// Concurrent logging through a rotating file keeps every line.
#[test]
fn rotation_under_concurrency_keeps_every_line() {
    let dir = LogDir::new();
    let policy = RotationPolicy::new(dir.join("busy.log"))
        .with_max_size(4096)
        .with_compress(false);
    let logger = Arc::new(
        Logger::builder()
            .file(policy)
            .build()
            .expect("build logger"),
    );

    let worker = Arc::clone(&logger);
    run_threads(move |thread_index| {
        for line_index in 0..100 {
            worker.infof("t%02d-l%03d", &[Arg::from(thread_index), Arg::from(line_index)]);
        }
    });
    logger.close().expect("close");

    let mut total = 0;
    for name in dir.file_names() {
        let contents = dir.read(&name);
        for line in contents.lines() {
            assert!(line.starts_with("INFO["), "unexpected line {line:?} in {name}");
            total += 1;
        }
    }
    assert_eq!(total, THREADS * 100);
    assert!(dir.file_names().len() > 1);
}
