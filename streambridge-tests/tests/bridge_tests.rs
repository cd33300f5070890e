// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use streambridge::bridge::dispatcher::{SubmitMode, Submitter};
use streambridge::bridge::host::Host;
use streambridge::bridge::session::{RunSummary, Session};
use streambridge::config::HostConfig;
use streambridge::error::SubmitError;
use streambridge::job_engine::job::JobStatus;
use streambridge_tests::probe::{Probe, ProbeCounter};
use streambridge_tests::test_log::TestLog;

fn host() -> Host {
    streambridge_tests::init_logging();
    Host::new(&HostConfig { worker_threads: 2 }).expect("failed to create host")
}

type SummarySlot = Rc<RefCell<Option<RunSummary>>>;

fn summary_slot() -> (SummarySlot, impl FnOnce(RunSummary)) {
    let slot = Rc::new(RefCell::new(None));
    let s = slot.clone();
    (slot, move |summary: RunSummary| *s.borrow_mut() = Some(summary))
}

fn produce_range(submitter: Submitter<i64>, items: i64) -> JobStatus {
    for i in 0..items {
        if submitter.submit(i, SubmitMode::Blocking).is_err() {
            return JobStatus::Aborted;
        }
    }
    submitter.release();
    JobStatus::Completed
}

#[test]
fn order_is_kept_for_every_queue_depth() {
    for depth in [1, 4, 0] {
        let mut host = host();
        let session = Session::<i64>::new(format!("depth {depth}"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let (summary, on_complete) = summary_slot();

        session
            .start(
                &host.handle(),
                depth,
                |submitter: Submitter<i64>| produce_range(submitter, 500),
                move |v| s.borrow_mut().push(v),
                on_complete,
            )
            .unwrap_or_else(|e| panic!("failed to start with depth {depth}: {e}"));
        host.run();
        host.shutdown();

        assert_eq!(*seen.borrow(), (0..500).collect::<Vec<_>>(), "depth {depth}");
        let summary = summary.borrow_mut().take().expect("completion did not run");
        assert_eq!(summary.status, JobStatus::Completed);
        assert_eq!(summary.report.delivered, 500);
    }
}

#[test]
fn blocking_submit_waits_for_the_owning_thread() {
    let mut host = host();
    let session = Session::<i64>::new("backpressure");
    let (log_tx, log_rx) = mpsc::channel::<TestLog>();

    session
        .start(
            &host.handle(),
            1,
            move |submitter: Submitter<i64>| {
                let mut log = TestLog::default();
                for i in 0..5 {
                    log.timed(i, || submitter.submit(i, SubmitMode::Blocking));
                }
                submitter.release();
                log_tx.send(log).ok();
                JobStatus::Completed
            },
            |_| thread::sleep(Duration::from_millis(30)),
            |_| {},
        )
        .unwrap();
    host.run();

    let log = log_rx.recv().expect("worker did not report its log");
    assert_eq!(log.accepted(), vec![0, 1, 2, 3, 4], "{}", log.to_json());
    assert!(
        log.longest_submit() >= Duration::from_millis(20),
        "producer never waited: {}",
        log.to_json()
    );
}

#[test]
fn non_blocking_submit_reports_back_pressure() {
    let mut host = host();
    let session = Session::<i64>::new("would block");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let (full_tx, full_rx) = mpsc::channel::<usize>();

    session
        .start(
            &host.handle(),
            1,
            move |submitter: Submitter<i64>| {
                let mut full = 0;
                for i in 0..5 {
                    let mut item = i;
                    loop {
                        match submitter.submit(item, SubmitMode::NonBlocking) {
                            Ok(()) => break,
                            Err(SubmitError::WouldBlock(back)) => {
                                full += 1;
                                item = back;
                                thread::sleep(Duration::from_millis(1));
                            }
                            Err(SubmitError::Closing(_)) => return JobStatus::Aborted,
                        }
                    }
                }
                full_tx.send(full).ok();
                JobStatus::Completed
            },
            move |v| {
                s.borrow_mut().push(v);
                thread::sleep(Duration::from_millis(20));
            },
            |_| {},
        )
        .unwrap();
    host.run();

    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4]);
    assert!(full_rx.recv().unwrap() > 0);
}

#[test]
fn teardown_from_inside_the_callback_frees_every_item() {
    let mut host = host();
    let handle = host.handle();
    let session = Session::<Probe>::new("teardown");
    let counter = ProbeCounter::new();
    let calls = Rc::new(Cell::new(0));
    let (summary, on_complete) = summary_slot();

    let worker_counter = counter.clone();
    let c = calls.clone();
    session
        .start(
            &host.handle(),
            1,
            move |submitter: Submitter<Probe>| {
                for i in 0..50 {
                    if let Err(e) = submitter.submit(worker_counter.probe(i), SubmitMode::Blocking) {
                        assert!(e.is_closing());
                        return JobStatus::Aborted;
                    }
                }
                JobStatus::Completed
            },
            move |_probe| {
                c.set(c.get() + 1);
                if c.get() == 3 {
                    handle.begin_teardown();
                }
            },
            on_complete,
        )
        .unwrap();
    host.run();
    host.shutdown();

    assert_eq!(calls.get(), 3);
    assert!(counter.all_freed(), "{} created, {} dropped", counter.created(), counter.dropped());
    let summary = summary.borrow_mut().take().expect("completion did not run");
    assert_eq!(summary.status, JobStatus::Aborted);
    assert_eq!(summary.report.delivered, 3);
    assert!(session.is_idle());
}

#[test]
fn dropping_the_host_mid_run_frees_every_item() {
    let mut host = host();
    let session = Session::<Probe>::new("dropped host");
    let counter = ProbeCounter::new();
    let (started_tx, started_rx) = mpsc::channel::<()>();

    let worker_counter = counter.clone();
    session
        .start(
            &host.handle(),
            2,
            move |submitter: Submitter<Probe>| {
                started_tx.send(()).ok();
                for i in 0..10_000 {
                    if submitter
                        .submit(worker_counter.probe(i), SubmitMode::Blocking)
                        .is_err()
                    {
                        return JobStatus::Aborted;
                    }
                }
                JobStatus::Completed
            },
            |_| {},
            |_| {},
        )
        .unwrap();
    started_rx.recv().unwrap();
    host.run_until_stalled();
    drop(host);

    assert!(counter.created() > 0);
    assert!(counter.all_freed());
}

#[test]
fn completion_observer_can_start_the_next_run() {
    let mut host = host();
    let handle = host.handle();
    let session = Session::<i64>::new("re-entry");
    let seen = Rc::new(RefCell::new(Vec::new()));

    let s = seen.clone();
    let next_session = session.clone();
    let next_seen = seen.clone();
    session
        .start(
            &host.handle(),
            1,
            |submitter: Submitter<i64>| produce_range(submitter, 3),
            move |v| s.borrow_mut().push(v),
            move |_summary: RunSummary| {
                assert!(next_session.is_idle());
                next_session
                    .start(
                        &handle,
                        1,
                        |submitter: Submitter<i64>| produce_range(submitter, 2),
                        move |v| next_seen.borrow_mut().push(v + 100),
                        |_| {},
                    )
                    .expect("the session was not idle inside its completion");
            },
        )
        .unwrap();
    host.run();

    assert_eq!(*seen.borrow(), vec![0, 1, 2, 100, 101]);
    assert_eq!(session.completed_runs(), 2);
    assert!(session.is_idle());
}

#[test]
fn independent_sessions_run_side_by_side() {
    let mut host = host();
    let first = Session::<i64>::new("first");
    let second = Session::<i64>::new("second");
    let a = Rc::new(RefCell::new(Vec::new()));
    let b = Rc::new(RefCell::new(Vec::new()));

    let sa = a.clone();
    first
        .start(
            &host.handle(),
            1,
            |submitter: Submitter<i64>| produce_range(submitter, 100),
            move |v| sa.borrow_mut().push(v),
            |_| {},
        )
        .unwrap();
    let sb = b.clone();
    second
        .start(
            &host.handle(),
            0,
            |submitter: Submitter<i64>| produce_range(submitter, 100),
            move |v| sb.borrow_mut().push(v),
            |_| {},
        )
        .unwrap();
    host.run();

    assert_eq!(*a.borrow(), (0..100).collect::<Vec<_>>());
    assert_eq!(*b.borrow(), (0..100).collect::<Vec<_>>());
    assert!(first.is_idle() && second.is_idle());
}
