// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use async_channel::{Receiver, Sender};
use futures::channel::oneshot;
use log::{debug, warn};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::error::BridgeError;

/// How a job ended. Reported back to the owning thread once the job returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    /// The job ran to its natural end.
    Completed,
    /// The job stopped early because its dispatcher was closing.
    Aborted,
    /// The job panicked or was dropped before it could run.
    Failed(String),
}

impl JobStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, JobStatus::Failed(_))
    }
}

pub trait Job: Send + 'static {
    /// Free-form description, used for logging or debugging
    fn desc(&self) -> &str;

    /// Main entry point, runs on a work queue thread
    fn execute(self: Box<Self>) -> JobStatus;
}

impl std::fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("desc", &self.desc()).finish()
    }
}

struct QueuedJob {
    job: Box<dyn Job>,
    done: oneshot::Sender<JobStatus>,
}

/// Pool of threads that runs jobs off the owning thread.
///
/// Jobs are taken in FIFO order. Each dispatched job yields a receiver that resolves
/// with its [`JobStatus`] after the job returned, which lets the owning thread run
/// the completion strictly afterwards.
pub struct WorkQueue {
    thread_handles: Vec<JoinHandle<()>>,
    handle: WorkQueueHandle,
}

/// Cloneable sending side of a [`WorkQueue`].
#[derive(Clone)]
pub struct WorkQueueHandle {
    tx: Sender<QueuedJob>,
}

impl WorkQueue {
    pub fn new(threads: usize) -> Result<Self, BridgeError> {
        if threads == 0 {
            return Err(BridgeError::invalid_argument(
                "a work queue needs at least one thread",
            ));
        }
        let (tx, rx) = async_channel::unbounded();

        let mut thread_handles = Vec::with_capacity(threads);
        for index in 0..threads {
            let rx_in_thread: Receiver<QueuedJob> = rx.clone();
            let spawned = thread::Builder::new()
                .name(format!("streambridge-worker-{index}"))
                .spawn(move || work_queue_loop(index, rx_in_thread));
            match spawned {
                Ok(thread_handle) => thread_handles.push(thread_handle),
                Err(e) => {
                    // the threads spawned so far exit once the channel is closed
                    tx.close();
                    return Err(BridgeError::ResourceExhaustion(format!(
                        "failed to spawn work queue thread {index}: {e}"
                    )));
                }
            }
        }

        Ok(Self {
            thread_handles,
            handle: WorkQueueHandle { tx },
        })
    }

    pub fn handle(&self) -> WorkQueueHandle {
        self.handle.clone()
    }

    pub fn dispatch(&self, job: Box<dyn Job>) -> Result<oneshot::Receiver<JobStatus>, BridgeError> {
        self.handle.dispatch(job)
    }

    pub fn threads(&self) -> usize {
        self.thread_handles.len()
    }

    /// Stop accepting jobs. Jobs already queued still run.
    pub fn close(&mut self) {
        if self.handle.tx.close() {
            debug!("Work queue closed");
        }
    }

    pub fn wait_until_finished(&mut self) {
        self.close();
        for thread_handle in self.thread_handles.drain(..) {
            if thread_handle.join().is_err() {
                warn!("A work queue thread ended with a panic");
            }
        }
        debug!("All work queue threads joined");
    }
}

impl std::fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("threads", &self.thread_handles.len())
            .field("queued", &self.handle.tx.len())
            .field("closed", &self.handle.tx.is_closed())
            .finish()
    }
}

impl WorkQueueHandle {
    /// Queue a job. Fails with [`BridgeError::TeardownInProgress`] once the queue is closed.
    pub fn dispatch(&self, job: Box<dyn Job>) -> Result<oneshot::Receiver<JobStatus>, BridgeError> {
        let (done, done_rx) = oneshot::channel();
        debug!("Queueing job: {}", job.desc());
        // unbounded, so this only fails on a closed queue
        self.tx
            .try_send(QueuedJob { job, done })
            .map_err(|_| BridgeError::TeardownInProgress)?;
        Ok(done_rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The loop of a single work queue thread.
fn work_queue_loop(index: usize, rx: Receiver<QueuedJob>) {
    debug!("Starting work queue thread {index}");
    while let Ok(QueuedJob { job, done }) = rx.recv_blocking() {
        let desc = job.desc().to_string();
        debug!("Executing job: {desc}");
        let status = panic::catch_unwind(AssertUnwindSafe(|| job.execute()))
            .unwrap_or_else(|payload| JobStatus::Failed(panic_message(payload.as_ref())));
        if let JobStatus::Failed(reason) = &status {
            warn!("Job {desc} failed: {reason}");
        }
        if done.send(status).is_err() {
            debug!("Nobody waits for the completion of {desc}");
        }
    }
    debug!("Work queue thread {index} ended, channel closed");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("worker panicked: {msg}")
    } else {
        "worker panicked".to_string()
    }
}
