// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use futures::channel::oneshot;
use log::{debug, info, warn};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use crate::bridge::dispatcher::{Dispatcher, Submitter};
use crate::bridge::host::HostHandle;
use crate::bridge::marshal::DeliveryReport;
use crate::error::BridgeError;
use crate::job_engine::closure_job::ClosureJob;
use crate::job_engine::job::JobStatus;

/// Where a session is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Starting,
    Running,
    /// Running, and at least one item reached the callback.
    Delivering,
    Completing,
}

/// Token of one queued or running job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    id: u64,
    desc: String,
    queued_at: Instant,
}

impl JobHandle {
    fn new(id: u64, desc: String) -> Self {
        Self {
            id,
            desc,
            queued_at: Instant::now(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn queued_at(&self) -> Instant {
        self.queued_at
    }
}

/// Handed to the completion observer once a run is over.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub job: JobHandle,
    pub status: JobStatus,
    pub report: DeliveryReport,
}

struct SessionState<T> {
    state: RunState,
    active_job: Option<JobHandle>,
    active_dispatcher: Option<Dispatcher<T>>,
    next_job_id: u64,
    completed_runs: u64,
}

/// Per-registration state that allows at most one run at a time.
///
/// Lives on the owning thread only. The worker never sees the session; it only
/// gets the [`Submitter`] it was handed at spawn.
pub struct Session<T> {
    name: Rc<str>,
    inner: Rc<RefCell<SessionState<T>>>,
}

impl<T> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> Session<T> {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: name.into(),
            inner: Rc::new(RefCell::new(SessionState {
                state: RunState::Idle,
                active_job: None,
                active_dispatcher: None,
                next_job_id: 0,
                completed_runs: 0,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RunState {
        self.inner.borrow().state
    }

    pub fn is_idle(&self) -> bool {
        self.state() == RunState::Idle
    }

    pub fn active_job(&self) -> Option<JobHandle> {
        self.inner.borrow().active_job.clone()
    }

    pub fn has_active_dispatcher(&self) -> bool {
        self.inner.borrow().active_dispatcher.is_some()
    }

    /// Submitter count of the active dispatcher, if there is one.
    pub fn dispatcher_submitters(&self) -> Option<usize> {
        self.inner
            .borrow()
            .active_dispatcher
            .as_ref()
            .map(Dispatcher::submitters)
    }

    pub fn completed_runs(&self) -> u64 {
        self.inner.borrow().completed_runs
    }

    /// Start a run.
    ///
    /// Binds `callback` to a new dispatcher with the given queue depth (0 means
    /// unbounded), queues `entry_point` on the host's work queue with the submitter
    /// acquired on its behalf, and returns without waiting. `completion` runs on
    /// the owning thread after the entry point returned and every item was
    /// delivered or discarded, with the session already back to idle.
    pub fn start<E, F, C>(
        &self,
        host: &HostHandle,
        queue_depth: usize,
        entry_point: E,
        callback: F,
        completion: C,
    ) -> Result<JobHandle, BridgeError>
    where
        E: FnOnce(Submitter<T>) -> JobStatus + Send + 'static,
        F: FnMut(T) + 'static,
        C: FnOnce(RunSummary) + 'static,
    {
        if let Some(active) = &self.inner.borrow().active_job {
            warn!(
                "{}: start rejected, job {} is still active",
                self.name, active.id
            );
            return Err(BridgeError::AlreadyRunning);
        }
        if host.is_tearing_down() {
            return Err(BridgeError::TeardownInProgress);
        }

        let job = {
            let mut inner = self.inner.borrow_mut();
            inner.next_job_id += 1;
            let job = JobHandle::new(
                inner.next_job_id,
                format!("{} run {}", self.name, inner.next_job_id),
            );
            inner.active_job = Some(job.clone());
            inner.state = RunState::Starting;
            job
        };

        match self.launch(host, &job, queue_depth, entry_point, callback, completion) {
            Ok(()) => {
                debug!("{}: queued", job.desc);
                Ok(job)
            }
            Err(e) => {
                warn!("{}: failed to start: {e}", job.desc);
                self.reset();
                Err(e)
            }
        }
    }

    fn launch<E, F, C>(
        &self,
        host: &HostHandle,
        job: &JobHandle,
        queue_depth: usize,
        entry_point: E,
        mut callback: F,
        completion: C,
    ) -> Result<(), BridgeError>
    where
        E: FnOnce(Submitter<T>) -> JobStatus + Send + 'static,
        F: FnMut(T) + 'static,
        C: FnOnce(RunSummary) + 'static,
    {
        let session = self.clone();
        let (dispatcher, submitter) =
            Dispatcher::create(host, job.desc.clone(), queue_depth, move |item: T| {
                session.mark_delivering();
                callback(item);
            })?;

        let task = ClosureJob::new(
            job.desc.clone(),
            Box::new(move || entry_point(submitter)),
        );
        let done = match host.work_queue().dispatch(Box::new(task)) {
            Ok(done) => done,
            Err(e) => {
                // the dropped job took its submitter with it
                dispatcher.abort();
                return Err(e);
            }
        };

        {
            let mut inner = self.inner.borrow_mut();
            inner.active_dispatcher = Some(dispatcher);
            inner.state = RunState::Running;
        }

        host.spawn_local(self.clone().complete(job.clone(), done, completion))
    }

    async fn complete<C>(self, job: JobHandle, done: oneshot::Receiver<JobStatus>, completion: C)
    where
        C: FnOnce(RunSummary),
    {
        let status = done
            .await
            .unwrap_or_else(|_| JobStatus::Failed("the work queue dropped the job".to_string()));

        let drained = {
            let mut inner = self.inner.borrow_mut();
            inner.state = RunState::Completing;
            inner.active_dispatcher.as_mut().map(|dispatcher| {
                let submitters = dispatcher.submitters();
                if submitters != 0 {
                    // someone kept a submitter beyond the worker, nothing more is delivered
                    warn!(
                        "{}: {submitters} submitters still acquired after the worker returned",
                        job.desc
                    );
                    dispatcher.abort();
                }
                dispatcher.drained()
            })
        };
        let report = match drained {
            Some(drained) => drained.await,
            None => DeliveryReport::default(),
        };

        {
            let mut inner = self.inner.borrow_mut();
            inner.active_dispatcher = None;
            inner.active_job = None;
            inner.state = RunState::Idle;
            inner.completed_runs += 1;
        }
        info!(
            "{}: finished with {:?}, {} delivered, {} discarded",
            job.desc, status, report.delivered, report.discarded
        );

        completion(RunSummary {
            job,
            status,
            report,
        });
    }

    fn mark_delivering(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.state == RunState::Running {
            inner.state = RunState::Delivering;
        }
    }

    fn reset(&self) {
        let dispatcher = {
            let mut inner = self.inner.borrow_mut();
            inner.active_job = None;
            inner.state = RunState::Idle;
            inner.active_dispatcher.take()
        };
        if let Some(dispatcher) = dispatcher {
            dispatcher.abort();
        }
    }
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("state", &inner.state)
            .field("active_job", &inner.active_job)
            .finish()
    }
}
