// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::RemoteHandle;
use futures::task::LocalSpawnExt;
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::sync::Weak;
use std::thread;

use crate::bridge::dispatcher::Abort;
use crate::config::HostConfig;
use crate::error::BridgeError;
use crate::job_engine::job::{WorkQueue, WorkQueueHandle};

#[derive(Default)]
struct TeardownState {
    tearing_down: Cell<bool>,
    dispatchers: RefCell<Vec<Weak<dyn Abort>>>,
}

/// The owning context: a single-threaded run loop plus the work queue it hands
/// CPU-bound jobs to.
///
/// Every callback runs on the thread that drives [`Host::run`]. The host is not
/// `Send`, so neither are the sessions and callbacks bound to it.
pub struct Host {
    pool: LocalPool,
    handle: HostHandle,
    work_queue: WorkQueue,
    shut_down: bool,
}

/// Cloneable access to a [`Host`] from owning-thread code, including callbacks
/// running on its loop.
#[derive(Clone)]
pub struct HostHandle {
    spawner: LocalSpawner,
    work_queue: WorkQueueHandle,
    teardown: Rc<TeardownState>,
}

impl Host {
    pub fn new(config: &HostConfig) -> Result<Self, BridgeError> {
        config.validate()?;
        let pool = LocalPool::new();
        let work_queue = WorkQueue::new(config.worker_threads)?;
        let handle = HostHandle {
            spawner: pool.spawner(),
            work_queue: work_queue.handle(),
            teardown: Rc::new(TeardownState::default()),
        };
        debug!(
            "Host created with {} work queue threads",
            work_queue.threads()
        );
        Ok(Self {
            pool,
            handle,
            work_queue,
            shut_down: false,
        })
    }

    pub fn handle(&self) -> HostHandle {
        self.handle.clone()
    }

    /// Drive the loop until every spawned task, deliveries and completions
    /// included, has finished.
    pub fn run(&mut self) {
        self.pool.run();
    }

    /// Drive the loop without blocking, as long as tasks make progress.
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Drive the loop until `future` resolves.
    pub fn run_until<F: Future>(&mut self, future: F) -> F::Output {
        self.pool.run_until(future)
    }

    /// Tear down: stop invoking callbacks, abort all live dispatchers, drain their
    /// queues, let pending completions run and join the work queue.
    pub fn shutdown(mut self) {
        self.shutdown_in_place();
    }

    fn shutdown_in_place(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.handle.begin_teardown();
        if thread::panicking() {
            // joining could hang on a worker that never submits again
            self.work_queue.close();
            return;
        }
        self.pool.run();
        self.work_queue.wait_until_finished();
        info!("Host shut down");
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.shutdown_in_place();
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("work_queue", &self.work_queue)
            .field("tearing_down", &self.handle.is_tearing_down())
            .finish()
    }
}

impl HostHandle {
    pub fn is_tearing_down(&self) -> bool {
        self.teardown.tearing_down.get()
    }

    /// Switch the host into teardown. Callbacks are no longer invoked, live
    /// dispatchers are aborted and new runs are rejected. Idempotent.
    pub fn begin_teardown(&self) {
        if self.teardown.tearing_down.replace(true) {
            return;
        }
        let dispatchers: Vec<_> = self.teardown.dispatchers.borrow_mut().drain(..).collect();
        let mut aborted = 0;
        for dispatcher in dispatchers.iter().filter_map(Weak::upgrade) {
            dispatcher.abort();
            aborted += 1;
        }
        info!("Host tearing down, aborted {aborted} live dispatchers");
    }

    pub(crate) fn work_queue(&self) -> &WorkQueueHandle {
        &self.work_queue
    }

    pub(crate) fn spawn_local<F>(&self, future: F) -> Result<(), BridgeError>
    where
        F: Future<Output = ()> + 'static,
    {
        self.spawner.spawn_local(future).map_err(|e| {
            warn!("Failed to spawn on the host loop: {e}");
            BridgeError::TeardownInProgress
        })
    }

    pub(crate) fn spawn_local_with_handle<F>(
        &self,
        future: F,
    ) -> Result<RemoteHandle<F::Output>, BridgeError>
    where
        F: Future + 'static,
    {
        self.spawner.spawn_local_with_handle(future).map_err(|e| {
            warn!("Failed to spawn on the host loop: {e}");
            BridgeError::TeardownInProgress
        })
    }

    pub(crate) fn register_dispatcher(&self, dispatcher: Weak<dyn Abort>) {
        let mut dispatchers = self.teardown.dispatchers.borrow_mut();
        dispatchers.retain(|d| d.strong_count() > 0);
        dispatchers.push(dispatcher);
    }
}
