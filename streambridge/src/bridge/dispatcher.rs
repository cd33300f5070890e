// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use async_channel::{SendError, Sender, TrySendError};
use futures::future::RemoteHandle;
use log::debug;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::bridge::host::HostHandle;
use crate::bridge::marshal::{self, DeliveryReport};
use crate::error::{BridgeError, SubmitError};

/// How a submission behaves when the dispatcher queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Suspend the calling thread until there is room.
    Blocking,
    /// Fail with [`SubmitError::WouldBlock`] right away.
    NonBlocking,
}

/// Counts the threads that may submit to a dispatcher.
///
/// The count only goes down through [`RefLedger::release`]. Once it hits zero the
/// ledger is closing for good: no new acquisitions, no further releases.
#[derive(Debug)]
pub struct RefLedger {
    submitters: usize,
    closing: bool,
}

impl RefLedger {
    /// A ledger with `initial` references already acquired.
    pub fn new(initial: usize) -> Self {
        Self {
            submitters: initial,
            closing: initial == 0,
        }
    }

    pub fn acquire(&mut self) -> Result<(), BridgeError> {
        if self.closing {
            return Err(BridgeError::DispatcherClosing);
        }
        self.submitters += 1;
        Ok(())
    }

    /// Returns true if this release brought the count to zero.
    ///
    /// # Panics
    /// On a release without a matching acquire.
    pub fn release(&mut self) -> bool {
        assert!(
            self.submitters > 0,
            "dispatcher released more often than it was acquired"
        );
        self.submitters -= 1;
        if self.submitters == 0 {
            self.closing = true;
            return true;
        }
        false
    }

    /// Stop admitting submitters without touching the count.
    pub fn close(&mut self) {
        self.closing = true;
    }

    pub fn submitters(&self) -> usize {
        self.submitters
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }
}

/// Anything the worker protocol can submit to. Implemented by [`Submitter`] and by
/// test doubles.
pub trait Submit<T> {
    fn submit(&self, item: T, mode: SubmitMode) -> Result<(), SubmitError<T>>;

    fn is_closing(&self) -> bool;

    /// Give up the right to submit. Must be the last call on this submitter.
    fn release(self)
    where
        Self: Sized;
}

/// Forced shutdown of a dispatcher, used by the host on teardown.
pub(crate) trait Abort {
    fn abort(&self);
}

struct Shared<T> {
    desc: String,
    tx: Sender<T>,
    ledger: Mutex<RefLedger>,
    closing: AtomicBool,
}

impl<T> Shared<T> {
    fn lock_ledger(&self) -> MutexGuard<'_, RefLedger> {
        // a poisoned ledger still holds a consistent count
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn release(&self) {
        let reached_zero = self.lock_ledger().release();
        if reached_zero {
            debug!("{}: last submitter released, closing", self.desc);
            self.close_queue();
        }
    }

    fn close_queue(&self) {
        self.closing.store(true, Ordering::SeqCst);
        // queued items stay receivable, blocked senders wake up with an error
        self.tx.close();
    }
}

impl<T> Abort for Shared<T> {
    fn abort(&self) {
        self.lock_ledger().close();
        if !self.closing.swap(true, Ordering::SeqCst) {
            debug!("{}: aborted", self.desc);
        }
        self.tx.close();
    }
}

/// Thread-safe bridge from worker threads to a callback on the owning thread.
///
/// The dispatcher itself stays on the owning thread. Worker threads hold a
/// [`Submitter`], which is the counted right to submit. Items are queued on a
/// channel and replayed by a delivery task on the host loop, in submission order.
pub struct Dispatcher<T> {
    shared: Arc<Shared<T>>,
    queue_depth: usize,
    delivery: Option<RemoteHandle<DeliveryReport>>,
}

impl<T: Send + 'static> Dispatcher<T> {
    /// Bind `callback` and spawn its delivery task on the host loop.
    ///
    /// A `queue_depth` of 0 means unbounded. The returned [`Submitter`] is the
    /// reference acquired on behalf of the thread that is going to produce items.
    pub fn create<F>(
        host: &HostHandle,
        desc: impl Into<String>,
        queue_depth: usize,
        callback: F,
    ) -> Result<(Self, Submitter<T>), BridgeError>
    where
        F: FnMut(T) + 'static,
    {
        if host.is_tearing_down() {
            return Err(BridgeError::TeardownInProgress);
        }
        let desc = desc.into();
        let (tx, rx) = if queue_depth == 0 {
            async_channel::unbounded()
        } else {
            async_channel::bounded(queue_depth)
        };

        let shared = Arc::new(Shared {
            desc: desc.clone(),
            tx,
            ledger: Mutex::new(RefLedger::new(1)),
            closing: AtomicBool::new(false),
        });

        let delivery = host.spawn_local_with_handle(marshal::deliver(
            desc.clone(),
            rx,
            callback,
            host.clone(),
        ))?;
        let weak: Weak<dyn Abort> = Arc::downgrade(&shared) as Weak<dyn Abort>;
        host.register_dispatcher(weak);
        debug!("{desc}: dispatcher created with queue depth {queue_depth}");

        let submitter = Submitter {
            shared: shared.clone(),
            released: false,
        };
        Ok((
            Self {
                shared,
                queue_depth,
                delivery: Some(delivery),
            },
            submitter,
        ))
    }
}

impl<T> Dispatcher<T> {
    /// Register one more submitting thread.
    pub fn acquire(&self) -> Result<Submitter<T>, BridgeError> {
        self.shared.lock_ledger().acquire()?;
        Ok(Submitter {
            shared: self.shared.clone(),
            released: false,
        })
    }

    pub fn submitters(&self) -> usize {
        self.shared.lock_ledger().submitters()
    }

    pub fn is_closing(&self) -> bool {
        self.shared.closing.load(Ordering::SeqCst)
    }

    pub fn queue_depth(&self) -> usize {
        self.queue_depth
    }

    /// Items queued but not yet pulled by the delivery task.
    pub fn queued(&self) -> usize {
        self.shared.tx.len()
    }

    pub fn desc(&self) -> &str {
        &self.shared.desc
    }

    /// Close regardless of outstanding submitters. Queued items are still drained.
    pub fn abort(&self) {
        self.shared.abort();
    }

    /// Resolves once every queued item was delivered or discarded and the queue is
    /// closed. Only the first call observes the delivery task.
    pub fn drained(&mut self) -> impl Future<Output = DeliveryReport> + 'static {
        let delivery = self.delivery.take();
        async move {
            match delivery {
                Some(delivery) => delivery.await,
                None => DeliveryReport::default(),
            }
        }
    }
}

impl<T> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("desc", &self.shared.desc)
            .field("queue_depth", &self.queue_depth)
            .field("queued", &self.shared.tx.len())
            .field("closing", &self.is_closing())
            .finish()
    }
}

/// The counted right of one thread to submit items to a [`Dispatcher`].
///
/// Releasing happens exactly once: either through [`Submitter::release`] or when
/// the submitter is dropped, which also covers early returns and panics.
pub struct Submitter<T> {
    shared: Arc<Shared<T>>,
    released: bool,
}

impl<T> Submitter<T> {
    pub fn submit(&self, item: T, mode: SubmitMode) -> Result<(), SubmitError<T>> {
        if self.shared.closing.load(Ordering::SeqCst) {
            return Err(SubmitError::Closing(item));
        }
        match mode {
            SubmitMode::Blocking => self
                .shared
                .tx
                .send_blocking(item)
                .map_err(|SendError(item)| SubmitError::Closing(item)),
            SubmitMode::NonBlocking => self.shared.tx.try_send(item).map_err(|e| match e {
                TrySendError::Full(item) => SubmitError::WouldBlock(item),
                TrySendError::Closed(item) => SubmitError::Closing(item),
            }),
        }
    }

    pub fn is_closing(&self) -> bool {
        self.shared.closing.load(Ordering::SeqCst)
    }

    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.shared.release();
        }
    }
}

impl<T> Submit<T> for Submitter<T> {
    fn submit(&self, item: T, mode: SubmitMode) -> Result<(), SubmitError<T>> {
        Submitter::submit(self, item, mode)
    }

    fn is_closing(&self) -> bool {
        Submitter::is_closing(self)
    }

    fn release(self) {
        Submitter::release(self)
    }
}

impl<T> Drop for Submitter<T> {
    fn drop(&mut self) {
        if !self.released {
            debug!("{}: submitter released on drop", self.shared.desc);
            self.release_once();
        }
    }
}

impl<T> std::fmt::Debug for Submitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submitter")
            .field("desc", &self.shared.desc)
            .field("released", &self.released)
            .finish()
    }
}
