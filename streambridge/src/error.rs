// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use thiserror::Error;

/// Errors reported synchronously by the bridge and the call surface.
///
/// Failures that happen while a run is executing on a worker thread never show up
/// here; they are reported through the [`JobStatus`](crate::job_engine::job::JobStatus)
/// handed to the completion observer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// A run is already active on this session.
    #[error("a run is already active on this session")]
    AlreadyRunning,

    /// Wrong arity, wrong type or an invalid configuration value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A thread or handle could not be allocated.
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),

    /// The owning context is tearing down and no longer accepts work.
    #[error("the owning context is tearing down")]
    TeardownInProgress,

    /// The dispatcher no longer admits new submitters.
    #[error("the dispatcher is closing")]
    DispatcherClosing,
}

impl BridgeError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        BridgeError::InvalidArgument(msg.into())
    }
}

/// Returned by [`Submitter::submit`](crate::bridge::dispatcher::Submitter::submit).
///
/// The rejected item is handed back, so the caller still owns it and releases it
/// exactly once.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum SubmitError<T> {
    /// The queue is full and the submission was non-blocking.
    #[error("the dispatcher queue is full")]
    WouldBlock(T),

    /// The dispatcher is closing and accepts no more items.
    #[error("the dispatcher is closing")]
    Closing(T),
}

impl<T> SubmitError<T> {
    pub fn into_inner(self) -> T {
        match self {
            SubmitError::WouldBlock(item) | SubmitError::Closing(item) => item,
        }
    }

    pub fn is_closing(&self) -> bool {
        matches!(self, SubmitError::Closing(_))
    }
}
