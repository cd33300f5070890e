// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! # Design: Cross-Thread Callback Bridge
//!
//! A worker thread produces a stream of items; only the owning thread may call the
//! callback that consumes them.
//!
//! - `Host` is the owning context: a `LocalPool` driven by one thread, plus the work
//!   queue that runs workers elsewhere.
//! - `Dispatcher` binds a callback and owns a bounded channel. Its delivery task on
//!   the host loop pulls items in order and invokes the callback.
//! - Worker threads submit through a `Submitter`, the counted right to submit. The
//!   last release closes the channel; the delivery task drains what is left.
//! - `Session` holds at most one job handle and one dispatcher and resets itself
//!   once the worker returned and the queue is drained.
//!
//! ```text
//!     owning thread                          work queue thread
//!     -------------                          -----------------
//!     Session::start ──────── job ─────────▶ entry_point(submitter)
//!          │                                      │ submit(item, Blocking)
//!          ▼                                      ▼
//!     delivery task ◀──── bounded channel ◀───────┘
//!          │ callback(item)                       │ release()
//!          ▼                                      ▼
//!     completion ◀─────────── JobStatus ──────────┘
//!          └─▶ session back to Idle
//! ```

pub mod dispatcher;
pub mod host;
pub mod marshal;
pub mod session;
