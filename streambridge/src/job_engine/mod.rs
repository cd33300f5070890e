// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! # Design: Work Queue For Stream Workers
//!
//! ## Overview
//! The owning loop never runs CPU-bound work itself. It hands jobs to a small pool of
//! threads and gets a completion notification back once a job returned.
//!
//! - Jobs are queued in FIFO order on an unbounded channel (no backpressure here;
//!   backpressure lives in the dispatcher each job submits to).
//! - Every thread takes the next job, runs it to the end and reports a `JobStatus`
//!   through a oneshot channel that the owning loop awaits.
//! - A panicking job is caught and reported as `JobStatus::Failed`; the thread keeps
//!   serving the queue.
//! - Closing the queue lets the threads finish what is queued and exit.
//!
//! ```text
//!         +--------------------------------------+
//!         |       Owning loop (single thread)    |
//!         +----------+---------------------------+
//!                    | dispatch          ^ JobStatus (oneshot)
//!                    v                   |
//!         +----------+-----------+       |
//!         |     FIFO job queue   |       |
//!         +----+------+----+-----+       |
//!              |           |             |
//!         +----v----+  +---v----+        |
//!         | thread 0|  |thread 1| -------+
//!         +---------+  +--------+
//! ```

pub mod closure_job;
pub mod job;
