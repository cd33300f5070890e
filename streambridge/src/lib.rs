// SPDX-License-Identifier: MIT
// streambridge: hand results of blocking worker threads back to a single owning thread
//
// - Jobs run on a small pool of work queue threads.
// - Their results travel through a bounded channel and are delivered, in order,
//   on the thread that owns the host event loop.
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod actions;
pub mod addon;
pub mod bridge;
pub mod config;
pub mod error;
pub mod job_engine;
pub mod stream;
