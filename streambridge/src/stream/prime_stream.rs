// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use log::debug;

use crate::bridge::dispatcher::{Submit, SubmitMode};
use crate::config::StreamConfig;
use crate::error::BridgeError;
use crate::job_engine::job::JobStatus;
use crate::stream::primes::is_prime;

/// The production loop: search primes from 2 on and report every n-th one.
///
/// Runs on a work queue thread and touches nothing but the submitter it is handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeStream {
    count: u32,
    report_every: u32,
}

impl PrimeStream {
    pub fn new(config: &StreamConfig) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self {
            count: config.count,
            report_every: config.report_every,
        })
    }

    /// Number of items a complete run submits.
    pub fn expected_items(&self) -> u32 {
        self.count / self.report_every
    }

    /// Produce the stream into `sink` and release it before returning.
    pub fn run<S: Submit<i32>>(&self, sink: S) -> JobStatus {
        let status = self.produce(&sink);
        sink.release();
        status
    }

    fn produce<S: Submit<i32>>(&self, sink: &S) -> JobStatus {
        let mut found: u32 = 0;
        let mut candidate: i32 = 1;
        while found < self.count {
            if sink.is_closing() {
                debug!("Dispatcher closing, prime search stops after {found} primes");
                return JobStatus::Aborted;
            }
            candidate = match candidate.checked_add(1) {
                Some(next) => next,
                None => return JobStatus::Failed("ran out of 32-bit candidates".to_string()),
            };
            if !is_prime(candidate.into()) {
                continue;
            }

            found += 1;
            if found % self.report_every == 0 {
                // blocks while the owning thread is behind
                if let Err(e) = sink.submit(candidate, SubmitMode::Blocking) {
                    debug!("Prime {candidate} not submitted: {e}");
                    return if e.is_closing() {
                        JobStatus::Aborted
                    } else {
                        JobStatus::Failed(e.to_string())
                    };
                }
            }
        }
        JobStatus::Completed
    }
}
