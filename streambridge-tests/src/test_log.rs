// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggedSubmit {
    pub value: i64,

    pub submit_nsec: u64,

    pub accepted: bool,
}

/// What a worker saw while submitting. Dumped as JSON when an assertion fails.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct TestLog {
    pub submits: Vec<LoggedSubmit>,
}

impl TestLog {
    /// Time `submit` and record its outcome.
    pub fn timed<E>(&mut self, value: i64, submit: impl FnOnce() -> Result<(), E>) -> bool {
        let started = Instant::now();
        let accepted = submit().is_ok();
        let elapsed = started.elapsed();
        self.submits.push(LoggedSubmit {
            value,
            submit_nsec: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            accepted,
        });
        accepted
    }

    pub fn longest_submit(&self) -> Duration {
        self.submits
            .iter()
            .map(|s| Duration::from_nanos(s.submit_nsec))
            .max()
            .unwrap_or_default()
    }

    pub fn accepted(&self) -> Vec<i64> {
        self.submits
            .iter()
            .filter(|s| s.accepted)
            .map(|s| s.value)
            .collect()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("unprintable log: {e}"))
    }
}
