// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Number of primes the stream worker searches for, starting at 2.
pub const DEFAULT_PRIME_COUNT: u32 = 10_000;
/// Every n-th prime found is sent to the callback.
pub const DEFAULT_REPORT_EVERY: u32 = 1_000;
/// One item in flight at a time.
pub const DEFAULT_QUEUE_DEPTH: usize = 1;
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Parameters of one prime stream run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub count: u32,
    pub report_every: u32,
    /// Depth of the dispatcher queue. `0` means unbounded.
    pub queue_depth: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_PRIME_COUNT,
            report_every: DEFAULT_REPORT_EVERY,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.report_every == 0 {
            return Err(BridgeError::invalid_argument(
                "report_every must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Settings of the owning context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Threads of the work queue that runs stream workers.
    pub worker_threads: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.worker_threads == 0 {
            return Err(BridgeError::invalid_argument(
                "worker_threads must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(StreamConfig::default().validate().is_ok());
        assert!(HostConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_stride_is_rejected() {
        let config = StreamConfig {
            report_every: 0,
            ..StreamConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BridgeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: StreamConfig = serde_json::from_str(r#"{"count": 50}"#).unwrap();
        assert_eq!(config.count, 50);
        assert_eq!(config.report_every, DEFAULT_REPORT_EVERY);
        assert_eq!(config.queue_depth, DEFAULT_QUEUE_DEPTH);
    }
}
