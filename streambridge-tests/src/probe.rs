// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts how many probes were created and how many were dropped again.
#[derive(Debug, Clone, Default)]
pub struct ProbeCounter {
    created: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

impl ProbeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self, value: u32) -> Probe {
        self.created.fetch_add(1, Ordering::SeqCst);
        Probe {
            value,
            dropped: self.dropped.clone(),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Every probe ever created has been dropped.
    pub fn all_freed(&self) -> bool {
        self.created() == self.dropped()
    }
}

/// Item that reports its own drop.
#[derive(Debug)]
pub struct Probe {
    pub value: u32,
    dropped: Arc<AtomicUsize>,
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}
