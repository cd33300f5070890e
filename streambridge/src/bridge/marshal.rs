// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use async_channel::Receiver;
use log::debug;
use serde::Serialize;

use crate::bridge::host::HostHandle;

/// What happened to the items of one dispatcher.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Items handed to the callback.
    pub delivered: u64,
    /// Items released without a callback because the host was tearing down.
    pub discarded: u64,
}

/// The delivery task of a dispatcher. Runs on the host loop until the queue is
/// closed and empty.
pub(crate) async fn deliver<T, F>(
    desc: String,
    rx: Receiver<T>,
    mut callback: F,
    host: HostHandle,
) -> DeliveryReport
where
    F: FnMut(T),
{
    debug!("{desc}: delivery started");
    let mut report = DeliveryReport::default();
    while let Ok(item) = rx.recv().await {
        if host.is_tearing_down() {
            // no callback while the owning context goes away, the item is still freed
            drop(item);
            report.discarded += 1;
            continue;
        }
        callback(item);
        report.delivered += 1;
    }
    if report.discarded > 0 {
        debug!(
            "{desc}: discarded {} items during teardown",
            report.discarded
        );
    }
    debug!(
        "{desc}: delivery ended after {} items, channel closed",
        report.delivered
    );
    report
}
