// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use log::debug;
use serde_json::{json, Value};

use super::action::Action;
use crate::addon::exports::Exports;
use crate::addon::Addon;
use crate::bridge::host::Host;
use crate::config::{HostConfig, StreamConfig};
use crate::job_engine::job::JobStatus;

/// Run one JSON encoded action, print its result and return the process exit code.
pub fn handle_cli_action(json: String) -> i32 {
    let action: Action = match serde_json::from_str(&json) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("Error: invalid action JSON: {e}");
            return 2;
        }
    };
    match handle_action(action) {
        Ok(result) => {
            println!("{result}");
            0
        }
        Err(err) => {
            eprintln!("Error handling action: {err:#}");
            2
        }
    }
}

pub fn handle_action(action: Action) -> anyhow::Result<Value> {
    match action {
        Action::StartStream { config } => {
            stream_primes(config, &HostConfig::default(), |prime: &Value| {
                debug!("Received prime from worker thread: {prime}")
            })
        }
        call => {
            let (name, args) = call
                .as_call()
                .context("action is not a synchronous call")?;
            let result = Exports::new()
                .call(name, args)
                .with_context(|| format!("{name} failed"))?;
            Ok(result)
        }
    }
}

/// Run one prime stream on a fresh host and wait for it. `on_prime` sees every
/// delivered prime on the calling thread.
pub fn stream_primes<F>(
    config: StreamConfig,
    host_config: &HostConfig,
    mut on_prime: F,
) -> anyhow::Result<Value>
where
    F: FnMut(&Value) + 'static,
{
    let mut host = Host::new(host_config).context("failed to create the host")?;
    let addon = Addon::init(config).context("invalid stream configuration")?;

    let primes = Rc::new(RefCell::new(Vec::new()));
    let summary = Rc::new(RefCell::new(None));
    let p = primes.clone();
    let s = summary.clone();
    addon
        .start_stream_with_completion(
            &host.handle(),
            move |prime| {
                on_prime(&prime);
                p.borrow_mut().push(prime);
            },
            move |run| *s.borrow_mut() = Some(run),
        )
        .context("failed to start the prime stream")?;

    host.run();
    host.shutdown();

    let run = summary
        .borrow_mut()
        .take()
        .context("the stream run did not complete")?;
    if let JobStatus::Failed(reason) = &run.status {
        anyhow::bail!("stream worker failed: {reason}");
    }
    let primes = std::mem::take(&mut *primes.borrow_mut());
    Ok(json!({
        "job": run.job.id(),
        "status": run.status,
        "report": run.report,
        "primes": primes,
    }))
}
