// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod args;
pub mod exports;
pub mod values;

use serde_json::Value;

use crate::bridge::dispatcher::Submitter;
use crate::bridge::host::HostHandle;
use crate::bridge::session::{JobHandle, RunSummary, Session};
use crate::config::StreamConfig;
use crate::error::BridgeError;
use crate::stream::prime_stream::PrimeStream;
use exports::Exports;

/// One registration of the call surface: the synchronous exports plus the prime
/// stream, with its own session.
#[derive(Debug)]
pub struct Addon {
    exports: Exports,
    config: StreamConfig,
    session: Session<i32>,
}

impl Addon {
    pub fn init(config: StreamConfig) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self {
            exports: Exports::new(),
            config,
            session: Session::new("prime stream"),
        })
    }

    pub fn exports(&self) -> &Exports {
        &self.exports
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn session(&self) -> &Session<i32> {
        &self.session
    }

    /// Call a synchronous export by name.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, BridgeError> {
        self.exports.call(name, args)
    }

    /// `StartStream(callback)`: search primes on a worker thread and call `callback`
    /// with every reported prime on the owning thread.
    pub fn start_stream<F>(&self, host: &HostHandle, callback: F) -> Result<JobHandle, BridgeError>
    where
        F: FnMut(Value) + 'static,
    {
        self.start_stream_with_completion(host, callback, |_| {})
    }

    pub fn start_stream_with_completion<F, C>(
        &self,
        host: &HostHandle,
        mut callback: F,
        completion: C,
    ) -> Result<JobHandle, BridgeError>
    where
        F: FnMut(Value) + 'static,
        C: FnOnce(RunSummary) + 'static,
    {
        let worker = PrimeStream::new(&self.config)?;
        self.session.start(
            host,
            self.config.queue_depth,
            move |submitter: Submitter<i32>| worker.run(submitter),
            move |prime: i32| callback(Value::from(prime)),
            completion,
        )
    }
}
