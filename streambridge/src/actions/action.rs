// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::StreamConfig;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Action {
    #[serde(rename = "say-hello")]
    SayHello {
        #[serde(default)]
        args: Vec<Value>,
    },

    #[serde(rename = "get-value")]
    GetValue {
        #[serde(default)]
        args: Vec<Value>,
    },

    #[serde(rename = "print")]
    Print {
        #[serde(default)]
        args: Vec<Value>,
    },

    #[serde(rename = "create-json-object")]
    CreateJsonObject {
        #[serde(default)]
        args: Vec<Value>,
    },

    #[serde(rename = "count-primes")]
    CountPrimes {
        #[serde(default)]
        args: Vec<Value>,
    },

    #[serde(rename = "start-stream")]
    StartStream {
        #[serde(default)]
        config: StreamConfig,
    },
}

impl Action {
    /// Export name and arguments of a synchronous call, `None` for the stream.
    pub fn as_call(&self) -> Option<(&'static str, &[Value])> {
        match self {
            Action::SayHello { args } => Some(("SayHello", args.as_slice())),
            Action::GetValue { args } => Some(("GetValue", args.as_slice())),
            Action::Print { args } => Some(("Print", args.as_slice())),
            Action::CreateJsonObject { args } => Some(("CreateJsonObject", args.as_slice())),
            Action::CountPrimes { args } => Some(("CountPrimes", args.as_slice())),
            Action::StartStream { .. } => None,
        }
    }
}
