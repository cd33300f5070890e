// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::collections::BTreeMap;

use log::debug;
use serde_json::Value;

use crate::addon::{speed_test, values};
use crate::error::BridgeError;

/// A synchronous export: takes the call arguments, returns one value.
pub type ExportFn = fn(&[Value]) -> Result<Value, BridgeError>;

/// Named table of the synchronous functions an addon registers.
#[derive(Debug, Clone)]
pub struct Exports {
    functions: BTreeMap<&'static str, ExportFn>,
}

impl Exports {
    pub fn new() -> Self {
        let mut exports = Self {
            functions: BTreeMap::new(),
        };
        exports.define("SayHello", values::say_hello);
        exports.define("GetValue", values::get_value);
        exports.define("Print", values::print);
        exports.define("CreateJsonObject", values::create_json_object);
        exports.define("CountPrimes", speed_test::count_primes_export);
        exports
    }

    pub fn define(&mut self, name: &'static str, function: ExportFn) {
        self.functions.insert(name, function);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, BridgeError> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| BridgeError::invalid_argument(format!("unknown function {name}")))?;
        debug!("Calling {name} with {} arguments", args.len());
        function(args)
    }
}

impl Default for Exports {
    fn default() -> Self {
        Self::new()
    }
}
