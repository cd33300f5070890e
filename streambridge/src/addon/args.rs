// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde_json::Value;

use crate::error::BridgeError;

pub fn expect_arity(args: &[Value], arity: usize, msg: &str) -> Result<(), BridgeError> {
    if args.len() != arity {
        return Err(BridgeError::invalid_argument(format!(
            "{msg}: expected {arity}, got {}",
            args.len()
        )));
    }
    Ok(())
}

pub fn int32_arg(args: &[Value], index: usize) -> Result<i32, BridgeError> {
    args.get(index)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| BridgeError::invalid_argument(format!("parm {}: int32 expected", index + 1)))
}

pub fn string_arg(args: &[Value], index: usize) -> Result<&str, BridgeError> {
    match args.get(index) {
        None => Err(BridgeError::invalid_argument("too few arguments")),
        Some(value) => value
            .as_str()
            .ok_or_else(|| BridgeError::invalid_argument("expected string")),
    }
}
