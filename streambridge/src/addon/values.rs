// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde_json::{json, Value};

use crate::addon::args::string_arg;
use crate::error::BridgeError;

pub const GREETING: &str = "Hello!!! from the native side";
pub const FIXED_VALUE: &str = "native to caller: Hi there !!!";
pub const DEFAULT_NAME: &str = "Default name set by the native function";
/// Longest text `Print` passes on, in bytes.
pub const PRINT_LIMIT: usize = 1021;

/// `SayHello()`
pub fn say_hello(_args: &[Value]) -> Result<Value, BridgeError> {
    println!("{GREETING}");
    Ok(Value::Null)
}

/// `GetValue()`
pub fn get_value(_args: &[Value]) -> Result<Value, BridgeError> {
    Ok(Value::from(FIXED_VALUE))
}

/// `Print(text)`
pub fn print(args: &[Value]) -> Result<Value, BridgeError> {
    let text = truncate_on_char_boundary(string_arg(args, 0)?, PRINT_LIMIT);
    println!("{text} (printed by native function)");
    Ok(Value::Null)
}

/// `CreateJsonObject([name])`
pub fn create_json_object(args: &[Value]) -> Result<Value, BridgeError> {
    let name = args
        .first()
        .cloned()
        .unwrap_or_else(|| Value::from(DEFAULT_NAME));
    Ok(json!({
        "name": name,
        "Hello": "World!",
        "age": 21,
        "salary": 135.89,
        "email": "user@demo.com",
        "description": "The bridge is awesome !!!",
    }))
}

fn truncate_on_char_boundary(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_needs_one_string() {
        assert!(matches!(
            print(&[]),
            Err(BridgeError::InvalidArgument(msg)) if msg == "too few arguments"
        ));
        assert!(matches!(
            print(&[json!(42)]),
            Err(BridgeError::InvalidArgument(msg)) if msg == "expected string"
        ));
        assert_eq!(print(&[json!("hello")]), Ok(Value::Null));
    }

    #[test]
    fn long_text_is_cut_to_the_print_buffer() {
        // 1024 byte buffer, 1022 passed as its size, one byte kept for the terminator
        assert_eq!(PRINT_LIMIT, 1021);
        let ascii = "x".repeat(2000);
        assert_eq!(truncate_on_char_boundary(&ascii, PRINT_LIMIT).len(), 1021);
        assert_eq!(truncate_on_char_boundary(&ascii[..1021], PRINT_LIMIT).len(), 1021);
        assert_eq!(truncate_on_char_boundary(&ascii[..1022], PRINT_LIMIT).len(), 1021);
        assert!(truncate_on_char_boundary("abc", PRINT_LIMIT) == "abc");
    }

    #[test]
    fn long_text_is_cut_on_a_char_boundary() {
        // byte 1021 falls inside the 511th "ä"
        let text = "ä".repeat(600);
        assert_eq!(truncate_on_char_boundary(&text, PRINT_LIMIT).len(), PRINT_LIMIT - 1);

        let odd = format!("a{}", "ä".repeat(600));
        assert_eq!(truncate_on_char_boundary(&odd, PRINT_LIMIT).len(), PRINT_LIMIT);
    }

    #[test]
    fn json_object_has_a_fixed_shape() {
        let object = create_json_object(&[]).unwrap();
        let keys: Vec<&str> = object
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        for key in ["name", "Hello", "age", "salary", "email", "description"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(object["name"], json!(DEFAULT_NAME));
        assert_eq!(object["age"], json!(21));
        assert_eq!(object["salary"], json!(135.89));
    }

    #[test]
    fn json_object_takes_the_name_argument() {
        let object = create_json_object(&[json!("Ada")]).unwrap();
        assert_eq!(object["name"], json!("Ada"));
    }

    #[test]
    fn fixed_value_and_greeting() {
        assert_eq!(get_value(&[]), Ok(json!(FIXED_VALUE)));
        assert_eq!(say_hello(&[]), Ok(Value::Null));
    }
}
