//! Conversions between raw JSON result values and typed values.

use crate::error::ClientError;
use alloy_primitives::{Address, B256, U256};
use bubble_common::quantity_to_u64;
use serde_json::Value;
use std::str::FromStr;

/// Parses a hex quantity into a `u64`.
pub fn to_u64(value: &Value) -> Result<u64, ClientError> {
    quantity_to_u64(value).ok_or_else(|| ClientError::Decode(format!("bad quantity: {value}")))
}

/// Parses a hex quantity into a `U256`.
pub fn to_u256(value: &Value) -> Result<U256, ClientError> {
    match value {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            U256::from_str_radix(digits, 16)
                .map_err(|e| ClientError::Decode(format!("bad quantity {s}: {e}")))
        }
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| ClientError::Decode(format!("bad quantity: {n}"))),
        other => Err(ClientError::Decode(format!("bad quantity: {other}"))),
    }
}

/// Parses a 32-byte hex string.
pub fn to_b256(value: &Value) -> Result<B256, ClientError> {
    let s = value
        .as_str()
        .ok_or_else(|| ClientError::Decode(format!("expected a hash string: {value}")))?;
    B256::from_str(s).map_err(|e| ClientError::Decode(format!("bad hash {s}: {e}")))
}

/// Parses a 20-byte hex string.
pub fn to_address(value: &Value) -> Result<Address, ClientError> {
    let s = value
        .as_str()
        .ok_or_else(|| ClientError::Decode(format!("expected an address string: {value}")))?;
    Address::from_str(s).map_err(|e| ClientError::Decode(format!("bad address {s}: {e}")))
}

/// Decodes a hex string into raw bytes.
pub fn to_bytes(value: &Value) -> Result<Vec<u8>, ClientError> {
    let s = value
        .as_str()
        .ok_or_else(|| ClientError::Decode(format!("expected a hex string: {value}")))?;
    bubble_common::hex_to_bytes(s)
        .ok_or_else(|| ClientError::Decode(format!("bad hex string: {s}")))
}

/// Expects an array result, returning its items.
pub fn to_array(value: Value) -> Result<Vec<Value>, ClientError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(ClientError::Decode(format!("expected an array: {other}"))),
    }
}

/// Renders a `U256` as a JSON number, falling back to its decimal string when
/// the serializer cannot hold it.
pub fn u256_to_value(value: U256) -> Value {
    let decimal = value.to_string();
    match serde_json::Number::from_str(&decimal) {
        Ok(n) => Value::Number(n),
        Err(_) => Value::String(decimal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quantities_parse_from_hex() {
        assert_eq!(to_u64(&json!("0x2a")).unwrap(), 42);
        assert_eq!(to_u256(&json!("0xde0b6b3a7640000")).unwrap(), U256::from(10u64.pow(18)));
        assert!(to_u64(&json!("not hex")).is_err());
    }

    #[test]
    fn oversized_integers_survive_rendering() {
        let huge = U256::MAX;
        let rendered = u256_to_value(huge);
        // arbitrary_precision keeps all digits in a Number.
        assert_eq!(rendered.to_string(), huge.to_string());
    }
}
