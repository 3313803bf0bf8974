//! Normalization between human-friendly parameter values and wire-level ones.
//!
//! Inner-contract parameters arrive as loose JSON values (hex strings,
//! decimal numbers) keyed by field name. Each field has a declared [`ParamType`]
//! in a per-function table; normalization turns the loose value into the exact
//! byte/integer shape the RLP encoder expects, or rejects it before anything
//! is sent.

use alloy_primitives::{hex, U256};
use serde_json::Value;
use std::fmt;

/// Declared wire type of a named parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// 20-byte account address, accepted as a hex string.
    Address,
    /// Raw bytes, accepted as a hex string.
    Bytes,
    /// Unsigned integer, accepted as a JSON number, decimal string or hex
    /// quantity.
    Uint,
    /// UTF-8 text, encoded as its raw bytes.
    Text,
}

/// A parameter value normalized to its wire-level representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    /// Raw bytes (addresses normalize to their 20 bytes).
    Bytes(Vec<u8>),
    /// Unsigned integer.
    Uint(U256),
    /// Absent value, encoded as the empty string.
    Null,
}

/// Rejection produced while normalizing a single parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiError {
    /// Name of the offending parameter.
    pub param: String,
    /// What was wrong with it.
    pub reason: String,
}

impl fmt::Display for AbiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid parameter `{}`: {}", self.param, self.reason)
    }
}

impl std::error::Error for AbiError {}

fn reject(param: &str, reason: impl Into<String>) -> AbiError {
    AbiError { param: param.to_string(), reason: reason.into() }
}

/// Normalizes one named parameter against its declared type.
pub fn normalize(name: &str, ty: ParamType, raw: &Value) -> Result<AbiValue, AbiError> {
    if raw.is_null() {
        return Ok(AbiValue::Null);
    }
    match ty {
        ParamType::Address => {
            let s = raw.as_str().ok_or_else(|| reject(name, "expected a hex address string"))?;
            let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
                .map_err(|e| reject(name, format!("bad hex: {e}")))?;
            if bytes.len() != 20 {
                return Err(reject(name, format!("address must be 20 bytes, got {}", bytes.len())));
            }
            Ok(AbiValue::Bytes(bytes))
        }
        ParamType::Bytes => {
            let s = raw.as_str().ok_or_else(|| reject(name, "expected a hex string"))?;
            let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
                .map_err(|e| reject(name, format!("bad hex: {e}")))?;
            Ok(AbiValue::Bytes(bytes))
        }
        ParamType::Uint => match raw {
            Value::Number(n) => {
                let v = n.as_u64().ok_or_else(|| reject(name, "expected an unsigned integer"))?;
                Ok(AbiValue::Uint(U256::from(v)))
            }
            Value::String(s) => {
                let parsed = if let Some(digits) = s.strip_prefix("0x") {
                    U256::from_str_radix(digits, 16)
                } else {
                    U256::from_str_radix(s, 10)
                };
                parsed.map(AbiValue::Uint).map_err(|e| reject(name, format!("bad integer: {e}")))
            }
            _ => Err(reject(name, "expected an unsigned integer")),
        },
        ParamType::Text => {
            let s = raw.as_str().ok_or_else(|| reject(name, "expected a string"))?;
            Ok(AbiValue::Bytes(s.as_bytes().to_vec()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn address_normalizes_to_twenty_bytes() {
        let addr = "0x00000000000000000000000000000000000000aa";
        let got = normalize("address", ParamType::Address, &json!(addr)).unwrap();
        match got {
            AbiValue::Bytes(b) => {
                assert_eq!(b.len(), 20);
                assert_eq!(b[19], 0xaa);
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn short_address_is_rejected() {
        let err = normalize("address", ParamType::Address, &json!("0x0011")).unwrap_err();
        assert!(err.reason.contains("20 bytes"));
    }

    #[test]
    fn uint_accepts_number_decimal_and_hex() {
        for raw in [json!(42), json!("42"), json!("0x2a")] {
            assert_eq!(
                normalize("amount", ParamType::Uint, &raw).unwrap(),
                AbiValue::Uint(U256::from(42u64))
            );
        }
    }

    #[test]
    fn null_passes_through_for_any_type() {
        for ty in [ParamType::Address, ParamType::Bytes, ParamType::Uint, ParamType::Text] {
            assert_eq!(normalize("x", ty, &Value::Null).unwrap(), AbiValue::Null);
        }
    }
}
