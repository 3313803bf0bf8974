//! The RLP call/event codec for inner contracts.
//!
//! A call encodes as a nested list: the function identifier and every
//! parameter are RLP-encoded independently, in declaration order, and the
//! resulting byte-strings are wrapped in one outer RLP list. Event payloads
//! are the same shape in reverse: an outer list of byte-strings whose first
//! element is the status code and whose tail holds the RLP-encoded positional
//! arguments.

use super::formatters::{param_abis, DEFAULT_PARAM_ABIS};
use super::FunctionId;
use crate::error::ClientError;
use alloy_primitives::U256;
use alloy_rlp::Header;
use bubble_common::abi::{self, AbiValue, ParamType};
use serde_json::Value;

/// One decoded RLP item: a byte-string or a nested list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    /// A byte-string (integers arrive as minimal big-endian bytes).
    Bytes(Vec<u8>),
    /// A nested list.
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Interprets this item as a big-endian unsigned integer.
    pub fn as_uint(&self) -> Result<U256, ClientError> {
        match self {
            Self::Bytes(bytes) => U256::try_from_be_slice(bytes)
                .ok_or_else(|| ClientError::Decode("integer wider than 256 bits".into())),
            Self::List(_) => Err(ClientError::Decode("expected an integer, found a list".into())),
        }
    }

    /// The raw bytes of this item.
    pub fn as_bytes(&self) -> Result<&[u8], ClientError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::List(_) => Err(ClientError::Decode("expected bytes, found a list".into())),
        }
    }
}

/// Appends the RLP string encoding of `data`.
fn encode_bytes(data: &[u8], out: &mut Vec<u8>) {
    if data.len() == 1 && data[0] < 0x80 {
        out.push(data[0]);
    } else {
        Header { list: false, payload_length: data.len() }.encode(out);
        out.extend_from_slice(data);
    }
}

/// Appends the RLP encoding of a big-endian unsigned integer.
fn encode_uint(value: U256, out: &mut Vec<u8>) {
    encode_bytes(&value.to_be_bytes_trimmed_vec(), out);
}

fn encode_abi_value(value: &AbiValue) -> Vec<u8> {
    let mut out = Vec::new();
    match value {
        AbiValue::Bytes(bytes) => encode_bytes(bytes, &mut out),
        AbiValue::Uint(v) => encode_uint(*v, &mut out),
        // Absent parameters hold their position as an empty string.
        AbiValue::Null => {}
    }
    out
}

/// Looks up the declared type of a named parameter, trying the function's own
/// table before the global defaults.
fn declared_type(fid: FunctionId, name: &str) -> Option<ParamType> {
    let lookup = |table: &[(&str, ParamType)]| {
        table.iter().find(|(n, _)| *n == name).map(|(_, t)| *t)
    };
    param_abis(fid).and_then(lookup).or_else(|| lookup(DEFAULT_PARAM_ABIS))
}

/// Normalizes a parameter that has no declared type.
fn infer_value(name: &str, raw: &Value) -> Result<AbiValue, ClientError> {
    match raw {
        Value::Null => Ok(AbiValue::Null),
        Value::Number(_) => Ok(abi::normalize(name, ParamType::Uint, raw)?),
        Value::String(s) if s.starts_with("0x") => Ok(abi::normalize(name, ParamType::Bytes, raw)?),
        Value::String(_) => Ok(abi::normalize(name, ParamType::Text, raw)?),
        other => Err(ClientError::Validation(format!(
            "parameter `{name}` has an unsupported shape: {other}"
        ))),
    }
}

/// Encodes a call to `fid` with its named parameters, in declaration order.
pub fn encode_call(fid: FunctionId, params: &[(&str, Value)]) -> Result<Vec<u8>, ClientError> {
    let mut items: Vec<Vec<u8>> = Vec::with_capacity(params.len() + 1);

    let mut fid_encoded = Vec::new();
    encode_uint(U256::from(fid.0), &mut fid_encoded);
    items.push(fid_encoded);

    for (name, raw) in params {
        let normalized = match declared_type(fid, name) {
            Some(ty) => abi::normalize(name, ty, raw)?,
            None => infer_value(name, raw)?,
        };
        items.push(encode_abi_value(&normalized));
    }

    // Each item is itself a byte-string of the outer list.
    let payload_length: usize = items
        .iter()
        .map(|item| {
            if item.len() == 1 && item[0] < 0x80 {
                1
            } else {
                Header { list: false, payload_length: item.len() }.length() + item.len()
            }
        })
        .sum();

    let mut out = Vec::with_capacity(payload_length + 4);
    Header { list: true, payload_length }.encode(&mut out);
    for item in &items {
        encode_bytes(item, &mut out);
    }
    Ok(out)
}

/// Decodes one RLP item, consuming the whole buffer.
pub fn decode_rlp(data: &[u8]) -> Result<RlpItem, ClientError> {
    let mut buf = data;
    let item = decode_item(&mut buf)?;
    if !buf.is_empty() {
        return Err(ClientError::Decode(format!("{} trailing bytes after payload", buf.len())));
    }
    Ok(item)
}

fn decode_item(buf: &mut &[u8]) -> Result<RlpItem, ClientError> {
    let header = Header::decode(buf).map_err(|e| ClientError::Decode(format!("bad rlp: {e}")))?;
    if header.payload_length > buf.len() {
        return Err(ClientError::Decode("rlp payload longer than input".into()));
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    if header.list {
        let mut items = Vec::new();
        let mut inner = payload;
        while !inner.is_empty() {
            items.push(decode_item(&mut inner)?);
        }
        Ok(RlpItem::List(items))
    } else {
        Ok(RlpItem::Bytes(payload.to_vec()))
    }
}

/// Decodes an event payload into its status code and positional arguments.
///
/// The outer list holds byte-strings; each argument byte-string is itself RLP
/// and is decoded a second time.
pub fn decode_event_payload(data: &[u8]) -> Result<(u64, Vec<RlpItem>), ClientError> {
    let items = match decode_rlp(data)? {
        RlpItem::List(items) => items,
        RlpItem::Bytes(_) => {
            return Err(ClientError::Decode("event payload is not an rlp list".into()))
        }
    };
    let code_item = items
        .first()
        .ok_or_else(|| ClientError::Decode("event payload is an empty list".into()))?;
    let code: u64 = code_item
        .as_uint()?
        .try_into()
        .map_err(|_| ClientError::Decode("event code exceeds u64".into()))?;

    let mut args = Vec::with_capacity(items.len().saturating_sub(1));
    for item in &items[1..] {
        args.push(decode_rlp(item.as_bytes()?)?);
    }
    Ok((code, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_small_bytes_inline() {
        let mut out = Vec::new();
        encode_bytes(&[0x7f], &mut out);
        assert_eq!(out, vec![0x7f]);

        let mut out = Vec::new();
        encode_bytes(&[0x80], &mut out);
        assert_eq!(out, vec![0x81, 0x80]);

        let mut out = Vec::new();
        encode_bytes(&[], &mut out);
        assert_eq!(out, vec![0x80]);
    }

    #[test]
    fn encode_call_wraps_items_in_one_outer_list() {
        // fid 1000 = 0x03e8 -> rlp "82 03 e8"; amount 5 -> rlp "05".
        let encoded =
            encode_call(FunctionId(1000), &[("amount", json!(5))]).unwrap();
        // Outer list: [ string("8203e8"), string("05") ]
        assert_eq!(encoded, vec![0xc5, 0x83, 0x82, 0x03, 0xe8, 0x05]);
    }

    #[test]
    fn null_parameters_hold_their_position() {
        let encoded = encode_call(FunctionId(1103), &[("address", Value::Null)]).unwrap();
        // [ string("8204 4f"), empty string ]
        assert_eq!(*encoded.last().unwrap(), 0x80);
    }

    #[test]
    fn decode_is_the_inverse_of_encode() {
        let encoded = encode_call(
            FunctionId(1000),
            &[("node_id", json!(format!("0x{}", "ab".repeat(32)))), ("amount", json!(5))],
        )
        .unwrap();
        let decoded = decode_rlp(&encoded).unwrap();
        let RlpItem::List(items) = decoded else { panic!("expected a list") };
        assert_eq!(items.len(), 3);
        // Item 0 re-decodes to the function id.
        let fid = decode_rlp(items[0].as_bytes().unwrap()).unwrap();
        assert_eq!(fid.as_uint().unwrap(), U256::from(1000u64));
        // Item 1 re-decodes to the 32 node id bytes.
        let node_id = decode_rlp(items[1].as_bytes().unwrap()).unwrap();
        assert_eq!(node_id.as_bytes().unwrap().len(), 32);
        // Item 2 re-decodes to the amount.
        let amount = decode_rlp(items[2].as_bytes().unwrap()).unwrap();
        assert_eq!(amount.as_uint().unwrap(), U256::from(5u64));
    }

    #[test]
    fn event_payload_round_trip() {
        // Build [code=0, arg=rlp(5)] by hand.
        let mut arg = Vec::new();
        encode_uint(U256::from(5u64), &mut arg);
        let mut payload = Vec::new();
        let mut body = Vec::new();
        encode_uint(U256::ZERO, &mut body);
        encode_bytes(&arg, &mut body);
        Header { list: true, payload_length: body.len() }.encode(&mut payload);
        payload.extend_from_slice(&body);

        let (code, args) = decode_event_payload(&payload).unwrap();
        assert_eq!(code, 0);
        assert_eq!(args, vec![RlpItem::Bytes(vec![5])]);
    }

    #[test]
    fn trailing_garbage_is_a_hard_failure() {
        let mut encoded = encode_call(FunctionId(1000), &[]).unwrap();
        encoded.push(0x00);
        assert!(matches!(decode_rlp(&encoded), Err(ClientError::Decode(_))));
    }
}
