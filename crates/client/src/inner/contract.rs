//! Inner-contract call building and result/event decoding.

use super::codec::{decode_event_payload, encode_call, RlpItem};
use super::error_code::error_message;
use super::formatters::{
    event_shape, result_format, EventField, EventShape, ResultFormat, ValueTransform,
};
use super::FunctionId;
use crate::error::ClientError;
use crate::formatters::u256_to_value;
use alloy_primitives::{hex, Address, U256};
use serde_json::{Map, Value};

fn apply_transform(transform: ValueTransform, value: Value) -> Result<Value, ClientError> {
    match transform {
        ValueTransform::UintFromHex => match &value {
            Value::String(s) if s.starts_with("0x") => {
                let digits = s.trim_start_matches("0x");
                let parsed = U256::from_str_radix(digits, 16)
                    .map_err(|e| ClientError::Decode(format!("bad hex quantity {s}: {e}")))?;
                Ok(u256_to_value(parsed))
            }
            _ => Ok(value),
        },
        ValueTransform::HexString => match value {
            Value::String(s) => {
                let lower = s.trim_start_matches("0x").to_ascii_lowercase();
                Ok(Value::String(format!("0x{lower}")))
            }
            other => Ok(other),
        },
        ValueTransform::DictList(fields) => match value {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => items
                .into_iter()
                .map(|item| apply_dict_fields(fields, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Err(ClientError::Decode(format!("expected a list of objects: {other}"))),
        },
    }
}

fn apply_dict_fields(
    fields: &[(&str, ValueTransform)],
    value: Value,
) -> Result<Value, ClientError> {
    let Value::Object(mut object) = value else {
        return Err(ClientError::Decode(format!("expected an object: {value}")));
    };
    for (name, transform) in fields {
        if let Some(current) = object.remove(*name) {
            object.insert((*name).to_string(), apply_transform(*transform, current)?);
        }
    }
    Ok(Value::Object(object))
}

fn apply_result_format(format: &ResultFormat, value: Value) -> Result<Value, ClientError> {
    match format {
        ResultFormat::Scalar(transform) => apply_transform(*transform, value),
        ResultFormat::Dict(fields) => apply_dict_fields(fields, value),
        ResultFormat::ArrayOfDict(fields) => match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| apply_dict_fields(fields, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Err(ClientError::Decode(format!("expected an array result: {other}"))),
        },
    }
}

/// Decodes the raw return of an inner-contract call.
///
/// Hex/byte payloads are unwrapped as UTF-8 JSON first. Envelopes without
/// both `Code` and `Ret` pass through unchanged. A nonzero `Code` returns the
/// raw `Ret` value as-is, as does an empty one; otherwise the function's
/// registered result formatter applies.
pub fn decode_result(fid: FunctionId, raw: Value) -> Result<Value, ClientError> {
    let envelope = match raw {
        Value::String(s) => {
            let bytes = bubble_common::hex_to_bytes(&s)
                .ok_or_else(|| ClientError::Decode(format!("call returned invalid hex: {s}")))?;
            let text = String::from_utf8(bytes)
                .map_err(|e| ClientError::Decode(format!("call return is not utf-8: {e}")))?;
            serde_json::from_str::<Value>(&text)
                .map_err(|e| ClientError::Decode(format!("call return is not json: {e}")))?
        }
        other => other,
    };

    let Value::Object(fields) = &envelope else {
        return Ok(envelope);
    };
    let (Some(code), Some(ret)) = (fields.get("Code"), fields.get("Ret")) else {
        // Back-compat passthrough for nodes answering without the envelope.
        return Ok(envelope);
    };

    let code = code
        .as_i64()
        .ok_or_else(|| ClientError::Decode(format!("envelope code is not an integer: {code}")))?;
    if code != 0 {
        return Ok(ret.clone());
    }

    let empty = match ret {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return Ok(ret.clone());
    }

    match result_format(fid) {
        Some(format) => apply_result_format(format, ret.clone()),
        None => Ok(ret.clone()),
    }
}

/// A decoded inner-contract event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    /// Status code from the event payload.
    pub code: u64,
    /// Message looked up from the status-code table.
    pub message: String,
    /// Positional arguments, named per the registered shape when one exists.
    pub data: Value,
}

fn item_to_raw_value(item: &RlpItem) -> Value {
    match item {
        RlpItem::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        RlpItem::List(items) => Value::Array(items.iter().map(item_to_raw_value).collect()),
    }
}

fn apply_event_field(field: EventField, item: &RlpItem) -> Result<Value, ClientError> {
    match field {
        EventField::Uint => item.as_uint().map(u256_to_value),
        EventField::Hex => {
            item.as_bytes().map(|bytes| Value::String(format!("0x{}", hex::encode(bytes))))
        }
    }
}

fn zip_fields(
    fields: &[(&str, EventField)],
    args: &[RlpItem],
) -> Result<Value, ClientError> {
    let mut object = Map::new();
    for ((name, field), item) in fields.iter().zip(args) {
        object.insert((*name).to_string(), apply_event_field(*field, item)?);
    }
    Ok(Value::Object(object))
}

fn shape_event_data(shape: &EventShape, args: &[RlpItem]) -> Result<Value, ClientError> {
    match shape {
        EventShape::Dict(fields) => zip_fields(fields, args),
        EventShape::ArrayOfDict(fields) => {
            let rows = match args.first() {
                Some(RlpItem::List(rows)) => rows,
                _ => {
                    return Err(ClientError::Decode(
                        "event data is inconsistent with the registered formatter".into(),
                    ))
                }
            };
            rows.iter()
                .map(|row| match row {
                    RlpItem::List(columns) => zip_fields(fields, columns),
                    RlpItem::Bytes(_) => Err(ClientError::Decode(
                        "event data is inconsistent with the registered formatter".into(),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

/// Decodes the event emitted by an inner-contract transaction.
///
/// Inner-contract transactions emit exactly one relevant log at the final log
/// slot of their receipt; its `data` is hex-prefixed RLP `[code, args...]`.
pub fn decode_event(fid: FunctionId, receipt: &Value) -> Result<EventData, ClientError> {
    let log = receipt
        .get("logs")
        .and_then(Value::as_array)
        .and_then(|logs| logs.last())
        .ok_or_else(|| ClientError::Decode("receipt has no logs".into()))?;
    let data = log
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::Decode("log has no data field".into()))?;
    let bytes = bubble_common::hex_to_bytes(data)
        .ok_or_else(|| ClientError::Decode(format!("log data is invalid hex: {data}")))?;

    let (code, args) = decode_event_payload(&bytes)?;
    let message = error_message(code).to_string();

    let data = match event_shape(fid) {
        Some(shape) => shape_event_data(shape, &args)?,
        None => Value::Array(args.iter().map(item_to_raw_value).collect()),
    };
    Ok(EventData { code, message, data })
}

/// Decoder bound to one function's registered event shape.
pub struct EventDecoder {
    fid: FunctionId,
}

impl EventDecoder {
    /// Creates a decoder for the given function.
    pub fn new(fid: FunctionId) -> Self {
        Self { fid }
    }

    /// Decodes the final log of a transaction receipt.
    pub fn process_receipt(&self, receipt: &Value) -> Result<EventData, ClientError> {
        decode_event(self.fid, receipt)
    }
}

/// Handle to one fixed-address inner contract.
#[derive(Debug, Clone, Copy)]
pub struct InnerContract {
    address: Address,
}

impl InnerContract {
    /// Binds a handle to the contract at `address`.
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// The contract's fixed address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Encodes the transaction `data` payload for a call to `fid`.
    pub fn transaction_data(
        &self,
        fid: FunctionId,
        params: &[(&str, Value)],
    ) -> Result<String, ClientError> {
        let encoded = encode_call(fid, params)?;
        Ok(format!("0x{}", hex::encode(encoded)))
    }

    /// Builds the transaction object for a call to `fid`.
    ///
    /// The caller may pass a base transaction (for `from`, `gas`, `value`),
    /// but must leave `data` and `to` to the contract.
    pub fn prepare_transaction(
        &self,
        fid: FunctionId,
        params: &[(&str, Value)],
        base: Option<Value>,
    ) -> Result<Value, ClientError> {
        let mut transaction = match base {
            None => Map::new(),
            Some(Value::Object(fields)) => fields,
            Some(other) => {
                return Err(ClientError::Validation(format!(
                    "transaction must be an object: {other}"
                )))
            }
        };
        if transaction.contains_key("data") {
            return Err(ClientError::Validation(
                "cannot set data in an inner-contract transaction".into(),
            ));
        }
        if transaction.contains_key("to") {
            return Err(ClientError::Validation(
                "cannot set the to address in an inner-contract transaction".into(),
            ));
        }
        transaction.insert("to".to_string(), Value::String(format!("{}", self.address)));
        transaction.insert("data".to_string(), Value::String(self.transaction_data(fid, params)?));
        Ok(Value::Object(transaction))
    }

    /// Returns a decoder for the event emitted by `fid`.
    pub fn event(&self, fid: FunctionId) -> EventDecoder {
        EventDecoder::new(fid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inner::STAKING_ADDRESS;
    use alloy_rlp::Header;
    use serde_json::json;

    fn hex_envelope(envelope: Value) -> Value {
        Value::String(format!("0x{}", hex::encode(envelope.to_string().as_bytes())))
    }

    #[test]
    fn success_results_are_formatted() {
        let envelope = json!({ "Code": 0, "Ret": { "Shares": "0xde0b6b3a7640000", "NodeId": "abc" } });
        let got =
            decode_result(FunctionId::STAKING_GET_CANDIDATE_INFO, hex_envelope(envelope)).unwrap();
        assert_eq!(got["Shares"], json!(1_000_000_000_000_000_000u64));
        assert_eq!(got["NodeId"], json!("abc"));
    }

    #[test]
    fn nonzero_codes_return_ret_unmodified() {
        let envelope = json!({ "Code": 301006, "Ret": "The candidate does not exist" });
        let got =
            decode_result(FunctionId::STAKING_GET_CANDIDATE_INFO, hex_envelope(envelope)).unwrap();
        assert_eq!(got, json!("The candidate does not exist"));
    }

    #[test]
    fn empty_ret_passes_through() {
        let envelope = json!({ "Code": 0, "Ret": [] });
        let got =
            decode_result(FunctionId::STAKING_GET_CANDIDATE_LIST, hex_envelope(envelope)).unwrap();
        assert_eq!(got, json!([]));
    }

    #[test]
    fn envelopes_missing_code_or_ret_pass_through() {
        let raw = json!({ "balance": "0x10" });
        let got = decode_result(FunctionId::STAKING_GET_CANDIDATE_INFO, raw.clone()).unwrap();
        assert_eq!(got, raw);
    }

    #[test]
    fn unregistered_functions_return_raw_ret() {
        let envelope = json!({ "Code": 0, "Ret": [1, 2, 3] });
        let got = decode_result(FunctionId(9999), hex_envelope(envelope)).unwrap();
        assert_eq!(got, json!([1, 2, 3]));
    }

    #[test]
    fn garbage_payloads_are_hard_decode_failures() {
        let err = decode_result(
            FunctionId::STAKING_GET_CANDIDATE_INFO,
            Value::String("0xzznothex".into()),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));

        // Valid hex, but not JSON underneath.
        let err = decode_result(
            FunctionId::STAKING_GET_CANDIDATE_INFO,
            Value::String(format!("0x{}", hex::encode(b"not json"))),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    fn rlp_string(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        if data.len() == 1 && data[0] < 0x80 {
            out.push(data[0]);
        } else {
            Header { list: false, payload_length: data.len() }.encode(&mut out);
            out.extend_from_slice(data);
        }
        out
    }

    fn rlp_uint(value: u64) -> Vec<u8> {
        if value == 0 {
            return vec![0x80];
        }
        let bytes = value.to_be_bytes();
        let start = bytes.iter().position(|b| *b != 0).unwrap();
        rlp_string(&bytes[start..])
    }

    fn event_receipt(code: u64, args: Vec<Vec<u8>>) -> Value {
        // Outer list: [code, rlp(arg), rlp(arg), ...]; each arg doubly encoded.
        let mut body = rlp_uint(code);
        for arg in args {
            body.extend(rlp_string(&arg));
        }
        let mut payload = Vec::new();
        Header { list: true, payload_length: body.len() }.encode(&mut payload);
        payload.extend(body);
        json!({
            "logs": [
                { "data": "0x00" },
                { "data": format!("0x{}", hex::encode(payload)) },
            ]
        })
    }

    #[test]
    fn registered_event_zips_named_fields() {
        let receipt = event_receipt(0, vec![rlp_uint(7), rlp_uint(100)]);
        let event = decode_event(FunctionId::DELEGATE_REDEEM_DELEGATE, &receipt).unwrap();
        assert_eq!(event.code, 0);
        assert_eq!(event.message, "ok");
        assert_eq!(event.data, json!({ "released": 7, "restrictingPlan": 100 }));
    }

    #[test]
    fn error_codes_resolve_to_registered_messages() {
        let receipt = event_receipt(301004, vec![]);
        let event = decode_event(FunctionId::DELEGATE_REDEEM_DELEGATE, &receipt).unwrap();
        assert_eq!(event.code, 301004);
        assert_eq!(event.message, "The staking deposit is too low");
        assert_eq!(event.data, json!({}));
    }

    #[test]
    fn unknown_codes_fall_back() {
        let receipt = event_receipt(424242, vec![]);
        let event = decode_event(FunctionId(9999), &receipt).unwrap();
        assert_eq!(event.message, "Unknown error code");
    }

    #[test]
    fn unregistered_event_returns_raw_positional_tail() {
        let receipt = event_receipt(0, vec![rlp_uint(5), rlp_string(b"xy")]);
        let event = decode_event(FunctionId(9999), &receipt).unwrap();
        assert_eq!(event.data, json!(["0x05", "0x7879"]));
    }

    #[test]
    fn array_shape_mismatch_is_a_hard_failure() {
        // Shape expects a list-of-tuples argument, but gets a scalar.
        let receipt = event_receipt(0, vec![rlp_uint(5)]);
        let err =
            decode_event(FunctionId::REWARD_WITHDRAW_DELEGATE_REWARD, &receipt).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn array_shape_zips_each_row() {
        // One argument: a list of two (NodeID, StakingNum, Reward) tuples.
        let node = [0x11u8; 8];
        let row = |reward: u64| {
            let mut body = rlp_string(&node);
            body.extend(rlp_uint(3));
            body.extend(rlp_uint(reward));
            let mut out = Vec::new();
            Header { list: true, payload_length: body.len() }.encode(&mut out);
            out.extend(body);
            out
        };
        let mut rows = row(10);
        rows.extend(row(20));
        let mut arg = Vec::new();
        Header { list: true, payload_length: rows.len() }.encode(&mut arg);
        arg.extend(rows);

        let receipt = event_receipt(0, vec![arg]);
        let event =
            decode_event(FunctionId::REWARD_WITHDRAW_DELEGATE_REWARD, &receipt).unwrap();
        assert_eq!(
            event.data,
            json!([
                { "NodeID": "0x1111111111111111", "StakingNum": 3, "Reward": 10 },
                { "NodeID": "0x1111111111111111", "StakingNum": 3, "Reward": 20 },
            ])
        );
    }

    #[test]
    fn prepare_transaction_rejects_reserved_fields() {
        let contract = InnerContract::new(STAKING_ADDRESS);
        let err = contract
            .prepare_transaction(
                FunctionId::STAKING_GET_CANDIDATE_LIST,
                &[],
                Some(json!({ "data": "0x00" })),
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let err = contract
            .prepare_transaction(
                FunctionId::STAKING_GET_CANDIDATE_LIST,
                &[],
                Some(json!({ "to": "0x00" })),
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn prepare_transaction_fills_to_and_data() {
        let contract = InnerContract::new(STAKING_ADDRESS);
        let tx = contract
            .prepare_transaction(
                FunctionId::STAKING_GET_CANDIDATE_LIST,
                &[],
                Some(json!({ "from": "0xabc" })),
            )
            .unwrap();
        assert_eq!(tx["from"], json!("0xabc"));
        assert_eq!(tx["to"].as_str().unwrap().to_lowercase(), format!("{STAKING_ADDRESS:?}"));
        assert!(tx["data"].as_str().unwrap().starts_with("0x"));
    }
}
