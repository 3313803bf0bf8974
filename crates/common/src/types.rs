//! JSON-RPC envelope and chain identifier types shared by both client modes.

use alloy_primitives::{hex, B256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single JSON-RPC 2.0 request as it goes over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,
    /// Endpoint name, e.g. `bub_getBalance`.
    pub method: String,
    /// Positional parameters.
    pub params: Value,
    /// Request id chosen by the transport.
    pub id: u64,
}

impl RpcRequest {
    /// Builds a request envelope for the given endpoint and parameters.
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self { jsonrpc: "2.0".to_string(), method: method.into(), params, id }
    }
}

/// A JSON-RPC 2.0 response envelope.
///
/// Either `result` or `error` is populated; middleware that answer a request
/// locally synthesize one of these without a round-trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Successful result payload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error object returned by the node, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Wraps a result value in a success envelope.
    pub fn from_result(result: Value) -> Self {
        Self { result: Some(result), error: None }
    }

    /// Wraps an error object in an error envelope.
    pub fn from_error(error: RpcError) -> Self {
        Self { result: None, error: Some(error) }
    }
}

/// The error object of a JSON-RPC error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured error payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Symbolic block tags accepted wherever a block height is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    /// The most recent block.
    Latest,
    /// The genesis block.
    Earliest,
    /// The pending (not yet sealed) block.
    Pending,
}

impl BlockTag {
    /// The wire spelling of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Earliest => "earliest",
            Self::Pending => "pending",
        }
    }
}

/// A block selector: concrete hash, concrete height, or a symbolic tag.
///
/// This is the closed tag set endpoint selection dispatches over. Numbers and
/// tags share the by-number family of endpoints; hashes pick the by-hash
/// family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    /// Select by block hash.
    Hash(B256),
    /// Select by block height.
    Number(u64),
    /// Select by symbolic tag.
    Tag(BlockTag),
}

impl BlockId {
    /// Renders the selector into its JSON-RPC parameter form.
    pub fn to_param(&self) -> Value {
        match self {
            Self::Hash(h) => Value::String(format!("{h}")),
            Self::Number(n) => Value::String(format!("0x{n:x}")),
            Self::Tag(t) => Value::String(t.as_str().to_string()),
        }
    }
}

impl From<u64> for BlockId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<B256> for BlockId {
    fn from(h: B256) -> Self {
        Self::Hash(h)
    }
}

impl From<BlockTag> for BlockId {
    fn from(t: BlockTag) -> Self {
        Self::Tag(t)
    }
}

/// Parameters of a `bub_newFilter` / `bub_getLogs` call.
///
/// Absent fields are dropped from the serialized object rather than sent as
/// `null`, matching what nodes expect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    /// First block of the queried range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_block: Option<Value>,
    /// Last block of the queried range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<Value>,
    /// Contract address or list of addresses to match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Value>,
    /// Positional topic filters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Value>,
}

/// Renders a block height as a `0x`-prefixed hex quantity.
pub fn u64_to_quantity(n: u64) -> Value {
    Value::String(format!("0x{n:x}"))
}

/// Parses a JSON-RPC quantity (hex string or bare number) into a `u64`.
pub fn quantity_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            u64::from_str_radix(digits, 16).ok()
        }
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Decodes a `0x`-prefixed hex string into raw bytes.
pub fn hex_to_bytes(s: &str) -> Option<Vec<u8>> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok()
}
