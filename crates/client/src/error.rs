//! The client's error taxonomy.
//!
//! Every failure a caller can observe is one of these variants; nothing is
//! logged and swallowed. The retry middleware only ever consumes
//! [`ClientError::Transport`]; all other variants propagate untouched.

use bubble_common::RpcError;
use serde_json::Value;

/// Failures surfaced by the client library.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The transport failed before a well-formed response arrived
    /// (connection refused, timeout, HTTP error, unparseable body).
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error envelope.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// Numeric error code from the node.
        code: i64,
        /// Error message from the node.
        message: String,
        /// Optional structured payload.
        data: Option<Value>,
    },

    /// Caller-supplied arguments were rejected before any network call.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// A payload could not be decoded; no partial result is produced.
    #[error("decode error: {0}")]
    Decode(String),

    /// A lookup returned no object (e.g. an unknown transaction hash).
    #[error("{0} not found")]
    NotFound(String),

    /// A contract call reverted.
    #[error("contract execution reverted: {0}")]
    ContractLogic(String),

    /// A bounded wait ran out of time; the awaited object may still appear
    /// later. Distinct from [`ClientError::Transport`] so callers can branch
    /// on "still pending" vs "transport broken".
    #[error("timed out after {waited_secs}s")]
    TimeoutExhausted {
        /// How long the caller waited before giving up.
        waited_secs: u64,
    },

    /// A middleware onion mutation referenced a layer name that is not
    /// present.
    #[error("no middleware layer named `{0}`")]
    UnknownLayer(String),

    /// A middleware onion mutation would duplicate an existing layer name.
    #[error("middleware layer `{0}` already present")]
    DuplicateLayer(String),
}

impl ClientError {
    /// Converts a node error envelope into the generic RPC variant.
    pub fn from_rpc(err: &RpcError) -> Self {
        Self::Rpc { code: err.code, message: err.message.clone(), data: err.data.clone() }
    }

    /// Whether the retry middleware may consume this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<bubble_common::abi::AbiError> for ClientError {
    fn from(err: bubble_common::abi::AbiError) -> Self {
        Self::Validation(err.to_string())
    }
}
