//! Method descriptors: the declarative binding of a logical operation to an
//! RPC endpoint, an argument munger and response formatters.
//!
//! A descriptor is an immutable `static`; every invocation re-resolves the
//! endpoint and re-runs its munger. Mungers are pure: they validate and
//! normalize caller arguments into the exact positional wire parameters, and
//! any rejection happens before a request is built.

use crate::error::ClientError;
use bubble_common::{BlockId, BlockTag, FilterParams, RpcError};
use serde_json::Value;

/// How a descriptor names its endpoint.
pub enum Endpoint {
    /// A fixed endpoint name.
    Static(&'static str),
    /// Chosen by the shape of the call's block identifier: hashes go to the
    /// by-hash endpoint, numbers and symbolic tags to the by-number one.
    ByBlockId {
        /// Endpoint taking a block hash.
        if_hash: &'static str,
        /// Endpoint taking a block number or tag.
        if_number: &'static str,
    },
}

impl Endpoint {
    /// Resolves the concrete endpoint name for one invocation.
    pub fn resolve(&self, block_id: Option<&BlockId>) -> Result<&'static str, ClientError> {
        match self {
            Self::Static(name) => Ok(name),
            Self::ByBlockId { if_hash, if_number } => match block_id {
                Some(BlockId::Hash(_)) => Ok(if_hash),
                Some(BlockId::Number(_) | BlockId::Tag(_)) => Ok(if_number),
                None => Err(ClientError::Validation(
                    "a block identifier is required to select the endpoint".into(),
                )),
            },
        }
    }
}

/// What to do when the node answers with a null result.
pub enum NullBehavior {
    /// Null is a legitimate answer.
    Allow,
    /// Null means the named object does not exist.
    NotFound(&'static str),
}

/// Translates a node error envelope into a domain failure, or declines.
pub type ErrorFormatter = fn(&RpcError) -> Option<ClientError>;

/// Normalizes a successful result value.
pub type ResultFormatter = fn(Value) -> Result<Value, ClientError>;

/// Immutable binding of one logical operation to its endpoint and formatter
/// pipeline.
pub struct Method {
    /// Endpoint name or selector.
    pub endpoint: Endpoint,
    /// Null-result handling, applied before the result formatter.
    pub null_result: NullBehavior,
    /// Error translation, applied first on an error response.
    pub error_formatter: Option<ErrorFormatter>,
    /// Success-path normalization, applied last.
    pub result_formatter: Option<ResultFormatter>,
}

impl Method {
    /// A plain passthrough descriptor for a fixed endpoint.
    pub const fn plain(endpoint: &'static str) -> Self {
        Self {
            endpoint: Endpoint::Static(endpoint),
            null_result: NullBehavior::Allow,
            error_formatter: None,
            result_formatter: None,
        }
    }
}

/// Wire parameters produced by a munger, plus the block identifier the
/// endpoint selector dispatches on.
#[derive(Debug)]
pub struct PreparedCall {
    /// Block identifier of this invocation, when the operation has one.
    pub block_id: Option<BlockId>,
    /// Positional wire parameters.
    pub params: Vec<Value>,
}

/// Passes positional arguments through unchanged.
pub fn default_root_munger(params: Vec<Value>) -> PreparedCall {
    PreparedCall { block_id: None, params }
}

/// Appends the block identifier to a target argument, defaulting to
/// `latest` when omitted.
pub fn block_id_munger(target: Value, block: Option<BlockId>) -> PreparedCall {
    let block = block.unwrap_or(BlockId::Tag(BlockTag::Latest));
    PreparedCall { block_id: Some(block), params: vec![target, block.to_param()] }
}

/// Leads with the block identifier itself (block-fetch style operations).
pub fn block_selector_munger(block: BlockId, extra: Vec<Value>) -> PreparedCall {
    let mut params = vec![block.to_param()];
    params.extend(extra);
    PreparedCall { block_id: Some(block), params }
}

/// Validates a call/estimate transaction object and appends the block
/// identifier.
pub fn call_munger(
    transaction: Value,
    block: Option<BlockId>,
) -> Result<PreparedCall, ClientError> {
    if !transaction.is_object() {
        return Err(ClientError::Validation("transaction must be an object".into()));
    }
    let block = block.unwrap_or(BlockId::Tag(BlockTag::Latest));
    Ok(PreparedCall { block_id: Some(block), params: vec![transaction, block.to_param()] })
}

/// Validates filter parameters before they reach the wire or the local
/// emulator.
pub fn filter_munger(filter: &FilterParams) -> Result<PreparedCall, ClientError> {
    let concrete =
        |v: &Option<Value>| v.as_ref().and_then(bubble_common::quantity_to_u64);
    if let (Some(from), Some(to)) = (concrete(&filter.from_block), concrete(&filter.to_block)) {
        if from > to {
            return Err(ClientError::Validation(format!(
                "filter fromBlock {from} is greater than toBlock {to}"
            )));
        }
    }
    let params = serde_json::to_value(filter)
        .map_err(|e| ClientError::Validation(format!("unserializable filter: {e}")))?;
    Ok(PreparedCall { block_id: None, params: vec![params] })
}
