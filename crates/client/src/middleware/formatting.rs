//! Response-formatting middleware and the proof-of-authority reshape layer.

use super::{AsyncMiddleware, AsyncNext, Middleware, Next};
use crate::error::ClientError;
use crate::rpc;
use bubble_common::{hex_to_bytes, RpcResponse};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;

/// A pure transform applied to the `result` of selected endpoints.
pub type ResultTransform = fn(Value) -> Result<Value, ClientError>;

/// Middleware applying per-endpoint result transforms on the response path.
///
/// Null results pass through untouched; transforms only ever see a present
/// value.
#[derive(Default)]
pub struct FormattingMiddleware {
    result_transforms: HashMap<&'static str, ResultTransform>,
}

impl FormattingMiddleware {
    /// Creates a formatting middleware with no transforms registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transform for one endpoint's results.
    pub fn with_result_transform(mut self, method: &'static str, f: ResultTransform) -> Self {
        self.result_transforms.insert(method, f);
        self
    }

    fn apply(&self, method: &str, mut response: RpcResponse) -> Result<RpcResponse, ClientError> {
        if let Some(transform) = self.result_transforms.get(method) {
            if let Some(result) = response.result.take() {
                if result.is_null() {
                    response.result = Some(result);
                } else {
                    response.result = Some(transform(result)?);
                }
            }
        }
        Ok(response)
    }
}

impl Middleware for FormattingMiddleware {
    fn handle(
        &self,
        method: &str,
        params: Value,
        next: Next<'_>,
    ) -> Result<RpcResponse, ClientError> {
        let response = next.run(method, params)?;
        self.apply(method, response)
    }
}

impl AsyncMiddleware for FormattingMiddleware {
    fn handle<'a>(
        &'a self,
        method: &'a str,
        params: Value,
        next: AsyncNext<'a>,
    ) -> BoxFuture<'a, Result<RpcResponse, ClientError>> {
        Box::pin(async move {
            let response = next.run(method, params).await?;
            self.apply(method, response)
        })
    }
}

/// Builds the proof-of-authority reshape layer.
///
/// On block-fetch responses the raw `extraData` field is renamed to
/// `proofOfAuthorityData`, with its hex payload validated, so downstream
/// consumers see the semantic name.
pub fn poa_middleware() -> FormattingMiddleware {
    FormattingMiddleware::new()
        .with_result_transform(rpc::BUB_GET_BLOCK_BY_HASH, poa_cleanup)
        .with_result_transform(rpc::BUB_GET_BLOCK_BY_NUMBER, poa_cleanup)
}

fn poa_cleanup(mut block: Value) -> Result<Value, ClientError> {
    if let Value::Object(fields) = &mut block {
        if let Some(extra) = fields.remove("extraData") {
            let hex = extra
                .as_str()
                .ok_or_else(|| ClientError::Decode("extraData is not a string".into()))?;
            if hex_to_bytes(hex).is_none() {
                return Err(ClientError::Decode(format!("extraData is not valid hex: {hex}")));
            }
            fields.insert("proofOfAuthorityData".to_string(), extra);
        }
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{Onion, Position};
    use crate::provider::MockProvider;
    use serde_json::json;
    use std::sync::Arc;

    fn onion_with_poa() -> Onion<Arc<dyn Middleware>> {
        let mut onion: Onion<Arc<dyn Middleware>> = Onion::new();
        onion.inject("poa", Arc::new(poa_middleware()), Position::Outermost).unwrap();
        onion
    }

    #[test]
    fn extra_data_is_renamed() {
        let provider = MockProvider::new();
        provider.set_result(
            rpc::BUB_GET_BLOCK_BY_NUMBER,
            json!({ "number": "0x1", "extraData": "0xdeadbeef" }),
        );

        let response = onion_with_poa()
            .dispatch(&provider, rpc::BUB_GET_BLOCK_BY_NUMBER, json!(["0x1", false]))
            .unwrap();
        assert_eq!(
            response.result,
            Some(json!({ "number": "0x1", "proofOfAuthorityData": "0xdeadbeef" }))
        );
    }

    #[test]
    fn null_results_pass_through() {
        let provider = MockProvider::new();
        provider.set_result(rpc::BUB_GET_BLOCK_BY_HASH, Value::Null);
        let response = onion_with_poa()
            .dispatch(&provider, rpc::BUB_GET_BLOCK_BY_HASH, json!(["0xabc", false]))
            .unwrap();
        assert_eq!(response.result, Some(Value::Null));
    }

    #[test]
    fn other_endpoints_are_untouched() {
        let provider = MockProvider::new();
        provider.set_result(rpc::BUB_GAS_PRICE, json!("0x3b9aca00"));
        let response =
            onion_with_poa().dispatch(&provider, rpc::BUB_GAS_PRICE, json!([])).unwrap();
        assert_eq!(response.result, Some(json!("0x3b9aca00")));
    }

    #[test]
    fn invalid_extra_data_is_a_decode_error() {
        let provider = MockProvider::new();
        provider
            .set_result(rpc::BUB_GET_BLOCK_BY_NUMBER, json!({ "extraData": "0xnothex" }));
        let err = onion_with_poa()
            .dispatch(&provider, rpc::BUB_GET_BLOCK_BY_NUMBER, json!(["0x1", false]))
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
