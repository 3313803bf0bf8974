//! Client entry points for both operating modes.
//!
//! A client owns one provider and one middleware onion; the mode (blocking
//! or suspending) is chosen by the type and never mixed within an instance.
//! The default onion wraps the provider with the local filter emulator and
//! puts the retry layer outermost, so retries see exactly what the caller
//! sent.

use crate::api::Bub;
use crate::api_async::AsyncBub;
use crate::error::ClientError;
use crate::inner::{self, FunctionId, InnerContract};
use crate::manager::{AsyncRequestManager, RequestManager};
use crate::middleware::{
    AsyncMiddleware, LocalFilterMiddleware, Middleware, Onion, Position, RetryMiddleware,
};
use crate::provider::{AsyncHttpProvider, AsyncProvider, HttpProvider, Provider};
use alloy_primitives::Address;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Name of the default retry layer.
pub const RETRY_LAYER: &str = "retry";
/// Name of the default local filter layer.
pub const LOCAL_FILTER_LAYER: &str = "local_filter";

fn base_transaction(from: Option<Address>) -> Option<Value> {
    from.map(|from| {
        let mut fields = Map::new();
        fields.insert("from".to_string(), Value::String(format!("{from}")));
        Value::Object(fields)
    })
}

/// Blocking client.
pub struct Client {
    manager: RequestManager,
}

impl Client {
    /// Creates a client with the default middleware stack.
    pub fn new(provider: Box<dyn Provider>) -> Self {
        let mut onion: Onion<Arc<dyn Middleware>> = Onion::new();
        onion
            .inject(RETRY_LAYER, Arc::new(RetryMiddleware::default()), Position::Outermost)
            .expect("default layer names are unique");
        onion
            .inject(
                LOCAL_FILTER_LAYER,
                Arc::new(LocalFilterMiddleware::new()),
                Position::Innermost,
            )
            .expect("default layer names are unique");
        Self::with_onion(provider, onion)
    }

    /// Creates a client over an explicit middleware onion.
    pub fn with_onion(provider: Box<dyn Provider>, onion: Onion<Arc<dyn Middleware>>) -> Self {
        Self { manager: RequestManager::with_onion(provider, onion) }
    }

    /// Creates a client speaking HTTP to `url` with the default stack.
    pub fn http(url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self::new(Box::new(HttpProvider::new(url)?)))
    }

    /// The `bub` namespace.
    pub fn bub(&self) -> Bub<'_> {
        Bub::new(&self.manager)
    }

    /// The underlying request manager, for raw requests and middleware
    /// mutation.
    pub fn manager(&self) -> &RequestManager {
        &self.manager
    }

    /// Calls an inner-contract function and decodes its result.
    pub fn inner_call(
        &self,
        contract: &InnerContract,
        fid: FunctionId,
        params: &[(&str, Value)],
        from: Option<Address>,
    ) -> Result<Value, ClientError> {
        let transaction = contract.prepare_transaction(fid, params, base_transaction(from))?;
        let raw = self.bub().call(transaction, None)?;
        inner::decode_result(fid, raw)
    }

    /// Estimates the gas of an inner-contract transaction.
    pub fn inner_estimate_gas(
        &self,
        contract: &InnerContract,
        fid: FunctionId,
        params: &[(&str, Value)],
        from: Option<Address>,
    ) -> Result<u64, ClientError> {
        let transaction = contract.prepare_transaction(fid, params, base_transaction(from))?;
        self.bub().estimate_gas(transaction, None)
    }
}

/// Suspending client.
pub struct AsyncClient {
    manager: AsyncRequestManager,
}

impl AsyncClient {
    /// Creates a client with the default middleware stack.
    pub fn new(provider: Box<dyn AsyncProvider>) -> Self {
        let mut onion: Onion<Arc<dyn AsyncMiddleware>> = Onion::new();
        onion
            .inject(RETRY_LAYER, Arc::new(RetryMiddleware::default()), Position::Outermost)
            .expect("default layer names are unique");
        onion
            .inject(
                LOCAL_FILTER_LAYER,
                Arc::new(LocalFilterMiddleware::new()),
                Position::Innermost,
            )
            .expect("default layer names are unique");
        Self::with_onion(provider, onion)
    }

    /// Creates a client over an explicit middleware onion.
    pub fn with_onion(
        provider: Box<dyn AsyncProvider>,
        onion: Onion<Arc<dyn AsyncMiddleware>>,
    ) -> Self {
        Self { manager: AsyncRequestManager::with_onion(provider, onion) }
    }

    /// Creates a client speaking HTTP to `url` with the default stack.
    pub fn http(url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self::new(Box::new(AsyncHttpProvider::new(url)?)))
    }

    /// The `bub` namespace.
    pub fn bub(&self) -> AsyncBub<'_> {
        AsyncBub::new(&self.manager)
    }

    /// The underlying request manager, for raw requests and middleware
    /// mutation.
    pub fn manager(&self) -> &AsyncRequestManager {
        &self.manager
    }

    /// Calls an inner-contract function and decodes its result.
    pub async fn inner_call(
        &self,
        contract: &InnerContract,
        fid: FunctionId,
        params: &[(&str, Value)],
        from: Option<Address>,
    ) -> Result<Value, ClientError> {
        let transaction = contract.prepare_transaction(fid, params, base_transaction(from))?;
        let raw = self.bub().call(transaction, None).await?;
        inner::decode_result(fid, raw)
    }

    /// Estimates the gas of an inner-contract transaction.
    pub async fn inner_estimate_gas(
        &self,
        contract: &InnerContract,
        fid: FunctionId,
        params: &[(&str, Value)],
        from: Option<Address>,
    ) -> Result<u64, ClientError> {
        let transaction = contract.prepare_transaction(fid, params, base_transaction(from))?;
        self.bub().estimate_gas(transaction, None).await
    }
}
