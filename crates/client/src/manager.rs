//! The request manager: single entry point turning a method-descriptor
//! invocation into a pipeline dispatch plus response formatting.
//!
//! Formatter order is fixed: error formatters run first on an error
//! envelope, null-result handling next, success formatters last. Retries are
//! a middleware concern; the manager performs exactly one dispatch per
//! invocation.

use crate::error::ClientError;
use crate::method::{Method, NullBehavior, PreparedCall};
use crate::middleware::{AsyncMiddleware, Middleware, Onion, Position};
use crate::provider::{AsyncProvider, Provider};
use bubble_common::RpcResponse;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

fn apply_response_formatters(
    method: &Method,
    response: RpcResponse,
) -> Result<Value, ClientError> {
    if let Some(err) = &response.error {
        if let Some(formatter) = method.error_formatter {
            if let Some(translated) = formatter(err) {
                return Err(translated);
            }
        }
        return Err(ClientError::from_rpc(err));
    }
    let result = response.result.unwrap_or(Value::Null);
    if result.is_null() {
        return match method.null_result {
            NullBehavior::Allow => Ok(Value::Null),
            NullBehavior::NotFound(what) => Err(ClientError::NotFound(what.to_string())),
        };
    }
    match method.result_formatter {
        Some(formatter) => formatter(result),
        None => Ok(result),
    }
}

/// Blocking request manager owning the provider and the middleware onion.
///
/// The onion may be mutated at runtime; the layer list is snapshotted per
/// request, so a mutation takes effect on the next request.
pub struct RequestManager {
    provider: Box<dyn Provider>,
    onion: RwLock<Onion<Arc<dyn Middleware>>>,
}

impl RequestManager {
    /// Creates a manager with an empty onion.
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self::with_onion(provider, Onion::new())
    }

    /// Creates a manager with a pre-built onion.
    pub fn with_onion(provider: Box<dyn Provider>, onion: Onion<Arc<dyn Middleware>>) -> Self {
        Self { provider, onion: RwLock::new(onion) }
    }

    /// Adds a middleware layer at the given position.
    pub fn inject_middleware(
        &self,
        name: impl Into<String>,
        layer: Arc<dyn Middleware>,
        position: Position,
    ) -> Result<(), ClientError> {
        self.onion.write().inject(name, layer, position)
    }

    /// Removes the named middleware layer.
    pub fn remove_middleware(&self, name: &str) -> Result<(), ClientError> {
        self.onion.write().remove(name).map(|_| ())
    }

    /// Swaps the named middleware layer in place.
    pub fn replace_middleware(
        &self,
        name: &str,
        layer: Arc<dyn Middleware>,
    ) -> Result<(), ClientError> {
        self.onion.write().replace(name, layer).map(|_| ())
    }

    /// The current layer names, outermost first.
    pub fn middleware_names(&self) -> Vec<String> {
        self.onion.read().names().into_iter().map(str::to_string).collect()
    }

    /// Sends a raw request through the middleware pipeline.
    pub fn send_raw(&self, method: &str, params: Value) -> Result<RpcResponse, ClientError> {
        let onion = self.onion.read().clone();
        debug!("Executing {} through {} middleware layers", method, onion.layers().len());
        onion.dispatch(&*self.provider, method, params)
    }

    /// Executes a descriptor invocation: resolve the endpoint, dispatch, and
    /// run the response formatter pipeline.
    pub fn execute(&self, method: &Method, call: PreparedCall) -> Result<Value, ClientError> {
        let endpoint = method.endpoint.resolve(call.block_id.as_ref())?;
        let response = self.send_raw(endpoint, Value::Array(call.params))?;
        apply_response_formatters(method, response)
    }
}

/// Suspending request manager owning the provider and the middleware onion.
pub struct AsyncRequestManager {
    provider: Box<dyn AsyncProvider>,
    onion: RwLock<Onion<Arc<dyn AsyncMiddleware>>>,
}

impl AsyncRequestManager {
    /// Creates a manager with an empty onion.
    pub fn new(provider: Box<dyn AsyncProvider>) -> Self {
        Self::with_onion(provider, Onion::new())
    }

    /// Creates a manager with a pre-built onion.
    pub fn with_onion(
        provider: Box<dyn AsyncProvider>,
        onion: Onion<Arc<dyn AsyncMiddleware>>,
    ) -> Self {
        Self { provider, onion: RwLock::new(onion) }
    }

    /// Adds a middleware layer at the given position.
    pub fn inject_middleware(
        &self,
        name: impl Into<String>,
        layer: Arc<dyn AsyncMiddleware>,
        position: Position,
    ) -> Result<(), ClientError> {
        self.onion.write().inject(name, layer, position)
    }

    /// Removes the named middleware layer.
    pub fn remove_middleware(&self, name: &str) -> Result<(), ClientError> {
        self.onion.write().remove(name).map(|_| ())
    }

    /// Swaps the named middleware layer in place.
    pub fn replace_middleware(
        &self,
        name: &str,
        layer: Arc<dyn AsyncMiddleware>,
    ) -> Result<(), ClientError> {
        self.onion.write().replace(name, layer).map(|_| ())
    }

    /// The current layer names, outermost first.
    pub fn middleware_names(&self) -> Vec<String> {
        self.onion.read().names().into_iter().map(str::to_string).collect()
    }

    /// Sends a raw request through the middleware pipeline.
    pub async fn send_raw(
        &self,
        method: &str,
        params: Value,
    ) -> Result<RpcResponse, ClientError> {
        // Snapshot under the lock, then await outside it.
        let onion = self.onion.read().clone();
        debug!("Executing {} through {} middleware layers", method, onion.layers().len());
        onion.dispatch(&*self.provider, method, params).await
    }

    /// Executes a descriptor invocation: resolve the endpoint, dispatch, and
    /// run the response formatter pipeline.
    pub async fn execute(
        &self,
        method: &Method,
        call: PreparedCall,
    ) -> Result<Value, ClientError> {
        let endpoint = method.endpoint.resolve(call.block_id.as_ref())?;
        let response = self.send_raw(endpoint, Value::Array(call.params)).await?;
        apply_response_formatters(method, response)
    }
}
