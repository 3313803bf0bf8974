//! Transport providers: the innermost link of the request pipeline.
//!
//! A provider sends one JSON-RPC request and returns the raw response
//! envelope. Everything above it (middleware, formatters) treats the
//! provider as a black box; transport ownership (connection pools, sockets)
//! stays inside the provider.

use crate::error::ClientError;
use bubble_common::{RpcRequest, RpcResponse};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Default round-trip timeout for the HTTP providers.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A blocking transport.
pub trait Provider: Send + Sync {
    /// Sends a single request and returns the raw response envelope.
    fn request(&self, method: &str, params: Value) -> Result<RpcResponse, ClientError>;
}

/// A suspending transport.
///
/// Object-safe via boxed futures so the pipeline can hold `dyn AsyncProvider`.
pub trait AsyncProvider: Send + Sync {
    /// Sends a single request and returns the raw response envelope.
    fn request<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<RpcResponse, ClientError>>;
}

fn parse_body(method: &str, body: &str) -> Result<RpcResponse, ClientError> {
    serde_json::from_str::<RpcResponse>(body).map_err(|e| {
        warn!(
            "Invalid JSON-RPC response for {} (first 200 chars): {}",
            method,
            body.chars().take(200).collect::<String>()
        );
        ClientError::Transport(format!("invalid JSON from provider: {e}"))
    })
}

/// Blocking HTTP provider backed by a pooled reqwest client.
pub struct HttpProvider {
    url: String,
    client: reqwest::blocking::Client,
    next_id: AtomicU64,
}

impl HttpProvider {
    /// Creates a provider for the given endpoint URL.
    pub fn new(url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { url: url.into(), client, next_id: AtomicU64::new(1) })
    }

    /// The endpoint URL this provider talks to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Provider for HttpProvider {
    fn request(&self, method: &str, params: Value) -> Result<RpcResponse, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        debug!("Dispatching {} (id {}) to {}", method, id, self.url);

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| {
                warn!("Request {} to {} failed: {}", method, self.url, e);
                ClientError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Provider {} answered {} for {}", self.url, status, method);
            return Err(ClientError::Transport(format!("http status {status}")));
        }

        let body = response.text().map_err(|e| ClientError::Transport(e.to_string()))?;
        parse_body(method, &body)
    }
}

/// Suspending HTTP provider backed by a pooled reqwest client.
pub struct AsyncHttpProvider {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl AsyncHttpProvider {
    /// Creates a provider for the given endpoint URL.
    pub fn new(url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { url: url.into(), client, next_id: AtomicU64::new(1) })
    }

    /// The endpoint URL this provider talks to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AsyncProvider for AsyncHttpProvider {
    fn request<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<RpcResponse, ClientError>> {
        Box::pin(async move {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let request = RpcRequest::new(id, method, params);
            debug!("Dispatching {} (id {}) to {}", method, id, self.url);

            let response = self
                .client
                .post(&self.url)
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    warn!("Request {} to {} failed: {}", method, self.url, e);
                    ClientError::Transport(e.to_string())
                })?;

            let status = response.status();
            if !status.is_success() {
                warn!("Provider {} answered {} for {}", self.url, status, method);
                return Err(ClientError::Transport(format!("http status {status}")));
            }

            let body = response.text().await.map_err(|e| ClientError::Transport(e.to_string()))?;
            parse_body(method, &body)
        })
    }
}

/// One scripted outcome of a [`MockProvider`] request.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Answer with a success envelope holding this result.
    Result(Value),
    /// Answer with an error envelope.
    RpcError(bubble_common::RpcError),
    /// Fail at the transport level.
    Transport(String),
}

/// Scriptable in-memory provider for tests.
///
/// Responses are queued per method (FIFO), with an optional sticky fallback
/// that answers once the queue is drained. Every request is recorded so tests
/// can assert on what actually went over the (virtual) wire.
#[derive(Default)]
pub struct MockProvider {
    queued: Mutex<HashMap<String, VecDeque<MockOutcome>>>,
    sticky: Mutex<HashMap<String, MockOutcome>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl MockProvider {
    /// Creates an empty mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a one-shot result for `method`.
    pub fn push_result(&self, method: &str, result: Value) {
        self.push_outcome(method, MockOutcome::Result(result));
    }

    /// Queues a one-shot transport failure for `method`.
    pub fn push_transport_error(&self, method: &str, message: &str) {
        self.push_outcome(method, MockOutcome::Transport(message.to_string()));
    }

    /// Queues an arbitrary one-shot outcome for `method`.
    pub fn push_outcome(&self, method: &str, outcome: MockOutcome) {
        self.queued.lock().entry(method.to_string()).or_default().push_back(outcome);
    }

    /// Sets the repeating fallback result for `method`.
    pub fn set_result(&self, method: &str, result: Value) {
        self.sticky.lock().insert(method.to_string(), MockOutcome::Result(result));
    }

    /// All recorded `(method, params)` pairs, in arrival order.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().clone()
    }

    /// Recorded params of every request to `method`.
    pub fn requests_for(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn answer(&self, method: &str, params: Value) -> Result<RpcResponse, ClientError> {
        self.requests.lock().push((method.to_string(), params));
        let outcome = self
            .queued
            .lock()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.sticky.lock().get(method).cloned());
        match outcome {
            Some(MockOutcome::Result(v)) => Ok(RpcResponse::from_result(v)),
            Some(MockOutcome::RpcError(e)) => Ok(RpcResponse::from_error(e)),
            Some(MockOutcome::Transport(msg)) => Err(ClientError::Transport(msg)),
            None => Err(ClientError::Transport(format!("no scripted response for {method}"))),
        }
    }
}

impl Provider for MockProvider {
    fn request(&self, method: &str, params: Value) -> Result<RpcResponse, ClientError> {
        self.answer(method, params)
    }
}

impl AsyncProvider for MockProvider {
    fn request<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<RpcResponse, ClientError>> {
        Box::pin(futures::future::ready(self.answer(method, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mock_queues_then_falls_back() {
        let mock = MockProvider::new();
        mock.push_result("bub_blockNumber", json!("0xa"));
        mock.set_result("bub_blockNumber", json!("0xb"));

        let first = Provider::request(&mock, "bub_blockNumber", json!([])).unwrap();
        assert_eq!(first.result, Some(json!("0xa")));
        let second = Provider::request(&mock, "bub_blockNumber", json!([])).unwrap();
        assert_eq!(second.result, Some(json!("0xb")));
        let third = Provider::request(&mock, "bub_blockNumber", json!([])).unwrap();
        assert_eq!(third.result, Some(json!("0xb")));
    }

    #[test]
    fn mock_records_requests() {
        let mock = MockProvider::new();
        mock.set_result("bub_getBalance", json!("0x0"));
        Provider::request(&mock, "bub_getBalance", json!(["0xabc", "latest"])).unwrap();
        assert_eq!(mock.requests_for("bub_getBalance"), vec![json!(["0xabc", "latest"])]);
    }

    #[test]
    fn unscripted_method_is_a_transport_error() {
        let mock = MockProvider::new();
        let err = Provider::request(&mock, "bub_gasPrice", json!([])).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
